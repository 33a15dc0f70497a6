use anyhow::{Context, Result};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::catalog_store::{AddAlbumInput, AlbumFilter, AlbumId, CatalogStore};
use crate::library::{
    CatalogEditor, CatalogError, CatalogQueryService, ErrorBody, ErrorKind, Identity,
    LikeToggleService, COOKIE_SESSION_TOKEN_KEY,
};
use crate::metadata::MetadataProvider;
use crate::user::{LoginBody, RegisterBody, TokenSigner, UserManager, UserStore};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, rejection::QueryRejection},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub user_id: Option<i64>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct UpdateNameBody {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LookupQuery {
    pub artist: String,
    pub title: String,
}

fn invalid_request(rejection: impl Display) -> CatalogError {
    CatalogError::Invalid(rejection.to_string())
}

async fn home(identity: Option<Identity>, State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        user_id: identity.map(|i| i.user_id),
    })
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<Response, CatalogError> {
    let Json(body) = body.map_err(invalid_request)?;
    let payload = user_manager.register(&body.email, &body.password, body.name.as_deref())?;
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, CatalogError> {
    let Json(body) = body.map_err(invalid_request)?;
    let payload = user_manager.login(&body.email, &body.password)?;

    let max_age = user_manager.token_signer().ttl().as_secs() as i64;
    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, payload.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build();

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(payload),
    )
        .into_response())
}

/// Tokens are stateless, logging out only drops the session cookie.
async fn logout() -> Response {
    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();
    (StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]).into_response()
}

async fn get_me(
    identity: Option<Identity>,
    State(user_manager): State<GuardedUserManager>,
) -> Result<Response, CatalogError> {
    Ok(Json(user_manager.me(identity.as_ref())?).into_response())
}

async fn put_me(
    identity: Option<Identity>,
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<UpdateNameBody>, JsonRejection>,
) -> Result<Response, CatalogError> {
    let Json(body) = body.map_err(invalid_request)?;
    let user = user_manager.update_user_name(identity.as_ref(), body.name.as_deref())?;
    Ok(Json(user).into_response())
}

async fn list_albums(
    identity: Option<Identity>,
    State(catalog_query): State<GuardedCatalogQuery>,
    filter: Result<Query<AlbumFilter>, QueryRejection>,
) -> Result<Response, CatalogError> {
    let Query(filter) = filter.map_err(invalid_request)?;
    Ok(Json(catalog_query.list_albums(&filter, identity.as_ref())?).into_response())
}

async fn get_album(
    identity: Option<Identity>,
    State(catalog_query): State<GuardedCatalogQuery>,
    id: Result<Path<AlbumId>, PathRejection>,
) -> Result<Response, CatalogError> {
    let Path(id) = id.map_err(invalid_request)?;
    match catalog_query.get_album(id, identity.as_ref())? {
        Some(album) => Ok(Json(album).into_response()),
        None => Err(CatalogError::album_not_found(id)),
    }
}

async fn post_album(
    identity: Option<Identity>,
    State(state): State<ServerState>,
    body: Result<Json<AddAlbumInput>, JsonRejection>,
) -> Result<Response, CatalogError> {
    let Json(input) = body.map_err(invalid_request)?;
    let (album, created) = state.catalog_editor.add_album(input)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    // Answer with the caller's like state, as every other album read does.
    let album = state
        .catalog_query
        .get_album(album.id, identity.as_ref())?
        .unwrap_or(album);
    Ok((status, Json(album)).into_response())
}

async fn add_user_liked_album(
    identity: Option<Identity>,
    State(like_toggle): State<GuardedLikeToggle>,
    id: Result<Path<AlbumId>, PathRejection>,
) -> Result<Response, CatalogError> {
    let Path(id) = id.map_err(invalid_request)?;
    Ok(Json(like_toggle.like(id, identity.as_ref())?).into_response())
}

async fn delete_user_liked_album(
    identity: Option<Identity>,
    State(like_toggle): State<GuardedLikeToggle>,
    id: Result<Path<AlbumId>, PathRejection>,
) -> Result<Response, CatalogError> {
    let Path(id) = id.map_err(invalid_request)?;
    Ok(Json(like_toggle.unlike(id, identity.as_ref())?).into_response())
}

async fn get_user_liked_albums(
    identity: Option<Identity>,
    State(like_toggle): State<GuardedLikeToggle>,
) -> Result<Response, CatalogError> {
    Ok(Json(like_toggle.liked_albums(identity.as_ref())?).into_response())
}

async fn lookup_album_metadata(
    State(metadata_provider): State<OptionalMetadataProvider>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Response, CatalogError> {
    let Query(query) = query.map_err(invalid_request)?;
    let Some(provider) = metadata_provider else {
        let body = ErrorBody {
            kind: ErrorKind::Upstream,
            message: "No album metadata provider is configured".to_string(),
        };
        return Ok((StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response());
    };
    match provider.lookup_album(&query.artist, &query.title).await? {
        Some(metadata) => Ok(Json(metadata).into_response()),
        None => Err(CatalogError::NotFound(format!(
            "No metadata for \"{}\" by {}",
            query.title, query.artist
        ))),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: Arc<dyn CatalogStore>,
        user_store: Arc<dyn UserStore>,
        token_signer: TokenSigner,
        metadata_provider: Option<Arc<dyn MetadataProvider>>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_query: Arc::new(CatalogQueryService::new(catalog_store.clone())),
            like_toggle: Arc::new(LikeToggleService::new(catalog_store.clone())),
            catalog_editor: Arc::new(CatalogEditor::new(catalog_store.clone())),
            user_manager: Arc::new(UserManager::new(catalog_store, user_store, token_signer)),
            metadata_provider,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    token_signer: TokenSigner,
    metadata_provider: Option<Arc<dyn MetadataProvider>>,
) -> Result<Router> {
    let state = ServerState::new(
        config.clone(),
        catalog_store,
        user_store,
        token_signer,
        metadata_provider,
    );

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let album_routes: Router = Router::new()
        .route("/v1/albums", get(list_albums).post(post_album))
        .route("/v1/albums/{id}", get(get_album))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/me", get(get_me).put(put_me))
        .route("/liked", get(get_user_liked_albums))
        .route(
            "/liked/{album_id}",
            post(add_user_liked_album).delete(delete_user_liked_album),
        )
        .with_state(state.clone());

    let metadata_routes: Router = Router::new()
        .route("/album", get(lookup_album_metadata))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router
        .merge(album_routes)
        .nest("/v1/auth", auth_routes)
        .nest("/v1/user", user_routes)
        .nest("/v1/metadata", metadata_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn UserStore>,
    token_signer: TokenSigner,
    metadata_provider: Option<Arc<dyn MetadataProvider>>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(
        config,
        catalog_store,
        user_store,
        token_signer,
        metadata_provider,
    )?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
