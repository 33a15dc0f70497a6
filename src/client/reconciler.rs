//! Keeps the object cache consistent with the server and with the current
//! credential.
//!
//! Like toggles are applied optimistically and settled by the server
//! response. A credential change re-scopes the cache: like state is forced to
//! false right away and every identity-scoped object is fetched again.

use super::api::{ApiError, CatalogApi};
use super::credentials::{CredentialEvent, CredentialStore, StoredCredential};
use super::object_cache::{MutationId, ObjectCache};
use crate::catalog_store::{Album, AlbumFilter, AlbumId};
use crate::library::ErrorKind;
use crate::user::{User, UserId, UserProfile};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshMode {
    /// On failure the previously cached listing stays visible.
    Soft,
    /// On failure the cached listing is dropped.
    Hard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server accepted the change. Carries the album as it returned it.
    Applied(Album),
    /// No credential, or the server rejected it. The caller should prompt
    /// for login.
    AuthenticationRequired,
    Failed(ApiError),
}

pub struct CacheReconciler {
    api: Arc<dyn CatalogApi>,
    credentials: Arc<CredentialStore>,
    cache: Mutex<ObjectCache>,
    next_mutation: AtomicU64,
    credential_events: Mutex<broadcast::Receiver<CredentialEvent>>,
    changes: watch::Sender<u64>,
}

impl CacheReconciler {
    pub fn new(api: Arc<dyn CatalogApi>, credentials: Arc<CredentialStore>) -> Self {
        let scope = credentials.user_id();
        let credential_events = Mutex::new(credentials.subscribe());
        let (changes, _) = watch::channel(0);
        Self {
            api,
            credentials,
            cache: Mutex::new(ObjectCache::new(scope)),
            next_mutation: AtomicU64::new(0),
            credential_events,
            changes,
        }
    }

    fn cache(&self) -> MutexGuard<'_, ObjectCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    /// A revision counter bumped on every cache change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.current().is_some()
    }

    /// True while a response for the scope the request was issued under is
    /// still meaningful.
    fn in_scope(&self, scope: Option<UserId>) -> bool {
        self.credentials.user_id() == scope && self.cache().scope() == scope
    }

    // Derived reads. Without a credential nothing reads as liked, whatever
    // the cache holds.

    fn present(&self, album: Album) -> Album {
        if self.is_authenticated() {
            album
        } else {
            album.with_liked(false)
        }
    }

    pub fn albums(&self) -> Vec<Album> {
        let albums = self.cache().listing_albums();
        albums.into_iter().map(|a| self.present(a)).collect()
    }

    pub fn album(&self, id: AlbumId) -> Option<Album> {
        let album = self.cache().album(id).cloned();
        album.map(|a| self.present(a))
    }

    pub fn is_liked(&self, id: AlbumId) -> bool {
        self.album(id).map(|a| a.is_liked).unwrap_or(false)
    }

    pub fn is_pending(&self, id: AlbumId) -> bool {
        self.cache()
            .entry(id)
            .map(|e| e.is_optimistic())
            .unwrap_or(false)
    }

    pub fn liked_albums(&self) -> Vec<Album> {
        if !self.is_authenticated() {
            return vec![];
        }
        self.cache().liked_albums()
    }

    pub fn me(&self) -> Option<UserProfile> {
        if !self.is_authenticated() {
            return None;
        }
        self.cache().me().cloned()
    }

    pub fn current_filter(&self) -> Option<AlbumFilter> {
        self.cache().listing().map(|l| l.filter.clone())
    }

    fn next_mutation(&self) -> MutationId {
        self.next_mutation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Flips the like state of the album as currently cached.
    pub async fn toggle_like(&self, album_id: AlbumId) -> ToggleOutcome {
        let liked = self.is_liked(album_id);
        self.set_like(album_id, !liked).await
    }

    pub async fn set_like(&self, album_id: AlbumId, liked: bool) -> ToggleOutcome {
        let Some(StoredCredential { token, user }) = self.credentials.current() else {
            return ToggleOutcome::AuthenticationRequired;
        };
        let scope = Some(user.id);

        let cached = self.cache().album(album_id).cloned();
        let current = match cached {
            Some(album) => album,
            None => match self.api.get_album(Some(&token), album_id).await {
                Ok(Some(album)) => {
                    // The fetched album is the rollback target of this toggle.
                    if self.in_scope(scope) {
                        self.cache().merge_album(album.clone());
                    }
                    album
                }
                Ok(None) => {
                    return ToggleOutcome::Failed(ApiError::new(
                        ErrorKind::NotFound,
                        format!("Album {} not found", album_id),
                    ))
                }
                Err(err) => return Self::failure(err),
            },
        };

        let mutation = self.next_mutation();
        self.cache()
            .apply_optimistic(current.with_liked(liked), mutation);
        self.notify();
        debug!("Mutation {}: like={} on album {}", mutation, liked, album_id);

        let result = if liked {
            self.api.like_album(Some(&token), album_id).await
        } else {
            self.api.unlike_album(Some(&token), album_id).await
        };

        let in_scope = self.in_scope(scope);
        match result {
            Ok(album) => {
                if in_scope {
                    self.cache().confirm(album.clone(), mutation);
                    self.notify();
                }
                ToggleOutcome::Applied(album)
            }
            Err(err) => {
                // After a scope change the entry was already re-derived.
                if in_scope && self.cache().fail(album_id, mutation) {
                    self.notify();
                }
                Self::failure(err)
            }
        }
    }

    fn failure(err: ApiError) -> ToggleOutcome {
        if err.is_unauthenticated() {
            ToggleOutcome::AuthenticationRequired
        } else {
            ToggleOutcome::Failed(err)
        }
    }

    pub async fn refresh_albums(
        &self,
        filter: &AlbumFilter,
        mode: RefreshMode,
    ) -> Result<Vec<Album>, ApiError> {
        let token = self.credentials.token();
        let scope = self.credentials.user_id();
        match self.api.list_albums(token.as_deref(), filter).await {
            Ok(albums) => {
                if !self.in_scope(scope) {
                    return Ok(self.rescoped(albums));
                }
                self.cache().set_listing(filter.clone(), albums.clone());
                self.notify();
                Ok(albums)
            }
            Err(err) => {
                warn!("Failed to refresh albums: {}", err);
                if mode == RefreshMode::Hard {
                    self.cache().clear_listing();
                    self.notify();
                }
                Err(err)
            }
        }
    }

    /// Like state of a response issued under another credential is replaced
    /// with what the cache holds for the current one.
    fn rescoped(&self, albums: Vec<Album>) -> Vec<Album> {
        let current = self.credentials.user_id();
        let cache = self.cache();
        let trusted = current.is_some() && cache.scope() == current;
        albums
            .into_iter()
            .map(|album| {
                let liked = trusted && cache.album(album.id).is_some_and(|a| a.is_liked);
                album.with_liked(liked)
            })
            .collect()
    }

    pub async fn load_album(&self, id: AlbumId) -> Result<Option<Album>, ApiError> {
        let token = self.credentials.token();
        let scope = self.credentials.user_id();
        let album = self.api.get_album(token.as_deref(), id).await?;
        if let Some(album) = &album {
            if self.in_scope(scope) {
                self.cache().merge_album(album.clone());
                self.notify();
            }
        }
        Ok(album)
    }

    pub async fn refresh_me(&self) -> Result<Option<UserProfile>, ApiError> {
        let token = self.credentials.token();
        let scope = self.credentials.user_id();
        let me = match token {
            Some(token) => self.api.me(Some(&token)).await?,
            None => None,
        };
        if self.in_scope(scope) {
            self.cache().set_me(me.clone());
            self.notify();
        }
        Ok(me)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let payload = self.api.login(email, password).await?;
        self.adopt_credential(payload.token, payload.user).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, ApiError> {
        let payload = self.api.register(email, password, name).await?;
        self.adopt_credential(payload.token, payload.user).await
    }

    async fn adopt_credential(&self, token: String, user: User) -> Result<User, ApiError> {
        self.credentials
            .store(StoredCredential {
                token,
                user: user.clone(),
            })
            .map_err(|e| ApiError::internal(format!("{:#}", e)))?;
        info!("Logged in as {}", user.email);
        self.process_credential_events().await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.credentials
            .clear()
            .map_err(|e| ApiError::internal(format!("{:#}", e)))?;
        info!("Logged out");
        self.process_credential_events().await;
        Ok(())
    }

    /// Looks the album up with the metadata provider and adds it to the
    /// catalog. Duplicates resolve to the existing album.
    pub async fn add_album_from_lookup(&self, artist: &str, title: &str) -> Result<Album, ApiError> {
        let metadata = self.api.lookup_album(artist, title).await?.ok_or_else(|| {
            ApiError::new(
                ErrorKind::NotFound,
                format!("No metadata for \"{}\" by {}", title, artist),
            )
        })?;
        let input = metadata.into_add_album_input(artist, title);
        let token = self.credentials.token();
        let scope = self.credentials.user_id();
        let album = self.api.add_album(token.as_deref(), &input).await?;
        if self.in_scope(scope) {
            self.cache().merge_album(album.clone());
            self.notify();
        }
        Ok(album)
    }

    /// Re-scopes the cache to the current credential without any network
    /// call. Returns true if the identity changed.
    pub fn apply_credential_change(&self) -> bool {
        let scope = self.credentials.user_id();
        let changed = {
            let mut cache = self.cache();
            if cache.scope() == scope {
                false
            } else {
                cache.force_unliked();
                cache.set_scope(scope);
                true
            }
        };
        if changed {
            info!("Credential scope changed to {:?}", scope);
            self.notify();
        }
        changed
    }

    /// Fetches every identity-scoped object again. Failures are logged; the
    /// cache keeps what it has.
    pub async fn refetch_scoped(&self) {
        if let Err(err) = self.refresh_me().await {
            warn!("Failed to refresh profile: {}", err);
        }
        if let Some(filter) = self.current_filter() {
            // Already logged by refresh_albums.
            let _ = self.refresh_albums(&filter, RefreshMode::Soft).await;
        }
        let listed: Vec<AlbumId> = self.cache().listing_albums().iter().map(|a| a.id).collect();
        let others: Vec<AlbumId> = self
            .cache()
            .album_ids()
            .into_iter()
            .filter(|id| !listed.contains(id))
            .collect();
        for id in others {
            if let Err(err) = self.load_album(id).await {
                warn!("Failed to refresh album {}: {}", id, err);
            }
        }
    }

    pub async fn on_credential_changed(&self) {
        self.apply_credential_change();
        self.refetch_scoped().await;
    }

    /// Handles credential events received since the last call. Returns the
    /// number of events consumed.
    pub async fn process_credential_events(&self) -> usize {
        let mut received = 0;
        {
            let mut events = match self.credential_events.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            loop {
                match events.try_recv() {
                    Ok(_) => received += 1,
                    Err(TryRecvError::Lagged(skipped)) => received += skipped as usize,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }
        if received > 0 {
            self.on_credential_changed().await;
        }
        received
    }

    /// Follows credential changes in the background, for credentials that
    /// can change outside this reconciler. A file-backed store is re-read
    /// every `reload_interval` so that writes by other processes are noticed.
    pub fn spawn_credential_sync(self: Arc<Self>, reload_interval: Duration) -> JoinHandle<()> {
        let mut events = self.credentials.subscribe();
        let file_backed = self.credentials.is_persistent();
        let mut reload = tokio::time::interval(reload_interval);
        reload.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(_) | Err(RecvError::Lagged(_)) => self.on_credential_changed().await,
                        Err(RecvError::Closed) => break,
                    },
                    _ = reload.tick(), if file_backed => {
                        // A change is published as an event and handled above.
                        if let Err(err) = self.credentials.reload() {
                            warn!("Failed to reload credential: {:#}", err);
                        }
                    }
                }
            }
        })
    }
}
