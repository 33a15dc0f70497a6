use super::state::ServerState;
use crate::library::{resolve_identity, Identity};

use axum::extract::OptionalFromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Handlers take `Option<Identity>`: requests without a valid token are
/// anonymous, never rejected here.
impl OptionalFromRequestParts<ServerState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve_identity(
            &parts.headers,
            ctx.user_manager.token_signer(),
        ))
    }
}
