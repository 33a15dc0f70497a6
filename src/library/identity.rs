//! Resolves the requesting identity out of request headers.

use crate::user::{TokenSigner, UserId};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";

/// An authenticated user, derived from a verified bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

fn token_from_authorization_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        Some(_) => return None,
        None => value,
    };
    (!token.is_empty()).then(|| token.to_string())
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Returns the identity of the first token that verifies, looking at the
/// Authorization header first and at the session cookie second. Never fails:
/// missing, malformed, expired or forged tokens all resolve to None.
pub fn resolve_identity(headers: &HeaderMap, token_signer: &TokenSigner) -> Option<Identity> {
    let candidates = [
        token_from_authorization_header(headers),
        token_from_cookie(headers),
    ];
    for token in candidates.into_iter().flatten() {
        if let Some(claims) = token_signer.verify(&token) {
            debug!("Resolved identity for user_id={}", claims.sub);
            return Some(Identity {
                user_id: claims.sub,
                email: claims.email,
            });
        }
    }
    debug!("No valid token in request");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{User, DEFAULT_TOKEN_TTL};
    use axum::http::{header::COOKIE, HeaderValue};

    fn signer() -> TokenSigner {
        TokenSigner::new(b"identity-test", DEFAULT_TOKEN_TTL)
    }

    fn token_for(signer: &TokenSigner, id: UserId) -> String {
        signer
            .sign(&User {
                id,
                email: format!("user{}@example.com", id),
                name: None,
                created_at: 0,
            })
            .unwrap()
    }

    fn headers(pairs: &[(axum::http::HeaderName, String)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn anonymous_without_token() {
        assert!(resolve_identity(&HeaderMap::new(), &signer()).is_none());
    }

    #[test]
    fn reads_bearer_header() {
        let signer = signer();
        let token = token_for(&signer, 4);
        let identity =
            resolve_identity(&headers(&[(AUTHORIZATION, format!("Bearer {}", token))]), &signer)
                .unwrap();
        assert_eq!(identity.user_id, 4);
        assert_eq!(identity.email, "user4@example.com");

        let lowercase =
            resolve_identity(&headers(&[(AUTHORIZATION, format!("bearer {}", token))]), &signer);
        assert_eq!(lowercase.map(|i| i.user_id), Some(4));
    }

    #[test]
    fn reads_session_cookie() {
        let signer = signer();
        let token = token_for(&signer, 9);
        let identity = resolve_identity(
            &headers(&[(COOKIE, format!("other=1; {}={}", COOKIE_SESSION_TOKEN_KEY, token))]),
            &signer,
        );
        assert_eq!(identity.map(|i| i.user_id), Some(9));
    }

    #[test]
    fn header_wins_over_cookie() {
        let signer = signer();
        let identity = resolve_identity(
            &headers(&[
                (AUTHORIZATION, format!("Bearer {}", token_for(&signer, 1))),
                (
                    COOKIE,
                    format!("{}={}", COOKIE_SESSION_TOKEN_KEY, token_for(&signer, 2)),
                ),
            ]),
            &signer,
        );
        assert_eq!(identity.map(|i| i.user_id), Some(1));
    }

    #[test]
    fn invalid_tokens_are_anonymous() {
        let signer = signer();
        let foreign = token_for(&TokenSigner::new(b"other", DEFAULT_TOKEN_TTL), 1);
        for value in [
            "Bearer garbage".to_string(),
            format!("Bearer {}", foreign),
            "Basic dXNlcjpwdw==".to_string(),
            "Bearer ".to_string(),
        ] {
            assert!(resolve_identity(&headers(&[(AUTHORIZATION, value)]), &signer).is_none());
        }
    }
}
