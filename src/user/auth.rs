//! Password hashing and bearer token signing.

use super::user_models::{User, UserId};
use anyhow::{bail, Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

mod albumshelf_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash(plain: &[u8], b64_salt: &str) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string())
    }

    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain, &password_hash)
            .is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordHasherKind {
    Argon2,
}

impl FromStr for PasswordHasherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasherKind::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for PasswordHasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordHasherKind::Argon2 => write!(f, "argon2"),
        }
    }
}

impl PasswordHasherKind {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            PasswordHasherKind::Argon2 => albumshelf_argon2::generate_b64_salt(),
        }
    }

    pub fn hash(&self, plain: &str, b64_salt: &str) -> Result<String> {
        match self {
            PasswordHasherKind::Argon2 => albumshelf_argon2::hash(plain.as_bytes(), b64_salt),
        }
    }

    pub fn verify(&self, plain: &str, target_hash: &str) -> Result<bool> {
        match self {
            PasswordHasherKind::Argon2 => albumshelf_argon2::verify(plain.as_bytes(), target_hash),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PasswordCredentials {
    pub user_id: UserId,
    pub salt: String,
    pub hash: String,
    pub hasher: PasswordHasherKind,
}

impl PasswordCredentials {
    pub fn create(user_id: UserId, password: &str) -> Result<Self> {
        let hasher = PasswordHasherKind::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password, &salt)?;
        Ok(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
        })
    }

    pub fn matches(&self, password: &str) -> Result<bool> {
        self.hasher.verify(password, &self.hash)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        TokenSigner {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Tokens signed with a random secret do not survive a restart.
    pub fn with_random_secret(ttl: Duration) -> Self {
        Self::new(generate_secret().as_bytes(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Returns the claims of a well-formed, correctly signed, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!("Rejected token: {}", err);
                None
            }
        }
    }
}

pub fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 12,
            email: "someone@example.com".to_string(),
            name: None,
            created_at: 0,
        }
    }

    #[test]
    fn argon2_hash() {
        let salt = PasswordHasherKind::Argon2.generate_b64_salt();
        let hash1 = PasswordHasherKind::Argon2.hash("123mypw", &salt).unwrap();
        let hash2 = PasswordHasherKind::Argon2.hash("123mypw", &salt).unwrap();
        assert_eq!(hash1, hash2);

        assert!(PasswordHasherKind::Argon2.verify("123mypw", &hash1).unwrap());
        assert!(!PasswordHasherKind::Argon2
            .verify("not the pw", &hash1)
            .unwrap());
    }

    #[test]
    fn hasher_name_round_trips() {
        let name = PasswordHasherKind::Argon2.to_string();
        assert_eq!(name, "argon2");
        assert_eq!(
            PasswordHasherKind::from_str(&name).unwrap(),
            PasswordHasherKind::Argon2
        );
        assert!(PasswordHasherKind::from_str("bcrypt").is_err());
    }

    #[test]
    fn signed_token_verifies() {
        let signer = TokenSigner::new(b"secret", DEFAULT_TOKEN_TTL);
        let token = signer.sign(&test_user()).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, 12);
        assert_eq!(claims.email, "someone@example.com");
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL.as_secs() as i64);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let signer = TokenSigner::new(b"secret", DEFAULT_TOKEN_TTL);
        let other = TokenSigner::new(b"another secret", DEFAULT_TOKEN_TTL);
        let token = other.sign(&test_user()).unwrap();
        assert!(signer.verify(&token).is_none());
    }

    #[test]
    fn rejects_expired_and_malformed_tokens() {
        let signer = TokenSigner::new(b"secret", DEFAULT_TOKEN_TTL);
        let now = chrono::Utc::now().timestamp();
        let expired = signer
            .encode_claims(&Claims {
                sub: 1,
                email: "old@example.com".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(signer.verify(&expired).is_none());
        assert!(signer.verify("not-a-token").is_none());
        assert!(signer.verify("").is_none());
    }

    #[test]
    fn random_secrets_differ() {
        assert_eq!(generate_secret().len(), 64);
        assert_ne!(generate_secret(), generate_secret());
    }
}
