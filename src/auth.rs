use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::AuthError;
use crate::models::{AuthPayload, Credential};

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Issues and verifies HS256 access tokens signed with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        }
    }

    /// Signs a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = unix_now();
        self.sign(&AuthPayload {
            sub: subject.to_owned(),
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        })
    }

    pub fn issue_default(&self, subject: &str) -> Result<String, AuthError> {
        self.issue(subject, self.default_ttl)
    }

    pub fn sign(&self, claims: &AuthPayload) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Checks signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<AuthPayload, AuthError> {
        let token_data = decode::<AuthPayload>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(token_data.claims)
    }
}

/// Source of credentials for login and token subjects.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn lookup(&self, username: &str) -> Option<Credential>;
}

/// Fixed set of users held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: HashMap<String, Credential>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `password` and registers the user. Only meant for startup.
    pub fn with_user(mut self, username: &str, password: &str, cost: u32) -> Result<Self, AuthError> {
        let credential = Credential {
            username: username.to_owned(),
            password_hash: hash_password(password, cost)?,
        };
        self.users.insert(username.to_owned(), credential);
        Ok(self)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn lookup(&self, username: &str) -> Option<Credential> {
        self.users.get(username).cloned()
    }
}

/// Hash checked when the username is unknown, so a miss costs as much as a wrong password.
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| hash_password("decoy-password", bcrypt::DEFAULT_COST).unwrap_or_default())
}

/// Resolves `username` and checks `password` against its stored hash.
///
/// bcrypt runs on the blocking pool, never on the async worker.
pub async fn authenticate(
    identities: &dyn IdentityProvider,
    username: &str,
    password: &str,
) -> Result<Credential, AuthError> {
    let credential = identities.lookup(username).await;

    let stored_hash = credential.as_ref().map(|c| c.password_hash.clone());
    let password = password.to_owned();
    let check = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => verify_password(&password, decoy_hash()).map(|_| false),
    });
    let matches = check.await?.unwrap_or_else(|e| {
        tracing::error!(%username, error = %e, "stored password hash is unreadable");
        false
    });

    let Some(credential) = credential else {
        tracing::warn!(%username, "authentication failed: user not found");
        return Err(AuthError::Unauthorized);
    };
    if !matches {
        tracing::warn!(%username, "authentication failed: incorrect password");
        return Err(AuthError::Unauthorized);
    }

    tracing::info!(%username, "user authenticated");
    Ok(credential)
}
