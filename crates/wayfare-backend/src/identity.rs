//! Authentication identities
//!
//! The provider owns email/password identities and issues signed tokens. The
//! local implementation hashes passwords with Argon2id, stores identities as
//! documents and signs HS256 JWTs.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;
use wayfare::new_id;

use crate::datastore::Datastore;
use crate::error::{BackendError, Result};
use crate::storage::DocumentStore;

pub const IDENTITIES: &str = "identities";

/// Who a verified token belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// A successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity, returning its uid
    async fn create_user(&self, email: &str, password: &str) -> Result<String>;

    /// Remove an identity; tokens issued to it stop verifying
    async fn delete_user(&self, uid: &str) -> Result<()>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Check a token; every failure is `Unauthorized`
    async fn verify_token(&self, token: &str) -> Result<Identity>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredIdentity {
    uid: String,
    email: String,
    password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BackendError::Identity(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct LocalIdentityProvider {
    datastore: Datastore,
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: time::Duration,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>, secret: &[u8], token_ttl: time::Duration) -> Self {
        Self {
            datastore: Datastore::new(store),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            token_ttl,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>> {
        let email = normalize_email(email);
        let identities: Vec<StoredIdentity> = self.datastore.list_docs(IDENTITIES).await?;
        Ok(identities.into_iter().find(|identity| identity.email == email))
    }

    fn issue(&self, identity: &StoredIdentity) -> Result<Session> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.token_ttl;
        let claims = Claims {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| BackendError::Identity(format!("Failed to sign token: {}", e)))?;

        Ok(Session {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            token,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> Result<String> {
        if self.find_by_email(email).await?.is_some() {
            return Err(BackendError::Conflict(format!(
                "An account already exists for {}",
                email.trim()
            )));
        }

        let identity = StoredIdentity {
            uid: new_id(),
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            created_at: OffsetDateTime::now_utc(),
        };
        self.datastore
            .put_doc(IDENTITIES, &identity.uid, &identity)
            .await?;

        info!("Created identity {} for {}", identity.uid, identity.email);
        Ok(identity.uid)
    }

    async fn delete_user(&self, uid: &str) -> Result<()> {
        if !self.datastore.store().delete(IDENTITIES, uid).await? {
            return Err(BackendError::NotFound(format!("Identity {}", uid)));
        }
        info!("Deleted identity {}", uid);
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || BackendError::Unauthorized("Invalid email or password".to_string());
        let identity = self.find_by_email(email).await?.ok_or_else(invalid)?;
        if !verify_password(password, &identity.password_hash) {
            return Err(invalid());
        }
        self.issue(&identity)
    }

    async fn verify_token(&self, token: &str) -> Result<Identity> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| BackendError::Unauthorized(format!("Invalid token: {}", e)))?
            .claims;

        let stored: Option<StoredIdentity> =
            self.datastore.get_doc(IDENTITIES, &claims.sub).await?;
        match stored {
            Some(identity) => Ok(Identity {
                uid: identity.uid,
                email: identity.email,
            }),
            None => Err(BackendError::Unauthorized(
                "Identity no longer exists".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::new(
            Arc::new(MemoryStore::new()),
            b"test-secret",
            time::Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn test_sign_in_and_verify() {
        let provider = provider();
        let uid = provider
            .create_user("Ana@Example.com ", "correct horse")
            .await
            .unwrap();

        let session = provider.sign_in("ana@example.com", "correct horse").await.unwrap();
        assert_eq!(session.uid, uid);

        let identity = provider.verify_token(&session.token).await.unwrap();
        assert_eq!(identity.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let provider = provider();
        provider.create_user("ana@example.com", "correct horse").await.unwrap();
        assert!(matches!(
            provider.sign_in("ana@example.com", "wrong").await,
            Err(BackendError::Unauthorized(_))
        ));
        assert!(matches!(
            provider.sign_in("bob@example.com", "correct horse").await,
            Err(BackendError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let provider = provider();
        provider.create_user("ana@example.com", "correct horse").await.unwrap();
        assert!(matches!(
            provider.create_user("ANA@example.com", "other password").await,
            Err(BackendError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_tokens_fail_closed() {
        let provider = provider();
        assert!(matches!(
            provider.verify_token("garbage").await,
            Err(BackendError::Unauthorized(_))
        ));

        let uid = provider.create_user("ana@example.com", "correct horse").await.unwrap();
        let session = provider.sign_in("ana@example.com", "correct horse").await.unwrap();
        provider.delete_user(&uid).await.unwrap();
        assert!(matches!(
            provider.verify_token(&session.token).await,
            Err(BackendError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let provider = provider();
        let other = LocalIdentityProvider::new(
            Arc::new(MemoryStore::new()),
            b"another-secret",
            time::Duration::hours(1),
        );
        other.create_user("ana@example.com", "correct horse").await.unwrap();
        let session = other.sign_in("ana@example.com", "correct horse").await.unwrap();
        assert!(provider.verify_token(&session.token).await.is_err());
    }
}
