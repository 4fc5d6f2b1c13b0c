//! # Wayfare Backend
//!
//! Adapters for the platforms the storefront runs on, and the workflows built
//! on top of them:
//! - a JSON document store (SQLite, or in memory for tests)
//! - media blobs behind the public CDN (S3-compatible, or in memory)
//! - email/password identities with signed tokens
//! - an HTTP transactional mail API
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wayfare::{InquiryRequest, ServiceCategory};
//! use wayfare_backend::Backend;
//! use wayfare_backend::mail::{HttpMailer, MailConfig};
//! use wayfare_backend::storage::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Backend::builder(Arc::new(MemoryStore::new()), b"jwt-secret")
//!     .mailer(Arc::new(HttpMailer::new(MailConfig::default())))
//!     .build();
//!
//! let services = backend.datastore.services(ServiceCategory::Trips).await?;
//! let outcome = backend
//!     .booking
//!     .submit_inquiry(InquiryRequest {
//!         service_id: services[0].id.clone(),
//!         name: "Ana".to_string(),
//!         email: Some("ana@example.com".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("Inquiry {} saved, warning: {:?}", outcome.inquiry.id, outcome.warning);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod admins;
pub mod booking;
pub mod datastore;
pub mod error;
pub mod identity;
pub mod mail;
pub mod media;
pub mod storage;

use std::sync::Arc;

pub use admins::AdminService;
pub use booking::{BookingService, InquiryOutcome};
pub use datastore::Datastore;
pub use error::{BackendError, Result};
pub use identity::{Identity, IdentityProvider, LocalIdentityProvider, Session};
pub use mail::{Mailer, OutgoingEmail};
pub use media::{MediaAsset, MediaLibrary, MediaStatus, Upload};
pub use storage::{BlobStorage, DocumentStore};

#[cfg(feature = "sqlite")]
pub use storage::sqlite_storage::SqliteStore;

#[cfg(feature = "s3")]
pub use storage::s3_storage::S3Storage;

/// Default lifetime of identity tokens
pub const DEFAULT_TOKEN_TTL: time::Duration = time::Duration::hours(12);

/// Everything the HTTP layer talks to, built once per process
#[derive(Clone)]
pub struct Backend {
    pub datastore: Datastore,
    pub booking: BookingService,
    pub admins: AdminService,
    /// `None` when media credentials are not configured
    pub media: Option<MediaLibrary>,
}

impl Backend {
    pub fn builder(store: Arc<dyn DocumentStore>, jwt_secret: &[u8]) -> BackendBuilder {
        BackendBuilder {
            identity: Arc::new(LocalIdentityProvider::new(
                store.clone(),
                jwt_secret,
                DEFAULT_TOKEN_TTL,
            )),
            store,
            jwt_secret: jwt_secret.to_vec(),
            mailer: None,
            admin_recipient: None,
            media: None,
        }
    }
}

pub struct BackendBuilder {
    store: Arc<dyn DocumentStore>,
    jwt_secret: Vec<u8>,
    identity: Arc<dyn IdentityProvider>,
    mailer: Option<Arc<dyn Mailer>>,
    admin_recipient: Option<String>,
    media: Option<(Arc<dyn BlobStorage>, String)>,
}

impl BackendBuilder {
    pub fn token_ttl(mut self, ttl: time::Duration) -> Self {
        self.identity = Arc::new(LocalIdentityProvider::new(
            self.store.clone(),
            &self.jwt_secret,
            ttl,
        ));
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn admin_recipient(mut self, recipient: Option<String>) -> Self {
        self.admin_recipient = recipient;
        self
    }

    /// Enable the media library over `blobs`, served from `public_base_url`
    pub fn media(mut self, blobs: Arc<dyn BlobStorage>, public_base_url: impl Into<String>) -> Self {
        self.media = Some((blobs, public_base_url.into()));
        self
    }

    pub fn build(self) -> Backend {
        let datastore = Datastore::new(self.store);
        let mailer = self
            .mailer
            .unwrap_or_else(|| Arc::new(mail::HttpMailer::new(mail::MailConfig::default())));

        Backend {
            booking: BookingService::new(datastore.clone(), mailer, self.admin_recipient),
            admins: AdminService::new(datastore.clone(), self.identity),
            media: self
                .media
                .map(|(blobs, url)| MediaLibrary::new(blobs, datastore.clone(), url)),
            datastore,
        }
    }
}
