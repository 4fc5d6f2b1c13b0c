//! Admin accounts: an identity plus a role record
//!
//! Every privileged call starts from a token. `authorize` turns it into the
//! caller's admin record, and each check fails closed: a bad token is
//! `Unauthorized`, a valid token without the required role is `Forbidden`.

use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};
use wayfare::{AdminAccount, AdminForm, AdminRole, Validate};

use crate::datastore::Datastore;
use crate::error::{BackendError, Result};
use crate::identity::{IdentityProvider, Session};

#[derive(Clone)]
pub struct AdminService {
    datastore: Datastore,
    identity: Arc<dyn IdentityProvider>,
}

impl AdminService {
    pub fn new(datastore: Datastore, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            datastore,
            identity,
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.identity.sign_in(email, password).await
    }

    /// The admin behind `token`
    pub async fn authorize(&self, token: &str) -> Result<AdminAccount> {
        let identity = self.identity.verify_token(token).await?;
        self.datastore
            .admin(&identity.uid)
            .await?
            .ok_or_else(|| BackendError::Forbidden("Not an administrator".to_string()))
    }

    /// The superadmin behind `token`
    pub async fn authorize_superadmin(&self, token: &str) -> Result<AdminAccount> {
        let admin = self.authorize(token).await?;
        require_superadmin(&admin)?;
        Ok(admin)
    }

    pub async fn list(&self) -> Result<Vec<AdminAccount>> {
        self.datastore.admins().await
    }

    /// Create the identity and the admin record
    ///
    /// Granting the superadmin role takes a superadmin.
    pub async fn add(&self, caller: &AdminAccount, form: AdminForm) -> Result<AdminAccount> {
        form.validate()?;
        if form.role == AdminRole::Superadmin {
            require_superadmin(caller)?;
        }

        let uid = self.identity.create_user(&form.email, &form.password).await?;
        let admin = AdminAccount {
            id: uid,
            email: form.email.trim().to_lowercase(),
            role: form.role,
            created_at: OffsetDateTime::now_utc(),
        };
        if let Err(e) = self.datastore.save_admin(&admin).await {
            // Without the record the identity is unusable, drop it
            if let Err(cleanup) = self.identity.delete_user(&admin.id).await {
                warn!("Failed to remove identity {} after error: {}", admin.id, cleanup);
            }
            return Err(e);
        }

        info!("{} added admin {} ({})", caller.email, admin.email, admin.role.as_str());
        Ok(admin)
    }

    pub async fn promote(&self, caller: &AdminAccount, uid: &str) -> Result<AdminAccount> {
        require_superadmin(caller)?;
        let mut admin = self
            .datastore
            .admin(uid)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("Admin {}", uid)))?;

        admin.role = AdminRole::Superadmin;
        self.datastore.save_admin(&admin).await?;

        info!("{} promoted {} to superadmin", caller.email, admin.email);
        Ok(admin)
    }

    /// Delete another admin's identity and record
    pub async fn remove(&self, caller: &AdminAccount, uid: &str) -> Result<()> {
        require_superadmin(caller)?;
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(BackendError::invalid("uid", "uid is required"));
        }
        if uid == caller.id {
            return Err(BackendError::invalid("uid", "You cannot remove your own account"));
        }

        match self.identity.delete_user(uid).await {
            Ok(()) | Err(BackendError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.datastore.delete_admin(uid).await?;

        info!("{} removed admin {}", caller.email, uid);
        Ok(())
    }

    /// Make sure the configured bootstrap account exists as a superadmin
    pub async fn bootstrap_superadmin(&self, email: &str, password: &str) -> Result<AdminAccount> {
        let uid = match self.identity.create_user(email, password).await {
            Ok(uid) => uid,
            Err(BackendError::Conflict(_)) => self.identity.sign_in(email, password).await?.uid,
            Err(e) => return Err(e),
        };

        let admin = match self.datastore.admin(&uid).await? {
            Some(existing) if existing.is_superadmin() => return Ok(existing),
            Some(existing) => AdminAccount {
                role: AdminRole::Superadmin,
                ..existing
            },
            None => AdminAccount {
                id: uid,
                email: email.trim().to_lowercase(),
                role: AdminRole::Superadmin,
                created_at: OffsetDateTime::now_utc(),
            },
        };
        self.datastore.save_admin(&admin).await?;

        info!("Bootstrapped superadmin {}", admin.email);
        Ok(admin)
    }
}

fn require_superadmin(admin: &AdminAccount) -> Result<()> {
    if admin.is_superadmin() {
        Ok(())
    } else {
        Err(BackendError::Forbidden(
            "Superadmin role required".to_string(),
        ))
    }
}
