//! Typed access to the document store
//!
//! Layout of the persisted documents:
//! - `settings/site`: the settings override document
//! - `email_templates/{admin_notification,client_confirmation}`
//! - `services_<category>`: one collection per service category
//! - `reservations`, `inquiries`, `reviews`, `admins`, `media_assets`

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};
use wayfare::{
    AdminAccount, Category, EmailTemplate, EmailTemplateKind, Inquiry, Reservation, Review,
    Service, ServiceCategory, SettingsOverride, SettingsSnapshot, Validate, validate_categories,
};

use crate::error::{BackendError, Result};
use crate::storage::DocumentStore;

pub const SETTINGS: &str = "settings";
pub const SETTINGS_DOCUMENT: &str = "site";
pub const EMAIL_TEMPLATES: &str = "email_templates";
pub const RESERVATIONS: &str = "reservations";
pub const INQUIRIES: &str = "inquiries";
pub const REVIEWS: &str = "reviews";
pub const ADMINS: &str = "admins";
pub const MEDIA_ASSETS: &str = "media_assets";

/// Collection holding the services of `category`
pub fn services_collection(category: ServiceCategory) -> String {
    format!("services_{}", category.as_str())
}

#[derive(Clone)]
pub struct Datastore {
    store: Arc<dyn DocumentStore>,
}

impl Datastore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub(crate) async fn get_doc<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        match self.store.get(collection, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn list_docs<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        self.store
            .list(collection)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(BackendError::from))
            .collect()
    }

    pub(crate) async fn put_doc<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<()> {
        self.store
            .put(collection, id, serde_json::to_value(document)?)
            .await
    }

    // Settings

    pub async fn settings_override(&self) -> Result<Option<SettingsOverride>> {
        self.get_doc(SETTINGS, SETTINGS_DOCUMENT).await
    }

    /// Effective settings; a failed read logs a warning and yields the defaults
    pub async fn settings(&self) -> SettingsSnapshot {
        match self.settings_override().await {
            Ok(overrides) => SettingsSnapshot::resolved(overrides.as_ref()),
            Err(e) => {
                warn!("Failed to load settings, serving defaults: {}", e);
                SettingsSnapshot::resolved(None)
            }
        }
    }

    /// Overwrite the settings document
    pub async fn save_settings(&self, overrides: &SettingsOverride) -> Result<()> {
        overrides.validate()?;
        self.put_doc(SETTINGS, SETTINGS_DOCUMENT, overrides).await?;
        debug!("Saved settings document");
        Ok(())
    }

    /// Replace the category list, keeping the rest of the settings document
    pub async fn save_categories(&self, categories: Vec<Category>) -> Result<()> {
        validate_categories(&categories)?;
        let mut overrides = self.settings_override().await?.unwrap_or_default();
        overrides.categories = Some(categories);
        self.save_settings(&overrides).await
    }

    // Email templates

    pub async fn email_template_override(
        &self,
        kind: EmailTemplateKind,
    ) -> Result<Option<EmailTemplate>> {
        self.get_doc(EMAIL_TEMPLATES, kind.document_id()).await
    }

    /// The saved template, or the bundled default when none was saved
    pub async fn email_template(&self, kind: EmailTemplateKind) -> Result<EmailTemplate> {
        Ok(self
            .email_template_override(kind)
            .await?
            .unwrap_or_else(|| kind.default_template()))
    }

    pub async fn save_email_template(&self, mut template: EmailTemplate) -> Result<EmailTemplate> {
        template.validate()?;
        template.updated_at = Some(OffsetDateTime::now_utc());
        self.put_doc(EMAIL_TEMPLATES, template.kind.document_id(), &template)
            .await?;
        Ok(template)
    }

    // Services

    pub async fn services(&self, category: ServiceCategory) -> Result<Vec<Service>> {
        self.list_docs(&services_collection(category)).await
    }

    /// Every service, category by category
    pub async fn all_services(&self) -> Result<Vec<Service>> {
        let mut services = Vec::new();
        for category in ServiceCategory::ALL {
            services.extend(self.services(category).await?);
        }
        Ok(services)
    }

    pub async fn service(&self, category: ServiceCategory, id: &str) -> Result<Service> {
        self.get_doc(&services_collection(category), id)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("Service {}", id)))
    }

    /// Look a service up when the category is not known
    pub async fn find_service(&self, id: &str) -> Result<Service> {
        for category in ServiceCategory::ALL {
            if let Some(service) = self.get_doc(&services_collection(category), id).await? {
                return Ok(service);
            }
        }
        Err(BackendError::NotFound(format!("Service {}", id)))
    }

    pub async fn save_service(&self, service: &Service) -> Result<()> {
        service.validate()?;
        self.put_doc(&services_collection(service.category), &service.id, service)
            .await
    }

    pub async fn delete_service(&self, category: ServiceCategory, id: &str) -> Result<()> {
        if !self.store.delete(&services_collection(category), id).await? {
            return Err(BackendError::NotFound(format!("Service {}", id)));
        }
        Ok(())
    }

    /// "Save all": write the full list of a category in one go
    pub async fn replace_services(
        &self,
        category: ServiceCategory,
        services: Vec<Service>,
    ) -> Result<()> {
        let mut documents = Vec::with_capacity(services.len());
        for service in services {
            if service.category != category {
                return Err(BackendError::invalid(
                    "category",
                    "Every service must belong to the category being saved",
                ));
            }
            service.validate()?;
            if documents.iter().any(|(id, _)| *id == service.id) {
                return Err(BackendError::invalid("id", "Duplicate service id"));
            }
            documents.push((service.id.clone(), serde_json::to_value(&service)?));
        }
        self.store
            .replace_collection(&services_collection(category), documents)
            .await
    }

    /// Flip the active flag, returning the updated service
    pub async fn set_service_active(
        &self,
        category: ServiceCategory,
        id: &str,
        active: bool,
    ) -> Result<Service> {
        let mut service = self.service(category, id).await?;
        service.active = active;
        self.put_doc(&services_collection(category), id, &service)
            .await?;
        Ok(service)
    }

    pub async fn set_best_offer(
        &self,
        category: ServiceCategory,
        id: &str,
        best_offer: bool,
    ) -> Result<Service> {
        let mut service = self.service(category, id).await?;
        service.best_offer = best_offer;
        self.put_doc(&services_collection(category), id, &service)
            .await?;
        Ok(service)
    }

    // Reviews

    pub async fn reviews(&self, service_id: Option<&str>) -> Result<Vec<Review>> {
        let reviews: Vec<Review> = self.list_docs(REVIEWS).await?;
        Ok(match service_id {
            Some(service_id) => reviews
                .into_iter()
                .filter(|r| r.service_id == service_id)
                .collect(),
            None => reviews,
        })
    }

    pub async fn save_review(&self, review: &Review) -> Result<()> {
        self.put_doc(REVIEWS, &review.id, review).await
    }

    pub async fn delete_review(&self, id: &str) -> Result<()> {
        if !self.store.delete(REVIEWS, id).await? {
            return Err(BackendError::NotFound(format!("Review {}", id)));
        }
        Ok(())
    }

    // Reservations and inquiries

    pub async fn reservations(&self) -> Result<Vec<Reservation>> {
        self.list_docs(RESERVATIONS).await
    }

    pub async fn reservation(&self, id: &str) -> Result<Reservation> {
        self.get_doc(RESERVATIONS, id)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("Reservation {}", id)))
    }

    pub async fn save_reservation(&self, reservation: &Reservation) -> Result<()> {
        self.put_doc(RESERVATIONS, &reservation.id, reservation)
            .await
    }

    pub async fn inquiries(&self) -> Result<Vec<Inquiry>> {
        self.list_docs(INQUIRIES).await
    }

    pub async fn save_inquiry(&self, inquiry: &Inquiry) -> Result<()> {
        self.put_doc(INQUIRIES, &inquiry.id, inquiry).await
    }

    // Admin records

    pub async fn admins(&self) -> Result<Vec<AdminAccount>> {
        self.list_docs(ADMINS).await
    }

    pub async fn admin(&self, uid: &str) -> Result<Option<AdminAccount>> {
        self.get_doc(ADMINS, uid).await
    }

    pub async fn save_admin(&self, admin: &AdminAccount) -> Result<()> {
        self.put_doc(ADMINS, &admin.id, admin).await
    }

    pub async fn delete_admin(&self, uid: &str) -> Result<bool> {
        self.store.delete(ADMINS, uid).await
    }
}
