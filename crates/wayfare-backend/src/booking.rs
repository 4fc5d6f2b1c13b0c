//! Reservation checkout and inquiry submission

use futures::future;
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};
use wayfare::{
    EmailTemplate, EmailTemplateKind, Inquiry, InquiryRequest, Reservation, ReservationRequest,
    Service, Validate, new_reservation,
};

use crate::datastore::Datastore;
use crate::error::Result;
use crate::mail::{MailError, Mailer, OutgoingEmail};

/// Result of a submitted inquiry
///
/// The inquiry is saved whenever this is returned. Notification problems do
/// not fail the submission, they are reported in `warning`.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryOutcome {
    pub inquiry: Inquiry,
    pub success: bool,
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct BookingService {
    datastore: Datastore,
    mailer: Arc<dyn Mailer>,
    admin_recipient: Option<String>,
}

impl BookingService {
    pub fn new(
        datastore: Datastore,
        mailer: Arc<dyn Mailer>,
        admin_recipient: Option<String>,
    ) -> Self {
        Self {
            datastore,
            mailer,
            admin_recipient,
        }
    }

    /// Price the request and create a pending reservation
    pub async fn checkout(&self, request: ReservationRequest) -> Result<Reservation> {
        let service = self.datastore.find_service(&request.service_id).await?;
        let reservation = new_reservation(&service, &request, OffsetDateTime::now_utc())?;
        self.datastore.save_reservation(&reservation).await?;

        info!(
            "Created reservation {} for {} (total {:.2})",
            reservation.id, service.name, reservation.total
        );
        Ok(reservation)
    }

    pub async fn reservation(&self, id: &str) -> Result<Reservation> {
        self.datastore.reservation(id).await
    }

    /// Mark a reservation paid; paying twice is a conflict
    pub async fn confirm_payment(&self, id: &str) -> Result<Reservation> {
        let mut reservation = self.datastore.reservation(id).await?;
        reservation.complete_payment(OffsetDateTime::now_utc())?;
        self.datastore.save_reservation(&reservation).await?;

        info!("Reservation {} paid", reservation.id);
        Ok(reservation)
    }

    async fn load_service(&self, request: &InquiryRequest) -> Result<Service> {
        match request.category {
            Some(category) => self.datastore.service(category, &request.service_id).await,
            None => self.datastore.find_service(&request.service_id).await,
        }
    }

    /// Template to render, falling back to the bundled default if the saved
    /// one cannot be read
    async fn template(&self, kind: EmailTemplateKind) -> EmailTemplate {
        self.datastore
            .email_template(kind)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load {} template, using default: {}", kind, e);
                kind.default_template()
            })
    }

    /// Save the inquiry, then notify the admin and the customer
    pub async fn submit_inquiry(&self, request: InquiryRequest) -> Result<InquiryOutcome> {
        request.validate()?;
        let service = self.load_service(&request).await?;

        let inquiry = Inquiry::from_request(request, &service, OffsetDateTime::now_utc());
        self.datastore.save_inquiry(&inquiry).await?;
        info!("Saved inquiry {} for {}", inquiry.id, inquiry.service_name);

        let settings = self.datastore.settings().await.settings;
        let data = inquiry.template_data(&settings);

        let admin_to = self
            .admin_recipient
            .clone()
            .or_else(|| Some(settings.admin_email.clone()))
            .filter(|to| !to.trim().is_empty());
        let admin_email = self
            .template(EmailTemplateKind::AdminNotification)
            .await
            .render(&data);
        let client_email = self
            .template(EmailTemplateKind::ClientConfirmation)
            .await
            .render(&data);

        let admin_send = async {
            let Some(to) = admin_to else {
                return Err(MailError::NotConfigured("ADMIN_NOTIFICATION_EMAIL"));
            };
            self.mailer
                .send(&OutgoingEmail {
                    to,
                    subject: admin_email.subject,
                    html: admin_email.html,
                })
                .await
        };
        let client_send = async {
            match &inquiry.email {
                Some(to) => Some(
                    self.mailer
                        .send(&OutgoingEmail {
                            to: to.clone(),
                            subject: client_email.subject,
                            html: client_email.html,
                        })
                        .await,
                ),
                None => None,
            }
        };
        let (admin_result, client_result) = future::join(admin_send, client_send).await;

        let mut warnings = Vec::new();
        if let Err(e) = admin_result {
            warn!("Admin notification for inquiry {} failed: {}", inquiry.id, e);
            warnings.push(format!("Admin notification was not sent: {}", e));
        }
        if let Some(Err(e)) = client_result {
            warn!("Confirmation for inquiry {} failed: {}", inquiry.id, e);
            warnings.push(format!("Confirmation email was not sent: {}", e));
        }

        Ok(InquiryOutcome {
            inquiry,
            success: true,
            warning: if warnings.is_empty() {
                None
            } else {
                Some(warnings.join("; "))
            },
        })
    }
}
