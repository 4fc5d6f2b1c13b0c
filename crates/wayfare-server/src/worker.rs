//! Background worker for fire-and-forget admin writes
//!
//! Toggling a service flag answers right away with the intended state. The
//! write itself is queued here and applied in order, once. When it fails the
//! worker publishes a compensating event carrying the state to roll back to.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};
use wayfare::{Service, ServiceCategory};

use crate::{AppState, error::Result};

/// A queued flag write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteJob {
    SetActive {
        category: ServiceCategory,
        id: String,
        value: bool,
    },
    SetBestOffer {
        category: ServiceCategory,
        id: String,
        value: bool,
    },
}

impl WriteJob {
    /// The same write with the flag flipped back
    pub fn inverse(&self) -> Self {
        match self.clone() {
            WriteJob::SetActive {
                category,
                id,
                value,
            } => WriteJob::SetActive {
                category,
                id,
                value: !value,
            },
            WriteJob::SetBestOffer {
                category,
                id,
                value,
            } => WriteJob::SetBestOffer {
                category,
                id,
                value: !value,
            },
        }
    }

    /// What the service looks like once the write lands
    pub fn project(&self, mut service: Service) -> Service {
        match self {
            WriteJob::SetActive { value, .. } => service.active = *value,
            WriteJob::SetBestOffer { value, .. } => service.best_offer = *value,
        }
        service
    }
}

/// Outcome of a queued write, streamed to back office clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AdminEvent {
    WriteApplied {
        job: WriteJob,
    },
    WriteFailed {
        job: WriteJob,
        rollback: WriteJob,
        error: String,
    },
}

/// Background worker that applies queued writes
pub struct WriteWorker {
    state: AppState,
    job_receiver: UnboundedReceiver<WriteJob>,
}

impl WriteWorker {
    /// Create a new write worker
    pub fn new(state: AppState, job_receiver: UnboundedReceiver<WriteJob>) -> Self {
        Self {
            state,
            job_receiver,
        }
    }

    /// Start the worker loop
    pub async fn start(mut self) {
        info!("Starting admin write worker");

        loop {
            // Wait for job from channel
            match self.job_receiver.recv().await {
                Some(job) => self.process_job(job).await,
                None => {
                    info!("Job channel closed, shutting down worker");
                    break;
                }
            }
        }
    }

    async fn process_job(&self, job: WriteJob) {
        debug!("Applying {:?}", job);

        let result = self.apply(&job).await;
        let event = match result {
            Ok(()) => AdminEvent::WriteApplied { job },
            Err(e) => {
                error!("Queued write {:?} failed: {}", job, e);
                AdminEvent::WriteFailed {
                    rollback: job.inverse(),
                    job,
                    error: e.to_string(),
                }
            }
        };

        // Nobody listening is fine
        let _ = self.state.events.send(event);
    }

    async fn apply(&self, job: &WriteJob) -> Result<()> {
        let datastore = &self.state.backend.datastore;
        match job {
            WriteJob::SetActive {
                category,
                id,
                value,
            } => {
                datastore.set_service_active(*category, id, *value).await?;
            }
            WriteJob::SetBestOffer {
                category,
                id,
                value,
            } => {
                datastore.set_best_offer(*category, id, *value).await?;
            }
        }
        Ok(())
    }
}

/// Spawn the write worker as a background task
pub fn spawn_write_worker(state: AppState, job_receiver: UnboundedReceiver<WriteJob>) {
    let worker = WriteWorker::new(state, job_receiver);
    tokio::spawn(async move {
        worker.start().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_flips_only_the_value() {
        let job = WriteJob::SetBestOffer {
            category: ServiceCategory::Trips,
            id: "s1".to_string(),
            value: true,
        };
        assert_eq!(
            job.inverse(),
            WriteJob::SetBestOffer {
                category: ServiceCategory::Trips,
                id: "s1".to_string(),
                value: false,
            }
        );
        assert_eq!(job.inverse().inverse(), job);
    }

    #[test]
    fn test_projection() {
        let service = Service::new(ServiceCategory::Cars, "Clio", 40.0);
        let job = WriteJob::SetActive {
            category: ServiceCategory::Cars,
            id: service.id.clone(),
            value: false,
        };
        assert!(!job.project(service).active);
    }

    #[test]
    fn test_failed_event_shape() {
        let job = WriteJob::SetActive {
            category: ServiceCategory::Cars,
            id: "s1".to_string(),
            value: false,
        };
        let event = AdminEvent::WriteFailed {
            rollback: job.inverse(),
            job,
            error: "offline".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "write_failed");
        assert_eq!(json["rollback"]["kind"], "set_active");
        assert_eq!(json["rollback"]["value"], true);
    }
}
