use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn, Instrument};

use super::reap;
use crate::backends::Mailer;
use crate::clients::NotifierClient;
use crate::domain::Email;
use crate::error::NotifyError;
use crate::messages::{NotifierRequest, ServiceResponse};
use crate::retry::RetryPolicy;

/// Best-effort email delivery.
///
/// A `Notify` request is acknowledged as soon as the email is queued. Delivery
/// and its retries happen on background tasks whose failures are only logged.
/// Pending deliveries are drained before the service stops.
pub struct NotifierService {
    receiver: mpsc::Receiver<NotifierRequest>,
    mailer: Arc<dyn Mailer>,
    retry: RetryPolicy,
    deliveries: JoinSet<()>,
}

impl NotifierService {
    pub fn new(buffer_size: usize, mailer: Arc<dyn Mailer>, retry: RetryPolicy) -> (Self, NotifierClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            mailer,
            retry,
            deliveries: JoinSet::new(),
        };
        (service, NotifierClient::new(sender))
    }

    #[instrument(name = "notifier_service", skip(self))]
    pub async fn run(mut self) {
        info!("NotifierService starting");
        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(NotifierRequest::Notify { email, respond_to }) => {
                        self.handle_notify(email, respond_to);
                    }
                    Some(NotifierRequest::Shutdown) => {
                        info!("NotifierService shutting down");
                        break;
                    }
                    None => break,
                },
                Some(result) = self.deliveries.join_next(), if !self.deliveries.is_empty() => {
                    reap(result);
                }
            }
        }

        if !self.deliveries.is_empty() {
            info!(pending = self.deliveries.len(), "Draining deliveries");
        }
        while let Some(result) = self.deliveries.join_next().await {
            reap(result);
        }
        info!("NotifierService stopped");
    }

    #[instrument(fields(subject = %email.subject), skip(self, email, respond_to))]
    fn handle_notify(&mut self, email: Email, respond_to: ServiceResponse<(), NotifyError>) {
        info!("Queueing notification");
        let mailer = Arc::clone(&self.mailer);
        let retry = self.retry;

        self.deliveries.spawn(
            async move {
                match retry.run("notify", |_| mailer.send(&email)).await {
                    Ok(()) => info!("Notification delivered"),
                    Err(e) => warn!(error = %e, "Notification dropped"),
                }
            }
            .in_current_span(),
        );
        let _ = respond_to.send(Ok(()));
    }
}
