use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

/// Publishes committed domain events to NATS; without a connection they are only logged.
pub async fn publish(nats: Option<&async_nats::Client>, events: Vec<DomainEvent>) {
    for event in events {
        let subject = event.subject();
        let Some(client) = nats else {
            debug!(%subject, ?event, "domain event");
            continue;
        };
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                    warn!(%subject, error = %e, "failed to publish event");
                }
            }
            Err(e) => warn!(%subject, error = %e, "failed to encode event"),
        }
    }
}
