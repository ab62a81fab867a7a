use tracing::info;

use crate::domain::events::ProjectDomainEvent;
use crate::domain::ports::EventPublisher;

/// Default publisher: one structured log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher<ProjectDomainEvent> for TracingEventPublisher {
    fn publish(&self, event: &ProjectDomainEvent) {
        info!(target: "projects::events", event = event.name(), details = ?event, "domain event");
    }
}
