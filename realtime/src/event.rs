use db::models::{customer::CustomerView, lead::Lead};
use serde::Serialize;
use uuid::Uuid;

/// Mutation notifications, serialized as `{"event": "<name>", "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Event {
    CustomerCreated(CustomerView),
    CustomerUpdated(CustomerView),
    /// Carries the bare id of the removed customer.
    CustomerDeleted(Uuid),
    LeadCreated(Lead),
    LeadUpdated(Lead),
    LeadDeleted(LeadDeleted),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDeleted {
    pub lead_id: Uuid,
    pub customer_id: Uuid,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CustomerCreated(_) => "customerCreated",
            Event::CustomerUpdated(_) => "customerUpdated",
            Event::CustomerDeleted(_) => "customerDeleted",
            Event::LeadCreated(_) => "leadCreated",
            Event::LeadUpdated(_) => "leadUpdated",
            Event::LeadDeleted(_) => "leadDeleted",
        }
    }
}
