use common::scope::Scope;
use uuid::Uuid;

use crate::models::lead::LeadStatus;

#[derive(Debug)]
pub struct LeadCreateRequest {
    pub customer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: LeadStatus,
    pub value: f64,
}

#[derive(Debug, Default, Clone)]
pub struct LeadUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<LeadStatus>,
    pub value: Option<f64>,
}

/// Which leads a listing covers.
#[derive(Debug, Clone, Copy)]
pub enum LeadSelection {
    /// Leads of one customer whose scope was already checked.
    Customer(Uuid),
    /// Leads of every customer visible under the scope.
    Visible(Scope),
}

#[derive(Debug, Clone, Copy)]
pub struct LeadFilter {
    pub selection: LeadSelection,
    pub status: Option<LeadStatus>,
}
