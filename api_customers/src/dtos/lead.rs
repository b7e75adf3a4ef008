use common::{
    error::{AppError, Res},
    validation,
};
use db::{
    dtos::lead::{LeadCreateRequest, LeadUpdateRequest},
    models::lead::LeadStatus,
};
use serde::Deserialize;
use uuid::Uuid;

/// Body of lead create and update requests.
#[derive(Debug, Deserialize, Default)]
pub struct LeadPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LeadStatusQuery {
    pub status: Option<String>,
}

/// What a `?status=` query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    Only(LeadStatus),
    /// A value no lead can carry. Matches nothing.
    Unmatched,
}

impl LeadStatusQuery {
    /// An empty `status` is treated as absent.
    pub fn filter(&self) -> StatusFilter {
        match self.status.as_deref() {
            None | Some("") => StatusFilter::Any,
            Some(raw) => raw
                .parse()
                .map(StatusFilter::Only)
                .unwrap_or(StatusFilter::Unmatched),
        }
    }
}

pub fn parse_status(raw: &str) -> Res<LeadStatus> {
    raw.parse().map_err(|_| status_error())
}

fn status_error() -> AppError {
    let allowed: Vec<&str> = LeadStatus::ALL.iter().map(LeadStatus::as_str).collect();
    validation::one_of("status", &allowed)
}

fn check_title(title: &str) -> Res<()> {
    validation::check_length("title", title, 3, 100)
}

fn check_description(description: &str) -> Res<()> {
    validation::check_length("description", description, 0, 500)
}

fn check_value(value: f64) -> Res<()> {
    validation::check_min("value", value, 0.0)
}

impl LeadPayload {
    /// The customer id comes from the path, never from the body.
    pub fn into_create(self, customer_id: Uuid) -> Res<LeadCreateRequest> {
        let title = validation::required("title", self.title)?;
        check_title(&title)?;
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        let status = self.status.as_deref().map(parse_status).transpose()?;
        let value = self.value.unwrap_or(0.0);
        check_value(value)?;

        Ok(LeadCreateRequest {
            customer_id,
            title,
            description: self.description,
            status: status.unwrap_or_default(),
            value,
        })
    }

    pub fn into_update(self) -> Res<LeadUpdateRequest> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        let status = self.status.as_deref().map(parse_status).transpose()?;
        if let Some(value) = self.value {
            check_value(value)?;
        }

        Ok(LeadUpdateRequest {
            title: self.title,
            description: self.description,
            status,
            value: self.value,
        })
    }
}
