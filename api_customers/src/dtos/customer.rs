use common::{error::Res, validation};
use db::dtos::customer::{CustomerCreateRequest, CustomerUpdateRequest};
use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST /customers` and `PUT /customers/{id}`.
#[derive(Debug, Deserialize, Default)]
pub struct CustomerPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CustomerSearchQuery {
    pub search: Option<String>,
}

fn check_name(name: &str) -> Res<()> {
    validation::check_length("name", name, 3, 50)
}

fn check_phone(phone: &str) -> Res<()> {
    validation::check_digits("phone", phone, 10)
}

fn check_company(company: &str) -> Res<()> {
    validation::check_length("company", company, 0, 100)
}

impl CustomerPayload {
    pub fn into_create(self, owner_id: Uuid) -> Res<CustomerCreateRequest> {
        let name = validation::required("name", self.name)?;
        check_name(&name)?;
        let email = validation::required("email", self.email)?;
        validation::check_email("email", &email)?;
        let phone = validation::required("phone", self.phone)?;
        check_phone(&phone)?;
        if let Some(company) = &self.company {
            check_company(company)?;
        }

        Ok(CustomerCreateRequest {
            name,
            email,
            phone,
            company: self.company,
            owner_id,
        })
    }

    /// Every field is optional; present ones follow the create rules.
    pub fn into_update(self) -> Res<CustomerUpdateRequest> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(email) = &self.email {
            validation::check_email("email", email)?;
        }
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }
        if let Some(company) = &self.company {
            check_company(company)?;
        }

        Ok(CustomerUpdateRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
        })
    }
}
