use crate::error::AppResult;
use crate::validation;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user as seen through the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
    pub user_id: String, // public handle, unique across the directory
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: &str, first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.trim().to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            phone: None,
            birth_date: None,
            is_public: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.trim().to_string());
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Registration checks. Credentials are not part of the account record.
    pub fn validate(&self, today: NaiveDate) -> AppResult<()> {
        validation::validate_email(&self.email).into_result()?;
        validation::validate_name(&self.first_name).into_result()?;
        validation::validate_name(&self.last_name).into_result()?;
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone).into_result()?;
        }
        if let Some(birth_date) = self.birth_date {
            validation::validate_age(birth_date, today).into_result()?;
        }
        Ok(())
    }
}
