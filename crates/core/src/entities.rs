//! Records returned by the backend for list pages, pickers and the
//! statistics view.
//!
//! These mirror the JSON the REST API sends; unknown fields are ignored so
//! the console keeps working when the backend adds columns.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// An option of a select/multi-select input: backend id plus display label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: DbId,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: DbId, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quarter {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Course row on the course list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub drafted: bool,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Challenge row on the challenge list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSummary {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub quarter: Option<Quarter>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub drafted: bool,
}

/// Headline numbers for the statistics view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_accounts: i64,
    pub total_departments: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub active_challenges: i64,
    pub completion_rate: f64,
}

impl From<&Department> for SelectOption {
    fn from(d: &Department) -> Self {
        Self::new(d.id, d.name.clone())
    }
}

impl From<&Category> for SelectOption {
    fn from(c: &Category) -> Self {
        Self::new(c.id, c.name.clone())
    }
}

impl From<&Quarter> for SelectOption {
    fn from(q: &Quarter) -> Self {
        Self::new(q.id, q.name.clone())
    }
}
