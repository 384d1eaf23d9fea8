//! report — A published annual, impact or financial report.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::reports;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = reports)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub organization_id: i64,
    pub title: String,
    pub report_type: String,
    pub year: i32,
    pub summary: Option<String>,
    pub file_url: Option<String>,
    pub verification_type: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = reports)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    #[serde(default)]
    pub organization_id: i64,
    pub title: String,
    pub report_type: String,
    pub year: i32,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default = "default_verification_type")]
    pub verification_type: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

fn default_verification_type() -> String {
    "self-reported".to_string()
}
