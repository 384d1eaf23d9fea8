//! target_partner — A funder or collaborator an organization is courting.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::target_partners;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = target_partners)]
#[serde(rename_all = "camelCase")]
pub struct TargetPartner {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub partner_type: String,
    pub contact_email: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = target_partners)]
#[serde(rename_all = "camelCase")]
pub struct NewTargetPartner {
    #[serde(default)]
    pub organization_id: i64,
    pub name: String,
    pub partner_type: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_status() -> String {
    "prospect".to_string()
}
