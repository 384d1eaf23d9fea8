//! workflow — An ordered checklist an organization tracks (onboarding, audit prep).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::workflows;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = workflows)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub status: String,
    pub steps: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = workflows)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflow {
    #[serde(default)]
    pub organization_id: i64,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "empty_steps")]
    pub steps: serde_json::Value,
}

fn default_status() -> String {
    "draft".to_string()
}

fn empty_steps() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}
