//! metric — A measured outcome figure, optionally tied to a program.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::organization_metrics;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = organization_metrics)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: i64,
    pub organization_id: i64,
    pub program_id: Option<i64>,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub target: Option<f64>,
    pub period: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = organization_metrics)]
#[serde(rename_all = "camelCase")]
pub struct NewMetric {
    #[serde(default)]
    pub organization_id: i64,
    #[serde(default)]
    pub program_id: Option<i64>,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "annual".to_string()
}
