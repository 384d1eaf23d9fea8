//! statistic — A curated headline figure shown on the marketing pages.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::statistics;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = statistics)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub value: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = statistics)]
pub struct NewStatistic {
    pub name: String,
    pub label: String,
    pub value: i64,
}
