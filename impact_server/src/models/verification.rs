//! verification_request — An organization asking to be verified or audited.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::verification_requests;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = verification_requests)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: i64,
    pub organization_id: i64,
    pub requested_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub requested_by: Option<i64>,
    pub reviewed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = verification_requests)]
pub struct NewVerificationRequest {
    pub organization_id: i64,
    pub requested_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub requested_by: Option<i64>,
}

/// Outcome recorded when a reviewer closes a request.
#[derive(Debug, Clone)]
pub struct VerificationResolution {
    pub status: String,
    pub reviewed_by: Option<i64>,
    pub notes: Option<String>,
    pub resolved_at: DateTime<Utc>,
}
