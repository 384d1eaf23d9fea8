//! invitation — A pending offer for someone to join the dashboard.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::invitations;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = invitations)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    pub organization_id: Option<i64>,
    pub role: String,
    pub token: String,
    pub status: String,
    pub invited_by: Option<i64>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invitations)]
pub struct NewInvitation {
    pub email: String,
    pub organization_id: Option<i64>,
    pub role: String,
    pub token: String,
    pub status: String,
    pub invited_by: Option<i64>,
    pub expires_at: DateTime<Utc>,
}
