//! Request and response bodies for the REST API.

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::organization::Organization;
use crate::services::scoring::{self, SubScores};

pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const MAX_ACTIVITY_LIMIT: usize = 200;

/// `Json` extractor whose rejections render as `{"message"}` 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Requested limit, defaulted and capped.
    pub fn resolve(&self, default: usize, max: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}

/// Organization with its derived score fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub impact_grade: &'static str,
    pub score_change: Option<i32>,
    pub scores: SubScores,
}

impl From<Organization> for OrganizationDetail {
    fn from(organization: Organization) -> Self {
        Self {
            impact_grade: scoring::grade(organization.impact_score),
            score_change: organization.score_delta(),
            scores: organization.sub_scores(),
            organization,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVerificationRequest {
    pub requested_type: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub requested_by: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveVerificationRequest {
    pub status: String,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub invited_by: Option<i64>,
}

fn default_role() -> String {
    "member".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}
