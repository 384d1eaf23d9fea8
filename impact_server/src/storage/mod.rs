//! Storage interface and its two backends.
//!
//! `MemStorage` keeps everything in process (seeded with the mock dataset);
//! `PgStorage` maps the same operations onto the relational schema. The
//! read models (leaderboard, solutions, ...) are default methods built on
//! `list_organizations`, so both backends answer them identically.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::activity::{ActivityLog, NewActivityLog};
use crate::models::invitation::{Invitation, NewInvitation};
use crate::models::metric::{Metric, NewMetric};
use crate::models::notification::{NewNotification, Notification};
use crate::models::organization::{
    NewOrganization, Organization, OrganizationChanges, OrganizationFilter,
};
use crate::models::partner::{NewTargetPartner, TargetPartner};
use crate::models::program::{NewProgram, Program};
use crate::models::report::{NewReport, Report};
use crate::models::statistic::{NewStatistic, Statistic};
use crate::models::user::{NewUser, User};
use crate::models::verification::{
    NewVerificationRequest, VerificationRequest, VerificationResolution,
};
use crate::models::workflow::{NewWorkflow, Workflow};
use crate::services::ranking::{
    self, LeaderboardEntry, LeaderboardQuery, PlatformStatistics, SolutionMatch, SolutionsQuery,
    TrendingEntry,
};

pub use memory::MemStorage;
pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An organization with the child rows and audit entry written alongside it.
/// Child and activity `organization_id`s are filled in by the backend.
#[derive(Debug, Clone)]
pub struct OrganizationBundle {
    pub organization: NewOrganization,
    pub programs: Vec<NewProgram>,
    pub metrics: Vec<NewMetric>,
    pub activity: NewActivityLog,
}

#[derive(Debug, Clone)]
pub struct StoredBundle {
    pub organization: Organization,
    pub programs: Vec<Program>,
    pub metrics: Vec<Metric>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    // ── Users ──
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn list_users_for_organization(&self, organization_id: i64) -> StorageResult<Vec<User>>;
    async fn create_user(&self, new_user: NewUser) -> StorageResult<User>;

    // ── Organizations ──
    async fn list_organizations(&self, filter: &OrganizationFilter)
        -> StorageResult<Vec<Organization>>;
    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>>;
    async fn create_organization(&self, new_org: NewOrganization) -> StorageResult<Organization>;
    async fn update_organization(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> StorageResult<Option<Organization>>;
    /// Removes the organization and everything that hangs off it.
    async fn delete_organization(&self, id: i64) -> StorageResult<bool>;
    /// Writes the whole bundle or nothing.
    async fn create_organization_bundle(
        &self,
        bundle: OrganizationBundle,
    ) -> StorageResult<StoredBundle>;

    // ── Programs / metrics / reports ──
    async fn list_programs(&self, organization_id: i64) -> StorageResult<Vec<Program>>;
    async fn create_program(&self, new_program: NewProgram) -> StorageResult<Program>;
    async fn count_programs(&self) -> StorageResult<i64>;
    async fn list_metrics(&self, organization_id: i64) -> StorageResult<Vec<Metric>>;
    async fn create_metric(&self, new_metric: NewMetric) -> StorageResult<Metric>;
    async fn list_reports(&self, organization_id: i64) -> StorageResult<Vec<Report>>;
    async fn create_report(&self, new_report: NewReport) -> StorageResult<Report>;

    // ── Partners / workflows ──
    async fn list_partners(&self, organization_id: i64) -> StorageResult<Vec<TargetPartner>>;
    async fn create_partner(&self, new_partner: NewTargetPartner) -> StorageResult<TargetPartner>;
    async fn list_workflows(&self, organization_id: i64) -> StorageResult<Vec<Workflow>>;
    async fn create_workflow(&self, new_workflow: NewWorkflow) -> StorageResult<Workflow>;

    // ── Verification requests ──
    async fn list_verification_requests(
        &self,
        organization_id: i64,
    ) -> StorageResult<Vec<VerificationRequest>>;
    async fn list_pending_verification_requests(&self) -> StorageResult<Vec<VerificationRequest>>;
    async fn get_verification_request(&self, id: i64)
        -> StorageResult<Option<VerificationRequest>>;
    async fn create_verification_request(
        &self,
        new_request: NewVerificationRequest,
    ) -> StorageResult<VerificationRequest>;
    async fn resolve_verification_request(
        &self,
        id: i64,
        resolution: VerificationResolution,
    ) -> StorageResult<Option<VerificationRequest>>;

    // ── Notifications ──
    async fn list_notifications(&self, user_id: i64) -> StorageResult<Vec<Notification>>;
    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> StorageResult<Notification>;
    async fn mark_notification_read(&self, id: i64) -> StorageResult<bool>;

    // ── Invitations ──
    async fn list_invitations(&self) -> StorageResult<Vec<Invitation>>;
    async fn create_invitation(&self, new_invitation: NewInvitation) -> StorageResult<Invitation>;
    async fn get_invitation_by_token(&self, token: &str) -> StorageResult<Option<Invitation>>;
    async fn set_invitation_status(
        &self,
        id: i64,
        status: &str,
    ) -> StorageResult<Option<Invitation>>;

    // ── Activity / statistics ──
    async fn log_activity(&self, entry: NewActivityLog) -> StorageResult<ActivityLog>;
    /// Newest first.
    async fn list_activity(&self, limit: usize) -> StorageResult<Vec<ActivityLog>>;
    async fn list_statistics(&self) -> StorageResult<Vec<Statistic>>;
    async fn upsert_statistic(&self, stat: NewStatistic) -> StorageResult<Statistic>;

    // ── Read models ──

    async fn leaderboard(&self, query: &LeaderboardQuery) -> StorageResult<Vec<LeaderboardEntry>> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        Ok(ranking::leaderboard(&orgs, query))
    }

    async fn trending(&self, limit: usize) -> StorageResult<Vec<TrendingEntry>> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        Ok(ranking::trending(&orgs, limit))
    }

    async fn featured_organizations(&self, limit: usize) -> StorageResult<Vec<Organization>> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        Ok(ranking::featured(&orgs, limit))
    }

    async fn success_stories(&self) -> StorageResult<Vec<Organization>> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        Ok(ranking::success_stories(&orgs))
    }

    async fn solutions(&self, query: &SolutionsQuery) -> StorageResult<Vec<SolutionMatch>> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        Ok(ranking::solutions(&orgs, query))
    }

    async fn platform_statistics(&self) -> StorageResult<PlatformStatistics> {
        let orgs = self.list_organizations(&OrganizationFilter::default()).await?;
        let programs = self.count_programs().await?;
        let highlights = self.list_statistics().await?;
        Ok(ranking::platform_statistics(&orgs, programs, highlights))
    }
}
