//! PostgreSQL storage backend over diesel-async.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use super::{OrganizationBundle, Storage, StorageError, StorageResult, StoredBundle};
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
use crate::schema::{
    activity_logs, invitations, notifications, organization_metrics, organizations, programs,
    reports, statistics, target_partners, users, verification_requests, workflows,
};

pub type DbPool = Pool<AsyncPgConnection>;

/// Build a deadpool of async Postgres connections.
pub fn build_pool(database_url: &str, max_size: usize) -> anyhow::Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))
}

fn conflict_or(err: DieselError, what: &str) -> StorageError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StorageError::Conflict(format!("{what} already registered"))
        }
        other => StorageError::Database(other),
    }
}

pub struct PgStorage {
    pool: DbPool,
}

impl PgStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StorageResult<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::Pool(e.to_string()))
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    // ── Users ──

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .find(id)
            .first::<User>(&mut *conn)
            .await
            .optional()?)
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let mut conn = self.conn().await?;
        // Usernames are stored lowercased by the user service.
        Ok(users::table
            .filter(users::username.eq(username.to_lowercase()))
            .first::<User>(&mut *conn)
            .await
            .optional()?)
    }

    async fn list_users_for_organization(&self, organization_id: i64) -> StorageResult<Vec<User>> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .filter(users::organization_id.eq(organization_id))
            .order(users::id.asc())
            .load::<User>(&mut *conn)
            .await?)
    }

    async fn create_user(&self, new_user: NewUser) -> StorageResult<User> {
        let mut conn = self.conn().await?;
        diesel::insert_into(users::table)
            .values(&new_user)
            .get_result::<User>(&mut *conn)
            .await
            .map_err(|e| conflict_or(e, "username or email"))
    }

    // ── Organizations ──

    async fn list_organizations(
        &self,
        filter: &OrganizationFilter,
    ) -> StorageResult<Vec<Organization>> {
        let mut conn = self.conn().await?;
        let rows = organizations::table
            .order(organizations::id.asc())
            .load::<Organization>(&mut *conn)
            .await?;
        // Facet matching is normalized in Rust so both backends agree.
        Ok(rows.into_iter().filter(|o| filter.matches(o)).collect())
    }

    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>> {
        let mut conn = self.conn().await?;
        Ok(organizations::table
            .find(id)
            .first::<Organization>(&mut *conn)
            .await
            .optional()?)
    }

    async fn create_organization(&self, new_org: NewOrganization) -> StorageResult<Organization> {
        let mut conn = self.conn().await?;
        let org = diesel::insert_into(organizations::table)
            .values(&new_org)
            .get_result::<Organization>(&mut *conn)
            .await?;
        Ok(org)
    }

    async fn update_organization(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> StorageResult<Option<Organization>> {
        let mut conn = self.conn().await?;
        Ok(diesel::update(organizations::table.find(id))
            .set(&changes)
            .get_result::<Organization>(&mut *conn)
            .await
            .optional()?)
    }

    async fn create_organization_bundle(
        &self,
        bundle: OrganizationBundle,
    ) -> StorageResult<StoredBundle> {
        let mut conn = self.conn().await?;
        let stored = conn
            .transaction::<_, DieselError, _>(move |conn| {
                async move {
                    let organization = diesel::insert_into(organizations::table)
                        .values(&bundle.organization)
                        .get_result::<Organization>(conn)
                        .await?;

                    let mut program_rows = Vec::with_capacity(bundle.programs.len());
                    for mut program in bundle.programs {
                        program.organization_id = organization.id;
                        program_rows.push(
                            diesel::insert_into(programs::table)
                                .values(&program)
                                .get_result::<Program>(conn)
                                .await?,
                        );
                    }

                    let mut metric_rows = Vec::with_capacity(bundle.metrics.len());
                    for mut metric in bundle.metrics {
                        metric.organization_id = organization.id;
                        metric_rows.push(
                            diesel::insert_into(organization_metrics::table)
                                .values(&metric)
                                .get_result::<Metric>(conn)
                                .await?,
                        );
                    }

                    let mut activity = bundle.activity;
                    activity.organization_id = Some(organization.id);
                    activity.entity_id = Some(organization.id);
                    diesel::insert_into(activity_logs::table)
                        .values(&activity)
                        .execute(conn)
                        .await?;

                    Ok(StoredBundle {
                        organization,
                        programs: program_rows,
                        metrics: metric_rows,
                    })
                }
                .scope_boxed()
            })
            .await?;
        Ok(stored)
    }

    async fn delete_organization(&self, id: i64) -> StorageResult<bool> {
        let mut conn = self.conn().await?;
        let removed = diesel::delete(organizations::table.find(id))
            .execute(&mut *conn)
            .await?;
        Ok(removed > 0)
    }

    // ── Programs / metrics / reports ──

    async fn list_programs(&self, organization_id: i64) -> StorageResult<Vec<Program>> {
        let mut conn = self.conn().await?;
        Ok(programs::table
            .filter(programs::organization_id.eq(organization_id))
            .order(programs::id.asc())
            .load::<Program>(&mut *conn)
            .await?)
    }

    async fn create_program(&self, new_program: NewProgram) -> StorageResult<Program> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(programs::table)
            .values(&new_program)
            .get_result::<Program>(&mut *conn)
            .await?)
    }

    async fn count_programs(&self) -> StorageResult<i64> {
        let mut conn = self.conn().await?;
        Ok(programs::table
            .count()
            .get_result::<i64>(&mut *conn)
            .await?)
    }

    async fn list_metrics(&self, organization_id: i64) -> StorageResult<Vec<Metric>> {
        let mut conn = self.conn().await?;
        Ok(organization_metrics::table
            .filter(organization_metrics::organization_id.eq(organization_id))
            .order(organization_metrics::id.asc())
            .load::<Metric>(&mut *conn)
            .await?)
    }

    async fn create_metric(&self, new_metric: NewMetric) -> StorageResult<Metric> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(organization_metrics::table)
            .values(&new_metric)
            .get_result::<Metric>(&mut *conn)
            .await?)
    }

    async fn list_reports(&self, organization_id: i64) -> StorageResult<Vec<Report>> {
        let mut conn = self.conn().await?;
        Ok(reports::table
            .filter(reports::organization_id.eq(organization_id))
            .order((reports::year.desc(), reports::id.asc()))
            .load::<Report>(&mut *conn)
            .await?)
    }

    async fn create_report(&self, new_report: NewReport) -> StorageResult<Report> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(reports::table)
            .values(&new_report)
            .get_result::<Report>(&mut *conn)
            .await?)
    }

    // ── Partners / workflows ──

    async fn list_partners(&self, organization_id: i64) -> StorageResult<Vec<TargetPartner>> {
        let mut conn = self.conn().await?;
        Ok(target_partners::table
            .filter(target_partners::organization_id.eq(organization_id))
            .order(target_partners::id.asc())
            .load::<TargetPartner>(&mut *conn)
            .await?)
    }

    async fn create_partner(&self, new_partner: NewTargetPartner) -> StorageResult<TargetPartner> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(target_partners::table)
            .values(&new_partner)
            .get_result::<TargetPartner>(&mut *conn)
            .await?)
    }

    async fn list_workflows(&self, organization_id: i64) -> StorageResult<Vec<Workflow>> {
        let mut conn = self.conn().await?;
        Ok(workflows::table
            .filter(workflows::organization_id.eq(organization_id))
            .order(workflows::id.asc())
            .load::<Workflow>(&mut *conn)
            .await?)
    }

    async fn create_workflow(&self, new_workflow: NewWorkflow) -> StorageResult<Workflow> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(workflows::table)
            .values(&new_workflow)
            .get_result::<Workflow>(&mut *conn)
            .await?)
    }

    // ── Verification requests ──

    async fn list_verification_requests(
        &self,
        organization_id: i64,
    ) -> StorageResult<Vec<VerificationRequest>> {
        let mut conn = self.conn().await?;
        Ok(verification_requests::table
            .filter(verification_requests::organization_id.eq(organization_id))
            .order(verification_requests::id.asc())
            .load::<VerificationRequest>(&mut *conn)
            .await?)
    }

    async fn list_pending_verification_requests(&self) -> StorageResult<Vec<VerificationRequest>> {
        let mut conn = self.conn().await?;
        Ok(verification_requests::table
            .filter(verification_requests::status.eq("pending"))
            .order(verification_requests::id.asc())
            .load::<VerificationRequest>(&mut *conn)
            .await?)
    }

    async fn get_verification_request(
        &self,
        id: i64,
    ) -> StorageResult<Option<VerificationRequest>> {
        let mut conn = self.conn().await?;
        Ok(verification_requests::table
            .find(id)
            .first::<VerificationRequest>(&mut *conn)
            .await
            .optional()?)
    }

    async fn create_verification_request(
        &self,
        new_request: NewVerificationRequest,
    ) -> StorageResult<VerificationRequest> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(verification_requests::table)
            .values(&new_request)
            .get_result::<VerificationRequest>(&mut *conn)
            .await?)
    }

    async fn resolve_verification_request(
        &self,
        id: i64,
        resolution: VerificationResolution,
    ) -> StorageResult<Option<VerificationRequest>> {
        let mut conn = self.conn().await?;
        let target = verification_requests::table.find(id);
        let base = (
            verification_requests::status.eq(resolution.status),
            verification_requests::reviewed_by.eq(resolution.reviewed_by),
            verification_requests::resolved_at.eq(Some(resolution.resolved_at)),
        );
        let updated = match resolution.notes {
            Some(notes) => {
                diesel::update(target)
                    .set((base, verification_requests::notes.eq(Some(notes))))
                    .get_result::<VerificationRequest>(&mut *conn)
                    .await
            }
            None => {
                diesel::update(target)
                    .set(base)
                    .get_result::<VerificationRequest>(&mut *conn)
                    .await
            }
        };
        Ok(updated.optional()?)
    }

    // ── Notifications ──

    async fn list_notifications(&self, user_id: i64) -> StorageResult<Vec<Notification>> {
        let mut conn = self.conn().await?;
        Ok(notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::id.desc())
            .load::<Notification>(&mut *conn)
            .await?)
    }

    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> StorageResult<Notification> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(notifications::table)
            .values(&new_notification)
            .get_result::<Notification>(&mut *conn)
            .await?)
    }

    async fn mark_notification_read(&self, id: i64) -> StorageResult<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(notifications::table.find(id))
            .set(notifications::read.eq(true))
            .execute(&mut *conn)
            .await?;
        Ok(updated > 0)
    }

    // ── Invitations ──

    async fn list_invitations(&self) -> StorageResult<Vec<Invitation>> {
        let mut conn = self.conn().await?;
        Ok(invitations::table
            .order(invitations::id.desc())
            .load::<Invitation>(&mut *conn)
            .await?)
    }

    async fn create_invitation(&self, new_invitation: NewInvitation) -> StorageResult<Invitation> {
        let mut conn = self.conn().await?;
        diesel::insert_into(invitations::table)
            .values(&new_invitation)
            .get_result::<Invitation>(&mut *conn)
            .await
            .map_err(|e| conflict_or(e, "invitation token"))
    }

    async fn get_invitation_by_token(&self, token: &str) -> StorageResult<Option<Invitation>> {
        let mut conn = self.conn().await?;
        Ok(invitations::table
            .filter(invitations::token.eq(token))
            .first::<Invitation>(&mut *conn)
            .await
            .optional()?)
    }

    async fn set_invitation_status(
        &self,
        id: i64,
        status: &str,
    ) -> StorageResult<Option<Invitation>> {
        let mut conn = self.conn().await?;
        Ok(diesel::update(invitations::table.find(id))
            .set(invitations::status.eq(status))
            .get_result::<Invitation>(&mut *conn)
            .await
            .optional()?)
    }

    // ── Activity / statistics ──

    async fn log_activity(&self, entry: NewActivityLog) -> StorageResult<ActivityLog> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(activity_logs::table)
            .values(&entry)
            .get_result::<ActivityLog>(&mut *conn)
            .await?)
    }

    async fn list_activity(&self, limit: usize) -> StorageResult<Vec<ActivityLog>> {
        let mut conn = self.conn().await?;
        Ok(activity_logs::table
            .order(activity_logs::id.desc())
            .limit(limit as i64)
            .load::<ActivityLog>(&mut *conn)
            .await?)
    }

    async fn list_statistics(&self) -> StorageResult<Vec<Statistic>> {
        let mut conn = self.conn().await?;
        Ok(statistics::table
            .order(statistics::id.asc())
            .load::<Statistic>(&mut *conn)
            .await?)
    }

    async fn upsert_statistic(&self, stat: NewStatistic) -> StorageResult<Statistic> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(statistics::table)
            .values(&stat)
            .on_conflict(statistics::name)
            .do_update()
            .set((&stat, statistics::updated_at.eq(Utc::now())))
            .get_result::<Statistic>(&mut *conn)
            .await?)
    }
}
