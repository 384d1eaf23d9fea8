//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

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

/// Rows keyed by id with a never-reused id sequence.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        self.next_id += 1;
        let row = build(self.next_id);
        self.rows.insert(self.next_id, row.clone());
        row
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn select(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|r| pred(r)).cloned().collect()
    }

    fn remove_where(&mut self, pred: impl Fn(&T) -> bool) {
        self.rows.retain(|_, r| !pred(r));
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    organizations: Table<Organization>,
    programs: Table<Program>,
    metrics: Table<Metric>,
    reports: Table<Report>,
    invitations: Table<Invitation>,
    verification_requests: Table<VerificationRequest>,
    notifications: Table<Notification>,
    partners: Table<TargetPartner>,
    activity: Table<ActivityLog>,
    workflows: Table<Workflow>,
    statistics: Table<Statistic>,
}

fn organization_row(id: i64, new_org: NewOrganization, now: DateTime<Utc>) -> Organization {
    Organization {
        id,
        name: new_org.name,
        description: new_org.description,
        mission: new_org.mission,
        sector: new_org.sector,
        region: new_org.region,
        country: new_org.country,
        website: new_org.website,
        logo_url: new_org.logo_url,
        founded_year: new_org.founded_year,
        sdg_goals: new_org.sdg_goals,
        verification_type: new_org.verification_type,
        reporting_quality: new_org.reporting_quality,
        reach: new_org.reach,
        social_roi: new_org.social_roi,
        outcome_effectiveness: new_org.outcome_effectiveness,
        transparency_governance: new_org.transparency_governance,
        impact_score: new_org.impact_score,
        previous_score: None,
        beneficiaries_reached: new_org.beneficiaries_reached,
        annual_budget: new_org.annual_budget,
        featured: new_org.featured,
        success_story: new_org.success_story,
        created_at: now,
        updated_at: now,
    }
}

fn program_row(id: i64, new_program: NewProgram, now: DateTime<Utc>) -> Program {
    Program {
        id,
        organization_id: new_program.organization_id,
        name: new_program.name,
        description: new_program.description,
        category: new_program.category,
        beneficiaries: new_program.beneficiaries,
        budget: new_program.budget,
        start_date: new_program.start_date,
        end_date: new_program.end_date,
        status: new_program.status,
        created_at: now,
    }
}

fn metric_row(id: i64, new_metric: NewMetric, now: DateTime<Utc>) -> Metric {
    Metric {
        id,
        organization_id: new_metric.organization_id,
        program_id: new_metric.program_id,
        name: new_metric.name,
        value: new_metric.value,
        unit: new_metric.unit,
        target: new_metric.target,
        period: new_metric.period,
        recorded_at: now,
    }
}

fn activity_row(id: i64, entry: NewActivityLog, now: DateTime<Utc>) -> ActivityLog {
    ActivityLog {
        id,
        user_id: entry.user_id,
        organization_id: entry.organization_id,
        action: entry.action,
        entity_type: entry.entity_type,
        entity_id: entry.entity_id,
        details: entry.details,
        created_at: now,
    }
}

/// Process-local store. Not durable; intended for demos, tests and
/// deployments without a database.
#[derive(Debug, Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    // ── Users ──

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .select(|u| u.username.eq_ignore_ascii_case(username))
            .into_iter()
            .next())
    }

    async fn list_users_for_organization(&self, organization_id: i64) -> StorageResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .select(|u| u.organization_id == Some(organization_id)))
    }

    async fn create_user(&self, new_user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        let clash = tables.users.rows.values().find(|u| {
            u.username.eq_ignore_ascii_case(&new_user.username)
                || u.email.eq_ignore_ascii_case(&new_user.email)
        });
        if let Some(existing) = clash {
            let field = if existing.username.eq_ignore_ascii_case(&new_user.username) {
                "username"
            } else {
                "email"
            };
            return Err(StorageError::Conflict(format!("{field} already registered")));
        }

        let now = Utc::now();
        Ok(tables.users.insert_with(|id| User {
            id,
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            role: new_user.role,
            organization_id: new_user.organization_id,
            created_at: now,
        }))
    }

    // ── Organizations ──

    async fn list_organizations(
        &self,
        filter: &OrganizationFilter,
    ) -> StorageResult<Vec<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.select(|o| filter.matches(o)))
    }

    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>> {
        Ok(self.tables.read().await.organizations.get(id))
    }

    async fn create_organization(&self, new_org: NewOrganization) -> StorageResult<Organization> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .organizations
            .insert_with(|id| organization_row(id, new_org, now)))
    }

    async fn update_organization(
        &self,
        id: i64,
        changes: OrganizationChanges,
    ) -> StorageResult<Option<Organization>> {
        let mut tables = self.tables.write().await;
        Ok(tables.organizations.rows.get_mut(&id).map(|org| {
            changes.apply_to(org);
            org.clone()
        }))
    }

    async fn create_organization_bundle(
        &self,
        bundle: OrganizationBundle,
    ) -> StorageResult<StoredBundle> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let organization = tables
            .organizations
            .insert_with(|id| organization_row(id, bundle.organization, now));
        let programs = bundle
            .programs
            .into_iter()
            .map(|mut p| {
                p.organization_id = organization.id;
                tables.programs.insert_with(|id| program_row(id, p, now))
            })
            .collect();
        let metrics = bundle
            .metrics
            .into_iter()
            .map(|mut m| {
                m.organization_id = organization.id;
                tables.metrics.insert_with(|id| metric_row(id, m, now))
            })
            .collect();
        let mut activity = bundle.activity;
        activity.organization_id = Some(organization.id);
        activity.entity_id = Some(organization.id);
        tables
            .activity
            .insert_with(|id| activity_row(id, activity, now));
        Ok(StoredBundle {
            organization,
            programs,
            metrics,
        })
    }

    async fn delete_organization(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.organizations.rows.remove(&id).is_none() {
            return Ok(false);
        }
        tables.programs.remove_where(|p| p.organization_id == id);
        tables.metrics.remove_where(|m| m.organization_id == id);
        tables.reports.remove_where(|r| r.organization_id == id);
        tables.partners.remove_where(|p| p.organization_id == id);
        tables.workflows.remove_where(|w| w.organization_id == id);
        tables
            .verification_requests
            .remove_where(|v| v.organization_id == id);
        for user in tables.users.rows.values_mut() {
            if user.organization_id == Some(id) {
                user.organization_id = None;
            }
        }
        for invitation in tables.invitations.rows.values_mut() {
            if invitation.organization_id == Some(id) {
                invitation.organization_id = None;
            }
        }
        Ok(true)
    }

    // ── Programs / metrics / reports ──

    async fn list_programs(&self, organization_id: i64) -> StorageResult<Vec<Program>> {
        let tables = self.tables.read().await;
        Ok(tables
            .programs
            .select(|p| p.organization_id == organization_id))
    }

    async fn create_program(&self, new_program: NewProgram) -> StorageResult<Program> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .programs
            .insert_with(|id| program_row(id, new_program, now)))
    }

    async fn count_programs(&self) -> StorageResult<i64> {
        Ok(self.tables.read().await.programs.rows.len() as i64)
    }

    async fn list_metrics(&self, organization_id: i64) -> StorageResult<Vec<Metric>> {
        let tables = self.tables.read().await;
        Ok(tables.metrics.select(|m| m.organization_id == organization_id))
    }

    async fn create_metric(&self, new_metric: NewMetric) -> StorageResult<Metric> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .metrics
            .insert_with(|id| metric_row(id, new_metric, now)))
    }

    async fn list_reports(&self, organization_id: i64) -> StorageResult<Vec<Report>> {
        let tables = self.tables.read().await;
        let mut reports = tables.reports.select(|r| r.organization_id == organization_id);
        reports.sort_by(|a, b| b.year.cmp(&a.year).then(a.id.cmp(&b.id)));
        Ok(reports)
    }

    async fn create_report(&self, new_report: NewReport) -> StorageResult<Report> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.reports.insert_with(|id| Report {
            id,
            organization_id: new_report.organization_id,
            title: new_report.title,
            report_type: new_report.report_type,
            year: new_report.year,
            summary: new_report.summary,
            file_url: new_report.file_url,
            verification_type: new_report.verification_type,
            published_at: new_report.published_at,
            created_at: now,
        }))
    }

    // ── Partners / workflows ──

    async fn list_partners(&self, organization_id: i64) -> StorageResult<Vec<TargetPartner>> {
        let tables = self.tables.read().await;
        Ok(tables
            .partners
            .select(|p| p.organization_id == organization_id))
    }

    async fn create_partner(&self, new_partner: NewTargetPartner) -> StorageResult<TargetPartner> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.partners.insert_with(|id| TargetPartner {
            id,
            organization_id: new_partner.organization_id,
            name: new_partner.name,
            partner_type: new_partner.partner_type,
            contact_email: new_partner.contact_email,
            status: new_partner.status,
            notes: new_partner.notes,
            created_at: now,
        }))
    }

    async fn list_workflows(&self, organization_id: i64) -> StorageResult<Vec<Workflow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .workflows
            .select(|w| w.organization_id == organization_id))
    }

    async fn create_workflow(&self, new_workflow: NewWorkflow) -> StorageResult<Workflow> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.workflows.insert_with(|id| Workflow {
            id,
            organization_id: new_workflow.organization_id,
            name: new_workflow.name,
            status: new_workflow.status,
            steps: new_workflow.steps,
            created_at: now,
            updated_at: now,
        }))
    }

    // ── Verification requests ──

    async fn list_verification_requests(
        &self,
        organization_id: i64,
    ) -> StorageResult<Vec<VerificationRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .verification_requests
            .select(|v| v.organization_id == organization_id))
    }

    async fn list_pending_verification_requests(&self) -> StorageResult<Vec<VerificationRequest>> {
        let tables = self.tables.read().await;
        Ok(tables.verification_requests.select(|v| v.status == "pending"))
    }

    async fn get_verification_request(
        &self,
        id: i64,
    ) -> StorageResult<Option<VerificationRequest>> {
        Ok(self.tables.read().await.verification_requests.get(id))
    }

    async fn create_verification_request(
        &self,
        new_request: NewVerificationRequest,
    ) -> StorageResult<VerificationRequest> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.verification_requests.insert_with(|id| VerificationRequest {
            id,
            organization_id: new_request.organization_id,
            requested_type: new_request.requested_type,
            status: new_request.status,
            notes: new_request.notes,
            requested_by: new_request.requested_by,
            reviewed_by: None,
            created_at: now,
            resolved_at: None,
        }))
    }

    async fn resolve_verification_request(
        &self,
        id: i64,
        resolution: VerificationResolution,
    ) -> StorageResult<Option<VerificationRequest>> {
        let mut tables = self.tables.write().await;
        Ok(tables.verification_requests.rows.get_mut(&id).map(|req| {
            req.status = resolution.status;
            req.reviewed_by = resolution.reviewed_by;
            if resolution.notes.is_some() {
                req.notes = resolution.notes;
            }
            req.resolved_at = Some(resolution.resolved_at);
            req.clone()
        }))
    }

    // ── Notifications ──

    async fn list_notifications(&self, user_id: i64) -> StorageResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut items = tables.notifications.select(|n| n.user_id == user_id);
        items.reverse();
        Ok(items)
    }

    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> StorageResult<Notification> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.notifications.insert_with(|id| Notification {
            id,
            user_id: new_notification.user_id,
            title: new_notification.title,
            message: new_notification.message,
            kind: new_notification.kind,
            read: false,
            created_at: now,
        }))
    }

    async fn mark_notification_read(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.notifications.rows.get_mut(&id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        })
    }

    // ── Invitations ──

    async fn list_invitations(&self) -> StorageResult<Vec<Invitation>> {
        let tables = self.tables.read().await;
        let mut items = tables.invitations.select(|_| true);
        items.reverse();
        Ok(items)
    }

    async fn create_invitation(&self, new_invitation: NewInvitation) -> StorageResult<Invitation> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if tables
            .invitations
            .rows
            .values()
            .any(|i| i.token == new_invitation.token)
        {
            return Err(StorageError::Conflict("invitation token reused".to_string()));
        }
        Ok(tables.invitations.insert_with(|id| Invitation {
            id,
            email: new_invitation.email,
            organization_id: new_invitation.organization_id,
            role: new_invitation.role,
            token: new_invitation.token,
            status: new_invitation.status,
            invited_by: new_invitation.invited_by,
            expires_at: new_invitation.expires_at,
            created_at: now,
        }))
    }

    async fn get_invitation_by_token(&self, token: &str) -> StorageResult<Option<Invitation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .rows
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn set_invitation_status(
        &self,
        id: i64,
        status: &str,
    ) -> StorageResult<Option<Invitation>> {
        let mut tables = self.tables.write().await;
        Ok(tables.invitations.rows.get_mut(&id).map(|inv| {
            inv.status = status.to_string();
            inv.clone()
        }))
    }

    // ── Activity / statistics ──

    async fn log_activity(&self, entry: NewActivityLog) -> StorageResult<ActivityLog> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .activity
            .insert_with(|id| activity_row(id, entry, now)))
    }

    async fn list_activity(&self, limit: usize) -> StorageResult<Vec<ActivityLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activity
            .rows
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_statistics(&self) -> StorageResult<Vec<Statistic>> {
        Ok(self.tables.read().await.statistics.select(|_| true))
    }

    async fn upsert_statistic(&self, stat: NewStatistic) -> StorageResult<Statistic> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .statistics
            .rows
            .values_mut()
            .find(|s| s.name == stat.name)
        {
            existing.label = stat.label;
            existing.value = stat.value;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        Ok(tables.statistics.insert_with(|id| Statistic {
            id,
            name: stat.name,
            label: stat.label,
            value: stat.value,
            updated_at: now,
        }))
    }
}
