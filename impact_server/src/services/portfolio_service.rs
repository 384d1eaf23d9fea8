//! Records hanging off an organization: programs, reports, metrics,
//! partners and workflows. Each create checks the parent exists and pins
//! `organization_id` to the path, whatever the body said.

use chrono::{Datelike, Utc};

use crate::error::{AppError, AppResult};
use crate::models::kinds::{
    PartnerStatus, ProgramStatus, ReportType, VerificationType, WorkflowStatus,
};
use crate::models::metric::{Metric, NewMetric};
use crate::models::partner::{NewTargetPartner, TargetPartner};
use crate::models::program::{NewProgram, Program};
use crate::models::report::{NewReport, Report};
use crate::models::workflow::{NewWorkflow, Workflow};
use crate::services::{organization_service, validation};
use crate::storage::Storage;

pub const MIN_REPORT_YEAR: i32 = 1900;

pub async fn create_program(
    storage: &dyn Storage,
    organization_id: i64,
    mut program: NewProgram,
) -> AppResult<Program> {
    organization_service::require_organization(storage, organization_id).await?;
    program.organization_id = organization_id;
    program.name = validation::non_empty("name", &program.name)?;
    validation::max_chars("name", &program.name, validation::MAX_NAME_CHARS)?;
    validation::max_chars_opt("category", program.category.as_deref(), validation::MAX_LABEL_CHARS)?;
    program.status = program.status.parse::<ProgramStatus>()?.as_str().to_string();
    validation::non_negative("beneficiaries", program.beneficiaries)?;
    if let Some(budget) = program.budget {
        validation::non_negative("budget", budget)?;
    }
    validation::date_range(program.start_date, program.end_date)?;

    let created = storage.create_program(program).await?;
    tracing::debug!(organization_id, program_id = created.id, "Program created");
    Ok(created)
}

pub async fn create_report(
    storage: &dyn Storage,
    organization_id: i64,
    mut report: NewReport,
) -> AppResult<Report> {
    organization_service::require_organization(storage, organization_id).await?;
    report.organization_id = organization_id;
    report.title = validation::non_empty("title", &report.title)?;
    validation::max_chars("title", &report.title, validation::MAX_NAME_CHARS)?;
    validation::max_chars_opt("fileUrl", report.file_url.as_deref(), validation::MAX_URL_CHARS)?;
    report.report_type = report.report_type.parse::<ReportType>()?.as_str().to_string();
    report.verification_type = report
        .verification_type
        .parse::<VerificationType>()?
        .as_str()
        .to_string();

    let latest = Utc::now().year() + 1;
    if !(MIN_REPORT_YEAR..=latest).contains(&report.year) {
        return Err(AppError::BadRequest(format!(
            "year must be between {MIN_REPORT_YEAR} and {latest}"
        )));
    }

    let created = storage.create_report(report).await?;
    tracing::debug!(organization_id, report_id = created.id, "Report created");
    Ok(created)
}

pub async fn create_metric(
    storage: &dyn Storage,
    organization_id: i64,
    mut metric: NewMetric,
) -> AppResult<Metric> {
    organization_service::require_organization(storage, organization_id).await?;
    metric.organization_id = organization_id;
    metric.name = validation::non_empty("name", &metric.name)?;
    validation::max_chars("name", &metric.name, validation::MAX_NAME_CHARS)?;
    validation::max_chars("unit", &metric.unit, validation::MAX_SHORT_CHARS)?;
    validation::max_chars("period", &metric.period, validation::MAX_PERIOD_CHARS)?;
    validation::finite("value", metric.value)?;
    if let Some(target) = metric.target {
        validation::finite("target", target)?;
    }
    if let Some(program_id) = metric.program_id {
        let programs = storage.list_programs(organization_id).await?;
        if !programs.iter().any(|p| p.id == program_id) {
            return Err(AppError::BadRequest(format!(
                "program {program_id} does not belong to organization {organization_id}"
            )));
        }
    }

    Ok(storage.create_metric(metric).await?)
}

pub async fn create_partner(
    storage: &dyn Storage,
    organization_id: i64,
    mut partner: NewTargetPartner,
) -> AppResult<TargetPartner> {
    organization_service::require_organization(storage, organization_id).await?;
    partner.organization_id = organization_id;
    partner.name = validation::non_empty("name", &partner.name)?;
    validation::max_chars("name", &partner.name, validation::MAX_NAME_CHARS)?;
    partner.partner_type = validation::non_empty("partnerType", &partner.partner_type)?;
    validation::max_chars("partnerType", &partner.partner_type, validation::MAX_SHORT_CHARS)?;
    partner.status = partner.status.parse::<PartnerStatus>()?.as_str().to_string();
    if let Some(email) = &partner.contact_email {
        let email = validation::email(email)?;
        validation::max_chars("contactEmail", &email, validation::MAX_EMAIL_CHARS)?;
        partner.contact_email = Some(email);
    }

    Ok(storage.create_partner(partner).await?)
}

pub async fn create_workflow(
    storage: &dyn Storage,
    organization_id: i64,
    mut workflow: NewWorkflow,
) -> AppResult<Workflow> {
    organization_service::require_organization(storage, organization_id).await?;
    workflow.organization_id = organization_id;
    workflow.name = validation::non_empty("name", &workflow.name)?;
    validation::max_chars("name", &workflow.name, validation::MAX_NAME_CHARS)?;
    workflow.status = workflow.status.parse::<WorkflowStatus>()?.as_str().to_string();
    if !workflow.steps.is_array() {
        return Err(AppError::BadRequest(
            "steps must be a JSON array".to_string(),
        ));
    }

    Ok(storage.create_workflow(workflow).await?)
}
