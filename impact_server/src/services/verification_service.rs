//! Verification requests: an organization asks, a reviewer decides.

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::events::activity::ActivityEvent;
use crate::models::kinds::{VerificationStatus, VerificationType};
use crate::models::notification::NewNotification;
use crate::models::organization::OrganizationChanges;
use crate::models::verification::{
    NewVerificationRequest, VerificationRequest, VerificationResolution,
};
use crate::services::{organization_service, user_service};
use crate::storage::Storage;

pub async fn request_verification(
    storage: &dyn Storage,
    organization_id: i64,
    requested_type: &str,
    notes: Option<String>,
    requested_by: Option<i64>,
) -> AppResult<VerificationRequest> {
    organization_service::require_organization(storage, organization_id).await?;
    user_service::require_referenced_user(storage, "requestedBy", requested_by).await?;

    let requested = requested_type.parse::<VerificationType>()?;
    if !requested.is_independent() {
        return Err(AppError::BadRequest(
            "requestedType must be 'verified' or 'audited'".to_string(),
        ));
    }

    let open = storage.list_verification_requests(organization_id).await?;
    if let Some(pending) = open
        .iter()
        .find(|r| r.status == VerificationStatus::Pending.as_str())
    {
        return Err(AppError::Conflict(format!(
            "Verification request {} is already pending for this organization",
            pending.id
        )));
    }

    let request = storage
        .create_verification_request(NewVerificationRequest {
            organization_id,
            requested_type: requested.as_str().to_string(),
            status: VerificationStatus::Pending.as_str().to_string(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            requested_by,
        })
        .await?;

    tracing::info!(
        organization_id,
        request_id = request.id,
        requested_type = %requested,
        "Verification requested"
    );
    let event = ActivityEvent::VerificationRequested {
        request_id: request.id,
        requested_type: request.requested_type.clone(),
    };
    storage
        .log_activity(event.into_log(Some(organization_id), Some(request.id), requested_by))
        .await?;
    Ok(request)
}

/// Close a pending request. Approval upgrades the organization's verification type.
pub async fn resolve_verification(
    storage: &dyn Storage,
    request_id: i64,
    status: &str,
    reviewed_by: Option<i64>,
    notes: Option<String>,
) -> AppResult<VerificationRequest> {
    let request = storage
        .get_verification_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Verification request", request_id))?;

    let outcome = status.parse::<VerificationStatus>()?;
    if outcome == VerificationStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be 'approved' or 'rejected'".to_string(),
        ));
    }
    if request.status != VerificationStatus::Pending.as_str() {
        return Err(AppError::Conflict(format!(
            "Verification request {request_id} is already {}",
            request.status
        )));
    }
    user_service::require_referenced_user(storage, "reviewerId", reviewed_by).await?;

    let resolved = storage
        .resolve_verification_request(
            request_id,
            VerificationResolution {
                status: outcome.as_str().to_string(),
                reviewed_by,
                notes: notes.filter(|n| !n.trim().is_empty()),
                resolved_at: Utc::now(),
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Verification request", request_id))?;

    if outcome == VerificationStatus::Approved {
        let changes = OrganizationChanges {
            verification_type: Some(resolved.requested_type.clone()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        storage
            .update_organization(resolved.organization_id, changes)
            .await?;
    }

    let (title, message) = match outcome {
        VerificationStatus::Approved => (
            "Verification approved",
            format!(
                "Your organization is now listed as {}.",
                resolved.requested_type
            ),
        ),
        _ => (
            "Verification rejected",
            format!(
                "Your request to be listed as {} was not approved.",
                resolved.requested_type
            ),
        ),
    };
    for user in storage
        .list_users_for_organization(resolved.organization_id)
        .await?
    {
        storage
            .create_notification(NewNotification {
                user_id: user.id,
                title: title.to_string(),
                message: message.clone(),
                kind: "verification".to_string(),
            })
            .await?;
    }

    crate::metrics::verification_resolved(outcome.as_str());
    tracing::info!(
        organization_id = resolved.organization_id,
        request_id,
        status = %outcome,
        "Verification resolved"
    );
    let event = ActivityEvent::VerificationResolved {
        request_id,
        status: resolved.status.clone(),
    };
    storage
        .log_activity(event.into_log(
            Some(resolved.organization_id),
            Some(request_id),
            reviewed_by,
        ))
        .await?;
    Ok(resolved)
}
