//! Invitations to the dashboard: issue a token, accept it once.

use chrono::{Duration, Utc};

use crate::error::{AppError, AppResult};
use crate::events::activity::ActivityEvent;
use crate::models::invitation::{Invitation, NewInvitation};
use crate::models::kinds::{InvitationStatus, UserRole};
use crate::models::user::{NewUser, User};
use crate::services::{organization_service, user_service, validation};
use crate::storage::Storage;

pub async fn create_invitation(
    storage: &dyn Storage,
    email: &str,
    role: &str,
    organization_id: Option<i64>,
    invited_by: Option<i64>,
    ttl_days: i64,
) -> AppResult<Invitation> {
    let email = validation::email(email)?;
    validation::max_chars("email", &email, validation::MAX_EMAIL_CHARS)?;
    let role = role.parse::<UserRole>()?;
    if let Some(org_id) = organization_id {
        organization_service::require_organization(storage, org_id).await?;
    }
    user_service::require_referenced_user(storage, "invitedBy", invited_by).await?;

    let invitation = storage
        .create_invitation(NewInvitation {
            email,
            organization_id,
            role: role.as_str().to_string(),
            token: uuid::Uuid::new_v4().simple().to_string(),
            status: InvitationStatus::Pending.as_str().to_string(),
            invited_by,
            expires_at: Utc::now() + Duration::days(ttl_days),
        })
        .await?;

    tracing::info!(
        invitation_id = invitation.id,
        role = %role,
        expires_at = %invitation.expires_at,
        "Invitation sent"
    );
    let event = ActivityEvent::InvitationSent {
        email: invitation.email.clone(),
        role: invitation.role.clone(),
    };
    storage
        .log_activity(event.into_log(organization_id, Some(invitation.id), invited_by))
        .await?;
    Ok(invitation)
}

/// Turn a pending, unexpired invitation into a user account.
pub async fn accept_invitation(
    storage: &dyn Storage,
    token: &str,
    username: &str,
    full_name: Option<String>,
) -> AppResult<User> {
    let invitation = storage
        .get_invitation_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.status != InvitationStatus::Pending.as_str() {
        return Err(AppError::Gone(format!(
            "Invitation is {}",
            invitation.status
        )));
    }
    if invitation.is_expired_at(Utc::now()) {
        storage
            .set_invitation_status(invitation.id, InvitationStatus::Expired.as_str())
            .await?;
        tracing::info!(invitation_id = invitation.id, "Invitation expired");
        return Err(AppError::Gone("Invitation has expired".to_string()));
    }

    let user = user_service::create_user(
        storage,
        NewUser {
            username: username.to_string(),
            email: invitation.email.clone(),
            full_name,
            role: invitation.role.clone(),
            organization_id: invitation.organization_id,
        },
    )
    .await?;

    storage
        .set_invitation_status(invitation.id, InvitationStatus::Accepted.as_str())
        .await?;

    let event = ActivityEvent::InvitationAccepted {
        email: invitation.email,
        user_id: user.id,
    };
    storage
        .log_activity(event.into_log(invitation.organization_id, Some(invitation.id), Some(user.id)))
        .await?;
    Ok(user)
}
