//! Activity event definitions.

use serde::{Deserialize, Serialize};

use crate::models::activity::NewActivityLog;

/// Things that can happen on the platform worth recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivityEvent {
    /// Organization created through the dashboard or API.
    OrganizationCreated { name: String, impact_score: i32 },
    /// Organization fields changed.
    OrganizationUpdated {
        fields: Vec<String>,
        previous_score: Option<i32>,
        impact_score: i32,
    },
    /// Organization and its dependents removed.
    OrganizationDeleted { name: String },
    /// Organization created by the JSON import tool.
    OrganizationImported {
        name: String,
        programs: usize,
        metrics: usize,
        warnings: usize,
    },
    /// Organization asked for a stronger verification level.
    VerificationRequested { request_id: i64, requested_type: String },
    /// A reviewer approved or rejected a request.
    VerificationResolved { request_id: i64, status: String },
    UserCreated { username: String, role: String },
    InvitationSent { email: String, role: String },
    InvitationAccepted { email: String, user_id: i64 },
}

impl ActivityEvent {
    pub fn action(&self) -> &'static str {
        match self {
            ActivityEvent::OrganizationCreated { .. } => "organization.created",
            ActivityEvent::OrganizationUpdated { .. } => "organization.updated",
            ActivityEvent::OrganizationDeleted { .. } => "organization.deleted",
            ActivityEvent::OrganizationImported { .. } => "organization.imported",
            ActivityEvent::VerificationRequested { .. } => "verification.requested",
            ActivityEvent::VerificationResolved { .. } => "verification.resolved",
            ActivityEvent::UserCreated { .. } => "user.created",
            ActivityEvent::InvitationSent { .. } => "invitation.sent",
            ActivityEvent::InvitationAccepted { .. } => "invitation.accepted",
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            ActivityEvent::OrganizationCreated { .. }
            | ActivityEvent::OrganizationUpdated { .. }
            | ActivityEvent::OrganizationDeleted { .. }
            | ActivityEvent::OrganizationImported { .. } => "organization",
            ActivityEvent::VerificationRequested { .. }
            | ActivityEvent::VerificationResolved { .. } => "verification_request",
            ActivityEvent::UserCreated { .. } => "user",
            ActivityEvent::InvitationSent { .. } | ActivityEvent::InvitationAccepted { .. } => {
                "invitation"
            }
        }
    }

    /// Build the log row; `entity_id` is the row the event is about.
    pub fn into_log(
        self,
        organization_id: Option<i64>,
        entity_id: Option<i64>,
        user_id: Option<i64>,
    ) -> NewActivityLog {
        let action = self.action().to_string();
        let entity_type = self.entity_type().to_string();
        NewActivityLog {
            user_id,
            organization_id,
            action,
            entity_type,
            entity_id,
            details: serde_json::to_value(&self).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_carries_tagged_details() {
        let log = ActivityEvent::OrganizationImported {
            name: "Water Forward".into(),
            programs: 2,
            metrics: 0,
            warnings: 1,
        }
        .into_log(Some(7), Some(7), None);

        assert_eq!(log.action, "organization.imported");
        assert_eq!(log.entity_type, "organization");
        let details = log.details.unwrap();
        assert_eq!(details["type"], "OrganizationImported");
        assert_eq!(details["programs"], 2);
    }

    #[test]
    fn details_round_trip_to_the_event() {
        let event = ActivityEvent::VerificationResolved {
            request_id: 3,
            status: "approved".into(),
        };
        let log = event.clone().into_log(Some(1), Some(3), Some(9));
        let back: ActivityEvent = serde_json::from_value(log.details.unwrap()).unwrap();
        assert_eq!(back, event);
        assert_eq!(log.entity_type, "verification_request");
    }
}
