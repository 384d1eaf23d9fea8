//! Closed vocabularies stored as VARCHAR columns.
//!
//! Rows keep these as plain strings; services parse them through the enums
//! below before anything is written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            /// Case-insensitive; `_` and spaces are accepted in place of `-`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

string_enum! {
    /// Rigor of validation applied to an organization's claimed data.
    VerificationType, "verification type" {
        SelfReported => "self-reported",
        Verified => "verified",
        Audited => "audited",
    }
}

string_enum! {
    UserRole, "role" {
        Admin => "admin",
        Member => "member",
        Viewer => "viewer",
    }
}

string_enum! {
    ProgramStatus, "program status" {
        Planned => "planned",
        Active => "active",
        Completed => "completed",
    }
}

string_enum! {
    ReportType, "report type" {
        Annual => "annual",
        Impact => "impact",
        Financial => "financial",
    }
}

string_enum! {
    InvitationStatus, "invitation status" {
        Pending => "pending",
        Accepted => "accepted",
        Expired => "expired",
        Revoked => "revoked",
    }
}

string_enum! {
    VerificationStatus, "verification status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

string_enum! {
    PartnerStatus, "partner status" {
        Prospect => "prospect",
        Contacted => "contacted",
        Engaged => "engaged",
        Partnered => "partnered",
    }
}

string_enum! {
    WorkflowStatus, "workflow status" {
        Draft => "draft",
        Active => "active",
        Archived => "archived",
    }
}

impl VerificationType {
    /// Verified and audited organizations count as independently checked.
    pub fn is_independent(self) -> bool {
        matches!(self, VerificationType::Verified | VerificationType::Audited)
    }
}

impl Default for VerificationType {
    fn default() -> Self {
        Self::SelfReported
    }
}
