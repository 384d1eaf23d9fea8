//! Activity events for the audit trail.
//!
//! Services describe what happened as an `ActivityEvent`; the event is
//! persisted as an `activity_logs` row whose `details` column holds the
//! event's JSON.

pub mod activity;
