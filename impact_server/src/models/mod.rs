//! Platform data models — one file per table.

pub mod activity;
pub mod invitation;
pub mod kinds;
pub mod metric;
pub mod notification;
pub mod organization;
pub mod partner;
pub mod program;
pub mod report;
pub mod statistic;
pub mod user;
pub mod verification;
pub mod workflow;
