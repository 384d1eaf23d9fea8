//! Platform services — scoring, read models, import and the write paths
//! behind the REST API.

pub mod import_service;
pub mod invitation_service;
pub mod json_repair;
pub mod organization_service;
pub mod portfolio_service;
pub mod ranking;
pub mod scoring;
pub mod user_service;
pub mod validation;
pub mod verification_service;
