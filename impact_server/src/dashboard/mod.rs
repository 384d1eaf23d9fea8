//! Admin dashboard read models.

pub mod kpi;
