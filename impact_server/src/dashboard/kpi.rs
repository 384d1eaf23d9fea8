//! KPI summary for the admin dashboard.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::kinds::VerificationType;
use crate::models::organization::{Organization, OrganizationFilter};
use crate::storage::{Storage, StorageResult};

/// Organization count per verification level.
#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBreakdown {
    pub self_reported: i64,
    pub verified: i64,
    pub audited: i64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub organizations: i64,
    pub average_impact_score: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub organizations: i64,
    pub programs: i64,
    pub pending_verification_requests: i64,
    pub verification: VerificationBreakdown,
    pub sectors: Vec<SectorSummary>,
}

pub fn verification_breakdown(orgs: &[Organization]) -> VerificationBreakdown {
    let mut counts = VerificationBreakdown::default();
    for org in orgs {
        match org.verification_type.parse::<VerificationType>() {
            Ok(VerificationType::Verified) => counts.verified += 1,
            Ok(VerificationType::Audited) => counts.audited += 1,
            _ => counts.self_reported += 1,
        }
    }
    counts
}

/// Per-sector count and mean score, largest sectors first.
pub fn sector_summaries(orgs: &[Organization]) -> Vec<SectorSummary> {
    let mut by_sector: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for org in orgs {
        let entry = by_sector.entry(org.sector.as_str()).or_default();
        entry.0 += 1;
        entry.1 += org.impact_score as i64;
    }

    let mut sectors: Vec<SectorSummary> = by_sector
        .into_iter()
        .map(|(sector, (count, total))| SectorSummary {
            sector: sector.to_string(),
            organizations: count,
            average_impact_score: ((total as f64 / count as f64) * 10.0).round() / 10.0,
        })
        .collect();
    sectors.sort_by(|a, b| {
        b.organizations
            .cmp(&a.organizations)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    sectors
}

pub async fn admin_summary(storage: &dyn Storage) -> StorageResult<AdminSummary> {
    let orgs = storage
        .list_organizations(&OrganizationFilter::default())
        .await?;
    let programs = storage.count_programs().await?;
    let pending = storage.list_pending_verification_requests().await?;

    Ok(AdminSummary {
        organizations: orgs.len() as i64,
        programs,
        pending_verification_requests: pending.len() as i64,
        verification: verification_breakdown(&orgs),
        sectors: sector_summaries(&orgs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ranking::tests::org;

    #[test]
    fn sectors_sort_by_size_then_name() {
        let mut a = org(1, "A", 80);
        a.sector = "Health".into();
        let mut b = org(2, "B", 71);
        b.sector = "Health".into();
        let mut c = org(3, "C", 50);
        c.sector = "Education".into();
        let mut d = org(4, "D", 60);
        d.sector = "Agriculture".into();

        let sectors = sector_summaries(&[a, b, c, d]);
        let names: Vec<&str> = sectors.iter().map(|s| s.sector.as_str()).collect();
        assert_eq!(names, ["Health", "Agriculture", "Education"]);
        assert_eq!(sectors[0].organizations, 2);
        assert_eq!(sectors[0].average_impact_score, 75.5);
    }

    #[test]
    fn unknown_verification_levels_count_as_self_reported() {
        let mut a = org(1, "A", 80);
        a.verification_type = "audited".into();
        let mut b = org(2, "B", 70);
        b.verification_type = "legacy".into();
        let c = org(3, "C", 60);

        let counts = verification_breakdown(&[a, b, c]);
        assert_eq!(counts.audited, 1);
        assert_eq!(counts.self_reported, 2);
        assert_eq!(counts.verified, 0);
    }
}
