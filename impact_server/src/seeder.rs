//! Platform seeder — the mock dataset shown on a fresh install.
//!
//! Idempotent: does nothing when the store already holds organizations.

use chrono::NaiveDate;

use crate::models::kinds::ProgramStatus;
use crate::models::metric::NewMetric;
use crate::models::organization::{NewOrganization, OrganizationChanges, OrganizationFilter};
use crate::models::program::NewProgram;
use crate::models::report::NewReport;
use crate::models::statistic::NewStatistic;
use crate::models::user::NewUser;
use crate::services::scoring;
use crate::storage::Storage;

struct SeedOrg {
    name: &'static str,
    description: &'static str,
    mission: &'static str,
    sector: &'static str,
    region: &'static str,
    country: Option<&'static str>,
    website: &'static str,
    founded_year: i32,
    sdgs: &'static [i32],
    verification: &'static str,
    /// reporting quality, reach, social ROI, outcome effectiveness, transparency
    scores: [i32; 5],
    previous_score: Option<i32>,
    beneficiaries: i64,
    budget: i64,
    featured: bool,
    success_story: Option<&'static str>,
}

const ORGANIZATIONS: &[SeedOrg] = &[
    SeedOrg {
        name: "Water Forward",
        description: "Community-owned boreholes, filtration and sanitation training across rural Kenya.",
        mission: "Safe, reliable water within a short walk of every home.",
        sector: "Water & Sanitation",
        region: "East Africa",
        country: Some("Kenya"),
        website: "https://waterforward.example.org",
        founded_year: 2009,
        sdgs: &[3, 6],
        verification: "audited",
        scores: [88, 84, 91, 86, 90],
        previous_score: Some(82),
        beneficiaries: 1_250_000,
        budget: 4_800_000,
        featured: true,
        success_story: Some("Cut waterborne illness in Kitui County by 60% in three years."),
    },
    SeedOrg {
        name: "Bright Minds Learning",
        description: "After-school literacy and numeracy camps run by trained local volunteers.",
        mission: "Every child reading with confidence by age ten.",
        sector: "Education",
        region: "South Asia",
        country: Some("India"),
        website: "https://brightminds.example.org",
        founded_year: 2012,
        sdgs: &[4, 5, 10],
        verification: "verified",
        scores: [82, 90, 78, 80, 75],
        previous_score: Some(84),
        beneficiaries: 640_000,
        budget: 2_100_000,
        featured: true,
        success_story: Some("Grade-level reading rose from 38% to 71% across 400 partner schools."),
    },
    SeedOrg {
        name: "Green Roots Collective",
        description: "Regenerative farming cooperatives and seed banks for smallholder farmers.",
        mission: "Resilient harvests on healthy soil.",
        sector: "Agriculture",
        region: "Latin America",
        country: Some("Peru"),
        website: "https://greenroots.example.org",
        founded_year: 2015,
        sdgs: &[2, 13, 15],
        verification: "verified",
        scores: [76, 70, 85, 79, 81],
        previous_score: Some(71),
        beneficiaries: 85_000,
        budget: 950_000,
        featured: true,
        success_story: None,
    },
    SeedOrg {
        name: "Solar Sisters Network",
        description: "Women-led distribution of solar lanterns and clean cookstoves.",
        mission: "Clean energy and income for women entrepreneurs.",
        sector: "Energy",
        region: "West Africa",
        country: Some("Nigeria"),
        website: "https://solarsisters.example.org",
        founded_year: 2013,
        sdgs: &[5, 7, 8],
        verification: "self-reported",
        scores: [68, 74, 80, 72, 64],
        previous_score: Some(65),
        beneficiaries: 410_000,
        budget: 1_300_000,
        featured: false,
        success_story: Some("3,200 women now run profitable clean-energy businesses."),
    },
    SeedOrg {
        name: "HealthBridge Clinics",
        description: "Mobile primary-care clinics and community health workers for island provinces.",
        mission: "Primary care within reach of every family.",
        sector: "Health",
        region: "Southeast Asia",
        country: Some("Philippines"),
        website: "https://healthbridge.example.org",
        founded_year: 2007,
        sdgs: &[3],
        verification: "audited",
        scores: [92, 86, 88, 90, 94],
        previous_score: None,
        beneficiaries: 920_000,
        budget: 6_200_000,
        featured: false,
        success_story: None,
    },
    SeedOrg {
        name: "Open Books Initiative",
        description: "Free neighbourhood libraries and reading mentors in underserved cities.",
        mission: "Books and mentors for every neighbourhood.",
        sector: "Education",
        region: "North America",
        country: Some("United States"),
        website: "https://openbooks.example.org",
        founded_year: 2018,
        sdgs: &[4, 16],
        verification: "self-reported",
        scores: [55, 60, 58, 62, 50],
        previous_score: None,
        beneficiaries: 36_000,
        budget: 280_000,
        featured: false,
        success_story: None,
    },
    SeedOrg {
        name: "Ocean Guardians",
        description: "Reef restoration and sustainable fisheries with coastal communities.",
        mission: "Living reefs and thriving fishing villages.",
        sector: "Environment",
        region: "Oceania",
        country: Some("Fiji"),
        website: "https://oceanguardians.example.org",
        founded_year: 2011,
        sdgs: &[13, 14],
        verification: "verified",
        scores: [79, 65, 72, 77, 83],
        previous_score: Some(75),
        beneficiaries: 52_000,
        budget: 720_000,
        featured: false,
        success_story: None,
    },
    SeedOrg {
        name: "Microfinance for All",
        description: "Group lending, savings circles and financial literacy for first-time borrowers.",
        mission: "Fair credit as a path out of poverty.",
        sector: "Economic Development",
        region: "Global",
        country: None,
        website: "https://mf4all.example.org",
        founded_year: 2005,
        sdgs: &[1, 8, 10],
        verification: "verified",
        scores: [84, 88, 83, 81, 86],
        previous_score: Some(79),
        beneficiaries: 2_300_000,
        budget: 9_500_000,
        featured: false,
        success_story: Some("Repayment above 97% while 1.1M borrowers opened their first savings account."),
    },
];

/// (organization name, program name, category, beneficiaries, start, status)
const PROGRAMS: &[(&str, &str, &str, i64, &str, ProgramStatus)] = &[
    ("Water Forward", "Borehole drilling", "Infrastructure", 800_000, "2012-03-01", ProgramStatus::Active),
    ("Water Forward", "Household filters", "Health", 450_000, "2016-07-15", ProgramStatus::Active),
    ("Bright Minds Learning", "Reading camps", "Literacy", 520_000, "2013-06-01", ProgramStatus::Active),
    ("Bright Minds Learning", "Girls in STEM", "STEM", 120_000, "2021-01-10", ProgramStatus::Active),
    ("Green Roots Collective", "Community seed banks", "Food security", 40_000, "2016-02-01", ProgramStatus::Active),
    ("Solar Sisters Network", "Solar entrepreneur training", "Livelihoods", 3_200, "2014-09-01", ProgramStatus::Active),
    ("HealthBridge Clinics", "Mobile clinics", "Primary care", 700_000, "2008-01-01", ProgramStatus::Active),
    ("HealthBridge Clinics", "Maternal health outreach", "Maternal health", 220_000, "2015-05-01", ProgramStatus::Completed),
    ("Ocean Guardians", "Coral nurseries", "Restoration", 12_000, "2014-11-01", ProgramStatus::Active),
    ("Microfinance for All", "Savings circles", "Financial inclusion", 1_100_000, "2009-04-01", ProgramStatus::Active),
];

/// (organization name, title, report type, year)
const REPORTS: &[(&str, &str, &str, i32)] = &[
    ("Water Forward", "Annual Report 2023", "annual", 2023),
    ("Water Forward", "Independent Audit FY2023", "financial", 2023),
    ("Bright Minds Learning", "Learning Outcomes 2023", "impact", 2023),
    ("HealthBridge Clinics", "Annual Report 2023", "annual", 2023),
    ("Microfinance for All", "Social Performance Report 2022", "impact", 2022),
];

/// (organization name, metric, value, unit, target)
const METRICS: &[(&str, &str, f64, &str, Option<f64>)] = &[
    ("Water Forward", "Wells operational", 412.0, "wells", Some(450.0)),
    ("Bright Minds Learning", "Students at grade level", 71.0, "%", Some(80.0)),
    ("Green Roots Collective", "Hectares under regenerative practice", 12_400.0, "ha", None),
    ("HealthBridge Clinics", "Patient visits", 1_350_000.0, "visits", None),
    ("Microfinance for All", "Repayment rate", 97.4, "%", Some(95.0)),
];

/// (name, label, value)
const HIGHLIGHTS: &[(&str, &str, i64)] = &[
    ("countries_reached", "Countries reached", 42),
    ("funds_tracked", "Funds tracked (USD)", 125_000_000),
    ("reports_published", "Reports published", 1_180),
    ("partner_organizations", "Partner organizations", 320),
];

fn new_org(seed: &SeedOrg) -> NewOrganization {
    let [reporting_quality, reach, social_roi, outcome_effectiveness, transparency_governance] =
        seed.scores;
    let mut org = NewOrganization {
        name: seed.name.to_string(),
        description: seed.description.to_string(),
        mission: seed.mission.to_string(),
        sector: seed.sector.to_string(),
        region: seed.region.to_string(),
        country: seed.country.map(str::to_string),
        website: Some(seed.website.to_string()),
        logo_url: None,
        founded_year: Some(seed.founded_year),
        sdg_goals: seed.sdgs.to_vec(),
        verification_type: seed.verification.to_string(),
        reporting_quality,
        reach,
        social_roi,
        outcome_effectiveness,
        transparency_governance,
        impact_score: 0,
        beneficiaries_reached: seed.beneficiaries,
        annual_budget: Some(seed.budget),
        featured: seed.featured,
        success_story: seed.success_story.map(str::to_string),
    };
    org.impact_score = scoring::impact_iq(&org.sub_scores());
    org
}

/// Load the mock dataset into an empty store. Returns whether anything was written.
pub async fn seed_storage(storage: &dyn Storage) -> anyhow::Result<bool> {
    let existing = storage
        .list_organizations(&OrganizationFilter::default())
        .await?;
    if !existing.is_empty() {
        tracing::info!(organizations = existing.len(), "Store already populated, skipping seed");
        return Ok(false);
    }

    let mut ids = std::collections::HashMap::new();
    for seed in ORGANIZATIONS {
        let org = storage.create_organization(new_org(seed)).await?;
        if let Some(prev) = seed.previous_score {
            let changes = OrganizationChanges {
                previous_score: Some(prev),
                ..Default::default()
            };
            storage.update_organization(org.id, changes).await?;
        }
        crate::metrics::organization_created("seed");
        ids.insert(seed.name, org.id);
    }

    for (org_name, name, category, beneficiaries, start, status) in PROGRAMS {
        let Some(&organization_id) = ids.get(org_name) else {
            continue;
        };
        storage
            .create_program(NewProgram {
                organization_id,
                name: name.to_string(),
                description: None,
                category: Some(category.to_string()),
                beneficiaries: *beneficiaries,
                budget: None,
                start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").ok(),
                end_date: None,
                status: status.as_str().to_string(),
            })
            .await?;
    }

    for (org_name, title, report_type, year) in REPORTS {
        let Some(&organization_id) = ids.get(org_name) else {
            continue;
        };
        storage
            .create_report(NewReport {
                organization_id,
                title: title.to_string(),
                report_type: report_type.to_string(),
                year: *year,
                summary: None,
                file_url: None,
                verification_type: "self-reported".to_string(),
                published_at: None,
            })
            .await?;
    }

    for (org_name, name, value, unit, target) in METRICS {
        let Some(&organization_id) = ids.get(org_name) else {
            continue;
        };
        storage
            .create_metric(NewMetric {
                organization_id,
                program_id: None,
                name: name.to_string(),
                value: *value,
                unit: unit.to_string(),
                target: *target,
                period: "annual".to_string(),
            })
            .await?;
    }

    for (name, label, value) in HIGHLIGHTS {
        storage
            .upsert_statistic(NewStatistic {
                name: name.to_string(),
                label: label.to_string(),
                value: *value,
            })
            .await?;
    }

    storage
        .create_user(NewUser {
            username: "admin".to_string(),
            email: "admin@basicimpacts.example.org".to_string(),
            full_name: Some("Platform Admin".to_string()),
            role: "admin".to_string(),
            organization_id: None,
        })
        .await?;
    if let Some(&water_forward) = ids.get("Water Forward") {
        storage
            .create_user(NewUser {
                username: "wanjiru".to_string(),
                email: "wanjiru@waterforward.example.org".to_string(),
                full_name: Some("Wanjiru Kamau".to_string()),
                role: "member".to_string(),
                organization_id: Some(water_forward),
            })
            .await?;
    }

    tracing::info!(
        organizations = ORGANIZATIONS.len(),
        programs = PROGRAMS.len(),
        reports = REPORTS.len(),
        "Seeded mock dataset"
    );
    Ok(true)
}

/// A `MemStorage` holding the mock dataset.
#[cfg(test)]
pub async fn seeded_store() -> crate::storage::MemStorage {
    let store = crate::storage::MemStorage::new();
    seed_storage(&store).await.unwrap();
    store
}
