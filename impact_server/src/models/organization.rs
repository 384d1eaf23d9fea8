//! organization — A profiled social-impact organization with its Impact IQ inputs.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::organizations;
use crate::services::scoring::SubScores;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = organizations)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub mission: String,
    pub sector: String,
    pub region: String,
    pub country: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub founded_year: Option<i32>,
    pub sdg_goals: Vec<i32>,
    pub verification_type: String,
    pub reporting_quality: i32,
    pub reach: i32,
    pub social_roi: i32,
    pub outcome_effectiveness: i32,
    pub transparency_governance: i32,
    pub impact_score: i32,
    pub previous_score: Option<i32>,
    pub beneficiaries_reached: i64,
    pub annual_budget: Option<i64>,
    pub featured: bool,
    pub success_story: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            reporting_quality: self.reporting_quality,
            reach: self.reach,
            social_roi: self.social_roi,
            outcome_effectiveness: self.outcome_effectiveness,
            transparency_governance: self.transparency_governance,
        }
    }

    /// Score movement since the last recomputation, if one happened.
    pub fn score_delta(&self) -> Option<i32> {
        self.previous_score.map(|prev| self.impact_score - prev)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = organizations)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mission: String,
    pub sector: String,
    pub region: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub sdg_goals: Vec<i32>,
    #[serde(default = "default_verification_type")]
    pub verification_type: String,
    #[serde(default)]
    pub reporting_quality: i32,
    #[serde(default)]
    pub reach: i32,
    #[serde(default)]
    pub social_roi: i32,
    #[serde(default)]
    pub outcome_effectiveness: i32,
    #[serde(default)]
    pub transparency_governance: i32,
    /// Always overwritten with the computed Impact IQ before insert.
    #[serde(default)]
    pub impact_score: i32,
    #[serde(default)]
    pub beneficiaries_reached: i64,
    #[serde(default)]
    pub annual_budget: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub success_story: Option<String>,
}

impl NewOrganization {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            reporting_quality: self.reporting_quality,
            reach: self.reach,
            social_roi: self.social_roi,
            outcome_effectiveness: self.outcome_effectiveness,
            transparency_governance: self.transparency_governance,
        }
    }
}

fn default_verification_type() -> String {
    "self-reported".to_string()
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; `None` fields are left untouched and `Some(None)` clears
/// a nullable column.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = organizations)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub mission: Option<String>,
    pub sector: Option<String>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub founded_year: Option<Option<i32>>,
    pub sdg_goals: Option<Vec<i32>>,
    pub verification_type: Option<String>,
    pub reporting_quality: Option<i32>,
    pub reach: Option<i32>,
    pub social_roi: Option<i32>,
    pub outcome_effectiveness: Option<i32>,
    pub transparency_governance: Option<i32>,
    #[serde(skip)]
    pub impact_score: Option<i32>,
    #[serde(skip)]
    pub previous_score: Option<i32>,
    pub beneficiaries_reached: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub annual_budget: Option<Option<i64>>,
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub success_story: Option<Option<String>>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrganizationChanges {
    pub fn touches_scores(&self) -> bool {
        self.reporting_quality.is_some()
            || self.reach.is_some()
            || self.social_roi.is_some()
            || self.outcome_effectiveness.is_some()
            || self.transparency_governance.is_some()
    }

    /// Names of the client-supplied fields that are set, in camelCase.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        macro_rules! check {
            ($($field:ident => $name:literal),+ $(,)?) => {
                $(if self.$field.is_some() { fields.push($name); })+
            };
        }
        check!(
            name => "name",
            description => "description",
            mission => "mission",
            sector => "sector",
            region => "region",
            country => "country",
            website => "website",
            logo_url => "logoUrl",
            founded_year => "foundedYear",
            sdg_goals => "sdgGoals",
            verification_type => "verificationType",
            reporting_quality => "reportingQuality",
            reach => "reach",
            social_roi => "socialRoi",
            outcome_effectiveness => "outcomeEffectiveness",
            transparency_governance => "transparencyGovernance",
            beneficiaries_reached => "beneficiariesReached",
            annual_budget => "annualBudget",
            featured => "featured",
            success_story => "successStory",
        );
        fields
    }

    /// Overlay the changes onto an existing row.
    pub fn apply_to(&self, org: &mut Organization) {
        macro_rules! set {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = &self.$field { org.$field = v.clone(); })+
            };
        }
        macro_rules! set_opt {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = &self.$field { org.$field = Some(v.clone()); })+
            };
        }
        set!(
            name,
            description,
            mission,
            sector,
            region,
            sdg_goals,
            verification_type,
            reporting_quality,
            reach,
            social_roi,
            outcome_effectiveness,
            transparency_governance,
            impact_score,
            beneficiaries_reached,
            featured,
            updated_at,
        );
        set!(
            country,
            website,
            logo_url,
            founded_year,
            annual_budget,
            success_story,
        );
        set_opt!(previous_score);
    }
}

/// Comparison key for sector/region/verification facets.
pub fn facet_key(value: &str) -> String {
    value.trim().to_lowercase().replace(['_', ' '], "-")
}

/// Filters accepted by the organization listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationFilter {
    pub sector: Option<String>,
    pub region: Option<String>,
    pub verification: Option<String>,
    /// Case-insensitive substring over name and description.
    pub q: Option<String>,
}

impl OrganizationFilter {
    pub fn matches(&self, org: &Organization) -> bool {
        fn same(wanted: &Option<String>, actual: &str) -> bool {
            wanted
                .as_deref()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .is_none_or(|w| facet_key(w) == facet_key(actual))
        }

        let text_hit = match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let q = q.to_lowercase();
                org.name.to_lowercase().contains(&q) || org.description.to_lowercase().contains(&q)
            }
            None => true,
        };

        same(&self.sector, &org.sector)
            && same(&self.region, &org.region)
            && same(&self.verification, &org.verification_type)
            && text_hit
    }
}
