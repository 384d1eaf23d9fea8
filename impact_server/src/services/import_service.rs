//! JSON organization import: extract, validate, map, commit.
//!
//! Hard errors (nothing usable, no name) abort the import. Everything else
//! is a soft warning: the field falls back to a default and the import
//! proceeds.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::events::activity::ActivityEvent;
use crate::models::kinds::{ProgramStatus, VerificationType};
use crate::models::metric::{Metric, NewMetric};
use crate::models::organization::{NewOrganization, Organization};
use crate::models::program::{NewProgram, Program};
use crate::services::json_repair;
use crate::services::{organization_service, validation};
use crate::services::scoring::{self, SubScores};
use crate::storage::{OrganizationBundle, Storage};

pub const DEFAULT_SECTOR: &str = "Uncategorized";
pub const DEFAULT_REGION: &str = "Global";
pub const MIN_FOUNDED_YEAR: i32 = 1800;

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("Import content is empty")]
    EmptyInput,

    #[error("Import content is {size} bytes; the limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("No JSON object or array found in the input")]
    NoJsonFound,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON object for the organization, found {0}")]
    NotAnObject(&'static str),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}

/// What the admin sees before confirming an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub organization: NewOrganization,
    pub impact_grade: &'static str,
    pub programs: Vec<NewProgram>,
    pub metrics: Vec<NewMetric>,
    pub warnings: Vec<String>,
}

/// Rows created by a committed import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub organization: Organization,
    pub programs: Vec<Program>,
    pub metrics: Vec<Metric>,
    pub warnings: Vec<String>,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First non-null value under any of the key aliases.
fn lookup<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Field reader that records a warning for every fallback it takes.
struct Mapper<'a> {
    record: &'a Map<String, Value>,
    warnings: Vec<String>,
}

impl<'a> Mapper<'a> {
    fn new(record: &'a Map<String, Value>) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn field(&self, keys: &[&str]) -> Option<&'a Value> {
        lookup(self.record, keys)
    }

    fn text_value(&mut self, value: Option<&Value>, label: &str) -> Option<String> {
        match value? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                self.warn(format!("{label} should be text, found {}; ignored", kind_of(other)));
                None
            }
        }
    }

    fn text(&mut self, keys: &[&str], label: &str) -> Option<String> {
        let value = self.field(keys);
        self.text_value(value, label)
    }

    fn integer_value(&mut self, value: Option<&Value>, label: &str) -> Option<i64> {
        match value? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => {
                let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
                match cleaned.trim().parse::<f64>() {
                    Ok(f) => Some(f.round() as i64),
                    Err(_) => {
                        self.warn(format!("{label} '{s}' is not a number; ignored"));
                        None
                    }
                }
            }
            other => {
                self.warn(format!("{label} should be a number, found {}; ignored", kind_of(other)));
                None
            }
        }
    }

    fn integer(&mut self, keys: &[&str], label: &str) -> Option<i64> {
        let value = self.field(keys);
        self.integer_value(value, label)
    }

    fn float_value(&mut self, value: Option<&Value>, label: &str) -> Option<f64> {
        match value? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.trim().replace(',', "").parse::<f64>() {
                Ok(f) if f.is_finite() => Some(f),
                Ok(_) => {
                    self.warn(format!("{label} '{s}' is not a finite number; ignored"));
                    None
                }
                Err(_) => {
                    self.warn(format!("{label} '{s}' is not a number; ignored"));
                    None
                }
            },
            other => {
                self.warn(format!("{label} should be a number, found {}; ignored", kind_of(other)));
                None
            }
        }
    }

    fn non_negative(&mut self, keys: &[&str], label: &str) -> Option<i64> {
        let n = self.integer(keys, label)?;
        if n < 0 {
            self.warn(format!("{label} cannot be negative; using 0"));
            return Some(0);
        }
        Some(n)
    }

    fn boolean(&mut self, keys: &[&str], label: &str) -> bool {
        match self.field(keys) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") || s == "1" => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") || s == "0" => false,
            Some(other) => {
                self.warn(format!("{label} should be true or false, found {}; using false", kind_of(other)));
                false
            }
        }
    }

    fn required_text(&mut self, keys: &[&str], label: &str, default: &str) -> String {
        match self.text(keys, label) {
            Some(v) => v,
            None => {
                self.warn(format!("Missing {label}; defaulted to \"{default}\""));
                default.to_string()
            }
        }
    }

    /// Cut text down to `max` characters, warning when anything is lost.
    fn fit(&mut self, value: String, label: &str, max: usize) -> String {
        if value.chars().count() <= max {
            return value;
        }
        self.warn(format!("{label} is longer than {max} characters; truncated"));
        value.chars().take(max).collect()
    }

    fn fit_opt(&mut self, value: Option<String>, label: &str, max: usize) -> Option<String> {
        value.map(|v| self.fit(v, label, max))
    }

    /// URLs are dropped rather than cut.
    fn url(&mut self, value: Option<String>, label: &str) -> Option<String> {
        let url = value?;
        if url.chars().count() > validation::MAX_URL_CHARS {
            self.warn(format!(
                "{label} is longer than {} characters; ignored",
                validation::MAX_URL_CHARS
            ));
            return None;
        }
        Some(url)
    }

    fn scores(&mut self) -> SubScores {
        const FIELDS: [(&str, &str, &str); 5] = [
            ("reportingQuality", "reporting_quality", "reporting quality"),
            ("reach", "reach", "reach"),
            ("socialRoi", "social_roi", "social ROI"),
            ("outcomeEffectiveness", "outcome_effectiveness", "outcome effectiveness"),
            ("transparencyGovernance", "transparency_governance", "transparency/governance"),
        ];

        let nested = match self.field(&["scores", "subScores", "sub_scores"]) {
            Some(Value::Object(obj)) => Some(obj),
            Some(other) => {
                self.warn(format!("scores should be an object, found {}; ignored", kind_of(other)));
                None
            }
            None => None,
        };

        let mut values = [0i32; 5];
        let mut missing = Vec::new();
        for (slot, (camel, snake, label)) in values.iter_mut().zip(FIELDS) {
            let keys = [camel, snake];
            let raw = nested
                .and_then(|obj| lookup(obj, &keys))
                .or_else(|| self.field(&keys));
            match self.integer_value(raw, label) {
                Some(v) if (0..=100).contains(&v) => *slot = v as i32,
                Some(v) => {
                    let clamped = v.clamp(0, 100) as i32;
                    self.warn(format!("{label} score {v} is outside 0-100; clamped to {clamped}"));
                    *slot = clamped;
                }
                None => missing.push(label),
            }
        }
        if !missing.is_empty() {
            self.warn(format!("Missing sub-scores defaulted to 0: {}", missing.join(", ")));
        }

        SubScores {
            reporting_quality: values[0],
            reach: values[1],
            social_roi: values[2],
            outcome_effectiveness: values[3],
            transparency_governance: values[4],
        }
    }

    fn sdg_goals(&mut self) -> Vec<i32> {
        let items = match self.field(&["sdgs", "sdgGoals", "sdg_goals"]) {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.warn(format!("sdgs should be an array, found {}; ignored", kind_of(other)));
                return Vec::new();
            }
        };

        let mut goals = Vec::new();
        for item in items {
            let goal = match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => DIGITS_REGEX
                    .find(s)
                    .and_then(|m| m.as_str().parse::<i64>().ok()),
                _ => None,
            };
            match goal {
                Some(g) if (1..=17).contains(&g) => {
                    let g = g as i32;
                    if !goals.contains(&g) {
                        goals.push(g);
                    }
                }
                _ => self.warn(format!("Dropped SDG entry {item}: goals run from 1 to 17")),
            }
        }
        goals.sort_unstable();
        goals
    }

    fn verification_type(&mut self) -> VerificationType {
        let Some(raw) = self.text(
            &["verificationType", "verification_type", "verification"],
            "verificationType",
        ) else {
            return VerificationType::default();
        };
        raw.parse().unwrap_or_else(|_| {
            self.warn(format!(
                "Unknown verification type \"{raw}\"; defaulted to self-reported"
            ));
            VerificationType::default()
        })
    }

    fn founded_year(&mut self) -> Option<i32> {
        let year = self.integer(&["foundedYear", "founded_year", "founded"], "foundedYear")?;
        let current = Utc::now().year() as i64;
        if (MIN_FOUNDED_YEAR as i64..=current).contains(&year) {
            Some(year as i32)
        } else {
            self.warn(format!("foundedYear {year} is not a plausible year; ignored"));
            None
        }
    }

    fn website(&mut self) -> Option<String> {
        let site = self.text(&["website", "url", "websiteUrl"], "website")?;
        if site.starts_with("http://") || site.starts_with("https://") {
            Some(site)
        } else {
            self.warn(format!("website \"{site}\" has no scheme; assumed https"));
            Some(format!("https://{site}"))
        }
    }

    fn date_value(&mut self, value: Option<&Value>, label: &str) -> Option<NaiveDate> {
        let raw = self.text_value(value, label)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.warn(format!("{label} \"{raw}\" is not a YYYY-MM-DD date; ignored"));
                None
            }
        }
    }

    fn programs(&mut self, list: Option<&Value>) -> Vec<NewProgram> {
        let items = match list {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.warn(format!("programs should be an array, found {}; ignored", kind_of(other)));
                return Vec::new();
            }
        };

        let mut programs = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let Value::Object(obj) = item else {
                self.warn(format!("programs[{idx}] is {}, not an object; skipped", kind_of(item)));
                continue;
            };
            let label = format!("programs[{idx}]");
            let Some(name) = self.text_value(lookup(obj, &["name", "title"]), &label)
            else {
                self.warn(format!("{label} has no name; skipped"));
                continue;
            };

            let status = match self.text_value(obj.get("status"), &label) {
                None => ProgramStatus::Active,
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    self.warn(format!("{label} status \"{raw}\" is unknown; defaulted to active"));
                    ProgramStatus::Active
                }),
            };
            let beneficiaries = match self
                .integer_value(lookup(obj, &["beneficiaries", "beneficiariesReached"]), &label)
            {
                Some(n) if n < 0 => {
                    self.warn(format!("{label} beneficiaries cannot be negative; using 0"));
                    0
                }
                Some(n) => n,
                None => 0,
            };
            let budget = match self.integer_value(obj.get("budget"), &label) {
                Some(n) if n < 0 => {
                    self.warn(format!("{label} budget cannot be negative; ignored"));
                    None
                }
                other => other,
            };
            let start_date = self.date_value(
                lookup(obj, &["startDate", "start_date"]),
                &format!("{label}.startDate"),
            );
            let mut end_date = self.date_value(
                lookup(obj, &["endDate", "end_date"]),
                &format!("{label}.endDate"),
            );
            if validation::date_range(start_date, end_date).is_err() {
                self.warn(format!("{label} endDate is before startDate; endDate ignored"));
                end_date = None;
            }

            let name = self.fit(name, &label, validation::MAX_NAME_CHARS);
            let description = self.text_value(obj.get("description"), &label);
            let category = self.text_value(obj.get("category"), &label);
            let category = self.fit_opt(category, &format!("{label}.category"), validation::MAX_LABEL_CHARS);
            programs.push(NewProgram {
                organization_id: 0,
                name,
                description,
                category,
                beneficiaries,
                budget,
                start_date,
                end_date,
                status: status.as_str().to_string(),
            });
        }
        programs
    }

    fn metrics(&mut self, list: Option<&Value>) -> Vec<NewMetric> {
        let items = match list {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.warn(format!("metrics should be an array, found {}; ignored", kind_of(other)));
                return Vec::new();
            }
        };

        let mut metrics = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let label = format!("metrics[{idx}]");
            let Value::Object(obj) = item else {
                self.warn(format!("{label} is {}, not an object; skipped", kind_of(item)));
                continue;
            };
            let Some(name) = self.text_value(obj.get("name"), &label) else {
                self.warn(format!("{label} has no name; skipped"));
                continue;
            };
            let Some(value) = self.float_value(obj.get("value"), &label) else {
                self.warn(format!("{label} has no numeric value; skipped"));
                continue;
            };
            let name = self.fit(name, &label, validation::MAX_NAME_CHARS);
            let unit = self.text_value(obj.get("unit"), &label).unwrap_or_default();
            let unit = self.fit(unit, &format!("{label}.unit"), validation::MAX_SHORT_CHARS);
            let target = self.float_value(obj.get("target"), &label);
            let period = self
                .text_value(obj.get("period"), &label)
                .unwrap_or_else(|| "annual".to_string());
            let period = self.fit(period, &format!("{label}.period"), validation::MAX_PERIOD_CHARS);
            metrics.push(NewMetric {
                organization_id: 0,
                program_id: None,
                name,
                value,
                unit,
                target,
                period,
            });
        }
        metrics
    }
}

/// Pick the organization record (and where its children live) out of the document.
fn locate_record(
    doc: &Value,
    warnings: &mut Vec<String>,
) -> Result<(Map<String, Value>, Option<Value>, Option<Value>), ImportError> {
    let top = match doc {
        Value::Array(items) => {
            let first = items.first().ok_or(ImportError::NotAnObject("an empty array"))?;
            if items.len() > 1 {
                warnings.push(format!(
                    "Input holds {} records; only the first was imported",
                    items.len()
                ));
            }
            first
        }
        other => other,
    };

    let Value::Object(top) = top else {
        return Err(ImportError::NotAnObject(kind_of(top)));
    };

    match top.get("organization") {
        Some(Value::Object(inner)) => {
            let programs = inner.get("programs").or_else(|| top.get("programs")).cloned();
            let metrics = inner.get("metrics").or_else(|| top.get("metrics")).cloned();
            Ok((inner.clone(), programs, metrics))
        }
        _ => Ok((
            top.clone(),
            top.get("programs").cloned(),
            top.get("metrics").cloned(),
        )),
    }
}

/// Run extraction, validation and mapping without touching storage.
pub fn preview(raw: &str, max_bytes: usize) -> Result<ImportPreview, ImportError> {
    if raw.trim().is_empty() {
        return Err(ImportError::EmptyInput);
    }
    if raw.len() > max_bytes {
        return Err(ImportError::TooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }

    let extracted = json_repair::extract_json(raw).ok_or(ImportError::NoJsonFound)?;
    let doc: Value = serde_json::from_str(&extracted.text)
        .map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let mut warnings = extracted.repairs;
    let (record, programs, metrics) = locate_record(&doc, &mut warnings)?;

    let mut m = Mapper::new(&record);
    let name = m
        .text(&["name", "organizationName", "organization_name"], "name")
        .ok_or(ImportError::MissingField("name"))?;

    let name = m.fit(name, "name", validation::MAX_NAME_CHARS);
    let sector = m.required_text(&["sector", "category"], "sector", DEFAULT_SECTOR);
    let sector = m.fit(sector, "sector", validation::MAX_LABEL_CHARS);
    let region = m.required_text(&["region"], "region", DEFAULT_REGION);
    let region = m.fit(region, "region", validation::MAX_LABEL_CHARS);
    let scores = m.scores();
    let impact_score = scoring::impact_iq(&scores);

    if let Some(claimed) = m.integer(&["impactScore", "impact_score", "score"], "impactScore") {
        if claimed != impact_score as i64 {
            m.warn(format!(
                "impactScore {claimed} replaced by the computed Impact IQ {impact_score}"
            ));
        }
    }

    let organization = NewOrganization {
        name,
        description: m.text(&["description", "about"], "description").unwrap_or_default(),
        mission: m.text(&["mission", "missionStatement"], "mission").unwrap_or_default(),
        sector,
        region,
        country: {
            let country = m.text(&["country"], "country");
            m.fit_opt(country, "country", validation::MAX_LABEL_CHARS)
        },
        website: {
            let site = m.website();
            m.url(site, "website")
        },
        logo_url: {
            let logo = m.text(&["logoUrl", "logo_url", "logo"], "logoUrl");
            m.url(logo, "logoUrl")
        },
        founded_year: m.founded_year(),
        sdg_goals: m.sdg_goals(),
        verification_type: m.verification_type().as_str().to_string(),
        reporting_quality: scores.reporting_quality,
        reach: scores.reach,
        social_roi: scores.social_roi,
        outcome_effectiveness: scores.outcome_effectiveness,
        transparency_governance: scores.transparency_governance,
        impact_score,
        beneficiaries_reached: m
            .non_negative(
                &["beneficiariesReached", "beneficiaries_reached", "beneficiaries"],
                "beneficiariesReached",
            )
            .unwrap_or(0),
        annual_budget: m.non_negative(&["annualBudget", "annual_budget", "budget"], "annualBudget"),
        featured: m.boolean(&["featured"], "featured"),
        success_story: m.text(&["successStory", "success_story"], "successStory"),
    };

    let programs = m.programs(programs.as_ref());
    let metrics = m.metrics(metrics.as_ref());
    warnings.extend(m.warnings);

    Ok(ImportPreview {
        impact_grade: scoring::grade(organization.impact_score),
        organization,
        programs,
        metrics,
        warnings,
    })
}

/// Validate and persist an import. The organization, its children and the
/// audit entry are written together.
pub async fn commit(storage: &dyn Storage, raw: &str, max_bytes: usize) -> AppResult<ImportResult> {
    let preview = match preview(raw, max_bytes) {
        Ok(p) => p,
        Err(e) => {
            crate::metrics::import_completed("rejected");
            tracing::warn!(error = %e, "Organization import rejected");
            return Err(e.into());
        }
    };

    let mut new_org = preview.organization;
    if let Err(e) = organization_service::prepare_new(&mut new_org) {
        crate::metrics::import_completed("rejected");
        tracing::warn!(error = %e, "Organization import rejected");
        return Err(e);
    }

    let event = ActivityEvent::OrganizationImported {
        name: new_org.name.clone(),
        programs: preview.programs.len(),
        metrics: preview.metrics.len(),
        warnings: preview.warnings.len(),
    };
    let stored = storage
        .create_organization_bundle(OrganizationBundle {
            organization: new_org,
            programs: preview.programs,
            metrics: preview.metrics,
            activity: event.into_log(None, None, None),
        })
        .await?;
    let (organization, programs, metrics) = (stored.organization, stored.programs, stored.metrics);
    organization_service::record_created(&organization, "import");

    crate::metrics::import_completed(if preview.warnings.is_empty() {
        "clean"
    } else {
        "with_warnings"
    });
    tracing::info!(
        organization_id = organization.id,
        programs = programs.len(),
        metrics = metrics.len(),
        warnings = preview.warnings.len(),
        "Organization imported"
    );

    Ok(ImportResult {
        organization,
        programs,
        metrics,
        warnings: preview.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    const LIMIT: usize = 1024 * 1024;

    #[test]
    fn empty_and_oversized_input_are_rejected() {
        assert_eq!(preview("   \n", LIMIT), Err(ImportError::EmptyInput));
        assert_eq!(
            preview("{\"name\": \"A\"}", 4),
            Err(ImportError::TooLarge { size: 13, limit: 4 })
        );
    }

    #[test]
    fn missing_name_is_a_hard_error() {
        let err = preview(r#"{"sector": "Health"}"#, LIMIT).unwrap_err();
        assert_eq!(err, ImportError::MissingField("name"));

        let err = preview(r#"{"name": "   "}"#, LIMIT).unwrap_err();
        assert_eq!(err, ImportError::MissingField("name"));
    }

    #[test]
    fn non_object_records_are_hard_errors() {
        assert_eq!(
            preview("[1, 2]", LIMIT).unwrap_err(),
            ImportError::NotAnObject("a number")
        );
        assert_eq!(
            preview("[]", LIMIT).unwrap_err(),
            ImportError::NotAnObject("an empty array")
        );
        assert!(matches!(
            preview("no json here", LIMIT).unwrap_err(),
            ImportError::NoJsonFound
        ));
    }

    #[test]
    fn unparseable_json_reports_the_parser_message() {
        let err = preview(r#"{"name": "A" "sector": "B"}"#, LIMIT).unwrap_err();
        assert!(matches!(err, ImportError::InvalidJson(_)));
    }

    #[test]
    fn missing_sector_and_region_default_with_warnings() {
        let p = preview(r#"{"name": "Solo"}"#, LIMIT).unwrap();
        assert_eq!(p.organization.sector, DEFAULT_SECTOR);
        assert_eq!(p.organization.region, DEFAULT_REGION);
        assert!(p.warnings.iter().any(|w| w.contains("Missing sector")));
        assert!(p.warnings.iter().any(|w| w.contains("Missing region")));
        assert!(p.warnings.iter().any(|w| w.contains("Missing sub-scores")));
        assert_eq!(p.organization.impact_score, 0);
        assert_eq!(p.impact_grade, "D");
    }

    #[test]
    fn full_record_maps_without_warnings() {
        let raw = r#"{
            "name": "Water Forward",
            "description": "Boreholes and filters",
            "mission": "Safe water for every village",
            "sector": "Water & Sanitation",
            "region": "East Africa",
            "country": "Kenya",
            "website": "https://waterforward.org",
            "foundedYear": 2009,
            "sdgs": ["SDG 6: Clean Water", 3],
            "verificationType": "audited",
            "scores": {
                "reportingQuality": 81,
                "reach": 77,
                "socialRoi": 90,
                "outcomeEffectiveness": 68,
                "transparencyGovernance": 85
            },
            "beneficiariesReached": "120,000",
            "programs": [
                {"name": "Borehole drilling", "beneficiaries": 80000, "status": "active", "startDate": "2015-03-01"}
            ],
            "metrics": [
                {"name": "Wells built", "value": 412, "unit": "wells"}
            ]
        }"#;
        let p = preview(raw, LIMIT).unwrap();
        assert!(p.warnings.is_empty(), "unexpected warnings: {:?}", p.warnings);
        assert_eq!(p.organization.sdg_goals, vec![3, 6]);
        assert_eq!(p.organization.verification_type, "audited");
        assert_eq!(p.organization.beneficiaries_reached, 120_000);
        assert_eq!(p.organization.impact_score, 80);
        assert_eq!(p.impact_grade, "A");
        assert_eq!(p.programs.len(), 1);
        assert_eq!(
            p.programs[0].start_date,
            NaiveDate::from_ymd_opt(2015, 3, 1)
        );
        assert_eq!(p.metrics[0].value, 412.0);
    }

    #[test]
    fn soft_problems_become_warnings() {
        let raw = r#"{
            "name": "Messy Org",
            "sector": "Education",
            "region": "South Asia",
            "website": "messy.org",
            "foundedYear": 1492,
            "sdgs": [4, 42, "none"],
            "verificationType": "notarized",
            "reach": 140,
            "impactScore": 99,
            "programs": [{"budget": 10}, "oops", {"name": "Reading Camps", "status": "paused"}],
            "metrics": {"name": "not a list"}
        }"#;
        let p = preview(raw, LIMIT).unwrap();
        let joined = p.warnings.join("\n");

        assert_eq!(p.organization.website.as_deref(), Some("https://messy.org"));
        assert_eq!(p.organization.founded_year, None);
        assert_eq!(p.organization.sdg_goals, vec![4]);
        assert_eq!(p.organization.verification_type, "self-reported");
        assert_eq!(p.organization.reach, 100);
        assert_eq!(p.programs.len(), 1);
        assert_eq!(p.programs[0].status, "active");
        assert!(p.metrics.is_empty());

        for expected in [
            "assumed https",
            "not a plausible year",
            "Dropped SDG entry 42",
            "Dropped SDG entry \"none\"",
            "Unknown verification type",
            "clamped to 100",
            "replaced by the computed Impact IQ",
            "programs[0] has no name",
            "programs[1] is a string",
            "status \"paused\" is unknown",
            "metrics should be an array",
        ] {
            assert!(joined.contains(expected), "missing warning {expected:?} in:\n{joined}");
        }
    }

    #[test]
    fn wrapper_and_array_inputs_are_unwrapped() {
        let wrapped = r#"{"organization": {"name": "Inner", "sector": "Health", "region": "Global"},
                          "programs": [{"name": "Clinics"}]}"#;
        let p = preview(wrapped, LIMIT).unwrap();
        assert_eq!(p.organization.name, "Inner");
        assert_eq!(p.programs[0].name, "Clinics");

        let list = r#"[{"name": "First", "sector": "Health", "region": "Global"}, {"name": "Second"}]"#;
        let p = preview(list, LIMIT).unwrap();
        assert_eq!(p.organization.name, "First");
        assert!(p.warnings[0].contains("2 records"));
    }

    #[test]
    fn truncated_html_paste_still_previews() {
        let raw = "<html><pre>{&quot;name&quot;: &quot;Half Sent&quot;, &quot;sector&quot;: &quot;Energy&quot;, &quot;region&quot;: &quot;Global&quot;, &quot;sdgs&quot;: [7, 13";
        let p = preview(raw, LIMIT).unwrap();
        assert_eq!(p.organization.name, "Half Sent");
        assert_eq!(p.organization.sdg_goals, vec![7, 13]);
        assert!(p.warnings.iter().any(|w| w.contains("truncated")));
    }

    #[test]
    fn child_rows_get_the_same_checks_as_the_api() {
        let raw = r#"{
            "name": "Budget Trouble",
            "programs": [
                {"name": "Backwards", "budget": -500, "beneficiaries": -3,
                 "startDate": "2020-05-01", "endDate": "2019-01-01"}
            ],
            "metrics": [
                {"name": "Broken", "value": "NaN"},
                {"name": "Reach", "value": 12, "target": "inf"}
            ]
        }"#;
        let p = preview(raw, LIMIT).unwrap();
        let joined = p.warnings.join("\n");

        let program = &p.programs[0];
        assert_eq!(program.budget, None);
        assert_eq!(program.beneficiaries, 0);
        assert_eq!(program.start_date, NaiveDate::from_ymd_opt(2020, 5, 1));
        assert_eq!(program.end_date, None);

        assert_eq!(p.metrics.len(), 1);
        assert_eq!(p.metrics[0].name, "Reach");
        assert_eq!(p.metrics[0].target, None);

        for expected in [
            "budget cannot be negative",
            "beneficiaries cannot be negative",
            "endDate is before startDate",
            "'NaN' is not a finite number",
            "metrics[0] has no numeric value",
        ] {
            assert!(joined.contains(expected), "missing warning {expected:?} in:\n{joined}");
        }
    }

    #[test]
    fn oversized_text_is_fitted_to_its_column() {
        let long_name = "N".repeat(300);
        let long_site = format!("https://{}.org", "w".repeat(600));
        let raw = serde_json::json!({
            "name": long_name,
            "region": "R".repeat(200),
            "website": long_site,
        })
        .to_string();
        let p = preview(&raw, LIMIT).unwrap();

        assert_eq!(p.organization.name.chars().count(), validation::MAX_NAME_CHARS);
        assert_eq!(p.organization.region.chars().count(), validation::MAX_LABEL_CHARS);
        assert_eq!(p.organization.website, None);
        assert!(p.warnings.iter().any(|w| w == "name is longer than 255 characters; truncated"));
        assert!(p.warnings.iter().any(|w| w.starts_with("website is longer than")));
    }

    #[tokio::test]
    async fn committed_rows_pass_api_validation() {
        let store = MemStorage::new();
        let raw = r#"{"name": "Checked Co", "sector": "Health", "region": "Global",
                      "programs": [{"name": "Clinics", "budget": -1,
                                    "startDate": "2022-01-01", "endDate": "2021-01-01"}]}"#;
        let result = commit(&store, raw, LIMIT).await.unwrap();

        let stored = store.list_programs(result.organization.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].budget, None);
        assert_eq!(stored[0].end_date, None);
        assert!(result.warnings.len() >= 2);
    }

    #[tokio::test]
    async fn commit_creates_organization_children_and_activity() {
        let store = MemStorage::new();
        let raw = r#"{"name": "Commit Co", "sector": "Health", "region": "Global",
                      "programs": [{"name": "Clinics"}, {"name": "Vaccines"}],
                      "metrics": [{"name": "Visits", "value": 10}]}"#;
        let result = commit(&store, raw, LIMIT).await.unwrap();

        assert_eq!(result.programs.len(), 2);
        assert!(result.programs.iter().all(|p| p.organization_id == result.organization.id));
        assert_eq!(store.list_metrics(result.organization.id).await.unwrap().len(), 1);

        let activity = store.list_activity(10).await.unwrap();
        assert_eq!(activity[0].action, "organization.imported");
        assert_eq!(activity[0].organization_id, Some(result.organization.id));
        assert_eq!(activity[0].entity_id, Some(result.organization.id));
    }

    #[tokio::test]
    async fn commit_aborts_on_hard_errors() {
        let store = MemStorage::new();
        assert!(commit(&store, r#"{"sector": "Health"}"#, LIMIT).await.is_err());
        assert!(store
            .list_organizations(&Default::default())
            .await
            .unwrap()
            .is_empty());
    }
}
