//! Read models derived from organizations: leaderboard, trending, featured,
//! success stories, solution finder and platform statistics.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::kinds::VerificationType;
use crate::models::organization::{facet_key, Organization, OrganizationFilter};
use crate::models::statistic::Statistic;
use crate::services::scoring::{self, SubScores};

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
pub const DEFAULT_TRENDING_LIMIT: usize = 5;
pub const DEFAULT_SOLUTIONS_LIMIT: usize = 20;

/// Compact organization card used by every listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: i64,
    pub name: String,
    pub sector: String,
    pub region: String,
    pub country: Option<String>,
    pub logo_url: Option<String>,
    pub verification_type: String,
    pub impact_score: i32,
    pub impact_grade: &'static str,
    pub beneficiaries_reached: i64,
    pub sdg_goals: Vec<i32>,
}

impl From<&Organization> for OrganizationSummary {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            name: org.name.clone(),
            sector: org.sector.clone(),
            region: org.region.clone(),
            country: org.country.clone(),
            logo_url: org.logo_url.clone(),
            verification_type: org.verification_type.clone(),
            impact_score: org.impact_score,
            impact_grade: scoring::grade(org.impact_score),
            beneficiaries_reached: org.beneficiaries_reached,
            sdg_goals: org.sdg_goals.clone(),
        }
    }
}

// ── Leaderboard ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub sector: Option<String>,
    pub region: Option<String>,
    pub verification: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub organization: OrganizationSummary,
    pub scores: SubScores,
}

/// Highest score first, then name; ties share a rank (1, 2, 2, 4).
pub fn leaderboard(orgs: &[Organization], query: &LeaderboardQuery) -> Vec<LeaderboardEntry> {
    let filter = OrganizationFilter {
        sector: query.sector.clone(),
        region: query.region.clone(),
        verification: query.verification.clone(),
        q: None,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT);

    let mut ranked: Vec<&Organization> = orgs.iter().filter(|o| filter.matches(o)).collect();
    ranked.sort_by(|a, b| {
        b.impact_score
            .cmp(&a.impact_score)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let mut entries = Vec::with_capacity(ranked.len().min(limit));
    let mut rank = 0;
    let mut last_score = None;
    for (idx, org) in ranked.into_iter().enumerate().take(limit) {
        if last_score != Some(org.impact_score) {
            rank = idx + 1;
            last_score = Some(org.impact_score);
        }
        entries.push(LeaderboardEntry {
            rank,
            organization: org.into(),
            scores: org.sub_scores(),
        });
    }
    entries
}

// ── Trending ──

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    #[serde(flatten)]
    pub organization: OrganizationSummary,
    pub previous_score: i32,
    pub change: i32,
}

/// Organizations whose score rose at the last recomputation, biggest gain first.
pub fn trending(orgs: &[Organization], limit: usize) -> Vec<TrendingEntry> {
    let mut rising: Vec<(&Organization, i32, i32)> = orgs
        .iter()
        .filter_map(|o| {
            let prev = o.previous_score?;
            let change = o.impact_score - prev;
            (change > 0).then_some((o, prev, change))
        })
        .collect();
    rising.sort_by_key(|(o, _, change)| (Reverse(*change), Reverse(o.impact_score), o.id));

    rising
        .into_iter()
        .take(limit)
        .map(|(o, previous_score, change)| TrendingEntry {
            organization: o.into(),
            previous_score,
            change,
        })
        .collect()
}

// ── Featured / success stories ──

fn by_score_desc(orgs: &mut [Organization]) {
    orgs.sort_by_key(|o| (Reverse(o.impact_score), o.id));
}

/// Flagged organizations by score; the overall top scorers when none are flagged.
pub fn featured(orgs: &[Organization], limit: usize) -> Vec<Organization> {
    let mut picked: Vec<Organization> = orgs.iter().filter(|o| o.featured).cloned().collect();
    if picked.is_empty() {
        picked = orgs.to_vec();
    }
    by_score_desc(&mut picked);
    picked.truncate(limit);
    picked
}

pub fn success_stories(orgs: &[Organization]) -> Vec<Organization> {
    let mut stories: Vec<Organization> = orgs
        .iter()
        .filter(|o| o.success_story.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .cloned()
        .collect();
    by_score_desc(&mut stories);
    stories
}

// ── Solution finder ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionsQuery {
    pub q: Option<String>,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub sdg: Option<i32>,
    pub verification: Option<String>,
    pub min_score: Option<i32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionMatch {
    #[serde(flatten)]
    pub organization: OrganizationSummary,
    pub mission: String,
    pub description: String,
    pub relevance: u32,
    pub matched_terms: Vec<String>,
}

const NAME_WEIGHT: u32 = 3;
const SECTOR_WEIGHT: u32 = 2;
const MISSION_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

/// Lowercased alphanumeric tokens of at least two characters, deduplicated.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn relevance(org: &Organization, tokens: &[String]) -> (u32, Vec<String>) {
    let name = org.name.to_lowercase();
    let sector = org.sector.to_lowercase();
    let mission = org.mission.to_lowercase();
    let description = org.description.to_lowercase();

    let mut score = 0;
    let mut matched = Vec::new();
    for token in tokens {
        let mut hit = 0;
        if name.contains(token.as_str()) {
            hit += NAME_WEIGHT;
        }
        if sector.contains(token.as_str()) {
            hit += SECTOR_WEIGHT;
        }
        if mission.contains(token.as_str()) {
            hit += MISSION_WEIGHT;
        }
        if description.contains(token.as_str()) {
            hit += DESCRIPTION_WEIGHT;
        }
        if hit > 0 {
            matched.push(token.clone());
            score += hit;
        }
    }
    (score, matched)
}

pub fn solutions(orgs: &[Organization], query: &SolutionsQuery) -> Vec<SolutionMatch> {
    let filter = OrganizationFilter {
        sector: query.sector.clone(),
        region: query.region.clone(),
        verification: query.verification.clone(),
        q: None,
    };
    let tokens = tokenize(query.q.as_deref().unwrap_or_default());
    let min_score = query.min_score.unwrap_or(0);

    let mut matches: Vec<(SolutionMatch, i64)> = orgs
        .iter()
        .filter(|o| filter.matches(o))
        .filter(|o| o.impact_score >= min_score)
        .filter(|o| query.sdg.is_none_or(|goal| o.sdg_goals.contains(&goal)))
        .filter_map(|o| {
            let (relevance, matched_terms) = relevance(o, &tokens);
            if !tokens.is_empty() && relevance == 0 {
                return None;
            }
            Some((
                SolutionMatch {
                    organization: o.into(),
                    mission: o.mission.clone(),
                    description: o.description.clone(),
                    relevance,
                    matched_terms,
                },
                o.id,
            ))
        })
        .collect();

    matches.sort_by_key(|(m, id)| {
        (
            Reverse(m.relevance),
            Reverse(m.organization.impact_score),
            *id,
        )
    });
    matches
        .into_iter()
        .take(query.limit.unwrap_or(DEFAULT_SOLUTIONS_LIMIT))
        .map(|(m, _)| m)
        .collect()
}

// ── Platform statistics ──

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatistics {
    pub organizations: usize,
    pub programs: i64,
    pub total_beneficiaries: i64,
    pub average_impact_score: f64,
    pub independently_verified: usize,
    pub sectors: usize,
    pub regions: usize,
    pub highlights: Vec<Statistic>,
}

pub fn platform_statistics(
    orgs: &[Organization],
    programs: i64,
    highlights: Vec<Statistic>,
) -> PlatformStatistics {
    let average_impact_score = if orgs.is_empty() {
        0.0
    } else {
        let total: i64 = orgs.iter().map(|o| o.impact_score as i64).sum();
        (total as f64 / orgs.len() as f64 * 10.0).round() / 10.0
    };
    let independently_verified = orgs
        .iter()
        .filter(|o| {
            o.verification_type
                .parse::<VerificationType>()
                .is_ok_and(VerificationType::is_independent)
        })
        .count();
    let sectors: BTreeSet<String> = orgs.iter().map(|o| facet_key(&o.sector)).collect();
    let regions: BTreeSet<String> = orgs.iter().map(|o| facet_key(&o.region)).collect();

    PlatformStatistics {
        organizations: orgs.len(),
        programs,
        total_beneficiaries: orgs.iter().map(|o| o.beneficiaries_reached).sum(),
        average_impact_score,
        independently_verified,
        sectors: sectors.len(),
        regions: regions.len(),
        highlights,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn org(id: i64, name: &str, score: i32) -> Organization {
        Organization {
            id,
            name: name.to_string(),
            description: String::new(),
            mission: String::new(),
            sector: "Education".to_string(),
            region: "East Africa".to_string(),
            country: None,
            website: None,
            logo_url: None,
            founded_year: None,
            sdg_goals: vec![4],
            verification_type: "self-reported".to_string(),
            reporting_quality: score,
            reach: score,
            social_roi: score,
            outcome_effectiveness: score,
            transparency_governance: score,
            impact_score: score,
            previous_score: None,
            beneficiaries_reached: 1_000,
            annual_budget: None,
            featured: false,
            success_story: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn leaderboard_uses_competition_ranking() {
        let orgs = vec![
            org(1, "Bravo", 80),
            org(2, "Alpha", 80),
            org(3, "Charlie", 91),
            org(4, "Delta", 70),
        ];
        let board = leaderboard(&orgs, &LeaderboardQuery::default());
        let ranks: Vec<(usize, &str)> = board
            .iter()
            .map(|e| (e.rank, e.organization.name.as_str()))
            .collect();
        assert_eq!(
            ranks,
            vec![(1, "Charlie"), (2, "Alpha"), (2, "Bravo"), (4, "Delta")]
        );
        assert_eq!(board[0].organization.impact_grade, "A+");
    }

    #[test]
    fn leaderboard_filters_case_insensitively_and_caps_limit() {
        let mut orgs: Vec<Organization> = (1..=150).map(|i| org(i, &format!("Org {i}"), 50)).collect();
        orgs[0].sector = "Health".to_string();

        let health = leaderboard(
            &orgs,
            &LeaderboardQuery {
                sector: Some("HEALTH".into()),
                ..Default::default()
            },
        );
        assert_eq!(health.len(), 1);

        let capped = leaderboard(
            &orgs,
            &LeaderboardQuery {
                limit: Some(1_000),
                ..Default::default()
            },
        );
        assert_eq!(capped.len(), MAX_LEADERBOARD_LIMIT);
    }

    #[test]
    fn verification_filter_accepts_loose_spelling() {
        let mut orgs = vec![org(1, "A", 60), org(2, "B", 70)];
        orgs[1].verification_type = "self-reported".into();
        orgs[0].verification_type = "audited".into();
        let board = leaderboard(
            &orgs,
            &LeaderboardQuery {
                verification: Some("self_reported".into()),
                ..Default::default()
            },
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].organization.id, 2);
    }

    #[test]
    fn trending_keeps_only_rising_scores() {
        let mut a = org(1, "A", 80);
        a.previous_score = Some(70);
        let mut b = org(2, "B", 60);
        b.previous_score = Some(65);
        let mut c = org(3, "C", 90);
        c.previous_score = Some(88);
        let d = org(4, "D", 99);

        let rising = trending(&[a, b, c, d], 10);
        let ids: Vec<i64> = rising.iter().map(|t| t.organization.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(rising[0].change, 10);
        assert_eq!(rising[0].previous_score, 70);
    }

    #[test]
    fn featured_falls_back_to_top_scores() {
        let orgs = vec![org(1, "A", 50), org(2, "B", 90), org(3, "C", 70)];
        let ids: Vec<i64> = featured(&orgs, 2).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let mut flagged = orgs.clone();
        flagged[0].featured = true;
        let ids: Vec<i64> = featured(&flagged, 2).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn success_stories_skip_blank_text() {
        let mut a = org(1, "A", 50);
        a.success_story = Some("Built 40 schools".into());
        let mut b = org(2, "B", 90);
        b.success_story = Some("   ".into());
        let stories = success_stories(&[a, b]);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, 1);
    }

    #[test]
    fn tokenize_drops_short_and_duplicate_tokens() {
        assert_eq!(
            tokenize("Clean water, a WATER pump!"),
            vec!["clean", "water", "pump"]
        );
    }

    #[test]
    fn solutions_rank_by_relevance_then_score() {
        let mut water = org(1, "Clean Water Trust", 60);
        water.sector = "Water & Sanitation".into();
        let mut school = org(2, "Bright Schools", 95);
        school.description = "Provides clean water at schools".into();
        let unrelated = org(3, "Forest Friends", 99);

        let results = solutions(
            &[water, school, unrelated],
            &SolutionsQuery {
                q: Some("water".into()),
                ..Default::default()
            },
        );
        let ids: Vec<i64> = results.iter().map(|m| m.organization.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(results[0].relevance, NAME_WEIGHT + SECTOR_WEIGHT);
        assert_eq!(results[0].matched_terms, vec!["water"]);
    }

    #[test]
    fn solutions_without_query_filter_by_sdg_and_score() {
        let mut a = org(1, "A", 40);
        a.sdg_goals = vec![6];
        let mut b = org(2, "B", 80);
        b.sdg_goals = vec![6, 3];
        let c = org(3, "C", 90);

        let results = solutions(
            &[a, b, c],
            &SolutionsQuery {
                sdg: Some(6),
                min_score: Some(50),
                ..Default::default()
            },
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].organization.id, 2);
        assert_eq!(results[0].relevance, 0);
    }

    #[test]
    fn statistics_over_empty_and_populated_sets() {
        let empty = platform_statistics(&[], 0, Vec::new());
        assert_eq!(empty.average_impact_score, 0.0);
        assert_eq!(empty.organizations, 0);

        let mut a = org(1, "A", 70);
        a.verification_type = "audited".into();
        let mut b = org(2, "B", 75);
        b.region = "South Asia".into();
        let c = org(3, "C", 76);
        let stats = platform_statistics(&[a, b, c], 7, Vec::new());
        assert_eq!(stats.organizations, 3);
        assert_eq!(stats.programs, 7);
        assert_eq!(stats.total_beneficiaries, 3_000);
        assert_eq!(stats.average_impact_score, 73.7);
        assert_eq!(stats.independently_verified, 1);
        assert_eq!(stats.sectors, 1);
        assert_eq!(stats.regions, 2);
    }
}
