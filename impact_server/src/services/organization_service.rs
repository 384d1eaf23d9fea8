//! Organization create/update/delete with Impact IQ recomputation.

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::events::activity::ActivityEvent;
use crate::models::kinds::VerificationType;
use crate::models::organization::{NewOrganization, Organization, OrganizationChanges};
use crate::services::scoring;
use crate::services::validation;
use crate::storage::Storage;

/// Fetch an organization or fail with 404.
pub async fn require_organization(storage: &dyn Storage, id: i64) -> AppResult<Organization> {
    storage
        .get_organization(id)
        .await?
        .ok_or_else(|| AppError::not_found("Organization", id))
}

fn validate_new(org: &mut NewOrganization) -> AppResult<()> {
    org.name = validation::non_empty("name", &org.name)?;
    org.sector = validation::non_empty("sector", &org.sector)?;
    org.region = validation::non_empty("region", &org.region)?;
    validation::max_chars("name", &org.name, validation::MAX_NAME_CHARS)?;
    validation::max_chars("sector", &org.sector, validation::MAX_LABEL_CHARS)?;
    validation::max_chars("region", &org.region, validation::MAX_LABEL_CHARS)?;
    validation::max_chars_opt("country", org.country.as_deref(), validation::MAX_LABEL_CHARS)?;
    validation::max_chars_opt("logoUrl", org.logo_url.as_deref(), validation::MAX_URL_CHARS)?;
    if let Some(site) = &org.website {
        let site = validation::website(site)?;
        validation::max_chars("website", &site, validation::MAX_URL_CHARS)?;
        org.website = Some(site);
    }
    if let Some(year) = org.founded_year {
        validation::founded_year(year)?;
    }
    org.sdg_goals = validation::sdg_goals(&org.sdg_goals)?;
    org.verification_type = org
        .verification_type
        .parse::<VerificationType>()?
        .as_str()
        .to_string();

    let scores = org.sub_scores();
    validation::sub_score("reportingQuality", scores.reporting_quality)?;
    validation::sub_score("reach", scores.reach)?;
    validation::sub_score("socialRoi", scores.social_roi)?;
    validation::sub_score("outcomeEffectiveness", scores.outcome_effectiveness)?;
    validation::sub_score("transparencyGovernance", scores.transparency_governance)?;
    validation::non_negative("beneficiariesReached", org.beneficiaries_reached)?;
    if let Some(budget) = org.annual_budget {
        validation::non_negative("annualBudget", budget)?;
    }
    Ok(())
}

fn validate_changes(changes: &mut OrganizationChanges) -> AppResult<()> {
    if let Some(name) = &changes.name {
        let name = validation::non_empty("name", name)?;
        validation::max_chars("name", &name, validation::MAX_NAME_CHARS)?;
        changes.name = Some(name);
    }
    if let Some(sector) = &changes.sector {
        let sector = validation::non_empty("sector", sector)?;
        validation::max_chars("sector", &sector, validation::MAX_LABEL_CHARS)?;
        changes.sector = Some(sector);
    }
    if let Some(region) = &changes.region {
        let region = validation::non_empty("region", region)?;
        validation::max_chars("region", &region, validation::MAX_LABEL_CHARS)?;
        changes.region = Some(region);
    }
    if let Some(Some(country)) = &changes.country {
        validation::max_chars("country", country, validation::MAX_LABEL_CHARS)?;
    }
    if let Some(Some(logo)) = &changes.logo_url {
        validation::max_chars("logoUrl", logo, validation::MAX_URL_CHARS)?;
    }
    if let Some(Some(site)) = &changes.website {
        let site = validation::website(site)?;
        validation::max_chars("website", &site, validation::MAX_URL_CHARS)?;
        changes.website = Some(Some(site));
    }
    if let Some(Some(year)) = changes.founded_year {
        validation::founded_year(year)?;
    }
    if let Some(goals) = &changes.sdg_goals {
        changes.sdg_goals = Some(validation::sdg_goals(goals)?);
    }
    if let Some(kind) = &changes.verification_type {
        changes.verification_type = Some(kind.parse::<VerificationType>()?.as_str().to_string());
    }
    for (field, value) in [
        ("reportingQuality", changes.reporting_quality),
        ("reach", changes.reach),
        ("socialRoi", changes.social_roi),
        ("outcomeEffectiveness", changes.outcome_effectiveness),
        ("transparencyGovernance", changes.transparency_governance),
    ] {
        if let Some(v) = value {
            validation::sub_score(field, v)?;
        }
    }
    if let Some(n) = changes.beneficiaries_reached {
        validation::non_negative("beneficiariesReached", n)?;
    }
    if let Some(Some(n)) = changes.annual_budget {
        validation::non_negative("annualBudget", n)?;
    }
    Ok(())
}

/// Validate a new organization and stamp its computed Impact IQ.
pub fn prepare_new(new_org: &mut NewOrganization) -> AppResult<()> {
    validate_new(new_org)?;
    new_org.impact_score = scoring::impact_iq(&new_org.sub_scores());
    Ok(())
}

/// Metric and log line for a stored organization. `source` labels the metric.
pub fn record_created(org: &Organization, source: &str) {
    crate::metrics::organization_created(source);
    tracing::info!(
        organization_id = org.id,
        impact_score = org.impact_score,
        source,
        "Organization created"
    );
}

/// Validate, score and store a new organization. `source` labels the metric.
pub async fn insert_organization(
    storage: &dyn Storage,
    mut new_org: NewOrganization,
    source: &str,
) -> AppResult<Organization> {
    prepare_new(&mut new_org)?;
    let org = storage.create_organization(new_org).await?;
    record_created(&org, source);
    Ok(org)
}

pub async fn create_organization(
    storage: &dyn Storage,
    new_org: NewOrganization,
) -> AppResult<Organization> {
    let org = insert_organization(storage, new_org, "api").await?;
    let event = ActivityEvent::OrganizationCreated {
        name: org.name.clone(),
        impact_score: org.impact_score,
    };
    storage
        .log_activity(event.into_log(Some(org.id), Some(org.id), None))
        .await?;
    Ok(org)
}

/// Apply a partial update; the score is recomputed whenever a sub-score moves.
pub async fn update_organization(
    storage: &dyn Storage,
    id: i64,
    mut changes: OrganizationChanges,
) -> AppResult<Organization> {
    let existing = require_organization(storage, id).await?;
    validate_changes(&mut changes)?;
    let fields: Vec<String> = changes
        .changed_fields()
        .into_iter()
        .map(str::to_string)
        .collect();

    if changes.touches_scores() {
        let mut merged = existing.sub_scores();
        merged.reporting_quality = changes.reporting_quality.unwrap_or(merged.reporting_quality);
        merged.reach = changes.reach.unwrap_or(merged.reach);
        merged.social_roi = changes.social_roi.unwrap_or(merged.social_roi);
        merged.outcome_effectiveness = changes
            .outcome_effectiveness
            .unwrap_or(merged.outcome_effectiveness);
        merged.transparency_governance = changes
            .transparency_governance
            .unwrap_or(merged.transparency_governance);

        let score = scoring::impact_iq(&merged);
        if score != existing.impact_score {
            changes.previous_score = Some(existing.impact_score);
            changes.impact_score = Some(score);
        }
    }
    changes.updated_at = Some(Utc::now());

    let updated = storage
        .update_organization(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Organization", id))?;

    if updated.impact_score != existing.impact_score {
        tracing::info!(
            organization_id = id,
            previous = existing.impact_score,
            current = updated.impact_score,
            "Impact IQ recomputed"
        );
    }

    let event = ActivityEvent::OrganizationUpdated {
        fields,
        previous_score: updated.previous_score,
        impact_score: updated.impact_score,
    };
    storage
        .log_activity(event.into_log(Some(id), Some(id), None))
        .await?;
    Ok(updated)
}

pub async fn delete_organization(storage: &dyn Storage, id: i64) -> AppResult<()> {
    let existing = require_organization(storage, id).await?;
    if !storage.delete_organization(id).await? {
        return Err(AppError::not_found("Organization", id));
    }
    crate::metrics::organization_deleted();
    tracing::info!(organization_id = id, "Organization deleted");

    let event = ActivityEvent::OrganizationDeleted {
        name: existing.name,
    };
    storage
        .log_activity(event.into_log(Some(id), Some(id), None))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    fn new_org(name: &str, score: i32) -> NewOrganization {
        NewOrganization {
            name: name.to_string(),
            description: String::new(),
            mission: String::new(),
            sector: "Education".to_string(),
            region: "Global".to_string(),
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
            impact_score: 0,
            beneficiaries_reached: 0,
            annual_budget: None,
            featured: false,
            success_story: None,
        }
    }

    #[tokio::test]
    async fn create_computes_score_and_ignores_client_value() {
        let store = MemStorage::new();
        let mut org = new_org("Readers", 70);
        org.impact_score = 99;
        org.verification_type = "Self_Reported".to_string();

        let created = create_organization(&store, org).await.unwrap();
        assert_eq!(created.impact_score, 70);
        assert_eq!(created.verification_type, "self-reported");

        let activity = store.list_activity(5).await.unwrap();
        assert_eq!(activity[0].action, "organization.created");
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let store = MemStorage::new();

        let mut org = new_org("Bad site", 50);
        org.website = Some("example.org".into());
        assert!(matches!(
            create_organization(&store, org).await,
            Err(AppError::BadRequest(_))
        ));

        let mut org = new_org("Bad score", 50);
        org.reach = 101;
        assert!(create_organization(&store, org).await.is_err());

        let mut org = new_org("Bad sector", 50);
        org.sector = "  ".into();
        assert!(create_organization(&store, org).await.is_err());

        let mut org = new_org("Bad kind", 50);
        org.verification_type = "notarized".into();
        assert!(create_organization(&store, org).await.is_err());
    }

    #[tokio::test]
    async fn updating_a_sub_score_tracks_the_previous_score() {
        let store = MemStorage::new();
        let created = create_organization(&store, new_org("Movers", 60)).await.unwrap();

        let changes = OrganizationChanges {
            social_roi: Some(100),
            ..Default::default()
        };
        let updated = update_organization(&store, created.id, changes).await.unwrap();
        assert_eq!(updated.social_roi, 100);
        assert_eq!(updated.impact_score, 70);
        assert_eq!(updated.previous_score, Some(60));
        assert_eq!(updated.score_delta(), Some(10));

        let log = &store.list_activity(1).await.unwrap()[0];
        assert_eq!(log.action, "organization.updated");
        assert_eq!(log.details.as_ref().unwrap()["fields"][0], "socialRoi");
    }

    #[tokio::test]
    async fn non_score_updates_leave_the_score_alone() {
        let store = MemStorage::new();
        let created = create_organization(&store, new_org("Steady", 60)).await.unwrap();

        let changes = OrganizationChanges {
            mission: Some("Keep going".into()),
            ..Default::default()
        };
        let updated = update_organization(&store, created.id, changes).await.unwrap();
        assert_eq!(updated.mission, "Keep going");
        assert_eq!(updated.previous_score, None);
        assert_eq!(updated.impact_score, 60);
    }

    #[tokio::test]
    async fn values_wider_than_their_columns_are_rejected() {
        let store = MemStorage::new();
        let err = create_organization(&store, new_org(&"x".repeat(256), 50))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "name cannot be longer than 255 characters");

        let created = create_organization(&store, new_org("Short", 50)).await.unwrap();
        let changes = OrganizationChanges {
            region: Some("r".repeat(129)),
            ..Default::default()
        };
        assert!(matches!(
            update_organization(&store, created.id, changes).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn nullable_columns_can_be_cleared() {
        let store = MemStorage::new();
        let mut org = new_org("Clearable", 50);
        org.website = Some("https://clearable.org".into());
        org.annual_budget = Some(40_000);
        let created = create_organization(&store, org).await.unwrap();

        let changes = OrganizationChanges {
            website: Some(None),
            annual_budget: Some(None),
            ..Default::default()
        };
        let updated = update_organization(&store, created.id, changes).await.unwrap();
        assert_eq!(updated.website, None);
        assert_eq!(updated.annual_budget, None);
        assert_eq!(updated.impact_score, 50);
    }

    #[tokio::test]
    async fn missing_organizations_are_not_found() {
        let store = MemStorage::new();
        let err = update_organization(&store, 404, OrganizationChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(
            delete_organization(&store, 404).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_logs_and_removes() {
        let store = MemStorage::new();
        let created = create_organization(&store, new_org("Gone Soon", 40)).await.unwrap();
        delete_organization(&store, created.id).await.unwrap();

        assert!(store.get_organization(created.id).await.unwrap().is_none());
        let log = &store.list_activity(1).await.unwrap()[0];
        assert_eq!(log.action, "organization.deleted");
    }
}
