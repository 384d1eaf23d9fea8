//! Platform HTTP routes — public read models, dashboard CRUD, admin import.

pub mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ImpactConfig;
use crate::dashboard::kpi::{self, AdminSummary};
use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityLog;
use crate::models::invitation::Invitation;
use crate::models::metric::{Metric, NewMetric};
use crate::models::notification::Notification;
use crate::models::organization::{NewOrganization, Organization, OrganizationChanges, OrganizationFilter};
use crate::models::partner::{NewTargetPartner, TargetPartner};
use crate::models::program::{NewProgram, Program};
use crate::models::report::{NewReport, Report};
use crate::models::user::{NewUser, User};
use crate::models::verification::VerificationRequest;
use crate::models::workflow::{NewWorkflow, Workflow};
use crate::services::import_service::{self, ImportPreview, ImportResult};
use crate::services::ranking::{
    LeaderboardEntry, LeaderboardQuery, PlatformStatistics, SolutionMatch, SolutionsQuery,
    TrendingEntry, DEFAULT_TRENDING_LIMIT, MAX_LEADERBOARD_LIMIT,
};
use crate::services::{
    invitation_service, organization_service, portfolio_service, user_service,
    verification_service,
};
use crate::storage::Storage;

use api::{
    AcceptInvitationRequest, CreateInvitationRequest, CreateVerificationRequest, HealthResponse,
    JsonBody, LimitQuery, OrganizationDetail, ResolveVerificationRequest, DEFAULT_ACTIVITY_LIMIT,
    MAX_ACTIVITY_LIMIT,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Transport ceiling above the import limit, so oversized imports still reach
/// the import service and fail with its own message.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: ImpactConfig,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return base.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => base.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "Invalid IMPACT_CORS_ORIGIN, allowing any origin");
            base.allow_origin(Any)
        }
    }
}

/// Build the platform's Axum router.
pub fn api_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_import_bytes
        .saturating_add(BODY_LIMIT_HEADROOM);
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/health", get(health))
        // Public read models
        .route("/api/statistics", get(statistics))
        .route("/api/trending", get(trending))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/solutions", get(solutions))
        // Organizations
        .route(
            "/api/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/api/organizations/featured", get(featured_organizations))
        .route("/api/organizations/success-stories", get(success_stories))
        .route(
            "/api/organizations/{id}",
            get(get_organization)
                .patch(update_organization)
                .delete(delete_organization),
        )
        .route(
            "/api/organizations/{id}/programs",
            get(list_programs).post(create_program),
        )
        .route(
            "/api/organizations/{id}/reports",
            get(list_reports).post(create_report),
        )
        .route(
            "/api/organizations/{id}/metrics",
            get(list_metrics).post(create_metric),
        )
        .route(
            "/api/organizations/{id}/partners",
            get(list_partners).post(create_partner),
        )
        .route(
            "/api/organizations/{id}/workflows",
            get(list_workflows).post(create_workflow),
        )
        .route(
            "/api/organizations/{id}/verification-requests",
            get(list_verification_requests).post(request_verification),
        )
        .route(
            "/api/verification-requests/{id}/resolve",
            post(resolve_verification),
        )
        // Users, notifications, invitations
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .route(
            "/api/invitations",
            get(list_invitations).post(create_invitation),
        )
        .route("/api/invitations/{token}/accept", post(accept_invitation))
        // Admin
        .route("/api/activity", get(list_activity))
        .route("/api/admin/summary", get(admin_summary))
        .route("/api/admin/import/preview", post(preview_import))
        .route("/api/admin/import", post(commit_import))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health / public read models ──

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        storage: state.storage.backend().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn statistics(State(state): State<AppState>) -> AppResult<Json<PlatformStatistics>> {
    Ok(Json(state.storage.platform_statistics().await?))
}

async fn trending(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<TrendingEntry>>> {
    let limit = query.resolve(DEFAULT_TRENDING_LIMIT, MAX_LEADERBOARD_LIMIT);
    Ok(Json(state.storage.trending(limit).await?))
}

async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.storage.leaderboard(&query).await?))
}

async fn solutions(
    State(state): State<AppState>,
    Query(query): Query<SolutionsQuery>,
) -> AppResult<Json<Vec<SolutionMatch>>> {
    Ok(Json(state.storage.solutions(&query).await?))
}

// ── Organizations ──

async fn list_organizations(
    State(state): State<AppState>,
    Query(filter): Query<OrganizationFilter>,
) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(state.storage.list_organizations(&filter).await?))
}

async fn create_organization(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewOrganization>,
) -> AppResult<(StatusCode, Json<OrganizationDetail>)> {
    let org = organization_service::create_organization(state.storage.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(org.into())))
}

async fn featured_organizations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Organization>>> {
    let limit = state.config.featured_limit;
    Ok(Json(state.storage.featured_organizations(limit).await?))
}

async fn success_stories(State(state): State<AppState>) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(state.storage.success_stories().await?))
}

async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrganizationDetail>> {
    let org = organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(org.into()))
}

async fn update_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<OrganizationChanges>,
) -> AppResult<Json<OrganizationDetail>> {
    let org = organization_service::update_organization(state.storage.as_ref(), id, changes).await?;
    Ok(Json(org.into()))
}

async fn delete_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    organization_service::delete_organization(state.storage.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Organization records ──

async fn list_programs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Program>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_programs(id).await?))
}

async fn create_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<NewProgram>,
) -> AppResult<(StatusCode, Json<Program>)> {
    let program = portfolio_service::create_program(state.storage.as_ref(), id, body).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

async fn list_reports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Report>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_reports(id).await?))
}

async fn create_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<NewReport>,
) -> AppResult<(StatusCode, Json<Report>)> {
    let report = portfolio_service::create_report(state.storage.as_ref(), id, body).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn list_metrics(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Metric>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_metrics(id).await?))
}

async fn create_metric(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<NewMetric>,
) -> AppResult<(StatusCode, Json<Metric>)> {
    let metric = portfolio_service::create_metric(state.storage.as_ref(), id, body).await?;
    Ok((StatusCode::CREATED, Json(metric)))
}

async fn list_partners(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<TargetPartner>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_partners(id).await?))
}

async fn create_partner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<NewTargetPartner>,
) -> AppResult<(StatusCode, Json<TargetPartner>)> {
    let partner = portfolio_service::create_partner(state.storage.as_ref(), id, body).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

async fn list_workflows(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Workflow>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_workflows(id).await?))
}

async fn create_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<NewWorkflow>,
) -> AppResult<(StatusCode, Json<Workflow>)> {
    let workflow = portfolio_service::create_workflow(state.storage.as_ref(), id, body).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

// ── Verification ──

async fn list_verification_requests(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<VerificationRequest>>> {
    organization_service::require_organization(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_verification_requests(id).await?))
}

async fn request_verification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<CreateVerificationRequest>,
) -> AppResult<(StatusCode, Json<VerificationRequest>)> {
    let request = verification_service::request_verification(
        state.storage.as_ref(),
        id,
        &body.requested_type,
        body.notes,
        body.requested_by,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn resolve_verification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<ResolveVerificationRequest>,
) -> AppResult<Json<VerificationRequest>> {
    let request = verification_service::resolve_verification(
        state.storage.as_ref(),
        id,
        &body.status,
        body.reviewer_id,
        body.notes,
    )
    .await?;
    Ok(Json(request))
}

// ── Users / notifications / invitations ──

async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = user_service::create_user(state.storage.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    Ok(Json(user_service::require_user(state.storage.as_ref(), id).await?))
}

async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Notification>>> {
    user_service::require_user(state.storage.as_ref(), id).await?;
    Ok(Json(state.storage.list_notifications(id).await?))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.storage.mark_notification_read(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Notification", id))
    }
}

async fn list_invitations(State(state): State<AppState>) -> AppResult<Json<Vec<Invitation>>> {
    Ok(Json(state.storage.list_invitations().await?))
}

async fn create_invitation(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateInvitationRequest>,
) -> AppResult<(StatusCode, Json<Invitation>)> {
    let invitation = invitation_service::create_invitation(
        state.storage.as_ref(),
        &body.email,
        &body.role,
        body.organization_id,
        body.invited_by,
        state.config.invitation_ttl_days,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(body): JsonBody<AcceptInvitationRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = invitation_service::accept_invitation(
        state.storage.as_ref(),
        &token,
        &body.username,
        body.full_name,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// ── Admin ──

async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let limit = query.resolve(DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT);
    Ok(Json(state.storage.list_activity(limit).await?))
}

async fn admin_summary(State(state): State<AppState>) -> AppResult<Json<AdminSummary>> {
    Ok(Json(kpi::admin_summary(state.storage.as_ref()).await?))
}

async fn preview_import(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<ImportPreview>> {
    let preview = import_service::preview(&body, state.config.max_import_bytes)?;
    Ok(Json(preview))
}

async fn commit_import(
    State(state): State<AppState>,
    body: String,
) -> AppResult<(StatusCode, Json<ImportResult>)> {
    let result =
        import_service::commit(state.storage.as_ref(), &body, state.config.max_import_bytes)
            .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        app_with(ImpactConfig::default()).await
    }

    async fn app_with(config: ImpactConfig) -> Router {
        let store = crate::seeder::seeded_store().await;
        api_router(AppState {
            storage: Arc::new(store),
            config,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None).await
    }

    async fn post_text(app: &Router, uri: &str, text: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "text/plain")
            .body(Body::from(text.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_the_backend() {
        let app = app().await;
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn public_read_models() {
        let app = app().await;

        let (status, stats) = get_json(&app, "/api/statistics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["organizations"], 8);
        assert!(stats["highlights"].as_array().unwrap().len() >= 4);

        let (_, board) = get_json(&app, "/api/leaderboard?limit=3").await;
        let board = board.as_array().unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[0]["name"], "HealthBridge Clinics");

        let (_, filtered) = get_json(&app, "/api/leaderboard?sector=EDUCATION").await;
        assert_eq!(filtered.as_array().unwrap().len(), 2);

        let (_, trending) = get_json(&app, "/api/trending").await;
        assert!(trending
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["change"].as_i64().unwrap() > 0));

        let (_, featured) = get_json(&app, "/api/organizations/featured").await;
        assert_eq!(featured.as_array().unwrap().len(), 3);

        let (_, found) = get_json(&app, "/api/solutions?q=water").await;
        assert_eq!(found[0]["name"], "Water Forward");
        assert!(found[0]["relevance"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn organization_crud() {
        let app = app().await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/organizations",
            Some(json!({
                "name": "River Clean",
                "sector": "Environment",
                "region": "Europe",
                "reportingQuality": 80,
                "reach": 80,
                "socialRoi": 80,
                "outcomeEffectiveness": 80,
                "transparencyGovernance": 80,
                "impactScore": 12
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["impactScore"], 80);
        assert_eq!(created["impactGrade"], "A");
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/api/organizations/{id}"),
            Some(json!({"reach": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["impactScore"], 84);
        assert_eq!(updated["previousScore"], 80);
        assert_eq!(updated["scoreChange"], 4);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/organizations/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = get_json(&app, &format!("/api/organizations/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn invalid_organization_is_a_bad_request() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/organizations",
            Some(json!({"name": "No Region", "sector": "Health", "region": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "region is required");
    }

    #[tokio::test]
    async fn organization_listing_filters() {
        let app = app().await;
        let (_, all) = get_json(&app, "/api/organizations").await;
        assert_eq!(all.as_array().unwrap().len(), 8);

        let (_, audited) = get_json(&app, "/api/organizations?verification=audited").await;
        assert_eq!(audited.as_array().unwrap().len(), 2);

        let (_, search) = get_json(&app, "/api/organizations?q=reef").await;
        assert_eq!(search[0]["name"], "Ocean Guardians");

        let (status, _) = get_json(&app, "/api/organizations/999/programs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn nested_records_are_created_under_the_organization() {
        let app = app().await;
        let (status, program) = send(
            &app,
            Method::POST,
            "/api/organizations/1/programs",
            Some(json!({"name": "Rain harvesting", "beneficiaries": 3000})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(program["organizationId"], 1);

        let (_, programs) = get_json(&app, "/api/organizations/1/programs").await;
        assert_eq!(programs.as_array().unwrap().len(), 3);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/organizations/1/workflows",
            Some(json!({"name": "Audit prep", "steps": "collect"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verification_flow() {
        let app = app().await;
        let (status, request) = send(
            &app,
            Method::POST,
            "/api/organizations/4/verification-requests",
            Some(json!({"requestedType": "verified"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request["status"], "pending");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/organizations/4/verification-requests",
            Some(json!({"requestedType": "audited"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let id = request["id"].as_i64().unwrap();
        let (status, resolved) = send(
            &app,
            Method::POST,
            &format!("/api/verification-requests/{id}/resolve"),
            Some(json!({"status": "approved", "reviewerId": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["status"], "approved");

        let (_, org) = get_json(&app, "/api/organizations/4").await;
        assert_eq!(org["verificationType"], "verified");
    }

    #[tokio::test]
    async fn users_invitations_and_notifications() {
        let app = app().await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({"username": "Admin", "email": "someone@example.org"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, invitation) = send(
            &app,
            Method::POST,
            "/api/invitations",
            Some(json!({"email": "new@example.org", "role": "viewer", "organizationId": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = invitation["token"].as_str().unwrap().to_string();

        let accept = format!("/api/invitations/{token}/accept");
        let (status, user) = send(&app, Method::POST, &accept, Some(json!({"username": "newbie"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["organizationId"], 2);

        let (status, _) = send(&app, Method::POST, &accept, Some(json!({"username": "again"}))).await;
        assert_eq!(status, StatusCode::GONE);

        let user_id = user["id"].as_i64().unwrap();
        let (status, inbox) = get_json(&app, &format!("/api/users/{user_id}/notifications")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(inbox.as_array().unwrap().is_empty());

        let (status, _) = send(&app, Method::POST, "/api/notifications/999/read", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_import_and_summary() {
        let app = app().await;

        let (status, preview) = post_text(
            &app,
            "/api/admin/import/preview",
            r#"Exported: {"name": "Paste Co", "sdgs": [4, 99],}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["organization"]["sector"], "Uncategorized");
        assert!(!preview["warnings"].as_array().unwrap().is_empty());

        let (status, body) = post_text(&app, "/api/admin/import", r#"{"sector": "Health"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required field 'name'");

        let (status, imported) = post_text(
            &app,
            "/api/admin/import",
            r#"{"name": "Imported Org", "sector": "Health", "region": "Global",
                "programs": [{"name": "Clinics"}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(imported["programs"].as_array().unwrap().len(), 1);

        let (_, summary) = get_json(&app, "/api/admin/summary").await;
        assert_eq!(summary["organizations"], 9);
        assert_eq!(summary["verification"]["audited"], 2);

        let (_, activity) = get_json(&app, "/api/activity?limit=1").await;
        assert_eq!(activity[0]["action"], "organization.imported");
    }

    #[tokio::test]
    async fn oversized_import_is_a_json_bad_request() {
        let app = app_with(ImpactConfig {
            max_import_bytes: 64,
            ..ImpactConfig::default()
        })
        .await;
        let raw = format!(r#"{{"name": "Too Big", "description": "{}"}}"#, "d".repeat(180));

        let (status, body) = post_text(&app, "/api/admin/import", &raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("the limit is 64"));

        let (_, summary) = get_json(&app, "/api/admin/summary").await;
        assert_eq!(summary["organizations"], 8);
    }

    #[tokio::test]
    async fn malformed_json_bodies_get_a_message() {
        let app = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/organizations")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": "Half"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(!body["message"].as_str().unwrap().is_empty());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({"email": "no-username@example.org"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("username"));
    }

    #[tokio::test]
    async fn patch_null_clears_a_column() {
        let app = app().await;
        let (status, org) = send(
            &app,
            Method::PATCH,
            "/api/organizations/1",
            Some(json!({"website": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(org["website"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_reviewer_is_rejected_before_any_write() {
        let app = app().await;
        let (_, request) = send(
            &app,
            Method::POST,
            "/api/organizations/6/verification-requests",
            Some(json!({"requestedType": "audited"})),
        )
        .await;
        let id = request["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/verification-requests/{id}/resolve"),
            Some(json!({"status": "approved", "reviewerId": 9999})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "reviewerId 9999 does not match any user");
    }
}
