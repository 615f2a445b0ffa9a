use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ApplicationId, CandidateId, Decision, OpportunityId};
use super::identity::AccessToken;
use super::service::{ApplicationEvent, ErrorKind, MatchingService, MatchingServiceError};

/// Router builder exposing the matching and lifecycle endpoints.
pub fn application_router(service: Arc<MatchingService>) -> Router {
    Router::new()
        .route("/api/v1/applications", post(apply_handler))
        .route("/api/v1/applications/:application_id", get(status_handler))
        .route(
            "/api/v1/applications/:application_id/guardian-decision",
            post(guardian_decision_handler),
        )
        .route(
            "/api/v1/applications/:application_id/owner-decision",
            post(owner_decision_handler),
        )
        .route(
            "/api/v1/applications/:application_id/transition",
            post(transition_handler),
        )
        .route(
            "/api/v1/applications/:application_id/consent-check",
            post(consent_check_handler),
        )
        .route(
            "/api/v1/opportunities/:opportunity_id/close",
            post(close_handler),
        )
        .route(
            "/api/v1/opportunities/:opportunity_id/rankings",
            get(rankings_handler),
        )
        .route(
            "/api/v1/match-scores/:candidate_id/:opportunity_id",
            get(match_score_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) candidate_id: CandidateId,
    pub(crate) opportunity_id: OpportunityId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuardianDecisionRequest {
    pub(crate) guardian_token: String,
    pub(crate) decision: Decision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerDecisionRequest {
    pub(crate) decision: Decision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) event: ApplicationEvent,
}

/// Render a service error as `{ error, kind, recoverable }` with the matching status code.
pub fn error_response(error: MatchingServiceError) -> Response {
    let kind = error.kind();
    let status = match (&error, kind) {
        (MatchingServiceError::InvalidToken, _) => StatusCode::UNAUTHORIZED,
        (_, ErrorKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, ErrorKind::Permission) => StatusCode::FORBIDDEN,
        (_, ErrorKind::State | ErrorKind::Capacity | ErrorKind::Consent) => StatusCode::CONFLICT,
        (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        (_, ErrorKind::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
    };

    let payload = json!({
        "error": error.to_string(),
        "kind": kind.label(),
        "recoverable": kind.is_recoverable(),
    });
    (status, Json(payload)).into_response()
}

fn bearer_actor(service: &MatchingService, headers: &HeaderMap) -> Result<Actor, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(AccessToken::from_bearer)
        .ok_or_else(|| error_response(MatchingServiceError::InvalidToken))?;
    service.resolve_actor(&token).map_err(error_response)
}

pub(crate) async fn apply_handler(
    State(service): State<Arc<MatchingService>>,
    Json(request): Json<ApplyRequest>,
) -> Response {
    match service.apply(&request.candidate_id, &request.opportunity_id) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler(
    State(service): State<Arc<MatchingService>>,
    Path(application_id): Path<String>,
) -> Response {
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn guardian_decision_handler(
    State(service): State<Arc<MatchingService>>,
    Path(application_id): Path<String>,
    Json(request): Json<GuardianDecisionRequest>,
) -> Response {
    let token = AccessToken(request.guardian_token);
    match service.guardian_decision(&ApplicationId(application_id), &token, request.decision) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn owner_decision_handler(
    State(service): State<Arc<MatchingService>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<OwnerDecisionRequest>,
) -> Response {
    let actor = match bearer_actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.owner_decision(&ApplicationId(application_id), &actor, request.decision) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler(
    State(service): State<Arc<MatchingService>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<TransitionRequest>,
) -> Response {
    let actor = match bearer_actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.transition(&ApplicationId(application_id), &actor, request.event) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn consent_check_handler(
    State(service): State<Arc<MatchingService>>,
    Path(application_id): Path<String>,
) -> Response {
    match service.recheck_consent(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn close_handler(
    State(service): State<Arc<MatchingService>>,
    Path(opportunity_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = match bearer_actor(&service, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.close_opportunity(&OpportunityId(opportunity_id), &actor) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rankings_handler(
    State(service): State<Arc<MatchingService>>,
    Path(opportunity_id): Path<String>,
) -> Response {
    match service.rank_applicants(&OpportunityId(opportunity_id)) {
        Ok(scores) => (StatusCode::OK, Json(scores)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn match_score_handler(
    State(service): State<Arc<MatchingService>>,
    Path((candidate_id, opportunity_id)): Path<(String, String)>,
) -> Response {
    match service.get_match_score(&CandidateId(candidate_id), &OpportunityId(opportunity_id)) {
        Ok(score) => (StatusCode::OK, Json(score)).into_response(),
        Err(error) => error_response(error),
    }
}
