//! REST API endpoints for the asset/threat catalog

use actix_web::{HttpResponse, get, post, web};

use crate::api::error::{ApiError, ErrorResponse};
use crate::api::extract::AuthenticatedUser;
use crate::model::submission::{SubmitInputsRequest, ThreatAssessmentResponse};
use crate::model::{AssetSummary, Threat};
use crate::service::SurveyService;

/// List all assets with their threat counts, ordered by name
#[utoipa::path(
    get,
    path = "/v1/assets",
    responses(
        (status = 200, description = "Assets retrieved successfully", body = Vec<AssetSummary>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "assets"
)]
#[get("/v1/assets")]
pub async fn list_assets(service: web::Data<SurveyService>) -> Result<HttpResponse, ApiError> {
    let assets = service.list_assets().await?;
    Ok(HttpResponse::Ok().json(assets))
}

/// List the threats of one asset
#[utoipa::path(
    get,
    path = "/v1/assets/{id}/threats",
    params(
        ("id" = i64, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Threats retrieved successfully", body = Vec<Threat>),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "assets"
)]
#[get("/v1/assets/{id}/threats")]
pub async fn asset_threats(
    service: web::Data<SurveyService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let threats = service.asset_threats(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(threats))
}

/// Assess one threat in a single call
///
/// Creates the submission (or reuses a bare one) and records the answers.
#[utoipa::path(
    post,
    path = "/v1/assets/{asset_id}/threats/{threat_id}/assessment",
    params(
        ("asset_id" = i64, Path, description = "Asset ID"),
        ("threat_id" = i64, Path, description = "Threat ID")
    ),
    request_body = SubmitInputsRequest,
    responses(
        (status = 201, description = "Threat assessed", body = ThreatAssessmentResponse),
        (status = 400, description = "Invalid answers", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Asset or threat not found", body = ErrorResponse),
        (status = 409, description = "Threat already assessed", body = ErrorResponse),
        (status = 422, description = "Threat does not belong to the asset", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "assets"
)]
#[post("/v1/assets/{asset_id}/threats/{threat_id}/assessment")]
pub async fn assess_threat(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    body: web::Json<SubmitInputsRequest>,
) -> Result<HttpResponse, ApiError> {
    let (asset_id, threat_id) = path.into_inner();

    let response = service
        .assess_threat(user.user_id, asset_id, threat_id, &body)
        .await?;

    tracing::info!(
        user_id = user.user_id,
        asset_id,
        threat_id,
        submission_id = response.submission_id,
        category = response.scores.category.as_str(),
        "Threat assessed"
    );

    Ok(HttpResponse::Created().json(response))
}

/// Configure catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_assets)
        .service(asset_threats)
        .service(assess_threat);
}
