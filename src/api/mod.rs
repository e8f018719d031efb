//! HTTP surface of the survey service

use actix_web::{HttpResponse, error::JsonPayloadError, web};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub mod admin;
pub mod assets;
pub mod error;
pub mod extract;
pub mod health;
pub mod openapi;
pub mod progress;
pub mod submissions;

use error::ApiError;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UMKM Cyber-Risk Survey API",
        description = "Risk self-assessment for small businesses: answer four questions per threat, get a scored risk category"
    ),
    paths(
        health::liveness,
        health::readiness,
        assets::list_assets,
        assets::asset_threats,
        assets::assess_threat,
        submissions::create_submission,
        submissions::submit_inputs,
        submissions::get_score,
        submissions::list_submissions,
        submissions::submit_batch,
        submissions::submission_details,
        progress::user_progress,
        admin::all_progress,
        admin::analytics_summary,
        admin::asset_analytics,
        admin::user_analytics,
        admin::feedback,
        admin::history,
    ),
    components(schemas(
        error::ErrorResponse,
        crate::model::AssetSummary,
        crate::model::Threat,
        crate::model::BusinessProcessLink,
        crate::model::ThreatKind,
        crate::model::RiskCategory,
        crate::model::ThreatDescription,
        crate::model::SubmissionState,
        crate::model::submission::CreateSubmissionRequest,
        crate::model::submission::CreateSubmissionResponse,
        crate::model::submission::SubmitInputsRequest,
        crate::model::submission::ScoreResponse,
        crate::model::submission::ThreatAnswer,
        crate::model::submission::BatchSubmissionRequest,
        crate::model::submission::BatchItemResult,
        crate::model::submission::BatchSubmissionResponse,
        crate::model::submission::AssessmentScores,
        crate::model::submission::ThreatAssessmentResponse,
        crate::model::submission::SubmissionSummary,
        crate::model::submission::SubmissionDetails,
        crate::model::submission::ThreatGuidance,
        crate::model::Feedback,
        crate::model::UnderstandLevel,
        crate::model::RiskScore,
        crate::model::progress::AssetStatus,
        crate::model::progress::ThreatStatus,
        crate::model::progress::ThreatProgress,
        crate::model::progress::AssetProgress,
        crate::model::progress::ProgressSummary,
        crate::model::progress::UserProgress,
        crate::model::progress::UmkmProgress,
        crate::model::analytics::AnalyticsSummary,
        crate::model::analytics::AssetRef,
        crate::model::analytics::UserRef,
        crate::model::analytics::ThreatRef,
        crate::model::analytics::AssetAnalytics,
        crate::model::analytics::AssetAnalyticsResponse,
        crate::model::analytics::UserAnalytics,
        crate::model::analytics::UserAnalyticsResponse,
        crate::model::analytics::FeedbackQuery,
        crate::model::analytics::FeedbackInsights,
        crate::model::analytics::FeedbackEntry,
        crate::model::analytics::FeedbackListing,
        crate::model::analytics::HistoryItem,
        crate::model::analytics::HistoryPage,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "assets", description = "Asset and threat catalog"),
        (name = "submissions", description = "Survey submissions and scores"),
        (name = "progress", description = "Respondent progress"),
        (name = "admin", description = "Admin dashboard, gated by PIN"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "admin_pin",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                extract::ADMIN_PIN_HEADER,
            ))),
        );
    }
}

/// Report malformed JSON bodies in the unified error format
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
            other => other.to_string(),
        };
        ApiError::bad_request(message).into()
    })
}

/// Report malformed path segments (e.g. a non-numeric id) in the unified error format
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

/// Report malformed query strings in the unified error format
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

/// Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    actix_web::ResponseError::error_response(&ApiError::NotFound("route".to_string()))
}
