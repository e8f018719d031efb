//! REST API endpoints for survey submissions

use actix_web::{HttpResponse, get, post, web};

use crate::api::error::{ApiError, ErrorResponse};
use crate::api::extract::AuthenticatedUser;
use crate::model::submission::{
    BatchSubmissionRequest, BatchSubmissionResponse, CreateSubmissionRequest,
    CreateSubmissionResponse, ScoreResponse, SubmissionDetails, SubmissionSummary,
    SubmitInputsRequest,
};
use crate::service::SurveyService;

/// Open a submission for one threat of an asset
#[utoipa::path(
    post,
    path = "/v1/submissions",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Submission created", body = CreateSubmissionResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Asset or threat not found", body = ErrorResponse),
        (status = 409, description = "A submission already exists for this threat", body = ErrorResponse),
        (status = 422, description = "Threat does not belong to the asset", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[post("/v1/submissions")]
pub async fn create_submission(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    body: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let submission_id = service
        .create_submission(user.user_id, body.asset_id, body.threat_id)
        .await?;

    Ok(HttpResponse::Created().json(CreateSubmissionResponse { submission_id }))
}

/// Record the survey answers of a submission and return its score
#[utoipa::path(
    post,
    path = "/v1/submissions/{id}/inputs",
    params(
        ("id" = i64, Path, description = "Submission ID")
    ),
    request_body = SubmitInputsRequest,
    responses(
        (status = 200, description = "Inputs recorded and scored", body = ScoreResponse),
        (status = 400, description = "Invalid answers", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Submission belongs to another user", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 422, description = "Inputs already submitted", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[post("/v1/submissions/{id}/inputs")]
pub async fn submit_inputs(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<SubmitInputsRequest>,
) -> Result<HttpResponse, ApiError> {
    let score = service
        .submit_inputs(user.user_id, path.into_inner(), &body)
        .await?;
    Ok(HttpResponse::Ok().json(score))
}

/// Get the score of a completed submission
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}/score",
    params(
        ("id" = i64, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "Score retrieved", body = ScoreResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Submission belongs to another user", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse),
        (status = 422, description = "Score not yet calculated", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[get("/v1/submissions/{id}/score")]
pub async fn get_score(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let score = service.get_score(user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(score))
}

/// Full view of one of the caller's submissions
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}/details",
    params(
        ("id" = i64, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "Submission details", body = SubmissionDetails),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Submission belongs to another user", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[get("/v1/submissions/{id}/details")]
pub async fn submission_details(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let details = service
        .submission_details(user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(details))
}

/// List the caller's submissions
#[utoipa::path(
    get,
    path = "/v1/submissions",
    responses(
        (status = 200, description = "Submissions retrieved", body = Vec<SubmissionSummary>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[get("/v1/submissions")]
pub async fn list_submissions(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let submissions = service.list_submissions(user.user_id).await?;
    Ok(HttpResponse::Ok().json(submissions))
}

/// Submit answers for several threats of one asset
///
/// Items are processed in order and reported individually; one failing item
/// does not undo the others.
#[utoipa::path(
    post,
    path = "/v1/submissions/batch",
    request_body = BatchSubmissionRequest,
    responses(
        (status = 200, description = "Per-threat results", body = BatchSubmissionResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 422, description = "Empty batch or threats outside the asset", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "submissions"
)]
#[post("/v1/submissions/batch")]
pub async fn submit_batch(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
    body: web::Json<BatchSubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = service.submit_batch(user.user_id, &body).await?;

    tracing::info!(
        user_id = user.user_id,
        asset_id = body.asset_id,
        total = response.submissions.len(),
        succeeded = response.succeeded(),
        "Batch processed"
    );

    Ok(HttpResponse::Ok().json(response))
}

/// Configure submission routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_batch)
        .service(create_submission)
        .service(list_submissions)
        .service(submit_inputs)
        .service(get_score)
        .service(submission_details);
}
