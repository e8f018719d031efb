//! REST API endpoint for the caller's survey progress

use actix_web::{HttpResponse, get, web};

use crate::api::error::{ApiError, ErrorResponse};
use crate::api::extract::AuthenticatedUser;
use crate::model::progress::UserProgress;
use crate::service::SurveyService;

/// Detailed progress of the caller across all assets
#[utoipa::path(
    get,
    path = "/v1/progress",
    responses(
        (status = 200, description = "Progress retrieved", body = UserProgress),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "progress"
)]
#[get("/v1/progress")]
pub async fn user_progress(
    service: web::Data<SurveyService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let progress = service.user_progress(user.user_id).await?;
    Ok(HttpResponse::Ok().json(progress))
}

/// Configure progress routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(user_progress);
}
