//! PIN-gated admin endpoints

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::error::{ApiError, ErrorResponse};
use crate::api::extract::AdminPin;
use crate::model::UnderstandLevel;
use crate::model::analytics::{
    AnalyticsSummary, AssetAnalyticsResponse, DEFAULT_FEEDBACK_LIMIT, FeedbackListing,
    FeedbackQuery, HistoryPage, HistoryQuery, SortOrder, UserAnalyticsResponse,
};
use crate::model::progress::UmkmProgress;
use crate::service::{AnalyticsService, SurveyService};

/// Query parameters for the feedback listing
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackParams {
    /// Only feedback on submissions for this asset
    pub asset_id: Option<i64>,
    /// Only feedback on submissions for this threat
    pub threat_id: Option<i64>,
    /// MENGERTI or TIDAK_MENGERTI
    pub understand_level: Option<String>,
    /// Only this feedback field
    pub field: Option<String>,
    /// Most recent entries to consider (default: 50)
    pub limit: Option<usize>,
}

impl FeedbackParams {
    fn into_query(self) -> Result<FeedbackQuery, ApiError> {
        let understand_level = match self.understand_level.as_deref() {
            None | Some("") => None,
            Some(value) => Some(UnderstandLevel::from_db(value).ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Invalid understandLevel: {}. Must be MENGERTI or TIDAK_MENGERTI",
                    value
                ))
            })?),
        };

        Ok(FeedbackQuery {
            asset_id: self.asset_id,
            threat_id: self.threat_id,
            understand_level,
            field: self.field.filter(|f| !f.is_empty()),
            limit: self.limit.unwrap_or(DEFAULT_FEEDBACK_LIMIT),
        })
    }
}

/// Query parameters for the submission history
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub user_id: Option<i64>,
    /// Case-insensitive match on user name or email
    pub user_name: Option<String>,
    pub asset_id: Option<i64>,
    pub threat_id: Option<i64>,
    /// Look-back window in months (default: 12, 0 for no limit)
    pub months: Option<u32>,
    /// Page number (1-indexed, default: 1)
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100)
    pub page_size: Option<u32>,
    /// asc or desc by submission time (default: desc)
    pub sort: Option<String>,
}

impl From<HistoryParams> for HistoryQuery {
    fn from(params: HistoryParams) -> Self {
        let defaults = HistoryQuery::default();
        HistoryQuery {
            user_id: params.user_id,
            user_name: params.user_name,
            asset_id: params.asset_id,
            threat_id: params.threat_id,
            months: params.months.unwrap_or(defaults.months),
            page: params.page.unwrap_or(defaults.page),
            page_size: params.page_size.unwrap_or(defaults.page_size),
            sort: match params.sort.as_deref() {
                Some("asc") => SortOrder::Asc,
                _ => SortOrder::Desc,
            },
        }
    }
}

/// Progress summary of every active respondent
#[utoipa::path(
    get,
    path = "/v1/admin/progress",
    responses(
        (status = 200, description = "Progress of all users", body = Vec<UmkmProgress>),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/progress")]
pub async fn all_progress(
    service: web::Data<SurveyService>,
    _admin: AdminPin,
) -> Result<HttpResponse, ApiError> {
    let progress = service.all_user_progress().await?;
    Ok(HttpResponse::Ok().json(progress))
}

/// Aggregate statistics over all submissions
#[utoipa::path(
    get,
    path = "/v1/admin/analytics/summary",
    responses(
        (status = 200, description = "Analytics summary", body = AnalyticsSummary),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/analytics/summary")]
pub async fn analytics_summary(
    service: web::Data<AnalyticsService>,
    _admin: AdminPin,
) -> Result<HttpResponse, ApiError> {
    let summary = service.summary().await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Statistics per asset
#[utoipa::path(
    get,
    path = "/v1/admin/analytics/assets",
    responses(
        (status = 200, description = "Per-asset statistics", body = AssetAnalyticsResponse),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/analytics/assets")]
pub async fn asset_analytics(
    service: web::Data<AnalyticsService>,
    _admin: AdminPin,
) -> Result<HttpResponse, ApiError> {
    let analytics = service.asset_analytics().await?;
    Ok(HttpResponse::Ok().json(analytics))
}

/// Statistics per user
#[utoipa::path(
    get,
    path = "/v1/admin/analytics/users",
    responses(
        (status = 200, description = "Per-user statistics", body = UserAnalyticsResponse),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/analytics/users")]
pub async fn user_analytics(
    service: web::Data<AnalyticsService>,
    _admin: AdminPin,
) -> Result<HttpResponse, ApiError> {
    let analytics = service.user_analytics().await?;
    Ok(HttpResponse::Ok().json(analytics))
}

/// Recent feedback with insights
///
/// The field filter and `limit` select the most recent entries first; the
/// asset, threat and understanding filters then narrow that set.
#[utoipa::path(
    get,
    path = "/v1/admin/feedback",
    params(FeedbackParams),
    responses(
        (status = 200, description = "Feedback listing", body = FeedbackListing),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/feedback")]
pub async fn feedback(
    service: web::Data<AnalyticsService>,
    _admin: AdminPin,
    query: web::Query<FeedbackParams>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner().into_query()?;
    let listing = service.feedback(query).await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// Submission history with filters and pagination
#[utoipa::path(
    get,
    path = "/v1/admin/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "One page of submissions", body = HistoryPage),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Invalid admin PIN", body = ErrorResponse)
    ),
    security(("admin_pin" = [])),
    tag = "admin"
)]
#[get("/v1/admin/history")]
pub async fn history(
    service: web::Data<AnalyticsService>,
    _admin: AdminPin,
    query: web::Query<HistoryParams>,
) -> Result<HttpResponse, ApiError> {
    let page = service.history(query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Configure admin routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(all_progress)
        .service(analytics_summary)
        .service(asset_analytics)
        .service(user_analytics)
        .service(feedback)
        .service(history);
}
