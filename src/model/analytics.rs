use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::survey::{RiskScore, SubmissionState, UnderstandLevel, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnderstandStats {
    pub mengerti: usize,
    pub tidak_mengerti: usize,
    /// Bare submissions that have not recorded an answer yet
    pub pending: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RiskCategoryStats {
    #[serde(rename = "LOW")]
    pub low: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    pub none: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldCount {
    pub field: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub feedback_by_field: BTreeMap<String, usize>,
    pub most_common_fields: Vec<FieldCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageScores {
    pub risk_score: f64,
    pub peluang: f64,
    pub impact: f64,
}

/// Aggregated survey statistics for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_submissions: usize,
    pub total_users: usize,
    pub understand_stats: UnderstandStats,
    pub risk_category_stats: RiskCategoryStats,
    pub feedback_stats: FeedbackStats,
    pub average_scores: AverageScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AssetRef {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ThreatRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatistics {
    pub total_threats: usize,
    pub total_submissions: usize,
    pub understand_stats: UnderstandStats,
    pub risk_stats: RiskCategoryStats,
    pub total_feedback: usize,
    /// Submissions (all users) per threat, as a percentage
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AssetAnalytics {
    pub asset: AssetRef,
    pub statistics: AssetStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetAnalyticsResponse {
    pub total_assets: usize,
    pub assets: Vec<AssetAnalytics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub total_submissions: usize,
    pub understand_stats: UnderstandStats,
    pub risk_stats: RiskCategoryStats,
    pub total_feedback: usize,
    /// Bare submissions count as 0
    pub average_risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserAnalytics {
    pub user: UserRef,
    pub statistics: UserStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalyticsResponse {
    pub total_users: usize,
    pub users: Vec<UserAnalytics>,
}

pub const DEFAULT_FEEDBACK_LIMIT: usize = 50;

/// Filters for the admin feedback listing
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub asset_id: Option<i64>,
    pub threat_id: Option<i64>,
    pub understand_level: Option<UnderstandLevel>,
    pub field: Option<String>,
    /// Most recent entries taken before the submission filters apply
    pub limit: usize,
}

impl Default for FeedbackQuery {
    fn default() -> Self {
        Self {
            asset_id: None,
            threat_id: None,
            understand_level: None,
            field: None,
            limit: DEFAULT_FEEDBACK_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnderstandingGap {
    pub mengerti_feedback: usize,
    pub tidak_mengerti_feedback: usize,
    /// mengerti / tidak mengerti, 0 when nobody misunderstood
    pub gap_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInsights {
    pub total_feedback: usize,
    /// Across all stored feedback; "N/A" when there is none
    pub most_common_field: String,
    pub most_common_field_count: usize,
    pub average_feedback_per_submission: f64,
    pub feedback_with_high_risk: usize,
    pub feedback_with_low_risk: usize,
    pub understanding_gap: UnderstandingGap,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub id: i64,
    pub understand: Option<UnderstandLevel>,
    pub submitted_at: DateTime<Utc>,
    pub user: Option<UserRef>,
    pub asset: Option<AssetRef>,
    pub threat: Option<ThreatRef>,
    pub score: Option<RiskScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: i64,
    pub field: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub submission: FeedbackSubmission,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackListing {
    pub insights: FeedbackInsights,
    /// Counts per field over all stored feedback, most common first
    pub field_stats: Vec<FieldCount>,
    /// Same, restricted to the last 30 days
    pub recent_feedback_trends: Vec<FieldCount>,
    pub detailed_feedback: Vec<FeedbackEntry>,
    pub filters: FeedbackQuery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and paging for the admin submission history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub user_id: Option<i64>,
    /// Case-insensitive match on user name or email
    pub user_name: Option<String>,
    pub asset_id: Option<i64>,
    pub threat_id: Option<i64>,
    pub months: u32,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            user_name: None,
            asset_id: None,
            threat_id: None,
            months: 12,
            page: 1,
            page_size: 20,
            sort: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub submission_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub state: SubmissionState,
    pub understand: Option<UnderstandLevel>,
    pub user: Option<UserRef>,
    pub asset: Option<AssetRef>,
    pub threat: Option<ThreatRef>,
    pub score: Option<RiskScore>,
    pub feedback_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
    pub total_pages: u32,
}
