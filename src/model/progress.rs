use serde::Serialize;
use utoipa::ToSchema;

/// Coarse status of an asset for one user, derived from threat completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatStatus {
    NotStarted,
    Completed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreatProgress {
    pub threat_id: i64,
    pub threat_name: String,
    pub status: ThreatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetProgress {
    pub asset_id: i64,
    pub asset_name: String,
    pub status: AssetStatus,
    pub completed_threats: usize,
    pub total_threats: usize,
    pub threats: Vec<ThreatProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_assets: usize,
    /// Assets whose form status is SUBMITTED
    pub completed_assets: usize,
    pub in_progress_assets: usize,
    pub not_started_assets: usize,
    pub progress_percentage: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    #[serde(flatten)]
    pub summary: ProgressSummary,
    pub asset_progress: Vec<AssetProgress>,
}

/// Admin view of one respondent's progress
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UmkmProgress {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub summary: ProgressSummary,
}
