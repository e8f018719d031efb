//! Request and response schemas for the submission use cases
//!
//! Field names follow the survey form (`biaya_pengetahuan`, `Frekuensi_serangan`, ...)
//! so existing clients keep working; everything is validated at the boundary
//! before it reaches the services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analytics::{AssetRef, ThreatRef, UserRef};
use super::survey::{
    Feedback, RiskCategory, RiskInput, RiskScore, SubmissionState, ThreatDescription,
};

/// Feedback field recording the understanding choice
pub const FEEDBACK_FIELD_UNDERSTOOD: &str = "mengerti_poin";
/// Feedback field recording which point was not understood
pub const FEEDBACK_FIELD_NOT_UNDERSTOOD_POINT: &str = "Tidak_mengerti_poin";
/// Feedback field recording the free-text explanation
pub const FEEDBACK_FIELD_EXPLANATION: &str = "description_tidak_mengerti";

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub asset_id: i64,
    pub threat_id: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionResponse {
    pub submission_id: i64,
}

/// Survey answers for one threat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmitInputsRequest {
    pub biaya_pengetahuan: i32,
    pub pengaruh_kerugian: i32,
    #[serde(rename = "Frekuensi_serangan")]
    pub frekuensi_serangan: i32,
    #[serde(rename = "Pemulihan")]
    pub pemulihan: i32,
    pub mengerti_poin: bool,
    #[serde(rename = "Tidak_mengerti_poin", default, skip_serializing_if = "Option::is_none")]
    pub tidak_mengerti_poin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_tidak_mengerti: Option<String>,
}

impl SubmitInputsRequest {
    pub fn risk_input(&self) -> RiskInput {
        RiskInput {
            f: self.biaya_pengetahuan,
            g: self.pengaruh_kerugian,
            h: self.frekuensi_serangan,
            i: self.pemulihan,
        }
    }
}

/// Score plus threat description, as returned after submitting inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub peluang: f64,
    pub impact: f64,
    pub total: i32,
    pub category: RiskCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_description: Option<ThreatDescription>,
}

impl ScoreResponse {
    pub fn new(score: RiskScore, threat_description: Option<ThreatDescription>) -> Self {
        Self {
            peluang: score.peluang,
            impact: score.impact,
            total: score.total,
            category: score.category,
            threat_description,
        }
    }
}

/// One threat's answers inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAnswer {
    pub threat_id: i64,
    #[serde(flatten)]
    pub answers: SubmitInputsRequest,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmissionRequest {
    pub asset_id: i64,
    pub threats: Vec<ThreatAnswer>,
}

/// Outcome of one batch item
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub threat_id: i64,
    /// Id of the submission touched by this item, if one exists
    pub submission_id: Option<i64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item results, in request order
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchSubmissionResponse {
    pub submissions: Vec<BatchItemResult>,
}

impl BatchSubmissionResponse {
    pub fn succeeded(&self) -> usize {
        self.submissions.iter().filter(|s| s.success).count()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssessmentScores {
    pub peluang: f64,
    pub impact: f64,
    pub total: i32,
    pub category: RiskCategory,
}

impl From<RiskScore> for AssessmentScores {
    fn from(risk: RiskScore) -> Self {
        Self {
            peluang: risk.peluang,
            impact: risk.impact,
            total: risk.total,
            category: risk.category,
        }
    }
}

/// Response of the single-threat assessment endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessmentResponse {
    pub submission_id: i64,
    pub asset_id: i64,
    pub threat_id: i64,
    pub scores: AssessmentScores,
    pub threat_description: Option<ThreatDescription>,
    pub submitted_at: DateTime<Utc>,
}

/// Summary of one of the caller's submissions
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub submission_id: i64,
    pub asset_id: i64,
    pub threat_id: i64,
    pub state: SubmissionState,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreResponse>,
}

/// Threat description without its explanatory text
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreatGuidance {
    pub threat_name: String,
    pub recommendations: Vec<String>,
    pub priority: RiskCategory,
    pub action_required: bool,
    pub category: RiskCategory,
}

impl From<ThreatDescription> for ThreatGuidance {
    fn from(description: ThreatDescription) -> Self {
        Self {
            threat_name: description.threat_name,
            recommendations: description.recommendations,
            priority: description.priority,
            action_required: description.action_required,
            category: description.category,
        }
    }
}

/// Full view of one of the caller's submissions
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetails {
    pub id: i64,
    pub submitted_at: DateTime<Utc>,
    pub state: SubmissionState,
    pub user: UserRef,
    pub asset: AssetRef,
    pub threat: ThreatRef,
    pub risk_score: Option<AssessmentScores>,
    pub threat_description: Option<ThreatGuidance>,
    /// `None` when the submission carries no feedback
    pub feedback: Option<Vec<Feedback>>,
}
