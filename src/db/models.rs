//! Database row models for the survey tables

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::model::{
    Asset, BusinessProcessLink, Feedback, FormProgress, FormStatus, RiskCategory, RiskInput,
    RiskScore, Score, Submission, Threat, ThreatDescription, ThreatKind, UnderstandLevel, User,
};

#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl AssetRow {
    pub fn into_domain(self, threats: Vec<Threat>) -> Asset {
        Asset {
            id: self.id,
            name: self.name,
            description: self.description,
            threats,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ThreatRow {
    pub id: i64,
    pub asset_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
}

impl ThreatRow {
    pub fn into_domain(self, business_processes: Vec<BusinessProcessLink>) -> Threat {
        Threat {
            id: self.id,
            asset_id: self.asset_id,
            name: self.name,
            description: self.description,
            kind: ThreatKind::from_db(&self.kind),
            business_processes,
        }
    }
}

/// A threat's link to a business process, joined with the process name
#[derive(Debug, Clone, FromRow)]
pub struct ProcessLinkRow {
    pub threat_id: i64,
    pub business_process_id: i64,
    pub name: String,
    pub explanation: Option<String>,
}

impl ProcessLinkRow {
    pub fn into_domain(self) -> BusinessProcessLink {
        BusinessProcessLink {
            business_process_id: self.business_process_id,
            name: self.name,
            explanation: self.explanation,
        }
    }
}

/// A submission joined with its optional risk input and score
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub user_id: i64,
    pub asset_id: i64,
    pub threat_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub understand: Option<String>,
    pub biaya_pengetahuan: Option<i32>,
    pub pengaruh_kerugian: Option<i32>,
    pub frekuensi_serangan: Option<i32>,
    pub pemulihan: Option<i32>,
    pub peluang: Option<f64>,
    pub impact: Option<f64>,
    pub total: Option<i32>,
    pub category: Option<String>,
    pub threat_description: Option<serde_json::Value>,
}

impl SubmissionRow {
    /// Convert database row to domain model
    pub fn into_domain(self, feedback: Vec<Feedback>) -> Result<Submission, String> {
        let understand = match self.understand.as_deref() {
            Some(value) => Some(
                UnderstandLevel::from_db(value)
                    .ok_or_else(|| format!("Invalid understand level: {}", value))?,
            ),
            None => None,
        };

        let risk_input = match (
            self.biaya_pengetahuan,
            self.pengaruh_kerugian,
            self.frekuensi_serangan,
            self.pemulihan,
        ) {
            (Some(f), Some(g), Some(h), Some(i)) => Some(RiskInput { f, g, h, i }),
            _ => None,
        };

        let score = match (self.peluang, self.impact, self.total, self.category) {
            (Some(peluang), Some(impact), Some(total), Some(category)) => {
                let category = RiskCategory::from_db(&category)
                    .ok_or_else(|| format!("Invalid risk category: {}", category))?;
                let threat_description = self
                    .threat_description
                    .map(serde_json::from_value::<ThreatDescription>)
                    .transpose()
                    .map_err(|e| format!("Invalid threat description: {}", e))?;

                Some(Score {
                    risk: RiskScore {
                        peluang,
                        impact,
                        total,
                        category,
                    },
                    threat_description,
                })
            }
            _ => None,
        };

        Ok(Submission {
            id: self.id,
            user_id: self.user_id,
            asset_id: self.asset_id,
            threat_id: self.threat_id,
            submitted_at: self.submitted_at,
            understand,
            risk_input,
            score,
            feedback,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub submission_id: i64,
    pub field: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            submission_id: row.submission_id,
            field: row.field,
            value: row.value,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FormProgressRow {
    pub user_id: i64,
    pub asset_id: i64,
    pub status: String,
}

impl FormProgressRow {
    pub fn into_domain(self) -> Result<FormProgress, String> {
        let status = FormStatus::from_db(&self.status)
            .ok_or_else(|| format!("Invalid form status: {}", self.status))?;

        Ok(FormProgress {
            user_id: self.user_id,
            asset_id: self.asset_id,
            status,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            is_active: row.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_row() -> SubmissionRow {
        SubmissionRow {
            id: 10,
            user_id: 1,
            asset_id: 2,
            threat_id: 3,
            submitted_at: Utc::now(),
            understand: None,
            biaya_pengetahuan: None,
            pengaruh_kerugian: None,
            frekuensi_serangan: None,
            pemulihan: None,
            peluang: None,
            impact: None,
            total: None,
            category: None,
            threat_description: None,
        }
    }

    #[test]
    fn test_bare_submission_row() {
        let submission = bare_row().into_domain(vec![]).unwrap();
        assert!(submission.risk_input.is_none());
        assert!(submission.score.is_none());
        assert!(!submission.is_completed());
    }

    #[test]
    fn test_completed_submission_row() {
        let row = SubmissionRow {
            understand: Some("TIDAK_MENGERTI".to_string()),
            biaya_pengetahuan: Some(4),
            pengaruh_kerugian: Some(5),
            frekuensi_serangan: Some(3),
            pemulihan: Some(4),
            peluang: Some(4.1667),
            impact: Some(3.5),
            total: Some(15),
            category: Some("LOW".to_string()),
            threat_description: Some(serde_json::json!({
                "category": "LOW",
                "threatName": "Phishing",
                "description": "d",
                "recommendations": ["r"],
                "priority": "LOW",
                "actionRequired": false
            })),
            ..bare_row()
        };

        let submission = row.into_domain(vec![]).unwrap();
        assert!(submission.is_completed());
        assert_eq!(submission.understand, Some(UnderstandLevel::TidakMengerti));
        let score = submission.score.unwrap();
        assert_eq!(score.risk.category, RiskCategory::Low);
        assert_eq!(score.threat_description.unwrap().threat_name, "Phishing");
    }

    #[test]
    fn test_invalid_category_is_rejected() {
        let row = SubmissionRow {
            peluang: Some(1.0),
            impact: Some(1.0),
            total: Some(1),
            category: Some("EXTREME".to_string()),
            ..bare_row()
        };

        assert!(row.into_domain(vec![]).is_err());
    }
}
