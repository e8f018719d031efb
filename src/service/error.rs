//! Error taxonomy shared by the survey services

use crate::db::DbError;
use crate::service::risk::RiskInputError;

#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// A risk input outside its allowed range or set
    #[error(transparent)]
    Validation(#[from] RiskInputError),

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    BusinessLogic(String),

    /// Batch threats that do not belong to the requested asset; every offending id is listed
    #[error("Threats {threat_ids:?} do not belong to asset {asset_id}")]
    InvalidThreats { asset_id: i64, threat_ids: Vec<i64> },

    /// The submission is owned by a different user
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl SurveyError {
    pub fn asset_not_found(asset_id: i64) -> Self {
        SurveyError::ResourceNotFound(format!("Asset {}", asset_id))
    }

    pub fn threat_not_found(threat_id: i64) -> Self {
        SurveyError::ResourceNotFound(format!("Threat {}", threat_id))
    }

    pub fn submission_not_found(submission_id: i64) -> Self {
        SurveyError::ResourceNotFound(format!("Submission {}", submission_id))
    }

    pub fn already_submitted(submission_id: i64) -> Self {
        SurveyError::BusinessLogic(format!(
            "Inputs already submitted for submission {}",
            submission_id
        ))
    }
}
