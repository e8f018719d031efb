//! Submission state tracking
//!
//! Owns the lifecycle of one user's assessment of one threat:
//! `CREATED` (bare submission) -> `COMPLETED` (risk input and score written).
//! `COMPLETED` is terminal. Uniqueness of (user, asset, threat) and of the
//! risk input per submission is enforced by the store, so racing requests
//! resolve to exactly one winner.

use std::sync::Arc;

use chrono::Utc;

use crate::db::DbError;
use crate::db::repository::{
    CatalogRepository, CompletedAssessment, FormProgressRepository, NewFeedback,
    SubmissionRepository,
};
use crate::model::submission::{
    BatchItemResult, BatchSubmissionRequest, BatchSubmissionResponse, FEEDBACK_FIELD_EXPLANATION,
    FEEDBACK_FIELD_NOT_UNDERSTOOD_POINT, FEEDBACK_FIELD_UNDERSTOOD, ScoreResponse,
    SubmitInputsRequest, ThreatAnswer,
};
use crate::model::progress::AssetStatus;
use crate::model::{Asset, FormStatus, Score, Submission, Threat, UnderstandLevel};
use crate::service::error::SurveyError;
use crate::service::progress;
use crate::service::risk::RiskCalculator;
use crate::service::threat_description::ThreatDescriptionCatalog;

pub struct SubmissionTracker {
    catalog: Arc<dyn CatalogRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    progress: Arc<dyn FormProgressRepository>,
    calculator: RiskCalculator,
    descriptions: ThreatDescriptionCatalog,
}

impl SubmissionTracker {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        progress: Arc<dyn FormProgressRepository>,
    ) -> Self {
        Self {
            catalog,
            submissions,
            progress,
            calculator: RiskCalculator::new(),
            descriptions: ThreatDescriptionCatalog::new(),
        }
    }

    /// Resolve an asset and one of its threats.
    ///
    /// A threat that exists under another asset is a business-logic error.
    pub async fn resolve_threat(
        &self,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<(Asset, Threat), SurveyError> {
        let asset = self
            .catalog
            .find_asset(asset_id)
            .await?
            .ok_or_else(|| SurveyError::asset_not_found(asset_id))?;

        if let Some(threat) = asset.threat(threat_id).cloned() {
            return Ok((asset, threat));
        }

        match self.catalog.find_threat(threat_id).await? {
            Some(_) => {
                tracing::warn!(asset_id, threat_id, "Threat does not belong to asset");
                Err(SurveyError::BusinessLogic(format!(
                    "Threat {} does not belong to asset {}",
                    threat_id, asset_id
                )))
            }
            None => Err(SurveyError::threat_not_found(threat_id)),
        }
    }

    /// The caller's submission for a threat, if any
    pub async fn existing_submission(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<Option<Submission>, SurveyError> {
        Ok(self
            .submissions
            .find_for_threat(user_id, asset_id, threat_id)
            .await?)
    }

    /// Create a bare submission and mark the asset's form IN_PROGRESS.
    /// Returns the new submission id.
    pub async fn create_submission(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<i64, SurveyError> {
        self.resolve_threat(asset_id, threat_id).await?;

        if let Some(existing) = self
            .submissions
            .find_for_threat(user_id, asset_id, threat_id)
            .await?
        {
            return Err(duplicate_submission(threat_id, existing.id));
        }

        let submission = self
            .submissions
            .create(user_id, asset_id, threat_id, Utc::now())
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => {
                    SurveyError::DuplicateResource(format!(
                        "Submission already exists for threat {}",
                        threat_id
                    ))
                }
                other => other.into(),
            })?;

        self.progress
            .set_status(user_id, asset_id, FormStatus::InProgress)
            .await?;

        tracing::info!(
            submission_id = submission.id,
            user_id,
            asset_id,
            threat_id,
            "Submission created"
        );

        Ok(submission.id)
    }

    /// Load a submission owned by `user_id`
    pub async fn owned_submission(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<Submission, SurveyError> {
        let submission = self
            .submissions
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| SurveyError::submission_not_found(submission_id))?;

        if submission.user_id != user_id {
            tracing::warn!(user_id, submission_id, "Submission owned by another user");
            return Err(SurveyError::Unauthorized(format!(
                "Submission {} belongs to another user",
                submission_id
            )));
        }

        Ok(submission)
    }

    /// Validate and score the answers, store them, then refresh the asset's form status
    pub async fn submit_inputs(
        &self,
        user_id: i64,
        submission_id: i64,
        request: &SubmitInputsRequest,
    ) -> Result<ScoreResponse, SurveyError> {
        let submission = self.owned_submission(user_id, submission_id).await?;
        let response = self.record_inputs(&submission, request).await?;
        self.refresh_progress(user_id, submission.asset_id).await?;
        Ok(response)
    }

    /// Complete a submission without touching form status
    async fn record_inputs(
        &self,
        submission: &Submission,
        request: &SubmitInputsRequest,
    ) -> Result<ScoreResponse, SurveyError> {
        if submission.risk_input.is_some() {
            tracing::warn!(submission_id = submission.id, "Inputs already submitted");
            return Err(SurveyError::already_submitted(submission.id));
        }

        let input = request.risk_input();
        let risk = self.calculator.calculate(&input)?;

        let threat = self
            .catalog
            .find_threat(submission.threat_id)
            .await?
            .ok_or_else(|| SurveyError::threat_not_found(submission.threat_id))?;
        let description = self
            .descriptions
            .describe(&threat.name, threat.kind, risk.category);

        let assessment = CompletedAssessment {
            risk_input: input,
            score: Score {
                risk,
                threat_description: Some(description.clone()),
            },
            understand: UnderstandLevel::from_flag(request.mengerti_poin),
            feedback: feedback_rows(request),
        };

        self.submissions
            .complete(submission.id, &assessment)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => SurveyError::already_submitted(submission.id),
                other => other.into(),
            })?;

        tracing::info!(
            submission_id = submission.id,
            total = risk.total,
            category = %risk.category,
            "Submission completed"
        );

        Ok(ScoreResponse::new(risk, Some(description)))
    }

    /// Recompute the form status of one asset from the user's completed threats
    async fn refresh_progress(&self, user_id: i64, asset_id: i64) -> Result<(), SurveyError> {
        let asset = self
            .catalog
            .find_asset(asset_id)
            .await?
            .ok_or_else(|| SurveyError::asset_not_found(asset_id))?;
        let submissions = self.submissions.list_by_user(user_id).await?;
        let completed = progress::completed_threats(&asset, &submissions);

        let status = match progress::asset_status(asset.threats.len(), completed) {
            AssetStatus::Completed => FormStatus::Submitted,
            AssetStatus::InProgress => FormStatus::InProgress,
            AssetStatus::NotStarted => return Ok(()),
        };

        self.progress.set_status(user_id, asset_id, status).await?;
        tracing::debug!(user_id, asset_id, status = status.as_str(), "Form progress updated");
        Ok(())
    }

    /// Create and complete one submission per answer.
    ///
    /// All threat ids are checked against the asset before anything is written.
    /// Item failures are reported per item and do not stop the batch.
    pub async fn submit_batch(
        &self,
        user_id: i64,
        request: &BatchSubmissionRequest,
    ) -> Result<BatchSubmissionResponse, SurveyError> {
        let asset = self
            .catalog
            .find_asset(request.asset_id)
            .await?
            .ok_or_else(|| SurveyError::asset_not_found(request.asset_id))?;

        if request.threats.is_empty() {
            return Err(SurveyError::BusinessLogic(
                "Batch must contain at least one threat".to_string(),
            ));
        }

        let invalid: Vec<i64> = request
            .threats
            .iter()
            .map(|t| t.threat_id)
            .filter(|id| !asset.owns_threat(*id))
            .collect();
        if !invalid.is_empty() {
            tracing::warn!(asset_id = asset.id, invalid = ?invalid, "Batch rejected");
            return Err(SurveyError::InvalidThreats {
                asset_id: asset.id,
                threat_ids: invalid,
            });
        }

        let mut submissions = Vec::with_capacity(request.threats.len());
        for answer in &request.threats {
            submissions.push(self.batch_item(user_id, &asset, answer).await);
        }
        let response = BatchSubmissionResponse { submissions };

        let succeeded = response.succeeded();
        let status = if succeeded == response.submissions.len() {
            Some(FormStatus::Submitted)
        } else if succeeded > 0 {
            Some(FormStatus::InProgress)
        } else {
            None
        };
        if let Some(status) = status {
            self.progress.set_status(user_id, asset.id, status).await?;
        }

        tracing::info!(
            user_id,
            asset_id = asset.id,
            succeeded,
            total = response.submissions.len(),
            "Batch processed"
        );

        Ok(response)
    }

    async fn batch_item(&self, user_id: i64, asset: &Asset, answer: &ThreatAnswer) -> BatchItemResult {
        let threat_id = answer.threat_id;
        let failure = |submission_id: Option<i64>, error: &SurveyError| {
            tracing::warn!(user_id, threat_id, error = %error, "Batch item failed");
            BatchItemResult {
                threat_id,
                submission_id,
                success: false,
                result: None,
                error: Some(error.to_string()),
            }
        };

        // reject bad answers before a bare submission is written
        if let Err(e) = self.calculator.validate(&answer.answers.risk_input()) {
            return failure(None, &e.into());
        }

        let submission = match self
            .submissions
            .create(user_id, asset.id, threat_id, Utc::now())
            .await
        {
            Ok(submission) => submission,
            Err(DbError::UniqueViolation(_)) => {
                let existing = self
                    .submissions
                    .find_for_threat(user_id, asset.id, threat_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|s| s.id);
                let error = match existing {
                    Some(id) => duplicate_submission(threat_id, id),
                    None => SurveyError::DuplicateResource(format!(
                        "Submission already exists for threat {}",
                        threat_id
                    )),
                };
                return failure(existing, &error);
            }
            Err(e) => return failure(None, &e.into()),
        };

        match self.record_inputs(&submission, &answer.answers).await {
            Ok(result) => BatchItemResult {
                threat_id,
                submission_id: Some(submission.id),
                success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => failure(Some(submission.id), &e),
        }
    }

    /// Stored score of a completed submission
    pub async fn get_score(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<ScoreResponse, SurveyError> {
        let submission = self.owned_submission(user_id, submission_id).await?;

        match submission.score {
            Some(score) => Ok(ScoreResponse::new(score.risk, score.threat_description)),
            None => Err(SurveyError::BusinessLogic(format!(
                "Score not yet calculated for submission {}",
                submission_id
            ))),
        }
    }

    pub async fn list_submissions(&self, user_id: i64) -> Result<Vec<Submission>, SurveyError> {
        Ok(self.submissions.list_by_user(user_id).await?)
    }
}

fn duplicate_submission(threat_id: i64, submission_id: i64) -> SurveyError {
    SurveyError::DuplicateResource(format!(
        "Submission {} already exists for threat {}",
        submission_id, threat_id
    ))
}

/// One row for the understanding choice; when not understood, the point and
/// explanation are added if given
fn feedback_rows(request: &SubmitInputsRequest) -> Vec<NewFeedback> {
    let mut rows = vec![NewFeedback::new(
        FEEDBACK_FIELD_UNDERSTOOD,
        request.mengerti_poin.to_string(),
    )];

    if !request.mengerti_poin {
        let extra = [
            (
                FEEDBACK_FIELD_NOT_UNDERSTOOD_POINT,
                &request.tidak_mengerti_poin,
            ),
            (FEEDBACK_FIELD_EXPLANATION, &request.description_tidak_mengerti),
        ];
        for (field, value) in extra {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                rows.push(NewFeedback::new(field, value));
            }
        }
    }

    rows
}
