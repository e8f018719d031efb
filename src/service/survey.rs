//! Survey use cases consumed by the HTTP layer

use std::sync::Arc;

use crate::db::repository::{CatalogRepository, UserRepository};
use crate::model::analytics::{AssetRef, ThreatRef, UserRef};
use crate::model::progress::{UmkmProgress, UserProgress};
use crate::model::submission::{
    AssessmentScores, BatchSubmissionRequest, BatchSubmissionResponse, ScoreResponse,
    SubmissionDetails, SubmissionSummary, SubmitInputsRequest, ThreatAssessmentResponse,
    ThreatGuidance,
};
use crate::model::{AssetSummary, Threat};
use crate::service::error::SurveyError;
use crate::service::progress::ProgressAggregator;
use crate::service::submission::SubmissionTracker;

/// Sequences the tracker and aggregator; holds no state of its own
pub struct SurveyService {
    catalog: Arc<dyn CatalogRepository>,
    users: Arc<dyn UserRepository>,
    tracker: SubmissionTracker,
    aggregator: ProgressAggregator,
}

impl SurveyService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        users: Arc<dyn UserRepository>,
        tracker: SubmissionTracker,
        aggregator: ProgressAggregator,
    ) -> Self {
        Self {
            catalog,
            users,
            tracker,
            aggregator,
        }
    }

    pub async fn list_assets(&self) -> Result<Vec<AssetSummary>, SurveyError> {
        let assets = self.catalog.list_assets().await?;
        Ok(assets.iter().map(AssetSummary::from).collect())
    }

    pub async fn asset_threats(&self, asset_id: i64) -> Result<Vec<Threat>, SurveyError> {
        self.catalog
            .find_asset(asset_id)
            .await?
            .map(|asset| asset.threats)
            .ok_or_else(|| SurveyError::asset_not_found(asset_id))
    }

    pub async fn create_submission(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<i64, SurveyError> {
        self.tracker
            .create_submission(user_id, asset_id, threat_id)
            .await
    }

    pub async fn submit_inputs(
        &self,
        user_id: i64,
        submission_id: i64,
        request: &SubmitInputsRequest,
    ) -> Result<ScoreResponse, SurveyError> {
        self.tracker
            .submit_inputs(user_id, submission_id, request)
            .await
    }

    pub async fn get_score(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<ScoreResponse, SurveyError> {
        self.tracker.get_score(user_id, submission_id).await
    }

    pub async fn submit_batch(
        &self,
        user_id: i64,
        request: &BatchSubmissionRequest,
    ) -> Result<BatchSubmissionResponse, SurveyError> {
        self.tracker.submit_batch(user_id, request).await
    }

    /// Assess one threat in a single call.
    ///
    /// Reuses a bare submission left by opening the form; a completed one is a duplicate.
    pub async fn assess_threat(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
        request: &SubmitInputsRequest,
    ) -> Result<ThreatAssessmentResponse, SurveyError> {
        self.tracker.resolve_threat(asset_id, threat_id).await?;

        let submission_id = match self
            .tracker
            .existing_submission(user_id, asset_id, threat_id)
            .await?
        {
            Some(existing) if existing.is_completed() => {
                return Err(SurveyError::DuplicateResource(format!(
                    "Threat {} has already been assessed (submission {})",
                    threat_id, existing.id
                )));
            }
            Some(bare) => {
                tracing::debug!(submission_id = bare.id, "Reusing bare submission");
                bare.id
            }
            None => {
                self.tracker
                    .create_submission(user_id, asset_id, threat_id)
                    .await?
            }
        };

        let score = self
            .tracker
            .submit_inputs(user_id, submission_id, request)
            .await?;
        let submission = self.tracker.owned_submission(user_id, submission_id).await?;

        Ok(ThreatAssessmentResponse {
            submission_id,
            asset_id,
            threat_id,
            scores: AssessmentScores {
                peluang: score.peluang,
                impact: score.impact,
                total: score.total,
                category: score.category,
            },
            threat_description: score.threat_description,
            submitted_at: submission.submitted_at,
        })
    }

    pub async fn list_submissions(
        &self,
        user_id: i64,
    ) -> Result<Vec<SubmissionSummary>, SurveyError> {
        let submissions = self.tracker.list_submissions(user_id).await?;

        Ok(submissions
            .into_iter()
            .map(|s| SubmissionSummary {
                submission_id: s.id,
                asset_id: s.asset_id,
                threat_id: s.threat_id,
                state: s.state(),
                submitted_at: s.submitted_at,
                score: s
                    .score
                    .map(|score| ScoreResponse::new(score.risk, score.threat_description)),
            })
            .collect())
    }

    /// One of the caller's submissions with its asset, threat, score and feedback
    pub async fn submission_details(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<SubmissionDetails, SurveyError> {
        let submission = self.tracker.owned_submission(user_id, submission_id).await?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| SurveyError::ResourceNotFound(format!("User {}", user_id)))?;
        let asset = self
            .catalog
            .find_asset(submission.asset_id)
            .await?
            .ok_or_else(|| SurveyError::asset_not_found(submission.asset_id))?;
        let threat = asset
            .threat(submission.threat_id)
            .ok_or_else(|| SurveyError::threat_not_found(submission.threat_id))?;

        let state = submission.state();
        let (risk_score, threat_description) = match submission.score {
            Some(score) => (
                Some(AssessmentScores::from(score.risk)),
                score.threat_description.map(ThreatGuidance::from),
            ),
            None => (None, None),
        };

        Ok(SubmissionDetails {
            id: submission.id,
            submitted_at: submission.submitted_at,
            state,
            user: UserRef::from(&user),
            asset: AssetRef {
                id: asset.id,
                name: asset.name.clone(),
                description: asset.description.clone(),
            },
            threat: ThreatRef {
                id: threat.id,
                name: threat.name.clone(),
            },
            risk_score,
            threat_description,
            feedback: (!submission.feedback.is_empty()).then_some(submission.feedback),
        })
    }

    pub async fn user_progress(&self, user_id: i64) -> Result<UserProgress, SurveyError> {
        self.aggregator.user_progress(user_id).await
    }

    pub async fn all_user_progress(&self) -> Result<Vec<UmkmProgress>, SurveyError> {
        self.aggregator.all_users().await
    }
}
