//! Progress aggregation
//!
//! Folds submission and form-progress state into per-asset and per-user
//! summaries. Read-only: form status is written by the submission tracker.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::{
    CatalogRepository, FormProgressRepository, SubmissionRepository, UserRepository,
};
use crate::model::progress::{
    AssetProgress, AssetStatus, ProgressSummary, ThreatProgress, ThreatStatus, UmkmProgress,
    UserProgress,
};
use crate::model::{Asset, FormProgress, FormStatus, Submission};
use crate::service::error::SurveyError;

/// Status of an asset for one user from its threat completion counts.
///
/// Partial completion is `InProgress`; this is the only place the rule lives.
pub fn asset_status(total_threats: usize, completed_threats: usize) -> AssetStatus {
    if completed_threats == 0 {
        AssetStatus::NotStarted
    } else if total_threats > 0 && completed_threats >= total_threats {
        AssetStatus::Completed
    } else {
        AssetStatus::InProgress
    }
}

/// round(completed / total * 100), 0 when there is nothing to complete
pub fn progress_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Threats of `asset` with a completed submission among `submissions`
pub fn completed_threats(asset: &Asset, submissions: &[Submission]) -> usize {
    asset
        .threats
        .iter()
        .filter(|threat| {
            submissions
                .iter()
                .any(|s| s.asset_id == asset.id && s.threat_id == threat.id && s.is_completed())
        })
        .count()
}

/// Overall summary from the user's form statuses
pub fn summarize(total_assets: usize, forms: &[FormProgress]) -> ProgressSummary {
    let completed_assets = forms
        .iter()
        .filter(|f| f.status == FormStatus::Submitted)
        .count();
    let in_progress_assets = forms
        .iter()
        .filter(|f| f.status == FormStatus::InProgress)
        .count();

    ProgressSummary {
        total_assets,
        completed_assets,
        in_progress_assets,
        not_started_assets: total_assets.saturating_sub(completed_assets + in_progress_assets),
        progress_percentage: progress_percentage(completed_assets, total_assets),
    }
}

fn asset_progress(asset: &Asset, submissions: &HashMap<(i64, i64), &Submission>) -> AssetProgress {
    let threats: Vec<ThreatProgress> = asset
        .threats
        .iter()
        .map(|threat| {
            let submission = submissions.get(&(asset.id, threat.id));
            let status = match submission {
                Some(s) if s.is_completed() => ThreatStatus::Completed,
                _ => ThreatStatus::NotStarted,
            };
            ThreatProgress {
                threat_id: threat.id,
                threat_name: threat.name.clone(),
                status,
                submission_id: submission.map(|s| s.id),
            }
        })
        .collect();

    let completed = threats
        .iter()
        .filter(|t| t.status == ThreatStatus::Completed)
        .count();

    AssetProgress {
        asset_id: asset.id,
        asset_name: asset.name.clone(),
        status: asset_status(threats.len(), completed),
        completed_threats: completed,
        total_threats: threats.len(),
        threats,
    }
}

pub struct ProgressAggregator {
    catalog: Arc<dyn CatalogRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    progress: Arc<dyn FormProgressRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProgressAggregator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        progress: Arc<dyn FormProgressRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            catalog,
            submissions,
            progress,
            users,
        }
    }

    /// Detailed progress of one user across every asset, in asset id order
    pub async fn user_progress(&self, user_id: i64) -> Result<UserProgress, SurveyError> {
        let mut assets = self.catalog.list_assets().await?;
        assets.sort_by_key(|asset| asset.id);
        let submissions = self.submissions.list_by_user(user_id).await?;
        let forms = self.progress.list_for_user(user_id).await?;

        let by_threat: HashMap<(i64, i64), &Submission> = submissions
            .iter()
            .map(|s| ((s.asset_id, s.threat_id), s))
            .collect();

        let asset_progress: Vec<AssetProgress> = assets
            .iter()
            .map(|asset| asset_progress(asset, &by_threat))
            .collect();

        let summary = summarize(assets.len(), &forms);

        tracing::debug!(
            user_id,
            completed = summary.completed_assets,
            total = summary.total_assets,
            "Computed user progress"
        );

        Ok(UserProgress {
            summary,
            asset_progress,
        })
    }

    /// Summary per active user, for the admin view
    pub async fn all_users(&self) -> Result<Vec<UmkmProgress>, SurveyError> {
        let total_assets = self.catalog.count_assets().await?.max(0) as usize;
        let users = self.users.list_active_users().await?;

        let mut result = Vec::with_capacity(users.len());
        for user in users {
            let forms = self.progress.list_for_user(user.id).await?;
            result.push(UmkmProgress {
                id: user.id,
                email: user.email,
                name: user.name,
                summary: summarize(total_assets, &forms),
            });
        }

        Ok(result)
    }
}
