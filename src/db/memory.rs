//! In-memory store used by service and API tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DbError;
use super::repository::{
    CatalogRepository, CompletedAssessment, FormProgressRepository, SubmissionRepository,
    UserRepository,
};
use crate::model::{
    Asset, BusinessProcessLink, CatalogAsset, CatalogProcess, Feedback, FormProgress, FormStatus,
    Submission, Threat, ThreatKind, User,
};
use crate::service::auth::hash_token;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    assets: Vec<Asset>,
    processes: HashMap<String, i64>,
    submissions: BTreeMap<i64, Submission>,
    progress: HashMap<(i64, i64), FormStatus>,
    users: Vec<User>,
    tokens: HashMap<String, i64>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn process_id(&mut self, name: &str) -> i64 {
        if let Some(id) = self.processes.get(name) {
            return *id;
        }
        let id = self.next_id();
        self.processes.insert(name.to_string(), id);
        id
    }

    fn insert_catalog(&mut self, assets: &[CatalogAsset], processes: &[CatalogProcess]) -> usize {
        for process in processes {
            self.process_id(&process.name);
        }

        let mut written = 0;
        for catalog_asset in assets {
            let asset_id = match self.assets.iter().find(|a| a.name == catalog_asset.name) {
                Some(existing) => existing.id,
                None => {
                    let id = self.next_id();
                    self.assets.push(Asset {
                        id,
                        name: catalog_asset.name.clone(),
                        description: catalog_asset.description.clone(),
                        threats: Vec::new(),
                    });
                    id
                }
            };

            let mut threats = Vec::new();
            for catalog_threat in &catalog_asset.threats {
                let business_processes = catalog_threat
                    .business_processes
                    .iter()
                    .map(|link| BusinessProcessLink {
                        business_process_id: self.process_id(&link.name),
                        name: link.name.clone(),
                        explanation: link.explanation.clone(),
                    })
                    .collect();

                threats.push(Threat {
                    id: self.next_id(),
                    asset_id,
                    name: catalog_threat.name.clone(),
                    description: catalog_threat.description.clone(),
                    kind: ThreatKind::classify(&catalog_threat.name),
                    business_processes,
                });
                written += 1;
            }

            if let Some(asset) = self.assets.iter_mut().find(|a| a.id == asset_id) {
                asset.threats.extend(threats);
                asset.threats.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }

        written
    }
}

/// Mutex-guarded store; every trait call is atomic with respect to the others
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the given assets, each with the named threats
    pub fn with_assets(assets: &[(&str, &[&str])]) -> Self {
        let repo = Self::new();
        let catalog: Vec<CatalogAsset> = assets
            .iter()
            .map(|(name, threats)| CatalogAsset {
                name: name.to_string(),
                description: None,
                threats: threats
                    .iter()
                    .map(|t| crate::model::CatalogThreat {
                        name: t.to_string(),
                        description: None,
                        business_processes: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        repo.state.lock().unwrap().insert_catalog(&catalog, &[]);
        repo
    }

    pub fn add_user(&self, email: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.users.push(User {
            id,
            email: email.to_string(),
            name: None,
            is_active: true,
        });
        id
    }

    pub fn set_user_name(&self, user_id: i64, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.name = Some(name.to_string());
        }
    }

    pub fn add_token(&self, user_id: i64, token: &str) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert(hash_token(token), user_id);
    }

    pub fn deactivate_user(&self, user_id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = false;
        }
    }

    pub fn asset_by_name(&self, name: &str) -> Asset {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .unwrap()
    }

    pub fn status(&self, user_id: i64, asset_id: i64) -> Option<FormStatus> {
        self.state
            .lock()
            .unwrap()
            .progress
            .get(&(user_id, asset_id))
            .copied()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn list_assets(&self) -> Result<Vec<Asset>, DbError> {
        let mut assets = self.state.lock().unwrap().assets.clone();
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(assets)
    }

    async fn find_asset(&self, asset_id: i64) -> Result<Option<Asset>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state.assets.iter().find(|a| a.id == asset_id).cloned())
    }

    async fn find_threat(&self, threat_id: i64) -> Result<Option<Threat>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .iter()
            .flat_map(|a| a.threats.iter())
            .find(|t| t.id == threat_id)
            .cloned())
    }

    async fn count_assets(&self) -> Result<i64, DbError> {
        Ok(self.state.lock().unwrap().assets.len() as i64)
    }

    async fn insert_catalog(
        &self,
        assets: &[CatalogAsset],
        processes: &[CatalogProcess],
    ) -> Result<usize, DbError> {
        Ok(self.state.lock().unwrap().insert_catalog(assets, processes))
    }
}

#[async_trait]
impl SubmissionRepository for MemoryRepository {
    async fn create(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<Submission, DbError> {
        let mut state = self.state.lock().unwrap();

        let exists = state.submissions.values().any(|s| {
            s.user_id == user_id && s.asset_id == asset_id && s.threat_id == threat_id
        });
        if exists {
            return Err(DbError::UniqueViolation(format!(
                "submission for user {} asset {} threat {}",
                user_id, asset_id, threat_id
            )));
        }

        let submission = Submission {
            id: state.next_id(),
            user_id,
            asset_id,
            threat_id,
            submitted_at,
            understand: None,
            risk_input: None,
            score: None,
            feedback: Vec::new(),
        };
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, submission_id: i64) -> Result<Option<Submission>, DbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .get(&submission_id)
            .cloned())
    }

    async fn find_for_threat(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<Option<Submission>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .submissions
            .values()
            .find(|s| s.user_id == user_id && s.asset_id == asset_id && s.threat_id == threat_id)
            .cloned())
    }

    async fn complete(
        &self,
        submission_id: i64,
        assessment: &CompletedAssessment,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();

        let mut feedback_ids = Vec::with_capacity(assessment.feedback.len());
        for _ in &assessment.feedback {
            feedback_ids.push(state.next_id());
        }

        let submission = state
            .submissions
            .get_mut(&submission_id)
            .ok_or_else(|| DbError::NotFound(format!("submission {}", submission_id)))?;

        if submission.risk_input.is_some() {
            return Err(DbError::UniqueViolation(format!(
                "risk input for submission {}",
                submission_id
            )));
        }

        let now = Utc::now();
        submission.risk_input = Some(assessment.risk_input);
        submission.score = Some(assessment.score.clone());
        submission.understand = Some(assessment.understand);
        submission
            .feedback
            .extend(assessment.feedback.iter().zip(feedback_ids).map(|(entry, id)| {
                Feedback {
                    id,
                    submission_id,
                    field: entry.field.clone(),
                    value: entry.value.clone(),
                    created_at: now,
                }
            }));

        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Submission>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .submissions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, DbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .values()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FormProgressRepository for MemoryRepository {
    async fn set_status(
        &self,
        user_id: i64,
        asset_id: i64,
        status: FormStatus,
    ) -> Result<(), DbError> {
        self.state
            .lock()
            .unwrap()
            .progress
            .insert((user_id, asset_id), status);
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FormProgress>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .progress
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|((user_id, asset_id), status)| FormProgress {
                user_id: *user_id,
                asset_id: *asset_id,
                status: *status,
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn list_active_users(&self) -> Result<Vec<User>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().filter(|u| u.is_active).cloned().collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tokens
            .get(token_hash)
            .and_then(|user_id| state.users.iter().find(|u| u.id == *user_id))
            .cloned())
    }
}
