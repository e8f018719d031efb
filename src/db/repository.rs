//! Repository seams for the survey store and their PostgreSQL implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::DbError;
use super::models::{
    AssetRow, FeedbackRow, FormProgressRow, ProcessLinkRow, SubmissionRow, ThreatRow, UserRow,
};
use crate::model::{
    Asset, BusinessProcessLink, CatalogAsset, CatalogProcess, Feedback, FormProgress, FormStatus,
    RiskInput, Score, Submission, Threat, ThreatKind, UnderstandLevel, User,
};

/// A feedback row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub field: String,
    pub value: String,
}

impl NewFeedback {
    pub fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Everything written when a submission completes; stored all-or-nothing
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAssessment {
    pub risk_input: RiskInput,
    pub score: Score,
    pub understand: UnderstandLevel,
    pub feedback: Vec<NewFeedback>,
}

/// Read access to assets and threats, plus catalog ingestion
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All assets with their threats, ordered by name
    async fn list_assets(&self) -> Result<Vec<Asset>, DbError>;

    async fn find_asset(&self, asset_id: i64) -> Result<Option<Asset>, DbError>;

    async fn find_threat(&self, threat_id: i64) -> Result<Option<Threat>, DbError>;

    async fn count_assets(&self) -> Result<i64, DbError>;

    /// Insert or update a catalog; threat kinds are resolved here from the names.
    /// Returns the number of threats written.
    async fn insert_catalog(
        &self,
        assets: &[CatalogAsset],
        processes: &[CatalogProcess],
    ) -> Result<usize, DbError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert a bare submission.
    ///
    /// Fails with `DbError::UniqueViolation` when one already exists for
    /// (user, asset, threat); the check is enforced by the store.
    async fn create(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<Submission, DbError>;

    async fn find_by_id(&self, submission_id: i64) -> Result<Option<Submission>, DbError>;

    async fn find_for_threat(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<Option<Submission>, DbError>;

    /// Write risk input, score, understanding and feedback in one unit.
    ///
    /// Fails with `DbError::UniqueViolation` if the submission already has a risk input,
    /// leaving the stored values unchanged.
    async fn complete(
        &self,
        submission_id: i64,
        assessment: &CompletedAssessment,
    ) -> Result<(), DbError>;

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Submission>, DbError>;

    async fn list_all(&self) -> Result<Vec<Submission>, DbError>;
}

#[async_trait]
pub trait FormProgressRepository: Send + Sync {
    async fn set_status(
        &self,
        user_id: i64,
        asset_id: i64,
        status: FormStatus,
    ) -> Result<(), DbError>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FormProgress>, DbError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_active_users(&self) -> Result<Vec<User>, DbError>;

    /// Every user, active or not, ordered by id
    async fn list_users(&self) -> Result<Vec<User>, DbError>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, DbError>;

    /// Resolve an API token by its SHA-256 hex digest
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DbError>;
}

const SUBMISSION_SELECT: &str = r#"
    SELECT
        s.id, s.user_id, s.asset_id, s.threat_id, s.submitted_at, s.understand,
        ri.biaya_pengetahuan, ri.pengaruh_kerugian, ri.frekuensi_serangan, ri.pemulihan,
        sc.peluang, sc.impact, sc.total, sc.category, sc.threat_description
    FROM submissions s
    LEFT JOIN risk_inputs ri ON ri.submission_id = s.id
    LEFT JOIN scores sc ON sc.submission_id = s.id
"#;

/// PostgreSQL-backed store implementing every repository seam
#[derive(Clone)]
pub struct PgSurveyRepository {
    pool: PgPool,
}

impl PgSurveyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load assets (optionally a single one) with their threats and process links
    async fn load_assets(&self, asset_id: Option<i64>) -> Result<Vec<Asset>, DbError> {
        let assets: Vec<AssetRow> = sqlx::query_as(
            r#"
            SELECT id, name, description FROM assets
            WHERE $1::BIGINT IS NULL OR id = $1
            ORDER BY name
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let asset_ids: Vec<i64> = assets.iter().map(|a| a.id).collect();

        let threats: Vec<ThreatRow> = sqlx::query_as(
            r#"
            SELECT id, asset_id, name, description, kind FROM threats
            WHERE asset_id = ANY($1)
            ORDER BY name, id
            "#,
        )
        .bind(&asset_ids)
        .fetch_all(&self.pool)
        .await?;

        let threat_ids: Vec<i64> = threats.iter().map(|t| t.id).collect();
        let mut links = self.load_process_links(&threat_ids).await?;

        let mut threats_by_asset: HashMap<i64, Vec<Threat>> = HashMap::new();
        for row in threats {
            let processes = links.remove(&row.id).unwrap_or_default();
            threats_by_asset
                .entry(row.asset_id)
                .or_default()
                .push(row.into_domain(processes));
        }

        Ok(assets
            .into_iter()
            .map(|row| {
                let threats = threats_by_asset.remove(&row.id).unwrap_or_default();
                row.into_domain(threats)
            })
            .collect())
    }

    async fn load_process_links(
        &self,
        threat_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<BusinessProcessLink>>, DbError> {
        let rows: Vec<ProcessLinkRow> = sqlx::query_as(
            r#"
            SELECT tbp.threat_id, tbp.business_process_id, bp.name, tbp.explanation
            FROM threat_business_processes tbp
            JOIN business_processes bp ON bp.id = tbp.business_process_id
            WHERE tbp.threat_id = ANY($1)
            ORDER BY bp.name
            "#,
        )
        .bind(threat_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut links: HashMap<i64, Vec<BusinessProcessLink>> = HashMap::new();
        for row in rows {
            links.entry(row.threat_id).or_default().push(row.into_domain());
        }
        Ok(links)
    }

    /// Attach feedback rows to submission rows
    async fn hydrate(&self, rows: Vec<SubmissionRow>) -> Result<Vec<Submission>, DbError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let feedback_rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"
            SELECT id, submission_id, field, value, created_at FROM feedback
            WHERE submission_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut feedback: HashMap<i64, Vec<Feedback>> = HashMap::new();
        for row in feedback_rows {
            feedback.entry(row.submission_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let entries = feedback.remove(&row.id).unwrap_or_default();
                row.into_domain(entries).map_err(DbError::Serialization)
            })
            .collect()
    }

    async fn upsert_process(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        description: Option<&str>,
    ) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO business_processes (name, description) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET
                description = COALESCE(EXCLUDED.description, business_processes.description)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl CatalogRepository for PgSurveyRepository {
    async fn list_assets(&self) -> Result<Vec<Asset>, DbError> {
        self.load_assets(None).await
    }

    async fn find_asset(&self, asset_id: i64) -> Result<Option<Asset>, DbError> {
        Ok(self.load_assets(Some(asset_id)).await?.into_iter().next())
    }

    async fn find_threat(&self, threat_id: i64) -> Result<Option<Threat>, DbError> {
        let row: Option<ThreatRow> = sqlx::query_as(
            "SELECT id, asset_id, name, description, kind FROM threats WHERE id = $1",
        )
        .bind(threat_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut links = self.load_process_links(&[row.id]).await?;
                let processes = links.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_domain(processes)))
            }
            None => Ok(None),
        }
    }

    async fn count_assets(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_catalog(
        &self,
        assets: &[CatalogAsset],
        processes: &[CatalogProcess],
    ) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut process_ids: HashMap<String, i64> = HashMap::new();

        for process in processes {
            let id =
                Self::upsert_process(&mut tx, &process.name, process.description.as_deref())
                    .await?;
            process_ids.insert(process.name.clone(), id);
        }

        let mut threat_count = 0;
        for asset in assets {
            let asset_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO assets (name, description) VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
                RETURNING id
                "#,
            )
            .bind(&asset.name)
            .bind(&asset.description)
            .fetch_one(&mut *tx)
            .await?;

            for threat in &asset.threats {
                let kind = ThreatKind::classify(&threat.name);
                let threat_id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO threats (asset_id, name, description, kind) VALUES ($1, $2, $3, $4)
                    ON CONFLICT (asset_id, name) DO UPDATE SET
                        description = EXCLUDED.description,
                        kind = EXCLUDED.kind
                    RETURNING id
                    "#,
                )
                .bind(asset_id)
                .bind(&threat.name)
                .bind(&threat.description)
                .bind(kind.as_str())
                .fetch_one(&mut *tx)
                .await?;
                threat_count += 1;

                for link in &threat.business_processes {
                    let process_id = match process_ids.get(&link.name) {
                        Some(id) => *id,
                        None => {
                            let id = Self::upsert_process(&mut tx, &link.name, None).await?;
                            process_ids.insert(link.name.clone(), id);
                            id
                        }
                    };

                    sqlx::query(
                        r#"
                        INSERT INTO threat_business_processes (threat_id, business_process_id, explanation)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (threat_id, business_process_id) DO UPDATE SET
                            explanation = EXCLUDED.explanation
                        "#,
                    )
                    .bind(threat_id)
                    .bind(process_id)
                    .bind(&link.explanation)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            assets = assets.len(),
            threats = threat_count,
            processes = process_ids.len(),
            "Catalog written"
        );
        Ok(threat_count)
    }
}

#[async_trait]
impl SubmissionRepository for PgSurveyRepository {
    async fn create(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<Submission, DbError> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO submissions (user_id, asset_id, threat_id, submitted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, asset_id, threat_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(asset_id)
        .bind(threat_id)
        .bind(submitted_at)
        .fetch_optional(&self.pool)
        .await?;

        let id = id.ok_or_else(|| {
            DbError::UniqueViolation(format!(
                "submission for user {} asset {} threat {}",
                user_id, asset_id, threat_id
            ))
        })?;

        tracing::debug!(submission_id = id, user_id, asset_id, threat_id, "Inserted submission");

        Ok(Submission {
            id,
            user_id,
            asset_id,
            threat_id,
            submitted_at,
            understand: None,
            risk_input: None,
            score: None,
            feedback: Vec::new(),
        })
    }

    async fn find_by_id(&self, submission_id: i64) -> Result<Option<Submission>, DbError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!("{} WHERE s.id = $1", SUBMISSION_SELECT))
            .bind(submission_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn find_for_threat(
        &self,
        user_id: i64,
        asset_id: i64,
        threat_id: i64,
    ) -> Result<Option<Submission>, DbError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "{} WHERE s.user_id = $1 AND s.asset_id = $2 AND s.threat_id = $3",
            SUBMISSION_SELECT
        ))
        .bind(user_id)
        .bind(asset_id)
        .bind(threat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn complete(
        &self,
        submission_id: i64,
        assessment: &CompletedAssessment,
    ) -> Result<(), DbError> {
        let description = assessment
            .score
            .threat_description
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let input = &assessment.risk_input;
        sqlx::query(
            r#"
            INSERT INTO risk_inputs (
                submission_id, biaya_pengetahuan, pengaruh_kerugian, frekuensi_serangan, pemulihan
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(submission_id)
        .bind(input.f)
        .bind(input.g)
        .bind(input.h)
        .bind(input.i)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, format!("risk input for submission {}", submission_id)))?;

        let risk = &assessment.score.risk;
        sqlx::query(
            r#"
            INSERT INTO scores (submission_id, peluang, impact, total, category, threat_description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(submission_id)
        .bind(risk.peluang)
        .bind(risk.impact)
        .bind(risk.total)
        .bind(risk.category.as_str())
        .bind(description)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, format!("score for submission {}", submission_id)))?;

        sqlx::query("UPDATE submissions SET understand = $2 WHERE id = $1")
            .bind(submission_id)
            .bind(assessment.understand.as_str())
            .execute(&mut *tx)
            .await?;

        for entry in &assessment.feedback {
            sqlx::query("INSERT INTO feedback (submission_id, field, value) VALUES ($1, $2, $3)")
                .bind(submission_id)
                .bind(&entry.field)
                .bind(&entry.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(submission_id, "Stored risk input and score");
        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Submission>, DbError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "{} WHERE s.user_id = $1 ORDER BY s.submitted_at, s.id",
            SUBMISSION_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list_all(&self) -> Result<Vec<Submission>, DbError> {
        let rows: Vec<SubmissionRow> =
            sqlx::query_as(&format!("{} ORDER BY s.submitted_at DESC, s.id", SUBMISSION_SELECT))
                .fetch_all(&self.pool)
                .await?;

        self.hydrate(rows).await
    }
}

#[async_trait]
impl FormProgressRepository for PgSurveyRepository {
    async fn set_status(
        &self,
        user_id: i64,
        asset_id: i64,
        status: FormStatus,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO form_progress (user_id, asset_id, status, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, asset_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(asset_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FormProgress>, DbError> {
        let rows: Vec<FormProgressRow> = sqlx::query_as(
            "SELECT user_id, asset_id, status FROM form_progress WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(DbError::Serialization))
            .collect()
    }
}

#[async_trait]
impl UserRepository for PgSurveyRepository {
    async fn list_active_users(&self) -> Result<Vec<User>, DbError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, email, name, is_active FROM users WHERE is_active ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, email, name, is_active FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, name, is_active FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.name, u.is_active
            FROM api_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
