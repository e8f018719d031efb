use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A category of business data being assessed (e.g. "Database Pelanggan")
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Threats scoped to this asset, ordered by name
    pub threats: Vec<Threat>,
}

impl Asset {
    pub fn owns_threat(&self, threat_id: i64) -> bool {
        self.threats.iter().any(|t| t.id == threat_id)
    }

    pub fn threat(&self, threat_id: i64) -> Option<&Threat> {
        self.threats.iter().find(|t| t.id == threat_id)
    }
}

/// Catalog listing entry
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub threat_count: usize,
}

impl From<&Asset> for AssetSummary {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id,
            name: asset.name.clone(),
            description: asset.description.clone(),
            threat_count: asset.threats.len(),
        }
    }
}

/// An attack scenario scoped to exactly one asset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    pub id: i64,
    pub asset_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: ThreatKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business_processes: Vec<BusinessProcessLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProcessLink {
    pub business_process_id: i64,
    pub name: String,
    pub explanation: Option<String>,
}

// Threat-name normalisation: lowercase, drop punctuation, whitespace runs to underscores.
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Threat category used to look up description templates.
///
/// Resolved once from the threat name when a threat is ingested and stored
/// alongside it, so lookups never depend on string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    Ddos,
    Phishing,
    Malware,
    Ransomware,
    BruteForce,
    AccountTakeover,
    DataLeakage,
    UnauthorizedAccess,
    SocialEngineering,
    SupplyChainCompromise,
    ThirdPartyCompromise,
    CredentialStuffing,
    BusinessEmailCompromise,
    PaymentFraud,
    WebInjection,
    Defacement,
    PrivilegeEscalation,
    ManInTheMiddle,
    BackupTampering,
    IncompleteBackup,
    Other,
}

impl ThreatKind {
    /// Known lookup keys; anything else is `Other`
    const KEYS: &'static [(&'static str, ThreatKind)] = &[
        ("ddos", ThreatKind::Ddos),
        ("distributed_denial_of_service", ThreatKind::Ddos),
        ("phishing", ThreatKind::Phishing),
        ("malware", ThreatKind::Malware),
        ("ransomware", ThreatKind::Ransomware),
        ("brute_force", ThreatKind::BruteForce),
        ("account_takeover", ThreatKind::AccountTakeover),
        ("data_leakage", ThreatKind::DataLeakage),
        ("unauthorized_access", ThreatKind::UnauthorizedAccess),
        ("social_engineering", ThreatKind::SocialEngineering),
        ("supply_chain_compromise", ThreatKind::SupplyChainCompromise),
        ("supplychain_compromise", ThreatKind::SupplyChainCompromise),
        ("third_party_compromise", ThreatKind::ThirdPartyCompromise),
        ("credential_stuffing", ThreatKind::CredentialStuffing),
        ("business_email_compromise", ThreatKind::BusinessEmailCompromise),
        ("payment_fraud", ThreatKind::PaymentFraud),
        ("web_injection", ThreatKind::WebInjection),
        ("defacement", ThreatKind::Defacement),
        ("privilege_escalation", ThreatKind::PrivilegeEscalation),
        ("man_in_the_middle", ThreatKind::ManInTheMiddle),
        ("backup_tampering", ThreatKind::BackupTampering),
        ("incomplete_backup", ThreatKind::IncompleteBackup),
    ];

    /// Normalise a threat name into its lookup key
    pub fn normalize_name(name: &str) -> String {
        let lower = name.to_lowercase();
        let stripped = NON_ALPHANUMERIC.replace_all(&lower, "");
        WHITESPACE.replace_all(&stripped, "_").into_owned()
    }

    /// Resolve the kind for a threat name by exact key ("DDoS" -> `Ddos`,
    /// "DDoS Attack" -> `Other`)
    pub fn classify(name: &str) -> Self {
        let key = Self::normalize_name(name);
        Self::KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, kind)| *kind)
            .unwrap_or(ThreatKind::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatKind::Ddos => "ddos",
            ThreatKind::Phishing => "phishing",
            ThreatKind::Malware => "malware",
            ThreatKind::Ransomware => "ransomware",
            ThreatKind::BruteForce => "brute_force",
            ThreatKind::AccountTakeover => "account_takeover",
            ThreatKind::DataLeakage => "data_leakage",
            ThreatKind::UnauthorizedAccess => "unauthorized_access",
            ThreatKind::SocialEngineering => "social_engineering",
            ThreatKind::SupplyChainCompromise => "supply_chain_compromise",
            ThreatKind::ThirdPartyCompromise => "third_party_compromise",
            ThreatKind::CredentialStuffing => "credential_stuffing",
            ThreatKind::BusinessEmailCompromise => "business_email_compromise",
            ThreatKind::PaymentFraud => "payment_fraud",
            ThreatKind::WebInjection => "web_injection",
            ThreatKind::Defacement => "defacement",
            ThreatKind::PrivilegeEscalation => "privilege_escalation",
            ThreatKind::ManInTheMiddle => "man_in_the_middle",
            ThreatKind::BackupTampering => "backup_tampering",
            ThreatKind::IncompleteBackup => "incomplete_backup",
            ThreatKind::Other => "other",
        }
    }

    /// Parse the stored column value; unknown values map to `Other`
    pub fn from_db(value: &str) -> Self {
        Self::KEYS
            .iter()
            .map(|(_, kind)| *kind)
            .find(|kind| kind.as_str() == value)
            .unwrap_or(ThreatKind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "LOW",
            RiskCategory::Medium => "MEDIUM",
            RiskCategory::High => "HIGH",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(RiskCategory::Low),
            "MEDIUM" => Some(RiskCategory::Medium),
            "HIGH" => Some(RiskCategory::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the respondent understood the threat explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnderstandLevel {
    Mengerti,
    TidakMengerti,
}

impl UnderstandLevel {
    pub fn from_flag(understood: bool) -> Self {
        if understood {
            UnderstandLevel::Mengerti
        } else {
            UnderstandLevel::TidakMengerti
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnderstandLevel::Mengerti => "MENGERTI",
            UnderstandLevel::TidakMengerti => "TIDAK_MENGERTI",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "MENGERTI" => Some(UnderstandLevel::Mengerti),
            "TIDAK_MENGERTI" => Some(UnderstandLevel::TidakMengerti),
            _ => None,
        }
    }
}

/// Per (user, asset) form status, owned by the submission tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    NotStarted,
    InProgress,
    Submitted,
}

impl FormStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::NotStarted => "NOT_STARTED",
            FormStatus::InProgress => "IN_PROGRESS",
            FormStatus::Submitted => "SUBMITTED",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "NOT_STARTED" => Some(FormStatus::NotStarted),
            "IN_PROGRESS" => Some(FormStatus::InProgress),
            "SUBMITTED" => Some(FormStatus::Submitted),
            _ => None,
        }
    }
}

/// The four raw ordinal answers for one threat assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RiskInput {
    /// Biaya & pengetahuan (1-6)
    pub f: i32,
    /// Pengaruh & kerugian (1-6)
    pub g: i32,
    /// Frekuensi serangan (1-6)
    pub h: i32,
    /// Pemulihan (2, 4 or 6)
    pub i: i32,
}

/// Derived likelihood / impact / total / category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RiskScore {
    pub peluang: f64,
    pub impact: f64,
    pub total: i32,
    pub category: RiskCategory,
}

/// Threat-specific explanation attached to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreatDescription {
    pub category: RiskCategory,
    pub threat_name: String,
    pub description: String,
    pub recommendations: Vec<String>,
    pub priority: RiskCategory,
    pub action_required: bool,
}

/// Persisted score: the calculator output plus its description payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub risk: RiskScore,
    pub threat_description: Option<ThreatDescription>,
}

/// Free-form note attached to a submission, keyed by field name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub submission_id: i64,
    pub field: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    /// Bare submission, no inputs yet
    Created,
    /// Risk input and score written; terminal
    Completed,
}

/// One user's assessment of one threat, with its optional input and score
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub asset_id: i64,
    pub threat_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub understand: Option<UnderstandLevel>,
    pub risk_input: Option<RiskInput>,
    pub score: Option<Score>,
    pub feedback: Vec<Feedback>,
}

impl Submission {
    pub fn state(&self) -> SubmissionState {
        if self.risk_input.is_some() && self.score.is_some() {
            SubmissionState::Completed
        } else {
            SubmissionState::Created
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state() == SubmissionState::Completed
    }
}

/// Respondent account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormProgress {
    pub user_id: i64,
    pub asset_id: i64,
    pub status: FormStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(ThreatKind::normalize_name("DDoS Attack"), "ddos_attack");
        assert_eq!(ThreatKind::normalize_name("Man-in-the-Middle"), "maninthemiddle");
        assert_eq!(
            ThreatKind::normalize_name("Supply Chain   Compromise!"),
            "supply_chain_compromise"
        );
        assert_eq!(ThreatKind::normalize_name(" Phishing"), "_phishing");
    }

    #[test]
    fn test_classify_by_exact_key() {
        assert_eq!(ThreatKind::classify("Phishing"), ThreatKind::Phishing);
        assert_eq!(ThreatKind::classify("DDoS"), ThreatKind::Ddos);
        assert_eq!(
            ThreatKind::classify("Distributed Denial of Service"),
            ThreatKind::Ddos
        );
        assert_eq!(ThreatKind::classify("Brute Force"), ThreatKind::BruteForce);
        assert_eq!(
            ThreatKind::classify("Supplychain Compromise"),
            ThreatKind::SupplyChainCompromise
        );
        assert_eq!(
            ThreatKind::classify("Man in the Middle"),
            ThreatKind::ManInTheMiddle
        );
    }

    #[test]
    fn test_classify_names_without_a_key_are_other() {
        for name in [
            "DDoS Attack",
            "Phishing Attack",
            "SQL Injection",
            "Data Breach",
            "Man-in-the-Middle",
            "Malware pada POS",
            "Tax Evasion",
        ] {
            assert_eq!(ThreatKind::classify(name), ThreatKind::Other, "{}", name);
        }
    }

    #[test]
    fn test_threat_kind_db_round_trip_for_stored_values() {
        assert_eq!(ThreatKind::from_db("brute_force"), ThreatKind::BruteForce);
        assert_eq!(ThreatKind::from_db("other"), ThreatKind::Other);
        assert_eq!(ThreatKind::from_db("garbage"), ThreatKind::Other);
    }

    #[test]
    fn test_submission_state() {
        let mut submission = Submission {
            id: 1,
            user_id: 1,
            asset_id: 1,
            threat_id: 1,
            submitted_at: Utc::now(),
            understand: None,
            risk_input: None,
            score: None,
            feedback: vec![],
        };
        assert_eq!(submission.state(), SubmissionState::Created);

        submission.risk_input = Some(RiskInput { f: 1, g: 1, h: 1, i: 2 });
        submission.score = Some(Score {
            risk: RiskScore {
                peluang: 1.1667,
                impact: 1.5,
                total: 2,
                category: RiskCategory::Low,
            },
            threat_description: None,
        });
        assert!(submission.is_completed());
    }
}
