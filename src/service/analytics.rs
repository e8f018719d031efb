//! Admin analytics over all submissions

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};

use crate::db::repository::{CatalogRepository, SubmissionRepository, UserRepository};
use crate::model::analytics::{
    AnalyticsSummary, AssetAnalytics, AssetAnalyticsResponse, AssetRef, AssetStatistics,
    AverageScores, FeedbackEntry, FeedbackInsights, FeedbackListing, FeedbackQuery,
    FeedbackStats, FeedbackSubmission, FieldCount, HistoryItem, HistoryPage, HistoryQuery,
    RiskCategoryStats, SortOrder, ThreatRef, UnderstandStats, UnderstandingGap, UserAnalytics,
    UserAnalyticsResponse, UserRef, UserStatistics,
};
use crate::model::{Asset, Feedback, RiskCategory, Submission, Threat, UnderstandLevel, User};
use crate::service::error::SurveyError;

const MOST_COMMON_FIELDS: usize = 10;
const RECENT_FEEDBACK_DAYS: i64 = 30;
const MAX_PAGE_SIZE: u32 = 100;

pub struct AnalyticsService {
    catalog: Arc<dyn CatalogRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    users: Arc<dyn UserRepository>,
}

impl AnalyticsService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            catalog,
            submissions,
            users,
        }
    }

    pub async fn summary(&self) -> Result<AnalyticsSummary, SurveyError> {
        let submissions = self.submissions.list_all().await?;
        tracing::debug!(submissions = submissions.len(), "Computing analytics summary");
        Ok(summarize(&submissions))
    }

    /// Statistics per asset, in asset name order
    pub async fn asset_analytics(&self) -> Result<AssetAnalyticsResponse, SurveyError> {
        let assets = self.catalog.list_assets().await?;
        let submissions = self.submissions.list_all().await?;
        Ok(asset_breakdown(&assets, &submissions))
    }

    /// Statistics per registered user, active or not
    pub async fn user_analytics(&self) -> Result<UserAnalyticsResponse, SurveyError> {
        let users = self.users.list_users().await?;
        let submissions = self.submissions.list_all().await?;
        Ok(user_breakdown(&users, &submissions))
    }

    pub async fn feedback(&self, query: FeedbackQuery) -> Result<FeedbackListing, SurveyError> {
        let directory = self.directory().await?;
        let submissions = self.submissions.list_all().await?;
        let listing = feedback_listing(query, &directory, &submissions, Utc::now());

        tracing::debug!(
            total = listing.insights.total_feedback,
            "Computed feedback listing"
        );
        Ok(listing)
    }

    pub async fn history(&self, query: HistoryQuery) -> Result<HistoryPage, SurveyError> {
        let directory = self.directory().await?;
        let submissions = self.submissions.list_all().await?;
        let page = history_page(&query, &directory, &submissions, Utc::now());

        tracing::debug!(
            page = page.page,
            total_count = page.total_count,
            "Computed submission history"
        );
        Ok(page)
    }

    async fn directory(&self) -> Result<Directory, SurveyError> {
        let assets = self.catalog.list_assets().await?;
        let users = self.users.list_users().await?;
        Ok(Directory::new(assets, users))
    }
}

/// Id lookups for the assets, threats and users referenced by submissions
pub struct Directory {
    assets: HashMap<i64, Asset>,
    threats: HashMap<i64, Threat>,
    users: HashMap<i64, User>,
}

impl Directory {
    pub fn new(assets: Vec<Asset>, users: Vec<User>) -> Self {
        let threats = assets
            .iter()
            .flat_map(|a| a.threats.iter())
            .map(|t| (t.id, t.clone()))
            .collect();

        Self {
            assets: assets.into_iter().map(|a| (a.id, a)).collect(),
            threats,
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    fn asset(&self, asset_id: i64) -> Option<AssetRef> {
        self.assets.get(&asset_id).map(asset_ref)
    }

    fn threat(&self, threat_id: i64) -> Option<ThreatRef> {
        self.threats.get(&threat_id).map(|t| ThreatRef {
            id: t.id,
            name: t.name.clone(),
        })
    }

    fn user(&self, user_id: i64) -> Option<UserRef> {
        self.users.get(&user_id).map(UserRef::from)
    }

    fn user_matches(&self, user_id: i64, needle: &str) -> bool {
        self.users.get(&user_id).is_some_and(|user| {
            user.email.to_lowercase().contains(needle)
                || user
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(needle))
        })
    }
}

fn asset_ref(asset: &Asset) -> AssetRef {
    AssetRef {
        id: asset.id,
        name: asset.name.clone(),
        description: asset.description.clone(),
    }
}

/// Understanding, category and feedback counts over a set of submissions
#[derive(Default)]
struct Tally {
    understand: UnderstandStats,
    risk: RiskCategoryStats,
    feedback: usize,
    total_score: i64,
}

impl Tally {
    fn add(&mut self, submission: &Submission) {
        self.understand.total += 1;
        match submission.understand {
            Some(UnderstandLevel::Mengerti) => self.understand.mengerti += 1,
            Some(UnderstandLevel::TidakMengerti) => self.understand.tidak_mengerti += 1,
            None => self.understand.pending += 1,
        }

        match submission.score.as_ref().map(|s| &s.risk) {
            Some(risk) => {
                match risk.category {
                    RiskCategory::Low => self.risk.low += 1,
                    RiskCategory::Medium => self.risk.medium += 1,
                    RiskCategory::High => self.risk.high += 1,
                }
                self.total_score += i64::from(risk.total);
            }
            None => self.risk.none += 1,
        }

        self.feedback += submission.feedback.len();
    }

    fn count(&self) -> usize {
        self.understand.total
    }
}

/// Per-asset statistics. Completion rate counts every user's submissions against
/// the asset's threat count.
pub fn asset_breakdown(assets: &[Asset], submissions: &[Submission]) -> AssetAnalyticsResponse {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for submission in submissions {
        tallies.entry(submission.asset_id).or_default().add(submission);
    }

    let assets: Vec<AssetAnalytics> = assets
        .iter()
        .map(|asset| {
            let tally = tallies.remove(&asset.id).unwrap_or_default();
            let total_threats = asset.threats.len();
            let completion_rate = if tally.count() == 0 || total_threats == 0 {
                0.0
            } else {
                round2(tally.count() as f64 / total_threats as f64 * 100.0)
            };

            AssetAnalytics {
                asset: asset_ref(asset),
                statistics: AssetStatistics {
                    total_threats,
                    total_submissions: tally.count(),
                    total_feedback: tally.feedback,
                    understand_stats: tally.understand,
                    risk_stats: tally.risk,
                    completion_rate,
                },
            }
        })
        .collect();

    AssetAnalyticsResponse {
        total_assets: assets.len(),
        assets,
    }
}

/// Per-user statistics; users without submissions are listed with zeros
pub fn user_breakdown(users: &[User], submissions: &[Submission]) -> UserAnalyticsResponse {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for submission in submissions {
        tallies.entry(submission.user_id).or_default().add(submission);
    }

    let users: Vec<UserAnalytics> = users
        .iter()
        .map(|user| {
            let tally = tallies.remove(&user.id).unwrap_or_default();
            let average_risk_score = if tally.count() == 0 {
                0.0
            } else {
                round2(tally.total_score as f64 / tally.count() as f64)
            };

            UserAnalytics {
                user: UserRef::from(user),
                statistics: UserStatistics {
                    total_submissions: tally.count(),
                    total_feedback: tally.feedback,
                    understand_stats: tally.understand,
                    risk_stats: tally.risk,
                    average_risk_score,
                },
            }
        })
        .collect();

    UserAnalyticsResponse {
        total_users: users.len(),
        users,
    }
}

/// Field counts, most common first; equal counts stay in field-name order
fn field_counts<'a>(entries: impl Iterator<Item = &'a Feedback>) -> Vec<FieldCount> {
    let mut by_field: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *by_field.entry(entry.field.as_str()).or_default() += 1;
    }

    let mut counts: Vec<FieldCount> = by_field
        .into_iter()
        .map(|(field, count)| FieldCount {
            field: field.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Feedback listing for the admin dashboard.
///
/// The field filter and the `limit` most recent entries are applied first, then
/// the asset, threat and understanding filters narrow that window.
pub fn feedback_listing(
    query: FeedbackQuery,
    directory: &Directory,
    submissions: &[Submission],
    now: DateTime<Utc>,
) -> FeedbackListing {
    let all: Vec<(&Feedback, &Submission)> = submissions
        .iter()
        .flat_map(|s| s.feedback.iter().map(move |f| (f, s)))
        .collect();

    let field_stats = field_counts(all.iter().map(|(f, _)| *f));
    let since = now - Duration::days(RECENT_FEEDBACK_DAYS);
    let recent_feedback_trends =
        field_counts(all.iter().map(|(f, _)| *f).filter(|f| f.created_at >= since));

    let mut window: Vec<(&Feedback, &Submission)> = all
        .into_iter()
        .filter(|(f, _)| query.field.as_deref().is_none_or(|field| f.field == field))
        .collect();
    window.sort_by(|(a, _), (b, _)| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    window.truncate(query.limit);

    let selected: Vec<(&Feedback, &Submission)> = window
        .into_iter()
        .filter(|(_, s)| query.asset_id.is_none_or(|id| s.asset_id == id))
        .filter(|(_, s)| query.threat_id.is_none_or(|id| s.threat_id == id))
        .filter(|(_, s)| {
            query
                .understand_level
                .is_none_or(|level| s.understand == Some(level))
        })
        .collect();

    let category_count = |category: RiskCategory| {
        selected
            .iter()
            .filter(|(_, s)| s.score.as_ref().map(|sc| sc.risk.category) == Some(category))
            .count()
    };
    let understand_count = |level: UnderstandLevel| {
        selected
            .iter()
            .filter(|(_, s)| s.understand == Some(level))
            .count()
    };

    let mengerti_feedback = understand_count(UnderstandLevel::Mengerti);
    let tidak_mengerti_feedback = understand_count(UnderstandLevel::TidakMengerti);
    let distinct_submissions = selected
        .iter()
        .map(|(_, s)| s.id)
        .collect::<HashSet<_>>()
        .len();

    let insights = FeedbackInsights {
        total_feedback: selected.len(),
        most_common_field: field_stats
            .first()
            .map(|f| f.field.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        most_common_field_count: field_stats.first().map_or(0, |f| f.count),
        average_feedback_per_submission: if distinct_submissions == 0 {
            0.0
        } else {
            round2(selected.len() as f64 / distinct_submissions as f64)
        },
        feedback_with_high_risk: category_count(RiskCategory::High),
        feedback_with_low_risk: category_count(RiskCategory::Low),
        understanding_gap: UnderstandingGap {
            mengerti_feedback,
            tidak_mengerti_feedback,
            gap_ratio: if tidak_mengerti_feedback == 0 {
                0.0
            } else {
                round2(mengerti_feedback as f64 / tidak_mengerti_feedback as f64)
            },
        },
    };

    let detailed_feedback = selected
        .into_iter()
        .map(|(feedback, submission)| FeedbackEntry {
            id: feedback.id,
            field: feedback.field.clone(),
            message: feedback.value.clone(),
            created_at: feedback.created_at,
            submission: FeedbackSubmission {
                id: submission.id,
                understand: submission.understand,
                submitted_at: submission.submitted_at,
                user: directory.user(submission.user_id),
                asset: directory.asset(submission.asset_id),
                threat: directory.threat(submission.threat_id),
                score: submission.score.as_ref().map(|s| s.risk),
            },
        })
        .collect();

    FeedbackListing {
        insights,
        field_stats,
        recent_feedback_trends,
        detailed_feedback,
        filters: query,
    }
}

/// One page of submission history.
///
/// `months` bounds how far back submissions are taken from `now`; 0 disables the bound.
pub fn history_page(
    query: &HistoryQuery,
    directory: &Directory,
    submissions: &[Submission],
    now: DateTime<Utc>,
) -> HistoryPage {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
    let since = match query.months {
        0 => None,
        months => now.checked_sub_months(Months::new(months)),
    };
    let needle = query
        .user_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<&Submission> = submissions
        .iter()
        .filter(|s| query.user_id.is_none_or(|id| s.user_id == id))
        .filter(|s| query.asset_id.is_none_or(|id| s.asset_id == id))
        .filter(|s| query.threat_id.is_none_or(|id| s.threat_id == id))
        .filter(|s| since.is_none_or(|since| s.submitted_at >= since))
        .filter(|s| {
            needle
                .as_deref()
                .is_none_or(|needle| directory.user_matches(s.user_id, needle))
        })
        .collect();

    matching.sort_by(|a, b| {
        let order = a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id));
        match query.sort {
            SortOrder::Asc => order,
            SortOrder::Desc => order.reverse(),
        }
    });

    let total_count = matching.len();
    let total_pages = total_count.div_ceil(page_size as usize) as u32;
    let offset = (page as usize - 1) * page_size as usize;

    let items = matching
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .map(|s| HistoryItem {
            submission_id: s.id,
            submitted_at: s.submitted_at,
            state: s.state(),
            understand: s.understand,
            user: directory.user(s.user_id),
            asset: directory.asset(s.asset_id),
            threat: directory.threat(s.threat_id),
            score: s.score.as_ref().map(|score| score.risk),
            feedback_count: s.feedback.len(),
        })
        .collect();

    HistoryPage {
        items,
        page,
        page_size,
        total_count,
        total_pages,
    }
}

/// Fold submissions into the dashboard summary.
///
/// Averages are taken over every submission; bare ones count as 0.
pub fn summarize(submissions: &[Submission]) -> AnalyticsSummary {
    let mut tally = Tally::default();
    let (mut sum_peluang, mut sum_impact) = (0.0, 0.0);
    for submission in submissions {
        tally.add(submission);
        if let Some(score) = &submission.score {
            sum_peluang += score.risk.peluang;
            sum_impact += score.risk.impact;
        }
    }

    let counts = field_counts(submissions.iter().flat_map(|s| s.feedback.iter()));
    let feedback_by_field: BTreeMap<String, usize> = counts
        .iter()
        .map(|c| (c.field.clone(), c.count))
        .collect();
    let mut most_common_fields = counts;
    most_common_fields.truncate(MOST_COMMON_FIELDS);

    let total = tally.count();
    let average = |sum: f64| {
        if total == 0 {
            0.0
        } else {
            round2(sum / total as f64)
        }
    };

    let total_users = submissions
        .iter()
        .map(|s| s.user_id)
        .collect::<HashSet<_>>()
        .len();

    AnalyticsSummary {
        total_submissions: total,
        total_users,
        average_scores: AverageScores {
            risk_score: average(tally.total_score as f64),
            peluang: average(sum_peluang),
            impact: average(sum_impact),
        },
        understand_stats: tally.understand,
        risk_category_stats: tally.risk,
        feedback_stats: FeedbackStats {
            total_feedback: tally.feedback,
            feedback_by_field,
            most_common_fields,
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryRepository;
    use crate::model::{RiskInput, RiskScore, Score, ThreatKind};

    fn submission(
        id: i64,
        user_id: i64,
        understand: Option<UnderstandLevel>,
        score: Option<(i32, f64, f64, RiskCategory)>,
        feedback: &[&str],
    ) -> Submission {
        Submission {
            id,
            user_id,
            asset_id: 1,
            threat_id: id,
            submitted_at: Utc::now(),
            understand,
            risk_input: score.map(|_| RiskInput { f: 1, g: 1, h: 1, i: 2 }),
            score: score.map(|(total, peluang, impact, category)| Score {
                risk: RiskScore {
                    peluang,
                    impact,
                    total,
                    category,
                },
                threat_description: None,
            }),
            feedback: feedback
                .iter()
                .enumerate()
                .map(|(i, field)| Feedback {
                    id: id * 100 + i as i64,
                    submission_id: id,
                    field: field.to_string(),
                    value: "x".to_string(),
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary, AnalyticsSummary::default());
    }

    #[test]
    fn test_summary() {
        let submissions = vec![
            submission(
                1,
                10,
                Some(UnderstandLevel::Mengerti),
                Some((15, 4.1667, 3.5, RiskCategory::Low)),
                &["mengerti_poin"],
            ),
            submission(
                2,
                10,
                Some(UnderstandLevel::TidakMengerti),
                Some((36, 6.0, 6.0, RiskCategory::High)),
                &["mengerti_poin", "Tidak_mengerti_poin", "description_tidak_mengerti"],
            ),
            submission(3, 11, None, None, &[]),
        ];

        let summary = summarize(&submissions);

        assert_eq!(summary.total_submissions, 3);
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.understand_stats.mengerti, 1);
        assert_eq!(summary.understand_stats.tidak_mengerti, 1);
        assert_eq!(summary.understand_stats.pending, 1);
        assert_eq!(summary.risk_category_stats.low, 1);
        assert_eq!(summary.risk_category_stats.high, 1);
        assert_eq!(summary.risk_category_stats.none, 1);

        assert_eq!(summary.feedback_stats.total_feedback, 4);
        assert_eq!(summary.feedback_stats.feedback_by_field["mengerti_poin"], 2);
        assert_eq!(summary.feedback_stats.most_common_fields[0].field, "mengerti_poin");
        assert_eq!(summary.feedback_stats.most_common_fields[0].count, 2);
        assert_eq!(summary.feedback_stats.most_common_fields.len(), 3);

        // bare submission counts as zero: (15 + 36 + 0) / 3
        assert_eq!(summary.average_scores.risk_score, 17.0);
        assert_eq!(summary.average_scores.peluang, 3.39);
        assert_eq!(summary.average_scores.impact, 3.17);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = summarize(&[submission(
            1,
            1,
            Some(UnderstandLevel::Mengerti),
            Some((20, 4.0, 5.0, RiskCategory::Medium)),
            &[],
        )]);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalSubmissions"], 1);
        assert_eq!(value["riskCategoryStats"]["MEDIUM"], 1);
        assert_eq!(value["understandStats"]["tidakMengerti"], 0);
        assert_eq!(value["averageScores"]["riskScore"], 20.0);
    }

    /// Move a submission and its feedback `days` into the past, onto another asset/threat
    fn placed(mut s: Submission, asset_id: i64, threat_id: i64, days: i64) -> Submission {
        let at = Utc::now() - Duration::days(days);
        s.asset_id = asset_id;
        s.threat_id = threat_id;
        s.submitted_at = at;
        for entry in &mut s.feedback {
            entry.created_at = at;
        }
        s
    }

    fn asset(id: i64, name: &str, threat_ids: &[i64]) -> Asset {
        Asset {
            id,
            name: name.to_string(),
            description: None,
            threats: threat_ids
                .iter()
                .map(|tid| Threat {
                    id: *tid,
                    asset_id: id,
                    name: format!("Threat {}", tid),
                    description: None,
                    kind: ThreatKind::Other,
                    business_processes: Vec::new(),
                })
                .collect(),
        }
    }

    fn user(id: i64, email: &str, name: Option<&str>) -> User {
        User {
            id,
            email: email.to_string(),
            name: name.map(str::to_string),
            is_active: true,
        }
    }

    fn directory() -> Directory {
        Directory::new(
            vec![asset(1, "Website", &[11, 12]), asset(2, "Kasir", &[21])],
            vec![
                user(10, "sari@warung.id", Some("Sari Warung")),
                user(11, "budi@bengkel.id", None),
            ],
        )
    }

    #[test]
    fn test_asset_breakdown() {
        let assets = vec![asset(1, "Website", &[11, 12]), asset(2, "Kasir", &[21])];
        let submissions = vec![
            placed(
                submission(1, 10, Some(UnderstandLevel::Mengerti), Some((30, 6.0, 5.0, RiskCategory::High)), &["mengerti_poin"]),
                1, 11, 0,
            ),
            placed(submission(2, 10, None, None, &[]), 1, 12, 0),
            placed(
                submission(3, 11, Some(UnderstandLevel::TidakMengerti), Some((20, 4.0, 5.0, RiskCategory::Medium)), &["mengerti_poin", "Tidak_mengerti_poin"]),
                1, 11, 0,
            ),
        ];

        let response = asset_breakdown(&assets, &submissions);
        assert_eq!(response.total_assets, 2);

        let website = &response.assets[0].statistics;
        assert_eq!(website.total_threats, 2);
        assert_eq!(website.total_submissions, 3);
        assert_eq!(website.understand_stats.mengerti, 1);
        assert_eq!(website.understand_stats.tidak_mengerti, 1);
        assert_eq!(website.risk_stats.high, 1);
        assert_eq!(website.risk_stats.medium, 1);
        assert_eq!(website.total_feedback, 3);
        // every user's submissions count against the threat total
        assert_eq!(website.completion_rate, 150.0);

        let kasir = &response.assets[1].statistics;
        assert_eq!(kasir.total_submissions, 0);
        assert_eq!(kasir.completion_rate, 0.0);
    }

    #[test]
    fn test_user_breakdown_lists_users_without_submissions() {
        let users = vec![user(10, "sari@warung.id", None), user(11, "budi@bengkel.id", None)];
        let submissions = vec![
            submission(1, 10, Some(UnderstandLevel::Mengerti), Some((25, 5.0, 5.0, RiskCategory::Medium)), &["mengerti_poin"]),
            submission(2, 10, None, None, &[]),
        ];

        let response = user_breakdown(&users, &submissions);
        assert_eq!(response.total_users, 2);

        let sari = &response.users[0];
        assert_eq!(sari.user.email, "sari@warung.id");
        assert_eq!(sari.statistics.total_submissions, 2);
        assert_eq!(sari.statistics.total_feedback, 1);
        assert_eq!(sari.statistics.risk_stats.medium, 1);
        assert_eq!(sari.statistics.average_risk_score, 12.5);

        let budi = &response.users[1].statistics;
        assert_eq!(budi.total_submissions, 0);
        assert_eq!(budi.average_risk_score, 0.0);
    }

    #[test]
    fn test_feedback_limit_applies_before_asset_filter() {
        let submissions = vec![
            placed(submission(1, 10, Some(UnderstandLevel::Mengerti), Some((9, 2.5, 3.5, RiskCategory::Low)), &["mengerti_poin"]), 1, 11, 5),
            placed(submission(2, 10, Some(UnderstandLevel::TidakMengerti), Some((36, 6.0, 6.0, RiskCategory::High)), &["mengerti_poin"]), 2, 21, 1),
            placed(submission(3, 11, Some(UnderstandLevel::Mengerti), Some((30, 6.0, 5.0, RiskCategory::High)), &["mengerti_poin"]), 1, 12, 0),
        ];

        let query = FeedbackQuery {
            asset_id: Some(1),
            limit: 2,
            ..FeedbackQuery::default()
        };
        let listing = feedback_listing(query, &directory(), &submissions, Utc::now());

        // the two most recent entries are taken first; only one of them is on asset 1
        assert_eq!(listing.detailed_feedback.len(), 1);
        let entry = &listing.detailed_feedback[0];
        assert_eq!(entry.submission.id, 3);
        assert_eq!(entry.submission.user.as_ref().unwrap().email, "budi@bengkel.id");
        assert_eq!(entry.submission.asset.as_ref().unwrap().name, "Website");
        assert_eq!(entry.submission.threat.as_ref().unwrap().name, "Threat 12");
        assert_eq!(listing.filters.limit, 2);
    }

    #[test]
    fn test_feedback_insights() {
        let submissions = vec![
            placed(
                submission(1, 10, Some(UnderstandLevel::TidakMengerti), Some((36, 6.0, 6.0, RiskCategory::High)),
                    &["mengerti_poin", "Tidak_mengerti_poin", "description_tidak_mengerti"]),
                1, 11, 40,
            ),
            placed(submission(2, 11, Some(UnderstandLevel::Mengerti), Some((9, 2.5, 3.5, RiskCategory::Low)), &["mengerti_poin"]), 1, 12, 2),
        ];

        let listing = feedback_listing(FeedbackQuery::default(), &directory(), &submissions, Utc::now());
        let insights = &listing.insights;

        assert_eq!(insights.total_feedback, 4);
        assert_eq!(insights.most_common_field, "mengerti_poin");
        assert_eq!(insights.most_common_field_count, 2);
        assert_eq!(insights.average_feedback_per_submission, 2.0);
        assert_eq!(insights.feedback_with_high_risk, 3);
        assert_eq!(insights.feedback_with_low_risk, 1);
        assert_eq!(insights.understanding_gap.mengerti_feedback, 1);
        assert_eq!(insights.understanding_gap.tidak_mengerti_feedback, 3);
        assert_eq!(insights.understanding_gap.gap_ratio, 0.33);

        assert_eq!(listing.field_stats.len(), 3);
        // only the 2-day-old entry is inside the 30-day window
        assert_eq!(listing.recent_feedback_trends.len(), 1);
        assert_eq!(listing.recent_feedback_trends[0].field, "mengerti_poin");
    }

    #[test]
    fn test_feedback_filters_by_field_and_understanding() {
        let submissions = vec![
            submission(1, 10, Some(UnderstandLevel::TidakMengerti), None, &["mengerti_poin", "description_tidak_mengerti"]),
            submission(2, 11, Some(UnderstandLevel::Mengerti), None, &["mengerti_poin"]),
        ];

        let by_field = feedback_listing(
            FeedbackQuery {
                field: Some("description_tidak_mengerti".to_string()),
                ..FeedbackQuery::default()
            },
            &directory(),
            &submissions,
            Utc::now(),
        );
        assert_eq!(by_field.detailed_feedback.len(), 1);
        assert_eq!(by_field.detailed_feedback[0].message, "x");

        let by_level = feedback_listing(
            FeedbackQuery {
                understand_level: Some(UnderstandLevel::Mengerti),
                ..FeedbackQuery::default()
            },
            &directory(),
            &submissions,
            Utc::now(),
        );
        assert_eq!(by_level.detailed_feedback.len(), 1);
        assert_eq!(by_level.detailed_feedback[0].submission.id, 2);
        assert_eq!(by_level.insights.understanding_gap.gap_ratio, 0.0);
    }

    #[test]
    fn test_empty_feedback_listing() {
        let listing = feedback_listing(FeedbackQuery::default(), &directory(), &[], Utc::now());
        assert_eq!(listing.insights.most_common_field, "N/A");
        assert_eq!(listing.insights.average_feedback_per_submission, 0.0);
        assert!(listing.detailed_feedback.is_empty());
    }

    #[test]
    fn test_history_pages_and_sorts() {
        let submissions: Vec<Submission> = (1..=5)
            .map(|id| placed(submission(id, 10, None, None, &[]), 1, 11, 10 - id))
            .collect();

        let first = history_page(
            &HistoryQuery {
                page_size: 2,
                ..HistoryQuery::default()
            },
            &directory(),
            &submissions,
            Utc::now(),
        );
        assert_eq!(first.total_count, 5);
        assert_eq!(first.total_pages, 3);
        let ids: Vec<i64> = first.items.iter().map(|i| i.submission_id).collect();
        assert_eq!(ids, vec![5, 4]);

        let last = history_page(
            &HistoryQuery {
                page: 3,
                page_size: 2,
                sort: SortOrder::Asc,
                ..HistoryQuery::default()
            },
            &directory(),
            &submissions,
            Utc::now(),
        );
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].submission_id, 5);
        assert_eq!(last.items[0].user.as_ref().unwrap().id, 10);

        let clamped = history_page(
            &HistoryQuery {
                page: 0,
                page_size: 1000,
                ..HistoryQuery::default()
            },
            &directory(),
            &submissions,
            Utc::now(),
        );
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.page_size, MAX_PAGE_SIZE);
        assert_eq!(clamped.items.len(), 5);
    }

    #[test]
    fn test_history_filters() {
        let submissions = vec![
            placed(submission(1, 10, None, None, &[]), 1, 11, 3),
            placed(submission(2, 11, None, None, &[]), 2, 21, 3),
            placed(submission(3, 10, None, None, &[]), 1, 12, 400),
        ];
        let dir = directory();
        let run = |query: HistoryQuery| {
            history_page(&query, &dir, &submissions, Utc::now())
                .items
                .iter()
                .map(|i| i.submission_id)
                .collect::<Vec<_>>()
        };

        // default window is 12 months
        assert_eq!(run(HistoryQuery::default()).len(), 2);
        assert_eq!(
            run(HistoryQuery {
                months: 0,
                ..HistoryQuery::default()
            })
            .len(),
            3
        );
        assert_eq!(
            run(HistoryQuery {
                user_name: Some("WARUNG".to_string()),
                months: 0,
                ..HistoryQuery::default()
            }),
            vec![1, 3]
        );
        assert_eq!(
            run(HistoryQuery {
                user_name: Some("bengkel".to_string()),
                ..HistoryQuery::default()
            }),
            vec![2]
        );
        assert_eq!(
            run(HistoryQuery {
                asset_id: Some(1),
                threat_id: Some(11),
                ..HistoryQuery::default()
            }),
            vec![1]
        );
        assert_eq!(
            run(HistoryQuery {
                user_id: Some(11),
                ..HistoryQuery::default()
            }),
            vec![2]
        );
    }

    #[tokio::test]
    async fn test_service_reads_every_user() {
        let repo = std::sync::Arc::new(MemoryRepository::with_assets(&[(
            "Email Bisnis",
            &["Phishing"],
        )]));
        let active = repo.add_user("aktif@umkm.id");
        let inactive = repo.add_user("lama@umkm.id");
        repo.deactivate_user(inactive);
        let asset = repo.asset_by_name("Email Bisnis");
        repo.create(active, asset.id, asset.threats[0].id, Utc::now())
            .await
            .unwrap();

        let service = AnalyticsService::new(repo.clone(), repo.clone(), repo.clone());

        let users = service.user_analytics().await.unwrap();
        assert_eq!(users.total_users, 2);
        assert_eq!(users.users[0].statistics.total_submissions, 1);

        let assets = service.asset_analytics().await.unwrap();
        assert_eq!(assets.assets[0].statistics.completion_rate, 100.0);

        let history = service.history(HistoryQuery::default()).await.unwrap();
        assert_eq!(history.total_count, 1);
        assert_eq!(history.items[0].asset.as_ref().unwrap().name, "Email Bisnis");
    }
}
