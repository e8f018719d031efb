pub mod analytics;
pub mod auth;
pub mod error;
pub mod progress;
pub mod risk;
pub mod submission;
pub mod survey;
pub mod threat_description;

pub use analytics::AnalyticsService;
pub use auth::{AdminPinGate, Authenticator, TokenAuthenticator};
pub use error::SurveyError;
pub use progress::ProgressAggregator;
pub use submission::SubmissionTracker;
pub use survey::SurveyService;
