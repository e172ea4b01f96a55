// src/models/session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// The three practice modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Mode {
    /// Untimed, immediate per-question feedback, free navigation.
    Study,
    /// Timed, feedback deferred to the end.
    Quiz,
    /// Timed exam simulation: no going back, review before submission.
    Test,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Study => "study",
            Mode::Quiz => "quiz",
            Mode::Test => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(Mode::Study),
            "quiz" => Ok(Mode::Quiz),
            "test" => Ok(Mode::Test),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Represents the 'sessions' table: one practice attempt by one user.
/// End fields stay null until the session completes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub mode: Mode,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<f64>,
    pub total_questions: Option<i64>,
    pub correct_answers: Option<i64>,
}

/// Represents the 'responses' table: one recorded answer (or skip) within a
/// session. Append-only; insertion order defines review order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: String,
    pub session_id: String,
    pub question_id: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: Option<i64>,
    pub section: Option<String>,
    pub domain: Option<String>,
}

/// DTO for `POST /progress/user` (get-or-create for the token identity).
#[derive(Debug, Deserialize)]
pub struct EnsureUserRequest {
    pub name: Option<String>,
}

/// DTO for starting a session. The mode arrives as a raw string so a bad
/// value maps to a validation error rather than a body-decode rejection.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
    pub score: Option<f64>,
    pub total_questions: Option<i64>,
    pub correct_answers: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponseRequest {
    #[validate(length(min = 1, message = "sessionId, questionId, and correctAnswer are required"))]
    pub session_id: String,
    #[validate(length(min = 1, message = "sessionId, questionId, and correctAnswer are required"))]
    pub question_id: String,
    pub user_answer: Option<String>,
    #[validate(length(min = 1, message = "sessionId, questionId, and correctAnswer are required"))]
    pub correct_answer: String,
    #[serde(default)]
    pub is_correct: bool,
    pub time_spent_seconds: Option<i64>,
    pub section: Option<String>,
    pub domain: Option<String>,
}

/// Query parameters for the session history listing.
#[derive(Debug, Deserialize)]
pub struct SessionListParams {
    pub limit: Option<i64>,
}

/// Aggregate statistics over a user's ended sessions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_sessions: i64,
    pub average_score: Option<f64>,
    pub total_questions_answered: i64,
    pub correct_answers: i64,
}

/// Per-domain accuracy row for the analytics endpoint.
#[derive(Debug, Serialize)]
pub struct DomainStat {
    pub domain: String,
    pub total: i64,
    pub correct: i64,
    /// Percentage rounded to one decimal.
    pub accuracy: f64,
}
