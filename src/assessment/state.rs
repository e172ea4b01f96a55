// src/assessment/state.rs

use crate::models::question::{Choice, Question};
use crate::models::session::Mode;

/// One recorded answer (or skip) for a question in the active session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEntry {
    pub question_id: String,
    pub answer: Option<Choice>,
    pub is_correct: bool,
    pub time_spent_seconds: u32,
}

/// Working state for one practice session.
///
/// Holds the ordered question list, the cursor, and every recorded response.
/// Recording is append-only: a question answered twice (Study mode checks
/// it, the user steps back and checks again) contributes two entries, and
/// `correct_count` counts them both. Callers that want one entry per
/// question must not record twice.
#[derive(Debug, Default)]
pub struct AssessmentState {
    session_id: Option<String>,
    user_id: Option<String>,
    mode: Option<Mode>,
    questions: Vec<Question>,
    current_index: usize,
    responses: Vec<ResponseEntry>,
    time_remaining: u32,
}

impl AssessmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session context for `user_id`. Questions are installed
    /// separately via [`set_questions`](Self::set_questions).
    pub fn initialize(&mut self, user_id: impl Into<String>, mode: Mode) {
        self.user_id = Some(user_id.into());
        self.mode = Some(mode);
        self.responses.clear();
        self.current_index = 0;
    }

    /// Attaches the server-issued session id once the backend has created
    /// the session row.
    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Installs the ordered question list and rewinds to the first question.
    pub fn set_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.current_index = 0;
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Appends one response entry. Never removes or overwrites a prior
    /// entry for the same question.
    pub fn record_response(&mut self, entry: ResponseEntry) {
        self.responses.push(entry);
    }

    /// Moves forward by one question, clamped to the last index.
    pub fn advance(&mut self) {
        if !self.questions.is_empty() {
            self.current_index = (self.current_index + 1).min(self.questions.len() - 1);
        }
    }

    /// Jumps to an arbitrary position. Out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) {
        if index < self.questions.len() {
            self.current_index = index;
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// One-based progress: `(current, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.questions.len())
    }

    /// Number of recorded entries flagged correct, duplicates included.
    pub fn correct_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_correct).count()
    }

    pub fn responses(&self) -> &[ResponseEntry] {
        &self.responses
    }

    /// First recorded entry for `question_id`, if any.
    pub fn response_for(&self, question_id: &str) -> Option<&ResponseEntry> {
        self.responses.iter().find(|r| r.question_id == question_id)
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn update_time_remaining(&mut self, seconds: u32) {
        self.time_remaining = seconds;
    }

    /// Clears everything. Used when the user exits or abandons a session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
