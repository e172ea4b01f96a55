// src/assessment/mod.rs
//
// The client-facing practice core: a countdown timer, the working state of
// one session, the three mode controllers that drive it, and scoring.
// Nothing in here talks to the database or the network; controllers hand
// their results back to the caller, which persists them over the REST API.

pub mod quiz;
pub mod scoring;
pub mod state;
pub mod study;
pub mod timer;
pub mod timing;

/// Errors shared by the three mode controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("session is already finished")]
    AlreadyFinished,
    #[error("an answer must be selected first")]
    AnswerRequired,
    #[error("the answer for this question was already revealed")]
    AlreadyRevealed,
    #[error("session is awaiting final submission")]
    InReview,
    #[error("no question at the current position")]
    NoQuestion,
}
