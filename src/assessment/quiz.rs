// src/assessment/quiz.rs

use super::ModeError;
use super::scoring::{self, ScoreReport};
use super::state::{AssessmentState, ResponseEntry};
use super::timer::{Timer, TimerEvent};
use super::timing;
use crate::models::question::Choice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    Active,
    Finished,
}

/// What `next` did.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    Advanced,
    Finished(ScoreReport),
}

/// Timed practice with feedback deferred to the end. One answer per
/// question; the clock covers the whole set at 90 seconds per question.
pub struct QuizController {
    state: AssessmentState,
    timer: Timer,
    phase: QuizPhase,
    selected: Option<Choice>,
}

impl QuizController {
    pub fn new(state: AssessmentState) -> Self {
        let timer = Timer::new(timing::quiz_duration(state.question_count()));
        Self {
            state,
            timer,
            phase: QuizPhase::NotStarted,
            selected: None,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    pub fn time_remaining(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn selected(&self) -> Option<Choice> {
        self.selected
    }

    /// Starts the session and the countdown.
    pub fn begin(&mut self) -> Result<(), ModeError> {
        match self.phase {
            QuizPhase::NotStarted => {}
            QuizPhase::Active => return Err(ModeError::AlreadyStarted),
            QuizPhase::Finished => return Err(ModeError::AlreadyFinished),
        }
        self.phase = QuizPhase::Active;
        self.timer.start();
        Ok(())
    }

    pub fn select(&mut self, choice: Choice) -> Result<(), ModeError> {
        match self.phase {
            QuizPhase::Active => {
                self.selected = Some(choice);
                Ok(())
            }
            QuizPhase::NotStarted => Err(ModeError::NotStarted),
            QuizPhase::Finished => Err(ModeError::AlreadyFinished),
        }
    }

    /// Records the selection and moves on; finishes at the last question.
    /// Advancing without a selection is rejected, which is what keeps the
    /// Next control disabled until one exists.
    pub fn next(&mut self) -> Result<QuizEvent, ModeError> {
        match self.phase {
            QuizPhase::Active => {}
            QuizPhase::NotStarted => return Err(ModeError::NotStarted),
            QuizPhase::Finished => return Err(ModeError::AlreadyFinished),
        }

        let selected = self.selected.take().ok_or(ModeError::AnswerRequired)?;
        let (question_id, is_correct) = {
            let question = self.state.current_question().ok_or(ModeError::NoQuestion)?;
            (question.id.clone(), selected == question.correct_answer)
        };
        self.state.record_response(ResponseEntry {
            question_id,
            answer: Some(selected),
            is_correct,
            time_spent_seconds: 0,
        });

        let (current, total) = self.state.progress();
        if current >= total {
            Ok(QuizEvent::Finished(self.finish()))
        } else {
            self.state.advance();
            Ok(QuizEvent::Advanced)
        }
    }

    /// Pauses the countdown (allowed in quiz mode, unlike test mode).
    pub fn pause(&mut self) {
        self.timer.pause();
    }

    pub fn resume(&mut self) {
        if self.phase == QuizPhase::Active {
            self.timer.start();
        }
    }

    /// Advances the clock by one elapsed second. Expiry finishes the
    /// session on the spot: questions never reached record no entries, and
    /// the report still covers the full question count.
    pub fn tick(&mut self) -> Option<ScoreReport> {
        if self.phase != QuizPhase::Active {
            return None;
        }
        match self.timer.tick() {
            TimerEvent::Expired => {
                self.state.update_time_remaining(0);
                Some(self.finish())
            }
            TimerEvent::Tick(remaining) => {
                self.state.update_time_remaining(remaining);
                None
            }
            TimerEvent::Idle => None,
        }
    }

    /// Terminal transition; the returned report is produced exactly once.
    fn finish(&mut self) -> ScoreReport {
        self.timer.pause();
        self.phase = QuizPhase::Finished;
        scoring::grade(self.state.correct_count(), self.state.question_count())
    }

    /// Stops the clock and hands the state back without a score; used when
    /// the user leaves mid-session.
    pub fn abandon(mut self) -> AssessmentState {
        self.timer.pause();
        self.state
    }

    pub fn into_state(self) -> AssessmentState {
        self.state
    }
}
