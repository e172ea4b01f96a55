// src/assessment/study.rs

use super::ModeError;
use super::state::{AssessmentState, ResponseEntry};
use crate::models::question::Choice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyPhase {
    NotStarted,
    /// Waiting for the user to pick and check an answer.
    Answering,
    /// The correct answer and explanation are on screen.
    Revealed,
    Finished,
}

/// What checking an answer produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reveal {
    pub correct_answer: Choice,
    pub explanation: String,
    pub is_correct: bool,
}

/// What `next` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyEvent {
    Advanced,
    Finished,
}

/// Untimed practice with immediate per-question feedback. The user may step
/// back to earlier questions; revisited questions can be answered again,
/// which appends a second response entry.
pub struct StudyController {
    state: AssessmentState,
    phase: StudyPhase,
    selected: Option<Choice>,
}

impl StudyController {
    pub fn new(state: AssessmentState) -> Self {
        Self {
            state,
            phase: StudyPhase::NotStarted,
            selected: None,
        }
    }

    pub fn phase(&self) -> StudyPhase {
        self.phase
    }

    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    pub fn selected(&self) -> Option<Choice> {
        self.selected
    }

    pub fn begin(&mut self) -> Result<(), ModeError> {
        match self.phase {
            StudyPhase::NotStarted => {
                self.phase = StudyPhase::Answering;
                Ok(())
            }
            StudyPhase::Finished => Err(ModeError::AlreadyFinished),
            _ => Err(ModeError::AlreadyStarted),
        }
    }

    /// Picks an answer for the current question. Rejected once the answer
    /// has been revealed.
    pub fn select(&mut self, choice: Choice) -> Result<(), ModeError> {
        match self.phase {
            StudyPhase::Answering => {
                self.selected = Some(choice);
                Ok(())
            }
            StudyPhase::Revealed => Err(ModeError::AlreadyRevealed),
            StudyPhase::NotStarted => Err(ModeError::NotStarted),
            StudyPhase::Finished => Err(ModeError::AlreadyFinished),
        }
    }

    /// Records the selected answer and reveals the solution.
    pub fn check_answer(&mut self) -> Result<Reveal, ModeError> {
        match self.phase {
            StudyPhase::Answering => {}
            StudyPhase::Revealed => return Err(ModeError::AlreadyRevealed),
            StudyPhase::NotStarted => return Err(ModeError::NotStarted),
            StudyPhase::Finished => return Err(ModeError::AlreadyFinished),
        }

        let selected = self.selected.ok_or(ModeError::AnswerRequired)?;
        let question = self.state.current_question().ok_or(ModeError::NoQuestion)?;
        let is_correct = selected == question.correct_answer;
        let reveal = Reveal {
            correct_answer: question.correct_answer,
            explanation: question.explanation.clone(),
            is_correct,
        };
        let question_id = question.id.clone();

        self.state.record_response(ResponseEntry {
            question_id,
            answer: Some(selected),
            is_correct,
            time_spent_seconds: 0,
        });
        self.phase = StudyPhase::Revealed;
        Ok(reveal)
    }

    /// Moves on after a reveal; finishes the session at the last question.
    pub fn next(&mut self) -> Result<StudyEvent, ModeError> {
        match self.phase {
            StudyPhase::Revealed => {}
            StudyPhase::Answering => return Err(ModeError::AnswerRequired),
            StudyPhase::NotStarted => return Err(ModeError::NotStarted),
            StudyPhase::Finished => return Err(ModeError::AlreadyFinished),
        }

        self.selected = None;
        let (current, total) = self.state.progress();
        if current >= total {
            self.phase = StudyPhase::Finished;
            Ok(StudyEvent::Finished)
        } else {
            self.state.advance();
            self.phase = StudyPhase::Answering;
            Ok(StudyEvent::Advanced)
        }
    }

    /// Steps back one question, clearing any pending selection or reveal.
    /// A no-op at the first question.
    pub fn previous(&mut self) -> Result<(), ModeError> {
        match self.phase {
            StudyPhase::Answering | StudyPhase::Revealed => {}
            StudyPhase::NotStarted => return Err(ModeError::NotStarted),
            StudyPhase::Finished => return Err(ModeError::AlreadyFinished),
        }

        self.selected = None;
        self.phase = StudyPhase::Answering;
        let index = self.state.current_index();
        if index > 0 {
            self.state.jump_to(index - 1);
        }
        Ok(())
    }

    /// Consumes the controller when the user exits, handing the state back
    /// so the caller can flush a partial record (best effort, never
    /// blocking the exit).
    pub fn abandon(self) -> AssessmentState {
        self.state
    }

    pub fn into_state(self) -> AssessmentState {
        self.state
    }
}
