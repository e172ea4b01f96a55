// src/assessment/scoring.rs

use serde::Serialize;
use std::fmt;

/// Letter grade on the fixed 90/80/70/60 thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Result of scoring one completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub total_questions: usize,
    pub correct: usize,
    pub wrong: usize,
    pub percentage: f64,
    pub grade: Grade,
    pub feedback: &'static str,
}

/// Scores a completed session. An empty session (`total == 0`) is defined
/// as 0% rather than a division error.
pub fn grade(correct: usize, total: usize) -> ScoreReport {
    let percentage = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    ScoreReport {
        total_questions: total,
        correct,
        wrong: total.saturating_sub(correct),
        percentage,
        grade: letter_grade(percentage),
        feedback: feedback(percentage),
    }
}

pub fn letter_grade(percentage: f64) -> Grade {
    if percentage >= 90.0 {
        Grade::A
    } else if percentage >= 80.0 {
        Grade::B
    } else if percentage >= 70.0 {
        Grade::C
    } else if percentage >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

pub fn feedback(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "Excellent work!"
    } else if percentage >= 80.0 {
        "Good job! Keep practicing."
    } else if percentage >= 70.0 {
        "Nice effort. Review weak areas."
    } else if percentage >= 60.0 {
        "Fair attempt. More practice needed."
    } else {
        "Review the material and try again."
    }
}
