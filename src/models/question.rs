// src/models/question.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level SAT content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Math,
    English,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Math, Section::English];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Math => "math",
            Section::English => "english",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "math" => Ok(Section::Math),
            "english" => Ok(Section::English),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One of the four labeled answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            other => Err(format!("unknown choice: {other}")),
        }
    }
}

/// The four choice texts, keyed A-D on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choices {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl Choices {
    pub fn get(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
            Choice::C => &self.c,
            Choice::D => &self.d,
        }
    }
}

/// The question body: an optional supporting passage plus the prompt itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
    pub question: String,
    pub choices: Choices,
}

/// Optional visual attachment (inline SVG).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visual {
    #[serde(rename = "type")]
    pub kind: String,
    pub svg_content: String,
}

/// A practice question as served by the upstream content API.
///
/// Immutable once loaded. The section tag is attached at load time since
/// the upstream endpoint is queried once per section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub domain: String,
    pub difficulty: Difficulty,
    pub correct_answer: Choice,
    pub explanation: String,
    pub question: Prompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visuals: Option<Visual>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

/// Query parameters accepted by `GET /api/questions`.
///
/// Values stay raw strings here: matching is case-insensitive and blank
/// values count as absent, so interpretation happens inside the bank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionFilter {
    pub section: Option<String>,
    pub domain: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<usize>,
}
