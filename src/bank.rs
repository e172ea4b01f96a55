// src/bank.rs

use std::collections::BTreeSet;

use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::models::question::{Question, QuestionFilter, Section};
use crate::utils::html::clean_svg;

const DEFAULT_FILTER_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("question bank not loaded")]
    NotLoaded,
    #[error("question source unavailable: {0}")]
    Upstream(String),
}

/// Where questions come from. Production talks to the content API over
/// HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch(&self, section: Section) -> Result<Value, BankError>;
}

/// Fetches a section's question payload from the content API.
pub struct HttpQuestionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuestionSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self, section: Section) -> Result<Value, BankError> {
        let url = format!("{}?section={}", self.base_url, section);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BankError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| BankError::Upstream(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| BankError::Upstream(e.to_string()))
    }
}

/// Snapshot state reported by `GET /api/cache-status`.
#[derive(Debug, Clone, Copy)]
pub struct CacheStatus {
    pub is_cached: bool,
    pub count: usize,
}

/// In-memory snapshot of the upstream question set.
///
/// Constructed once at startup and shared behind an `Arc`; after a
/// successful `load` the snapshot is only ever read. There is no global
/// instance: handlers receive the bank through `AppState`.
pub struct QuestionBank {
    source: Box<dyn QuestionSource>,
    cache: RwLock<Vec<Question>>,
    seed: Option<u64>,
}

impl QuestionBank {
    pub fn new(source: Box<dyn QuestionSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(Vec::new()),
            seed: None,
        }
    }

    /// Fixes the shuffle order used by `filter`. Test hook; production uses
    /// a fresh thread rng per call.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fetches both sections from the source and caches the combined set.
    /// Calling again with a non-empty cache is a no-op, so a failed startup
    /// load can be retried. A fetch failure propagates; it is never treated
    /// as "zero questions available".
    pub async fn load(&self) -> Result<(), BankError> {
        {
            let cache = self.cache.read().await;
            if !cache.is_empty() {
                tracing::info!("reusing cached question set ({} questions)", cache.len());
                return Ok(());
            }
        }

        let (math, english) = tokio::join!(
            self.source.fetch(Section::Math),
            self.source.fetch(Section::English)
        );

        let mut questions = decode_section(math?, Section::Math);
        let math_count = questions.len();
        let english_questions = decode_section(english?, Section::English);
        let english_count = english_questions.len();
        questions.extend(english_questions);

        tracing::info!(
            math = math_count,
            english = english_count,
            total = questions.len(),
            "question bank loaded"
        );

        *self.cache.write().await = questions;
        Ok(())
    }

    /// Filters the snapshot by section (exact), domain (substring) and
    /// difficulty (exact), all case-insensitive, then shuffles and truncates
    /// to `limit`. Repeated calls with the same criteria return different
    /// orderings unless a seed was fixed.
    pub async fn filter(&self, params: &QuestionFilter) -> Result<Vec<Question>, BankError> {
        let cache = self.cache.read().await;
        if cache.is_empty() {
            return Err(BankError::NotLoaded);
        }

        let mut candidates: Vec<Question> = cache
            .iter()
            .filter(|q| match trimmed(&params.section) {
                Some(section) => q
                    .section
                    .is_some_and(|s| s.as_str().eq_ignore_ascii_case(section)),
                None => true,
            })
            .filter(|q| match trimmed(&params.domain) {
                Some(domain) => q.domain.to_lowercase().contains(&domain.to_lowercase()),
                None => true,
            })
            .filter(|q| match trimmed(&params.difficulty) {
                Some(difficulty) => q.difficulty.as_str().eq_ignore_ascii_case(difficulty),
                None => true,
            })
            .cloned()
            .collect();

        match self.seed {
            Some(seed) => candidates.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => candidates.shuffle(&mut rand::thread_rng()),
        }

        candidates.truncate(params.limit.unwrap_or(DEFAULT_FILTER_LIMIT));
        Ok(candidates)
    }

    pub async fn by_id(&self, id: &str) -> Result<Option<Question>, BankError> {
        let cache = self.cache.read().await;
        if cache.is_empty() {
            return Err(BankError::NotLoaded);
        }
        Ok(cache.iter().find(|q| q.id == id).cloned())
    }

    /// Sorted distinct domain values observed in the snapshot. Empty before
    /// a load, matching the cache-status signal.
    pub async fn domains(&self) -> Vec<String> {
        let cache = self.cache.read().await;
        let set: BTreeSet<&str> = cache.iter().map(|q| q.domain.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    pub fn sections(&self) -> [Section; 2] {
        Section::ALL
    }

    pub async fn status(&self) -> CacheStatus {
        let cache = self.cache.read().await;
        CacheStatus {
            is_cached: !cache.is_empty(),
            count: cache.len(),
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Pulls the question array out of an upstream payload. The content API has
/// shipped several shapes over time; the fallback order is: bare array,
/// object keyed by the section name, object keyed `questions`, then any
/// remaining top-level array value (logged as a shape smell).
fn extract_array(payload: Value, section: Section) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(section.as_str()) {
                return items;
            }
            if let Some(Value::Array(items)) = map.remove("questions") {
                return items;
            }
            for (key, value) in map {
                if let Value::Array(items) = value {
                    tracing::warn!(
                        %section,
                        wrapper = %key,
                        "question payload under unrecognized wrapper key; using it anyway"
                    );
                    return items;
                }
            }
            tracing::warn!(%section, "question payload contained no array");
            Vec::new()
        }
        _ => {
            tracing::warn!(%section, "question payload was neither array nor object");
            Vec::new()
        }
    }
}

/// Decodes one section's payload, tagging each question and sanitizing SVG
/// visuals. Items that fail to decode are skipped with a warning rather
/// than failing the whole load.
fn decode_section(payload: Value, section: Section) -> Vec<Question> {
    let items = extract_array(payload, section);
    let total = items.len();
    let mut questions = Vec::with_capacity(total);

    for item in items {
        match serde_json::from_value::<Question>(item) {
            Ok(mut question) => {
                question.section = Some(section);
                if let Some(visual) = question.visuals.as_mut() {
                    visual.svg_content = clean_svg(&visual.svg_content);
                }
                questions.push(question);
            }
            Err(e) => tracing::warn!(%section, error = %e, "skipping undecodable question"),
        }
    }

    if questions.len() < total {
        tracing::warn!(
            %section,
            skipped = total - questions.len(),
            "dropped questions during decode"
        );
    }
    questions
}
