// src/handlers/questions.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{bank::QuestionBank, error::AppError, models::question::QuestionFilter};

/// Retrieves filtered questions from the in-memory snapshot.
pub async fn list_questions(
    State(bank): State<Arc<QuestionBank>>,
    Query(params): Query<QuestionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let questions = bank.filter(&params).await?;

    Ok(Json(json!({
        "success": true,
        "count": questions.len(),
        "questions": questions,
    })))
}

/// Retrieves a single question by id.
pub async fn get_question(
    State(bank): State<Arc<QuestionBank>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let question = bank
        .by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(json!({ "success": true, "question": question })))
}

/// Lists every distinct subject domain in the snapshot, sorted.
pub async fn list_domains(
    State(bank): State<Arc<QuestionBank>>,
) -> Result<impl IntoResponse, AppError> {
    let domains = bank.domains().await;

    Ok(Json(json!({
        "success": true,
        "count": domains.len(),
        "domains": domains,
    })))
}

/// The fixed two-section list.
pub async fn list_sections(
    State(bank): State<Arc<QuestionBank>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({ "success": true, "sections": bank.sections() })))
}

/// Reports whether the upstream snapshot has been loaded.
pub async fn cache_status(
    State(bank): State<Arc<QuestionBank>>,
) -> Result<impl IntoResponse, AppError> {
    let status = bank.status().await;

    Ok(Json(json!({
        "success": true,
        "isCached": status.is_cached,
        "count": status.count,
    })))
}
