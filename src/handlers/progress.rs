// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{
        DomainStat, EndSessionRequest, EnsureUserRequest, Mode, RecordResponseRequest,
        ResponseRecord, Session, SessionListParams, StartSessionRequest, UserStats,
    },
    models::user::User,
    utils::jwt::Claims,
};

const RESPONSE_COLUMNS: &str = "id, session_id, question_id, user_answer, correct_answer, \
     is_correct, time_spent_seconds, section, domain";

/// Gets or creates the user row for the token identity. Accounts normally
/// exist from registration; this covers identities created out of band.
pub async fn ensure_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnsureUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, User>(
        "SELECT id, name, username, email, password_hash, google_id, created_at \
         FROM users WHERE id = ?",
    )
    .bind(&claims.sub)
    .fetch_optional(&pool)
    .await?;

    let user = match existing {
        Some(user) => user,
        None => {
            let name = payload
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Anonymous".to_string());
            let created_at = Utc::now();

            sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
                .bind(&claims.sub)
                .bind(&name)
                .bind(created_at)
                .execute(&pool)
                .await?;

            User {
                id: claims.sub.clone(),
                name,
                username: None,
                email: None,
                password_hash: None,
                google_id: None,
                created_at,
            }
        }
    };

    Ok(Json(json!({ "success": true, "user": user })))
}

/// Starts a new practice session for the authenticated user.
pub async fn start_session(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mode: Mode = payload
        .mode
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("mode is required".to_string()))?
        .parse()
        .map_err(|_| {
            AppError::BadRequest("mode must be one of study, quiz, or test".to_string())
        })?;

    let session = Session {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.clone(),
        mode,
        start_time: Utc::now(),
        end_time: None,
        score: None,
        total_questions: None,
        correct_answers: None,
    };

    sqlx::query("INSERT INTO sessions (id, user_id, mode, start_time) VALUES (?, ?, ?, ?)")
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.mode)
        .bind(session.start_time)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "success": true, "session": session })))
}

/// Ends a session, recording the final tally. Sessions end exactly once;
/// the score fields stay null for untimed study sessions.
pub async fn end_session(
    State(pool): State<SqlitePool>,
    Json(payload): Json<EndSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query(
        "UPDATE sessions \
         SET end_time = ?, score = ?, total_questions = ?, correct_answers = ? \
         WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(payload.score)
    .bind(payload.total_questions)
    .bind(payload.correct_answers)
    .bind(&payload.session_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Session ended successfully",
    })))
}

/// Appends one response row to a session.
pub async fn record_response(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RecordResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let session_exists = sqlx::query_scalar::<_, String>("SELECT id FROM sessions WHERE id = ?")
        .bind(&payload.session_id)
        .fetch_optional(&pool)
        .await?;
    if session_exists.is_none() {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    sqlx::query(
        "INSERT INTO responses (id, session_id, question_id, user_answer, correct_answer, \
         is_correct, time_spent_seconds, section, domain, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&payload.session_id)
    .bind(&payload.question_id)
    .bind(&payload.user_answer)
    .bind(&payload.correct_answer)
    .bind(payload.is_correct)
    .bind(payload.time_spent_seconds)
    .bind(&payload.section)
    .bind(&payload.domain)
    .bind(Utc::now())
    .execute(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "message": "Response recorded" })))
}

/// Lists a session's responses in insertion order (the question sequence
/// the user actually saw).
pub async fn session_responses(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let query =
        format!("SELECT {RESPONSE_COLUMNS} FROM responses WHERE session_id = ? ORDER BY rowid ASC");
    let responses = sqlx::query_as::<_, ResponseRecord>(&query)
        .bind(&session_id)
        .fetch_all(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": responses.len(),
        "responses": responses,
    })))
}

/// Recent sessions plus aggregate stats for the authenticated user. The
/// token identity is authoritative; the path segment is ignored.
pub async fn user_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(_user_id): Path<String>,
    Query(params): Query<SessionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let sessions = sqlx::query_as::<_, Session>(
        "SELECT id, user_id, mode, start_time, end_time, score, total_questions, correct_answers \
         FROM sessions WHERE user_id = ? ORDER BY start_time DESC LIMIT ?",
    )
    .bind(&claims.sub)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    let (total_sessions, average_score, total_questions, total_correct) =
        sqlx::query_as::<_, (i64, Option<f64>, Option<i64>, Option<i64>)>(
            "SELECT COUNT(*), AVG(score), SUM(total_questions), SUM(correct_answers) \
             FROM sessions WHERE user_id = ? AND end_time IS NOT NULL",
        )
        .bind(&claims.sub)
        .fetch_one(&pool)
        .await?;

    let stats = UserStats {
        total_sessions,
        average_score,
        total_questions_answered: total_questions.unwrap_or(0),
        correct_answers: total_correct.unwrap_or(0),
    };

    Ok(Json(json!({
        "success": true,
        "sessions": sessions,
        "stats": stats,
    })))
}

/// Helper row for the per-domain aggregation.
#[derive(sqlx::FromRow)]
struct DomainRow {
    domain: String,
    total: i64,
    correct: i64,
}

/// Per-domain accuracy over every response the user has recorded.
/// Recomputed on each request; responses without a domain are excluded.
pub async fn analytics(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, DomainRow>(
        "SELECT r.domain AS domain, COUNT(*) AS total, \
                COALESCE(SUM(r.is_correct), 0) AS correct \
         FROM responses r \
         JOIN sessions s ON r.session_id = s.id \
         WHERE s.user_id = ? AND r.domain IS NOT NULL \
         GROUP BY r.domain \
         ORDER BY total DESC",
    )
    .bind(&claims.sub)
    .fetch_all(&pool)
    .await?;

    let domains: Vec<DomainStat> = rows
        .into_iter()
        .map(|row| DomainStat {
            accuracy: if row.total == 0 {
                0.0
            } else {
                (row.correct as f64 / row.total as f64 * 1000.0).round() / 10.0
            },
            domain: row.domain,
            total: row.total,
            correct: row.correct,
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": domains.len(),
        "domains": domains,
    })))
}
