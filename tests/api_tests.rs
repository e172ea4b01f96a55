// tests/api_tests.rs

use std::sync::Arc;

use satprep::bank::{HttpQuestionSource, QuestionBank};
use satprep::config::Config;
use satprep::routes;
use satprep::state::AppState;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    address: String,
    /// Keeps the upstream doubles (content API, Google userinfo) alive for
    /// the server's lifetime.
    upstream: MockServer,
}

fn question_json(id: &str, domain: &str, difficulty: &str) -> Value {
    json!({
        "id": id,
        "domain": domain,
        "difficulty": difficulty,
        "correct_answer": "A",
        "explanation": "The first choice is the one that works.",
        "question": {
            "question": "Which choice is right?",
            "choices": { "A": "first", "B": "second", "C": "third", "D": "fourth" }
        }
    })
}

/// Spawns the app on a random port against an in-memory database and a
/// wiremock content source. Returns the base URL plus the mock server.
async fn spawn_app() -> TestApp {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("section", "math"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "math": [
                question_json("m1", "Algebra", "Easy"),
                question_json("m2", "Geometry", "Medium"),
                question_json("m3", "Algebra", "Hard"),
            ]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("section", "english"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            question_json("e1", "Grammar", "Easy"),
            question_json("e2", "Vocabulary", "Medium"),
        ])))
        .mount(&upstream)
        .await;

    // Single connection: every handler sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        question_api_url: format!("{}/questions", upstream.uri()),
        google_userinfo_url: format!("{}/oauth/userinfo", upstream.uri()),
        frontend_origin: "http://localhost:3000".to_string(),
        port: 0,
    };

    let bank = Arc::new(
        QuestionBank::new(Box::new(HttpQuestionSource::new(
            config.question_api_url.clone(),
        )))
        .with_seed(7),
    );
    bank.load().await.expect("Failed to load question bank");

    let state = AppState {
        pool,
        config,
        bank,
        http: reqwest::Client::new(),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, upstream }
}

fn unique_email() -> String {
    format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

async fn register(app: &TestApp, client: &reqwest::Client, email: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse register json");
    assert_eq!(body["success"], json!(true));
    body["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn register_works_and_derives_a_username() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({
            "name": "Pat",
            "email": "pat.tester@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], json!("pat_tester"));
    assert_eq!(body["user"]["email"], json!("pat.tester@example.com"));
}

#[tokio::test]
async fn register_rejects_short_passwords() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({
            "name": "Pat",
            "email": unique_email(),
            "password": "short"
        }))
        .send()
        .await
        .expect("Register failed");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn register_conflicts_on_duplicate_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    register(&app, &client, &email).await;

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({ "name": "Again", "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Register failed");

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_returns_a_token_and_rejects_bad_credentials() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();
    register(&app, &client, &email).await;

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some());

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn me_requires_a_bearer_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();
    let token = register(&app, &client, &email).await;

    let response = client
        .get(format!("{}/api/auth/me", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/auth/me", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], json!(email));
    assert_eq!(body["user"]["googleLinked"], json!(false));
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();
    let token = register(&app, &client, &email).await;

    let response = client
        .post(format!("{}/api/auth/change-password", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "currentPassword": "nope", "newPassword": "password456" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/auth/change-password", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "currentPassword": "password123", "newPassword": "password456" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);

    // Old credentials stop working, new ones do.
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": "password456" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn google_auth_creates_then_reuses_an_account() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    Mock::given(method("GET"))
        .and(path("/oauth/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "google-sub-1",
            "email": "Google.User@example.com",
            "name": "Google User"
        })))
        .mount(&app.upstream)
        .await;

    let response = client
        .post(format!("{}/api/auth/google", app.address))
        .json(&json!({ "accessToken": "provider-token" }))
        .send()
        .await
        .expect("Google auth failed");
    assert_eq!(response.status().as_u16(), 200);
    let first: Value = response.json().await.unwrap();
    let first_id = first["user"]["id"].as_str().unwrap().to_string();
    assert_eq!(first["user"]["email"], json!("google.user@example.com"));

    let response = client
        .post(format!("{}/api/auth/google", app.address))
        .json(&json!({ "accessToken": "provider-token" }))
        .send()
        .await
        .expect("Google auth failed");
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["user"]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn question_routes_serve_the_cached_snapshot() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/questions?limit=100", app.address))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(5));

    let body: Value = client
        .get(format!(
            "{}/api/questions?section=math&difficulty=easy",
            app.address
        ))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["questions"][0]["id"], json!("m1"));

    let body: Value = client
        .get(format!("{}/api/questions/e1", app.address))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["question"]["section"], json!("english"));

    let response = client
        .get(format!("{}/api/questions/does-not-exist", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 404);

    let body: Value = client
        .get(format!("{}/api/domains", app.address))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["domains"],
        json!(["Algebra", "Geometry", "Grammar", "Vocabulary"])
    );

    let body: Value = client
        .get(format!("{}/api/sections", app.address))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["sections"], json!(["math", "english"]));

    let body: Value = client
        .get(format!("{}/api/cache-status", app.address))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["isCached"], json!(true));
    assert_eq!(body["count"], json!(5));
}

#[tokio::test]
async fn progress_routes_require_auth() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/progress/session/start", app.address))
        .json(&json!({ "mode": "study" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn session_lifecycle_with_stats_and_analytics() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&app, &client, &unique_email()).await;
    let auth = format!("Bearer {}", token);

    // Bad mode values are validation errors.
    let response = client
        .post(format!("{}/api/progress/session/start", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "mode": "marathon" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/progress/session/start", app.address))
        .header("Authorization", &auth)
        .json(&json!({}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 400);

    // Start a quiz session.
    let body: Value = client
        .post(format!("{}/api/progress/session/start", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "mode": "quiz" }))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], json!(true));
    let session_id = body["session"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["session"]["mode"], json!("quiz"));

    // Record three responses: Algebra right+wrong, Geometry right.
    for (question_id, answer, correct, domain) in [
        ("m1", "A", true, "Algebra"),
        ("m3", "B", false, "Algebra"),
        ("m2", "A", true, "Geometry"),
    ] {
        let response = client
            .post(format!("{}/api/progress/response", app.address))
            .header("Authorization", &auth)
            .json(&json!({
                "sessionId": session_id,
                "questionId": question_id,
                "userAnswer": answer,
                "correctAnswer": "A",
                "isCorrect": correct,
                "timeSpentSeconds": 30,
                "section": "math",
                "domain": domain,
            }))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status().as_u16(), 200);
    }

    // Recording against an unknown session is a 404.
    let response = client
        .post(format!("{}/api/progress/response", app.address))
        .header("Authorization", &auth)
        .json(&json!({
            "sessionId": "missing",
            "questionId": "m1",
            "correctAnswer": "A",
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 404);

    // Responses come back in insertion order.
    let body: Value = client
        .get(format!(
            "{}/api/progress/session/{}",
            app.address, session_id
        ))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["responses"][0]["question_id"], json!("m1"));
    assert_eq!(body["responses"][2]["question_id"], json!("m2"));

    // Ending an unknown session is a 404; ending the real one succeeds.
    let response = client
        .post(format!("{}/api/progress/session/end", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "sessionId": "missing" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .post(format!("{}/api/progress/session/end", app.address))
        .header("Authorization", &auth)
        .json(&json!({
            "sessionId": session_id,
            "score": 66.7,
            "totalQuestions": 3,
            "correctAnswers": 2,
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);

    // History + aggregate stats.
    let body: Value = client
        .get(format!("{}/api/progress/user/ignored-id", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(body["stats"]["totalSessions"], json!(1));
    assert_eq!(body["stats"]["averageScore"], json!(66.7));
    assert_eq!(body["stats"]["totalQuestionsAnswered"], json!(3));
    assert_eq!(body["stats"]["correctAnswers"], json!(2));

    // Per-domain accuracy, ordered by descending total, one-decimal rounding.
    let body: Value = client
        .get(format!("{}/api/progress/analytics", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["domains"][0]["domain"], json!("Algebra"));
    assert_eq!(body["domains"][0]["total"], json!(2));
    assert_eq!(body["domains"][0]["accuracy"], json!(50.0));
    assert_eq!(body["domains"][1]["domain"], json!("Geometry"));
    assert_eq!(body["domains"][1]["accuracy"], json!(100.0));
}

#[tokio::test]
async fn study_session_end_to_end() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    // Register with a 6+ character password, then log in for a fresh token.
    register(&app, &client, &email).await;
    let body: Value = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();
    let auth = format!("Bearer {}", body["token"].as_str().unwrap());

    let body: Value = client
        .post(format!("{}/api/progress/session/start", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "mode": "study" }))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    // One correct, one incorrect response for a two-question set.
    for (question_id, answer, correct) in [("m1", "A", true), ("e1", "C", false)] {
        client
            .post(format!("{}/api/progress/response", app.address))
            .header("Authorization", &auth)
            .json(&json!({
                "sessionId": session_id,
                "questionId": question_id,
                "userAnswer": answer,
                "correctAnswer": "A",
                "isCorrect": correct,
            }))
            .send()
            .await
            .expect("Request failed");
    }

    let body: Value = client
        .get(format!(
            "{}/api/progress/session/{}",
            app.address, session_id
        ))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(2));
    let correct_count = body["responses"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["is_correct"] == json!(true))
        .count();
    assert_eq!(correct_count, 1);
}
