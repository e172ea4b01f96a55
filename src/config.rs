// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds. Defaults to 7 days; there is no refresh
    /// mechanism, clients simply log in again.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Upstream content API serving the question set.
    pub question_api_url: String,
    /// Identity-provider userinfo endpoint. Overridable so tests can point
    /// it at a local double.
    pub google_userinfo_url: String,
    pub frontend_origin: String,
    pub port: u16,
}

const DEFAULT_JWT_EXPIRATION: u64 = 7 * 24 * 60 * 60;
const DEFAULT_QUESTION_API_URL: &str = "https://pinesat.com/api/questions";
const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/satprep.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let question_api_url =
            env::var("QUESTION_API_URL").unwrap_or_else(|_| DEFAULT_QUESTION_API_URL.to_string());
        Url::parse(&question_api_url).expect("QUESTION_API_URL must be a valid URL");

        let google_userinfo_url = env::var("GOOGLE_USERINFO_URL")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_USERINFO_URL.to_string());
        Url::parse(&google_userinfo_url).expect("GOOGLE_USERINFO_URL must be a valid URL");

        let frontend_origin =
            env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3001);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            question_api_url,
            google_userinfo_url,
            frontend_origin,
            port,
        }
    }
}
