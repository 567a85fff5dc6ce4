#![allow(dead_code)]

use rest_rant::{
    AppConfig, AppState, InMemoryRepository,
    auth::encode_token,
    models::{Role, User},
    repository::RepositoryState,
};
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub const ADMIN_ID: i32 = 1;
pub const REVIEWER_ID: i32 = 2;
pub const OTHER_REVIEWER_ID: i32 = 3;

pub fn admin() -> User {
    User {
        user_id: ADMIN_ID,
        first_name: "Ada".to_string(),
        last_name: "Admin".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::Admin,
        password_digest: "$2b$10$admin".to_string(),
    }
}

pub fn reviewer() -> User {
    User {
        user_id: REVIEWER_ID,
        first_name: "Rae".to_string(),
        last_name: "Reviewer".to_string(),
        email: "rae@example.com".to_string(),
        role: Role::Reviewer,
        password_digest: "$2b$10$reviewer".to_string(),
    }
}

pub fn other_reviewer() -> User {
    User {
        user_id: OTHER_REVIEWER_ID,
        first_name: "Otto".to_string(),
        last_name: "Other".to_string(),
        email: "otto@example.com".to_string(),
        role: Role::Reviewer,
        password_digest: "$2b$10$other".to_string(),
    }
}

/// State over an in-memory store seeded with one admin and two reviewers.
pub fn test_state() -> AppState {
    let repo = Arc::new(InMemoryRepository::with_users([
        admin(),
        reviewer(),
        other_reviewer(),
    ])) as RepositoryState;

    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState { repo, config }
}

pub fn token_for(user_id: i32) -> String {
    encode_token(user_id, None, TEST_JWT_SECRET).unwrap()
}

pub fn bearer(user_id: i32) -> String {
    format!("Bearer {}", token_for(user_id))
}
