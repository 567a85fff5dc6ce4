use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::User,
    repository::RepositoryState,
};

/// Claims
///
/// The payload carried inside a bearer token: the numeric id of the user it was
/// issued to. Tokens without `exp` never expire; tokens with one are rejected once
/// it has passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

/// CurrentUser
///
/// The identity resolved for one request: `Some(user)` for a valid bearer token that
/// maps to an existing user, `None` otherwise. Resolution never rejects a request for
/// a bad or missing token; only a store failure during the user lookup does.
///
/// [`identity_middleware`] resolves it once and stores it in the request extensions.
/// The extractor reads that cached value, and resolves (then caches) on its own
/// when the middleware is not installed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let current = resolve_current_user(&parts.headers, &repo, &config.jwt_secret).await?;
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// resolve_current_user
///
/// 1. Token Extraction: `Authorization: Bearer <token>`; anything else is anonymous.
/// 2. Token Decoding: HS256 with the server secret; failures are anonymous.
/// 3. DB Lookup: the `id` claim must name an existing user.
pub async fn resolve_current_user(
    headers: &HeaderMap,
    repo: &RepositoryState,
    secret: &str,
) -> Result<CurrentUser, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(CurrentUser(None));
    };

    let claims = match decode_token(token, secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("ignoring undecodable bearer token: {}", e);
            return Ok(CurrentUser(None));
        }
    };

    let user = repo.get_user(claims.id).await?;
    if user.is_none() {
        tracing::debug!(user_id = claims.id, "bearer token names an unknown user");
    }
    Ok(CurrentUser(user))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}

/// Decodes and validates a bearer token. `exp` is checked when present but not required.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

/// Issues an HS256 token for `user_id` with the same claim layout `decode_token` expects.
pub fn encode_token(
    user_id: i32,
    exp: Option<usize>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims { id: user_id, exp };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// identity_middleware
///
/// Runs for every route. Resolves the [`CurrentUser`] exactly once and attaches it to
/// the request so handlers and later extractors share the same identity.
pub async fn identity_middleware(
    State(repo): State<RepositoryState>,
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_current_user(request.headers(), &repo, &config.jwt_secret).await {
        Ok(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
