use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

fn validate_credentials(payload: &mut CredentialsRequest) -> Result<(), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    if payload.password.is_empty() {
        warn!("empty password");
        return Err(ApiError::bad_request("Password must not be empty"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_credentials(&mut payload)?;

    // Pre-check is an optimization; the unique constraint below is the
    // source of truth under concurrent signups.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::credentials_taken());
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "signup lost unique-constraint race");
            return Err(ApiError::credentials_taken());
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_credentials(&mut payload)?;

    // Unknown email and wrong password produce the identical error so a
    // caller cannot probe which emails are registered.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(ApiError::invalid_credentials());
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::invalid_credentials());
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("no-tld@host"));
    }

    #[test]
    fn validate_credentials_normalizes_email() {
        let mut payload = CredentialsRequest {
            email: "  A@X.Com ".into(),
            password: "pw".into(),
        };
        validate_credentials(&mut payload).expect("valid credentials");
        assert_eq!(payload.email, "a@x.com");
    }

    #[test]
    fn validate_credentials_rejects_empty_password() {
        let mut payload = CredentialsRequest {
            email: "a@x.com".into(),
            password: "".into(),
        };
        let err = validate_credentials(&mut payload).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
