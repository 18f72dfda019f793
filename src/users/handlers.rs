use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{dto::UserView, extractors::CurrentUser, handlers::is_valid_email, repo::User},
    error::{is_unique_violation, ApiError},
    state::AppState,
    users::dto::{UpdateUserRequest, UserResponse},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me", patch(update_me))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(email) = payload.email.as_mut() {
        *email = email.trim().to_lowercase();
        if !is_valid_email(email) {
            warn!("invalid email");
            return Err(ApiError::bad_request("Invalid email"));
        }
    }

    let updated = match User::update_profile(
        &state.db,
        user.id,
        payload.email.as_deref(),
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
    )
    .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!("email already registered");
            return Err(ApiError::credentials_taken());
        }
        Err(e) => return Err(e.into()),
    };

    info!("profile updated");
    Ok(Json(UserResponse {
        user: UserView::from(updated),
    }))
}
