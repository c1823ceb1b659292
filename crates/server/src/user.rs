//! Registration and login.

use api_types::user::{LoginResponse, UserLogin, UserNew, UserView};
use axum::{Json, extract::State};
use engine::{CreateUserParams, Ledger};

use crate::{ServerError, server::ServerState, validated::ValidatedJson, views::user_view};

/// Register a user. The password is stored hashed and never returned.
pub async fn create(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserNew>,
) -> Result<Json<UserView>, ServerError> {
    let hashed_password = auth::hash_password(&payload.password)?;

    let user = state
        .engine
        .queries()
        .create_user(CreateUserParams {
            username: payload.username,
            hashed_password,
            full_name: payload.full_name,
            email: payload.email,
        })
        .await?;

    tracing::info!("user {} registered", user.username);
    Ok(Json(user_view(user)))
}

/// Check the credentials and issue an access token.
pub async fn login(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserLogin>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state.engine.queries().get_user(&payload.username).await?;
    auth::check_password(&payload.password, &user.hashed_password)?;

    let (access_token, token_payload) = state
        .token_maker
        .create_token(&user.username, state.access_token_duration)
        .map_err(|err| ServerError::Internal(format!("cannot create access token: {err}")))?;

    Ok(Json(LoginResponse {
        access_token,
        access_token_expires_at: token_payload.expired_at,
        user: user_view(user),
    }))
}
