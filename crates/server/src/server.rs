use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use chrono::Duration;

use std::sync::Arc;

use crate::{ServerError, accounts, transfers, user};
use auth::Maker;
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub token_maker: Arc<dyn Maker>,
    /// Lifetime of the access tokens issued at login.
    pub access_token_duration: Duration,
}

/// Bearer token authentication.
///
/// On success the verified [`auth::Payload`] is stored in the request
/// extensions for the handlers.
async fn require_token(
    State(state): State<ServerState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = auth_header.map_err(|rejection| {
        if rejection.is_missing() {
            ServerError::Unauthorized("authorization header is not provided".to_string())
        } else {
            ServerError::Unauthorized("invalid authorization header format".to_string())
        }
    })?;

    let payload = state
        .token_maker
        .verify_token(bearer.token())
        .map_err(|err| ServerError::Unauthorized(err.to_string()))?;

    request.extensions_mut().insert(payload);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route("/accounts/{id}", get(accounts::get))
        .route("/transfers", post(transfers::create))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/users", post(user::create))
        .route("/users/login", post(user::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
