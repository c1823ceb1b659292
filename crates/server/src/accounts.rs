//! Account endpoints. The owner is always the authenticated user.

use api_types::account::{AccountList, AccountNew, AccountView};
use auth::Payload;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use engine::{CreateAccountParams, ListAccountsParams};

use crate::{
    ServerError,
    server::ServerState,
    validated::{ValidatedJson, ValidatedQuery},
    views::{account_view, currency_to_engine},
};

/// Open an empty account in the requested currency.
pub async fn create(
    Extension(auth): Extension<Payload>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<AccountNew>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .engine
        .create_account(CreateAccountParams::new(
            auth.username,
            currency_to_engine(payload.currency),
        ))
        .await?;

    Ok(Json(account_view(account)))
}

pub async fn get(
    Extension(auth): Extension<Payload>,
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AccountView>, ServerError> {
    let Path(id) = id.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    if id < 1 {
        return Err(ServerError::Generic("id must be >= 1".to_string()));
    }

    let account = state.engine.get_account(id).await?;
    account.ensure_owner(&auth.username)?;

    Ok(Json(account_view(account)))
}

/// One page of the caller's accounts.
pub async fn list(
    Extension(auth): Extension<Payload>,
    State(state): State<ServerState>,
    ValidatedQuery(query): ValidatedQuery<AccountList>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(ListAccountsParams {
            owner: auth.username,
            limit: query.page_size,
            offset: (query.page_id - 1) * query.page_size,
        })
        .await?;

    Ok(Json(accounts.into_iter().map(account_view).collect()))
}
