//! Money transfer endpoint.

use api_types::{
    Currency,
    transfer::{TransferNew, TransferResult},
};
use auth::Payload;
use axum::{Extension, Json, extract::State};
use engine::{Account, TransferTxParams};

use crate::{
    ServerError,
    server::ServerState,
    validated::ValidatedJson,
    views::{currency_to_engine, transfer_result},
};

/// Fetch an account and check it holds `currency`.
async fn valid_account(
    state: &ServerState,
    account_id: i64,
    currency: Currency,
) -> Result<Account, ServerError> {
    let account = state.engine.get_account(account_id).await?;
    let currency = currency_to_engine(currency);
    if account.currency != currency {
        return Err(ServerError::Generic(format!(
            "account [{}] currency mismatch: {} vs {}",
            account.id, account.currency, currency
        )));
    }
    Ok(account)
}

/// Move money out of one of the caller's accounts.
pub async fn create(
    Extension(auth): Extension<Payload>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<TransferNew>,
) -> Result<Json<TransferResult>, ServerError> {
    let from_account = valid_account(&state, payload.from_account_id, payload.currency).await?;
    from_account.ensure_owner(&auth.username)?;
    valid_account(&state, payload.to_account_id, payload.currency).await?;

    let result = state
        .engine
        .transfer_tx(TransferTxParams::new(
            payload.from_account_id,
            payload.to_account_id,
            payload.amount,
        ))
        .await?;

    Ok(Json(transfer_result(result)))
}
