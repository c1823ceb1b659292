//! Money transfer between two accounts.

use serde::{Deserialize, Serialize};

use crate::{
    Account, EngineError, Entry, ResultEngine, Transfer,
    params::{AddAccountBalanceParams, CreateEntryParams, CreateTransferParams},
    repository::Ledger,
};

use super::Engine;

/// Input of [`Engine::transfer_tx`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// Minor units moved from the source to the destination, must be > 0.
    pub amount: i64,
}

impl TransferTxParams {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    fn validate(&self) -> ResultEngine<()> {
        if self.amount <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if self.from_account_id == self.to_account_id {
            return Err(EngineError::InvalidAmount(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a successful transfer wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

impl Engine {
    /// Move `amount` from one account to another as a single unit of work.
    ///
    /// Creates the transfer record, the debit and credit entries, and adjusts
    /// both balances inside one database transaction. Nothing is retried: a
    /// failed step rolls the whole transfer back and the error is returned.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> ResultEngine<TransferTxResult> {
        params.validate()?;

        let result = self
            .exec_tx::<TransferTxResult, _>(move |queries| {
                Box::pin(async move { transfer_tx(&queries, &params).await })
            })
            .await?;

        tracing::debug!(
            "transfer {} moved {} from account {} to account {}",
            result.transfer.id,
            params.amount,
            params.from_account_id,
            params.to_account_id
        );
        Ok(result)
    }
}

/// The body of a transfer, run against a transaction-bound ledger.
///
/// Balances are updated in ascending account id order whatever the direction
/// of the transfer, so two transactions touching the same pair of accounts
/// always lock the rows in the same order.
pub async fn transfer_tx<L>(ledger: &L, params: &TransferTxParams) -> ResultEngine<TransferTxResult>
where
    L: Ledger + ?Sized,
{
    let TransferTxParams {
        from_account_id,
        to_account_id,
        amount,
    } = *params;

    let transfer = ledger
        .create_transfer(CreateTransferParams {
            from_account_id,
            to_account_id,
            amount,
        })
        .await?;

    let from_entry = ledger
        .create_entry(CreateEntryParams {
            account_id: from_account_id,
            amount: -amount,
        })
        .await?;

    let to_entry = ledger
        .create_entry(CreateEntryParams {
            account_id: to_account_id,
            amount,
        })
        .await?;

    let (from_account, to_account) = if from_account_id < to_account_id {
        add_money(ledger, from_account_id, -amount, to_account_id, amount).await?
    } else {
        let (to_account, from_account) =
            add_money(ledger, to_account_id, amount, from_account_id, -amount).await?;
        (from_account, to_account)
    };

    if from_account.currency != to_account.currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "account {} is {}, account {} is {}",
            from_account.id, from_account.currency, to_account.id, to_account.currency
        )));
    }

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two balance deltas, first `account_id1` then `account_id2`.
async fn add_money<L>(
    ledger: &L,
    account_id1: i64,
    amount1: i64,
    account_id2: i64,
    amount2: i64,
) -> ResultEngine<(Account, Account)>
where
    L: Ledger + ?Sized,
{
    let account1 = ledger
        .add_account_balance(AddAccountBalanceParams {
            id: account_id1,
            amount: amount1,
        })
        .await?;
    let account2 = ledger
        .add_account_balance(AddAccountBalanceParams {
            id: account_id2,
            amount: amount2,
        })
        .await?;
    Ok((account1, account2))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::{
        Currency, User,
        params::{
            CreateAccountParams, CreateUserParams, ListAccountsParams, ListEntriesParams,
            ListTransfersParams, UpdateUserPasswordParams,
        },
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Transfer,
        Entry(i64),
        Balance(i64),
    }

    /// In-memory ledger standing for one open transaction, recording the
    /// order of the writes it receives.
    struct RecordingLedger {
        balances: Mutex<HashMap<i64, (i64, Currency)>>,
        calls: Mutex<Vec<Call>>,
        fail_balance_of: Option<i64>,
    }

    impl RecordingLedger {
        fn new(accounts: &[(i64, i64, Currency)]) -> Self {
            Self {
                balances: Mutex::new(
                    accounts
                        .iter()
                        .map(|(id, balance, currency)| (*id, (*balance, *currency)))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
                fail_balance_of: None,
            }
        }

        fn failing_balance_of(mut self, id: i64) -> Self {
            self.fail_balance_of = Some(id);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn balance_order(&self) -> Vec<i64> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Balance(id) => Some(id),
                    _ => None,
                })
                .collect()
        }

        fn unsupported<T>() -> ResultEngine<T> {
            Err(EngineError::InvalidAmount("unsupported".to_string()))
        }
    }

    #[async_trait]
    impl Ledger for RecordingLedger {
        async fn create_account(&self, _: CreateAccountParams) -> ResultEngine<Account> {
            Self::unsupported()
        }

        async fn get_account(&self, _: i64) -> ResultEngine<Account> {
            Self::unsupported()
        }

        async fn list_accounts(&self, _: ListAccountsParams) -> ResultEngine<Vec<Account>> {
            Self::unsupported()
        }

        async fn add_account_balance(
            &self,
            params: AddAccountBalanceParams,
        ) -> ResultEngine<Account> {
            self.calls.lock().unwrap().push(Call::Balance(params.id));
            // Yield so concurrent transfers interleave between the two updates.
            tokio::task::yield_now().await;
            if self.fail_balance_of == Some(params.id) {
                return Err(EngineError::KeyNotFound(format!("account {}", params.id)));
            }
            let mut balances = self.balances.lock().unwrap();
            let (balance, currency) = balances
                .get_mut(&params.id)
                .ok_or_else(|| EngineError::KeyNotFound(format!("account {}", params.id)))?;
            *balance += params.amount;
            Ok(Account {
                id: params.id,
                owner: "alice".to_string(),
                balance: *balance,
                currency: *currency,
                created_at: Utc::now(),
            })
        }

        async fn create_entry(&self, params: CreateEntryParams) -> ResultEngine<Entry> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Entry(params.account_id));
            Ok(Entry {
                id: 1,
                account_id: params.account_id,
                amount: params.amount,
                created_at: Utc::now(),
            })
        }

        async fn get_entry(&self, _: i64) -> ResultEngine<Entry> {
            Self::unsupported()
        }

        async fn list_entries(&self, _: ListEntriesParams) -> ResultEngine<Vec<Entry>> {
            Self::unsupported()
        }

        async fn create_transfer(&self, params: CreateTransferParams) -> ResultEngine<Transfer> {
            self.calls.lock().unwrap().push(Call::Transfer);
            Ok(Transfer {
                id: 1,
                from_account_id: params.from_account_id,
                to_account_id: params.to_account_id,
                amount: params.amount,
                created_at: Utc::now(),
            })
        }

        async fn get_transfer(&self, _: i64) -> ResultEngine<Transfer> {
            Self::unsupported()
        }

        async fn list_transfers(&self, _: ListTransfersParams) -> ResultEngine<Vec<Transfer>> {
            Self::unsupported()
        }

        async fn create_user(&self, _: CreateUserParams) -> ResultEngine<User> {
            Self::unsupported()
        }

        async fn get_user(&self, _: &str) -> ResultEngine<User> {
            Self::unsupported()
        }

        async fn update_user_password(
            &self,
            _: UpdateUserPasswordParams,
        ) -> ResultEngine<User> {
            Self::unsupported()
        }
    }

    #[tokio::test]
    async fn writes_transfer_then_entries_then_balances() {
        let ledger = RecordingLedger::new(&[(1, 100, Currency::Usd), (2, 50, Currency::Usd)]);

        let result = transfer_tx(&ledger, &TransferTxParams::new(1, 2, 30))
            .await
            .unwrap();

        assert_eq!(
            ledger.calls(),
            vec![
                Call::Transfer,
                Call::Entry(1),
                Call::Entry(2),
                Call::Balance(1),
                Call::Balance(2),
            ]
        );
        assert_eq!(result.transfer.amount, 30);
        assert_eq!(result.from_entry.amount, -30);
        assert_eq!(result.to_entry.amount, 30);
        assert_eq!(result.from_account.balance, 70);
        assert_eq!(result.to_account.balance, 80);
    }

    #[tokio::test]
    async fn opposite_transfers_lock_lower_id_first() {
        let ledger_a = RecordingLedger::new(&[(5, 100, Currency::Eur), (9, 100, Currency::Eur)]);
        let ledger_b = RecordingLedger::new(&[(5, 100, Currency::Eur), (9, 100, Currency::Eur)]);

        let forward = TransferTxParams::new(5, 9, 10);
        let backward = TransferTxParams::new(9, 5, 10);
        let (a, b) = tokio::join!(
            transfer_tx(&ledger_a, &forward),
            transfer_tx(&ledger_b, &backward)
        );

        assert_eq!(ledger_a.balance_order(), vec![5, 9]);
        assert_eq!(ledger_b.balance_order(), vec![5, 9]);

        // The result is labelled by direction, not by update order.
        let b = b.unwrap();
        assert_eq!(b.from_account.id, 9);
        assert_eq!(b.from_account.balance, 90);
        assert_eq!(b.to_account.id, 5);
        assert_eq!(b.to_account.balance, 110);
        assert_eq!(a.unwrap().from_account.id, 5);
    }

    #[tokio::test]
    async fn balance_failure_is_returned() {
        let ledger = RecordingLedger::new(&[(1, 100, Currency::Usd), (2, 50, Currency::Usd)])
            .failing_balance_of(2);

        let err = transfer_tx(&ledger, &TransferTxParams::new(1, 2, 30))
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::KeyNotFound("account 2".to_string()));
    }

    #[tokio::test]
    async fn currency_mismatch_fails_after_updates() {
        let ledger = RecordingLedger::new(&[(1, 100, Currency::Usd), (2, 50, Currency::Eur)]);

        let err = transfer_tx(&ledger, &TransferTxParams::new(1, 2, 30))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    }

    #[test]
    fn rejects_non_positive_amount_and_self_transfer() {
        assert!(matches!(
            TransferTxParams::new(1, 2, 0).validate(),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            TransferTxParams::new(1, 2, -5).validate(),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            TransferTxParams::new(3, 3, 10).validate(),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(TransferTxParams::new(3, 4, 10).validate().is_ok());
    }
}
