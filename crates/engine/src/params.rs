//! Parameter records for ledger operations.
//!
//! Every write takes one fully-formed record, keeping call sites readable and
//! letting the same values flow through both the pooled connection and an
//! open transaction.

use crate::Currency;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateAccountParams {
    pub owner: String,
    pub currency: Currency,
    pub balance: i64,
}

impl CreateAccountParams {
    /// An empty account for `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>, currency: Currency) -> Self {
        Self {
            owner: owner.into(),
            currency,
            balance: 0,
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListAccountsParams {
    pub owner: String,
    pub limit: u64,
    pub offset: u64,
}

/// Signed delta applied to an account balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddAccountBalanceParams {
    pub id: i64,
    pub amount: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListEntriesParams {
    pub account_id: i64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Transfers whose source is `from_account_id` or whose destination is
/// `to_account_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListTransfersParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateUserParams {
    pub username: String,
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateUserPasswordParams {
    pub username: String,
    pub hashed_password: String,
}
