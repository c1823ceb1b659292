//! Accounts, ledger entries and transfers of the bank, on top of sea-orm.
//!
//! [`Ledger`] exposes the single-statement reads and writes, [`Engine`] owns
//! the transaction boundaries and the transfer use case.

pub use accounts::Account;
pub use currency::Currency;
pub use entries::Entry;
pub use error::{EngineError, ErrorKind};
pub use ops::{Engine, EngineBuilder, TransferTxParams, TransferTxResult, TxFuture, transfer_tx};
pub use params::{
    AddAccountBalanceParams, CreateAccountParams, CreateEntryParams, CreateTransferParams,
    CreateUserParams, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    UpdateUserPasswordParams,
};
pub use repository::{Ledger, Queries};
pub use transfers::Transfer;
pub use users::User;

mod accounts;
mod currency;
mod entries;
mod error;
mod ops;
mod params;
mod repository;
mod transfers;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
