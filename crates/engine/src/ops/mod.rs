use std::{future::Future, pin::Pin};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{
    Account, EngineError, ResultEngine,
    params::{CreateAccountParams, ListAccountsParams},
    repository::{Ledger, Queries},
};

mod transfer;

pub use transfer::{TransferTxParams, TransferTxResult, transfer_tx};

/// Future returned by a unit of work run through [`Engine::exec_tx`].
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'a>>;

/// Transaction-safe access to the ledger.
///
/// The engine owns the connection pool and the transaction boundaries; all the
/// reads and writes themselves go through a [`Queries`] view.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Ledger bound to the pooled connection, outside any transaction.
    pub fn queries(&self) -> Queries<'_, DatabaseConnection> {
        Queries::new(&self.database)
    }

    /// Run `unit` inside a fresh database transaction.
    ///
    /// Commits when `unit` succeeds. On failure the transaction is rolled back
    /// and the original error returned; if the rollback fails too, both errors
    /// come back together as [`EngineError::Rollback`]. Dropping the returned
    /// future before it completes drops the open transaction, which rolls it
    /// back.
    pub async fn exec_tx<T, F>(&self, unit: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'a> FnOnce(Queries<'a, DatabaseTransaction>) -> TxFuture<'a, T> + Send,
    {
        let db_tx = self.database.begin().await?;
        let result = unit(Queries::new(&db_tx)).await;

        match result {
            Ok(value) => {
                db_tx.commit().await?;
                Ok(value)
            }
            Err(error) => match db_tx.rollback().await {
                Ok(()) => {
                    tracing::warn!("transaction rolled back: {error}");
                    Err(error)
                }
                Err(rollback) => {
                    tracing::error!("rollback failed: {rollback} (after: {error})");
                    Err(EngineError::Rollback {
                        error: Box::new(error),
                        rollback,
                    })
                }
            },
        }
    }

    pub async fn create_account(&self, params: CreateAccountParams) -> ResultEngine<Account> {
        self.queries().create_account(params).await
    }

    pub async fn get_account(&self, id: i64) -> ResultEngine<Account> {
        self.queries().get_account(id).await
    }

    pub async fn list_accounts(&self, params: ListAccountsParams) -> ResultEngine<Vec<Account>> {
        self.queries().list_accounts(params).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
