//! Ledger repository.
//!
//! [`Ledger`] is the capability set over the four persisted record types.
//! [`Queries`] implements it for any sea-orm connection, so the pooled
//! `DatabaseConnection` and an open `DatabaseTransaction` are two instances of
//! the same interface. The repository owns no transaction scope.
//!
//! Raw storage errors are classified here: constraint violations become
//! [`EngineError::ExistingKey`] or [`EngineError::KeyNotFound`], everything
//! else stays [`EngineError::Database`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    prelude::*, sea_query::Expr,
};

use crate::{
    Account, EngineError, Entry, ResultEngine, Transfer, User, accounts, entries,
    params::{
        AddAccountBalanceParams, CreateAccountParams, CreateEntryParams, CreateTransferParams,
        CreateUserParams, ListAccountsParams, ListEntriesParams, ListTransfersParams,
        UpdateUserPasswordParams,
    },
    transfers, users,
};

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create_account(&self, params: CreateAccountParams) -> ResultEngine<Account>;

    async fn get_account(&self, id: i64) -> ResultEngine<Account>;

    /// One page of `owner`'s accounts, ordered by id.
    async fn list_accounts(&self, params: ListAccountsParams) -> ResultEngine<Vec<Account>>;

    /// Add a signed delta to an account balance and return the updated row.
    ///
    /// This is a single `UPDATE ... SET balance = balance + $delta ...
    /// RETURNING *` statement, so concurrent calls on the same row serialize
    /// on the row lock. Only call it on a transaction-bound ledger.
    async fn add_account_balance(&self, params: AddAccountBalanceParams)
    -> ResultEngine<Account>;

    async fn create_entry(&self, params: CreateEntryParams) -> ResultEngine<Entry>;

    async fn get_entry(&self, id: i64) -> ResultEngine<Entry>;

    async fn list_entries(&self, params: ListEntriesParams) -> ResultEngine<Vec<Entry>>;

    async fn create_transfer(&self, params: CreateTransferParams) -> ResultEngine<Transfer>;

    async fn get_transfer(&self, id: i64) -> ResultEngine<Transfer>;

    async fn list_transfers(&self, params: ListTransfersParams) -> ResultEngine<Vec<Transfer>>;

    async fn create_user(&self, params: CreateUserParams) -> ResultEngine<User>;

    async fn get_user(&self, username: &str) -> ResultEngine<User>;

    /// Replace the password hash and stamp `password_changed_at`.
    async fn update_user_password(&self, params: UpdateUserPasswordParams)
    -> ResultEngine<User>;
}

/// Ledger bound to one connection, pooled or transactional.
#[derive(Debug)]
pub struct Queries<'a, C> {
    db: &'a C,
}

impl<C> Clone for Queries<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Queries<'_, C> {}

impl<'a, C> Queries<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

/// Map a failed insert onto the engine taxonomy.
///
/// `on_unique` / `on_foreign_key` build the error for the matching constraint
/// violation, any other failure is a plain storage error.
fn classify(
    err: DbErr,
    on_unique: impl FnOnce(String) -> EngineError,
    on_foreign_key: impl FnOnce(String) -> EngineError,
) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => on_unique(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => on_foreign_key(detail),
        _ => EngineError::Database(err),
    }
}

fn account_not_found(id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("account {id}"))
}

#[async_trait]
impl<'a, C> Ledger for Queries<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn create_account(&self, params: CreateAccountParams) -> ResultEngine<Account> {
        let CreateAccountParams {
            owner,
            currency,
            balance,
        } = params;
        let active = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            owner: ActiveValue::Set(owner.clone()),
            balance: ActiveValue::Set(balance),
            currency: ActiveValue::Set(currency.code().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(self.db).await.map_err(|err| {
            classify(
                err,
                |_| EngineError::ExistingKey(format!("{owner} {currency} account")),
                |_| EngineError::ExistingKey(format!("unknown owner {owner}")),
            )
        })?;
        Account::try_from(model)
    }

    async fn get_account(&self, id: i64) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| account_not_found(id))?;
        Account::try_from(model)
    }

    async fn list_accounts(&self, params: ListAccountsParams) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(params.owner))
            .order_by_asc(accounts::Column::Id)
            .limit(params.limit)
            .offset(params.offset)
            .all(self.db)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn add_account_balance(
        &self,
        params: AddAccountBalanceParams,
    ) -> ResultEngine<Account> {
        let mut updated = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(params.amount),
            )
            .filter(accounts::Column::Id.eq(params.id))
            .exec_with_returning(self.db)
            .await?;
        let model = updated.pop().ok_or_else(|| account_not_found(params.id))?;
        Account::try_from(model)
    }

    async fn create_entry(&self, params: CreateEntryParams) -> ResultEngine<Entry> {
        let active = entries::ActiveModel {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(params.account_id),
            amount: ActiveValue::Set(params.amount),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(self.db).await.map_err(|err| {
            classify(
                err,
                EngineError::ExistingKey,
                |_| account_not_found(params.account_id),
            )
        })?;
        Ok(model.into())
    }

    async fn get_entry(&self, id: i64) -> ResultEngine<Entry> {
        entries::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .map(Entry::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("entry {id}")))
    }

    async fn list_entries(&self, params: ListEntriesParams) -> ResultEngine<Vec<Entry>> {
        let models = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(params.account_id))
            .order_by_asc(entries::Column::Id)
            .limit(params.limit)
            .offset(params.offset)
            .all(self.db)
            .await?;
        Ok(models.into_iter().map(Entry::from).collect())
    }

    async fn create_transfer(&self, params: CreateTransferParams) -> ResultEngine<Transfer> {
        let active = transfers::ActiveModel {
            id: ActiveValue::NotSet,
            from_account_id: ActiveValue::Set(params.from_account_id),
            to_account_id: ActiveValue::Set(params.to_account_id),
            amount: ActiveValue::Set(params.amount),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(self.db).await.map_err(|err| {
            classify(
                err,
                EngineError::ExistingKey,
                |_| {
                    EngineError::KeyNotFound(format!(
                        "account {} or {}",
                        params.from_account_id, params.to_account_id
                    ))
                },
            )
        })?;
        Ok(model.into())
    }

    async fn get_transfer(&self, id: i64) -> ResultEngine<Transfer> {
        transfers::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .map(Transfer::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("transfer {id}")))
    }

    async fn list_transfers(&self, params: ListTransfersParams) -> ResultEngine<Vec<Transfer>> {
        let models = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(params.from_account_id))
                    .add(transfers::Column::ToAccountId.eq(params.to_account_id)),
            )
            .order_by_asc(transfers::Column::Id)
            .limit(params.limit)
            .offset(params.offset)
            .all(self.db)
            .await?;
        Ok(models.into_iter().map(Transfer::from).collect())
    }

    async fn create_user(&self, params: CreateUserParams) -> ResultEngine<User> {
        let CreateUserParams {
            username,
            hashed_password,
            full_name,
            email,
        } = params;
        let active = users::ActiveModel {
            username: ActiveValue::Set(username.clone()),
            hashed_password: ActiveValue::Set(hashed_password),
            full_name: ActiveValue::Set(full_name),
            email: ActiveValue::Set(email.clone()),
            password_changed_at: ActiveValue::Set(DateTime::<Utc>::UNIX_EPOCH),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(self.db).await.map_err(|err| {
            classify(
                err,
                |_| EngineError::ExistingKey(format!("user {username} or email {email}")),
                EngineError::ExistingKey,
            )
        })?;
        Ok(model.into())
    }

    async fn get_user(&self, username: &str) -> ResultEngine<User> {
        users::Entity::find_by_id(username.to_string())
            .one(self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
    }

    async fn update_user_password(
        &self,
        params: UpdateUserPasswordParams,
    ) -> ResultEngine<User> {
        let mut updated = users::Entity::update_many()
            .col_expr(
                users::Column::HashedPassword,
                Expr::value(params.hashed_password),
            )
            .col_expr(users::Column::PasswordChangedAt, Expr::value(Utc::now()))
            .filter(users::Column::Username.eq(params.username.as_str()))
            .exec_with_returning(self.db)
            .await?;
        updated
            .pop()
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {}", params.username)))
    }
}
