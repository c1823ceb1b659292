//! Wire types of the HTTP API.
//!
//! Request bodies derive [`validator::Validate`]; the server rejects a request
//! failing its rules with `400 Bad Request` before any handler logic runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Ksh,
}

pub mod user {
    use validator::ValidationError;

    use super::*;

    /// Usernames are ASCII letters and digits only.
    fn alphanumeric(username: &str) -> Result<(), ValidationError> {
        if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::new("alphanumeric"));
        }
        Ok(())
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct UserNew {
        #[validate(custom(function = "alphanumeric"))]
        pub username: String,
        #[validate(length(min = 6))]
        pub password: String,
        #[validate(length(min = 1))]
        pub full_name: String,
        #[validate(email)]
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct UserLogin {
        #[validate(custom(function = "alphanumeric"))]
        pub username: String,
        #[validate(length(min = 6))]
        pub password: String,
    }

    /// A user as returned to clients, without the password hash.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub full_name: String,
        pub email: String,
        pub password_changed_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub access_token: String,
        pub access_token_expires_at: DateTime<Utc>,
        pub user: UserView,
    }
}

pub mod account {
    use super::*;

    /// The owner is the authenticated caller, only the currency is chosen.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct AccountNew {
        pub currency: Currency,
    }

    /// Query string of `GET /accounts`.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct AccountList {
        /// 1-based page number, capped to the int32 range.
        #[validate(range(min = 1, max = 2_147_483_647))]
        pub page_id: u64,
        #[validate(range(min = 5, max = 10))]
        pub page_size: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub owner: String,
        pub balance: i64,
        pub currency: Currency,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transfer {
    use super::{account::AccountView, *};

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct TransferNew {
        #[validate(range(min = 1))]
        pub from_account_id: i64,
        #[validate(range(min = 1))]
        pub to_account_id: i64,
        /// Minor units, strictly positive.
        #[validate(range(min = 1))]
        pub amount: i64,
        /// Both accounts must hold this currency.
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: i64,
        pub from_account_id: i64,
        pub to_account_id: i64,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: i64,
        pub account_id: i64,
        /// Negative for the debited account.
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferResult {
        pub transfer: TransferView,
        pub from_account: AccountView,
        pub to_account: AccountView,
        pub from_entry: EntryView,
        pub to_entry: EntryView,
    }
}
