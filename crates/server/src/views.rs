//! Conversions between engine records and wire types.

use api_types::{
    Currency,
    account::AccountView,
    transfer::{EntryView, TransferResult, TransferView},
    user::UserView,
};
use engine::{Account, Entry, Transfer, TransferTxResult, User};

pub fn currency_to_engine(currency: Currency) -> engine::Currency {
    match currency {
        Currency::Usd => engine::Currency::Usd,
        Currency::Eur => engine::Currency::Eur,
        Currency::Ksh => engine::Currency::Ksh,
    }
}

pub fn currency_from_engine(currency: engine::Currency) -> Currency {
    match currency {
        engine::Currency::Usd => Currency::Usd,
        engine::Currency::Eur => Currency::Eur,
        engine::Currency::Ksh => Currency::Ksh,
    }
}

pub fn user_view(user: User) -> UserView {
    UserView {
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        password_changed_at: user.password_changed_at,
        created_at: user.created_at,
    }
}

pub fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        owner: account.owner,
        balance: account.balance,
        currency: currency_from_engine(account.currency),
        created_at: account.created_at,
    }
}

fn entry_view(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        account_id: entry.account_id,
        amount: entry.amount,
        created_at: entry.created_at,
    }
}

fn transfer_view(transfer: Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.to_account_id,
        amount: transfer.amount,
        created_at: transfer.created_at,
    }
}

pub fn transfer_result(result: TransferTxResult) -> TransferResult {
    TransferResult {
        transfer: transfer_view(result.transfer),
        from_account: account_view(result.from_account),
        to_account: account_view(result.to_account),
        from_entry: entry_view(result.from_entry),
        to_entry: entry_view(result.to_entry),
    }
}
