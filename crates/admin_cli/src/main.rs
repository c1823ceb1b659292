use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{
    CreateAccountParams, CreateUserParams, Currency, Engine, Ledger, ListAccountsParams,
    TransferTxParams, UpdateUserPasswordParams, User,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Parser, Debug)]
#[command(name = "bank_admin")]
#[command(about = "Admin utilities for the bank (users, accounts, transfers)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./bank.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(UserArgs),
    Account(AccountArgs),
    /// Move money between two accounts.
    Transfer(TransferArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user, the password is prompted for.
    Create(UserCreateArgs),
    /// Replace the password of a user.
    SetPassword(UserSetPasswordArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct UserSetPasswordArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    List(AccountListArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long, value_parser = parse_currency)]
    currency: Currency,
    /// Opening balance in minor units.
    #[arg(long, default_value_t = 0)]
    balance: i64,
}

#[derive(Args, Debug)]
struct AccountListArgs {
    #[arg(long)]
    owner: String,
    #[arg(long, default_value_t = 10)]
    limit: u64,
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    from: i64,
    #[arg(long)]
    to: i64,
    /// Minor units.
    #[arg(long)]
    amount: i64,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

/// A user as printed by the CLI, without the password hash.
fn user_json(user: &User) -> serde_json::Value {
    json!({
        "username": user.username,
        "full_name": user.full_name,
        "email": user.email,
        "password_changed_at": user.password_changed_at,
        "created_at": user.created_at,
    })
}

/// Keeps the terminal in raw mode while the password is typed.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// What a key press did to the password being typed.
#[derive(Debug, PartialEq, Eq)]
enum Keystroke {
    Typed,
    Erased,
    Ignored,
    Submit,
    Abort,
}

fn apply_key(buf: &mut String, key: KeyEvent) -> Keystroke {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Keystroke::Submit,
        KeyCode::Char('c') if control => Keystroke::Abort,
        KeyCode::Char(ch) if !control => {
            buf.push(ch);
            Keystroke::Typed
        }
        KeyCode::Backspace if buf.pop().is_some() => Keystroke::Erased,
        _ => Keystroke::Ignored,
    }
}

/// Reason a new password is refused, if any.
fn password_problem(password: &str, confirmation: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    (password != confirmation).then(|| "Passwords do not match. Try again.".to_string())
}

fn notice(out: &mut impl Write, line: &str) -> std::io::Result<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    out.flush()
}

/// Read a password without echoing it, one `*` per character.
fn read_password(label: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    notice(&mut out, label)?;

    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut password, key) {
            Keystroke::Typed => execute!(out, Print("*"))?,
            Keystroke::Erased => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?
            }
            Keystroke::Ignored => continue,
            Keystroke::Submit => {
                execute!(out, Print("\r\n"))?;
                return Ok(password);
            }
            Keystroke::Abort => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
        }
        out.flush()?;
    }
}

/// Ask for a new password and its confirmation, three attempts at most.
fn read_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    for _ in 0..3 {
        let password = read_password("Password: ")?;
        let confirmation = if password.chars().count() < MIN_PASSWORD_LEN {
            String::new()
        } else {
            read_password("Confirm password: ")?
        };
        match password_problem(&password, &confirmation) {
            None => return Ok(password),
            Some(problem) => notice(&mut std::io::stderr(), &format!("{problem}\r\n"))?,
        }
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(UserArgs {
            command: UserCommand::Create(args),
        }) => {
            let password = read_new_password()?;
            let user = engine
                .queries()
                .create_user(CreateUserParams {
                    username: args.username,
                    hashed_password: auth::hash_password(&password)?,
                    full_name: args.full_name,
                    email: args.email,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&user_json(&user))?);
        }
        Command::User(UserArgs {
            command: UserCommand::SetPassword(args),
        }) => {
            let queries = engine.queries();
            // Fail before prompting when the user does not exist.
            queries.get_user(&args.username).await?;

            let password = read_new_password()?;
            let user = queries
                .update_user_password(UpdateUserPasswordParams {
                    username: args.username,
                    hashed_password: auth::hash_password(&password)?,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&user_json(&user))?);
        }
        Command::Account(AccountArgs {
            command: AccountCommand::Create(args),
        }) => {
            let account = engine
                .create_account(
                    CreateAccountParams::new(args.owner, args.currency).balance(args.balance),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        Command::Account(AccountArgs {
            command: AccountCommand::List(args),
        }) => {
            let accounts = engine
                .list_accounts(ListAccountsParams {
                    owner: args.owner,
                    limit: args.limit,
                    offset: args.offset,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        Command::Transfer(args) => {
            let result = engine
                .transfer_tx(TransferTxParams::new(args.from, args.to, args.amount))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
