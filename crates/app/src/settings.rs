//! Application settings, read from an optional `settings.toml` in the working
//! directory and overridden by `BANK__*` environment variables, e.g.
//! `BANK__SERVER__PORT=8080` or `BANK__SERVER__TOKEN__SYMMETRIC_KEY=...`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// `tracing` level for the workspace crates.
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
    /// Any connection string sea-orm understands.
    Url(String),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Paseto,
    Jwt,
}

fn default_access_token_duration_secs() -> i64 {
    15 * 60
}

#[derive(Debug, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub kind: TokenKind,
    /// Exactly 32 characters for PASETO, at least 32 for JWT.
    pub symmetric_key: String,
    #[serde(default = "default_access_token_duration_secs")]
    pub access_token_duration_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub token: Token,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("BANK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_server_section() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "bank.db" }

            [server.token]
            kind = "jwt"
            symmetric_key = "0123456789abcdef0123456789abcdef"
            access_token_duration_secs = 60
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, 8080);
        assert_eq!(server.database, Database::Sqlite("bank.db".to_string()));
        assert_eq!(server.token.kind, TokenKind::Jwt);
        assert_eq!(server.token.access_token_duration_secs, 60);
    }

    #[test]
    fn defaults_apply() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"

            [server.token]
            symmetric_key = "0123456789abcdef0123456789abcdef"
            "#,
        );

        assert_eq!(settings.app.level, "info");
        let server = settings.server.unwrap();
        assert_eq!(server.database, Database::Memory);
        assert_eq!(server.token.kind, TokenKind::Paseto);
        assert_eq!(server.token.access_token_duration_secs, 900);
    }

    #[test]
    fn server_section_is_optional() {
        assert!(parse("").server.is_none());
    }
}
