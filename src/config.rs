use std::{fmt, net::SocketAddr, str::FromStr};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    #[value(alias = "postgresql")]
    Postgres,
    #[value(alias = "in-memory")]
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => bail!("unknown store kind '{other}', expected 'postgres' or 'memory'"),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Connection string plus optional credentials that override whatever the
/// string embeds.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::from_str(&self.url)
            .context("COMMAND_API_DATABASE_URL must be a valid postgres connection string")?;

        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }

        Ok(options)
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &redact_url(&self.url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub database: DatabaseSettings,
    pub development: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_string =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr = env_string("COMMAND_API_BIND_ADDR", "127.0.0.1:5000")
            .parse::<SocketAddr>()
            .context("COMMAND_API_BIND_ADDR must be a valid host:port")?;

        let store = env_string("COMMAND_API_STORE", "postgres")
            .parse::<StoreKind>()
            .context("COMMAND_API_STORE is invalid")?;

        let max_connections = env_string("COMMAND_API_DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("COMMAND_API_DB_MAX_CONNECTIONS must be u32")?;

        let database = DatabaseSettings {
            url: env_string(
                "COMMAND_API_DATABASE_URL",
                "postgres://localhost:5432/CmdAPI",
            ),
            username: lookup("COMMAND_API_DB_USER").filter(|value| !value.is_empty()),
            password: lookup("COMMAND_API_DB_PASSWORD").filter(|value| !value.is_empty()),
            max_connections,
        };

        let development = env_string("COMMAND_API_ENVIRONMENT", "Production")
            .eq_ignore_ascii_case("development");

        Ok(Self {
            bind_addr,
            store,
            database,
            development,
        })
    }
}

/// Masks passwords in a connection URL, both the `user:password@` form and
/// a `password=` query parameter.
fn redact_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    let mut redacted = redact_userinfo(base);
    if let Some(query) = query {
        let params = query
            .split('&')
            .map(|param| match param.split_once('=') {
                Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{key}=***"),
                _ => param.to_string(),
            })
            .collect::<Vec<_>>();
        redacted.push('?');
        redacted.push_str(&params.join("&"));
    }
    redacted
}

fn redact_userinfo(base: &str) -> String {
    let Some((scheme, rest)) = base.split_once("://") else {
        return base.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return base.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => base.to_string(),
    }
}
