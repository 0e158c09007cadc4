// Configuration lue une seule fois au démarrage (.env puis variables d'environnement)

use std::env;

use crate::errors::{AppError, Result};

const DEFAULT_SQLITE_PATH: &str = "data/finance.sqlite";
const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    /// Base embarquée (fichier SQLite)
    Sqlite { path: String },
    /// Base réseau PostgreSQL
    Postgres {
        name: String,
        user: String,
        password: String,
        host: String,
        port: u16,
    },
    /// DATABASE_URL fournie telle quelle
    Url(String),
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        match self {
            DatabaseConfig::Sqlite { path } => format!("sqlite://{}?mode=rwc", path),
            DatabaseConfig::Postgres {
                name,
                user,
                password,
                host,
                port,
            } => {
                if password.is_empty() {
                    format!("postgres://{}@{}:{}/{}", user, host, port, name)
                } else {
                    format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
                }
            }
            DatabaseConfig::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
}

impl AppConfig {
    /// Charge la configuration depuis l'environnement du processus
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Variante testable: `lookup` remplace `std::env::var`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => DatabaseConfig::Url(url),
            None => {
                let use_sqlite = match lookup("USE_SQLITE") {
                    Some(raw) => parse_bool("USE_SQLITE", &raw)?,
                    None => true,
                };

                if use_sqlite {
                    DatabaseConfig::Sqlite {
                        path: lookup("SQLITE_PATH")
                            .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string()),
                    }
                } else {
                    DatabaseConfig::Postgres {
                        name: lookup("DATABASE_NAME").unwrap_or_else(|| "finance".to_string()),
                        user: lookup("DATABASE_USER").unwrap_or_else(|| "postgres".to_string()),
                        password: lookup("DATABASE_PASSWORD").unwrap_or_default(),
                        host: lookup("DATABASE_HOST").unwrap_or_else(|| "localhost".to_string()),
                        port: parse_number("DATABASE_PORT", lookup("DATABASE_PORT"), 5432)?,
                    }
                }
            }
        };

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not found in .env, using default (INSECURE)");
            DEFAULT_JWT_SECRET.to_string()
        });

        Ok(AppConfig {
            database,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_number("SERVER_PORT", lookup("SERVER_PORT"), 8080)?,
            jwt_secret,
            jwt_ttl_hours: parse_number("JWT_TTL_HOURS", lookup("JWT_TTL_HOURS"), 24)?,
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, value))),
        None => Ok(default),
    }
}
