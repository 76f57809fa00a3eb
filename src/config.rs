//! 環境変数からの設定読み込み

use crate::application::DEFAULT_SESSION_TTL_SECS;
use crate::domain::AuthorizationScope;
use chrono::Duration;
use thiserror::Error;

/// ストレージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// テスト・デモ用（再起動で内容は消える）
    Memory,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when STORAGE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// `StorageBackend::Postgres`のときのみ`Some`
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub authorization_scope: AuthorizationScope,
    /// セッションの有効期間（`SESSION_TTL`、秒）
    pub session_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let invalid = |name: &'static str, value: String| ConfigError::InvalidValue { name, value };

        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| invalid("PORT", v))?,
            None => 3000,
        };

        let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => return Err(invalid("STORAGE_BACKEND", other.to_string())),
        };

        let database_url = match storage_backend {
            StorageBackend::Postgres => {
                Some(lookup("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?)
            }
            StorageBackend::Memory => None,
        };

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("DATABASE_MAX_CONNECTIONS", v)),
            },
            None => 5,
        };

        let authorization_scope = match lookup("BOOKING_AUTH_SCOPE") {
            Some(v) => v.parse().map_err(|_| invalid("BOOKING_AUTH_SCOPE", v))?,
            None => AuthorizationScope::default(),
        };

        let session_ttl = match lookup("SESSION_TTL") {
            Some(v) => match v.parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::seconds(secs),
                _ => return Err(invalid("SESSION_TTL", v)),
            },
            None => Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        };

        Ok(AppConfig {
            port,
            storage_backend,
            database_url,
            database_max_connections,
            authorization_scope,
            session_ttl,
        })
    }
}
