//! ServiceConfig - オーケストレータの設定
//!
//! 環境変数から読み込みます。未設定の変数はデフォルト値のまま。
//!
//! | 変数                          | 既定         |
//! |-------------------------------|--------------|
//! | `TRELLIS_CACHE_TTL_SECS`      | 300          |
//! | `TRELLIS_CACHE_REFRESH`       | `background` |
//! | `TRELLIS_DEFAULT_TIMEOUT_MS`  | なし         |
//! | `TRELLIS_REFRESH_TIMEOUT_MS`  | 5000         |

use std::str::FromStr;
use std::time::Duration;

pub const CACHE_TTL_VAR: &str = "TRELLIS_CACHE_TTL_SECS";
pub const CACHE_REFRESH_VAR: &str = "TRELLIS_CACHE_REFRESH";
pub const DEFAULT_TIMEOUT_VAR: &str = "TRELLIS_DEFAULT_TIMEOUT_MS";
pub const REFRESH_TIMEOUT_VAR: &str = "TRELLIS_REFRESH_TIMEOUT_MS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
}

/// miss 後に get_by_id がどう cache を埋め直すか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheRefresh {
    /// runtime 上に spawn する（レスポンスは待たない）
    #[default]
    Background,
    /// 返す前に書き込みを待つ（エラーは観測のみ）
    Inline,
}

impl FromStr for CacheRefresh {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(CacheRefresh::Background),
            "inline" => Ok(CacheRefresh::Inline),
            other => Err(format!("expected `background` or `inline`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// 全 cache 書き込みの TTL
    pub cache_ttl: Duration,

    pub cache_refresh: CacheRefresh,

    /// 呼び出し側の Context に期限が無いときに適用
    pub default_timeout: Option<Duration>,

    /// バックグラウンド refresh の上限時間（呼び出し側の期限が早ければそちら）
    pub refresh_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_refresh: CacheRefresh::Background,
            default_timeout: None,
            refresh_timeout: Duration::from_secs(5),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// 任意の変数ソースから構築（テスト、多層設定用）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(CACHE_TTL_VAR) {
            let secs: u64 = parse_var(CACHE_TTL_VAR, &raw)?;
            if secs == 0 {
                return Err(invalid(CACHE_TTL_VAR, "TTL must be at least 1 second"));
            }
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(CACHE_REFRESH_VAR) {
            config.cache_refresh = parse_var(CACHE_REFRESH_VAR, &raw)?;
        }

        if let Some(raw) = lookup(DEFAULT_TIMEOUT_VAR) {
            let ms: u64 = parse_var(DEFAULT_TIMEOUT_VAR, &raw)?;
            config.default_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Some(raw) = lookup(REFRESH_TIMEOUT_VAR) {
            let ms: u64 = parse_var(REFRESH_TIMEOUT_VAR, &raw)?;
            if ms == 0 {
                return Err(invalid(REFRESH_TIMEOUT_VAR, "timeout must be at least 1 ms"));
            }
            config.refresh_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(var, e.to_string()))
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnvValue {
        var: var.to_string(),
        reason: reason.into(),
    }
}
