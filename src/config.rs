/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, realm, whitelist 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - whitelist の default principal は必ず運用者が設定する (コードに埋め込まない)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::{HeaderName, HeaderValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the trusted-network bypass. `None` in `Config` when disabled.
#[derive(Debug, Clone)]
pub struct WhitelistConfig {
    pub header_name: HeaderName,
    pub header_value: HeaderValue,
    pub default_principal: String,
    pub admin_paths: Vec<String>,
    pub collection_kinds: Vec<String>,
    pub dav_base_path: String,
    pub inject_authorization: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub auth_realm: String,

    pub whitelist: Option<WhitelistConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = get("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let auth_realm = get("AUTH_REALM").unwrap_or_else(|| "BaikalDAV".to_string());
        if auth_realm.is_empty() || auth_realm.contains('"') {
            return Err(ConfigError::Invalid("AUTH_REALM"));
        }

        let whitelist = if parse_bool(get("WHITELIST_ENABLED"), false, "WHITELIST_ENABLED")? {
            Some(WhitelistConfig::from_lookup(&get)?)
        } else {
            None
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            auth_realm,
            whitelist,
        })
    }
}

impl WhitelistConfig {
    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let header_name = get("WHITELIST_HEADER")
            .unwrap_or_else(|| "X-Baikal-Whitelist".to_string());
        let header_name = HeaderName::from_bytes(header_name.trim().as_bytes())
            .map_err(|_| ConfigError::Invalid("WHITELIST_HEADER"))?;

        let header_value = get("WHITELIST_HEADER_VALUE").unwrap_or_else(|| "1".to_string());
        if header_value.is_empty() {
            return Err(ConfigError::Invalid("WHITELIST_HEADER_VALUE"));
        }
        let header_value = HeaderValue::from_str(&header_value)
            .map_err(|_| ConfigError::Invalid("WHITELIST_HEADER_VALUE"))?;

        let default_principal = get("WHITELIST_DEFAULT_PRINCIPAL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("WHITELIST_DEFAULT_PRINCIPAL"))?;
        // ':' would split the synthesized Basic credential
        if default_principal.contains(':') {
            return Err(ConfigError::Invalid("WHITELIST_DEFAULT_PRINCIPAL"));
        }

        let admin_paths = parse_list(get("WHITELIST_ADMIN_PATHS"), "/admin/,/install/,/res/");
        if admin_paths
            .iter()
            .any(|p| !p.starts_with('/') || p.trim_end_matches('/').is_empty())
        {
            return Err(ConfigError::Invalid("WHITELIST_ADMIN_PATHS"));
        }

        let collection_kinds =
            parse_list(get("WHITELIST_COLLECTION_KINDS"), "calendars,addressbooks");
        if collection_kinds.is_empty() || collection_kinds.iter().any(|k| k.contains('/')) {
            return Err(ConfigError::Invalid("WHITELIST_COLLECTION_KINDS"));
        }

        let dav_base_path = get("DAV_BASE_PATH").unwrap_or_default().trim().to_string();
        if !dav_base_path.is_empty() && !dav_base_path.starts_with('/') {
            return Err(ConfigError::Invalid("DAV_BASE_PATH"));
        }

        let inject_authorization = parse_bool(
            get("WHITELIST_INJECT_AUTHORIZATION"),
            true,
            "WHITELIST_INJECT_AUTHORIZATION",
        )?;

        Ok(Self {
            header_name,
            header_value,
            default_principal,
            admin_paths,
            collection_kinds,
            dav_base_path,
            inject_authorization,
        })
    }
}

fn parse_list(value: Option<String>, default: &str) -> Vec<String> {
    value
        .unwrap_or_else(|| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
}

fn parse_bool(
    value: Option<String>,
    default: bool,
    key: &'static str,
) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(load(&[]).err(), Some(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn whitelist_is_off_by_default() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/dav")]).unwrap();
        assert!(config.whitelist.is_none());
        assert_eq!(config.auth_realm, "BaikalDAV");
        assert_eq!(config.addr.port(), 3000);
        assert!(!config.app_env.is_production());
    }

    #[test]
    fn enabling_whitelist_requires_a_default_principal() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/dav"),
            ("WHITELIST_ENABLED", "true"),
        ])
        .err();
        assert_eq!(err, Some(ConfigError::Missing("WHITELIST_DEFAULT_PRINCIPAL")));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/dav"),
            ("WHITELIST_ENABLED", "true"),
            ("WHITELIST_DEFAULT_PRINCIPAL", "   "),
        ])
        .err();
        assert_eq!(err, Some(ConfigError::Missing("WHITELIST_DEFAULT_PRINCIPAL")));
    }

    #[test]
    fn whitelist_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/dav"),
            ("WHITELIST_ENABLED", "1"),
            ("WHITELIST_DEFAULT_PRINCIPAL", "frontdesk"),
        ])
        .unwrap();
        let whitelist = config.whitelist.expect("whitelist enabled");

        assert_eq!(whitelist.header_name.as_str(), "x-baikal-whitelist");
        assert_eq!(whitelist.header_value, "1");
        assert_eq!(whitelist.default_principal, "frontdesk");
        assert_eq!(whitelist.admin_paths, vec!["/admin/", "/install/", "/res/"]);
        assert_eq!(whitelist.collection_kinds, vec!["calendars", "addressbooks"]);
        assert_eq!(whitelist.dav_base_path, "");
        assert!(whitelist.inject_authorization);
    }

    #[test]
    fn invalid_whitelist_values_are_rejected() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/dav"),
            ("WHITELIST_ENABLED", "1"),
            ("WHITELIST_DEFAULT_PRINCIPAL", "frontdesk"),
        ];
        let cases: [((&str, &str), &str); 7] = [
            (("WHITELIST_HEADER", "bad header"), "WHITELIST_HEADER"),
            (("WHITELIST_HEADER_VALUE", ""), "WHITELIST_HEADER_VALUE"),
            (("WHITELIST_DEFAULT_PRINCIPAL", "a:b"), "WHITELIST_DEFAULT_PRINCIPAL"),
            (("WHITELIST_ADMIN_PATHS", "/admin/,/"), "WHITELIST_ADMIN_PATHS"),
            (("WHITELIST_COLLECTION_KINDS", "a/b"), "WHITELIST_COLLECTION_KINDS"),
            (("DAV_BASE_PATH", "dav.php"), "DAV_BASE_PATH"),
            (("WHITELIST_INJECT_AUTHORIZATION", "maybe"), "WHITELIST_INJECT_AUTHORIZATION"),
        ];

        for (override_var, key) in cases {
            let mut vars: Vec<(&str, &str)> = base
                .iter()
                .copied()
                .filter(|(k, _)| *k != override_var.0)
                .collect();
            vars.push(override_var);
            assert_eq!(load(&vars).err(), Some(ConfigError::Invalid(key)), "{key}");
        }
    }

    #[test]
    fn invalid_enable_flag_is_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/dav"),
            ("WHITELIST_ENABLED", "sometimes"),
        ])
        .err();
        assert_eq!(err, Some(ConfigError::Invalid("WHITELIST_ENABLED")));
    }
}
