/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, AUTH_MODE, 各 verifier の設定)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Console,
    Json,
}

#[derive(Debug)]
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

/// Strategy wired into the pipeline, chosen once at startup.
#[derive(Debug, Clone)]
pub enum AuthMode {
    None,
    ApiKey {
        keys_file: PathBuf,
    },
    Jwt {
        issuer: String,
        audience: String,
        jwks_url: Url,
        ca_cert_pem: Option<String>,
        algorithms: Vec<Algorithm>,
        leeway_seconds: u64,
    },
    Introspection {
        endpoint: Url,
        client_id: String,
    },
}

impl AuthMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey { .. } => "apikey",
            Self::Jwt { .. } => "jwt",
            Self::Introspection { .. } => "introspection",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_format: LogFormat,
    pub http_timeout_seconds: u64,

    pub auth_mode: AuthMode,
    pub enforce_auth: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads values through `get`.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            Some(f) if f == "json" => LogFormat::Json,
            _ => LogFormat::Console,
        };

        let http_timeout_seconds = get("HTTP_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let enforce_auth = match get("AUTH_ENFORCE") {
            None => false,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTH_ENFORCE"))?,
        };

        let auth_mode = auth_mode(&get)?;

        Ok(Self {
            addr,
            app_env,
            log_format,
            http_timeout_seconds,
            auth_mode,
            enforce_auth,
        })
    }
}

fn auth_mode<F>(get: &F) -> Result<AuthMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &'static str| get(key).filter(|v| !v.is_empty()).ok_or(ConfigError::Missing(key));
    let url = |key: &'static str| -> Result<Url, ConfigError> {
        Url::parse(&required(key)?).map_err(|_| ConfigError::Invalid(key))
    };

    let mode = get("AUTH_MODE")
        .unwrap_or_else(|| "none".to_string())
        .to_ascii_lowercase();

    match mode.as_str() {
        "none" | "noop" | "" => Ok(AuthMode::None),
        "apikey" | "api_key" => Ok(AuthMode::ApiKey {
            keys_file: PathBuf::from(required("API_KEYS_FILE")?),
        }),
        "jwt" => {
            let algorithms = get("JWT_ALGORITHMS")
                .unwrap_or_else(|| "RS256".to_string())
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Algorithm::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid("JWT_ALGORITHMS"))?;
            if algorithms.is_empty() {
                return Err(ConfigError::Invalid("JWT_ALGORITHMS"));
            }

            Ok(AuthMode::Jwt {
                issuer: required("AUTH_ISSUER")?,
                audience: required("AUTH_AUDIENCE")?,
                jwks_url: url("JWKS_URL")?,
                ca_cert_pem: get("JWKS_CA_CERT_PEM")
                    .filter(|v| !v.is_empty())
                    .map(|v| v.replace("\\n", "\n")),
                algorithms,
                leeway_seconds: get("ACCESS_TOKEN_LEEWAY_SECONDS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60),
            })
        }
        "introspection" | "oauth2" => Ok(AuthMode::Introspection {
            endpoint: url("INTROSPECTION_URL")?,
            client_id: required("AUTH_AUDIENCE")?,
        }),
        _ => Err(ConfigError::Invalid("AUTH_MODE")),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
