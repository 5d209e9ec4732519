/*
 * Responsibility
 * - ヘッダから scheme 付きトークンを 1 つだけ取り出す (Bearer / Apikey)
 * - 取り出せない場合は「認証情報なし」として None を返す (エラーではない)
 */
use axum::http::{HeaderMap, HeaderName, header};

/// Scheme label a credential is presented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `Authorization: Bearer <token>` (JWT, introspection)
    Bearer,
    /// `X-Authorization: Apikey <token>` (API key)
    Apikey,
}

impl Scheme {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Apikey => "Apikey",
        }
    }

    pub fn header_name(&self) -> HeaderName {
        match self {
            Self::Bearer => header::AUTHORIZATION,
            Self::Apikey => HeaderName::from_static("x-authorization"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: Scheme,
    pub token: String,
}

/// Returns the trimmed token following `scheme`'s label.
///
/// The label must occur exactly once and the remainder must not be blank.
/// Matching is case-sensitive.
pub fn extract(header_value: Option<&str>, scheme: Scheme) -> Option<Credential> {
    let value = header_value?;
    let label = scheme.label();

    if value.matches(label).count() != 1 {
        return None;
    }

    let (_, rest) = value.split_once(label)?;
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }

    Some(Credential {
        scheme,
        token: token.to_string(),
    })
}

/// Looks up `scheme`'s header and extracts a credential from it.
/// Non-UTF-8 header values are treated as absent.
pub fn from_headers(headers: &HeaderMap, scheme: Scheme) -> Option<Credential> {
    let value = headers
        .get(scheme.header_name())
        .and_then(|v| v.to_str().ok());
    extract(value, scheme)
}
