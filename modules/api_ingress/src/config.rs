use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    pub cors_enabled: bool,
    /// Empty list with CORS enabled means any origin.
    pub allowed_origins: Vec<String>,
    pub request_timeout_sec: u64,
    pub body_limit_bytes: usize,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer.
    pub jwt_secret: String,
    /// Cookie consulted when no Authorization header is sent.
    pub cookie_name: String,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            cors_enabled: false,
            allowed_origins: Vec::new(),
            request_timeout_sec: 30,
            body_limit_bytes: 1024 * 1024,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            cookie_name: "tokens".to_string(),
        }
    }
}
