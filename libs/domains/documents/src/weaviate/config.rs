use crate::error::DocumentResult;

/// Weaviate connection configuration
#[derive(Debug, Clone)]
pub struct WeaviateConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl WeaviateConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
            timeout_secs: 30,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn from_env() -> DocumentResult<Self> {
        let host = std::env::var("WEAVIATE_HOST").unwrap_or_else(|_| "localhost".to_string());

        let port = std::env::var("WEAVIATE_C_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let scheme = std::env::var("WEAVIATE_SCHEME").unwrap_or_else(|_| "http".to_string());

        let timeout_secs = std::env::var("WEAVIATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            scheme,
            host,
            port,
            timeout_secs,
        })
    }
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self::new("localhost", 8080)
    }
}
