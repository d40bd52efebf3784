use revq_core::review::{DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL_SECS};

/// Gateway configuration loaded from environment variables.
///
/// All fields except the backend URL and token have sensible defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the RAG backend, e.g. `https://rag.example.com`.
    pub backend_base_url: String,
    /// Bearer token sent with every backend call.
    pub backend_token: String,
    /// Per-call timeout towards the backend in seconds (default: `30`).
    pub backend_timeout_secs: u64,
    /// Interval between waiting-count checks in seconds (default: `60`).
    pub poll_interval_secs: u64,
    /// Review items per page (default: `5`).
    pub page_size: u32,
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Required | Default                  |
    /// |------------------------|----------|--------------------------|
    /// | `HOST`                 | no       | `0.0.0.0`                |
    /// | `PORT`                 | no       | `4000`                   |
    /// | `CORS_ORIGINS`         | no       | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS` | no       | `30`                     |
    /// | `RAG_API_URL`          | yes      | --                       |
    /// | `RAG_MASTER_TOKEN`     | yes      | --                       |
    /// | `BACKEND_TIMEOUT_SECS` | no       | `30`                     |
    /// | `POLL_INTERVAL_SECS`   | no       | `60`                     |
    /// | `PAGE_SIZE`            | no       | `5`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend_base_url =
            std::env::var("RAG_API_URL").expect("RAG_API_URL must be set");
        let backend_token =
            std::env::var("RAG_MASTER_TOKEN").expect("RAG_MASTER_TOKEN must be set");

        let backend_timeout_secs: u64 = std::env::var("BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("BACKEND_TIMEOUT_SECS must be a valid u64");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let page_size: u32 = std::env::var("PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .expect("PAGE_SIZE must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            backend_base_url,
            backend_token,
            backend_timeout_secs,
            poll_interval_secs,
            page_size,
        }
    }
}
