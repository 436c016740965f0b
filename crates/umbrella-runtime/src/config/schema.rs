//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use umbrella_framework::registry::{DEFAULT_FILE_ENV_VAR, DEFAULT_URL_ENV_VAR};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UmbrellaConfig {
    /// Webhook listener settings.
    pub server: ServerConfig,
    /// Downstream forwarding settings.
    pub forward: ForwardConfig,
    /// Command registry sources.
    pub registry: RegistryConfig,
    /// Request signature verification.
    pub auth: AuthConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

// =============================================================================
// Server
// =============================================================================

/// Webhook listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path that receives webhook calls.
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            path: "/".to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Forward
// =============================================================================

/// Downstream forwarding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Root URL functions are resolved against; the function name is
    /// appended as a path segment.
    pub request_url_root: Option<String>,
    /// Timeout for forwarded requests in milliseconds.
    pub timeout_ms: u64,
    /// Content type sent downstream. Defaults to the inbound content type.
    pub content_type: Option<String>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            request_url_root: None,
            timeout_ms: 2000,
            content_type: None,
        }
    }
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Where the command registry is loaded from.
///
/// Sources are tried in field order: `location`, `url`, then the file and
/// URL environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry file path.
    pub location: Option<PathBuf>,
    /// Registry URL.
    pub url: Option<String>,
    /// Environment variable holding a registry file path.
    pub file_env_var: String,
    /// Environment variable holding a registry URL.
    pub url_env_var: String,
    /// Timeout for downloading the registry in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            location: None,
            url: None,
            file_env_var: DEFAULT_FILE_ENV_VAR.to_string(),
            url_env_var: DEFAULT_URL_ENV_VAR.to_string(),
            fetch_timeout_ms: 5000,
        }
    }
}

impl RegistryConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Request signature verification configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether inbound requests must carry a valid signature.
    pub enabled: bool,
    /// Shared signing secret.
    pub signing_secret: Option<String>,
    /// Maximum accepted age of a request timestamp in seconds.
    pub max_skew_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            signing_secret: None,
            max_skew_secs: 300,
        }
    }
}

impl AuthConfig {
    pub fn max_skew(&self) -> Duration {
        Duration::from_secs(self.max_skew_secs)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("max_skew_secs", &self.max_skew_secs)
            .finish()
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Output destination.
    pub output: LogOutput,
    /// Log file path, used with [`LogOutput::File`].
    pub file_path: Option<PathBuf>,
    /// How often the log file is rotated.
    pub rotation: LogRotation,
    /// Number of rotated log files to keep.
    pub max_files: u32,
    /// Include thread IDs.
    pub thread_ids: bool,
    /// Include source file and line.
    pub file_location: bool,
    /// Span lifecycle events to log.
    pub span_events: SpanEventConfig,
    /// Per-module levels, e.g. `umbrella_core = "trace"`.
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            max_files: 5,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: BTreeMap::new(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}
