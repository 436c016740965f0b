//! Runtime orchestration.
//!
//! The runtime turns a loaded [`UmbrellaConfig`] into a running webhook
//! gateway: it loads the command registry, builds the HTTP clients and the
//! handler chain, and serves the chain until shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use umbrella_runtime::UmbrellaRuntime;
//!
//! // Searches umbrella.toml in the current directory and the user config dir
//! let runtime = UmbrellaRuntime::builder()
//!     .profile("production")
//!     .build()?;
//!
//! // Serve until Ctrl+C or SIGTERM
//! runtime.run().await?;
//! ```
//!
//! The registry and forwarding clients are blocking. Build the runtime
//! outside of any async context and drop it only after the async runtime
//! driving [`UmbrellaRuntime::run`] has shut down.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use umbrella_framework::{
    CommandRegistry, HttpClient, RegistryLoader, RegistryResult, RegistrySource, WebhookHandler,
};
use umbrella_transport::{ListenerHandle, ReqwestClient, listen};
use url::Url;

use crate::auth::SignatureVerifier;
use crate::config::{ConfigError, ConfigLoader, RegistryConfig, UmbrellaConfig, validate_config};
use crate::error::RuntimeResult;
use crate::gateway::{Gateway, GatewayBuilder};
use crate::logging;

/// A fully assembled gateway, ready to serve.
pub struct UmbrellaRuntime {
    config: UmbrellaConfig,
    registry: Arc<CommandRegistry>,
    gateway: Arc<Gateway>,
}

impl UmbrellaRuntime {
    /// Creates a runtime builder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let runtime = UmbrellaRuntime::builder()
    ///     .config_file("config/umbrella.toml")
    ///     .registry_location("/etc/umbrella/registry.json")
    ///     .build()?;
    /// ```
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration, using reqwest for all HTTP.
    ///
    /// This initializes logging, validates the configuration and loads the
    /// command registry. A registry that cannot be loaded from any source is
    /// fatal.
    pub fn from_config(config: &UmbrellaConfig) -> RuntimeResult<Self> {
        Self::assemble(config.clone(), None, None)
    }

    fn assemble(
        config: UmbrellaConfig,
        client: Option<Arc<dyn HttpClient>>,
        registry: Option<CommandRegistry>,
    ) -> RuntimeResult<Self> {
        // try_init won't panic if already initialized
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        let registry = match registry {
            Some(registry) => registry,
            None => {
                let fetch_client: Arc<dyn HttpClient> = match &client {
                    Some(client) => client.clone(),
                    None => Arc::new(ReqwestClient::with_timeout(config.registry.fetch_timeout())?),
                };
                load_registry(&config.registry, fetch_client.as_ref())?
            }
        };
        let registry = Arc::new(registry);
        info!(commands = ?registry.commands(), "Command registry loaded");

        let client: Arc<dyn HttpClient> = match client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::with_timeout(config.forward.timeout())?),
        };

        let root = config
            .forward
            .request_url_root
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("forward.request_url_root"))?;
        let root = Url::parse(root).map_err(|e| ConfigError::invalid_url(root, e.to_string()))?;

        let mut gateway = GatewayBuilder::new(root, registry.clone(), client);
        match config.auth.signing_secret.as_deref() {
            Some(secret) if config.auth.enabled => {
                gateway = gateway.verifier(SignatureVerifier::new(secret, config.auth.max_skew()));
            }
            _ => warn!("Request authentication is disabled; every request will be accepted"),
        }
        if let Some(content_type) = &config.forward.content_type {
            gateway = gateway.content_type(content_type.clone());
        }
        let gateway = Arc::new(gateway.build()?);

        info!(
            bind_addr = %config.server.bind_addr(),
            path = %config.server.path,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            registry,
            gateway,
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &UmbrellaConfig {
        &self.config
    }

    /// The loaded command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The gateway router.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Starts the webhook listener.
    ///
    /// The listener stops when the returned handle is shut down or dropped.
    pub async fn start(&self) -> RuntimeResult<ListenerHandle> {
        let handler: Arc<dyn WebhookHandler> = self.gateway.clone();
        let handle = listen(
            &self.config.server.bind_addr(),
            &self.config.server.path,
            handler,
        )
        .await?;
        Ok(handle)
    }

    /// Runs the runtime until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let handle = self.start().await?;
        info!(addr = %handle.local_addr(), "Umbrella is now running. Press Ctrl+C to stop.");

        shutdown.await;

        handle.shutdown().await;
        info!("Runtime stopped");
        Ok(())
    }
}

/// Loads the command registry from the sources named in `config`.
///
/// Sources are tried in order: the configured file, the configured URL, then
/// the file and URL environment variables.
pub fn load_registry(
    config: &RegistryConfig,
    client: &dyn HttpClient,
) -> RegistryResult<CommandRegistry> {
    let mut loader = RegistryLoader::new(client);
    if let Some(location) = &config.location {
        loader = loader.file(location.clone());
    }
    if let Some(url) = &config.url {
        loader = loader.url(url.clone());
    }
    loader
        .source(RegistrySource::FileEnv(config.file_env_var.clone()))
        .source(RegistrySource::UrlEnv(config.url_env_var.clone()))
        .load()
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating an [`UmbrellaRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    http_client: Option<Arc<dyn HttpClient>>,
    registry: Option<CommandRegistry>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            http_client: None,
            registry: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides a single configuration key.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads the registry from `location` before any other source.
    pub fn registry_location<P: AsRef<Path>>(self, location: P) -> Self {
        self.set("registry.location", location.as_ref())
    }

    /// Uses `client` for registry downloads and forwarding instead of reqwest.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Uses an already loaded registry instead of the configured sources.
    pub fn registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<UmbrellaRuntime> {
        let config = self.config_loader.load()?;
        UmbrellaRuntime::assemble(config, self.http_client, self.registry)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use umbrella_framework::{
        HttpResponse, InboundRequest, RegistryError, TransportError, TransportResult,
    };

    const REGISTRY_JSON: &str = r#"{
        "umbrella": {
            "reservedKeywords": ["help"],
            "functions": { "deploy": { "usage": "deploy <app>", "description": "Deploy" } }
        }
    }"#;

    #[derive(Default)]
    struct FakeClient {
        posted: Mutex<Vec<String>>,
    }

    impl HttpClient for FakeClient {
        fn post(
            &self,
            url: &str,
            _content_type: &str,
            _body: String,
        ) -> TransportResult<HttpResponse> {
            self.posted.lock().push(url.to_string());
            Ok(HttpResponse::new(200, Cursor::new(b"ok".to_vec())))
        }

        fn get(&self, url: &str) -> TransportResult<HttpResponse> {
            if url == "https://registry.example.com/registry.json" {
                Ok(HttpResponse::new(200, Cursor::new(REGISTRY_JSON.as_bytes().to_vec())))
            } else {
                Ok(HttpResponse::new(404, Cursor::new(Vec::new())))
            }
        }
    }

    fn builder(client: Arc<FakeClient>) -> RuntimeBuilder {
        let dir = std::env::temp_dir().join("umbrella-runtime-tests-no-config");
        UmbrellaRuntime::builder()
            .without_env()
            .search_path(dir)
            .set("forward.request_url_root", "https://functions.example.com/api")
            .set("auth.enabled", false)
            .set("registry.file_env_var", "UMBRELLA_TEST_UNSET_REGISTRY_FILE")
            .set("registry.url_env_var", "UMBRELLA_TEST_UNSET_REGISTRY_URL")
            .http_client(client)
    }

    #[test]
    fn test_build_with_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, REGISTRY_JSON).unwrap();

        let client = Arc::new(FakeClient::default());
        let runtime = builder(client.clone())
            .registry_location(&path)
            .build()
            .unwrap();
        assert_eq!(runtime.registry().commands(), vec!["umbrella"]);
        assert_eq!(
            runtime.config().registry.location.as_deref(),
            Some(path.as_path())
        );

        let response = runtime
            .gateway()
            .handle(InboundRequest::new("command=%2Fumbrella&text=deploy+web"));
        assert_eq!(response.body, "ok");
        assert_eq!(
            *client.posted.lock(),
            vec!["https://functions.example.com/api/deploy".to_string()]
        );
    }

    #[test]
    fn test_build_with_registry_url() {
        let runtime = builder(Arc::new(FakeClient::default()))
            .set("registry.url", "https://registry.example.com/registry.json")
            .build()
            .unwrap();
        assert_eq!(runtime.registry().len(), 1);
    }

    #[test]
    fn test_file_source_wins_over_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, r#"{ "local": { "functions": {} } }"#).unwrap();

        let runtime = builder(Arc::new(FakeClient::default()))
            .registry_location(&path)
            .set("registry.url", "https://registry.example.com/registry.json")
            .build()
            .unwrap();
        assert_eq!(runtime.registry().commands(), vec!["local"]);
    }

    #[test]
    fn test_unloadable_registry_is_fatal() {
        let err = builder(Arc::new(FakeClient::default()))
            .set("registry.url", "https://registry.example.com/missing.json")
            .build()
            .err()
            .unwrap();
        match err {
            RuntimeError::Registry(RegistryError::Exhausted { attempts }) => {
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let err = UmbrellaRuntime::builder()
            .without_env()
            .search_path(std::env::temp_dir().join("umbrella-runtime-tests-no-config"))
            .set("auth.enabled", false)
            .registry(CommandRegistry::default())
            .http_client(Arc::new(FakeClient::default()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { ref field })
                if field == "forward.request_url_root"
        ));
    }

    #[test]
    fn test_auth_requires_secret() {
        let err = builder(Arc::new(FakeClient::default()))
            .set("auth.enabled", true)
            .registry(CommandRegistry::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { ref field })
                if field == "auth.signing_secret"
        ));
    }

    #[test]
    fn test_signed_gateway_rejects_unsigned_request() {
        let runtime = builder(Arc::new(FakeClient::default()))
            .set("auth.enabled", true)
            .set("auth.signing_secret", "s3cret")
            .registry(CommandRegistry::from_json(REGISTRY_JSON).unwrap())
            .build()
            .unwrap();
        let response = runtime
            .gateway()
            .handle(InboundRequest::new("command=%2Fumbrella&text=deploy"));
        assert_eq!(
            response.body,
            "Sorry...we uh...messed up. (Internal Server Error)"
        );
    }

    #[tokio::test]
    async fn test_run_until_binds_and_stops() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let runtime = builder(Arc::new(FakeClient::default()))
            .set("server.host", "127.0.0.1")
            .set("server.port", port)
            .registry(CommandRegistry::default())
            .build()
            .unwrap();

        runtime.run_until(async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let runtime = builder(Arc::new(FakeClient::default()))
            .set("server.host", "127.0.0.1")
            .set("server.port", taken.local_addr().unwrap().port())
            .registry(CommandRegistry::default())
            .build()
            .unwrap();

        let err = runtime.start().await.err().unwrap();
        assert!(matches!(
            err,
            RuntimeError::Transport(TransportError::Bind { .. })
        ));
    }
}
