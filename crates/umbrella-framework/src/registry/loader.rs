//! Cascading registry loading.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use super::{CommandRegistry, RegistryError, RegistryResult};
use crate::transport::HttpClient;

/// Default environment variable naming a registry file.
pub const DEFAULT_FILE_ENV_VAR: &str = "REGISTRY_FILE_PATH";
/// Default environment variable naming a registry URL.
pub const DEFAULT_URL_ENV_VAR: &str = "REGISTRY_URL";

/// One place a registry can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// A JSON file on disk.
    File(PathBuf),
    /// A JSON document served over HTTP.
    Url(String),
    /// A file whose path is read from the named environment variable.
    FileEnv(String),
    /// A URL read from the named environment variable.
    UrlEnv(String),
}

impl RegistrySource {
    fn load(&self, client: &dyn HttpClient) -> RegistryResult<CommandRegistry> {
        match self {
            Self::File(path) => CommandRegistry::from_file(path),
            Self::Url(url) => CommandRegistry::from_url(client, url),
            Self::FileEnv(var) => CommandRegistry::from_file(env_value(var)),
            Self::UrlEnv(var) => CommandRegistry::from_url(client, &env_value(var)),
        }
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file '{}'", path.display()),
            Self::Url(url) => write!(f, "url '{url}'"),
            Self::FileEnv(var) => write!(f, "file from ${var}"),
            Self::UrlEnv(var) => write!(f, "url from ${var}"),
        }
    }
}

/// Unset and non-unicode variables read as empty, which the sources reject.
fn env_value(var: &str) -> String {
    std::env::var(var).unwrap_or_default()
}

/// Loads a [`CommandRegistry`] from the first source that works.
///
/// Sources are tried in the order they were added. Environment variables are
/// read when [`load`](Self::load) runs, not when the source is added.
///
/// # Example
///
/// ```ignore
/// let registry = RegistryLoader::new(&client)
///     .file("/etc/umbrella/registry.json")
///     .with_default_env()
///     .load()?;
/// ```
pub struct RegistryLoader<'a> {
    client: &'a dyn HttpClient,
    sources: Vec<RegistrySource>,
}

impl<'a> RegistryLoader<'a> {
    /// Creates a loader with no sources.
    pub fn new(client: &'a dyn HttpClient) -> Self {
        Self {
            client,
            sources: Vec::new(),
        }
    }

    /// Adds a source.
    pub fn source(mut self, source: RegistrySource) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds a file source.
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.source(RegistrySource::File(path.into()))
    }

    /// Adds a URL source.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.source(RegistrySource::Url(url.into()))
    }

    /// Adds the [`DEFAULT_FILE_ENV_VAR`] and [`DEFAULT_URL_ENV_VAR`] sources.
    pub fn with_default_env(self) -> Self {
        self.source(RegistrySource::FileEnv(DEFAULT_FILE_ENV_VAR.into()))
            .source(RegistrySource::UrlEnv(DEFAULT_URL_ENV_VAR.into()))
    }

    /// The configured sources in order.
    pub fn sources(&self) -> &[RegistrySource] {
        &self.sources
    }

    /// Tries each source in order and returns the first registry that loads
    /// and parses.
    pub fn load(&self) -> RegistryResult<CommandRegistry> {
        let mut attempts = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.load(self.client) {
                Ok(registry) => {
                    info!(source = %source, commands = registry.len(), "Registry loaded");
                    return Ok(registry);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Registry source failed");
                    attempts.push(format!("{source}: {e}"));
                }
            }
        }
        Err(RegistryError::Exhausted { attempts })
    }
}

impl fmt::Debug for RegistryLoader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLoader")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportResult};
    use crate::registry::tests::REGISTRY_JSON;
    use crate::transport::HttpResponse;
    use parking_lot::Mutex;
    use std::io::Cursor;

    /// Serves [`REGISTRY_JSON`] for one URL and 404 for everything else.
    struct FakeClient {
        url: &'static str,
        gets: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn serving(url: &'static str) -> Self {
            Self {
                url,
                gets: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for FakeClient {
        fn post(&self, url: &str, _: &str, _: String) -> TransportResult<HttpResponse> {
            Err(TransportError::request(url, "unused"))
        }

        fn get(&self, url: &str) -> TransportResult<HttpResponse> {
            self.gets.lock().push(url.to_string());
            if url == self.url {
                Ok(HttpResponse::new(200, Cursor::new(REGISTRY_JSON)))
            } else {
                Ok(HttpResponse::new(404, Cursor::new("not found")))
            }
        }
    }

    #[test]
    fn test_file_source_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, REGISTRY_JSON).unwrap();
        let client = FakeClient::serving("https://registry.example.com/r.json");

        let registry = RegistryLoader::new(&client)
            .file(&path)
            .url("https://registry.example.com/r.json")
            .load()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(client.gets.lock().is_empty());
    }

    #[test]
    fn test_falls_through_to_url() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::serving("https://registry.example.com/r.json");

        let registry = RegistryLoader::new(&client)
            .file(dir.path().join("missing.json"))
            .url("https://registry.example.com/r.json")
            .load()
            .unwrap();

        assert!(registry.command("umbrella").is_some());
        assert_eq!(*client.gets.lock(), vec!["https://registry.example.com/r.json"]);
    }

    #[test]
    fn test_empty_sources_fail_without_io() {
        let client = FakeClient::serving("unused");
        let err = RegistryLoader::new(&client)
            .file("")
            .url("")
            .load()
            .unwrap_err();

        let RegistryError::Exhausted { attempts } = err else {
            panic!("expected exhausted, got {err:?}");
        };
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].contains("must not be empty"));
        assert!(attempts[1].contains("must not be empty"));
        assert!(client.gets.lock().is_empty());
    }

    #[test]
    fn test_non_success_status_is_fetch_error() {
        let client = FakeClient::serving("https://registry.example.com/r.json");
        assert!(matches!(
            CommandRegistry::from_url(&client, "https://registry.example.com/other.json"),
            Err(RegistryError::Fetch(TransportError::Status { status: 404, .. }))
        ));
    }

    #[test]
    fn test_env_sources_read_at_load() {
        const FILE_VAR: &str = "UMBRELLA_TEST_LOADER_REGISTRY_FILE";
        const URL_VAR: &str = "UMBRELLA_TEST_LOADER_REGISTRY_URL";

        let client = FakeClient::serving("https://env.example.com/r.json");
        let loader = RegistryLoader::new(&client)
            .source(RegistrySource::FileEnv(FILE_VAR.into()))
            .source(RegistrySource::UrlEnv(URL_VAR.into()));

        // SAFETY: the variable names are unique to this test.
        unsafe {
            std::env::remove_var(FILE_VAR);
            std::env::set_var(URL_VAR, "https://env.example.com/r.json");
        }

        let registry = loader.load().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(*client.gets.lock(), vec!["https://env.example.com/r.json"]);

        unsafe {
            std::env::remove_var(URL_VAR);
        }
        assert!(matches!(loader.load(), Err(RegistryError::Exhausted { .. })));
    }

    #[test]
    fn test_default_env_sources() {
        let client = FakeClient::serving("unused");
        let loader = RegistryLoader::new(&client).file("a.json").with_default_env();
        assert_eq!(
            loader.sources(),
            &[
                RegistrySource::File("a.json".into()),
                RegistrySource::FileEnv(DEFAULT_FILE_ENV_VAR.into()),
                RegistrySource::UrlEnv(DEFAULT_URL_ENV_VAR.into()),
            ]
        );
    }
}
