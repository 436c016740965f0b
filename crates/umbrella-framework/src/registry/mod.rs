//! Command registry.
//!
//! The registry maps command names to [`CommandRecord`]s, and each record maps
//! function names to [`FunctionRecord`]s. Both levels are case-insensitive:
//! keys are lowercased when the registry is parsed and lookups lowercase
//! their input.
//!
//! # Format
//!
//! ```json
//! {
//!   "umbrella": {
//!     "reservedKeywords": ["help"],
//!     "functions": {
//!       "deploy": {
//!         "usage": "/umbrella deploy <app> <env>",
//!         "description": "Deploys an app.",
//!         "manual": "https://wiki.example.com/deploy"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Registries are usually obtained from a [`RegistryLoader`], which tries
//! several [`RegistrySource`]s in order.

mod error;
mod loader;
mod record;

pub use error::{RegistryError, RegistryResult};
pub use loader::{DEFAULT_FILE_ENV_VAR, DEFAULT_URL_ENV_VAR, RegistryLoader, RegistrySource};
pub use record::{CommandRecord, FunctionRecord, FunctionTable};

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::HttpClient;

/// Case-insensitive registry of commands and their functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, CommandRecord>")]
pub struct CommandRegistry {
    commands: HashMap<String, CommandRecord>,
}

impl CommandRegistry {
    /// Parses a registry from JSON text.
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::Parse(e.to_string()))
    }

    /// Reads and parses a registry file.
    pub fn from_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(RegistryError::EmptyLocation);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let registry = Self::from_json(&contents)?;
        debug!(path = %path.display(), commands = registry.len(), "Loaded registry file");
        Ok(registry)
    }

    /// Downloads and parses a registry with `client`.
    ///
    /// Non-2xx responses are reported as [`RegistryError::Fetch`].
    pub fn from_url(client: &dyn HttpClient, url: &str) -> RegistryResult<Self> {
        if url.is_empty() {
            return Err(RegistryError::EmptyUrl);
        }
        let response = client.get(url)?;
        if !response.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status,
            }
            .into());
        }
        let contents = response
            .text()
            .map_err(|e| TransportError::request(url, e))?;
        let registry = Self::from_json(&contents)?;
        debug!(url, commands = registry.len(), "Downloaded registry");
        Ok(registry)
    }

    /// Looks up a command, ignoring case.
    pub fn command(&self, name: &str) -> Option<&CommandRecord> {
        self.commands.get(&name.to_lowercase())
    }

    /// Resolves the function named by the first argument of `command`.
    ///
    /// Checks run in order: the command must be registered, at least one
    /// argument must be given, and the first argument must name one of the
    /// command's functions.
    pub fn function_record(
        &self,
        command: &str,
        args: &[String],
    ) -> RegistryResult<&FunctionRecord> {
        let record = self
            .command(command)
            .ok_or_else(|| RegistryError::CommandNotFound(command.to_string()))?;
        let function = args.first().ok_or(RegistryError::ArgsMissing)?;
        record
            .function(function)
            .ok_or_else(|| RegistryError::FunctionNotFound {
                function: function.clone(),
                available: record.function_names(),
            })
    }

    /// Renders the usage listing for `command`, one function per line,
    /// sorted by function name.
    pub fn usage(&self, command: &str) -> RegistryResult<String> {
        let record = self
            .command(command)
            .ok_or_else(|| RegistryError::CommandNotFound(command.to_string()))?;

        let mut listing = String::new();
        for (name, function) in record.functions.iter_sorted() {
            let _ = write!(listing, "{name}");
            if !function.usage.is_empty() {
                let _ = write!(listing, ": {}", function.usage);
            }
            if !function.description.is_empty() {
                let _ = write!(listing, " - {}", function.description);
            }
            listing.push('\n');
        }
        if listing.ends_with('\n') {
            listing.pop();
        }
        Ok(listing)
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<HashMap<String, CommandRecord>> for CommandRegistry {
    fn from(map: HashMap<String, CommandRecord>) -> Self {
        Self {
            commands: map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect(),
        }
    }
}
