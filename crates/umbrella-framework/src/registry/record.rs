//! Registry records.

use std::collections::HashMap;

use serde::Deserialize;

/// Description of one function a command can run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FunctionRecord {
    /// How to use the function with the command.
    pub usage: String,
    /// What the function does.
    pub description: String,
    /// Where to find more information on the function.
    pub manual: String,
}

/// Description of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommandRecord {
    /// Words the gateway answers itself instead of treating them as a
    /// function name (e.g. `help`).
    pub reserved_keywords: Vec<String>,
    /// The command's functions, keyed by lowercased name.
    pub functions: FunctionTable,
}

impl CommandRecord {
    /// Looks up a function by name, ignoring case.
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.get(name)
    }

    /// Returns `true` if `word` is a reserved keyword, ignoring case.
    ///
    /// Folds case the same way function names do.
    pub fn is_reserved(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.reserved_keywords
            .iter()
            .any(|k| k.to_lowercase() == word)
    }

    /// Function names, sorted.
    pub fn function_names(&self) -> Vec<String> {
        self.functions.names()
    }
}

/// Case-insensitive map of function name to [`FunctionRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, FunctionRecord>")]
pub struct FunctionTable(HashMap<String, FunctionRecord>);

impl FunctionTable {
    /// Looks up a function by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&FunctionRecord> {
        self.0.get(&name.to_lowercase())
    }

    /// Lowercased function names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterates over `(name, record)` pairs sorted by name.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &FunctionRecord)> {
        let mut entries: Vec<_> = self.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, FunctionRecord>> for FunctionTable {
    fn from(map: HashMap<String, FunctionRecord>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CommandRecord {
        let functions: HashMap<String, FunctionRecord> = [
            ("Ärger".to_string(), FunctionRecord::default()),
            ("Deploy".to_string(), FunctionRecord::default()),
        ]
        .into_iter()
        .collect();
        CommandRecord {
            reserved_keywords: vec!["Help".to_string(), "Überblick".to_string()],
            functions: functions.into(),
        }
    }

    #[test]
    fn test_function_lookup_folds_case() {
        let record = record();
        assert!(record.function("deploy").is_some());
        assert!(record.function("ÄRGER").is_some());
        assert!(record.function("ärger").is_some());
        assert!(record.function("missing").is_none());
        assert_eq!(record.function_names(), vec!["deploy", "ärger"]);
    }

    #[test]
    fn test_reserved_folds_like_functions() {
        let record = record();
        assert!(record.is_reserved("help"));
        assert!(record.is_reserved("HELP"));
        assert!(record.is_reserved("überblick"));
        assert!(record.is_reserved("ÜBERBLICK"));
        assert!(!record.is_reserved("deploy"));
    }
}
