//! Per-call codec options.

use crate::{CodecError, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

/// String key/value options forwarded to a codec on one `load` or `save`.
///
/// Each codec reads the keys it understands and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecOptions {
    values: BTreeMap<String, String>,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parse a `key=value` pair, as given on the command line
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(CodecError::invalid_option(pair, "")),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean option accepting `true/false`, `yes/no`, `1/0`
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(CodecError::invalid_option(key, value)),
            },
        }
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| CodecError::invalid_option(key, value))
            })
            .transpose()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodecOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = CodecOptions::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let options = CodecOptions::new()
            .with("pretty", "no")
            .with("quality", "75")
            .with("separator", ";");

        assert!(!options.get_bool("pretty", true).unwrap());
        assert!(options.get_bool("missing", true).unwrap());
        assert_eq!(options.get_parsed::<u8>("quality").unwrap(), Some(75));
        assert_eq!(options.get_parsed::<u8>("missing").unwrap(), None);
        assert_eq!(options.get("separator"), Some(";"));
    }

    #[test]
    fn test_invalid_values() {
        let options = CodecOptions::new().with("pretty", "maybe").with("quality", "high");
        assert!(matches!(
            options.get_bool("pretty", true),
            Err(CodecError::InvalidOption { .. })
        ));
        assert!(options.get_parsed::<u8>("quality").is_err());
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            CodecOptions::parse_pair("separator=;").unwrap(),
            ("separator".to_string(), ";".to_string())
        );
        assert_eq!(
            CodecOptions::parse_pair("title=a=b").unwrap(),
            ("title".to_string(), "a=b".to_string())
        );
        assert!(CodecOptions::parse_pair("novalue").is_err());
        assert!(CodecOptions::parse_pair("=x").is_err());
    }
}
