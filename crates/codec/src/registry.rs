//! Extension to codec bindings.

use crate::{
    normalize_extension, CodecError, CodecOptions, Operation, Payload, Result, TransferMode,
};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

type DecodeFn = dyn Fn(&mut dyn Read, &CodecOptions) -> Result<Payload> + Send + Sync;
type EncodeFn = dyn Fn(&Payload, &mut dyn Write, &CodecOptions) -> Result<()> + Send + Sync;

/// Decode function plus the mode its stream must be opened in.
#[derive(Clone)]
pub struct Loader {
    decode: Arc<DecodeFn>,
    mode: TransferMode,
}

impl Loader {
    /// Loader fed raw bytes
    pub fn binary<F>(decode: F) -> Self
    where
        F: Fn(&mut dyn Read, &CodecOptions) -> Result<Payload> + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(decode),
            mode: TransferMode::BinaryRead,
        }
    }

    /// Loader fed UTF-8 text with `\n` line endings
    pub fn text<F>(decode: F) -> Self
    where
        F: Fn(&mut dyn Read, &CodecOptions) -> Result<Payload> + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(decode),
            mode: TransferMode::TextRead,
        }
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    pub fn decode(&self, reader: &mut dyn Read, options: &CodecOptions) -> Result<Payload> {
        (self.decode)(reader, options)
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader").field("mode", &self.mode).finish()
    }
}

/// Encode function plus the mode its stream must be opened in.
#[derive(Clone)]
pub struct Saver {
    encode: Arc<EncodeFn>,
    mode: TransferMode,
}

impl Saver {
    /// Saver writing raw bytes
    pub fn binary<F>(encode: F) -> Self
    where
        F: Fn(&Payload, &mut dyn Write, &CodecOptions) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            mode: TransferMode::BinaryWrite,
        }
    }

    /// Saver whose output must be valid UTF-8
    pub fn text<F>(encode: F) -> Self
    where
        F: Fn(&Payload, &mut dyn Write, &CodecOptions) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            mode: TransferMode::TextWrite,
        }
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    pub fn encode(
        &self,
        payload: &Payload,
        writer: &mut dyn Write,
        options: &CodecOptions,
    ) -> Result<()> {
        (self.encode)(payload, writer, options)
    }
}

impl fmt::Debug for Saver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saver").field("mode", &self.mode).finish()
    }
}

#[derive(Debug, Clone)]
enum Binding<T> {
    Ready(T),
    /// Known extension whose codec family was compiled out
    Unavailable(&'static str),
}

/// Loader and saver tables keyed by normalised extension.
///
/// Built once per facade and read-only afterwards, so one registry can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    loaders: HashMap<String, Binding<Loader>>,
    savers: HashMap<String, Binding<Saver>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CodecRegistry {
    /// Registry with no bindings at all
    pub fn empty() -> Self {
        Self {
            loaders: HashMap::new(),
            savers: HashMap::new(),
        }
    }

    /// Registry holding the built-in bindings
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        crate::formats::register_builtin(&mut registry);
        registry
    }

    /// Built-in bindings with caller tables merged on top; on a key
    /// collision the caller's binding wins.
    pub fn new(
        extra_loaders: Option<HashMap<String, Loader>>,
        extra_savers: Option<HashMap<String, Saver>>,
    ) -> Self {
        let mut registry = Self::builtin();
        for (extension, loader) in extra_loaders.into_iter().flatten() {
            registry.insert_loader(&extension, loader);
        }
        for (extension, saver) in extra_savers.into_iter().flatten() {
            registry.insert_saver(&extension, saver);
        }
        registry
    }

    pub fn with_loader(mut self, extension: &str, loader: Loader) -> Self {
        self.insert_loader(extension, loader);
        self
    }

    pub fn with_saver(mut self, extension: &str, saver: Saver) -> Self {
        self.insert_saver(extension, saver);
        self
    }

    pub fn insert_loader(&mut self, extension: &str, loader: Loader) {
        let extension = normalize_extension(extension);
        if self.loaders.contains_key(&extension) {
            tracing::debug!("Replacing loader for '{}'", extension);
        }
        self.loaders.insert(extension, Binding::Ready(loader));
    }

    pub fn insert_saver(&mut self, extension: &str, saver: Saver) {
        let extension = normalize_extension(extension);
        if self.savers.contains_key(&extension) {
            tracing::debug!("Replacing saver for '{}'", extension);
        }
        self.savers.insert(extension, Binding::Ready(saver));
    }

    /// Record `extensions` as known but needing `feature`
    #[cfg_attr(
        all(feature = "tabular", feature = "image", feature = "document"),
        allow(dead_code)
    )]
    pub(crate) fn mark_unavailable(&mut self, extensions: &[&str], feature: &'static str) {
        for extension in extensions {
            self.loaders
                .insert(extension.to_string(), Binding::Unavailable(feature));
            self.savers
                .insert(extension.to_string(), Binding::Unavailable(feature));
        }
    }

    pub fn resolve_loader(&self, extension: &str) -> Result<&Loader> {
        let extension = normalize_extension(extension);
        resolve(&self.loaders, extension, Operation::Load)
    }

    pub fn resolve_saver(&self, extension: &str) -> Result<&Saver> {
        let extension = normalize_extension(extension);
        resolve(&self.savers, extension, Operation::Save)
    }

    /// Sorted extensions present in the loader table
    pub fn loader_extensions(&self) -> Vec<&str> {
        sorted_keys(&self.loaders)
    }

    /// Sorted extensions present in the saver table
    pub fn saver_extensions(&self) -> Vec<&str> {
        sorted_keys(&self.savers)
    }

    /// Sorted extensions bound in either table, each listed once
    pub fn extensions(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .loaders
            .keys()
            .chain(self.savers.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

fn resolve<T>(
    table: &HashMap<String, Binding<T>>,
    extension: String,
    operation: Operation,
) -> Result<&T> {
    match table.get(&extension) {
        Some(Binding::Ready(binding)) => Ok(binding),
        Some(Binding::Unavailable(feature)) => Err(CodecError::MissingDependency {
            extension,
            feature,
        }),
        None => Err(CodecError::UnsupportedFormat {
            extension,
            operation,
        }),
    }
}

fn sorted_keys<T>(table: &HashMap<String, Binding<T>>) -> Vec<&str> {
    let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper_text_loader() -> Loader {
        Loader::text(|reader, _options| {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            Ok(Payload::Text(text.to_uppercase()))
        })
    }

    #[test]
    fn test_builtin_tables_match() {
        let registry = CodecRegistry::builtin();
        assert_eq!(registry.loader_extensions(), registry.saver_extensions());
        assert_eq!(
            registry.loader_extensions(),
            vec![
                "csv", "docx", "jpg", "json", "md", "parquet", "pdf", "png", "pptx", "sql",
                "toml", "txt", "xlsx", "xml", "yaml", "yml"
            ]
        );
    }

    #[test]
    fn test_builtin_modes() {
        let registry = CodecRegistry::builtin();
        for text in ["json", "toml", "yaml", "yml", "txt", "md", "sql"] {
            assert_eq!(
                registry.resolve_loader(text).unwrap().mode(),
                TransferMode::TextRead,
                "{text}"
            );
            assert_eq!(
                registry.resolve_saver(text).unwrap().mode(),
                TransferMode::TextWrite,
                "{text}"
            );
        }
        assert_eq!(
            registry.resolve_loader("xml").unwrap().mode(),
            TransferMode::BinaryRead
        );
        assert_eq!(
            registry.resolve_saver("xml").unwrap().mode(),
            TransferMode::BinaryWrite
        );
    }

    #[cfg(all(feature = "tabular", feature = "image", feature = "document"))]
    #[test]
    fn test_builtin_binary_modes() {
        let registry = CodecRegistry::builtin();
        for binary in ["csv", "xlsx", "parquet", "docx", "pdf", "pptx", "png", "jpg"] {
            assert_eq!(
                registry.resolve_loader(binary).unwrap().mode(),
                TransferMode::BinaryRead,
                "{binary}"
            );
            assert_eq!(
                registry.resolve_saver(binary).unwrap().mode(),
                TransferMode::BinaryWrite,
                "{binary}"
            );
        }
    }

    #[test]
    fn test_unknown_extension() {
        let registry = CodecRegistry::builtin();
        let error = registry.resolve_loader("foobar").unwrap_err();
        assert!(matches!(
            error,
            CodecError::UnsupportedFormat {
                ref extension,
                operation: Operation::Load
            } if extension == "foobar"
        ));
        assert!(matches!(
            registry.resolve_saver("foobar"),
            Err(CodecError::UnsupportedFormat {
                operation: Operation::Save,
                ..
            })
        ));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CodecRegistry::builtin();
        assert!(registry.resolve_loader("JSON").is_ok());
        assert!(registry.resolve_saver(".Txt").is_ok());
    }

    #[test]
    fn test_override_replaces_builtin() {
        let registry = CodecRegistry::builtin().with_loader("txt", upper_text_loader());
        let loader = registry.resolve_loader("txt").unwrap();

        let payload = loader
            .decode(&mut "shout".as_bytes(), &CodecOptions::default())
            .unwrap();
        assert_eq!(payload.as_text(), Some("SHOUT"));
    }

    #[test]
    fn test_new_merges_extra_tables() {
        let mut loaders = HashMap::new();
        loaders.insert(".LOG".to_string(), upper_text_loader());
        let registry = CodecRegistry::new(Some(loaders), None);

        assert!(registry.resolve_loader("log").is_ok());
        assert!(registry.resolve_saver("log").is_err());
        assert!(registry.resolve_loader("csv").is_ok());
    }

    #[test]
    fn test_overrides_do_not_leak_between_registries() {
        let custom = CodecRegistry::builtin().with_loader("txt", upper_text_loader());
        let plain = CodecRegistry::builtin();

        let options = CodecOptions::default();
        let custom_text = custom
            .resolve_loader("txt")
            .unwrap()
            .decode(&mut "a".as_bytes(), &options)
            .unwrap();
        let plain_text = plain
            .resolve_loader("txt")
            .unwrap()
            .decode(&mut "a".as_bytes(), &options)
            .unwrap();

        assert_eq!(custom_text.as_text(), Some("A"));
        assert_eq!(plain_text.as_text(), Some("a"));
    }

    #[test]
    fn test_unavailable_reports_feature() {
        let mut registry = CodecRegistry::empty();
        registry.mark_unavailable(&["parquet"], "tabular");

        assert!(matches!(
            registry.resolve_loader("parquet"),
            Err(CodecError::MissingDependency {
                feature: "tabular",
                ..
            })
        ));
        assert!(matches!(
            registry.resolve_saver("parquet"),
            Err(CodecError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_extensions_include_saver_only_bindings() {
        let registry = CodecRegistry::empty()
            .with_loader("log", upper_text_loader())
            .with_saver("out", Saver::binary(|_payload, _writer, _options| Ok(())))
            .with_saver("log", Saver::text(|_payload, _writer, _options| Ok(())));

        assert_eq!(registry.extensions(), vec!["log", "out"]);
        assert_eq!(registry.loader_extensions(), vec!["log"]);
    }
}
