//! Decoded file contents.

use crate::{CodecError, Result};
use std::any::Any;
use std::sync::Arc;

/// The object a loader produces and a saver consumes.
///
/// Each variant holds the native type of the library that handles the format;
/// the registry never converts between them.
#[derive(Debug, Clone)]
pub enum Payload {
    /// csv, parquet, xlsx
    #[cfg(feature = "tabular")]
    Table(polars::prelude::DataFrame),
    Json(serde_json::Value),
    Toml(toml::Table),
    /// yaml, yml
    Yaml(serde_yaml::Value),
    /// Root element of an XML document
    Xml(xmltree::Element),
    /// docx, pptx
    #[cfg(feature = "document")]
    Package(crate::OfficePackage),
    #[cfg(feature = "document")]
    Pdf(lopdf::Document),
    /// png, jpg
    #[cfg(feature = "image")]
    Image(image::DynamicImage),
    /// txt, md, sql
    Text(String),
    /// Anything produced by a caller-registered loader
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Wrap a caller-defined value
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Custom(Arc::new(value))
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "tabular")]
            Payload::Table(_) => "table",
            Payload::Json(_) => "json",
            Payload::Toml(_) => "toml",
            Payload::Yaml(_) => "yaml",
            Payload::Xml(_) => "xml",
            #[cfg(feature = "document")]
            Payload::Package(_) => "package",
            #[cfg(feature = "document")]
            Payload::Pdf(_) => "pdf",
            #[cfg(feature = "image")]
            Payload::Image(_) => "image",
            Payload::Text(_) => "text",
            Payload::Custom(_) => "custom",
        }
    }

    /// Borrow the value of a `Custom` payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> CodecError {
        CodecError::PayloadMismatch {
            expected,
            found: self.kind(),
        }
    }
}

macro_rules! payload_conversions {
    ($($(#[$meta:meta])* $variant:ident($ty:ty) => $kind:literal;)*) => {
        $(
            $(#[$meta])*
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::$variant(value)
                }
            }

            $(#[$meta])*
            impl TryFrom<Payload> for $ty {
                type Error = CodecError;

                fn try_from(payload: Payload) -> Result<Self> {
                    match payload {
                        Payload::$variant(value) => Ok(value),
                        other => Err(other.mismatch($kind)),
                    }
                }
            }
        )*
    };
}

payload_conversions! {
    #[cfg(feature = "tabular")]
    Table(polars::prelude::DataFrame) => "table";
    Json(serde_json::Value) => "json";
    Toml(toml::Table) => "toml";
    Yaml(serde_yaml::Value) => "yaml";
    Xml(xmltree::Element) => "xml";
    #[cfg(feature = "document")]
    Package(crate::OfficePackage) => "package";
    #[cfg(feature = "document")]
    Pdf(lopdf::Document) => "pdf";
    #[cfg(feature = "image")]
    Image(image::DynamicImage) => "image";
    Text(String) => "text";
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}
