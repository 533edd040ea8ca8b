//! Built-in codec bodies.

use crate::CodecRegistry;

#[cfg(feature = "document")]
mod document;
#[cfg(feature = "image")]
mod raster;
mod structured;
#[cfg(feature = "tabular")]
mod tabular;
mod text;

#[cfg(not(feature = "tabular"))]
const TABULAR: &[&str] = &["csv", "parquet", "xlsx"];
#[cfg(not(feature = "image"))]
const IMAGE: &[&str] = &["png", "jpg"];
#[cfg(not(feature = "document"))]
const DOCUMENT: &[&str] = &["docx", "pptx", "pdf"];

pub(crate) fn register_builtin(registry: &mut CodecRegistry) {
    structured::register(registry);
    text::register(registry);

    #[cfg(feature = "tabular")]
    tabular::register(registry);
    #[cfg(not(feature = "tabular"))]
    registry.mark_unavailable(TABULAR, "tabular");

    #[cfg(feature = "image")]
    raster::register(registry);
    #[cfg(not(feature = "image"))]
    registry.mark_unavailable(IMAGE, "image");

    #[cfg(feature = "document")]
    document::register(registry);
    #[cfg(not(feature = "document"))]
    registry.mark_unavailable(DOCUMENT, "document");
}
