//! Office packages (docx, pptx) and pdf.

use crate::{CodecError, CodecRegistry, Loader, OfficePackage, Payload, Saver};
use std::io::Write;

pub(super) fn register(registry: &mut CodecRegistry) {
    for extension in ["docx", "pptx"] {
        registry.insert_loader(
            extension,
            Loader::binary(|reader, _options| {
                Ok(Payload::Package(OfficePackage::read_from(reader)?))
            }),
        );
        registry.insert_saver(
            extension,
            Saver::binary(|payload, writer, _options| match payload {
                Payload::Package(package) => package.write_to(writer),
                other => Err(other.mismatch("package")),
            }),
        );
    }

    registry.insert_loader(
        "pdf",
        Loader::binary(|reader, _options| {
            let document = lopdf::Document::load_from(reader).map_err(CodecError::library)?;
            tracing::debug!("Loaded pdf with {} pages", document.get_pages().len());
            Ok(Payload::Pdf(document))
        }),
    );
    registry.insert_saver(
        "pdf",
        Saver::binary(|payload, writer, _options| {
            let Payload::Pdf(document) = payload else {
                return Err(payload.mismatch("pdf"));
            };
            // Saving renumbers the cross-reference table, so work on a copy
            let mut document = document.clone();
            let mut buffer = Vec::new();
            document
                .save_to(&mut buffer)
                .map_err(CodecError::library)?;
            writer.write_all(&buffer)?;
            Ok(())
        }),
    );
}
