//! Plain text: txt, md, sql.

use crate::{CodecRegistry, Loader, Payload, Saver};
use std::io::{Read, Write};

const EXTENSIONS: [&str; 3] = ["txt", "md", "sql"];

pub(super) fn register(registry: &mut CodecRegistry) {
    for extension in EXTENSIONS {
        registry.insert_loader(
            extension,
            Loader::text(|reader, _options| {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Ok(Payload::Text(text))
            }),
        );
        registry.insert_saver(
            extension,
            Saver::text(|payload, writer, _options| {
                let text = payload.as_text().ok_or_else(|| payload.mismatch("text"))?;
                writer.write_all(text.as_bytes())?;
                Ok(())
            }),
        );
    }
}
