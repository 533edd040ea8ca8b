//! json, toml, yaml/yml and xml.

use crate::{CodecError, CodecRegistry, Loader, Payload, Saver};
use std::io::{Read, Write};

pub(super) fn register(registry: &mut CodecRegistry) {
    registry.insert_loader(
        "json",
        Loader::text(|reader, _options| {
            let value: serde_json::Value =
                serde_json::from_reader(reader).map_err(CodecError::library)?;
            Ok(Payload::Json(value))
        }),
    );
    registry.insert_saver(
        "json",
        Saver::text(|payload, writer, options| {
            let Payload::Json(value) = payload else {
                return Err(payload.mismatch("json"));
            };
            if options.get_bool("pretty", true)? {
                serde_json::to_writer_pretty(writer, value).map_err(CodecError::library)
            } else {
                serde_json::to_writer(writer, value).map_err(CodecError::library)
            }
        }),
    );

    registry.insert_loader(
        "toml",
        Loader::text(|reader, _options| {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            let table: toml::Table = toml::from_str(&text).map_err(CodecError::library)?;
            Ok(Payload::Toml(table))
        }),
    );
    registry.insert_saver(
        "toml",
        Saver::text(|payload, writer, _options| {
            let Payload::Toml(table) = payload else {
                return Err(payload.mismatch("toml"));
            };
            let text = toml::to_string(table).map_err(CodecError::library)?;
            writer.write_all(text.as_bytes())?;
            Ok(())
        }),
    );

    for extension in ["yaml", "yml"] {
        registry.insert_loader(
            extension,
            Loader::text(|reader, _options| {
                let value: serde_yaml::Value =
                    serde_yaml::from_reader(reader).map_err(CodecError::library)?;
                Ok(Payload::Yaml(value))
            }),
        );
        registry.insert_saver(
            extension,
            Saver::text(|payload, writer, _options| {
                let Payload::Yaml(value) = payload else {
                    return Err(payload.mismatch("yaml"));
                };
                serde_yaml::to_writer(writer, value).map_err(CodecError::library)
            }),
        );
    }

    // The parser handles the declared encoding itself, so xml stays binary.
    registry.insert_loader(
        "xml",
        Loader::binary(|reader, _options| {
            let root = xmltree::Element::parse(reader).map_err(CodecError::library)?;
            Ok(Payload::Xml(root))
        }),
    );
    registry.insert_saver(
        "xml",
        Saver::binary(|payload, writer, _options| {
            let Payload::Xml(root) = payload else {
                return Err(payload.mismatch("xml"));
            };
            root.write(writer).map_err(CodecError::library)
        }),
    );
}
