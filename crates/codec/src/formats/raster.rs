//! Raster images: png, jpg.

use crate::{CodecError, CodecOptions, CodecRegistry, Loader, Payload, Result, Saver};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Read, Write};

const DEFAULT_JPEG_QUALITY: u8 = 90;

pub(super) fn register(registry: &mut CodecRegistry) {
    registry.insert_loader("png", loader(ImageFormat::Png));
    registry.insert_saver(
        "png",
        Saver::binary(|payload, writer, _options| {
            let image = image_of(payload)?;
            // The png encoder seeks, so encode into memory first
            let mut buffer = Cursor::new(Vec::new());
            image
                .write_to(&mut buffer, ImageFormat::Png)
                .map_err(CodecError::library)?;
            writer.write_all(buffer.get_ref())?;
            Ok(())
        }),
    );

    registry.insert_loader("jpg", loader(ImageFormat::Jpeg));
    registry.insert_saver(
        "jpg",
        Saver::binary(|payload, writer, options| {
            let image = image_of(payload)?;
            let mut encoder = JpegEncoder::new_with_quality(writer, quality(options)?);
            encoder
                .encode_image(&image.to_rgb8())
                .map_err(CodecError::library)
        }),
    );
}

fn loader(format: ImageFormat) -> Loader {
    Loader::binary(move |reader, _options| {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let image =
            image::load_from_memory_with_format(&bytes, format).map_err(CodecError::library)?;
        tracing::debug!(
            "Decoded {:?} image {}x{}",
            format,
            image.width(),
            image.height()
        );
        Ok(Payload::Image(image))
    })
}

fn image_of(payload: &Payload) -> Result<&DynamicImage> {
    match payload {
        Payload::Image(image) => Ok(image),
        other => Err(other.mismatch("image")),
    }
}

fn quality(options: &CodecOptions) -> Result<u8> {
    match options.get_parsed::<u8>("quality")? {
        None => Ok(DEFAULT_JPEG_QUALITY),
        Some(value @ 1..=100) => Ok(value),
        Some(value) => Err(CodecError::invalid_option("quality", value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn gradient() -> DynamicImage {
        let image = RgbImage::from_fn(8, 4, |x, y| Rgb([(x * 30) as u8, (y * 60) as u8, 128]));
        DynamicImage::ImageRgb8(image)
    }

    fn round_trip(extension: &str, options: &CodecOptions) -> DynamicImage {
        let registry = CodecRegistry::builtin();
        let mut bytes = Vec::new();
        registry
            .resolve_saver(extension)
            .unwrap()
            .encode(&Payload::Image(gradient()), &mut bytes, options)
            .unwrap();
        let loaded = registry
            .resolve_loader(extension)
            .unwrap()
            .decode(&mut bytes.as_slice(), options)
            .unwrap();
        DynamicImage::try_from(loaded).unwrap()
    }

    #[test]
    fn test_png_is_lossless() {
        let loaded = round_trip("png", &CodecOptions::new());
        assert_eq!(loaded.to_rgb8(), gradient().to_rgb8());
    }

    #[test]
    fn test_jpg_keeps_dimensions() {
        let loaded = round_trip("jpg", &CodecOptions::new().with("quality", "75"));
        assert_eq!(loaded.dimensions(), (8, 4));
    }

    #[test]
    fn test_jpg_quality_range() {
        assert_eq!(quality(&CodecOptions::new()).unwrap(), 90);
        assert!(quality(&CodecOptions::new().with("quality", "0")).is_err());
        assert!(quality(&CodecOptions::new().with("quality", "101")).is_err());
    }

    #[test]
    fn test_png_loader_rejects_jpeg_bytes() {
        let registry = CodecRegistry::builtin();
        let mut bytes = Vec::new();
        registry
            .resolve_saver("jpg")
            .unwrap()
            .encode(&Payload::Image(gradient()), &mut bytes, &CodecOptions::new())
            .unwrap();

        let result = registry
            .resolve_loader("png")
            .unwrap()
            .decode(&mut bytes.as_slice(), &CodecOptions::new());
        assert!(matches!(result, Err(CodecError::Library(_))));
    }
}
