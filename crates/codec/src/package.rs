//! OOXML package model for docx and pptx.

use crate::{CodecError, Result};
use std::io::{Cursor, Read, Write};
use xmltree::{Element, XMLNode};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DOCUMENT_PART: &str = "word/document.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// One named entry of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

/// An Office Open XML package (docx, pptx) as its ordered zip parts.
///
/// Parts are kept byte-for-byte, so a package loaded and saved again
/// carries the same content even for parts this type knows nothing about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficePackage {
    parts: Vec<PackagePart>,
}

impl OfficePackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file entry of a zip container
    pub fn read_from(reader: &mut dyn Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(CodecError::library)?;
        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(CodecError::library)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: entry.name().to_string(),
                data,
            });
        }

        tracing::debug!("Read office package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Write the parts, in order, as a deflated zip container
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<()> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)
                .map_err(CodecError::library)?;
            zip.write_all(&part.data)?;
        }
        let buffer = zip.finish().map_err(CodecError::library)?;
        writer.write_all(buffer.get_ref())?;
        Ok(())
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Replace the part called `name`, or append it
    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart { name, data }),
        }
    }

    /// Text of each `w:p` paragraph in the main document part
    pub fn paragraphs(&self) -> Result<Vec<String>> {
        let part = self
            .part(DOCUMENT_PART)
            .ok_or_else(|| CodecError::Malformed(format!("package has no {DOCUMENT_PART}")))?;
        let root = Element::parse(part.data.as_slice()).map_err(CodecError::library)?;

        let mut paragraphs = Vec::new();
        collect_paragraphs(&root, &mut paragraphs);
        Ok(paragraphs)
    }

    /// Number of `ppt/slides/slideN.xml` parts
    pub fn slide_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| part.name.starts_with(SLIDE_PREFIX) && part.name.ends_with(".xml"))
            .count()
    }

    /// Minimal word-processing package holding one paragraph per entry
    pub fn docx_from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let mut body = String::new();
        for paragraph in paragraphs {
            body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
            body.push_str(&escape(paragraph.as_ref()));
            body.push_str("</w:t></w:r></w:p>");
        }

        let mut package = Self::new();
        package.set_part("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec());
        package.set_part("_rels/.rels", ROOT_RELS.as_bytes().to_vec());
        package.set_part(
            DOCUMENT_PART,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
                 <w:document xmlns:w=\"{WORD_NS}\"><w:body>{body}</w:body></w:document>"
            )
            .into_bytes(),
        );
        package
    }
}

fn collect_paragraphs(element: &Element, out: &mut Vec<String>) {
    if is_word(element, "p") {
        let mut text = String::new();
        collect_runs(element, &mut text);
        out.push(text);
        return;
    }
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect_paragraphs(child, out);
    }
}

fn collect_runs(element: &Element, out: &mut String) {
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        if is_word(child, "t") {
            if let Some(text) = child.get_text() {
                out.push_str(&text);
            }
        } else {
            collect_runs(child, out);
        }
    }
}

fn is_word(element: &Element, local: &str) -> bool {
    element.name == local && element.namespace.as_deref().map_or(true, |ns| ns == WORD_NS)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_survive_zip() {
        let package = OfficePackage::docx_from_paragraphs(&["Hello", "Fish & <chips>", ""]);

        let mut bytes = Vec::new();
        package.write_to(&mut bytes).unwrap();
        let loaded = OfficePackage::read_from(&mut bytes.as_slice()).unwrap();

        assert_eq!(loaded, package);
        assert_eq!(
            loaded.paragraphs().unwrap(),
            vec!["Hello".to_string(), "Fish & <chips>".to_string(), String::new()]
        );
    }

    #[test]
    fn test_slide_count() {
        let mut package = OfficePackage::new();
        package.set_part("ppt/presentation.xml", b"<p:presentation/>".to_vec());
        package.set_part("ppt/slides/slide1.xml", b"<p:sld/>".to_vec());
        package.set_part("ppt/slides/slide2.xml", b"<p:sld/>".to_vec());
        package.set_part("ppt/slides/_rels/slide1.xml.rels", b"<r/>".to_vec());

        assert_eq!(package.slide_count(), 2);
    }

    #[test]
    fn test_set_part_replaces() {
        let mut package = OfficePackage::new();
        package.set_part("a.xml", b"1".to_vec());
        package.set_part("a.xml", b"2".to_vec());

        assert_eq!(package.parts().len(), 1);
        assert_eq!(package.part("a.xml").unwrap().data, b"2");
    }

    #[test]
    fn test_missing_document_part() {
        assert!(matches!(
            OfficePackage::new().paragraphs(),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        let result = OfficePackage::read_from(&mut b"plain text".as_slice());
        assert!(matches!(result, Err(CodecError::Library(_))));
    }
}
