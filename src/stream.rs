//! Mode-aware streams over a storage backend.

use crate::{Error, Result};
use easy_env_codec::{CodecError, TransferMode};
use easy_env_file::{StorageBackend, StorageError, StorageWriter};
use std::io::{self, Cursor, Read, Write};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Opens backend objects in the transfer mode a codec asks for.
pub struct StreamProvider<'a, B: StorageBackend + ?Sized> {
    backend: &'a B,
}

/// A stream opened in either direction.
pub enum Stream {
    Read(ReadStream),
    Write(WriteStream),
}

impl<'a, B: StorageBackend + ?Sized> StreamProvider<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    pub fn open(&self, path: &str, mode: TransferMode) -> Result<Stream> {
        if mode.is_read() {
            self.open_read(path, mode).map(Stream::Read)
        } else {
            self.open_write(path, mode).map(Stream::Write)
        }
    }

    /// Open `path` for a loader.
    ///
    /// In text mode the object is read in full, a UTF-8 byte order mark is
    /// dropped, the bytes are checked to be UTF-8 and `\r\n` becomes `\n`.
    pub fn open_read(&self, path: &str, mode: TransferMode) -> Result<ReadStream> {
        debug_assert!(mode.is_read());
        let mut reader = self.backend.open_read(path)?;
        tracing::debug!("Opened {} for reading ({})", self.backend.describe(path), mode);

        if !mode.is_text() {
            return Ok(ReadStream::Binary(reader));
        }

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::io(self.backend.describe(path), e))?;
        let text = normalize_text(bytes).map_err(CodecError::Io)?;
        Ok(ReadStream::Text(Cursor::new(text.into_bytes())))
    }

    /// Open `path` for a saver. Nothing is visible at the destination until
    /// [`WriteStream::commit`].
    pub fn open_write(&self, path: &str, mode: TransferMode) -> Result<WriteStream> {
        debug_assert!(!mode.is_read());
        let writer = self.backend.open_write(path)?;
        tracing::debug!("Opened {} for writing ({})", self.backend.describe(path), mode);

        Ok(WriteStream {
            location: self.backend.describe(path),
            writer: Some(writer),
            text: mode.is_text().then(Vec::new),
        })
    }
}

fn normalize_text(mut bytes: Vec<u8>) -> io::Result<String> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if text.contains("\r\n") {
        Ok(text.replace("\r\n", "\n"))
    } else {
        Ok(text)
    }
}

/// Source handed to a loader.
pub enum ReadStream {
    Binary(Box<dyn Read + Send>),
    /// Already-normalised text
    Text(Cursor<Vec<u8>>),
}

impl Read for ReadStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ReadStream::Binary(reader) => reader.read(buf),
            ReadStream::Text(cursor) => cursor.read(buf),
        }
    }
}

/// Sink handed to a saver.
///
/// Finalised only by [`WriteStream::commit`]. Dropping it uncommitted, for
/// example because the codec failed halfway, discards everything written.
pub struct WriteStream {
    location: String,
    writer: Option<Box<dyn StorageWriter>>,
    /// Text-mode output, held back until it is known to be UTF-8
    text: Option<Vec<u8>>,
}

impl WriteStream {
    pub fn commit(mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        if let Some(text) = self.text.take() {
            if std::str::from_utf8(&text).is_err() {
                return Err(Error::Codec(CodecError::Malformed(format!(
                    "text written to {} is not valid UTF-8",
                    self.location
                ))));
            }
            writer
                .write_all(&text)
                .map_err(|e| StorageError::io(&self.location, e))?;
        }

        writer
            .flush()
            .map_err(|e| StorageError::io(&self.location, e))?;
        writer.finish()?;
        tracing::debug!("Committed {}", self.location);
        Ok(())
    }
}

impl Write for WriteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(text) = self.text.as_mut() {
            text.extend_from_slice(buf);
            return Ok(buf.len());
        }
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream already committed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match (self.text.is_some(), self.writer.as_mut()) {
            (false, Some(writer)) => writer.flush(),
            _ => Ok(()),
        }
    }
}

impl Drop for WriteStream {
    fn drop(&mut self) {
        if self.writer.is_some() {
            tracing::debug!("Discarding uncommitted write to {}", self.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easy_env_file::LocalStorage;
    use tempfile::TempDir;

    fn read_all(mut stream: ReadStream) -> Vec<u8> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_text_read_normalises() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"\xEF\xBB\xBFone\r\ntwo\r\n").unwrap();
        let storage = LocalStorage::new(dir.path());
        let provider = StreamProvider::new(&storage);

        let text = provider.open_read("a.txt", TransferMode::TextRead).unwrap();
        assert_eq!(read_all(text), b"one\ntwo\n");

        let binary = provider.open_read("a.txt", TransferMode::BinaryRead).unwrap();
        assert_eq!(read_all(binary), b"\xEF\xBB\xBFone\r\ntwo\r\n");
    }

    #[test]
    fn test_text_read_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let storage = LocalStorage::new(dir.path());

        let result = StreamProvider::new(&storage).open_read("bad.txt", TransferMode::TextRead);
        match result {
            Err(Error::Codec(CodecError::Io(e))) => {
                assert_eq!(e.kind(), io::ErrorKind::InvalidData)
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("invalid UTF-8 was accepted"),
        }
    }

    #[test]
    fn test_uncommitted_write_is_discarded() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let provider = StreamProvider::new(&storage);

        let mut stream = provider
            .open_write("out.bin", TransferMode::BinaryWrite)
            .unwrap();
        stream.write_all(b"partial").unwrap();
        drop(stream);

        assert!(!dir.path().join("out.bin").exists());
    }

    #[test]
    fn test_commit_publishes() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let provider = StreamProvider::new(&storage);

        let Stream::Write(mut stream) = provider.open("notes.md", TransferMode::TextWrite).unwrap()
        else {
            panic!("expected a write stream");
        };
        stream.write_all("# Title\n".as_bytes()).unwrap();
        stream.flush().unwrap();
        assert!(!dir.path().join("notes.md").exists());
        stream.commit().unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.md")).unwrap(),
            "# Title\n"
        );
    }

    #[test]
    fn test_text_commit_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let mut stream = StreamProvider::new(&storage)
            .open_write("bad.txt", TransferMode::TextWrite)
            .unwrap();
        stream.write_all(&[0xc3, 0x28]).unwrap();

        assert!(matches!(
            stream.commit(),
            Err(Error::Codec(CodecError::Malformed(_)))
        ));
        assert!(!dir.path().join("bad.txt").exists());
    }
}
