//! Line source for the ingest pipeline.

use std::borrow::Cow;
use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::errors::IngestError;

/// One line pulled from a [`LineReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The line without its `\n` terminator.
    pub text: String,
    /// True if invalid UTF-8 was replaced with U+FFFD.
    pub lossy: bool,
}

/// Lazy reader over the lines of a byte source, in source order.
///
/// Lines are decoded leniently: invalid UTF-8 becomes U+FFFD and reading
/// carries on. The reader is finite and cannot be restarted; I/O happens
/// only when the next line is pulled.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

/// Line reader over a file on disk.
pub type FileLines = LineReader<BufReader<File>>;

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Pull the next line.
    ///
    /// Returns `None` at end of input and `Some(Err(_))` when the underlying
    /// reader fails.
    pub async fn next_line(&mut self) -> Option<io::Result<SourceLine>> {
        self.buf.clear();

        match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) => None,
            Ok(_) => {
                let bytes = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                let line = match String::from_utf8_lossy(bytes) {
                    Cow::Borrowed(text) => SourceLine {
                        text: text.to_string(),
                        lossy: false,
                    },
                    Cow::Owned(text) => SourceLine { text, lossy: true },
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Open `path` as a line reader.
pub async fn open_lines(path: &Path) -> Result<FileLines, IngestError> {
    let file = File::open(path).await?;
    Ok(LineReader::new(BufReader::new(file)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    /// Reader that yields `data` and then fails.
    pub(crate) struct BrokenReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl BrokenReader {
        pub(crate) fn new(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
            }
        }
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.pos >= self.data.len() {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "device gone")));
            }
            let n = buf.remaining().min(self.data.len() - self.pos);
            let start = self.pos;
            buf.put_slice(&self.data[start..start + n]);
            self.pos += n;
            Poll::Ready(Ok(()))
        }
    }

    async fn collect<R: AsyncBufRead + Unpin>(mut lines: LineReader<R>) -> Vec<io::Result<SourceLine>> {
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await {
            let failed = line.is_err();
            out.push(line);
            if failed {
                break;
            }
        }
        out
    }

    #[tokio::test]
    async fn test_lines_in_order() {
        let lines = collect(LineReader::new(&b"a\tb\nc\td\n"[..])).await;

        let texts: Vec<String> = lines.into_iter().map(|l| l.unwrap().text).collect();
        assert_eq!(texts, vec!["a\tb", "c\td"]);
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let lines = collect(LineReader::new(&b"first\nlast"[..])).await;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].as_ref().unwrap().text, "last");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced_and_reading_continues() {
        let lines = collect(LineReader::new(&b"ok\nbad\xff byte\nafter\n"[..])).await;

        let lines: Vec<SourceLine> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 3);
        assert!(!lines[0].lossy);
        assert!(lines[1].lossy);
        assert_eq!(lines[1].text, "bad\u{FFFD} byte");
        assert_eq!(lines[2].text, "after");
    }

    #[tokio::test]
    async fn test_read_error_is_surfaced() {
        let reader = BufReader::new(BrokenReader::new(b"one\ntwo\n"));
        let lines = collect(LineReader::new(reader)).await;

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].as_ref().unwrap().text, "two");
        assert!(lines[2].is_err());
    }
}
