//! Local documents selected for summarisation.

use std::fmt;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Extensions the backend can extract text from.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "docx"];

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {0} (supported: PDF, TXT, DOCX)")]
    Unsupported(String),
    #[error("no file given")]
    Empty,
}

/// A user-selected file held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without directories, as sent in the multipart part
    pub name: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a document from disk, rejecting unsupported extensions before
    /// touching the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let name = checked_name(path)?;
        let content = std::fs::read(path).map_err(|source| read_error(path, source))?;

        log::debug!("loaded {} ({} bytes)", name, content.len());
        Ok(Self { name, content })
    }

    /// [`Document::open`] without blocking the runtime.
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let name = checked_name(path)?;
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| read_error(path, source))?;

        log::debug!("loaded {} ({} bytes)", name, content.len());
        Ok(Self { name, content })
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// MIME type for the multipart upload.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            _ => "application/octet-stream",
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .finish()
    }
}

/// Bare file name of `path`, if it has a supported extension.
pub fn checked_name(path: &Path) -> Result<String, DocumentError> {
    if path.as_os_str().is_empty() {
        return Err(DocumentError::Empty);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    ensure_supported(&name)?;
    Ok(name)
}

fn read_error(path: &Path, source: std::io::Error) -> DocumentError {
    DocumentError::ReadError {
        path: path.display().to_string(),
        source,
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Check a file name against [`SUPPORTED_EXTENSIONS`].
pub fn ensure_supported(name: &str) -> Result<(), DocumentError> {
    match extension_of(name) {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(DocumentError::Unsupported(name.to_string())),
    }
}

/// Turn pasted or typed input into a path.
///
/// Terminals deliver dropped files as pasted text, often quoted or with
/// escaped spaces, sometimes as a percent-encoded `file://` URI.
pub fn normalize_input_path(input: &str) -> String {
    let mut s = input.trim();
    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            s = &s[1..s.len() - 1];
        }
    }
    if s.starts_with("file://") {
        if let Some(path) = Url::parse(s).ok().and_then(|u| u.to_file_path().ok()) {
            return path.to_string_lossy().into_owned();
        }
    }
    s.replace("\\ ", " ")
}
