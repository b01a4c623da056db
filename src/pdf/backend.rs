//! The asynchronous seam between the viewer and the PDF rendering library.

use super::renderer::{self, DocumentInfo, DocumentLoadError, PageRenderError, RenderedPage};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Where a document's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    /// An `http` or `https` URL, fetched when the document is opened.
    Remote(Url),
}

impl DocumentSource {
    /// Resolve a catalog location against the documents directory.
    ///
    /// Accepts relative paths, absolute paths, `file://` URLs and `http(s)`
    /// URLs. Percent escapes in paths are decoded. A location is only read as
    /// a URL when it carries `://` or starts with `file:`, so file names
    /// containing a colon stay paths.
    pub fn resolve(documents_dir: &Path, location: &str) -> Result<Self, DocumentLoadError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(DocumentLoadError::UnsupportedSource(
                "empty location".to_string(),
            ));
        }

        if location.contains("://") || location.starts_with("file:") {
            let unsupported = || DocumentLoadError::UnsupportedSource(location.to_string());
            let url = Url::parse(location).map_err(|_| unsupported())?;
            return match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map(DocumentSource::File)
                    .map_err(|_| unsupported()),
                "http" | "https" => Ok(DocumentSource::Remote(url)),
                _ => Err(unsupported()),
            };
        }

        let decoded = urlencoding::decode(location)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| location.to_string());
        let path = PathBuf::from(decoded);
        if path.is_absolute() {
            Ok(Self::File(path))
        } else {
            Ok(Self::File(documents_dir.join(path)))
        }
    }

    /// The local path, for file sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Remote(_) => None,
        }
    }
}

/// An opened document. Cloning shares the underlying bytes.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    bytes: Arc<[u8]>,
    info: DocumentInfo,
}

impl DocumentHandle {
    pub fn new(bytes: Vec<u8>, info: DocumentInfo) -> Self {
        Self {
            bytes: bytes.into(),
            info,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn page_count(&self) -> u32 {
        self.info.page_count
    }
}

/// A PDF rendering library: opens documents and rasterizes their pages.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Open and parse the document at `source`.
    async fn open_document(&self, source: &DocumentSource)
        -> Result<DocumentHandle, DocumentLoadError>;

    /// Rasterize one page (1-based). Out-of-range pages are reported as
    /// [`PageRenderError::InvalidPage`].
    async fn render_page(
        &self,
        document: &DocumentHandle,
        page_number: u32,
        scale: f32,
    ) -> Result<RenderedPage, PageRenderError>;
}

/// [`PdfBackend`] backed by PDFium. All PDFium work runs on tokio's
/// blocking pool; remote documents are downloaded with `reqwest` first.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_dir: Option<PathBuf>,
    client: reqwest::Client,
}

impl PdfiumBackend {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self {
            library_dir,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, DocumentLoadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DocumentLoadError::Fetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(DocumentLoadError::Fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocumentLoadError::Fetch(format!("{}: {}", url, e)))?;
        tracing::debug!(%url, size = bytes.len(), "Fetched PDF");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PdfBackend for PdfiumBackend {
    async fn open_document(
        &self,
        source: &DocumentSource,
    ) -> Result<DocumentHandle, DocumentLoadError> {
        let library_dir = self.library_dir.clone();

        let bytes = match source {
            DocumentSource::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || {
                    std::fs::read(&path).map_err(|e| {
                        DocumentLoadError::Read(format!("{}: {}", path.display(), e))
                    })
                })
                .await
                .map_err(|e| DocumentLoadError::Task(e.to_string()))??
            }
            DocumentSource::Remote(url) => self.fetch(url).await?,
        };

        tokio::task::spawn_blocking(move || {
            let info = renderer::inspect_document(&bytes, library_dir.as_deref())?;
            tracing::debug!(pages = info.page_count, "Opened PDF");
            Ok(DocumentHandle::new(bytes, info))
        })
        .await
        .map_err(|e| DocumentLoadError::Task(e.to_string()))?
    }

    async fn render_page(
        &self,
        document: &DocumentHandle,
        page_number: u32,
        scale: f32,
    ) -> Result<RenderedPage, PageRenderError> {
        let bytes = Arc::clone(&document.bytes);
        let library_dir = self.library_dir.clone();

        tokio::task::spawn_blocking(move || {
            renderer::render_page_to_png(&bytes, page_number, scale, library_dir.as_deref())
        })
        .await
        .map_err(|e| PageRenderError::Task(e.to_string()))?
    }
}
