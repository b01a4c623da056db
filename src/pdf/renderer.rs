//! Core PDF renderer implementation using pdfium-render.
//!
//! Note: pdfium-render's Pdfium struct is not Send+Sync, so we create instances
//! on-demand within each operation rather than storing in shared state.

use base64::Engine as _;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// PDFium could not be bound on this machine.
#[derive(Error, Debug, Clone)]
#[error("Could not load PDFium library: {0}")]
pub struct PdfiumUnavailable(String);

/// The rendering library could not open or parse a document.
#[derive(Error, Debug, Clone)]
pub enum DocumentLoadError {
    #[error(transparent)]
    Init(#[from] PdfiumUnavailable),

    #[error("Failed to read PDF: {0}")]
    Read(String),

    #[error("Failed to fetch PDF: {0}")]
    Fetch(String),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Unsupported document source: {0}")]
    UnsupportedSource(String),

    #[error("Document loading task failed: {0}")]
    Task(String),
}

/// A specific page failed to rasterize.
#[derive(Error, Debug, Clone)]
pub enum PageRenderError {
    #[error(transparent)]
    Init(#[from] PdfiumUnavailable),

    #[error("Failed to reopen PDF: {0}")]
    Load(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(u32),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl Serialize for DocumentLoadError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for PageRenderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Document metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    /// Total number of pages
    pub page_count: u32,
    /// Document title (if available)
    pub title: Option<String>,
    /// Document author (if available)
    pub author: Option<String>,
    /// PDF version string
    pub pdf_version: String,
}

/// One rasterized page, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Page number (1-based)
    pub page_number: u32,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// PNG bytes
    pub png: Vec<u8>,
}

impl RenderedPage {
    /// Encode the page as a `data:` URL the WebView can assign to an `<img>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// File name of the PDFium shared library on this platform.
fn platform_library_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else {
        "libpdfium.so"
    }
}

/// Bind to PDFium library and return a usable Pdfium instance.
/// This is called on-demand for each operation since Pdfium is not Send+Sync.
fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium, PdfiumUnavailable> {
    use std::sync::atomic::{AtomicBool, Ordering};
    static LOGGED_SUCCESS: AtomicBool = AtomicBool::new(false);

    // Strategy 1: an explicitly configured directory
    if let Some(dir) = library_dir {
        let lib_path = dir.join(platform_library_name());
        match Pdfium::bind_to_library(&lib_path) {
            Ok(bindings) => {
                if !LOGGED_SUCCESS.swap(true, Ordering::Relaxed) {
                    tracing::info!(path = ?lib_path, "Loaded configured PDFium library");
                }
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => {
                tracing::warn!(path = ?lib_path, error = ?e, "Failed configured PDFium library");
            }
        }
    }

    // Strategy 2: next to the executable (bundled app)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            #[cfg(target_os = "macos")]
            let exe_dir = exe_dir.join("..").join("Frameworks");
            let lib_path = exe_dir.join(platform_library_name());
            if lib_path.exists() {
                match Pdfium::bind_to_library(&lib_path) {
                    Ok(bindings) => {
                        if !LOGGED_SUCCESS.swap(true, Ordering::Relaxed) {
                            tracing::info!(path = ?lib_path, "Loaded bundled PDFium library");
                        }
                        return Ok(Pdfium::new(bindings));
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = ?lib_path,
                            error = ?e,
                            "Failed bundled PDFium library"
                        );
                    }
                }
            }
        }
    }

    // Strategy 3: system library (for development)
    if let Ok(bindings) = Pdfium::bind_to_system_library() {
        if !LOGGED_SUCCESS.swap(true, Ordering::Relaxed) {
            tracing::info!("Loaded system PDFium library");
        }
        return Ok(Pdfium::new(bindings));
    }

    Err(PdfiumUnavailable(
        "ensure the PDFium shared library is bundled, installed, or set JURISVIEW_PDFIUM_DIR"
            .to_string(),
    ))
}

/// Open a PDF held in memory and read its metadata.
pub fn inspect_document(
    bytes: &[u8],
    library_dir: Option<&Path>,
) -> Result<DocumentInfo, DocumentLoadError> {
    let pdfium = bind_pdfium(library_dir)?;
    let doc = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| DocumentLoadError::Parse(e.to_string()))?;

    let metadata = doc.metadata();
    let title = metadata
        .get(PdfDocumentMetadataTagType::Title)
        .map(|t| t.value().to_string());
    let author = metadata
        .get(PdfDocumentMetadataTagType::Author)
        .map(|t| t.value().to_string());

    Ok(DocumentInfo {
        page_count: doc.pages().len() as u32,
        title,
        author,
        pdf_version: format!("{:?}", doc.version()),
    })
}

/// Map a 1-based page number onto pdfium's 0-based page index.
pub(crate) fn page_index(page_number: u32, page_count: u32) -> Result<u16, PageRenderError> {
    if page_number == 0 || page_number > page_count {
        return Err(PageRenderError::InvalidPage(page_number));
    }
    u16::try_from(page_number - 1).map_err(|_| PageRenderError::InvalidPage(page_number))
}

/// Render a page (1-based) at `scale` times its size in points and encode it as PNG.
pub fn render_page_to_png(
    bytes: &[u8],
    page_number: u32,
    scale: f32,
    library_dir: Option<&Path>,
) -> Result<RenderedPage, PageRenderError> {
    let pdfium = bind_pdfium(library_dir)?;
    let doc = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PageRenderError::Load(e.to_string()))?;

    let index = page_index(page_number, doc.pages().len() as u32)?;
    let page = doc
        .pages()
        .get(index)
        .map_err(|_| PageRenderError::InvalidPage(page_number))?;

    let width = (page.width().value * scale) as i32;
    let height = (page.height().value * scale) as i32;

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .render_form_data(true)
        .render_annotations(true);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PageRenderError::Render(e.to_string()))?;

    let image = bitmap.as_image();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| PageRenderError::Encode(e.to_string()))?;

    Ok(RenderedPage {
        page_number,
        width: image.width(),
        height: image.height(),
        png,
    })
}
