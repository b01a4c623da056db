//! PDF rendering module using pdfium-render for native-quality output.
//!
//! This module provides:
//! - The async [`PdfBackend`] seam the page scheduler renders through
//! - A PDFium implementation of it
//! - Document metadata and the two PDF error kinds

mod backend;
mod renderer;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::*;
pub use renderer::{
    inspect_document, render_page_to_png, DocumentInfo, DocumentLoadError, PageRenderError,
    PdfiumUnavailable, RenderedPage,
};
