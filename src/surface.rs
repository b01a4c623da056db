//! The display the viewer draws on.
//!
//! The desktop shell turns each call into a WebView event; headless callers
//! and tests use [`RecordingSurface`].

use crate::catalog::Comment;
use crate::pdf::{PageRenderError, RenderedPage};
use std::sync::Mutex;

/// Output side of the viewer: page counter, loader, error banner, canvas and
/// comment list.
pub trait ViewerSurface: Send + Sync {
    fn show_page_number(&self, page_number: u32);

    fn show_page_count(&self, page_count: u32);

    fn show_loader(&self, visible: bool);

    /// Show the error banner with `message`.
    fn show_error(&self, message: &str);

    fn hide_error(&self);

    /// Draw a finished page.
    fn present_page(&self, page: RenderedPage);

    fn report_render_error(&self, page_number: u32, error: &PageRenderError);

    fn show_comments(&self, comments: &[Comment]);
}

/// Everything a [`RecordingSurface`] has been asked to show, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    PageNumber(u32),
    PageCount(u32),
    Loader(bool),
    Error(String),
    ErrorHidden,
    Presented(u32),
    RenderFailed(u32, String),
    Comments(Vec<String>),
}

/// A [`ViewerSurface`] that keeps a log of every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().clone()
    }

    /// Pages presented so far, in presentation order.
    pub fn presented(&self) -> Vec<u32> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Presented(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    /// The most recent page number shown.
    pub fn page_number(&self) -> Option<u32> {
        self.lock().iter().rev().find_map(|event| match event {
            SurfaceEvent::PageNumber(page) => Some(*page),
            _ => None,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceEvent>> {
        // A panic while recording only loses test diagnostics.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: SurfaceEvent) {
        self.lock().push(event);
    }
}

impl ViewerSurface for RecordingSurface {
    fn show_page_number(&self, page_number: u32) {
        self.push(SurfaceEvent::PageNumber(page_number));
    }

    fn show_page_count(&self, page_count: u32) {
        self.push(SurfaceEvent::PageCount(page_count));
    }

    fn show_loader(&self, visible: bool) {
        self.push(SurfaceEvent::Loader(visible));
    }

    fn show_error(&self, message: &str) {
        self.push(SurfaceEvent::Error(message.to_string()));
    }

    fn hide_error(&self) {
        self.push(SurfaceEvent::ErrorHidden);
    }

    fn present_page(&self, page: RenderedPage) {
        self.push(SurfaceEvent::Presented(page.page_number));
    }

    fn report_render_error(&self, page_number: u32, error: &PageRenderError) {
        self.push(SurfaceEvent::RenderFailed(page_number, error.to_string()));
    }

    fn show_comments(&self, comments: &[Comment]) {
        self.push(SurfaceEvent::Comments(
            comments.iter().map(|c| c.text.clone()).collect(),
        ));
    }
}
