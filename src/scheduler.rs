//! Single-flight, coalescing page-render scheduler.
//!
//! One scheduler owns one open document and the surface it draws on. At most
//! one render is in flight at a time. Requests that arrive while a render is
//! running overwrite a single pending slot, so a burst of navigation only
//! renders the page the user ended on:
//!
//! ```text
//! Idle      --request-->              Rendering(n)
//! Rendering --request-->              Rendering (pending := m)
//! Rendering --done/failed, no pending--> Idle
//! Rendering --done/failed, pending m-->  Rendering(m)
//! ```
//!
//! In-flight renders are never cancelled. A failed render is reported and the
//! scheduler moves on exactly as it would after a success.

use crate::pdf::{DocumentHandle, PageRenderError, PdfBackend};
use crate::surface::ViewerSurface;
use std::sync::Arc;
use tokio::sync::watch;

/// Scheduler bookkeeping. `pending` is only ever set while `busy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerState {
    pub busy: bool,
    pub pending: Option<u32>,
    rendering: Option<u32>,
    closed: bool,
}

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Rendering(u32),
}

/// How a [`PageRenderScheduler::request_render`] call was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDisposition {
    /// The scheduler was idle and started rendering the page.
    Started,
    /// A render was in flight; the page became the pending request,
    /// superseding `replaced` if there was one.
    Coalesced { replaced: Option<u32> },
    /// The scheduler has been closed.
    Closed,
}

struct Inner {
    backend: Arc<dyn PdfBackend>,
    surface: Arc<dyn ViewerSurface>,
    document: DocumentHandle,
    scale: f32,
    state: watch::Sender<SchedulerState>,
}

/// Serializes page renders for one document. Cheap to clone; clones share
/// state.
#[derive(Clone)]
pub struct PageRenderScheduler {
    inner: Arc<Inner>,
}

impl PageRenderScheduler {
    pub fn new(
        backend: Arc<dyn PdfBackend>,
        surface: Arc<dyn ViewerSurface>,
        document: DocumentHandle,
        scale: f32,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                surface,
                document,
                scale,
                state,
            }),
        }
    }

    pub fn document(&self) -> &DocumentHandle {
        &self.inner.document
    }

    pub fn state(&self) -> SchedulerState {
        *self.inner.state.borrow()
    }

    pub fn phase(&self) -> RenderPhase {
        match self.inner.state.borrow().rendering {
            Some(page) => RenderPhase::Rendering(page),
            None => RenderPhase::Idle,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.borrow().closed
    }

    /// Ask for `page_number` to be rendered.
    ///
    /// The page number is not range checked; the backend reports
    /// out-of-range pages as a render failure. The page-number display is
    /// updated immediately, before the render runs.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_render(&self, page_number: u32) -> RenderDisposition {
        let mut disposition = RenderDisposition::Closed;
        self.inner.state.send_if_modified(|state| {
            if state.closed {
                return false;
            }
            disposition = if state.busy {
                RenderDisposition::Coalesced {
                    replaced: state.pending.replace(page_number),
                }
            } else {
                state.busy = true;
                state.rendering = Some(page_number);
                RenderDisposition::Started
            };
            true
        });

        match disposition {
            RenderDisposition::Closed => {
                tracing::debug!(page = page_number, "Render requested after close, ignoring");
                return disposition;
            }
            RenderDisposition::Coalesced { replaced } => {
                tracing::debug!(page = page_number, ?replaced, "Render in flight, page queued");
            }
            RenderDisposition::Started => {
                tracing::debug!(page = page_number, "Starting render");
                tokio::spawn(self.clone().drive(page_number));
            }
        }

        self.inner.surface.show_page_number(page_number);
        disposition
    }

    /// Discard the scheduler. The pending request is dropped, an in-flight
    /// render finishes without being presented and later requests are
    /// ignored.
    pub fn close(&self) {
        self.inner.state.send_modify(|state| {
            state.closed = true;
            state.pending = None;
        });
    }

    /// Resolve once no render is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.busy).await;
    }

    async fn drive(self, first_page: u32) {
        let inner = &self.inner;
        let mut page_number = first_page;

        loop {
            // A panicking backend must not unwind this loop.
            let backend = Arc::clone(&inner.backend);
            let document = inner.document.clone();
            let scale = inner.scale;
            let result = tokio::spawn(async move {
                backend.render_page(&document, page_number, scale).await
            })
            .await
            .unwrap_or_else(|e| Err(PageRenderError::Task(e.to_string())));
            let live = !inner.state.borrow().closed;

            match result {
                Ok(page) if live => {
                    tracing::debug!(
                        page = page_number,
                        width = page.width,
                        height = page.height,
                        "Page rendered"
                    );
                    inner.surface.present_page(page);
                }
                Ok(_) => {
                    tracing::debug!(page = page_number, "Discarding render for closed document");
                }
                Err(err) => {
                    tracing::error!(page = page_number, error = %err, "Page render failed");
                    if live {
                        inner.surface.report_render_error(page_number, &err);
                    }
                }
            }

            let mut next = None;
            inner.state.send_modify(|state| {
                next = state.pending.take();
                state.rendering = next;
                state.busy = next.is_some();
            });

            match next {
                Some(page) => page_number = page,
                None => return,
            }
        }
    }
}
