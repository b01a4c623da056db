//! Tauri commands for the viewer.
//!
//! These commands expose the [`ViewerSession`] to the WebView frontend via
//! IPC. Display updates flow back the other way as events emitted by
//! [`EventSurface`].

use crate::catalog::{BlogPost, Comment, DocumentId, DocumentSummary};
use crate::pdf::{PageRenderError, RenderedPage};
use crate::surface::ViewerSurface;
use crate::viewer::{ViewerError, ViewerSession};
use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime, State};
use tokio::sync::Mutex;

/// Application state holding the single viewer session.
pub struct AppState {
    pub session: Mutex<ViewerSession>,
}

impl AppState {
    pub fn new(session: ViewerSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

/// Payload of the `page-rendered` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedPagePayload {
    page_number: u32,
    width: u32,
    height: u32,
    data_url: String,
}

/// Payload of the `page-render-failed` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderFailedPayload {
    page_number: u32,
    message: String,
}

/// Page position reported back to the frontend after navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePosition {
    pub page_number: u32,
    pub page_count: Option<u32>,
}

/// [`ViewerSurface`] that forwards every display update to the WebView as a
/// Tauri event.
pub struct EventSurface<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> EventSurface<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(e) = self.app.emit(event, payload) {
            tracing::warn!(event, error = %e, "Failed to emit event");
        }
    }
}

impl<R: Runtime> ViewerSurface for EventSurface<R> {
    fn show_page_number(&self, page_number: u32) {
        self.emit("page-number", page_number);
    }

    fn show_page_count(&self, page_count: u32) {
        self.emit("page-count", page_count);
    }

    fn show_loader(&self, visible: bool) {
        self.emit("pdf-loader", visible);
    }

    fn show_error(&self, message: &str) {
        self.emit("pdf-error", Some(message.to_string()));
    }

    fn hide_error(&self) {
        self.emit("pdf-error", None::<String>);
    }

    fn present_page(&self, page: RenderedPage) {
        self.emit(
            "page-rendered",
            RenderedPagePayload {
                page_number: page.page_number,
                width: page.width,
                height: page.height,
                data_url: page.to_data_url(),
            },
        );
    }

    fn report_render_error(&self, page_number: u32, error: &PageRenderError) {
        self.emit(
            "page-render-failed",
            RenderFailedPayload {
                page_number,
                message: error.to_string(),
            },
        );
    }

    fn show_comments(&self, comments: &[Comment]) {
        self.emit("comments", comments.to_vec());
    }
}

fn position(session: &ViewerSession) -> PagePosition {
    PagePosition {
        page_number: session.current_page(),
        page_count: session.page_count(),
    }
}

/// List the catalog.
#[tauri::command]
pub async fn list_documents(
    state: State<'_, AppState>,
) -> Result<Vec<DocumentSummary>, ViewerError> {
    Ok(state.session.lock().await.documents())
}

/// Open a catalog entry and render its first page.
#[tauri::command]
pub async fn open_document(id: DocumentId, state: State<'_, AppState>) -> Result<(), ViewerError> {
    state.session.lock().await.open_document(id).await
}

#[tauri::command]
pub async fn next_page(state: State<'_, AppState>) -> Result<PagePosition, ViewerError> {
    let mut session = state.session.lock().await;
    session.next_page();
    Ok(position(&session))
}

#[tauri::command]
pub async fn previous_page(state: State<'_, AppState>) -> Result<PagePosition, ViewerError> {
    let mut session = state.session.lock().await;
    session.previous_page();
    Ok(position(&session))
}

/// Jump to a page (1-based, clamped to the document).
#[tauri::command]
pub async fn go_to_page(
    page_number: u32,
    state: State<'_, AppState>,
) -> Result<PagePosition, ViewerError> {
    Ok(jump(&mut *state.session.lock().await, page_number))
}

/// Move to `page_number` and report where the session ended up. A session
/// with no pages to show stays where it is.
fn jump(session: &mut ViewerSession, page_number: u32) -> PagePosition {
    session.go_to_page(page_number);
    position(session)
}

#[tauri::command]
pub async fn get_comments(
    id: DocumentId,
    state: State<'_, AppState>,
) -> Result<Vec<Comment>, ViewerError> {
    Ok(state.session.lock().await.comments(id)?.to_vec())
}

/// Append a comment to the open document.
#[tauri::command]
pub async fn add_comment(
    text: String,
    state: State<'_, AppState>,
) -> Result<Vec<Comment>, ViewerError> {
    Ok(state.session.lock().await.add_comment(&text)?.to_vec())
}

#[tauri::command]
pub async fn subscribe(email: String, state: State<'_, AppState>) -> Result<String, ViewerError> {
    state.session.lock().await.subscribe(&email)
}

/// Flip the admin flag. No credentials are checked.
#[tauri::command]
pub async fn admin_login(state: State<'_, AppState>) -> Result<bool, ViewerError> {
    let mut session = state.session.lock().await;
    session.admin_login();
    Ok(session.is_admin())
}

#[tauri::command]
pub async fn get_blog_posts(state: State<'_, AppState>) -> Result<Vec<BlogPost>, ViewerError> {
    Ok(state.session.lock().await.blog_posts().to_vec())
}
