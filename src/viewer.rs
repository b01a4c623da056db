//! Viewer session: the catalog, the open document and its render scheduler,
//! the comment list and the two forms, all owned by one explicit object.

use crate::catalog::{BlogPost, Catalog, Comment, DocumentId, DocumentSummary};
use crate::config::ViewerConfig;
use crate::forms::{self, AdminSession, FormError, NewsletterForm};
use crate::pdf::{DocumentLoadError, DocumentSource, PdfBackend};
use crate::scheduler::{PageRenderScheduler, RenderDisposition};
use crate::surface::ViewerSurface;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Banner text shown when a document cannot be opened.
pub const LOAD_ERROR_MESSAGE: &str = "Error al cargar el PDF.";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Document not found: {0}")]
    UnknownDocument(DocumentId),

    #[error("No document is currently loaded")]
    NoDocumentLoaded,

    #[error(transparent)]
    Load(#[from] DocumentLoadError),

    #[error(transparent)]
    Form(#[from] FormError),
}

impl Serialize for ViewerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub struct ViewerSession {
    config: ViewerConfig,
    backend: Arc<dyn PdfBackend>,
    surface: Arc<dyn ViewerSurface>,
    catalog: Catalog,
    newsletter: NewsletterForm,
    admin: AdminSession,
    current_document: Option<DocumentId>,
    scheduler: Option<PageRenderScheduler>,
    page_number: u32,
}

impl ViewerSession {
    pub fn new(
        config: ViewerConfig,
        backend: Arc<dyn PdfBackend>,
        surface: Arc<dyn ViewerSurface>,
    ) -> Self {
        Self::with_catalog(config, backend, surface, Catalog::seeded())
    }

    pub fn with_catalog(
        config: ViewerConfig,
        backend: Arc<dyn PdfBackend>,
        surface: Arc<dyn ViewerSurface>,
        catalog: Catalog,
    ) -> Self {
        Self {
            config,
            backend,
            surface,
            catalog,
            newsletter: NewsletterForm::new(),
            admin: AdminSession::default(),
            current_document: None,
            scheduler: None,
            page_number: 1,
        }
    }

    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.catalog.summaries()
    }

    pub fn blog_posts(&self) -> &[BlogPost] {
        self.catalog.blog_posts()
    }

    pub fn current_document(&self) -> Option<DocumentId> {
        self.current_document
    }

    pub fn current_page(&self) -> u32 {
        self.page_number
    }

    /// Page count of the loaded PDF, if one is loaded.
    pub fn page_count(&self) -> Option<u32> {
        self.scheduler.as_ref().map(|s| s.document().page_count())
    }

    pub fn scheduler(&self) -> Option<&PageRenderScheduler> {
        self.scheduler.as_ref()
    }

    /// Select a catalog entry, show its comments and load its PDF from page 1.
    pub async fn open_document(&mut self, id: DocumentId) -> Result<(), ViewerError> {
        let document = self
            .catalog
            .get(id)
            .ok_or(ViewerError::UnknownDocument(id))?;
        let location = document.url.clone();

        tracing::info!(document = id, title = %document.title, "Opening document");
        self.surface.show_comments(&document.comments);
        self.current_document = Some(id);
        self.page_number = 1;
        self.close_scheduler();

        self.load_pdf(&location).await
    }

    /// Open the PDF at `location` and render the current page.
    ///
    /// On failure the loader is hidden, the error banner shows
    /// [`LOAD_ERROR_MESSAGE`] and nothing is rendered.
    pub async fn load_pdf(&mut self, location: &str) -> Result<(), ViewerError> {
        self.close_scheduler();
        self.surface.show_loader(true);
        self.surface.hide_error();

        let opened = match DocumentSource::resolve(&self.config.documents_dir, location) {
            Ok(source) => self.backend.open_document(&source).await,
            Err(err) => Err(err),
        };
        self.surface.show_loader(false);

        let document = match opened {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(location, error = %err, "Error loading PDF");
                self.surface.show_error(LOAD_ERROR_MESSAGE);
                return Err(err.into());
            }
        };

        let page_count = document.page_count();
        tracing::info!(location, pages = page_count, "PDF loaded");
        self.surface.show_page_count(page_count);

        let scheduler = PageRenderScheduler::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.surface),
            document,
            self.config.render_scale,
        );
        if page_count > 0 {
            self.page_number = self.page_number.clamp(1, page_count);
            scheduler.request_render(self.page_number);
        }
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Step forward one page. Does nothing on the last page or with no PDF.
    pub fn next_page(&mut self) -> Option<RenderDisposition> {
        let scheduler = self.scheduler.as_ref()?;
        if self.page_number >= scheduler.document().page_count() {
            return None;
        }
        self.page_number += 1;
        Some(scheduler.request_render(self.page_number))
    }

    /// Step back one page. Does nothing on the first page or with no PDF.
    pub fn previous_page(&mut self) -> Option<RenderDisposition> {
        let scheduler = self.scheduler.as_ref()?;
        if self.page_number <= 1 {
            return None;
        }
        self.page_number -= 1;
        Some(scheduler.request_render(self.page_number))
    }

    /// Jump to `page_number`, clamped to the document's pages.
    pub fn go_to_page(&mut self, page_number: u32) -> Option<RenderDisposition> {
        let scheduler = self.scheduler.as_ref()?;
        let page_count = scheduler.document().page_count();
        if page_count == 0 {
            return None;
        }
        self.page_number = page_number.clamp(1, page_count);
        Some(scheduler.request_render(self.page_number))
    }

    pub fn comments(&self, id: DocumentId) -> Result<&[Comment], ViewerError> {
        self.catalog
            .comments(id)
            .ok_or(ViewerError::UnknownDocument(id))
    }

    /// Append a comment to the current document and redraw the list.
    pub fn add_comment(&mut self, text: &str) -> Result<&[Comment], ViewerError> {
        let Some(id) = self.current_document else {
            tracing::warn!("No document is currently loaded");
            return Err(ViewerError::NoDocumentLoaded);
        };
        let text = forms::normalize_comment(text)?;

        let comments = self
            .catalog
            .add_comment(id, Comment::new(text))
            .ok_or(ViewerError::UnknownDocument(id))?;
        tracing::info!(document = id, count = comments.len(), "Comment submitted");
        self.surface.show_comments(comments);
        Ok(comments)
    }

    pub fn subscribe(&mut self, email: &str) -> Result<String, ViewerError> {
        Ok(self.newsletter.submit(email)?)
    }

    pub fn admin_login(&mut self) {
        self.admin.login();
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_admin()
    }

    fn close_scheduler(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{assert_no_call, next_call, serve_once, GatedBackend};
    use crate::pdf::PdfiumBackend;
    use crate::surface::{RecordingSurface, SurfaceEvent};
    use std::path::{Path, PathBuf};

    fn session(backend: &Arc<GatedBackend>, surface: &Arc<RecordingSurface>) -> ViewerSession {
        let config = ViewerConfig {
            documents_dir: PathBuf::from("/srv/sentencias"),
            ..ViewerConfig::default()
        };
        ViewerSession::new(config, backend.clone(), surface.clone())
    }

    #[tokio::test]
    async fn test_open_document_renders_first_page() {
        let (backend, mut calls) = GatedBackend::new(3);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        session.open_document(1).await.unwrap();
        assert_eq!(
            backend.opened()[0].path(),
            Some(Path::new("/srv/sentencias/Stalking.pdf"))
        );
        assert_eq!(session.current_document(), Some(1));
        assert_eq!(session.page_count(), Some(3));
        assert_eq!(surface.page_number(), Some(1));

        next_call(&mut calls).await.complete();
        session.scheduler().unwrap().wait_idle().await;
        assert_eq!(surface.presented(), vec![1]);

        let events = surface.events();
        assert!(events.contains(&SurfaceEvent::Comments(vec![
            "Interesante análisis del caso.".to_string(),
            "Considero que la pena debería ser mayor.".to_string(),
        ])));
        assert!(events.contains(&SurfaceEvent::Loader(true)));
        assert!(events.contains(&SurfaceEvent::Loader(false)));
        assert!(events.contains(&SurfaceEvent::PageCount(3)));
    }

    #[tokio::test]
    async fn test_load_failure_shows_banner_and_renders_nothing() {
        let (backend, mut calls) = GatedBackend::failing_open();
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        let err = session.open_document(2).await.unwrap_err();
        assert!(matches!(err, ViewerError::Load(DocumentLoadError::Parse(_))));

        let events = surface.events();
        let loader_hidden = events
            .iter()
            .position(|e| *e == SurfaceEvent::Loader(false))
            .unwrap();
        let banner = events
            .iter()
            .position(|e| *e == SurfaceEvent::Error(LOAD_ERROR_MESSAGE.to_string()))
            .unwrap();
        assert!(loader_hidden < banner);
        assert_eq!(surface.page_number(), None);
        assert!(session.scheduler().is_none());
        assert_no_call(&mut calls).await;
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_banner() {
        let base = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n");
        let surface = Arc::new(RecordingSurface::new());
        let mut session = ViewerSession::new(
            ViewerConfig::default(),
            Arc::new(PdfiumBackend::default()),
            surface.clone(),
        );

        let err = session
            .load_pdf(&format!("{}/Stalking.pdf", base))
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::Load(DocumentLoadError::Fetch(_))));
        assert_eq!(
            surface.events(),
            vec![
                SurfaceEvent::Loader(true),
                SurfaceEvent::ErrorHidden,
                SurfaceEvent::Loader(false),
                SurfaceEvent::Error(LOAD_ERROR_MESSAGE.to_string()),
            ]
        );
        assert!(session.scheduler().is_none());
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let (backend, _calls) = GatedBackend::new(3);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        assert!(matches!(
            session.open_document(7).await,
            Err(ViewerError::UnknownDocument(7))
        ));
        assert!(backend.opened().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_respects_bounds_and_coalesces() {
        let (backend, mut calls) = GatedBackend::new(3);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);
        session.open_document(1).await.unwrap();
        let first = next_call(&mut calls).await;

        assert_eq!(session.previous_page(), None);
        assert_eq!(
            session.next_page(),
            Some(RenderDisposition::Coalesced { replaced: None })
        );
        assert_eq!(
            session.next_page(),
            Some(RenderDisposition::Coalesced { replaced: Some(2) })
        );
        assert_eq!(session.next_page(), None);
        assert_eq!(session.current_page(), 3);

        first.complete();
        next_call(&mut calls).await.complete();
        session.scheduler().unwrap().wait_idle().await;
        assert_eq!(surface.presented(), vec![1, 3]);

        assert_eq!(session.go_to_page(0), Some(RenderDisposition::Started));
        assert_eq!(session.current_page(), 1);
        next_call(&mut calls).await.complete();
        session.scheduler().unwrap().wait_idle().await;
        assert_eq!(surface.presented(), vec![1, 3, 1]);
    }

    #[tokio::test]
    async fn test_switching_documents_drops_old_render() {
        let (backend, mut calls) = GatedBackend::new(3);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        session.open_document(1).await.unwrap();
        let stale = next_call(&mut calls).await;
        let old_scheduler = session.scheduler().unwrap().clone();

        session.open_document(2).await.unwrap();
        assert!(old_scheduler.is_closed());
        let fresh = next_call(&mut calls).await;

        stale.complete();
        old_scheduler.wait_idle().await;
        fresh.complete();
        session.scheduler().unwrap().wait_idle().await;
        assert_eq!(surface.presented(), vec![1]);
        assert_eq!(session.current_document(), Some(2));
    }

    #[tokio::test]
    async fn test_navigation_without_document_is_a_no_op() {
        let (backend, _calls) = GatedBackend::new(3);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        assert_eq!(session.next_page(), None);
        assert_eq!(session.previous_page(), None);
        assert_eq!(session.go_to_page(2), None);
    }

    #[tokio::test]
    async fn test_add_comment_requires_document_and_text() {
        let (backend, mut calls) = GatedBackend::new(1);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        assert!(matches!(
            session.add_comment("Hola"),
            Err(ViewerError::NoDocumentLoaded)
        ));

        session.open_document(2).await.unwrap();
        next_call(&mut calls).await.complete();

        assert!(matches!(
            session.add_comment("   "),
            Err(ViewerError::Form(FormError::EmptyComment))
        ));
        let comments = session.add_comment(" Falta motivación. ").unwrap();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[2].text, "Falta motivación.");
        assert_eq!(session.comments(2).unwrap().len(), 3);
        assert_eq!(
            surface.events().last(),
            Some(&SurfaceEvent::Comments(vec![
                "Un claro ejemplo de coacción.".to_string(),
                "La defensa no presentó suficientes pruebas.".to_string(),
                "Falta motivación.".to_string(),
            ]))
        );
    }

    #[tokio::test]
    async fn test_forms() {
        let (backend, _calls) = GatedBackend::new(1);
        let surface = Arc::new(RecordingSurface::new());
        let mut session = session(&backend, &surface);

        assert_eq!(session.subscribe(" a@b.es ").unwrap(), "a@b.es");
        assert!(matches!(
            session.subscribe(""),
            Err(ViewerError::Form(FormError::EmptyEmail))
        ));

        assert!(!session.is_admin());
        session.admin_login();
        assert!(session.is_admin());
        assert_eq!(session.blog_posts().len(), 1);
        assert_eq!(session.documents().len(), 2);
    }
}
