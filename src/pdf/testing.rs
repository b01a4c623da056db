//! A hand-driven [`PdfBackend`] for tests: every render blocks until the test
//! completes or fails it.

use super::{
    DocumentHandle, DocumentInfo, DocumentLoadError, DocumentSource, PageRenderError, PdfBackend,
    RenderedPage,
};
use async_trait::async_trait;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A render the backend has been asked for and is waiting on.
pub struct RenderCall {
    pub page_number: u32,
    reply: oneshot::Sender<Result<RenderedPage, PageRenderError>>,
}

impl RenderCall {
    pub fn complete(self) {
        let page = RenderedPage {
            page_number: self.page_number,
            width: 10,
            height: 14,
            png: vec![self.page_number as u8],
        };
        let _ = self.reply.send(Ok(page));
    }

    pub fn fail(self, error: PageRenderError) {
        let _ = self.reply.send(Err(error));
    }
}

pub struct GatedBackend {
    page_count: u32,
    fail_open: bool,
    calls: mpsc::UnboundedSender<RenderCall>,
    opened: Mutex<Vec<DocumentSource>>,
}

impl GatedBackend {
    pub fn new(page_count: u32) -> (Arc<Self>, mpsc::UnboundedReceiver<RenderCall>) {
        Self::build(page_count, false)
    }

    /// Every `open_document` fails as if the file were corrupt.
    pub fn failing_open() -> (Arc<Self>, mpsc::UnboundedReceiver<RenderCall>) {
        Self::build(0, true)
    }

    fn build(page_count: u32, fail_open: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<RenderCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        let backend = Self {
            page_count,
            fail_open,
            calls,
            opened: Mutex::new(Vec::new()),
        };
        (Arc::new(backend), rx)
    }

    pub fn handle(&self) -> DocumentHandle {
        DocumentHandle::new(
            b"%PDF-1.7".to_vec(),
            DocumentInfo {
                page_count: self.page_count,
                title: None,
                author: None,
                pdf_version: "Pdf1_7".to_string(),
            },
        )
    }

    pub fn opened(&self) -> Vec<DocumentSource> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfBackend for GatedBackend {
    async fn open_document(
        &self,
        source: &DocumentSource,
    ) -> Result<DocumentHandle, DocumentLoadError> {
        self.opened.lock().unwrap().push(source.clone());
        if self.fail_open {
            return Err(DocumentLoadError::Parse("corrupt xref table".to_string()));
        }
        Ok(self.handle())
    }

    async fn render_page(
        &self,
        _document: &DocumentHandle,
        page_number: u32,
        _scale: f32,
    ) -> Result<RenderedPage, PageRenderError> {
        let (reply, rx) = oneshot::channel();
        self.calls
            .send(RenderCall { page_number, reply })
            .map_err(|_| PageRenderError::Task("test harness gone".to_string()))?;
        rx.await
            .unwrap_or_else(|_| Err(PageRenderError::Task("render call dropped".to_string())))
    }
}

/// Wait for the next render the backend receives.
pub async fn next_call(calls: &mut mpsc::UnboundedReceiver<RenderCall>) -> RenderCall {
    tokio::time::timeout(Duration::from_secs(1), calls.recv())
        .await
        .expect("timed out waiting for a render")
        .expect("backend dropped")
}

/// Let spawned tasks run, then assert no further render was requested.
pub async fn assert_no_call(calls: &mut mpsc::UnboundedReceiver<RenderCall>) {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    assert!(calls.try_recv().is_err(), "unexpected render request");
}

/// Answer a single HTTP request on a local port with `response`, verbatim.
/// Returns the server's base URL.
pub fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local address");
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{}", addr)
}
