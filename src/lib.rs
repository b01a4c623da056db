// JurisView - legal document viewer
//
// The library holds the whole viewer: the document catalog, PDF rendering
// through PDFium, the single-flight page scheduler and the forms. The
// `desktop` feature adds the Tauri shell that exposes it to a WebView.

pub mod catalog;
#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod forms;
pub mod pdf;
pub mod scheduler;
pub mod surface;
pub mod viewer;

pub use catalog::{BlogPost, Catalog, Comment, DocumentId, DocumentSummary, LegalDocument};
pub use config::{ConfigError, ViewerConfig};
pub use forms::FormError;
pub use pdf::{DocumentLoadError, PageRenderError, PdfBackend, PdfiumBackend};
pub use scheduler::{PageRenderScheduler, RenderDisposition, RenderPhase, SchedulerState};
pub use surface::{RecordingSurface, ViewerSurface};
pub use viewer::{ViewerError, ViewerSession, LOAD_ERROR_MESSAGE};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `filter`.
/// Calling it twice is harmless.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{
        add_comment, admin_login, get_blog_posts, get_comments, go_to_page, list_documents,
        next_page, open_document, previous_page, subscribe, AppState, EventSurface,
    };
    use std::sync::Arc;
    use tauri::Manager;

    let (config, config_error) = match ViewerConfig::from_env() {
        Ok(config) => (config, None),
        Err(e) => (ViewerConfig::default(), Some(e)),
    };
    init_tracing(&config.log_filter);
    if let Some(e) = config_error {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        documents_dir = %config.documents_dir.display(),
        "Starting JurisView"
    );

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            let backend = Arc::new(PdfiumBackend::new(config.pdfium_dir.clone()));
            let surface = Arc::new(EventSurface::new(app.handle().clone()));
            app.manage(AppState::new(ViewerSession::new(config, backend, surface)));
            tracing::info!("App setup complete");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            list_documents,
            open_document,
            next_page,
            previous_page,
            go_to_page,
            get_comments,
            add_comment,
            subscribe,
            admin_login,
            get_blog_posts,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
