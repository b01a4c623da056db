//! The fixed catalog of legal-document summaries, their comments and the blog
//! posts shown next to them. Everything lives in memory for the lifetime of a
//! session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DocumentId = u32;

/// A reader comment on a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A legal document in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalDocument {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    /// Location of the PDF: relative to the documents directory, or a URL
    pub url: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// What the document list shows for each entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    documents: Vec<LegalDocument>,
    blog_posts: Vec<BlogPost>,
}

impl Catalog {
    pub fn new(documents: Vec<LegalDocument>, blog_posts: Vec<BlogPost>) -> Self {
        Self {
            documents,
            blog_posts,
        }
    }

    /// The catalog the viewer ships with.
    pub fn seeded() -> Self {
        let document = |id, title: &str, description: &str, url: &str, comments: [&str; 2]| {
            LegalDocument {
                id,
                title: title.to_string(),
                description: description.to_string(),
                url: url.to_string(),
                comments: comments.into_iter().map(Comment::new).collect(),
            }
        };

        Self::new(
            vec![
                document(
                    1,
                    "Sentencia Stalking 2024/001",
                    "Resolución judicial sobre caso de acoso...",
                    "Stalking.pdf",
                    [
                        "Interesante análisis del caso.",
                        "Considero que la pena debería ser mayor.",
                    ],
                ),
                document(
                    2,
                    "Sentencia Coacciones 2024/002",
                    "Análisis jurídico sobre coacciones...",
                    "Coacciones.pdf",
                    [
                        "Un claro ejemplo de coacción.",
                        "La defensa no presentó suficientes pruebas.",
                    ],
                ),
            ],
            vec![BlogPost {
                title: "Claves para reclamar reparaciones a la comunidad de propietarios"
                    .to_string(),
                content: "Si necesitas que la comunidad haga reparaciones en tu edificio o \
                          vivienda, aquí tienes algunos consejos clave..."
                    .to_string(),
                image_url: "junta-vecinos.jpg".to_string(),
            }],
        )
    }

    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents
            .iter()
            .map(|doc| DocumentSummary {
                id: doc.id,
                title: doc.title.clone(),
                description: doc.description.clone(),
            })
            .collect()
    }

    pub fn get(&self, id: DocumentId) -> Option<&LegalDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn comments(&self, id: DocumentId) -> Option<&[Comment]> {
        self.get(id).map(|doc| doc.comments.as_slice())
    }

    /// Append a comment, returning the document's updated comment list.
    pub fn add_comment(&mut self, id: DocumentId, comment: Comment) -> Option<&[Comment]> {
        let doc = self.documents.iter_mut().find(|doc| doc.id == id)?;
        doc.comments.push(comment);
        Some(doc.comments.as_slice())
    }

    pub fn blog_posts(&self) -> &[BlogPost] {
        &self.blog_posts
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}
