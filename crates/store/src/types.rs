//! Publication store type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hyperlink inside a publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    /// Link text
    #[serde(default)]
    pub text: Option<String>,

    /// Link target URL
    #[serde(default)]
    pub target: Option<String>,
}

/// One level of a publication's breadcrumb path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Displayed label
    #[serde(default)]
    pub label: Option<String>,

    /// Optional URL of the breadcrumb level
    #[serde(default)]
    pub url: Option<String>,
}

/// An official publication as produced by the corpus parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Publication {
    /// Stable publication identifier; assigned at ingest when missing
    #[serde(default)]
    pub id: Option<String>,

    /// Canonical service-public.fr URL
    #[serde(default, alias = "sp_url")]
    pub url: Option<String>,

    /// Publication title
    #[serde(default)]
    pub title: Option<String>,

    /// Content paragraphs
    #[serde(default)]
    pub paragraphs: Vec<String>,

    /// List blocks
    #[serde(default)]
    pub lists: Vec<Vec<String>>,

    /// Related links
    #[serde(default)]
    pub links: Vec<Link>,

    /// Taxonomy path
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,

    /// Last modification date from the upstream feed
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl Publication {
    /// Render the publication as markdown.
    ///
    /// This rendering is the text representation that gets embedded and
    /// stored; the URL line inside it is what grounded answers cite.
    pub fn to_markdown(&self) -> String {
        let mut md: Vec<String> = Vec::new();

        if let Some(title) = &self.title {
            md.push(format!("# {}\n", title));
            if let Some(id) = &self.id {
                md.push(format!("**ID**: `{}`  \n", id));
            }
            if let Some(url) = &self.url {
                md.push(format!("**URL**: [{}]({})\n", url, url));
            }
        }

        if !self.paragraphs.is_empty() {
            md.push("## Content\n".to_string());
            for p in &self.paragraphs {
                let cleaned = p.replace('\u{a0}', " ");
                md.push(format!("{}\n\n", cleaned.trim()));
            }
        }

        if !self.lists.is_empty() {
            md.push("## Key Points\n".to_string());
            for list in &self.lists {
                md.push(
                    list.iter()
                        .map(|item| format!("- {}", item))
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
                md.push("\n".to_string());
            }
        }

        if !self.links.is_empty() {
            md.push("## Related Links\n".to_string());
            for link in &self.links {
                let text = link.text.as_deref().unwrap_or("Link");
                let target = link.target.as_deref().unwrap_or("#");
                md.push(format!("- [{}]({})\n", text, target));
            }
        }

        if !self.breadcrumbs.is_empty() {
            let crumbs = self
                .breadcrumbs
                .iter()
                .map(|b| b.label.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" > ");
            md.push(format!("**Path**: {}\n", crumbs));
        }

        md.join("\n").trim().to_string()
    }
}

/// A publication as persisted in the vector store.
///
/// `id` is the storage key: re-ingesting the same id replaces prior
/// content. `date_added` drives stale-record eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Storage key
    pub id: String,

    /// Publication title (empty when the source had none)
    pub title: String,

    /// Canonical URL (empty when the source had none)
    pub url: String,

    /// Rendered markdown text
    pub text: String,

    /// Timestamp of the ingestion run that wrote this record
    pub date_added: DateTime<Utc>,

    /// Embedding of `text`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A search hit with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub score: f32,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of publications written
    pub publications: usize,

    /// Number of write batches
    pub batches: usize,

    /// Number of stale records evicted
    pub evicted: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}
