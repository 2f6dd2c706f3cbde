//! The page being annotated.
//!
//! A `Page` is a canonical URL plus a mutable DOM. Changes made by the host
//! (infinite scroll, client-side rendering, reloads) arrive as `PageEvent`s,
//! which the driver applies before deciding whether a rescan is due.

pub mod url;

pub use self::url::{UrlError, canonicalize};

use dom_query::Document;
use yadz_core::Error;

/// A DOM change reported by the page host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Markup appended to every element matching `parent`.
    Append { parent: String, html: String },
    /// Attribute change on every element matching `selector`. Adds no nodes.
    SetAttr { selector: String, name: String, value: String },
    /// The whole document was re-rendered.
    Replace { html: String },
}

/// A parsed page and the URL it was loaded from.
pub struct Page {
    url: ::url::Url,
    document: Document,
}

impl Page {
    /// Parse `html` as the document found at `url`.
    pub fn parse(url: &str, html: &str) -> Result<Self, Error> {
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::from_parts(url, html))
    }

    pub fn from_parts(url: ::url::Url, html: &str) -> Self {
        Self { url, document: Document::from(html) }
    }

    pub fn url(&self) -> &::url::Url {
        &self.url
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Origin used to scope cached entries (e.g. `https://www.yad2.co.il`).
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Serialize the current (annotated) document.
    pub fn html(&self) -> String {
        self.document.html().to_string()
    }

    /// Apply a host event to the DOM.
    ///
    /// Returns whether the event added nodes, i.e. whether new content may need
    /// scanning. Selectors that fail to parse or match nothing are ignored.
    pub fn apply(&mut self, event: PageEvent) -> bool {
        match event {
            PageEvent::Append { parent, html } => {
                if html.trim().is_empty() {
                    return false;
                }
                match self.document.try_select(&parent) {
                    Some(targets) if targets.exists() => {
                        targets.append_html(html);
                        true
                    }
                    _ => false,
                }
            }
            PageEvent::SetAttr { selector, name, value } => {
                if let Some(targets) = self.document.try_select(&selector) {
                    targets.set_attr(&name, &value);
                }
                false
            }
            PageEvent::Replace { html } => {
                self.document = Document::from(html.as_str());
                true
            }
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url.as_str()).finish_non_exhaustive()
    }
}
