//! Replay driver over previously rendered pages.
//!
//! A snapshot directory holds `pages.json`, which maps page locations to
//! HTML files in the same directory:
//!
//! ```json
//! { "pages": { "/course/view.php?id=12": "course.html" } }
//! ```
//!
//! Locations are compared by path and query; scheme and host are ignored.
//! Relative hrefs resolve against the page currently loaded.

use super::driver::{Browser, Connector, DriverError, HrefParts, RemoteElement};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

pub const MANIFEST_FILE: &str = "pages.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    pages: HashMap<String, String>,
}

pub struct SnapshotConnector {
    root: PathBuf,
}

impl SnapshotConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Connector for SnapshotConnector {
    type Browser = SnapshotBrowser;

    fn connect(&self) -> Result<SnapshotBrowser, DriverError> {
        SnapshotBrowser::open(&self.root)
    }
}

pub struct SnapshotBrowser {
    root: PathBuf,
    pages: HashMap<String, String>,
    current: Option<LoadedPage>,
}

struct LoadedPage {
    url: Url,
    source: String,
}

impl SnapshotBrowser {
    pub fn open(root: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(root.join(MANIFEST_FILE))?;
        let manifest: Manifest = serde_json::from_str(&text)
            .map_err(|e| DriverError::Snapshot(format!("{MANIFEST_FILE}: {e}")))?;
        let mut pages = HashMap::with_capacity(manifest.pages.len());
        for (location, file) in manifest.pages {
            let key = HrefParts::parse(&location)
                .map_err(|e| DriverError::Snapshot(format!("{MANIFEST_FILE}: {location}: {e}")))?
                .location();
            pages.insert(key, file);
        }
        Ok(Self {
            root: root.to_path_buf(),
            pages,
            current: None,
        })
    }

    fn page(&self) -> Result<(&Url, Html), DriverError> {
        let page = self.current.as_ref().ok_or(DriverError::NoPage)?;
        Ok((&page.url, Html::parse_document(&page.source)))
    }
}

/// Links come back absolute, the way a live browser reports them.
fn to_remote(base: &Url, el: ElementRef<'_>) -> RemoteElement {
    let mut text = String::new();
    for word in el.text().flat_map(str::split_whitespace) {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(word);
    }
    RemoteElement {
        tag_name: el.value().name().to_string(),
        href: el.value().attr("href").map(|raw| match base.join(raw.trim()) {
            Ok(url) => url.to_string(),
            Err(_) => raw.to_string(),
        }),
        text,
    }
}

impl Browser for SnapshotBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let base = self.current.as_ref().map(|p| &p.url);
        let target = HrefParts::resolve(base, url).map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let location = target.location();
        let Some(file) = self.pages.get(&location) else {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "page not in snapshot".to_string(),
            });
        };
        let source = std::fs::read_to_string(self.root.join(file)).map_err(|e| {
            DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::trace!(%location, file = %file, "snapshot page loaded");
        self.current = Some(LoadedPage {
            url: target.url().clone(),
            source,
        });
        Ok(())
    }

    fn find_by_link_text(&mut self, text: &str) -> Result<RemoteElement, DriverError> {
        let (base, doc) = self.page()?;
        let links = Selector::parse("a").map_err(|e| DriverError::InvalidSelector {
            selector: "a".to_string(),
            reason: format!("{e:?}"),
        })?;
        let wanted = text.trim();
        let found = doc
            .select(&links)
            .map(|el| to_remote(base, el))
            .find(|el| el.text == wanted);
        found.ok_or_else(|| DriverError::LinkNotFound(text.to_string()))
    }

    fn click(&mut self, element: &RemoteElement) -> Result<(), DriverError> {
        let Some(href) = element.href.as_deref() else {
            return Err(DriverError::NotALink(element.tag_name.clone()));
        };
        self.navigate(href)
    }

    fn find_all_by_css(&mut self, selector: &str) -> Result<Vec<RemoteElement>, DriverError> {
        let parsed = Selector::parse(selector).map_err(|e| DriverError::InvalidSelector {
            selector: selector.to_string(),
            reason: format!("{e:?}"),
        })?;
        let (base, doc) = self.page()?;
        let found = doc.select(&parsed).map(|el| to_remote(base, el)).collect();
        Ok(found)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.current = None;
        Ok(())
    }
}
