use super::driver::{Browser, Connector, DriverError, RemoteElement};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailAt {
    Navigate,
    Link(String),
    Headers,
}

/// In-memory browser: every page offers the same links and header row.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBrowser {
    pub links: Vec<RemoteElement>,
    pub headers: Vec<RemoteElement>,
    pub fail_at: Option<FailAt>,
    closes: Rc<Cell<usize>>,
}

impl ScriptedBrowser {
    pub fn with_links(texts: &[&str]) -> Self {
        let links = texts
            .iter()
            .map(|t| RemoteElement {
                tag_name: "a".into(),
                href: Some(format!("/{}", t.replace(' ', "_"))),
                text: t.to_string(),
            })
            .collect();
        Self {
            links,
            ..Self::default()
        }
    }
}

impl Browser for ScriptedBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        if self.fail_at == Some(FailAt::Navigate) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "timed out".into(),
            });
        }
        Ok(())
    }

    fn find_by_link_text(&mut self, text: &str) -> Result<RemoteElement, DriverError> {
        if self.fail_at == Some(FailAt::Link(text.to_string())) {
            return Err(DriverError::LinkNotFound(text.to_string()));
        }
        self.links
            .iter()
            .find(|l| l.text == text)
            .cloned()
            .ok_or_else(|| DriverError::LinkNotFound(text.to_string()))
    }

    fn click(&mut self, element: &RemoteElement) -> Result<(), DriverError> {
        let href = element
            .href
            .clone()
            .ok_or_else(|| DriverError::NotALink(element.tag_name.clone()))?;
        self.navigate(&href)
    }

    fn find_all_by_css(&mut self, _selector: &str) -> Result<Vec<RemoteElement>, DriverError> {
        if self.fail_at == Some(FailAt::Headers) {
            return Err(DriverError::NoPage);
        }
        Ok(self.headers.clone())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}

pub struct ScriptedConnector {
    template: Option<ScriptedBrowser>,
    closes: Rc<Cell<usize>>,
}

impl ScriptedConnector {
    pub fn new(mut template: ScriptedBrowser) -> Self {
        let closes = Rc::new(Cell::new(0));
        template.closes = closes.clone();
        Self {
            template: Some(template),
            closes,
        }
    }

    pub fn refusing() -> Self {
        Self {
            template: None,
            closes: Rc::new(Cell::new(0)),
        }
    }

    pub fn closed(&self) -> usize {
        self.closes.get()
    }
}

impl Connector for ScriptedConnector {
    type Browser = ScriptedBrowser;

    fn connect(&self) -> Result<ScriptedBrowser, DriverError> {
        self.template.clone().ok_or_else(|| DriverError::Navigation {
            url: "about:blank".into(),
            reason: "session refused".into(),
        })
    }
}

pub fn anchor(href: &str, text: &str) -> RemoteElement {
    RemoteElement {
        tag_name: "a".into(),
        href: Some(href.into()),
        text: text.into(),
    }
}

pub fn plain(tag: &str, text: &str) -> RemoteElement {
    RemoteElement {
        tag_name: tag.into(),
        href: None,
        text: text.into(),
    }
}
