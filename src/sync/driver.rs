use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("no link with text {0:?}")]
    LinkNotFound(String),
    #[error("element <{0}> has no href to follow")]
    NotALink(String),
    #[error("invalid css selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("no page loaded")]
    NoPage,
    #[error("malformed snapshot: {0}")]
    Snapshot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One element as rendered by the remote page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteElement {
    pub tag_name: String,
    pub href: Option<String>,
    pub text: String,
}

impl RemoteElement {
    pub fn is_link(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("a")
    }
}

/// An exclusively-owned automation session. Not safe for concurrent use.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;
    fn find_by_link_text(&mut self, text: &str) -> Result<RemoteElement, DriverError>;
    fn click(&mut self, element: &RemoteElement) -> Result<(), DriverError>;
    fn find_all_by_css(&mut self, selector: &str) -> Result<Vec<RemoteElement>, DriverError>;
    fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens automation sessions.
pub trait Connector {
    type Browser: Browser;

    fn connect(&self) -> Result<Self::Browser, DriverError>;
}

/// Pages without a known origin resolve against this root.
const DETACHED_ROOT: &str = "http://detached.invalid/";

/// A parsed href. Only path and query matter for matching; scheme, host
/// and fragment are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefParts {
    url: Url,
}

impl HrefParts {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Self::resolve(None, href)
    }

    /// Resolves a relative `href` against `base`, or against a detached
    /// root when there is no base.
    pub fn resolve(base: Option<&Url>, href: &str) -> Result<Self, url::ParseError> {
        let href = href.trim();
        let url = match Url::parse(href) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match base {
                Some(base) => base.join(href)?,
                None => Url::parse(DETACHED_ROOT)?.join(href)?,
            },
            Err(e) => return Err(e),
        };
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// First value of `key`, percent-decoded.
    pub fn query_value(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn has_segment(&self, segment: &str) -> bool {
        self.url
            .path_segments()
            .map(|mut segments| segments.any(|s| s == segment))
            .unwrap_or(false)
    }

    /// Path plus query, the form snapshot pages are keyed by.
    pub fn location(&self) -> String {
        match self.url.query() {
            Some(query) if !query.is_empty() => format!("{}?{}", self.url.path(), query),
            _ => self.url.path().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_drops_host_and_fragment() {
        let h = HrefParts::parse("https://lms.example.sk/mod/quiz/view.php?id=55&mode=x#top")
            .expect("parse");
        assert_eq!(h.url().path(), "/mod/quiz/view.php");
        assert_eq!(h.query_value("id").as_deref(), Some("55"));
        assert_eq!(h.query_value("mode").as_deref(), Some("x"));
        assert!(h.has_segment("quiz"));
        assert!(!h.has_segment("assign"));
        assert_eq!(h.location(), "/mod/quiz/view.php?id=55&mode=x");
    }

    #[test]
    fn href_without_query_or_host() {
        let h = HrefParts::parse("/grade/report/index.php").expect("parse");
        assert_eq!(h.location(), "/grade/report/index.php");
        assert_eq!(h.query_value("id"), None);
        assert_eq!(
            HrefParts::parse("https://lms.example.sk")
                .expect("parse")
                .location(),
            "/"
        );
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let h = HrefParts::parse("/mod/assign/view.php?id=%37&name=Z%C3%A1vere%C4%8Dn%C3%A1+sk%C3%BA%C5%A1ka")
            .expect("parse");
        assert_eq!(h.query_value("id").as_deref(), Some("7"));
        assert_eq!(h.query_value("name").as_deref(), Some("Záverečná skúška"));
    }

    #[test]
    fn relative_href_joins_onto_the_current_page() {
        let page = Url::parse("https://lms.example.sk/grade/edit/tree/index.php?id=12")
            .expect("page url");
        let h = HrefParts::resolve(Some(&page), "../../report/grader/index.php?id=12")
            .expect("resolve");
        assert_eq!(h.location(), "/grade/report/grader/index.php?id=12");
        assert_eq!(h.url().host_str(), Some("lms.example.sk"));

        let sibling = HrefParts::resolve(Some(&page), "index.php?id=13").expect("resolve");
        assert_eq!(sibling.location(), "/grade/edit/tree/index.php?id=13");

        let detached = HrefParts::parse("index.php?id=12").expect("parse");
        assert_eq!(detached.location(), "/index.php?id=12");
    }
}
