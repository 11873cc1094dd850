//! Builder for test source pages with sensible defaults.

// Allow dead code since not every test binary uses every builder method
#![allow(dead_code)]

use scms::domain::PageId;

/// Builder for creating source documents with the metadata markers.
///
/// Generates a fresh id and a root parent, with a fluent API for the rest.
#[derive(Debug, Clone)]
pub struct TestPage {
    id: String,
    parent: String,
    title: String,
    body: String,
    index: bool,
    math: bool,
}

impl TestPage {
    /// Creates a root page with the given title and a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: PageId::new().to_string(),
            parent: "root".to_string(),
            title: title.into(),
            body: String::new(),
            index: false,
            math: false,
        }
    }

    /// Sets an explicit id for the page.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Makes the page a child of `parent`.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Makes the page a child of another test page.
    pub fn child_of(self, parent: &TestPage) -> Self {
        let id = parent.page_id().to_string();
        self.parent(id)
    }

    /// Sets the body markup.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Claims the root index.
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Marks the page as using math.
    pub fn math(mut self) -> Self {
        self.math = true;
        self
    }

    pub fn page_id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Renders the source document.
    pub fn to_html(&self) -> String {
        let mut head = format!(
            "<meta name=\"scms-uuid\" value=\"{}\">\n<meta name=\"scms-parent-uuid\" value=\"{}\">\n",
            self.id, self.parent
        );
        if self.index {
            head.push_str("<meta name=\"scms-is-index\" value=\"true\">\n");
        }
        if self.math {
            head.push_str("<meta name=\"scms-uses-math\" value=\"true\">\n");
        }
        format!(
            "<!DOCTYPE html>\n<html><head>\n{head}<title>{}</title>\n</head><body>{}</body></html>\n",
            self.title, self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // TestPage Builder
    // ===========================================

    #[test]
    fn test_page_generates_uuid() {
        let page = TestPage::new("Home");
        assert!(page.page_id().parse::<PageId>().is_ok());
        assert_eq!(page.title(), "Home");
    }

    #[test]
    fn test_page_renders_markers() {
        let home = TestPage::new("Home").id("11111111-1111-1111-1111-111111111111");
        let about = TestPage::new("About").child_of(&home).index().math().body("<p>x</p>");
        let html = about.to_html();

        assert!(html.contains(r#"name="scms-parent-uuid" value="11111111-1111-1111-1111-111111111111""#));
        assert!(html.contains(r#"name="scms-is-index" value="true""#));
        assert!(html.contains(r#"name="scms-uses-math" value="true""#));
        assert!(html.contains("<title>About</title>"));
        assert!(html.contains("<body><p>x</p></body>"));
    }

    #[test]
    fn test_page_defaults_to_root() {
        let html = TestPage::new("Home").to_html();
        assert!(html.contains(r#"value="root""#));
        assert!(!html.contains("scms-is-index"));
    }
}
