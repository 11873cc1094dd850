//! A single source document after extraction.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::dom::{Document, NodeId, Predicate};
use crate::domain::{PageId, ParseIdError};
use crate::infra::FileTimes;

use super::references;

pub const PAGE_SCHEME: &str = "page:";
pub const REF_SCHEME: &str = "ref:";
pub const NOTE_SCHEME: &str = "note:";

const NOTE_ELEMENT: &str = "aside";
const SUMMARY_ELEMENT: &str = "p";
const SUMMARY_ID: &str = "article-summary";
const SUMMARY_TITLE_ELEMENT: &str = "h1";
const SUMMARY_TITLE_ID: &str = "article-summary-title";
const LATEST_ARTICLES_ELEMENT: &str = "section";
const LATEST_ARTICLES_ID: &str = "latest-articles";

static NULL_PARENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(null|none|root)$").expect("valid regex"));

static UUID_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

static META_UUID: LazyLock<Predicate> = LazyLock::new(|| meta("scms-uuid"));
static META_PARENT_UUID: LazyLock<Predicate> = LazyLock::new(|| meta("scms-parent-uuid"));
static META_MATH: LazyLock<Predicate> = LazyLock::new(|| meta("scms-uses-math"));
static META_INDEX: LazyLock<Predicate> = LazyLock::new(|| meta("scms-is-index"));

static PAGE_ANCHOR: LazyLock<Predicate> =
    LazyLock::new(|| Predicate::tag("a").and(Predicate::attr_prefix("href", PAGE_SCHEME)));

static CONTENT_ID_ELEMENT: LazyLock<Predicate> = LazyLock::new(|| {
    Predicate::any_tag(&["h1", "h2", "h3", "dt"])
        .and(Predicate::attr_matches("id", UUID_VALUE.clone()))
});

static SUMMARY: LazyLock<Predicate> = LazyLock::new(|| {
    Predicate::tag(SUMMARY_ELEMENT).and(Predicate::attr_eq("id", SUMMARY_ID))
});

fn meta(name: &str) -> Predicate {
    Predicate::tag("meta").and(Predicate::attr_eq("name", name))
}

/// Structural problems that make a document unusable as a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("expected element <{0}>")]
    MissingElement(&'static str),

    #[error("missing {0}")]
    MissingMarker(&'static str),

    #[error("while parsing {description}: {source}")]
    InvalidId {
        description: &'static str,
        #[source]
        source: ParseIdError,
    },

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("page cannot be its own parent")]
    SelfParent,

    #[error("path {path} is not below source root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("link '{href}' requires a UUID after 'page:'")]
    InvalidPageLink { href: String },
}

/// One authored document: identity, flags and its content split into
/// article, footer and notes.
///
/// The content lives in the page's own [`Document`]; the article, footer and
/// note ids point into it. Cross-page state (parent, children, filename) is
/// kept by [`Site`](super::Site), not here.
#[derive(Debug)]
pub struct Page {
    id: PageId,
    title: String,
    parent_id: Option<PageId>,
    math: bool,
    index: bool,
    duplicate: bool,
    source_path: PathBuf,
    root_path: PathBuf,
    doc: Document,
    article: NodeId,
    footer: NodeId,
    notes: BTreeMap<String, NodeId>,
    latest_articles: Option<NodeId>,
    summary_title: String,
    reference_list: Option<NodeId>,
    content_ids: BTreeMap<PageId, String>,
    page_refs: BTreeMap<PageId, Vec<NodeId>>,
    times: FileTimes,
}

impl Page {
    /// Extracts a page from a parsed source document.
    ///
    /// Body children are moved into a fresh `<article>`, except top-level
    /// notes (`<aside id="...">`) which are set aside for the reference
    /// table. References are numbered here, once; page links are collected
    /// for later rewriting.
    ///
    /// # Errors
    ///
    /// Returns a [`PageError`] when a required marker, the title or the body
    /// is missing, an id is malformed, the page names itself as parent, the
    /// path is outside `root_path`, or a `page:` link lacks a UUID.
    pub fn from_source(
        mut doc: Document,
        source_path: impl Into<PathBuf>,
        root_path: impl Into<PathBuf>,
        times: FileTimes,
    ) -> Result<Self, PageError> {
        let source_path = source_path.into();
        let root_path = root_path.into();
        if source_path.strip_prefix(&root_path).is_err() {
            return Err(PageError::OutsideRoot {
                path: source_path,
                root: root_path,
            });
        }

        let root = doc.root();
        let head = doc
            .find_first(root, &Predicate::tag("head"))
            .ok_or(PageError::MissingElement("head"))?;

        let id = identifier(&doc, head, &META_UUID, "page identifier", false)?
            .ok_or(PageError::MissingMarker("page identifier"))?;
        let title = read_title(&doc, head)?;
        let math = flag(&doc, head, &META_MATH);
        let index = flag(&doc, head, &META_INDEX);
        let parent_id = identifier(&doc, head, &META_PARENT_UUID, "parent identifier", true)?;

        if parent_id == Some(id) {
            return Err(PageError::SelfParent);
        }

        let body = doc
            .find_first(root, &Predicate::tag("body"))
            .ok_or(PageError::MissingElement("body"))?;

        let article = doc.create_element("article");
        let footer = doc.create_element("footer");
        let note_element = Predicate::tag(NOTE_ELEMENT);
        let summary_title_element =
            Predicate::tag(SUMMARY_TITLE_ELEMENT).and(Predicate::attr_eq("id", SUMMARY_TITLE_ID));
        let latest_element = Predicate::tag(LATEST_ARTICLES_ELEMENT)
            .and(Predicate::attr_eq("id", LATEST_ARTICLES_ID));

        let mut notes = BTreeMap::new();
        let mut summary_title = None;
        let mut latest_articles = None;
        for child in doc.children(body).to_vec() {
            if note_element.matches(&doc, child)
                && let Some(note_id) = doc.attr(child, "id").filter(|v| !v.is_empty())
            {
                let note_id = note_id.to_string();
                doc.detach(child);
                if notes.contains_key(&note_id) {
                    log::warn!(
                        "duplicate note id '{note_id}' in {}, keeping the first",
                        source_path.display()
                    );
                } else {
                    notes.insert(note_id, child);
                }
                continue;
            }
            if summary_title.is_none() && summary_title_element.matches(&doc, child) {
                summary_title = Some(doc.text(child));
            }
            if latest_articles.is_none() && latest_element.matches(&doc, child) {
                latest_articles = Some(child);
            }
            doc.append(article, child);
        }

        let reference_list = references::number_references(&mut doc, article, footer, &notes);

        let mut page_refs = collect_page_refs(&doc, article, true)?;
        if let Some(list) = reference_list {
            for (target, anchors) in collect_page_refs(&doc, list, false)? {
                page_refs.entry(target).or_default().extend(anchors);
            }
        }

        let mut page = Self {
            id,
            title: title.clone(),
            parent_id,
            math,
            index,
            duplicate: false,
            source_path,
            root_path,
            doc,
            article,
            footer,
            notes,
            latest_articles,
            summary_title: summary_title.unwrap_or(title),
            reference_list,
            content_ids: BTreeMap::new(),
            page_refs,
            times,
        };
        page.content_ids = page.collect_content_ids();
        if page.index {
            log::info!("index claim by {page}");
        }
        Ok(page)
    }

    fn collect_content_ids(&self) -> BTreeMap<PageId, String> {
        let mut ids = BTreeMap::new();
        for node in self.doc.find_all(self.article, &CONTENT_ID_ELEMENT) {
            let Some(id) = self.doc.attr(node, "id").and_then(|v| v.parse::<PageId>().ok())
            else {
                continue;
            };
            if ids.contains_key(&id) {
                log::warn!(
                    "duplicate content id {id} in <{}> of {self}",
                    self.doc.tag_name(node).unwrap_or_default()
                );
            } else {
                ids.insert(id, self.doc.text(node));
            }
        }
        ids
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The declared parent, or `None` for a root page.
    pub fn parent_id(&self) -> Option<PageId> {
        self.parent_id
    }

    /// Forgets the declared parent, making this a root page.
    pub(crate) fn clear_parent(&mut self) {
        self.parent_id = None;
    }

    pub fn uses_math(&self) -> bool {
        self.math
    }

    /// The raw `scms-is-index` flag, before hierarchy placement.
    pub fn index_claim(&self) -> bool {
        self.index
    }

    pub(crate) fn clear_index(&mut self) {
        self.index = false;
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }

    pub(crate) fn mark_duplicate(&mut self) {
        self.duplicate = true;
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Source path relative to the source root.
    pub fn relative_path(&self) -> &Path {
        self.source_path
            .strip_prefix(&self.root_path)
            .unwrap_or(&self.source_path)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn article(&self) -> NodeId {
        self.article
    }

    pub fn footer(&self) -> NodeId {
        self.footer
    }

    /// Notes keyed by their element id.
    pub fn notes(&self) -> &BTreeMap<String, NodeId> {
        &self.notes
    }

    /// The `section#latest-articles` insertion point, if the page has one.
    pub fn latest_articles(&self) -> Option<NodeId> {
        self.latest_articles
    }

    pub fn summary_title(&self) -> &str {
        &self.summary_title
    }

    /// The `p#article-summary` element, when it has any content.
    pub fn summary(&self) -> Option<NodeId> {
        self.doc
            .find_first(self.article, &SUMMARY)
            .filter(|p| !self.doc.children(*p).is_empty())
    }

    pub fn reference_list(&self) -> Option<NodeId> {
        self.reference_list
    }

    /// Ids of `h1`/`h2`/`h3`/`dt` content elements mapped to their text.
    pub fn content_ids(&self) -> &BTreeMap<PageId, String> {
        &self.content_ids
    }

    /// Anchors with a `page:` target, grouped by target id.
    pub fn page_refs(&self) -> &BTreeMap<PageId, Vec<NodeId>> {
        &self.page_refs
    }

    pub fn times(&self) -> FileTimes {
        self.times
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.times.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.times.modified
    }

    /// Orders pages by case-insensitive title, then id.
    pub fn compare_by_name(&self, other: &Page) -> Ordering {
        self.title
            .to_lowercase()
            .cmp(&other.title.to_lowercase())
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page \"{}\" [{}] ({})",
            self.title,
            self.id,
            self.source_path.display()
        )
    }
}

/// Collapses every run of ASCII whitespace to one non-breaking space, after
/// trimming. Applying it twice changes nothing.
pub fn normalize_title(raw: &str) -> String {
    raw.split_ascii_whitespace().collect::<Vec<_>>().join("\u{a0}")
}

fn read_title(doc: &Document, head: NodeId) -> Result<String, PageError> {
    let title = doc
        .find_first(head, &Predicate::tag("title"))
        .map(|t| normalize_title(&doc.text(t)))
        .unwrap_or_default();
    if title.is_empty() {
        return Err(PageError::EmptyTitle);
    }
    Ok(title)
}

fn meta_value<'a>(doc: &'a Document, head: NodeId, predicate: &Predicate) -> Option<&'a str> {
    doc.find_first(head, predicate)
        .and_then(|m| doc.attr(m, "value"))
        .filter(|v| !v.is_empty())
}

fn flag(doc: &Document, head: NodeId, predicate: &Predicate) -> bool {
    meta_value(doc, head, predicate).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Reads an id marker. With `nullable`, the values `null`, `none` and `root`
/// mean "no id". A missing marker is always an error.
fn identifier(
    doc: &Document,
    head: NodeId,
    predicate: &Predicate,
    description: &'static str,
    nullable: bool,
) -> Result<Option<PageId>, PageError> {
    let value = meta_value(doc, head, predicate).ok_or(PageError::MissingMarker(description))?;
    match value.parse::<PageId>() {
        Ok(id) => Ok(Some(id)),
        Err(_) if nullable && NULL_PARENT.is_match(value.trim()) => Ok(None),
        Err(source) => Err(PageError::InvalidId {
            description,
            source,
        }),
    }
}

/// Groups `page:` anchors under `scope` by target. With `strict`, a target
/// that is not a UUID is an error; otherwise such anchors are ignored.
fn collect_page_refs(
    doc: &Document,
    scope: NodeId,
    strict: bool,
) -> Result<BTreeMap<PageId, Vec<NodeId>>, PageError> {
    let mut refs: BTreeMap<PageId, Vec<NodeId>> = BTreeMap::new();
    for anchor in doc.find_all(scope, &PAGE_ANCHOR) {
        let href = doc.attr(anchor, "href").unwrap_or_default();
        match href[PAGE_SCHEME.len()..].parse::<PageId>() {
            Ok(target) => refs.entry(target).or_default().push(anchor),
            Err(_) if !strict => {}
            Err(_) => {
                return Err(PageError::InvalidPageLink {
                    href: href.to_string(),
                });
            }
        }
    }
    Ok(refs)
}
