//! Cross-reference resolution.
//!
//! Two link families are handled here:
//!
//! - `ref:` links become numbered footnote pointers into a per-page reference
//!   table. `ref:note:{id}` pulls a note's content into the table, and notes
//!   are scanned for further `ref:` links until nothing new turns up.
//! - `page:{uuid}` links are rewritten to the target page's output filename,
//!   falling back to in-content anchors of other pages, and finally to a
//!   visible `[NOT FOUND]` link.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::dom::{Document, NodeId, Predicate};
use crate::domain::{Diagnostic, PageId};

use super::page::{NOTE_SCHEME, Page, REF_SCHEME};
use super::Site;

const REFERENCE_LIST_ID: &str = "reference-list";
const REFERENCE_ID_PREFIX: &str = "scms_reference_";
const NOT_FOUND_TEXT: &str = "[NOT FOUND]";

static REF_ANCHOR: LazyLock<Predicate> =
    LazyLock::new(|| Predicate::tag("a").and(Predicate::attr_prefix("href", REF_SCHEME)));

/// Numbers the `ref:` links of a page and builds its reference table.
///
/// The article is scanned first, in document order. Every cited note is then
/// scanned in first-citation order, repeatedly, until a full pass adds no new
/// target. Each distinct target gets one row; repeated citations reuse the
/// number. A `ref:note:` link to an unknown note is left untouched.
///
/// Returns the `<table>` element, appended to `footer` on the first
/// numbered reference, or `None` when nothing was numbered.
pub(crate) fn number_references(
    doc: &mut Document,
    article: NodeId,
    footer: NodeId,
    notes: &BTreeMap<String, NodeId>,
) -> Option<NodeId> {
    let mut table = ReferenceTable {
        footer,
        list: None,
        urls: Vec::new(),
    };
    table.process(doc, article, notes);
    if table.list.is_none() {
        return None;
    }

    let mut expanded: BTreeSet<&str> = BTreeSet::new();
    loop {
        let before = table.urls.len();
        let pending: Vec<(&str, NodeId)> = table
            .urls
            .iter()
            .filter_map(|url| url.strip_prefix(NOTE_SCHEME))
            .filter_map(|key| notes.get_key_value(key))
            .filter(|(key, _)| !expanded.contains(key.as_str()))
            .map(|(key, node)| (key.as_str(), *node))
            .collect();
        for (key, note) in pending {
            expanded.insert(key);
            table.process(doc, note, notes);
        }
        if table.urls.len() == before {
            break;
        }
    }
    table.list
}

struct ReferenceTable {
    footer: NodeId,
    list: Option<NodeId>,
    urls: Vec<String>,
}

impl ReferenceTable {
    fn process(&mut self, doc: &mut Document, scope: NodeId, notes: &BTreeMap<String, NodeId>) {
        for anchor in doc.find_all(scope, &REF_ANCHOR) {
            let url = doc.attr(anchor, "href").unwrap_or_default()[REF_SCHEME.len()..].to_string();
            let number = match self.urls.iter().position(|u| *u == url) {
                Some(index) => index + 1,
                None => {
                    let note = match url.strip_prefix(NOTE_SCHEME) {
                        Some(key) => match notes.get(key) {
                            Some(note) => Some(*note),
                            None => {
                                log::debug!("reference to unknown note '{key}' left as is");
                                continue;
                            }
                        },
                        None => None,
                    };
                    self.urls.push(url.clone());
                    let number = self.urls.len();
                    self.add_row(doc, anchor, number, &url, note);
                    number
                }
            };
            doc.set_attr(anchor, "href", &format!("#{REFERENCE_ID_PREFIX}{number}"));
            doc.set_text(anchor, &number.to_string());
            doc.set_attr(anchor, "class", "reference-ptr");
        }
    }

    fn add_row(
        &mut self,
        doc: &mut Document,
        citing: NodeId,
        number: usize,
        url: &str,
        note: Option<NodeId>,
    ) {
        let footer = self.footer;
        let list = *self.list.get_or_insert_with(|| {
            let div = doc.append_element(footer, "div", &[("class", "reference references")]);
            doc.append_element(
                div,
                "table",
                &[
                    ("class", "reference reference-list"),
                    ("id", REFERENCE_LIST_ID),
                ],
            )
        });

        let row_id = format!("{REFERENCE_ID_PREFIX}{number}");
        let row = doc.append_element(
            list,
            "tr",
            &[("class", "reference reference-item"), ("id", row_id.as_str())],
        );
        let number_cell =
            doc.append_element(row, "td", &[("class", "reference reference-item-number")]);
        doc.append_text(number_cell, &number.to_string());
        let content =
            doc.append_element(row, "td", &[("class", "reference reference-item-content")]);

        match note {
            Some(note) => {
                doc.set_attr(note, "class", "reference reference-item-content-link");
                doc.append(content, note);
            }
            None => {
                let caption = doc.text(citing);
                let caption = if caption.is_empty() { url.to_string() } else { caption };
                let link = doc.append_element(
                    content,
                    "a",
                    &[
                        ("href", url),
                        ("class", "reference reference-item-content-link"),
                    ],
                );
                doc.append_text(link, &caption);
            }
        }
    }
}

/// Where a resolved `page:` link points and what text it may take.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    href: String,
    text: String,
}

/// Link targets of a site: whole pages by id, plus in-content anchors.
///
/// Only primary pages are targets; duplicates are never linkable. When the
/// same content id appears in several pages, the page with the lowest id
/// owns it.
#[derive(Debug, Default)]
pub struct LinkTargets {
    pages: BTreeMap<PageId, Target>,
    anchors: BTreeMap<PageId, Target>,
}

impl LinkTargets {
    pub fn from_site(site: &Site) -> Self {
        let mut targets = Self::default();
        for key in site.primary_keys() {
            let page = site.page(key);
            let filename = site.dynamic_filename(key);
            targets.pages.insert(
                page.id(),
                Target {
                    href: filename.to_string(),
                    text: page.title().to_string(),
                },
            );
            for (content_id, text) in page.content_ids() {
                targets.anchors.entry(*content_id).or_insert_with(|| Target {
                    href: format!("{filename}#{content_id}"),
                    text: text.clone(),
                });
            }
        }
        targets
    }

    fn resolve(&self, id: &PageId) -> Option<&Target> {
        self.pages.get(id).or_else(|| self.anchors.get(id))
    }
}

/// Rewrites every `page:` anchor of one page. Returns the ids that matched
/// neither a page nor a content anchor; their anchors now read `[NOT FOUND]`.
pub fn replace_page_references(page: &mut Page, targets: &LinkTargets) -> Vec<PageId> {
    let refs: Vec<(PageId, Vec<NodeId>)> = page
        .page_refs()
        .iter()
        .map(|(id, anchors)| (*id, anchors.clone()))
        .collect();
    let doc = page.doc_mut();
    let mut unresolved = Vec::new();

    for (id, anchors) in refs {
        match targets.resolve(&id) {
            Some(target) => {
                for anchor in anchors {
                    doc.set_attr(anchor, "href", &target.href);
                    replace_text(doc, anchor, &target.text);
                }
            }
            None => {
                for anchor in anchors {
                    doc.set_attr(anchor, "href", &format!("./{id}.html"));
                    doc.set_text(anchor, NOT_FOUND_TEXT);
                }
                unresolved.push(id);
            }
        }
    }
    unresolved
}

/// Applies the caption rules: empty text and `:title` take the target text,
/// `:title-lower` its lowercase form, anything else is the author's caption.
fn replace_text(doc: &mut Document, anchor: NodeId, target_text: &str) {
    let current = doc.text(anchor);
    match current.trim() {
        "" | ":title" => doc.set_text(anchor, target_text),
        ":title-lower" => doc.set_text(anchor, &target_text.to_lowercase()),
        _ => {}
    }
}

impl Site {
    /// Rewrites the `page:` links of every page, primaries and duplicates
    /// alike, against the primary pages.
    pub fn resolve_links(&mut self) {
        let targets = LinkTargets::from_site(self);
        for key in self.keys() {
            let unresolved = replace_page_references(self.page_mut(key), &targets);
            for id in unresolved {
                let page = self.page(key);
                log::warn!("unresolved link to {id} in {page}");
                let diagnostic = Diagnostic::broken_link(page.relative_path(), id);
                self.push_diagnostic(diagnostic);
            }
        }
    }
}
