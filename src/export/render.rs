//! Turns a resolved page into a complete output document.

use chrono::{DateTime, Datelike, Utc};

use crate::dom::{Document, NodeId, Predicate};
use crate::site::{PageKey, Site};

/// Stylesheet used when none is configured.
pub const DEFAULT_STYLESHEET: &str = "./style/simple-static-cms.css";

const VIEWPORT: &str = "width=device-width, initial-scale=1.0, maximum-scale=2, minimum-scale=0.5";
const MATHJAX_SRC: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.1/MathJax.js?config=TeX-AMS-MML_HTMLorMML";
const MATHJAX_CONFIG: &str = r#"MathJax.Hub.Config({displayAlign: "left", displayIndent: "2ex" });"#;
const PERMALINK_MARK: &str = "\u{2299}";
const NBSP: char = '\u{a0}';
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%MGMT";
const MAX_LATEST_ARTICLES: usize = 10;

/// Settings shared by every rendered page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Stylesheet URL; a `stamp` query parameter is added per run.
    pub stylesheet: String,
    /// Optional script URL, stamped like the stylesheet.
    pub script: Option<String>,
    /// Copyright holder for the footer line.
    pub copyright: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stylesheet: DEFAULT_STYLESHEET.to_string(),
            script: None,
            copyright: None,
        }
    }
}

/// Per-run rendering state: options, the cache-busting stamp and the
/// recency order used by latest-articles blocks.
#[derive(Debug)]
pub struct RenderContext<'a> {
    options: &'a RenderOptions,
    stamp: i64,
    recency: Vec<PageKey>,
}

impl<'a> RenderContext<'a> {
    pub fn new(site: &Site, options: &'a RenderOptions, now: DateTime<Utc>) -> Self {
        Self {
            options,
            stamp: now.timestamp_millis(),
            recency: recency_order(site),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        self.options
    }

    fn stamped(&self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}stamp={}", self.stamp)
    }
}

/// Primary pages ordered most recent first.
///
/// Each page scores `2·ln(max(1, newest_created − created)) +
/// ln(max(1, newest_modified − modified))` over millisecond timestamps;
/// lower scores come first and ties go to the lower id.
pub fn recency_order(site: &Site) -> Vec<PageKey> {
    let keys: Vec<PageKey> = site.primary_keys().collect();
    let millis = |key: PageKey| {
        let page = site.page(key);
        (
            page.created().timestamp_millis(),
            page.modified().timestamp_millis(),
        )
    };
    let newest_created = keys.iter().map(|k| millis(*k).0).max().unwrap_or(0);
    let newest_modified = keys.iter().map(|k| millis(*k).1).max().unwrap_or(0);

    let mut scored: Vec<(f64, PageKey)> = keys
        .into_iter()
        .map(|key| {
            let (created, modified) = millis(key);
            let created_age = ((newest_created - created).max(1) as f64).ln();
            let modified_age = ((newest_modified - modified).max(1) as f64).ln();
            (2.0 * created_age + modified_age, key)
        })
        .collect();
    scored.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| site.page(a.1).id().cmp(&site.page(b.1).id()))
    });
    scored.into_iter().map(|(_, key)| key).collect()
}

/// Title followed by the ancestor trail, e.g. `Team — Home / About`.
///
/// With `show_topmost` false the root ancestor is left out whenever there is
/// more than one ancestor.
pub fn title_trail(site: &Site, key: PageKey, show_topmost: bool) -> String {
    let mut trail = site.page(key).title().to_string();
    if site.parent(key).is_some() {
        trail.push(NBSP);
        trail.push_str("\u{2014} ");
        trail.push_str(&parent_trail(site, key, show_topmost));
    }
    trail
}

/// Ancestor titles from the furthest to the nearest.
pub fn parent_trail(site: &Site, key: PageKey, show_topmost: bool) -> String {
    let mut chain = site.ancestors(key);
    if !show_topmost && chain.len() > 1 {
        chain.pop();
    }
    let titles: Vec<&str> = chain.iter().rev().map(|a| site.page(*a).title()).collect();
    titles.join("\u{a0}/ ")
}

/// Renders one page into a new document.
///
/// The page's own document is left as it is, so a page can be rendered more
/// than once.
pub fn render_page(site: &Site, key: PageKey, ctx: &RenderContext) -> Document {
    let page = site.page(key);
    let mut doc = page.doc().clone();
    let root = doc.root();
    for child in doc.children(root).to_vec() {
        doc.detach(child);
    }

    let html = doc.append_element(root, "html", &[]);
    let head = doc.append_element(html, "head", &[]);
    write_head(&mut doc, head, site, key, ctx);

    let body = doc.append_element(html, "body", &[]);
    let header = doc.append_element(body, "header", &[]);
    let nav = doc.append_element(header, "nav", &[]);
    write_navigation(&mut doc, nav, site, key);
    let title = doc.append_element(header, "div", &[("id", "article-title")]);
    doc.append_text(title, &title_trail(site, key, true));

    doc.append(body, page.article());
    if let Some(section) = page.latest_articles() {
        write_latest_articles(&mut doc, section, site, key, ctx);
    }

    let footer = page.footer();
    write_file_data(&mut doc, footer, site, key, ctx.options.copyright.as_deref());
    doc.append(body, footer);
    doc
}

fn write_head(doc: &mut Document, head: NodeId, site: &Site, key: PageKey, ctx: &RenderContext) {
    doc.append_element(head, "meta", &[("charset", "UTF-8")]);
    doc.append_element(head, "meta", &[("name", "viewport"), ("content", VIEWPORT)]);
    let stylesheet = ctx.stamped(&ctx.options.stylesheet);
    doc.append_element(
        head,
        "link",
        &[
            ("rel", "stylesheet"),
            ("href", stylesheet.as_str()),
            ("type", "text/css"),
        ],
    );
    if site.page(key).uses_math() {
        let script = doc.append_element(
            head,
            "script",
            &[("type", "text/javascript"), ("src", MATHJAX_SRC)],
        );
        doc.append_text(script, MATHJAX_CONFIG);
    }
    if let Some(src) = &ctx.options.script {
        let src = ctx.stamped(src);
        doc.append_element(
            head,
            "script",
            &[("type", "text/javascript"), ("src", src.as_str())],
        );
    }
    let title = doc.append_element(head, "title", &[]);
    doc.append_text(title, &title_trail(site, key, true));
}

// ===========================================
// Navigation
// ===========================================

fn write_navigation(doc: &mut Document, nav: NodeId, site: &Site, key: PageKey) {
    let mut parents = site.ancestors(key);
    parents.reverse();
    let children = site.children(key);
    let siblings: Vec<PageKey> = site
        .siblings(key)
        .iter()
        .copied()
        .filter(|s| *s != key)
        .collect();

    if !parents.is_empty() {
        write_links(doc, nav, site, &parents, "parents", None);
    }
    write_permalink(doc, nav, site, key);
    write_links(doc, nav, site, &[key], "current", Some(key));
    if !children.is_empty() {
        write_links(doc, nav, site, children, "children", None);
    }
    write_links(doc, nav, site, &siblings, "siblings", None);
}

fn write_permalink(doc: &mut Document, nav: NodeId, site: &Site, key: PageKey) {
    let page = site.page(key);
    let marker = if site.is_duplicate(key) {
        doc.append_element(
            nav,
            "span",
            &[("class", "permalink-disabled"), ("title", "Permanent link")],
        )
    } else {
        let href = format!("{}.html", page.id());
        doc.append_element(
            nav,
            "a",
            &[
                ("href", href.as_str()),
                ("class", "permalink-enabled"),
                ("title", "Permanent link"),
            ],
        )
    };
    doc.append_text(marker, PERMALINK_MARK);
}

/// Writes a link list: a leading separator, then each link followed by its
/// own separator.
fn write_links(
    doc: &mut Document,
    nav: NodeId,
    site: &Site,
    pages: &[PageKey],
    base: &str,
    current: Option<PageKey>,
) {
    let last_index = pages.len().saturating_sub(1);
    for (i, &key) in pages.iter().enumerate() {
        let first = i == 0;
        let last = i == last_index;
        if first {
            let class = link_classes(base, "separator", true, false, false);
            doc.append_element(nav, "span", &[("class", class.as_str())]);
        }
        let class = link_classes(base, "element", first, last, current == Some(key));
        let link = doc.append_element(
            nav,
            "a",
            &[
                ("href", site.dynamic_filename(key)),
                ("class", class.as_str()),
            ],
        );
        doc.append_text(link, site.page(key).title());
        let class = link_classes(base, "separator", false, last, false);
        doc.append_element(nav, "span", &[("class", class.as_str())]);
    }
}

fn link_classes(base: &str, sub: &str, first: bool, last: bool, current: bool) -> String {
    let mut classes = format!("{base} {sub} {base}-{sub}");
    let mut position = |pos: &str| {
        classes.push_str(&format!(" {base}-{pos} {sub}-{pos} {base}-{sub}-{pos}"));
    };
    if first {
        position("first");
    }
    if last {
        position("last");
    }
    if !first && !last {
        position("inner");
    }
    if current {
        position("self");
    }
    classes
}

// ===========================================
// Latest articles
// ===========================================

fn write_latest_articles(
    doc: &mut Document,
    section: NodeId,
    site: &Site,
    key: PageKey,
    ctx: &RenderContext,
) {
    let articles: Vec<PageKey> = ctx
        .recency
        .iter()
        .copied()
        .filter(|k| site.is_descendant_of(*k, key) && site.page(*k).summary().is_some())
        .take(MAX_LATEST_ARTICLES)
        .collect();
    if articles.is_empty() {
        return;
    }

    doc.rename(section, "div");
    doc.set_attr(section, "class", "latest-articles");
    for article in articles {
        write_article_item(doc, section, site, article);
    }
}

fn write_article_item(doc: &mut Document, list: NodeId, site: &Site, key: PageKey) {
    let page = site.page(key);
    let Some(summary) = page.summary() else {
        return;
    };

    let item = doc.append_element(list, "div", &[]);
    let element_count = doc
        .children(list)
        .iter()
        .filter(|c| doc.element(**c).is_some())
        .count();
    let class = if element_count == 1 {
        "latest-articles-item latest-articles-item-first"
    } else {
        "latest-articles-item latest-articles-item-subsequent"
    };
    doc.set_attr(item, "class", class);

    let category = doc.append_element(item, "div", &[("class", "latest-article-category")]);
    if let Some(parent) = site.parent(key) {
        let link = doc.append_element(
            category,
            "a",
            &[
                ("href", site.dynamic_filename(parent)),
                ("class", "latest-article-category"),
            ],
        );
        doc.append_text(link, &parent_trail(site, key, false));
    }

    let date = doc.append_element(item, "div", &[("class", "latest-article-date")]);
    let age = doc.append_element(date, "span", &[("class", "milliseconds-age")]);
    doc.append_text(age, &page.modified().timestamp_millis().to_string());

    let title = doc.append_element(item, "div", &[("class", "latest-article-title")]);
    let filename = site.dynamic_filename(key);
    let link = doc.append_element(
        title,
        "a",
        &[("class", "latest-article-link"), ("href", filename)],
    );
    doc.append_text(link, page.summary_title());

    let target = doc.append_element(item, "div", &[("class", "latest-article-summary")]);
    let anchor = Predicate::tag("a");
    for &child in page.doc().children(summary) {
        let copy = doc.import(page.doc(), child);
        let mut anchors = doc.find_all(copy, &anchor);
        if anchor.matches(doc, copy) {
            anchors.insert(0, copy);
        }
        for a in anchors {
            if let Some(fragment) = doc.attr(a, "href").filter(|h| h.starts_with('#')) {
                let href = format!("{filename}{fragment}");
                doc.set_attr(a, "href", &href);
            }
        }
        doc.append(target, copy);
    }
}

// ===========================================
// Footer
// ===========================================

fn write_file_data(
    doc: &mut Document,
    footer: NodeId,
    site: &Site,
    key: PageKey,
    copyright: Option<&str>,
) {
    let page = site.page(key);
    let file_data = doc.append_element(footer, "div", &[("class", "file-data")]);
    let modification = doc.append_element(file_data, "div", &[("class", "source-modification")]);
    let date = doc.append_element(modification, "span", &[("class", "milliseconds-date")]);
    doc.append_text(date, &page.modified().format(DATE_FORMAT).to_string());

    if let Some(holder) = copyright {
        let line = copyright_line(page.created(), page.modified(), holder);
        let span = doc.append_element(file_data, "span", &[("class", "source-copyright")]);
        doc.append_text(span, &line);
    }
}

/// `© 2019–2024 Holder.` with non-breaking spaces throughout.
pub fn copyright_line(created: DateTime<Utc>, modified: DateTime<Utc>, holder: &str) -> String {
    let years = if created.year() >= modified.year() {
        format!("{:04}", modified.year())
    } else {
        format!("{:04}\u{2013}{:04}", created.year(), modified.year())
    };
    let holder: String = holder
        .chars()
        .map(|c| if c.is_ascii_whitespace() { NBSP } else { c })
        .collect();
    format!("\u{a9}{NBSP}{years}{NBSP}{holder}.")
}
