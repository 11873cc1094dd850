//! Integration tests using fixture files.
//!
//! `fixtures/site` is a small but complete source tree; `fixtures/invalid`
//! holds documents that must be rejected one by one.

mod common;

use common::{fixture_site, fixtures_dir};
use pretty_assertions::assert_eq;
use scms::domain::PageId;
use scms::export::RenderOptions;
use scms::infra::DEFAULT_MAX_DEPTH;
use scms::site::{PageError, SourceError, load_page, load_site};
use std::path::Path;
use tempfile::TempDir;

const HOME: &str = "a1b2c3d4-0000-4000-8000-000000000001";
const ABOUT: &str = "a1b2c3d4-0000-4000-8000-000000000002";
const BLOG: &str = "a1b2c3d4-0000-4000-8000-000000000003";
const HELLO: &str = "a1b2c3d4-0000-4000-8000-000000000004";

fn build_fixture_site(target: &Path) -> scms::export::BuildReport {
    let options = RenderOptions {
        copyright: Some("Site Author".to_string()),
        ..RenderOptions::default()
    };
    scms::cli::handlers::build_site(&fixture_site(), target, DEFAULT_MAX_DEPTH, &options)
        .expect("fixture site should build")
}

fn read(target: &Path, name: &str) -> String {
    std::fs::read_to_string(target.join(name))
        .unwrap_or_else(|e| panic!("Failed to read {name}: {e}"))
}

// ===========================================
// Infrastructure
// ===========================================

#[test]
fn fixtures_directories_exist() {
    assert!(fixture_site().is_dir());
    assert!(fixtures_dir().join("invalid").is_dir());
}

// ===========================================
// Loading the fixture site
// ===========================================

#[test]
fn fixture_site_loads_cleanly() {
    let site = load_site(&fixture_site(), DEFAULT_MAX_DEPTH, None).unwrap();
    assert_eq!(site.len(), 5);
    assert_eq!(site.primary_count(), 5);
    assert!(site.diagnostics().is_empty(), "{:?}", site.diagnostics());
    assert_eq!(site.assets().len(), 2);
}

#[test]
fn fixture_site_hierarchy() {
    let site = load_site(&fixture_site(), DEFAULT_MAX_DEPTH, None).unwrap();
    let key = |id: &str| site.key_of(id.parse::<PageId>().unwrap()).unwrap();

    let home = key(HOME);
    assert!(site.is_index(home));
    assert_eq!(site.root_siblings(), &[home]);

    let titles: Vec<&str> = site
        .children(home)
        .iter()
        .map(|k| site.page(*k).title())
        .collect();
    assert_eq!(titles, vec!["About", "Blog"]);

    let hello = key(HELLO);
    assert_eq!(site.ancestors(hello), vec![key(BLOG), home]);
    assert_eq!(site.dynamic_filename(hello), "./hello_-_blog_-_home.html");
    assert!(site.page(hello).uses_math());
    assert_eq!(site.page(hello).summary_title(), "Greetings");
}

// ===========================================
// Building the fixture site
// ===========================================

#[test]
fn fixture_site_builds_every_output() {
    let dir = TempDir::new().unwrap();
    let report = build_fixture_site(dir.path());

    assert_eq!(report.pages_written, 5);
    assert_eq!(report.permalinks_written, 5);
    assert_eq!(report.assets_copied, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.index.as_deref(), Some("home.html"));
    assert!(report.diagnostics.is_ok());

    for name in [
        "home.html",
        "index.html",
        "about_-_home.html",
        "blog_-_home.html",
        "hello_-_blog_-_home.html",
        "again_-_blog_-_home.html",
        "style/simple-static-cms.css",
        "images/logo.svg",
    ] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }
    assert_eq!(
        read(dir.path(), &format!("{ABOUT}.html")),
        read(dir.path(), "about_-_home.html")
    );
}

#[test]
fn fixture_home_links_and_latest_articles() {
    let dir = TempDir::new().unwrap();
    build_fixture_site(dir.path());
    let home = read(dir.path(), "home.html");

    assert!(home.contains(r#"<a href="./about_-_home.html">About</a>"#));
    assert!(home.contains(
        r#"<a href="./hello_-_blog_-_home.html#a1b2c3d4-0000-4000-8000-000000000099">setup</a>"#
    ));

    assert!(home.contains(r#"<div class="latest-articles">"#));
    assert_eq!(home.matches(r#"class="latest-articles-item "#).count(), 3);
    assert_eq!(home.matches("latest-articles-item-first").count(), 1);
    assert!(home.contains(
        r#"<a class="latest-article-link" href="./hello_-_blog_-_home.html">Greetings</a>"#
    ));
    assert!(home.contains(r#"<a href="./hello_-_blog_-_home.html#setup">introduction</a>"#));
    assert!(home.contains(r#"<a href="./blog_-_home.html" class="latest-article-category">Blog</a>"#));
    assert!(home.contains("Site&nbsp;Author."));
}

#[test]
fn fixture_about_reference_table() {
    let dir = TempDir::new().unwrap();
    build_fixture_site(dir.path());
    let about = read(dir.path(), "about_-_home.html");

    assert_eq!(
        about
            .matches(r##"<a href="#scms_reference_1" class="reference-ptr">1</a>"##)
            .count(),
        2
    );
    assert!(about.contains(
        r#"<a href="https://example.org/book" class="reference reference-item-content-link">The Book</a>"#
    ));
    assert!(about.contains(r#"<aside id="colophon" class="reference reference-item-content-link">"#));
    assert!(about.contains(r#"id="scms_reference_3""#));
    assert!(!about.contains(r#"id="scms_reference_4""#));
    assert!(about.contains("<title>About&nbsp;— Home</title>"));
}

#[test]
fn fixture_math_page_loads_mathjax() {
    let dir = TempDir::new().unwrap();
    build_fixture_site(dir.path());

    assert!(read(dir.path(), "hello_-_blog_-_home.html").contains("MathJax.js"));
    assert!(!read(dir.path(), "again_-_blog_-_home.html").contains("MathJax.js"));
    assert!(
        read(dir.path(), "again_-_blog_-_home.html")
            .contains(r#"<a href="./hello_-_blog_-_home.html">the first post</a>"#)
    );
}

// ===========================================
// Invalid documents
// ===========================================

fn load_invalid(name: &str) -> PageError {
    let dir = fixtures_dir().join("invalid");
    match load_page(&dir.join(name), &dir) {
        Err(SourceError::Page(err)) => err,
        Err(other) => panic!("{name}: unexpected error {other}"),
        Ok(page) => panic!("{name}: unexpectedly loaded {page}"),
    }
}

#[test]
fn invalid_fixtures_are_rejected() {
    assert!(matches!(
        load_invalid("missing-uuid.html"),
        PageError::MissingMarker("page identifier")
    ));
    assert!(matches!(
        load_invalid("missing-parent.html"),
        PageError::MissingMarker("parent identifier")
    ));
    assert!(matches!(load_invalid("empty-title.html"), PageError::EmptyTitle));
    assert!(matches!(load_invalid("self-parent.html"), PageError::SelfParent));
    assert!(matches!(
        load_invalid("bad-page-link.html"),
        PageError::InvalidPageLink { .. }
    ));
    assert!(matches!(
        load_invalid("malformed-id.html"),
        PageError::InvalidId { .. }
    ));
}

#[test]
fn invalid_fixture_tree_reports_every_document() {
    let site = load_site(&fixtures_dir().join("invalid"), DEFAULT_MAX_DEPTH, None).unwrap();
    assert!(site.is_empty());
    assert_eq!(site.diagnostics().len(), 6);
}
