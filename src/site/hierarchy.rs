//! The assembled page graph.
//!
//! Pages live in one arena and refer to each other by [`PageKey`]. Parent,
//! children and siblings are lookups into the arena; nothing holds a page
//! reference across calls.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::domain::{Diagnostic, DiagnosticKind, PageId};
use crate::infra;

use super::page::Page;
use super::repository::Repository;

/// Position of a page in the [`Site`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey(usize);

/// All pages of a run, linked into a tree.
///
/// Primary pages come first in id order, followed by duplicates in id
/// order. Only primary pages can be parents or link targets; a duplicate
/// still knows its parent for navigation and naming.
#[derive(Debug)]
pub struct Site {
    pages: Vec<Page>,
    primary_count: usize,
    by_id: BTreeMap<PageId, PageKey>,
    parent: Vec<Option<PageKey>>,
    children: Vec<Vec<PageKey>>,
    root_siblings: Vec<PageKey>,
    filenames: Vec<OnceCell<String>>,
    collisions: BTreeSet<PageKey>,
    assets: Vec<PathBuf>,
    source_root: PathBuf,
    diagnostics: Vec<Diagnostic>,
}

impl Site {
    /// Links the repository's pages by parent id.
    ///
    /// A parent id naming no primary page, or one that would close a cycle,
    /// is cleared and the page becomes a root. Root pages of both
    /// collections form one sibling list. Within each sibling scope only the
    /// first page in name order keeps an index claim.
    pub fn assemble(repo: Repository) -> Self {
        let parts = repo.into_parts();
        let primary_count = parts.primary.len();
        let pages: Vec<Page> = parts
            .primary
            .into_values()
            .chain(parts.duplicates.into_values())
            .collect();
        let by_id = pages[..primary_count]
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id(), PageKey(i)))
            .collect();

        let len = pages.len();
        let mut site = Self {
            pages,
            primary_count,
            by_id,
            parent: vec![None; len],
            children: vec![Vec::new(); len],
            root_siblings: Vec::new(),
            filenames: (0..len).map(|_| OnceCell::new()).collect(),
            collisions: BTreeSet::new(),
            assets: parts.assets,
            source_root: parts.root,
            diagnostics: parts.diagnostics,
        };

        for key in site.keys() {
            site.attach(key);
        }
        for list in &mut site.children {
            list.sort_by(|a, b| site.pages[a.0].compare_by_name(&site.pages[b.0]));
        }
        let mut roots: Vec<PageKey> = site.keys().filter(|k| site.parent[k.0].is_none()).collect();
        roots.sort_by(|a, b| site.pages[a.0].compare_by_name(&site.pages[b.0]));
        site.root_siblings = roots;
        site.settle_index_claims();
        site.detect_filename_collisions();
        site
    }

    /// Walks primaries then duplicates in key order; a page whose dynamic
    /// filename was already claimed by an earlier page loses it.
    fn detect_filename_collisions(&mut self) {
        let mut claimed = BTreeSet::new();
        for key in self.keys() {
            let name = self.dynamic_filename(key).trim_start_matches("./").to_string();
            if claimed.contains(&name) {
                let page = &self.pages[key.0];
                log::error!("{page}: output filename {name} is already taken");
                let diagnostic = Diagnostic::new(
                    page.relative_path(),
                    DiagnosticKind::FilenameCollision { filename: name },
                );
                self.diagnostics.push(diagnostic);
                self.collisions.insert(key);
            } else {
                claimed.insert(name);
            }
        }
    }

    fn attach(&mut self, key: PageKey) {
        let Some(parent_id) = self.pages[key.0].parent_id() else {
            return;
        };
        let Some(&parent) = self.by_id.get(&parent_id) else {
            log::warn!(
                "{}: unknown parent {parent_id}, placing at root",
                self.pages[key.0]
            );
            self.detach_parent(key, DiagnosticKind::DanglingParent { parent: parent_id });
            return;
        };
        if parent == key || self.ancestors(parent).contains(&key) {
            log::warn!(
                "{}: parent {parent_id} would form a cycle, placing at root",
                self.pages[key.0]
            );
            self.detach_parent(key, DiagnosticKind::ParentCycle { parent: parent_id });
            return;
        }

        log::debug!(
            "{} is child of {}",
            self.pages[key.0].title(),
            self.pages[parent.0].title()
        );
        self.parent[key.0] = Some(parent);
        if !self.is_duplicate(key) {
            self.children[parent.0].push(key);
        }
    }

    fn detach_parent(&mut self, key: PageKey, kind: DiagnosticKind) {
        let page = &mut self.pages[key.0];
        page.clear_parent();
        let path = page.relative_path().to_path_buf();
        self.diagnostics.push(Diagnostic::new(path, kind));
    }

    fn settle_index_claims(&mut self) {
        let mut scopes = vec![self.root_siblings.clone()];
        scopes.extend(self.children.iter().filter(|c| !c.is_empty()).cloned());
        for scope in scopes {
            let mut claimed = false;
            for key in scope {
                if !self.pages[key.0].index_claim() {
                    continue;
                }
                if !claimed {
                    claimed = true;
                    continue;
                }
                let page = &mut self.pages[key.0];
                log::warn!("{page}: index already claimed in this scope");
                page.clear_index();
                let path = page.relative_path().to_path_buf();
                self.diagnostics
                    .push(Diagnostic::new(path, DiagnosticKind::IndexClaimCleared));
            }
        }
    }

    pub fn page(&self, key: PageKey) -> &Page {
        &self.pages[key.0]
    }

    pub(crate) fn page_mut(&mut self, key: PageKey) -> &mut Page {
        &mut self.pages[key.0]
    }

    /// Every page: primaries in id order, then duplicates in id order.
    pub fn keys(&self) -> impl Iterator<Item = PageKey> + use<> {
        (0..self.pages.len()).map(PageKey)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = PageKey> + use<> {
        (0..self.primary_count).map(PageKey)
    }

    pub fn duplicate_keys(&self) -> impl Iterator<Item = PageKey> + use<> {
        (self.primary_count..self.pages.len()).map(PageKey)
    }

    /// The primary page with this id.
    pub fn key_of(&self, id: PageId) -> Option<PageKey> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn primary_count(&self) -> usize {
        self.primary_count
    }

    pub fn is_duplicate(&self, key: PageKey) -> bool {
        key.0 >= self.primary_count
    }

    pub fn parent(&self, key: PageKey) -> Option<PageKey> {
        self.parent[key.0]
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, key: PageKey) -> Vec<PageKey> {
        let mut chain = Vec::new();
        let mut current = self.parent[key.0];
        while let Some(p) = current {
            chain.push(p);
            current = self.parent[p.0];
        }
        chain
    }

    /// Children in name order. Duplicates are never children.
    pub fn children(&self, key: PageKey) -> &[PageKey] {
        &self.children[key.0]
    }

    /// Pages sharing this page's parent, itself included. Root pages share
    /// one list spanning primaries and duplicates.
    pub fn siblings(&self, key: PageKey) -> &[PageKey] {
        match self.parent[key.0] {
            Some(parent) => &self.children[parent.0],
            None => &self.root_siblings,
        }
    }

    /// Root pages of both collections, in name order.
    pub fn root_siblings(&self) -> &[PageKey] {
        &self.root_siblings
    }

    /// Whether `key` is a root page that kept its index claim.
    pub fn is_index(&self, key: PageKey) -> bool {
        self.parent[key.0].is_none() && self.pages[key.0].index_claim()
    }

    /// Whether `ancestor` appears on `key`'s parent chain.
    pub fn is_descendant_of(&self, key: PageKey, ancestor: PageKey) -> bool {
        self.ancestors(key).contains(&ancestor)
    }

    /// The page's output filename, computed once from its title and the
    /// titles of its ancestors.
    pub fn dynamic_filename(&self, key: PageKey) -> &str {
        self.filenames[key.0].get_or_init(|| {
            let ancestors: Vec<&str> = self
                .ancestors(key)
                .into_iter()
                .map(|a| self.pages[a.0].title())
                .collect();
            infra::dynamic_filename(self.pages[key.0].title(), &ancestors)
        })
    }

    /// Whether an earlier page already claimed this page's dynamic filename.
    pub fn filename_collides(&self, key: PageKey) -> bool {
        self.collisions.contains(&key)
    }

    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Diagnostics from ingestion, assembly and link resolution.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::site::page::tests::{CHILD_ID, ROOT_ID, page_from, source};
    use pretty_assertions::assert_eq;

    pub(crate) const THIRD_ID: &str = "33333333-3333-3333-3333-333333333333";
    pub(crate) const FOURTH_ID: &str = "44444444-4444-4444-4444-444444444444";

    /// Assembles a site from `(id, parent, title, body)` tuples, admitted in
    /// order.
    pub(crate) fn site_of(pages: &[(&str, &str, &str, &str)]) -> Site {
        let mut repo = Repository::new("/site");
        for (id, parent, title, body) in pages {
            repo.admit(page_from(&source(id, parent, title, body)).unwrap());
        }
        Site::assemble(repo)
    }

    fn key(site: &Site, id: &str) -> PageKey {
        site.key_of(id.parse().unwrap()).unwrap()
    }

    fn titles(site: &Site, keys: &[PageKey]) -> Vec<String> {
        keys.iter().map(|k| site.page(*k).title().to_string()).collect()
    }

    // ===========================================
    // Assembly
    // ===========================================

    #[test]
    fn home_and_about_are_linked() {
        let site = site_of(&[
            (ROOT_ID, "root", "Home", ""),
            (CHILD_ID, ROOT_ID, "About", ""),
        ]);
        let home = key(&site, ROOT_ID);
        let about = key(&site, CHILD_ID);

        assert_eq!(site.parent(about), Some(home));
        assert_eq!(site.children(home), &[about]);
        assert_eq!(site.ancestors(about), vec![home]);
        assert_eq!(site.dynamic_filename(about), "./about_-_home.html");
        assert_eq!(site.dynamic_filename(home), "./home.html");
    }

    #[test]
    fn children_are_ordered_by_name() {
        let site = site_of(&[
            (ROOT_ID, "root", "Home", ""),
            (CHILD_ID, ROOT_ID, "zeta", ""),
            (THIRD_ID, ROOT_ID, "Alpha", ""),
            (FOURTH_ID, ROOT_ID, "beta", ""),
        ]);
        let home = key(&site, ROOT_ID);
        assert_eq!(
            titles(&site, site.children(home)),
            vec!["Alpha", "beta", "zeta"]
        );
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let site = site_of(&[(CHILD_ID, FOURTH_ID, "Orphan", "")]);
        let orphan = key(&site, CHILD_ID);
        assert_eq!(site.parent(orphan), None);
        assert_eq!(site.page(orphan).parent_id(), None);
        assert_eq!(site.root_siblings(), &[orphan]);
        assert!(matches!(
            site.diagnostics()[0].kind,
            DiagnosticKind::DanglingParent { .. }
        ));
    }

    #[test]
    fn parent_cycle_is_broken() {
        let site = site_of(&[
            (ROOT_ID, CHILD_ID, "A", ""),
            (CHILD_ID, ROOT_ID, "B", ""),
        ]);
        let a = key(&site, ROOT_ID);
        let b = key(&site, CHILD_ID);
        // A attaches first; B would close the loop
        assert_eq!(site.parent(a), Some(b));
        assert_eq!(site.parent(b), None);
        assert!(matches!(
            site.diagnostics()[0].kind,
            DiagnosticKind::ParentCycle { .. }
        ));
    }

    #[test]
    fn root_siblings_span_duplicates_and_are_shared() {
        let site = site_of(&[
            (ROOT_ID, "root", "Home", ""),
            (CHILD_ID, "root", "Blog", ""),
            (CHILD_ID, "root", "Other Blog", ""),
            (THIRD_ID, ROOT_ID, "Nested", ""),
        ]);
        assert_eq!(site.len(), 4);
        assert_eq!(
            titles(&site, site.root_siblings()),
            vec!["Blog", "Home", "Other\u{a0}Blog"]
        );
        for root in site.root_siblings() {
            assert!(std::ptr::eq(site.siblings(*root), site.root_siblings()));
        }
        let nested = key(&site, THIRD_ID);
        assert_eq!(titles(&site, site.siblings(nested)), vec!["Nested"]);
    }

    #[test]
    fn duplicates_keep_parent_but_are_not_children() {
        let site = site_of(&[
            (ROOT_ID, "root", "Home", ""),
            (CHILD_ID, ROOT_ID, "First", ""),
            (CHILD_ID, ROOT_ID, "Second", ""),
        ]);
        let home = key(&site, ROOT_ID);
        let duplicate = site.duplicate_keys().next().unwrap();
        assert!(site.is_duplicate(duplicate));
        assert_eq!(site.parent(duplicate), Some(home));
        assert_eq!(titles(&site, site.children(home)), vec!["First"]);
        assert_eq!(site.dynamic_filename(duplicate), "./second_-_home.html");
    }

    #[test]
    fn index_is_root_page_with_claim() {
        let mut repo = Repository::new("/site");
        let claim = |id: &str, parent: &str, title: &str| {
            let html = source(id, parent, title, "").replace(
                "<title>",
                r#"<meta name="scms-is-index" value="true"><title>"#,
            );
            page_from(&html).unwrap()
        };
        repo.admit(claim(ROOT_ID, "root", "Zed"));
        repo.admit(claim(CHILD_ID, "root", "Alpha"));
        repo.admit(claim(THIRD_ID, ROOT_ID, "Child"));
        let site = Site::assemble(repo);

        assert!(site.is_index(key(&site, CHILD_ID)));
        assert!(!site.is_index(key(&site, ROOT_ID)));
        // keeps its claim within its own scope but is not a root
        assert!(site.page(key(&site, THIRD_ID)).index_claim());
        assert!(!site.is_index(key(&site, THIRD_ID)));
    }

    #[test]
    fn dynamic_filename_is_memoized() {
        let site = site_of(&[(ROOT_ID, "root", "Home", "")]);
        let home = key(&site, ROOT_ID);
        let first = site.dynamic_filename(home);
        let second = site.dynamic_filename(home);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn later_page_with_same_filename_collides() {
        // both titles transliterate to "same.html"
        let site = site_of(&[
            (ROOT_ID, "root", "Same", ""),
            (CHILD_ID, "root", "same", ""),
        ]);
        assert!(!site.filename_collides(key(&site, ROOT_ID)));
        assert!(site.filename_collides(key(&site, CHILD_ID)));
        assert_eq!(site.diagnostics().len(), 1);
        assert!(matches!(
            &site.diagnostics()[0].kind,
            DiagnosticKind::FilenameCollision { filename } if filename == "same.html"
        ));
    }

    #[test]
    fn duplicate_loses_filename_to_primary() {
        let site = site_of(&[
            (ROOT_ID, "root", "Notes", ""),
            (THIRD_ID, "root", "Other", ""),
            (THIRD_ID, "root", "notes", ""),
        ]);
        let duplicate = site.duplicate_keys().next().unwrap();
        assert!(site.primary_keys().all(|k| !site.filename_collides(k)));
        assert!(site.filename_collides(duplicate));
    }

    #[test]
    fn descendants_are_detected_transitively() {
        let site = site_of(&[
            (ROOT_ID, "root", "Home", ""),
            (CHILD_ID, ROOT_ID, "About", ""),
            (THIRD_ID, CHILD_ID, "Team", ""),
        ]);
        let home = key(&site, ROOT_ID);
        let team = key(&site, THIRD_ID);
        assert!(site.is_descendant_of(team, home));
        assert!(!site.is_descendant_of(home, team));
        assert_eq!(
            site.dynamic_filename(team),
            "./team_-_about_-_home.html"
        );
    }
}
