//! Isolated test environment with temp source and target directories.

// Allow dead code since not every test binary uses every helper
#![allow(dead_code)]

use super::{ScmsCommand, TestPage};
use scms::export::{BuildReport, RenderOptions};
use scms::infra::DEFAULT_MAX_DEPTH;
use scms::site::{Site, load_site};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment.
///
/// Layout inside one temp directory, cleaned up on drop:
/// `src/` (source root), `out/` (target, not created up front) and
/// `config/` (config home, so the user's own config file is never read).
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment with an empty source root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("src")).expect("Failed to create source dir");
        std::fs::create_dir_all(root.join("config")).expect("Failed to create config dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    pub fn config_home(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Writes `page` to `rel` under the source root and returns its path.
    pub fn add_page(&self, rel: &str, page: &TestPage) -> PathBuf {
        self.write_file(rel, &page.to_html())
    }

    /// Writes any file under the source root, creating directories.
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.source_dir().join(rel);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).expect("Failed to create directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Writes the default config file (`scms/config.toml` in the config home).
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_home().join("scms").join("config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create config dir");
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.target_dir().join(name)
    }

    /// Reads a generated file.
    pub fn read_output(&self, name: &str) -> String {
        let path = self.output_path(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read output {}: {}", path.display(), e))
    }

    /// Loads and resolves the source tree in-process.
    pub fn load(&self) -> Site {
        load_site(&self.source_dir(), DEFAULT_MAX_DEPTH, None).expect("Should load site")
    }

    /// Builds the site in-process with default options.
    pub fn build(&self) -> BuildReport {
        self.build_with(&RenderOptions::default())
    }

    pub fn build_with(&self, options: &RenderOptions) -> BuildReport {
        scms::cli::handlers::build_site(
            &self.source_dir(),
            &self.target_dir(),
            DEFAULT_MAX_DEPTH,
            options,
        )
        .expect("Should build site")
    }

    /// Creates an `ScmsCommand` isolated to this environment's config home.
    pub fn cmd(&self) -> ScmsCommand {
        ScmsCommand::new().config_home(&self.config_home())
    }

    /// `build -S src -T out`
    pub fn build_cmd(&self) -> ScmsCommand {
        self.cmd()
            .build()
            .source(&self.source_dir())
            .target(&self.target_dir())
    }

    /// `check -S src`
    pub fn check_cmd(&self) -> ScmsCommand {
        self.cmd().check().source(&self.source_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // TestEnv Foundation
    // ===========================================

    #[test]
    fn test_env_creates_source_dir() {
        let env = TestEnv::new();
        assert!(env.source_dir().is_dir());
        assert!(!env.target_dir().exists());
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.root().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_add_page_creates_nested_file() {
        let env = TestEnv::new();
        let path = env.add_page("docs/guide.html", &TestPage::new("Guide"));
        assert!(path.is_file());
        assert!(path.starts_with(env.source_dir()));
    }

    #[test]
    fn test_env_load_reads_pages() {
        let env = TestEnv::new();
        env.add_page("home.html", &TestPage::new("Home"));
        env.add_page("about.html", &TestPage::new("About"));
        let site = env.load();
        assert_eq!(site.len(), 2);
    }

    #[test]
    fn test_env_build_writes_target() {
        let env = TestEnv::new();
        env.add_page("home.html", &TestPage::new("Home"));
        let report = env.build();
        assert_eq!(report.pages_written, 1);
        assert!(env.output_path("home.html").is_file());
    }
}
