//! Test harness for CLI integration tests.
//!
//! Provides isolated test environments, programmatic page creation,
//! and CLI assertion helpers using `assert_cmd`.

mod command;
mod env;
mod page;

// Re-export main types for external use
#[allow(unused_imports)]
pub use command::ScmsCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
#[allow(unused_imports)]
pub use page::TestPage;
