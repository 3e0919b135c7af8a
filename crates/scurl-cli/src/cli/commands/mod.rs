//! CLI command handlers. Each command is in its own file.

mod escape;
mod fetch;
mod get;
mod head;
mod version;

pub use escape::{run_escape, run_unescape};
pub use fetch::{run_fetch, FetchArgs};
pub use get::{run_get, GetArgs};
pub use head::run_head;
pub use version::run_version;
