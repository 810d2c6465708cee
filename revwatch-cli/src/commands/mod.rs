//! CLI command implementations

pub mod app;
pub mod check;
pub mod serve;
pub mod watch;

pub use app::AppArgs;
pub use check::CheckArgs;
pub use serve::ServeArgs;
pub use watch::WatchArgs;
