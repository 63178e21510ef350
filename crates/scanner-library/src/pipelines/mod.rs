mod clean;
mod context;
mod refresh;
mod scan;
mod walk;

pub use clean::run_clean;
pub use context::PipelineContext;
pub use refresh::run_refresh;
pub use scan::run_scan;
pub use walk::walk_library;
