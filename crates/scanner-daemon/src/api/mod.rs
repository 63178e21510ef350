mod auth;
mod control;
mod root;
mod tasks;

pub use control::{clean, clean_library, refresh, scan, scan_library};
pub use root::root;
pub use tasks::tasks;
