use std::sync::Arc;

use regex::Regex;
use scanner_core::UserSettings;
use scanner_paths::ScannerPaths;

use crate::catalog::CatalogClient;

/// Read-only dependencies shared by every pipeline run. `UserSettings`
/// is immutable post-startup per §5, so a plain `Arc` (no lock) is
/// enough.
#[derive(Clone)]
pub struct PipelineContext {
    pub catalog: Arc<CatalogClient>,
    pub paths: Arc<ScannerPaths>,
    pub settings: Arc<UserSettings>,
    pub track_regex: Arc<Vec<Regex>>,
}
