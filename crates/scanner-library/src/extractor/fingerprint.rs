use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::warn;

/// Longer Video items are skipped — chromaprint on multi-hour video is
/// both slow and not useful for acoustic matching.
const MAX_VIDEO_FINGERPRINT_SECS: u64 = 1200;

#[cfg(not(windows))]
const FPCALC_PATHS: &[&str] = &["fpcalc", "/usr/bin/fpcalc", "/usr/local/bin/fpcalc"];
#[cfg(windows)]
const FPCALC_PATHS: &[&str] = &["fpcalc"];

fn find_fpcalc() -> Option<&'static str> {
    FPCALC_PATHS
        .iter()
        .find(|p| Command::new(p).arg("-version").output().map(|o| o.status.success()).unwrap_or(false))
        .copied()
}

#[derive(Deserialize)]
struct FpcalcOutput {
    fingerprint: String,
}

/// Non-fatal: any failure is logged and the caller is left with no
/// fingerprint, per §4.2.
pub fn fingerprint(path: &Path, is_video: bool, duration_secs: Option<u64>) -> Option<String> {
    if is_video && duration_secs.is_some_and(|d| d > MAX_VIDEO_FINGERPRINT_SECS) {
        return None;
    }

    let fpcalc = find_fpcalc().or_else(|| {
        warn!("fpcalc not found on PATH, skipping fingerprint");
        None
    })?;

    let output = Command::new(fpcalc)
        .args(["-json", "-algorithm", "2", "-overlap", "-channels", "2"])
        .arg(path)
        .output();

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            warn!(stderr = %String::from_utf8_lossy(&o.stderr), "fpcalc exited with failure");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "failed to spawn fpcalc");
            return None;
        }
    };

    match serde_json::from_slice::<FpcalcOutput>(&output.stdout) {
        Ok(parsed) => Some(parsed.fingerprint),
        Err(e) => {
            warn!(error = %e, "failed to parse fpcalc output");
            None
        }
    }
}
