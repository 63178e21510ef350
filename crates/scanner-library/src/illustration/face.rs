use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use rustface::{Detector, FaceInfo, ImageData};
use tracing::warn;

/// Path to the bundled cascade classifier, overridable for deployments
/// that place it elsewhere.
const DEFAULT_MODEL_PATH: &str = "assets/seeta_fd_frontal_v1.0.bin";

fn model_path() -> String {
    std::env::var("SCANNER_FACE_MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

struct SendDetector(Box<dyn Detector>);

// SAFETY: the detector is only ever accessed through `DETECTOR`'s `Mutex`,
// which guarantees exclusive access from a single thread at a time.
unsafe impl Send for SendDetector {}

static DETECTOR: OnceCell<Option<Mutex<SendDetector>>> = OnceCell::new();

fn detector() -> Option<&'static Mutex<SendDetector>> {
    DETECTOR
        .get_or_init(|| match rustface::create_detector(&model_path()) {
            Ok(mut d) => {
                d.set_min_face_size(40);
                d.set_score_thresh(2.0);
                d.set_pyramid_scale_factor(0.8);
                d.set_slide_window_step(4, 4);
                Some(Mutex::new(SendDetector(d)))
            }
            Err(e) => {
                warn!(error = %e, "face detector failed to initialize");
                None
            }
        })
        .as_ref()
}

/// Returns the first frame (in the given order) containing exactly one
/// detected face, or `None` if the detector is unavailable or no frame
/// qualifies.
pub fn first_single_face_frame(frame_paths: &[std::path::PathBuf]) -> Option<std::path::PathBuf> {
    let detector = detector()?;
    for path in frame_paths {
        if count_faces(detector, path) == Some(1) {
            return Some(path.clone());
        }
    }
    None
}

fn count_faces(detector: &Mutex<SendDetector>, path: &Path) -> Option<usize> {
    let img = image::open(path).ok()?.to_luma8();
    let (width, height) = img.dimensions();
    let buf = img.into_raw();
    let image_data = ImageData::new(buf.as_slice(), width, height);
    let mut detector = detector.lock().ok()?;
    let faces: Vec<FaceInfo> = detector.0.detect(&image_data);
    Some(faces.len())
}
