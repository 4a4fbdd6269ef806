// Gazebo SDF world pose extraction
mod extract;
mod pose;

pub use extract::PoseExtractor;
pub use pose::{PlanarOffset, PoseFormatError, ScenePose};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("World file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid text encoding: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("Invalid entity reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("Missing required attribute '{attr}' on element '{element}' at byte {position}")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
        position: u64,
    },

    #[error("Malformed pose for model '{model}': {reason}")]
    Format {
        model: String,
        reason: PoseFormatError,
    },
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Open a world file and return a lazy pose extractor over it.
///
/// The file is read incrementally; it stays open until the extractor is dropped.
pub fn open(path: impl AsRef<Path>) -> Result<PoseExtractor<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SceneError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => SceneError::Io(e),
    })?;
    log::debug!("Opened world file {}", path.display());
    Ok(PoseExtractor::new(BufReader::new(file)))
}

/// Collect every non-origin pose of an in-memory world document.
pub fn extract_all(xml: &str) -> Result<Vec<ScenePose>> {
    PoseExtractor::from_xml(xml).collect()
}
