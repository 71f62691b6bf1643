use image::RgbImage;
use std::path::{Path, PathBuf};

use super::OutputSink;
use crate::error::SessionError;

/// Substituted when the configured path has no recognised image extension.
pub const DEFAULT_OUTPUT_NAME: &str = "output.jpg";

const RECOGNISED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Keep `configured` if its extension is a recognised image format,
/// otherwise use `DEFAULT_OUTPUT_NAME` in the same directory.
pub fn resolve_output_path(configured: &Path) -> PathBuf {
    let recognised = configured
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            RECOGNISED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if recognised {
        configured.to_path_buf()
    } else {
        configured.with_file_name(DEFAULT_OUTPUT_NAME)
    }
}

/// Writes previews to an image file, format chosen by extension.
pub struct ImageFileOutput {
    target: PathBuf,
}

impl ImageFileOutput {
    pub fn new<P: AsRef<Path>>(configured: P) -> Self {
        let configured = configured.as_ref();
        let target = resolve_output_path(configured);
        if target != configured {
            tracing::info!(
                "Output path {} has no recognised image extension, using {}",
                configured.display(),
                target.display()
            );
        }
        Self { target }
    }
}

impl OutputSink for ImageFileOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<PathBuf, SessionError> {
        frame
            .save(&self.target)
            .map_err(|e| SessionError::OutputWrite {
                path: self.target.clone(),
                reason: e.to_string(),
            })?;
        Ok(self.target.clone())
    }

    fn target(&self) -> PathBuf {
        self.target.clone()
    }
}
