// file: src/extractor/ocr.rs
// description: OCR engine abstraction and the tesseract command-line backend
// reference: https://tesseract-ocr.github.io/tessdoc/Command-Line-Usage.html

use crate::config::ExtractionConfig;
use crate::error::{PipelineError, Result};
use image::{GrayImage, ImageFormat};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// A character recognizer. Output is accepted as-is: no retries and no
/// confidence threshold.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Runs the `tesseract` executable on a temporary PNG and reads stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
}

impl TesseractCli {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.ocr_command.clone(), config.ocr_language.clone())
    }

    fn build_command(&self, image_path: &Path) -> Command {
        let mut command = Command::new(&self.command);
        command
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language);
        command
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let scratch = tempfile::Builder::new()
            .prefix("pdf_search_ocr_")
            .suffix(".png")
            .tempfile()?;

        image
            .save_with_format(scratch.path(), ImageFormat::Png)
            .map_err(|e| PipelineError::Ocr(format!("Failed to write OCR input: {}", e)))?;

        debug!(
            "Running {} on {}x{} image",
            self.command,
            image.width(),
            image.height()
        );

        let output = self
            .build_command(scratch.path())
            .output()
            .map_err(|e| PipelineError::Ocr(format!("Failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Ocr(format!(
                "{} exited with code {}: {}",
                self.command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
