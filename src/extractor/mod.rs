// file: src/extractor/mod.rs
// description: text extraction module exports
// reference: internal module structure

pub mod image;
pub mod ocr;
pub mod pdf;
pub mod progress;

pub use self::image::{EmbeddedImage, FaxParams, ImageEncoding, ImagePreprocessor, Palette};
pub use ocr::{OcrEngine, TesseractCli};
pub use pdf::{Extraction, ExtractionMethod, TextExtractor, page_images};
pub use progress::{OcrStats, ProgressTracker};
