// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod backend;
pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use backend::{DocumentIndexer, ElasticClient, IndexManager, IndexStatus, QueryClient};
pub use config::{BackendConfig, Config, ExtractionConfig, SearchConfig};
pub use error::{PipelineError, Result};
pub use exporter::JsonExporter;
pub use extractor::{
    EmbeddedImage, Extraction, ExtractionMethod, ImagePreprocessor, OcrEngine, OcrStats,
    TesseractCli, TextExtractor,
};
pub use models::{DocumentRecord, FormattedResult, SearchHit};
pub use pipeline::{PipelineOrchestrator, UploadReport};
pub use utils::{OperationTimer, Validator};
