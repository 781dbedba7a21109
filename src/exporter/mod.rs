// file: src/exporter/mod.rs
// description: result output module exports

pub mod json;

pub use json::JsonExporter;
