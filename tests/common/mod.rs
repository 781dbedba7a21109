// file: tests/common/mod.rs
// description: shared fixtures for integration tests
#![allow(dead_code)]

pub mod elastic;
pub mod ocr;
pub mod pdf;
