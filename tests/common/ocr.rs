// file: tests/common/ocr.rs
// description: scripted OCR engine keyed on image width

use image::GrayImage;
use pdf_search::{OcrEngine, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the text registered for an image's width, or nothing.
#[derive(Clone, Default)]
pub struct ScriptedOcr {
    by_width: HashMap<u32, String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, width: u32, text: &str) -> Self {
        self.by_width.insert(width, text.to_string());
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_width.get(&image.width()).cloned().unwrap_or_default())
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
