// file: src/extractor/pdf.rs
// description: direct text extraction with OCR fallback for scanned PDFs
// reference: https://docs.rs/lopdf

use crate::config::ExtractionConfig;
use crate::error::{PipelineError, Result};
use crate::extractor::image::{
    EmbeddedImage, FaxParams, ImageEncoding, ImagePreprocessor, Palette, space_components,
};
use crate::extractor::ocr::{OcrEngine, TesseractCli};
use crate::extractor::progress::{OcrStats, ProgressTracker};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Form XObjects may nest; deeper trees are ignored.
const MAX_FORM_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionMethod {
    Direct,
    Ocr,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Direct => write!(f, "text layer"),
            ExtractionMethod::Ocr => write!(f, "OCR"),
        }
    }
}

/// Text chosen for a document, plus which strategy produced it and why the
/// others came up empty.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
    pub direct_error: Option<String>,
    pub ocr_error: Option<String>,
    pub ocr_stats: Option<OcrStats>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub struct TextExtractor {
    ocr: Box<dyn OcrEngine>,
    preprocessor: ImagePreprocessor,
    show_progress: bool,
}

impl TextExtractor {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            preprocessor: ImagePreprocessor::new(),
            show_progress: false,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(Box::new(TesseractCli::from_config(config))).with_progress(config.show_progress)
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The native text layer wins whenever it is non-empty; otherwise the
    /// OCR text is used, even if that is empty too. Never fails.
    pub fn extract(&self, path: &Path) -> Extraction {
        let (direct_text, direct_error) = match self.extract_direct(path) {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("Direct text extraction failed for {}: {}", path.display(), e);
                (String::new(), Some(e.to_string()))
            }
        };

        if !direct_text.is_empty() {
            info!(
                "Extracted {} characters from the text layer of {}",
                direct_text.chars().count(),
                path.display()
            );
            return Extraction {
                text: direct_text,
                method: ExtractionMethod::Direct,
                direct_error: None,
                ocr_error: None,
                ocr_stats: None,
            };
        }

        info!(
            "No text layer in {}, falling back to OCR with {}",
            path.display(),
            self.ocr.name()
        );

        match self.extract_ocr(path) {
            Ok((text, stats)) => {
                info!(
                    "OCR recognized {} of {} images ({:.1}%) across {} pages",
                    stats.images_recognized,
                    stats.images_found,
                    stats.success_rate(),
                    stats.pages_scanned
                );
                Extraction {
                    text,
                    method: ExtractionMethod::Ocr,
                    direct_error,
                    ocr_error: None,
                    ocr_stats: Some(stats),
                }
            }
            Err(e) => {
                warn!("OCR extraction failed for {}: {}", path.display(), e);
                Extraction {
                    text: String::new(),
                    method: ExtractionMethod::Ocr,
                    direct_error,
                    ocr_error: Some(e.to_string()),
                    ocr_stats: None,
                }
            }
        }
    }

    /// Concatenates every page's native text in page order, no separator.
    pub fn extract_direct(&self, path: &Path) -> Result<String> {
        let doc = Document::load(path)?;
        let mut text = String::new();

        for page_number in doc.get_pages().keys() {
            text.push_str(&doc.extract_text(&[*page_number])?);
        }

        debug!("Text layer of {} holds {} bytes", path.display(), text.len());
        Ok(text)
    }

    /// Recognizes every embedded image, page order then resource order.
    /// A bad image is skipped; only an unreadable document fails the pass.
    pub fn extract_ocr(&self, path: &Path) -> Result<(String, OcrStats)> {
        let doc = Document::load(path)?;
        let pages = doc.get_pages();
        let mut progress = ProgressTracker::new(pages.len(), self.show_progress);
        let mut text = String::new();

        for (&page_number, &page_id) in &pages {
            for image in page_images(&doc, page_number, page_id) {
                progress.image_found();

                match image.and_then(|image| self.recognize(&image)) {
                    Ok(recognized) => {
                        text.push_str(&recognized);
                        progress.image_recognized();
                    }
                    Err(e) => {
                        warn!("Skipping image on page {}: {}", page_number, e);
                        progress.image_skipped();
                    }
                }
            }
            progress.page_done();
        }

        Ok((text, progress.finish()))
    }

    fn recognize(&self, image: &EmbeddedImage) -> Result<String> {
        let gray = self.preprocessor.to_grayscale(image)?;
        self.ocr.recognize(&gray)
    }
}

/// Image XObjects reachable from a page's resources, in the order the
/// `XObject` dictionaries list them. Each object is reported once per page.
pub fn page_images(doc: &Document, page_number: u32, page_id: ObjectId) -> Vec<Result<EmbeddedImage>> {
    let (inline, resource_ids) = doc.get_page_resources(page_id);

    let mut dicts: Vec<&Dictionary> = inline.into_iter().collect();
    dicts.extend(
        resource_ids
            .into_iter()
            .filter_map(|id| doc.get_dictionary(id).ok()),
    );

    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for resources in dicts {
        collect_images(doc, resources, page_number, 0, &mut seen, &mut images);
    }
    images
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    page_number: u32,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<Result<EmbeddedImage>>,
) {
    let xobjects = match resources
        .get(b"XObject")
        .and_then(|obj| resolve(doc, obj))
        .and_then(Object::as_dict)
    {
        Ok(dict) => dict,
        Err(_) => return,
    };

    for (name, entry) in xobjects.iter() {
        let name = String::from_utf8_lossy(name).into_owned();

        if let Ok(id) = entry.as_reference() {
            if !seen.insert(id) {
                continue;
            }
        }

        let stream = match resolve(doc, entry).and_then(Object::as_stream) {
            Ok(stream) => stream,
            Err(e) => {
                out.push(Err(PipelineError::Pdf(format!(
                    "Cannot read XObject {} on page {}: {}",
                    name, page_number, e
                ))));
                continue;
            }
        };

        match name_entry(&stream.dict, b"Subtype").as_deref() {
            Some("Image") => out.push(read_image(doc, stream, page_number, name)),
            Some("Form") if depth < MAX_FORM_DEPTH => {
                if let Ok(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .and_then(|obj| resolve(doc, obj))
                    .and_then(Object::as_dict)
                {
                    collect_images(doc, form_resources, page_number, depth + 1, seen, out);
                }
            }
            _ => {}
        }
    }
}

fn read_image(doc: &Document, stream: &Stream, page_number: u32, name: String) -> Result<EmbeddedImage> {
    let dict = &stream.dict;
    let width = dimension(dict, b"Width", &name)?;
    let height = dimension(dict, b"Height", &name)?;

    let is_mask = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let bits_per_component = if is_mask {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .map(|bits| bits.clamp(1, 16) as u8)
            .unwrap_or(8)
    };

    let filters = filters(dict);
    let (encoding, data) = match filters.as_slice() {
        [] => (ImageEncoding::Raw, stream.content.clone()),
        [only] if only == "DCTDecode" => (ImageEncoding::Encoded, stream.content.clone()),
        [only] if only == "FlateDecode" || only == "LZWDecode" => {
            (ImageEncoding::Raw, stream.decompressed_content()?)
        }
        [only] if only == "CCITTFaxDecode" => (
            ImageEncoding::Fax(fax_params(doc, dict)),
            stream.content.clone(),
        ),
        other => (ImageEncoding::Unsupported(other.join("+")), Vec::new()),
    };

    let (color_space, palette) = if is_mask {
        (None, None)
    } else {
        color_space(doc, dict)
    };

    Ok(EmbeddedImage {
        page: page_number,
        name,
        width,
        height,
        color_space,
        palette,
        bits_per_component,
        decode_inverted: decode_inverted(dict),
        encoding,
        data,
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> lopdf::Result<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

fn dimension(dict: &Dictionary, key: &[u8], name: &str) -> Result<u32> {
    let value = dict.get(key).and_then(Object::as_i64).map_err(|e| {
        PipelineError::Pdf(format!(
            "Image {} has no usable {}: {}",
            name,
            String::from_utf8_lossy(key),
            e
        ))
    })?;

    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            PipelineError::Pdf(format!(
                "Image {} has invalid {} {}",
                name,
                String::from_utf8_lossy(key),
                value
            ))
        })
}

fn name_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(Object::as_name)
        .ok()
        .map(|name| String::from_utf8_lossy(name).into_owned())
}

/// `/ColorSpace` is either a name or an array such as `[/ICCBased 7 0 R]`.
/// An `/Indexed` space also yields its palette.
fn color_space(doc: &Document, dict: &Dictionary) -> (Option<String>, Option<Palette>) {
    let Ok(space) = dict.get(b"ColorSpace").and_then(|obj| resolve(doc, obj)) else {
        return (None, None);
    };

    let name = space_name(space);
    let palette = match (name.as_deref(), space) {
        (Some("Indexed") | Some("I"), Object::Array(items)) => palette(doc, items),
        _ => None,
    };
    (name, palette)
}

fn space_name(space: &Object) -> Option<String> {
    let name = match space {
        Object::Name(name) => name.as_slice(),
        Object::Array(items) => items.first().and_then(|item| item.as_name().ok())?,
        _ => return None,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}

/// `[/Indexed base hival lookup]` where lookup is a string or a stream.
fn palette(doc: &Document, items: &[Object]) -> Option<Palette> {
    let base_object = resolve(doc, items.get(1)?).ok()?;
    let base = space_name(base_object)?;
    let components = space_components(&base).or_else(|| icc_components(doc, base_object))?;

    let hival = items.get(2)?.as_i64().ok()?.clamp(0, 255) as u8;
    let lookup = match resolve(doc, items.get(3)?).ok()? {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(stream) => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
        _ => return None,
    };

    Some(Palette {
        base,
        components,
        hival,
        lookup,
    })
}

/// `N` of an `[/ICCBased stream]` space.
fn icc_components(doc: &Document, space: &Object) -> Option<usize> {
    let Object::Array(items) = space else {
        return None;
    };
    let stream = resolve(doc, items.get(1)?).ok()?.as_stream().ok()?;
    let n = stream.dict.get(b"N").and_then(Object::as_i64).ok()?;
    usize::try_from(n).ok().filter(|n| matches!(*n, 1 | 3 | 4))
}

/// `DecodeParms` may be a dictionary, a reference, or an array parallel to
/// `Filter`; only single-filter fax streams reach here.
fn fax_params(doc: &Document, dict: &Dictionary) -> FaxParams {
    let mut params = FaxParams::default();

    let parms = match dict.get(b"DecodeParms").and_then(|obj| resolve(doc, obj)) {
        Ok(Object::Dictionary(parms)) => Some(parms),
        Ok(Object::Array(items)) => items
            .first()
            .and_then(|item| resolve(doc, item).ok())
            .and_then(|item| item.as_dict().ok()),
        _ => None,
    };
    let Some(parms) = parms else {
        return params;
    };

    if let Ok(k) = parms.get(b"K").and_then(Object::as_i64) {
        params.k = k;
    }
    if let Ok(columns) = parms.get(b"Columns").and_then(Object::as_i64) {
        params.columns = u32::try_from(columns).unwrap_or(0);
    }
    if let Ok(rows) = parms.get(b"Rows").and_then(Object::as_i64) {
        params.rows = u32::try_from(rows).ok().filter(|rows| *rows > 0);
    }
    if let Ok(black_is_1) = parms.get(b"BlackIs1").and_then(Object::as_bool) {
        params.black_is_1 = black_is_1;
    }
    params
}

/// True when the first `/Decode` pair runs high to low, e.g. `[1 0]`.
fn decode_inverted(dict: &Dictionary) -> bool {
    let Ok(Object::Array(items)) = dict.get(b"Decode") else {
        return false;
    };
    match (items.first().and_then(number), items.get(1).and_then(number)) {
        (Some(low), Some(high)) => low > high,
        _ => false,
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}
