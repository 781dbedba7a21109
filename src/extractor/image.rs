// file: src/extractor/image.rs
// description: converts embedded PDF images into grayscale bitmaps for OCR
// reference: https://docs.rs/image, https://docs.rs/fax

use crate::error::{PipelineError, Result};
use fax::Color;
use fax::decoder::{decode_g3, decode_g4, pels};
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

/// How an image XObject's bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEncoding {
    /// A complete image file (JPEG from `DCTDecode`, or anything `image` can sniff).
    Encoded,
    /// Uncompressed samples, `BitsPerComponent` bits per colour component.
    Raw,
    /// CCITT Group 3 or Group 4 fax data.
    Fax(FaxParams),
    /// A filter we cannot decode, e.g. `JPXDecode` or `JBIG2Decode`.
    Unsupported(String),
}

/// `DecodeParms` of a `CCITTFaxDecode` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaxParams {
    /// Negative for Group 4, zero for one-dimensional Group 3.
    pub k: i64,
    pub columns: u32,
    /// `None` when the stream leaves `Rows` to the image height.
    pub rows: Option<u32>,
    pub black_is_1: bool,
}

impl Default for FaxParams {
    fn default() -> Self {
        Self {
            k: 0,
            columns: 1728,
            rows: None,
            black_is_1: false,
        }
    }
}

/// `[/Indexed base hival lookup]`: every sample is an index into `lookup`,
/// which holds `hival + 1` colours of `components` bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub base: String,
    pub components: usize,
    pub hival: u8,
    pub lookup: Vec<u8>,
}

impl Palette {
    fn colour(&self, index: u16) -> &[u8] {
        let index = usize::from(index.min(u16::from(self.hival)));
        let start = index * self.components;
        self.lookup
            .get(start..start + self.components)
            .unwrap_or(&[])
    }
}

/// Raster data pulled out of a page; lives only for the duration of OCR.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub page: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: Option<String>,
    pub palette: Option<Palette>,
    pub bits_per_component: u8,
    /// `/Decode` maps samples high to low, e.g. `[1 0]`.
    pub decode_inverted: bool,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn to_grayscale(&self, image: &EmbeddedImage) -> Result<GrayImage> {
        match &image.encoding {
            ImageEncoding::Encoded => self.decode_bytes(&image.data),
            ImageEncoding::Raw => self.from_raw_samples(image),
            ImageEncoding::Fax(params) => self.from_fax(image, params),
            ImageEncoding::Unsupported(filter) => Err(PipelineError::Image(format!(
                "Unsupported image filter {} for {} on page {}",
                filter, image.name, image.page
            ))),
        }
    }

    /// Decodes a complete image file and collapses it to one luma channel.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<GrayImage> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(decoded.to_luma8())
    }

    fn from_raw_samples(&self, image: &EmbeddedImage) -> Result<GrayImage> {
        let pixels = image.width as usize * image.height as usize;
        if pixels == 0 {
            return Err(PipelineError::Image(format!(
                "Image {} has zero size",
                image.name
            )));
        }

        let bits = image.bits_per_component;
        if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
            return Err(PipelineError::Image(format!(
                "Unsupported bit depth {} for {}",
                bits, image.name
            )));
        }

        if let Some(palette) = &image.palette {
            return self.from_palette(image, palette);
        }

        let components = sample_components(image, pixels);
        debug!(
            "Raw image {} ({}x{}, {:?}, {} components, {} bits)",
            image.name, image.width, image.height, image.color_space, components, bits
        );

        let samples = unpack_samples(&image.data, image.width, image.height, bits, components)
            .ok_or_else(|| short_buffer(image))?;

        let max = (1u32 << bits) - 1;
        let bytes: Vec<u8> = samples
            .into_iter()
            .map(|sample| {
                let value = (u32::from(sample) * 255 / max) as u8;
                if image.decode_inverted { 255 - value } else { value }
            })
            .collect();

        assemble(image, components, bytes)
    }

    fn from_palette(&self, image: &EmbeddedImage, palette: &Palette) -> Result<GrayImage> {
        if palette.components == 0 || palette.lookup.len() < palette.components {
            return Err(PipelineError::Image(format!(
                "Palette of {} holds no colours",
                image.name
            )));
        }

        let indices = unpack_samples(
            &image.data,
            image.width,
            image.height,
            image.bits_per_component,
            1,
        )
        .ok_or_else(|| short_buffer(image))?;

        debug!(
            "Indexed image {} ({}x{}, {} entries over {})",
            image.name,
            image.width,
            image.height,
            u16::from(palette.hival) + 1,
            palette.base
        );

        let hival = u16::from(palette.hival);
        let mut bytes = Vec::with_capacity(indices.len() * palette.components);
        for index in indices {
            let index = if image.decode_inverted {
                hival.saturating_sub(index)
            } else {
                index
            };
            let colour = palette.colour(index);
            bytes.extend_from_slice(colour);
            // lookup tables shorter than hival promise are padded with black
            bytes.resize(bytes.len() + palette.components - colour.len(), 0);
        }

        assemble(image, palette.components, bytes)
    }

    fn from_fax(&self, image: &EmbeddedImage, params: &FaxParams) -> Result<GrayImage> {
        let columns = u16::try_from(params.columns)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                PipelineError::Image(format!(
                    "Fax image {} has invalid Columns {}",
                    image.name, params.columns
                ))
            })?;
        let rows = params.rows.unwrap_or(image.height);
        let height = u16::try_from(rows).map_err(|_| {
            PipelineError::Image(format!("Fax image {} has invalid Rows {}", image.name, rows))
        })?;

        // BlackIs1 and an inverted Decode array cancel out
        let (ink, paper) = if params.black_is_1 != image.decode_inverted {
            (255u8, 0u8)
        } else {
            (0u8, 255u8)
        };

        let mut pixels = Vec::with_capacity(usize::from(columns) * usize::from(height));
        let mut push_line = |transitions: &[u16]| {
            pixels.extend(pels(transitions, columns).map(|colour| match colour {
                Color::Black => ink,
                Color::White => paper,
            }));
        };

        let finished = match params.k {
            k if k < 0 => decode_g4(image.data.iter().copied(), columns, Some(height), &mut push_line),
            0 => decode_g3(image.data.iter().copied(), &mut push_line),
            k => {
                return Err(PipelineError::Image(format!(
                    "Two-dimensional Group 3 (K={}) is not supported for {}",
                    k, image.name
                )));
            }
        };

        if pixels.is_empty() {
            return Err(PipelineError::Image(format!(
                "Fax data of {} could not be decoded",
                image.name
            )));
        }
        if finished.is_none() {
            debug!(
                "Fax data of {} ended early after {} rows",
                image.name,
                pixels.len() / usize::from(columns)
            );
        }

        pixels.resize(usize::from(columns) * usize::from(height), paper);
        GrayImage::from_raw(u32::from(columns), u32::from(height), pixels)
            .ok_or_else(|| short_buffer(image))
    }
}

/// Colour components per sample, taken from the colour space when it is a
/// device space and from the buffer size otherwise (ICC-based images).
fn sample_components(image: &EmbeddedImage, pixels: usize) -> usize {
    if let Some(known) = image.color_space.as_deref().and_then(space_components) {
        return known;
    }
    if image.bits_per_component >= 8 {
        let bytes_per_sample = usize::from(image.bits_per_component / 8);
        return (image.data.len() / (pixels * bytes_per_sample)).clamp(1, 4);
    }
    1
}

pub(crate) fn space_components(name: &str) -> Option<usize> {
    match name {
        "DeviceGray" | "CalGray" | "G" => Some(1),
        "DeviceRGB" | "CalRGB" | "RGB" | "Lab" => Some(3),
        "DeviceCMYK" | "CMYK" => Some(4),
        _ => None,
    }
}

/// Reads `components` samples per pixel; rows are padded to a byte boundary
/// and 16-bit samples are big-endian.
fn unpack_samples(data: &[u8], width: u32, height: u32, bits: u8, components: usize) -> Option<Vec<u16>> {
    let per_row = width as usize * components;
    let row_bytes = (per_row * usize::from(bits)).div_ceil(8);
    if row_bytes == 0 || data.len() < row_bytes * height as usize {
        return None;
    }

    let mut samples = Vec::with_capacity(per_row * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for i in 0..per_row {
            let sample = match bits {
                8 => u16::from(row[i]),
                16 => u16::from_be_bytes([row[2 * i], row[2 * i + 1]]),
                _ => {
                    let bit = i * usize::from(bits);
                    let shift = 8 - usize::from(bits) - bit % 8;
                    u16::from((row[bit / 8] >> shift) & ((1u8 << bits) - 1))
                }
            };
            samples.push(sample);
        }
    }
    Some(samples)
}

fn assemble(image: &EmbeddedImage, components: usize, bytes: Vec<u8>) -> Result<GrayImage> {
    let decoded = match components {
        1 => GrayImage::from_raw(image.width, image.height, bytes).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(image.width, image.height, bytes).map(DynamicImage::ImageRgb8),
        4 => RgbImage::from_raw(image.width, image.height, cmyk_to_rgb(&bytes))
            .map(DynamicImage::ImageRgb8),
        n => {
            return Err(PipelineError::Image(format!(
                "Cannot interpret {} components per pixel in {}",
                n, image.name
            )));
        }
    };

    decoded
        .map(|img| img.to_luma8())
        .ok_or_else(|| short_buffer(image))
}

fn short_buffer(image: &EmbeddedImage) -> PipelineError {
    PipelineError::Image(format!(
        "Sample buffer of {} bytes too small for {}x{} image {}",
        image.data.len(),
        image.width,
        image.height,
        image.name
    ))
}

#[allow(clippy::many_single_char_names)]
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let c = f32::from(chunk[0]) / 255.0;
        let m = f32::from(chunk[1]) / 255.0;
        let y = f32::from(chunk[2]) / 255.0;
        let k = f32::from(chunk[3]) / 255.0;

        rgb.push((255.0 * (1.0 - c) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - m) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - y) * (1.0 - k)) as u8);
    }
    rgb
}
