//! Raster-to-PDF export.
//!
//! The page is exactly the canvas size in points, with the raster stretched
//! over it as a single JPEG image XObject.

use crate::data_url;
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{ExtendedColorType, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use sketchboard_core::shapes::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used when a raster has to be (re-)encoded for the page.
pub const JPEG_QUALITY: u8 = 80;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The payload is not a decodable raster image, or the page size is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

/// An encoded raster image to be placed on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPayload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl RasterPayload {
    /// Accept encoded PNG, JPEG or WebP bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExportError> {
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or_else(|| {
            ExportError::InvalidInput("payload is not a PNG, JPEG or WebP image".to_string())
        })?;
        Ok(Self { bytes, format })
    }

    /// Accept a `data:image/...;base64,` URL, as produced by a browser canvas.
    pub fn from_data_url(url: &str) -> Result<Self, ExportError> {
        if !url.trim_start().starts_with("data:image") {
            return Err(ExportError::InvalidInput(
                "expected a data:image URL".to_string(),
            ));
        }
        let decoded = data_url::decode_data_url(url).ok_or_else(|| {
            ExportError::InvalidInput("data URL is not valid base64".to_string())
        })?;
        Self::from_bytes(decoded.bytes)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// JPEG stream ready for a `DCTDecode` image XObject.
struct PageImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    color_space: &'static str,
}

impl PageImage {
    fn from_payload(payload: &RasterPayload) -> Result<Self, ExportError> {
        if payload.format == ImageFormat::Jpeg {
            // Grayscale and RGB JPEGs embed as-is; anything else is re-encoded.
            let decoder = JpegDecoder::new(Cursor::new(payload.bytes.as_slice()))
                .map_err(|e| ExportError::InvalidInput(format!("unreadable JPEG: {e}")))?;
            let (width, height) = decoder.dimensions();
            let color_space = match decoder.original_color_type() {
                ExtendedColorType::L8 => Some("DeviceGray"),
                ExtendedColorType::Rgb8 => Some("DeviceRGB"),
                _ => None,
            };
            if let Some(color_space) = color_space {
                return Ok(Self {
                    jpeg: payload.bytes.clone(),
                    width,
                    height,
                    color_space,
                });
            }
        }
        Self::reencode(&payload.bytes)
    }

    /// Decode, flatten any transparency onto white, and encode as RGB JPEG.
    fn reencode(bytes: &[u8]) -> Result<Self, ExportError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| ExportError::InvalidInput(format!("undecodable image: {e}")))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for px in rgba.pixels() {
            let a = u16::from(px[3]);
            for &c in &px.0[..3] {
                rgb.push(((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8);
            }
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
            &rgb,
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(Self {
            jpeg,
            width,
            height,
            color_space: "DeviceRGB",
        })
    }
}

/// Build a one-page PDF whose page is `width` x `height` points with the
/// payload drawn over the whole page.
pub fn export_pdf(payload: &RasterPayload, width: f64, height: f64) -> Result<Vec<u8>, ExportError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(ExportError::InvalidInput(format!(
            "page size must be positive, got {width}x{height}"
        )));
    }
    let image = PageImage::from_payload(payload)?;
    let (w, h) = (width as f32, height as f32);

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    log::debug!(
        "Exported {}x{} raster to {w}x{h}pt PDF ({} bytes)",
        image.width,
        image.height,
        out.len()
    );
    Ok(out)
}
