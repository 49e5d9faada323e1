//! Stitches captured segments into one image.

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage, imageops};
use tracing::{debug, warn};

use crate::dataurl::DataUrl;
use crate::error::{Error, Result};

use super::capture::CapturedSegment;
use super::geometry::{BlitOp, SelectionRect, Viewport, blit_for_band, canvas_size};

// ============================================================================
// ImageFormat
// ============================================================================

/// Output encoding for the stitched image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless, larger file size).
    #[default]
    Png,
    /// JPEG format with quality (0-100).
    Jpeg(u8),
}

impl ImageFormat {
    /// Creates PNG format.
    #[inline]
    #[must_use]
    pub fn png() -> Self {
        Self::Png
    }

    /// Creates JPEG format with quality (0-100).
    #[inline]
    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg(quality.min(100))
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg(_) => "image/jpeg",
        }
    }

    /// Encodes `canvas` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the encoder fails.
    pub fn encode(&self, canvas: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        match self {
            Self::Png => {
                canvas.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            }
            Self::Jpeg(quality) => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgba8(canvas.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut bytes, *quality).encode_image(&rgb)?;
            }
        }
        Ok(bytes)
    }
}

// ============================================================================
// Compositor
// ============================================================================

/// Output canvas for one selection.
///
/// Sized `width × dpr` by `height × dpr`. Segments may be placed in any
/// order; each lands at the rows its band is responsible for.
#[derive(Debug)]
pub struct Compositor {
    rect: SelectionRect,
    viewport: Viewport,
    canvas: RgbaImage,
    blits: Vec<BlitOp>,
}

impl Compositor {
    /// Allocates the canvas for `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelection`] if the canvas would be empty.
    pub fn new(rect: SelectionRect, viewport: Viewport) -> Result<Self> {
        let (width, height) = canvas_size(&rect, &viewport);
        if width == 0 || height == 0 {
            return Err(Error::invalid_selection(format!(
                "selection {}x{} is empty at device scale",
                rect.width(),
                rect.height()
            )));
        }

        debug!(width, height, dpr = viewport.device_pixel_ratio, "Allocated canvas");

        Ok(Self {
            rect,
            viewport,
            canvas: RgbaImage::new(width, height),
            blits: Vec::new(),
        })
    }

    /// Copies the part of `segment` that belongs to the selection.
    ///
    /// Returns the copy performed, or `None` if the segment's viewport missed
    /// its band. Edges are rounded independently, so a copy can ask for one
    /// device pixel more than the bitmap holds; the source window is then
    /// shifted back inside the bitmap and stretched over the destination.
    /// Larger shortfalls are clipped and leave the missing pixels
    /// transparent.
    pub fn place(&mut self, segment: &CapturedSegment) -> Option<BlitOp> {
        let op = blit_for_band(&self.rect, &segment.band, segment.scroll, &self.viewport)?;

        let (bitmap_width, bitmap_height) = segment.image.dimensions();
        let (x, width) = fit_span(op.source.x, op.source.width, bitmap_width);
        let (y, height) = fit_span(op.source.y, op.source.height, bitmap_height);

        if width + ROUNDING_SLACK < op.dest.width || height + ROUNDING_SLACK < op.dest.height {
            warn!(
                segment = op.band,
                bitmap_width,
                bitmap_height,
                "Capture smaller than expected, clipping source"
            );
        }

        if width > 0 && height > 0 {
            let mut patch = imageops::crop_imm(&segment.image, x, y, width, height).to_image();
            let stretch_width = stretch_to(width, op.dest.width);
            let stretch_height = stretch_to(height, op.dest.height);
            if (stretch_width, stretch_height) != (width, height) {
                patch = imageops::resize(
                    &patch,
                    stretch_width,
                    stretch_height,
                    imageops::FilterType::Nearest,
                );
            }
            imageops::replace(
                &mut self.canvas,
                &patch,
                i64::from(op.dest.x),
                i64::from(op.dest.y),
            );
        }

        self.blits.push(op);
        Some(op)
    }

    /// Copies performed so far.
    #[inline]
    #[must_use]
    pub fn blits(&self) -> &[BlitOp] {
        &self.blits
    }

    /// Canvas size in device pixels.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Consumes the compositor and returns the canvas.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Encodes the canvas as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if encoding fails.
    pub fn to_data_url(&self, format: ImageFormat) -> Result<String> {
        let bytes = format.encode(&self.canvas)?;
        Ok(DataUrl::encode(format.mime_type(), &bytes))
    }
}

/// Device pixels a rounded copy may overshoot its bitmap by.
const ROUNDING_SLACK: u32 = 1;

/// Fits `[start, start + len)` into `[0, available)`.
///
/// An overshoot within [`ROUNDING_SLACK`] moves the window back; anything
/// further is cut off.
fn fit_span(start: u32, len: u32, available: u32) -> (u32, u32) {
    let end = start.saturating_add(len);
    if end <= available {
        return (start, len);
    }
    if end - available <= ROUNDING_SLACK {
        let len = len.min(available);
        return (available - len, len);
    }
    let start = start.min(available);
    (start, len.min(available - start))
}

/// Destination extent for `len` copied pixels: the full `dest` when the gap
/// is within rounding, otherwise `len` unchanged.
#[inline]
fn stretch_to(len: u32, dest: u32) -> u32 {
    if dest.saturating_sub(len) <= ROUNDING_SLACK {
        dest
    } else {
        len
    }
}

/// Places every segment on a fresh canvas.
///
/// # Errors
///
/// Returns [`Error::InvalidSelection`] if the canvas would be empty.
pub fn composite(
    rect: SelectionRect,
    viewport: Viewport,
    segments: &[CapturedSegment],
) -> Result<Compositor> {
    let mut compositor = Compositor::new(rect, viewport)?;
    for segment in segments {
        compositor.place(segment);
    }
    Ok(compositor)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use image::Rgba;
    use proptest::prelude::*;

    use crate::clip::geometry::{ScrollOffset, plan_bands};

    fn band_color(index: usize) -> Rgba<u8> {
        Rgba([(index as u8).wrapping_mul(40).wrapping_add(20), 90, 160, 255])
    }

    /// Simulates captures of a page whose scroll clamps at `document_height`.
    fn solid_segments(
        rect: &SelectionRect,
        viewport: &Viewport,
        viewport_width: u32,
        document_height: f64,
    ) -> Vec<CapturedSegment> {
        let max_scroll = (document_height - viewport.height).max(0.0);
        plan_bands(rect, viewport)
            .into_iter()
            .map(|band| CapturedSegment {
                scroll: ScrollOffset::new(0.0, band.scroll_y.min(max_scroll)),
                image: RgbaImage::from_pixel(
                    viewport.to_device(f64::from(viewport_width)),
                    viewport.to_device(viewport.height),
                    band_color(band.index),
                ),
                band,
            })
            .collect()
    }

    #[test]
    fn test_format_mime_types() {
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
        assert_eq!(ImageFormat::jpeg(250), ImageFormat::Jpeg(100));
        assert_eq!(ImageFormat::jpeg(80).mime_type(), "image/jpeg");
    }

    #[test]
    fn test_clamped_document_end_stitches_full_height() {
        let viewport = Viewport::new(20.0, 800.0, 1.0).expect("viewport");
        let rect = SelectionRect::from_origin_size(0.0, 0.0, 10.0, 1200.0);
        let segments = solid_segments(&rect, &viewport, 20, 1200.0);

        assert_eq!(segments[1].scroll.y, 400.0);

        let compositor = composite(rect, viewport, &segments).expect("composite");
        assert_eq!(compositor.dimensions(), (10, 1200));
        assert_eq!(compositor.blits().len(), 2);

        let image = compositor.into_image();
        assert_eq!(*image.get_pixel(5, 799), band_color(0));
        assert_eq!(*image.get_pixel(5, 800), band_color(1));
        assert_eq!(*image.get_pixel(5, 1199), band_color(1));
    }

    #[test]
    fn test_short_bitmap_leaves_rows_transparent() {
        let viewport = Viewport::new(20.0, 100.0, 1.0).expect("viewport");
        let rect = SelectionRect::from_origin_size(0.0, 0.0, 10.0, 100.0);
        let band = plan_bands(&rect, &viewport)[0];
        let segment = CapturedSegment {
            band,
            scroll: ScrollOffset::default(),
            image: RgbaImage::from_pixel(20, 60, band_color(0)),
        };

        let mut compositor = Compositor::new(rect, viewport).expect("compositor");
        assert!(compositor.place(&segment).is_some());

        let image = compositor.into_image();
        assert_eq!(*image.get_pixel(0, 59), band_color(0));
        assert_eq!(image.get_pixel(0, 60).0[3], 0);
    }

    #[test]
    fn test_data_url_round_trips_through_decoder() {
        let viewport = Viewport::new(20.0, 50.0, 2.0).expect("viewport");
        let rect = SelectionRect::from_origin_size(2.0, 0.0, 8.0, 30.0);
        let segments = solid_segments(&rect, &viewport, 20, 500.0);
        let compositor = composite(rect, viewport, &segments).expect("composite");

        let url = compositor.to_data_url(ImageFormat::Png).expect("encode");
        let parsed = DataUrl::parse(&url).expect("parse");
        assert_eq!(parsed.mime(), "image/png");

        let decoded = image::load_from_memory(parsed.data()).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (16, 60));
    }

    #[test]
    fn test_jpeg_output() {
        let viewport = Viewport::new(20.0, 50.0, 1.0).expect("viewport");
        let rect = SelectionRect::from_origin_size(0.0, 0.0, 16.0, 16.0);
        let compositor = composite(rect, viewport, &solid_segments(&rect, &viewport, 20, 50.0))
            .expect("composite");

        let url = compositor.to_data_url(ImageFormat::jpeg(85)).expect("encode");
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    /// Rows at column `x` with no pixel copied into them.
    fn transparent_rows(image: &RgbaImage, x: u32) -> Vec<u32> {
        (0..image.height())
            .filter(|&y| image.get_pixel(x, y).0[3] == 0)
            .collect()
    }

    #[test]
    fn test_fractional_dpr_leaves_no_blank_rows() {
        // 721 × 1.25 = 901.25: bitmaps hold 901 rows but the second band's
        // rounded edges span rows 901..1803.
        let viewport = Viewport::new(400.0, 721.0, 1.25).expect("viewport");
        let rect = SelectionRect::from_origin_size(0.0, 100.0, 300.0, 2000.0);
        let segments = solid_segments(&rect, &viewport, 400, 5000.0);
        assert!(segments.iter().all(|s| s.image.height() == 901));

        let compositor = composite(rect, viewport, &segments).expect("composite");
        assert_eq!(compositor.dimensions(), (375, 2500));
        assert!(compositor.blits().iter().any(|op| op.source.height == 902));

        let image = compositor.into_image();
        assert_eq!(transparent_rows(&image, 0), Vec::<u32>::new());
        assert_eq!(transparent_rows(&image, 374), Vec::<u32>::new());
        assert_eq!(*image.get_pixel(0, 1802), band_color(1));
        assert_eq!(*image.get_pixel(0, 1803), band_color(2));
    }

    #[test]
    fn test_fit_span() {
        assert_eq!(fit_span(0, 900, 901), (0, 900));
        assert_eq!(fit_span(0, 902, 901), (0, 901));
        assert_eq!(fit_span(4, 898, 901), (3, 898));
        assert_eq!(fit_span(0, 100, 60), (0, 60));
        assert_eq!(fit_span(70, 10, 60), (60, 0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_each_band_color_lands_in_its_rows(
            top_quarters in 0u32..1600,
            height in 10u32..400,
            vh_quarters in 80u32..480,
            dpr in prop::sample::select(vec![1.0f64, 1.25, 1.5, 1.75, 2.0]),
            doc_slack in 0u32..200,
        ) {
            let top = f64::from(top_quarters) / 4.0;
            let vh = f64::from(vh_quarters) / 4.0;
            let viewport = Viewport::new(24.0, vh, dpr).expect("viewport");
            let rect = SelectionRect::from_origin_size(4.0, top, 12.0, f64::from(height));
            let document_height = top + f64::from(height + doc_slack);
            let segments = solid_segments(&rect, &viewport, 24, document_height);

            let compositor = composite(rect, viewport, &segments).expect("composite");
            prop_assert_eq!(compositor.blits().len(), segments.len());

            let blits = compositor.blits().to_vec();
            let image = compositor.into_image();
            prop_assert!(transparent_rows(&image, 0).is_empty());
            prop_assert!(transparent_rows(&image, image.width() - 1).is_empty());

            for op in &blits {
                let expected = band_color(op.band);
                for y in op.dest.y..op.dest.bottom() {
                    prop_assert_eq!(*image.get_pixel(0, y), expected, "row {}", y);
                    prop_assert_eq!(*image.get_pixel(image.width() - 1, y), expected, "row {}", y);
                }
            }
        }
    }
}
