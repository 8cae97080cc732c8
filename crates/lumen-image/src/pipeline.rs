//! Decode-once raster pipeline.
//!
//! [`ImagePipeline`] owns the untouched source bytes and the decoded raster.
//! Probing it and deriving resized renditions only ever read the shared
//! raster, so any number of derivations can run from the same pipeline,
//! in any order, without observing one another.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::error::ImageFormatHint;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::{Error, Result, TRACING_TARGET, VariantSize};

/// Default JPEG quality for derived renditions.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Intrinsic properties of a raster, measured from encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoded size in bytes.
    pub byte_size: u64,
    /// Encoded container format.
    pub format: ImageFormat,
}

/// One encoded rendition of a source image.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    /// Size tag this rendition was produced for.
    pub size: VariantSize,
    /// Encoded image bytes.
    pub data: Bytes,
    /// Properties measured from `data`.
    pub info: RasterInfo,
}

impl RenderedVariant {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Size in bytes.
    pub fn byte_size(&self) -> u64 {
        self.info.byte_size
    }

    /// Returns the MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        self.info.format.to_mime_type()
    }
}

/// A decoded source image that derivations clone from.
#[derive(Debug)]
pub struct ImagePipeline {
    source: Bytes,
    raster: DynamicImage,
    info: RasterInfo,
    jpeg_quality: u8,
}

impl ImagePipeline {
    /// Decodes `source`, sniffing its format from the leading bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the bytes are not a raster
    /// image this build can decode.
    pub fn decode(source: Bytes) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(&source[..]))
            .with_guessed_format()
            .map_err(|e| Error::unsupported_with_source("unreadable source", e.into()))?;

        let Some(format) = reader.format() else {
            return Err(Error::unsupported("unrecognized image signature"));
        };

        let raster = reader
            .decode()
            .map_err(|e| Error::unsupported_with_source(format!("cannot decode {format:?}"), e))?;

        let info = RasterInfo {
            width: raster.width(),
            height: raster.height(),
            byte_size: source.len() as u64,
            format,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            format = ?format,
            width = info.width,
            height = info.height,
            bytes = info.byte_size,
            "source decoded"
        );

        Ok(Self {
            source,
            raster,
            info,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        })
    }

    /// Sets the JPEG quality (1-100) used for derived renditions.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Returns the properties of the source. Does not touch the raster.
    pub fn metadata(&self) -> RasterInfo {
        self.info
    }

    /// Returns the detected source format.
    pub fn format(&self) -> ImageFormat {
        self.info.format
    }

    /// Produces the rendition for `size`.
    ///
    /// [`VariantSize::Full`] reuses the source bytes verbatim; the other
    /// sizes are resized so the long edge matches the size's target,
    /// preserving aspect ratio, then re-encoded in the source format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the rendition cannot be encoded or the
    /// encoded bytes cannot be measured.
    pub fn render(&self, size: VariantSize) -> Result<RenderedVariant> {
        let Some(target) = size.target_long_edge() else {
            return Ok(RenderedVariant {
                size,
                data: self.source.clone(),
                info: self.info,
            });
        };

        let resized = self.raster.resize(target, target, FilterType::Lanczos3);
        let data = self.encode(resized).map_err(|e| Error::encoding(size, e))?;
        let info = measure(&data).map_err(|e| Error::encoding(size, e))?;

        tracing::debug!(
            target: TRACING_TARGET,
            size = %size,
            width = info.width,
            height = info.height,
            bytes = info.byte_size,
            "variant rendered"
        );

        Ok(RenderedVariant { size, data, info })
    }

    fn encode(&self, image: DynamicImage) -> image::ImageResult<Bytes> {
        let format = self.info.format;
        let image = prepare_for(format, image);
        let mut buf = Vec::new();

        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                image.write_with_encoder(encoder)?;
            }
            _ => image.write_to(&mut Cursor::new(&mut buf), format)?,
        }

        Ok(Bytes::from(buf))
    }
}

/// Converts `image` into a color layout the encoder for `format` accepts.
fn prepare_for(format: ImageFormat, image: DynamicImage) -> DynamicImage {
    let is_float = matches!(
        image,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    );

    match format {
        ImageFormat::Png if !is_float => image,
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.into_rgb8()),
        _ if image.color().has_alpha() => DynamicImage::ImageRgba8(image.into_rgba8()),
        _ => DynamicImage::ImageRgb8(image.into_rgb8()),
    }
}

/// Reads dimensions back out of encoded bytes.
pub fn measure(data: &[u8]) -> image::ImageResult<RasterInfo> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| image::ImageError::Unsupported(ImageFormatHint::Unknown.into()))?;
    let (width, height) = reader.into_dimensions()?;

    Ok(RasterInfo {
        width,
        height,
        byte_size: data.len() as u64,
        format,
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn encode(image: DynamicImage, format: ImageFormat) -> Bytes {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        Bytes::from(buf)
    }

    fn jpeg(width: u32, height: u32) -> Bytes {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        });
        encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
    }

    #[test]
    fn full_reuses_source_bytes() {
        let source = jpeg(400, 300);
        let pipeline = ImagePipeline::decode(source.clone()).unwrap();
        let full = pipeline.render(VariantSize::Full).unwrap();

        assert_eq!(full.data, source);
        assert_eq!((full.width(), full.height()), (400, 300));
        assert_eq!(full.byte_size(), source.len() as u64);
        assert_eq!(full.mime_type(), "image/jpeg");
    }

    #[test]
    fn derived_sizes_match_long_edge() {
        let pipeline = ImagePipeline::decode(jpeg(1600, 1200)).unwrap();

        let sm = pipeline.render(VariantSize::Sm).unwrap();
        assert_eq!((sm.width(), sm.height()), (360, 270));

        let lg = pipeline.render(VariantSize::Lg).unwrap();
        assert_eq!((lg.width(), lg.height()), (1080, 810));
        assert_eq!(lg.info.format, ImageFormat::Jpeg);
        assert_eq!(lg.byte_size(), lg.data.len() as u64);
    }

    #[test]
    fn portrait_sources_scale_the_height() {
        let pipeline = ImagePipeline::decode(jpeg(600, 1200)).unwrap();
        let md = pipeline.render(VariantSize::Md).unwrap();
        assert_eq!((md.width(), md.height()), (360, 720));
    }

    #[test]
    fn renders_do_not_disturb_each_other() {
        let pipeline = ImagePipeline::decode(jpeg(800, 400)).unwrap();
        let first = pipeline.render(VariantSize::Sm).unwrap();
        let _ = pipeline.render(VariantSize::Lg).unwrap();
        let again = pipeline.render(VariantSize::Sm).unwrap();

        assert_eq!(first.data, again.data);
        assert_eq!(pipeline.metadata().width, 800);
    }

    #[test]
    fn png_with_alpha_stays_png() {
        let image = RgbaImage::from_pixel(50, 100, Rgba([10, 20, 30, 128]));
        let pipeline =
            ImagePipeline::decode(encode(DynamicImage::ImageRgba8(image), ImageFormat::Png))
                .unwrap();
        let sm = pipeline.render(VariantSize::Sm).unwrap();

        assert_eq!(sm.info.format, ImageFormat::Png);
        assert_eq!((sm.width(), sm.height()), (180, 360));
    }

    #[test]
    fn garbage_is_unsupported() {
        let err =
            ImagePipeline::decode(Bytes::from_static(b"definitely not an image")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
