//! Encoder adapter: layout dispatch, buffer assembly and codec output
//! release.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};
use imgref::ImgVec;
use log::debug;

use crate::codecs::JpegCodec;
use crate::colorspace::Colorspace;
use crate::config::EncodeConfig;
use crate::error::JpegError;
use crate::image::{Image, PixelLayoutClass};
use crate::io::ByteSink;
use crate::native::{CompressInput, NativeCodec, PixelPlanes};
use crate::subsample::SubsampleRatio;

/// JPEG encode request builder.
///
/// # Example
///
/// ```no_run
/// use zenjpegshim::{EncodeRequest, Image};
/// use zenjpegshim::imgref::ImgVec;
/// use zenjpegshim::rgb::Rgba;
///
/// let pixels = ImgVec::new(vec![Rgba::new(0u8, 0, 0, 255); 64 * 64], 64, 64);
/// let jpeg = EncodeRequest::new()
///     .with_quality(90)
///     .encode_to_vec(&Image::Rgba8(pixels))?;
/// # Ok::<(), zenjpegshim::JpegError>(())
/// ```
pub struct EncodeRequest<'a> {
    config: EncodeConfig,
    stop: Option<&'a dyn Stop>,
}

impl Default for EncodeRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EncodeRequest<'a> {
    pub fn new() -> Self {
        Self {
            config: EncodeConfig::default(),
            stop: None,
        }
    }

    /// Set encoding options.
    pub fn with_config(mut self, config: EncodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set quality (1-100).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    /// Set the chroma ratio for RGB input.
    pub fn with_chroma_subsampling(mut self, ratio: SubsampleRatio) -> Self {
        self.config.chroma_subsampling = ratio;
        self
    }

    /// Set a cancellation token.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Encode with the default backend and hand the bytes to `sink`.
    pub fn encode(self, image: &Image, sink: impl ByteSink) -> Result<(), JpegError> {
        self.encode_with(&JpegCodec, image, sink)
    }

    /// Encode with the default backend into a new buffer.
    pub fn encode_to_vec(self, image: &Image) -> Result<Vec<u8>, JpegError> {
        self.encode_to_vec_with(&JpegCodec, image)
    }

    /// Encode with any codec and hand the bytes to `sink`.
    pub fn encode_with<C: NativeCodec + ?Sized>(
        self,
        codec: &C,
        image: &Image,
        mut sink: impl ByteSink,
    ) -> Result<(), JpegError> {
        let bytes = self.encode_to_vec_with(codec, image)?;
        sink.write(&bytes).map_err(JpegError::Write)
    }

    /// Encode with any codec into a new buffer.
    pub fn encode_to_vec_with<C: NativeCodec + ?Sized>(
        self,
        codec: &C,
        image: &Image,
    ) -> Result<Vec<u8>, JpegError> {
        let stop = self.stop.unwrap_or(&Unstoppable);
        stop.check()?;

        let (width, height) = checked_dimensions(image)?;
        let requested = self.config.chroma_subsampling;
        let class = image.layout_class();

        // Owns converted pixels for the fallback path.
        let fallback: ImgVec<rgb::Rgba<u8>>;
        let (data, colorspace, subsampling) = match image {
            Image::Gray8(img) => (contiguous_bytes(img), Colorspace::Grayscale, SubsampleRatio::R444),
            Image::Rgba8(img) | Image::PremultipliedRgba8(img) => {
                (contiguous_bytes(img), Colorspace::Rgb, requested)
            }
            Image::Cmyk8(img) => (contiguous_bytes(img), Colorspace::Cmyk, SubsampleRatio::R444),
            Image::YCbCr(img) => {
                // The image's own ratio wins over the requested one.
                if img.ratio() != requested {
                    debug!(
                        "encoding YCbCr with its own {} chroma, ignoring requested {requested}",
                        img.ratio()
                    );
                }
                (Cow::Borrowed(img.as_bytes()), Colorspace::YCbCr, img.ratio())
            }
            _ => {
                debug_assert_eq!(class, PixelLayoutClass::Other);
                fallback = image.to_rgba8();
                (contiguous_bytes(&fallback), Colorspace::Rgb, requested)
            }
        };

        let planes = match image {
            Image::YCbCr(img) => {
                let [y_end, cb_end, cr_end] = img.geometry().plane_ends();
                PixelPlanes::Planar {
                    y: &data[..y_end],
                    cb: &data[y_end..cb_end],
                    cr: &data[cb_end..cr_end],
                }
            }
            _ => PixelPlanes::Interleaved(&data),
        };
        let input = CompressInput {
            planes,
            width,
            height,
            colorspace,
            subsampling,
        };
        debug!(
            "jpeg encode {width}x{height} {class:?} as {colorspace:?} {subsampling}, quality {}",
            self.config.quality
        );

        stop.check()?;
        let buffer = codec.compress(&input, &self.config);
        let compressed = buffer.as_ref();
        if compressed.is_empty() {
            drop(buffer);
            return Err(JpegError::EncodeFailure(alloc::format!(
                "codec produced no output for {width}x{height} {colorspace:?}"
            )));
        }
        let out = compressed.to_vec();
        drop(buffer);
        debug!("jpeg encoded {} bytes", out.len());
        Ok(out)
    }
}

fn checked_dimensions(image: &Image) -> Result<(u32, u32), JpegError> {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return Err(JpegError::InvalidInput(alloc::format!(
            "cannot encode empty image {w}x{h}"
        )));
    }
    let width = u32::try_from(w)
        .map_err(|_| JpegError::InvalidInput(alloc::format!("width {w} out of range")))?;
    let height = u32::try_from(h)
        .map_err(|_| JpegError::InvalidInput(alloc::format!("height {h} out of range")))?;
    Ok((width, height))
}

/// Tightly packed pixel bytes, borrowed when the image has no row padding.
fn contiguous_bytes<P: bytemuck::Pod>(img: &ImgVec<P>) -> Cow<'_, [u8]> {
    let (buf, _, _) = img.as_ref().to_contiguous_buf();
    match buf {
        Cow::Borrowed(pixels) => Cow::Borrowed(bytemuck::cast_slice(pixels)),
        Cow::Owned(pixels) => Cow::Owned(bytemuck::cast_slice(&pixels).to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rgb::{Gray, Rgb};

    #[test]
    fn builder_pattern() {
        let request = EncodeRequest::new()
            .with_quality(90)
            .with_chroma_subsampling(SubsampleRatio::R444);
        assert_eq!(request.config.quality, 90);
        assert_eq!(request.config.chroma_subsampling, SubsampleRatio::R444);
    }

    #[test]
    fn padded_rows_are_packed() {
        let buf = vec![
            Rgb::new(1u8, 2, 3),
            Rgb::new(0, 0, 0),
            Rgb::new(4, 5, 6),
            Rgb::new(0, 0, 0),
        ];
        let img = ImgVec::new_stride(buf, 1, 2, 2);
        assert_eq!(&*contiguous_bytes(&img), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unpadded_rows_are_borrowed() {
        let img = ImgVec::new(vec![Gray::new(7u8); 4], 2, 2);
        assert!(matches!(contiguous_bytes(&img), Cow::Borrowed(_)));
    }
}
