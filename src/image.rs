//! Typed in-memory images.
//!
//! [`Image`] is a closed set of pixel layouts. Four of them map directly onto
//! a codec input (gray, interleaved RGBA, CMYK, planar YCbCr); the rest are
//! converted to RGBA before encoding.

use alloc::vec;
use alloc::vec::Vec;

use imgref::{ImgRef, ImgRefMut, ImgVec};
use rgb::alt::{BGRA, GrayAlpha};
use rgb::{Gray, Rgb, Rgba};

use crate::colorspace::ColorModel;
use crate::error::JpegError;
use crate::subsample::{SubsampleGeometry, SubsampleRatio, geometry};

/// One CMYK pixel: cyan, magenta, yellow, key.
pub type Cmyk = [u8; 4];

/// An image in one of the supported pixel layouts.
///
/// The image exclusively owns its pixel buffers.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Image {
    Gray8(ImgVec<Gray<u8>>),
    /// Straight (non-premultiplied) alpha. Decoded RGB images use this with
    /// opaque alpha.
    Rgba8(ImgVec<Rgba<u8>>),
    /// Color channels premultiplied by alpha.
    PremultipliedRgba8(ImgVec<Rgba<u8>>),
    Cmyk8(ImgVec<Cmyk>),
    YCbCr(YCbCrImage),
    Rgb8(ImgVec<Rgb<u8>>),
    Bgra8(ImgVec<BGRA<u8>>),
    GrayAlpha8(ImgVec<GrayAlpha<u8>>),
    Gray16(ImgVec<Gray<u16>>),
    Rgba16(ImgVec<Rgba<u16>>),
}

/// Encoder-side classification of an [`Image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayoutClass {
    Grayscale,
    InterleavedRgb,
    Cmyk,
    PlanarYCbCr,
    /// Anything the codec does not take directly; converted to RGBA first.
    Other,
}

impl Image {
    /// Image width in pixels.
    pub fn width(&self) -> usize {
        match self {
            Image::Gray8(img) => img.width(),
            Image::Rgba8(img) | Image::PremultipliedRgba8(img) => img.width(),
            Image::Cmyk8(img) => img.width(),
            Image::YCbCr(img) => img.width(),
            Image::Rgb8(img) => img.width(),
            Image::Bgra8(img) => img.width(),
            Image::GrayAlpha8(img) => img.width(),
            Image::Gray16(img) => img.width(),
            Image::Rgba16(img) => img.width(),
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        match self {
            Image::Gray8(img) => img.height(),
            Image::Rgba8(img) | Image::PremultipliedRgba8(img) => img.height(),
            Image::Cmyk8(img) => img.height(),
            Image::YCbCr(img) => img.height(),
            Image::Rgb8(img) => img.height(),
            Image::Bgra8(img) => img.height(),
            Image::GrayAlpha8(img) => img.height(),
            Image::Gray16(img) => img.height(),
            Image::Rgba16(img) => img.height(),
        }
    }

    pub fn layout_class(&self) -> PixelLayoutClass {
        match self {
            Image::Gray8(_) => PixelLayoutClass::Grayscale,
            Image::Rgba8(_) | Image::PremultipliedRgba8(_) => PixelLayoutClass::InterleavedRgb,
            Image::Cmyk8(_) => PixelLayoutClass::Cmyk,
            Image::YCbCr(_) => PixelLayoutClass::PlanarYCbCr,
            Image::Rgb8(_)
            | Image::Bgra8(_)
            | Image::GrayAlpha8(_)
            | Image::Gray16(_)
            | Image::Rgba16(_) => PixelLayoutClass::Other,
        }
    }

    /// Color model for layouts the decoder can produce.
    pub fn color_model(&self) -> Option<ColorModel> {
        match self {
            Image::Gray8(_) => Some(ColorModel::Gray),
            Image::Rgba8(_) => Some(ColorModel::Rgba),
            Image::Cmyk8(_) => Some(ColorModel::Cmyk),
            Image::YCbCr(_) => Some(ColorModel::YCbCr),
            _ => None,
        }
    }

    /// Convert any layout to straight-alpha RGBA8.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        crate::convert::to_rgba8(self)
    }
}

/// Planar YCbCr image: a full-resolution luma plane and two chroma planes
/// sized by the subsampling ratio.
///
/// All three planes live in one packed buffer, luma first. Plane strides
/// equal plane widths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YCbCrImage {
    buf: Vec<u8>,
    geometry: SubsampleGeometry,
}

impl YCbCrImage {
    /// A zero-filled image.
    pub fn new(width: usize, height: usize, ratio: SubsampleRatio) -> Result<Self, JpegError> {
        let geometry = checked_geometry(width, height, ratio)?;
        let len = geometry
            .checked_total_len()
            .ok_or_else(|| JpegError::InvalidInput(alloc::format!("{width}x{height} overflows")))?;
        Ok(Self {
            buf: vec![0; len],
            geometry,
        })
    }

    /// Take ownership of a packed Y, Cb, Cr buffer laid out per `geometry`.
    pub(crate) fn from_packed(buf: Vec<u8>, geometry: SubsampleGeometry) -> Result<Self, JpegError> {
        if buf.len() != geometry.total_len() {
            return Err(JpegError::InvalidInput(alloc::format!(
                "packed YCbCr buffer is {} bytes, geometry needs {}",
                buf.len(),
                geometry.total_len()
            )));
        }
        Ok(Self { buf, geometry })
    }

    /// Copy three planes into a packed image.
    ///
    /// Chroma planes must have exactly the dimensions the ratio implies for
    /// the luma plane.
    pub fn from_planes(
        y: ImgRef<'_, u8>,
        cb: ImgRef<'_, u8>,
        cr: ImgRef<'_, u8>,
        ratio: SubsampleRatio,
    ) -> Result<Self, JpegError> {
        let mut out = Self::new(y.width(), y.height(), ratio)?;
        let g = out.geometry;
        for (name, plane) in [("Cb", &cb), ("Cr", &cr)] {
            if plane.width() != g.chroma_width || plane.height() != g.chroma_height {
                return Err(JpegError::InvalidInput(alloc::format!(
                    "{name} plane is {}x{}, {} chroma for {}x{} is {}x{}",
                    plane.width(),
                    plane.height(),
                    ratio,
                    g.luma_width,
                    g.luma_height,
                    g.chroma_width,
                    g.chroma_height
                )));
            }
        }
        let [mut dy, mut dcb, mut dcr] = out.planes_mut();
        copy_plane(y, &mut dy);
        copy_plane(cb, &mut dcb);
        copy_plane(cr, &mut dcr);
        Ok(out)
    }

    pub fn width(&self) -> usize {
        self.geometry.luma_width
    }

    pub fn height(&self) -> usize {
        self.geometry.luma_height
    }

    /// The subsampling ratio the chroma planes are laid out for.
    pub fn ratio(&self) -> SubsampleRatio {
        self.geometry.ratio
    }

    pub fn geometry(&self) -> SubsampleGeometry {
        self.geometry
    }

    pub fn y_stride(&self) -> usize {
        self.geometry.luma_width
    }

    pub fn c_stride(&self) -> usize {
        self.geometry.chroma_width
    }

    /// Luma plane.
    pub fn y(&self) -> ImgRef<'_, u8> {
        let [y_end, _, _] = self.geometry.plane_ends();
        ImgRef::new(&self.buf[..y_end], self.geometry.luma_width, self.geometry.luma_height)
    }

    /// Blue-difference chroma plane.
    pub fn cb(&self) -> ImgRef<'_, u8> {
        let [y_end, cb_end, _] = self.geometry.plane_ends();
        self.chroma(&self.buf[y_end..cb_end])
    }

    /// Red-difference chroma plane.
    pub fn cr(&self) -> ImgRef<'_, u8> {
        let [_, cb_end, cr_end] = self.geometry.plane_ends();
        self.chroma(&self.buf[cb_end..cr_end])
    }

    /// Mutable views of Y, Cb and Cr.
    pub fn planes_mut(&mut self) -> [ImgRefMut<'_, u8>; 3] {
        let g = self.geometry;
        let [y_end, cb_end, _] = g.plane_ends();
        let (y, rest) = self.buf.split_at_mut(y_end);
        let (cb, cr) = rest.split_at_mut(cb_end - y_end);
        [
            ImgRefMut::new(y, g.luma_width, g.luma_height),
            ImgRefMut::new(cb, g.chroma_width, g.chroma_height),
            ImgRefMut::new(cr, g.chroma_width, g.chroma_height),
        ]
    }

    /// The packed Y, Cb, Cr buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn chroma<'a>(&self, plane: &'a [u8]) -> ImgRef<'a, u8> {
        ImgRef::new(plane, self.geometry.chroma_width, self.geometry.chroma_height)
    }
}

fn checked_geometry(
    width: usize,
    height: usize,
    ratio: SubsampleRatio,
) -> Result<SubsampleGeometry, JpegError> {
    if width == 0 || height == 0 {
        return Err(JpegError::InvalidInput(alloc::format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(geometry(width, height, ratio))
}

fn copy_plane(src: ImgRef<'_, u8>, dst: &mut ImgRefMut<'_, u8>) {
    for (src_row, dst_row) in src.rows().zip(dst.rows_mut()) {
        dst_row.copy_from_slice(src_row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_classes() {
        let gray = Image::Gray8(ImgVec::new(vec![Gray::new(0u8); 4], 2, 2));
        assert_eq!(gray.layout_class(), PixelLayoutClass::Grayscale);

        let rgba = Image::PremultipliedRgba8(ImgVec::new(vec![Rgba::new(0, 0, 0, 0); 4], 2, 2));
        assert_eq!(rgba.layout_class(), PixelLayoutClass::InterleavedRgb);

        let cmyk = Image::Cmyk8(ImgVec::new(vec![[0u8; 4]; 4], 2, 2));
        assert_eq!(cmyk.layout_class(), PixelLayoutClass::Cmyk);

        let ycc = Image::YCbCr(YCbCrImage::new(2, 2, SubsampleRatio::R420).unwrap());
        assert_eq!(ycc.layout_class(), PixelLayoutClass::PlanarYCbCr);

        let rgb = Image::Rgb8(ImgVec::new(vec![Rgb::new(1, 2, 3); 6], 3, 2));
        assert_eq!(rgb.layout_class(), PixelLayoutClass::Other);
        assert_eq!((rgb.width(), rgb.height()), (3, 2));
        assert_eq!(rgb.color_model(), None);
    }

    #[test]
    fn planes_slice_packed_buffer() {
        let mut img = YCbCrImage::new(5, 3, SubsampleRatio::R420).unwrap();
        assert_eq!(img.as_bytes().len(), 15 + 2 * 6);
        {
            let [mut y, mut cb, mut cr] = img.planes_mut();
            y.pixels_mut().for_each(|p| *p = 10);
            cb.pixels_mut().for_each(|p| *p = 20);
            cr.pixels_mut().for_each(|p| *p = 30);
        }
        assert_eq!((img.y().width(), img.y().height()), (5, 3));
        assert_eq!((img.cb().width(), img.cb().height()), (3, 2));
        assert!(img.y().pixels().all(|p| p == 10));
        assert!(img.cb().pixels().all(|p| p == 20));
        assert!(img.cr().pixels().all(|p| p == 30));
        assert_eq!(img.y_stride(), 5);
        assert_eq!(img.c_stride(), 3);
    }

    #[test]
    fn from_planes_copies_strided_input() {
        // Luma with stride 4 for a 3-wide image.
        let y_buf = [1, 2, 3, 99, 4, 5, 6, 99];
        let y = ImgRef::new_stride(&y_buf[..], 3, 2, 4);
        let cb_buf = [7, 8];
        let cr_buf = [9, 10];
        let cb = ImgRef::new(&cb_buf[..], 2, 1);
        let cr = ImgRef::new(&cr_buf[..], 2, 1);

        let img = YCbCrImage::from_planes(y, cb, cr, SubsampleRatio::R420).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn from_planes_rejects_wrong_chroma_size() {
        let y_buf = [0u8; 16];
        let c_buf = [0u8; 16];
        let y = ImgRef::new(&y_buf[..], 4, 4);
        let c = ImgRef::new(&c_buf[..], 4, 4);
        let err = YCbCrImage::from_planes(y, c, c, SubsampleRatio::R420).unwrap_err();
        assert!(matches!(err, JpegError::InvalidInput(_)));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(YCbCrImage::new(0, 4, SubsampleRatio::R444).is_err());
        assert!(YCbCrImage::new(4, 0, SubsampleRatio::R444).is_err());
    }

    #[test]
    fn packed_length_checked() {
        let g = geometry(2, 2, SubsampleRatio::R444);
        assert!(YCbCrImage::from_packed(vec![0; 12], g).is_ok());
        assert!(YCbCrImage::from_packed(vec![0; 11], g).is_err());
    }
}
