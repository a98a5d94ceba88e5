//! Pixel conversions to RGBA8.
//!
//! Used by the encoder's fallback path for layouts the codec does not accept
//! directly, and by [`Image::to_rgba8`].

use alloc::vec::Vec;

use imgref::ImgVec;
use rgb::Rgba;

use crate::codecs::color::ycbcr_to_rgb;
use crate::image::{Image, YCbCrImage};

/// Convert any image layout to straight-alpha RGBA8.
///
/// 16-bit channels keep their high byte. Premultiplied alpha is undone.
/// CMYK uses the naive `(255 - c) * (255 - k) / 255` transform.
pub(crate) fn to_rgba8(image: &Image) -> ImgVec<Rgba<u8>> {
    match image {
        Image::Rgba8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            ImgVec::new(buf.into_owned(), w, h)
        }
        Image::PremultipliedRgba8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf.iter().map(|p| unpremultiply(*p)).collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Gray8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf
                .iter()
                .map(|p| {
                    let v = p.value();
                    Rgba::new(v, v, v, 255)
                })
                .collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Gray16(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf
                .iter()
                .map(|p| {
                    let v = (p.value() >> 8) as u8;
                    Rgba::new(v, v, v, 255)
                })
                .collect();
            ImgVec::new(rgba, w, h)
        }
        Image::GrayAlpha8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf.iter().map(|p| Rgba::new(p.v, p.v, p.v, p.a)).collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Rgb8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf.iter().map(|p| Rgba::new(p.r, p.g, p.b, 255)).collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Bgra8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf.iter().map(|p| Rgba::new(p.r, p.g, p.b, p.a)).collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Rgba16(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf
                .iter()
                .map(|p| {
                    Rgba::new(
                        (p.r >> 8) as u8,
                        (p.g >> 8) as u8,
                        (p.b >> 8) as u8,
                        (p.a >> 8) as u8,
                    )
                })
                .collect();
            ImgVec::new(rgba, w, h)
        }
        Image::Cmyk8(img) => {
            let (buf, w, h) = img.as_ref().to_contiguous_buf();
            let rgba: Vec<Rgba<u8>> = buf
                .iter()
                .map(|&[c, m, y, k]| {
                    let white = 255 - u32::from(k);
                    let ch = |v: u8| ((255 - u32::from(v)) * white / 255) as u8;
                    Rgba::new(ch(c), ch(m), ch(y), 255)
                })
                .collect();
            ImgVec::new(rgba, w, h)
        }
        Image::YCbCr(img) => ycbcr_to_rgba8(img),
    }
}

fn unpremultiply(p: Rgba<u8>) -> Rgba<u8> {
    match p.a {
        0 => Rgba::new(0, 0, 0, 0),
        255 => p,
        a => {
            let a32 = u32::from(a);
            let ch = |v: u8| ((u32::from(v) * 255 + a32 / 2) / a32).min(255) as u8;
            Rgba::new(ch(p.r), ch(p.g), ch(p.b), a)
        }
    }
}

/// Nearest-neighbor chroma lookup; the chroma sample covering each luma pixel.
fn ycbcr_to_rgba8(img: &YCbCrImage) -> ImgVec<Rgba<u8>> {
    let (fx, fy) = img.ratio().factors();
    let (w, h) = (img.width(), img.height());
    let (y, cb, cr) = (img.y(), img.cb(), img.cr());
    let mut out = Vec::with_capacity(w * h);
    for row in 0..h {
        let y_row = &y.buf()[row * y.stride()..][..w];
        let cb_row = &cb.buf()[(row / fy) * cb.stride()..];
        let cr_row = &cr.buf()[(row / fy) * cr.stride()..];
        for col in 0..w {
            let [r, g, b] = ycbcr_to_rgb(y_row[col], cb_row[col / fx], cr_row[col / fx]);
            out.push(Rgba::new(r, g, b, 255));
        }
    }
    ImgVec::new(out, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsample::SubsampleRatio;
    use alloc::vec;
    use rgb::alt::{BGRA, GrayAlpha};
    use rgb::{Gray, Rgb};

    #[test]
    fn rgb8_gets_opaque_alpha() {
        let img = Image::Rgb8(ImgVec::new(vec![Rgb::new(10, 20, 30); 2], 2, 1));
        let out = to_rgba8(&img);
        assert_eq!(out.buf(), &[Rgba::new(10, 20, 30, 255); 2]);
    }

    #[test]
    fn bgra_is_swizzled() {
        let px = BGRA {
            b: 1,
            g: 2,
            r: 3,
            a: 4,
        };
        let img = Image::Bgra8(ImgVec::new(vec![px], 1, 1));
        assert_eq!(to_rgba8(&img).buf()[0], Rgba::new(3, 2, 1, 4));
    }

    #[test]
    fn gray_variants_expand() {
        let g16 = Image::Gray16(ImgVec::new(vec![Gray::new(0xABCDu16)], 1, 1));
        assert_eq!(to_rgba8(&g16).buf()[0], Rgba::new(0xAB, 0xAB, 0xAB, 255));

        let ga = Image::GrayAlpha8(ImgVec::new(vec![GrayAlpha::new(7u8, 9u8)], 1, 1));
        assert_eq!(to_rgba8(&ga).buf()[0], Rgba::new(7, 7, 7, 9));
    }

    #[test]
    fn premultiplied_is_undone() {
        let img = Image::PremultipliedRgba8(ImgVec::new(
            vec![Rgba::new(64, 32, 0, 128), Rgba::new(9, 9, 9, 0)],
            2,
            1,
        ));
        let out = to_rgba8(&img);
        assert_eq!(out.buf()[0], Rgba::new(128, 64, 0, 128));
        assert_eq!(out.buf()[1], Rgba::new(0, 0, 0, 0));
    }

    #[test]
    fn cmyk_white_and_black() {
        let img = Image::Cmyk8(ImgVec::new(vec![[0, 0, 0, 0], [0, 0, 0, 255]], 2, 1));
        let out = to_rgba8(&img);
        assert_eq!(out.buf()[0], Rgba::new(255, 255, 255, 255));
        assert_eq!(out.buf()[1], Rgba::new(0, 0, 0, 255));
    }

    #[test]
    fn strided_input_is_compacted() {
        let buf = vec![
            Rgb::new(1, 1, 1),
            Rgb::new(2, 2, 2),
            Rgb::new(0, 0, 0),
            Rgb::new(3, 3, 3),
            Rgb::new(4, 4, 4),
            Rgb::new(0, 0, 0),
        ];
        let img = Image::Rgb8(ImgVec::new_stride(buf, 2, 2, 3));
        let out = to_rgba8(&img);
        assert_eq!(out.buf().len(), 4);
        assert_eq!(out.buf()[2], Rgba::new(3, 3, 3, 255));
    }

    #[test]
    fn neutral_ycbcr_is_gray() {
        let mut img = YCbCrImage::new(3, 3, SubsampleRatio::R420).unwrap();
        {
            let [mut y, mut cb, mut cr] = img.planes_mut();
            y.pixels_mut().for_each(|p| *p = 100);
            cb.pixels_mut().for_each(|p| *p = 128);
            cr.pixels_mut().for_each(|p| *p = 128);
        }
        let out = to_rgba8(&Image::YCbCr(img));
        assert!(out.pixels().all(|p| p == Rgba::new(100, 100, 100, 255)));
    }
}
