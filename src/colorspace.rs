//! Colorspace descriptor table.
//!
//! Maps the numeric colorspace ids reported by the codec to channel count,
//! plane arrangement, and the color model of the image the adapter builds.
//! The table is a `static` and is never mutated.

use crate::error::JpegError;

/// JPEG colorspace as reported by the codec.
///
/// Discriminants are the ids used on the codec boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Colorspace {
    Grayscale = 1,
    Rgb = 2,
    YCbCr = 3,
    Cmyk = 4,
    Ycck = 5,
}

/// Color model of the image produced for a colorspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// 8-bit single channel.
    Gray,
    /// 8-bit interleaved RGBA.
    Rgba,
    /// Three 8-bit planes, chroma possibly subsampled.
    YCbCr,
    /// 8-bit interleaved CMYK.
    Cmyk,
}

/// How the decoded pixel buffer is arranged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaneLayout {
    /// One buffer, `bytes_per_pixel` bytes per pixel, rows packed.
    Interleaved { bytes_per_pixel: usize },
    /// Luma plane followed by two chroma planes sized by the subsampling ratio.
    Planar,
}

/// Static description of a colorspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorspaceDescriptor {
    pub colorspace: Colorspace,
    /// Color channels in the compressed stream.
    pub channels: usize,
    pub layout: PlaneLayout,
    pub color_model: ColorModel,
}

static DESCRIPTORS: [ColorspaceDescriptor; 5] = [
    ColorspaceDescriptor {
        colorspace: Colorspace::Grayscale,
        channels: 1,
        layout: PlaneLayout::Interleaved { bytes_per_pixel: 1 },
        color_model: ColorModel::Gray,
    },
    // RGB is delivered with an opaque alpha byte so rows stay 4-byte aligned.
    ColorspaceDescriptor {
        colorspace: Colorspace::Rgb,
        channels: 3,
        layout: PlaneLayout::Interleaved { bytes_per_pixel: 4 },
        color_model: ColorModel::Rgba,
    },
    ColorspaceDescriptor {
        colorspace: Colorspace::YCbCr,
        channels: 3,
        layout: PlaneLayout::Planar,
        color_model: ColorModel::YCbCr,
    },
    ColorspaceDescriptor {
        colorspace: Colorspace::Cmyk,
        channels: 4,
        layout: PlaneLayout::Interleaved { bytes_per_pixel: 4 },
        color_model: ColorModel::Cmyk,
    },
    // YCCK is converted to CMYK by the codec.
    ColorspaceDescriptor {
        colorspace: Colorspace::Ycck,
        channels: 4,
        layout: PlaneLayout::Interleaved { bytes_per_pixel: 4 },
        color_model: ColorModel::Cmyk,
    },
];

/// Look up the descriptor for a codec colorspace id.
///
/// Fails closed: any id outside the table is
/// [`JpegError::UnsupportedColorspace`].
pub fn describe(id: u32) -> Result<&'static ColorspaceDescriptor, JpegError> {
    DESCRIPTORS
        .iter()
        .find(|d| d.colorspace.id() == id)
        .ok_or(JpegError::UnsupportedColorspace(id))
}

impl Colorspace {
    /// Numeric id used on the codec boundary.
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Parse a codec id.
    pub fn from_id(id: u32) -> Option<Self> {
        describe(id).ok().map(|d| d.colorspace)
    }

    /// The static descriptor for this colorspace.
    pub fn descriptor(self) -> &'static ColorspaceDescriptor {
        // Ids are 1-based and the table is in id order.
        &DESCRIPTORS[self.id() as usize - 1]
    }
}

impl ColorspaceDescriptor {
    /// Bytes per pixel for interleaved layouts, `None` for planar.
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self.layout {
            PlaneLayout::Interleaved { bytes_per_pixel } => Some(bytes_per_pixel),
            PlaneLayout::Planar => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts() {
        assert_eq!(describe(1).unwrap().channels, 1);
        assert_eq!(describe(2).unwrap().channels, 3);
        assert_eq!(describe(3).unwrap().channels, 3);
        assert_eq!(describe(4).unwrap().channels, 4);
        assert_eq!(describe(5).unwrap().channels, 4);
    }

    #[test]
    fn unknown_ids_fail_closed() {
        for id in [0, 6, 7, 255, u32::MAX] {
            assert!(matches!(
                describe(id),
                Err(JpegError::UnsupportedColorspace(got)) if got == id
            ));
        }
    }

    #[test]
    fn table_is_in_id_order() {
        for (i, d) in DESCRIPTORS.iter().enumerate() {
            assert_eq!(d.colorspace.id() as usize, i + 1);
            assert_eq!(d.colorspace.descriptor(), d);
        }
    }

    #[test]
    fn ycck_decodes_as_cmyk() {
        let d = Colorspace::Ycck.descriptor();
        assert_eq!(d.color_model, ColorModel::Cmyk);
        assert_eq!(d.bytes_per_pixel(), Some(4));
    }

    #[test]
    fn ycbcr_is_planar() {
        let d = describe(Colorspace::YCbCr.id()).unwrap();
        assert_eq!(d.layout, PlaneLayout::Planar);
        assert_eq!(d.bytes_per_pixel(), None);
        assert_eq!(Colorspace::from_id(3), Some(Colorspace::YCbCr));
        assert_eq!(Colorspace::from_id(9), None);
    }
}
