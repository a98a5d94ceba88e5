//! Chroma subsampling ratios and plane geometry.
//!
//! The adapter, not the codec, slices the single decoded buffer into luma and
//! chroma planes, so these sizes must match the codec's own geometry exactly:
//! chroma dimensions are the full dimensions divided by the decimation factor,
//! rounded up.

use crate::error::JpegError;

/// Chroma subsampling ratio.
///
/// Discriminants are the ids used on the codec boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SubsampleRatio {
    /// Full-resolution chroma.
    R444 = 0,
    /// Half horizontal chroma resolution.
    R422 = 1,
    /// Half horizontal and half vertical chroma resolution.
    #[default]
    R420 = 2,
    /// Half vertical chroma resolution.
    R440 = 3,
    /// Quarter horizontal chroma resolution.
    R411 = 4,
    /// Quarter horizontal and half vertical chroma resolution.
    R410 = 5,
}

/// All ratios in id order.
pub static RATIOS: [SubsampleRatio; 6] = [
    SubsampleRatio::R444,
    SubsampleRatio::R422,
    SubsampleRatio::R420,
    SubsampleRatio::R440,
    SubsampleRatio::R411,
    SubsampleRatio::R410,
];

impl SubsampleRatio {
    /// Numeric id used on the codec boundary.
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Parse a codec id. Unknown ids are an error, never a default.
    pub fn from_id(id: u32) -> Result<Self, JpegError> {
        RATIOS
            .get(id as usize)
            .copied()
            .ok_or(JpegError::UnsupportedSubsampling(id))
    }

    /// Horizontal and vertical chroma decimation factors.
    pub const fn factors(self) -> (usize, usize) {
        match self {
            SubsampleRatio::R444 => (1, 1),
            SubsampleRatio::R422 => (2, 1),
            SubsampleRatio::R420 => (2, 2),
            SubsampleRatio::R440 => (1, 2),
            SubsampleRatio::R411 => (4, 1),
            SubsampleRatio::R410 => (4, 2),
        }
    }

    /// Map luma (h, v) sampling factors relative to chroma (h, v) factors.
    ///
    /// Returns `None` for combinations outside the ratio table.
    pub fn from_sampling_factors(luma: (u8, u8), chroma: (u8, u8)) -> Option<Self> {
        let (lh, lv) = (usize::from(luma.0), usize::from(luma.1));
        let (ch, cv) = (usize::from(chroma.0), usize::from(chroma.1));
        if ch == 0 || cv == 0 || lh % ch != 0 || lv % cv != 0 {
            return None;
        }
        let factors = (lh / ch, lv / cv);
        RATIOS.iter().copied().find(|r| r.factors() == factors)
    }
}

impl core::fmt::Display for SubsampleRatio {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SubsampleRatio::R444 => "4:4:4",
            SubsampleRatio::R422 => "4:2:2",
            SubsampleRatio::R420 => "4:2:0",
            SubsampleRatio::R440 => "4:4:0",
            SubsampleRatio::R411 => "4:1:1",
            SubsampleRatio::R410 => "4:1:0",
        };
        f.write_str(s)
    }
}

/// Luma and chroma plane dimensions for an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubsampleGeometry {
    pub ratio: SubsampleRatio,
    pub luma_width: usize,
    pub luma_height: usize,
    pub chroma_width: usize,
    pub chroma_height: usize,
}

/// Compute plane geometry for a full-resolution image.
pub fn geometry(width: usize, height: usize, ratio: SubsampleRatio) -> SubsampleGeometry {
    let (fx, fy) = ratio.factors();
    SubsampleGeometry {
        ratio,
        luma_width: width,
        luma_height: height,
        chroma_width: width.div_ceil(fx),
        chroma_height: height.div_ceil(fy),
    }
}

impl SubsampleGeometry {
    /// Pixels in the luma plane.
    pub fn luma_len(&self) -> usize {
        self.luma_width * self.luma_height
    }

    /// Pixels in one chroma plane.
    pub fn chroma_len(&self) -> usize {
        self.chroma_width * self.chroma_height
    }

    /// Bytes for luma plus both chroma planes, or `None` on overflow.
    pub fn checked_total_len(&self) -> Option<usize> {
        let luma = self.luma_width.checked_mul(self.luma_height)?;
        let chroma = self.chroma_width.checked_mul(self.chroma_height)?;
        luma.checked_add(chroma.checked_mul(2)?)
    }

    /// Bytes for luma plus both chroma planes.
    pub fn total_len(&self) -> usize {
        self.luma_len() + 2 * self.chroma_len()
    }

    /// Byte offsets of the end of Y, Cb and Cr within a packed buffer.
    pub fn plane_ends(&self) -> [usize; 3] {
        let y = self.luma_len();
        let c = self.chroma_len();
        [y, y + c, y + 2 * c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chroma(w: usize, h: usize, r: SubsampleRatio) -> (usize, usize) {
        let g = geometry(w, h, r);
        (g.chroma_width, g.chroma_height)
    }

    #[test]
    fn even_dimensions() {
        assert_eq!(chroma(6, 4, SubsampleRatio::R420), (3, 2));
        assert_eq!(chroma(6, 4, SubsampleRatio::R422), (3, 4));
        assert_eq!(chroma(6, 4, SubsampleRatio::R444), (6, 4));
        assert_eq!(chroma(6, 4, SubsampleRatio::R440), (6, 2));
        assert_eq!(chroma(8, 4, SubsampleRatio::R411), (2, 4));
        assert_eq!(chroma(8, 4, SubsampleRatio::R410), (2, 2));
    }

    #[test]
    fn odd_dimensions_round_up() {
        assert_eq!(chroma(5, 4, SubsampleRatio::R420), (3, 2));
        assert_eq!(chroma(5, 5, SubsampleRatio::R420), (3, 3));
        assert_eq!(chroma(5, 3, SubsampleRatio::R411), (2, 3));
        assert_eq!(chroma(9, 3, SubsampleRatio::R410), (3, 2));
    }

    #[test]
    fn chroma_never_zero() {
        for &r in &RATIOS {
            let (cw, ch) = chroma(1, 1, r);
            assert_eq!((cw, ch), (1, 1), "{r}");
        }
    }

    #[test]
    fn luma_matches_image() {
        let g = geometry(7, 3, SubsampleRatio::R420);
        assert_eq!((g.luma_width, g.luma_height), (7, 3));
        assert_eq!(g.luma_len(), 21);
        assert_eq!(g.chroma_len(), 8);
        assert_eq!(g.total_len(), 37);
        assert_eq!(g.checked_total_len(), Some(37));
        assert_eq!(g.plane_ends(), [21, 29, 37]);
    }

    #[test]
    fn ids_round_trip_through_table() {
        for &r in &RATIOS {
            assert_eq!(SubsampleRatio::from_id(r.id()).unwrap(), r);
        }
        assert!(matches!(
            SubsampleRatio::from_id(6),
            Err(JpegError::UnsupportedSubsampling(6))
        ));
    }

    #[test]
    fn sampling_factors() {
        use SubsampleRatio::*;
        assert_eq!(SubsampleRatio::from_sampling_factors((1, 1), (1, 1)), Some(R444));
        assert_eq!(SubsampleRatio::from_sampling_factors((2, 2), (2, 2)), Some(R444));
        assert_eq!(SubsampleRatio::from_sampling_factors((2, 1), (1, 1)), Some(R422));
        assert_eq!(SubsampleRatio::from_sampling_factors((2, 2), (1, 1)), Some(R420));
        assert_eq!(SubsampleRatio::from_sampling_factors((1, 2), (1, 1)), Some(R440));
        assert_eq!(SubsampleRatio::from_sampling_factors((4, 1), (1, 1)), Some(R411));
        assert_eq!(SubsampleRatio::from_sampling_factors((4, 2), (1, 1)), Some(R410));
        assert_eq!(SubsampleRatio::from_sampling_factors((3, 1), (1, 1)), None);
        assert_eq!(SubsampleRatio::from_sampling_factors((1, 1), (2, 2)), None);
    }

    #[test]
    fn overflow_is_detected() {
        let g = geometry(usize::MAX, 2, SubsampleRatio::R444);
        assert_eq!(g.checked_total_len(), None);
    }
}
