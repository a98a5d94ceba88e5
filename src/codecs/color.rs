//! JFIF color conversion and chroma resampling helpers.
//!
//! Conversions use full-range BT.601 (the JFIF convention) in 16.16 fixed
//! point.

use alloc::vec::Vec;

use crate::subsample::SubsampleGeometry;

const FIX: i32 = 1 << 16;
const HALF: i32 = 1 << 15;

const fn fix(v: f64) -> i32 {
    (v * FIX as f64 + 0.5) as i32
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Full-range YCbCr to RGB.
#[inline]
pub(crate) fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = i32::from(y) * FIX + HALF;
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let r = (y + fix(1.402) * cr) >> 16;
    let g = (y - fix(0.344_136) * cb - fix(0.714_136) * cr) >> 16;
    let b = (y + fix(1.772) * cb) >> 16;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

/// Split interleaved Y, Cb, Cr samples (3 bytes per pixel, chroma at
/// full resolution) into a packed buffer laid out per `geometry`,
/// box-averaging chroma over each decimation block.
pub(crate) fn split_ycbcr(interleaved: &[u8], geometry: &SubsampleGeometry, out: &mut [u8]) {
    let (w, h) = (geometry.luma_width, geometry.luma_height);
    let [y_end, cb_end, _] = geometry.plane_ends();
    let (y_plane, chroma) = out.split_at_mut(y_end);
    let (cb_plane, cr_plane) = chroma.split_at_mut(cb_end - y_end);

    let mut full_cb = Vec::with_capacity(w * h);
    let mut full_cr = Vec::with_capacity(w * h);
    for (px, y_out) in interleaved.chunks_exact(3).zip(y_plane.iter_mut()) {
        *y_out = px[0];
        full_cb.push(px[1]);
        full_cr.push(px[2]);
    }
    downsample_plane(&full_cb, geometry, cb_plane);
    downsample_plane(&full_cr, geometry, cr_plane);
}

/// Box-average a full-resolution chroma plane down to the chroma geometry.
/// Edge blocks average only the pixels that exist.
pub(crate) fn downsample_plane(full: &[u8], geometry: &SubsampleGeometry, out: &mut [u8]) {
    let (fx, fy) = geometry.ratio.factors();
    let (w, h) = (geometry.luma_width, geometry.luma_height);
    let cw = geometry.chroma_width;
    for cy in 0..geometry.chroma_height {
        let y0 = cy * fy;
        let y1 = (y0 + fy).min(h);
        for cx in 0..cw {
            let x0 = cx * fx;
            let x1 = (x0 + fx).min(w);
            let mut sum = 0u32;
            for row in full[y0 * w..y1 * w].chunks_exact(w) {
                sum += row[x0..x1].iter().map(|&v| u32::from(v)).sum::<u32>();
            }
            let n = ((y1 - y0) * (x1 - x0)) as u32;
            out[cy * cw + cx] = ((sum + n / 2) / n) as u8;
        }
    }
}

/// Expand packed planes to interleaved Y, Cb, Cr (3 bytes per pixel),
/// replicating each chroma sample over its decimation block.
pub(crate) fn interleave_ycbcr(packed: &[u8], geometry: &SubsampleGeometry) -> Vec<u8> {
    let (fx, fy) = geometry.ratio.factors();
    let (w, h) = (geometry.luma_width, geometry.luma_height);
    let cw = geometry.chroma_width;
    let [y_end, cb_end, cr_end] = geometry.plane_ends();
    let (y_plane, cb_plane, cr_plane) = (
        &packed[..y_end],
        &packed[y_end..cb_end],
        &packed[cb_end..cr_end],
    );
    let mut out = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let c_row = (row / fy) * cw;
        for col in 0..w {
            let c = c_row + col / fx;
            out.extend_from_slice(&[y_plane[row * w + col], cb_plane[c], cr_plane[c]]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsample::{SubsampleRatio, geometry};
    use alloc::vec;

    #[test]
    fn primaries_from_ycbcr() {
        assert_eq!(ycbcr_to_rgb(76, 85, 255), [254, 0, 0]);
        assert_eq!(ycbcr_to_rgb(29, 255, 107), [0, 0, 254]);
        assert_eq!(ycbcr_to_rgb(255, 128, 128), [255, 255, 255]);
    }

    #[test]
    fn out_of_gamut_clamps() {
        assert_eq!(ycbcr_to_rgb(240, 40, 250), [255, 183, 84]);
    }

    #[test]
    fn gray_has_neutral_chroma() {
        assert_eq!(ycbcr_to_rgb(90, 128, 128), [90, 90, 90]);
    }

    #[test]
    fn downsample_averages_blocks_and_edges() {
        // 3x2 plane, 4:2:0 -> 2x1 chroma; right block is one column wide.
        let g = geometry(3, 2, SubsampleRatio::R420);
        let full = [10, 20, 50, 30, 40, 70];
        let mut out = [0u8; 2];
        downsample_plane(&full, &g, &mut out);
        assert_eq!(out, [25, 60]);
    }

    #[test]
    fn interleave_replicates_chroma() {
        let g = geometry(2, 2, SubsampleRatio::R420);
        let packed = [1, 2, 3, 4, 50, 60];
        assert_eq!(
            interleave_ycbcr(&packed, &g),
            vec![1, 50, 60, 2, 50, 60, 3, 50, 60, 4, 50, 60]
        );
    }

    #[test]
    fn split_keeps_luma_and_averages_chroma() {
        let g = geometry(3, 1, SubsampleRatio::R422);
        let interleaved = [10, 100, 200, 20, 110, 210, 30, 50, 60];
        let mut out = vec![0u8; g.total_len()];
        split_ycbcr(&interleaved, &g, &mut out);
        // Chroma blocks: columns 0..2 and the lone column 2.
        assert_eq!(out, [10, 20, 30, 105, 50, 205, 60]);
    }

    #[test]
    fn split_is_identity_at_full_chroma() {
        let g = geometry(2, 1, SubsampleRatio::R444);
        let mut out = vec![0u8; g.total_len()];
        split_ycbcr(&[240, 40, 250, 1, 2, 3], &g, &mut out);
        assert_eq!(out, [240, 1, 40, 2, 250, 3]);
    }
}
