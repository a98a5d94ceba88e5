//! JPEG marker scanning.
//!
//! Walks the marker segments before the first scan and extracts what the
//! decoder library does not expose: per-component sampling factors, the JFIF
//! and Adobe colorspace hints, and the coding process. Pure byte parsing,
//! works on a truncated prefix as long as the frame header is in it.

use alloc::vec::Vec;

use crate::colorspace::Colorspace;
use crate::subsample::SubsampleRatio;

/// One frame component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Component {
    pub id: u8,
    pub h: u8,
    pub v: u8,
}

/// What the marker segments say about the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub width: u16,
    pub height: u16,
    pub precision: u8,
    pub components: Vec<Component>,
    pub progressive: bool,
    pub arithmetic: bool,
    pub lossless: bool,
    pub jfif: bool,
    /// Adobe APP14 color transform flag, if the segment was present.
    pub adobe_transform: Option<u8>,
}

impl FrameHeader {
    /// Colorspace of the coded components, or `None` for component counts
    /// JPEG colorspaces do not cover.
    pub fn colorspace(&self) -> Option<Colorspace> {
        match self.components.len() {
            1 => Some(Colorspace::Grayscale),
            3 => Some(self.three_component_colorspace()),
            4 => match self.adobe_transform {
                Some(2) => Some(Colorspace::Ycck),
                _ => Some(Colorspace::Cmyk),
            },
            _ => None,
        }
    }

    fn three_component_colorspace(&self) -> Colorspace {
        if self.jfif {
            return Colorspace::YCbCr;
        }
        match self.adobe_transform {
            Some(0) => Colorspace::Rgb,
            Some(_) => Colorspace::YCbCr,
            None => {
                let ids: Vec<u8> = self.components.iter().map(|c| c.id).collect();
                if ids == b"RGB" {
                    Colorspace::Rgb
                } else {
                    Colorspace::YCbCr
                }
            }
        }
    }

    /// Chroma ratio from the sampling factors.
    ///
    /// Single-component frames are 4:4:4. Three-component frames need both
    /// chroma components sampled alike; four-component frames must be
    /// unsubsampled.
    pub fn subsampling(&self) -> Option<SubsampleRatio> {
        match self.components.as_slice() {
            [_] => Some(SubsampleRatio::R444),
            [luma, cb, cr] => {
                if (cb.h, cb.v) != (cr.h, cr.v) {
                    return None;
                }
                SubsampleRatio::from_sampling_factors((luma.h, luma.v), (cb.h, cb.v))
            }
            [first, rest @ ..] if rest.iter().all(|c| (c.h, c.v) == (first.h, first.v)) => {
                Some(SubsampleRatio::R444)
            }
            _ => None,
        }
    }
}

/// Why a frame header could not be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum MarkerError {
    #[error("not a JPEG stream (missing SOI marker)")]
    NotJpeg,
    #[error("input ended before the frame header")]
    Truncated,
    #[error("lost marker sync at offset {0}")]
    LostSync(usize),
    #[error("malformed frame header")]
    BadFrame,
    #[error("no frame header before first scan")]
    NoFrame,
}

/// Scan marker segments up to the first SOS and return the frame header.
pub(crate) fn read_frame_header(data: &[u8]) -> Result<FrameHeader, MarkerError> {
    if data.len() < 2 || data[..2] != [0xFF, 0xD8] {
        return Err(MarkerError::NotJpeg);
    }

    let mut jfif = false;
    let mut adobe_transform = None;
    let mut frame: Option<FrameHeader> = None;

    // Skip SOI marker (FF D8)
    let mut pos = 2;

    loop {
        if pos + 1 >= data.len() {
            break;
        }
        if data[pos] != 0xFF {
            return Err(MarkerError::LostSync(pos));
        }

        // Skip padding FF bytes
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            break;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Standalone markers (no length field)
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }

        // SOS or EOI ends the header
        if marker == 0xDA || marker == 0xD9 {
            break;
        }

        if pos + 2 > data.len() {
            break;
        }
        let seg_len = usize::from(u16::from_be_bytes([data[pos], data[pos + 1]]));
        if seg_len < 2 {
            return Err(MarkerError::LostSync(pos));
        }
        let end = pos + seg_len;
        // Payload after the length field; may be cut short by a prefix.
        let payload = &data[pos + 2..end.min(data.len())];

        match marker {
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                if end > data.len() {
                    return Err(MarkerError::Truncated);
                }
                frame = Some(parse_sof(marker, payload)?);
            }
            0xE0 if payload.starts_with(b"JFIF\0") => jfif = true,
            0xEE if payload.starts_with(b"Adobe") && payload.len() >= 12 => {
                adobe_transform = Some(payload[11]);
            }
            _ => {}
        }

        pos = end;
    }

    match frame {
        Some(mut f) => {
            f.jfif = jfif;
            f.adobe_transform = adobe_transform;
            Ok(f)
        }
        None if pos >= data.len() => Err(MarkerError::Truncated),
        None => Err(MarkerError::NoFrame),
    }
}

// SOF: precision (1) + height (2) + width (2) + component count (1),
// then 3 bytes per component: id, h<<4|v, quant table.
fn parse_sof(marker: u8, payload: &[u8]) -> Result<FrameHeader, MarkerError> {
    if payload.len() < 6 {
        return Err(MarkerError::BadFrame);
    }
    let precision = payload[0];
    let height = u16::from_be_bytes([payload[1], payload[2]]);
    let width = u16::from_be_bytes([payload[3], payload[4]]);
    let count = usize::from(payload[5]);
    let specs = payload
        .get(6..6 + 3 * count)
        .ok_or(MarkerError::BadFrame)?;
    let components: Vec<Component> = specs
        .chunks_exact(3)
        .map(|c| Component {
            id: c[0],
            h: c[1] >> 4,
            v: c[1] & 0x0F,
        })
        .collect();
    if count == 0 || components.iter().any(|c| c.h == 0 || c.v == 0) {
        return Err(MarkerError::BadFrame);
    }

    Ok(FrameHeader {
        width,
        height,
        precision,
        components,
        progressive: matches!(marker, 0xC2 | 0xC6 | 0xCA | 0xCE),
        arithmetic: marker >= 0xC9,
        lossless: matches!(marker, 0xC3 | 0xC7 | 0xCB | 0xCF),
        jfif: false,
        adobe_transform: None,
    })
}
