//! The boundary between the adapters and a JPEG codec.
//!
//! A codec deals only in raw byte buffers tagged with numeric colorspace and
//! subsampling ids. Everything typed (descriptor lookup, buffer sizing, plane
//! slicing, layout dispatch) lives on the adapter side, so a codec can be
//! swapped for a recording fake in tests.

use alloc::string::String;

use crate::colorspace::Colorspace;
use crate::config::{DecodeConfig, EncodeConfig};
use crate::subsample::SubsampleRatio;

/// Geometry and colorspace reported by the codec.
///
/// Ids are raw; the adapter validates them against its tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub colorspace: u32,
    pub subsampling: u32,
}

/// Failure signaled by the codec. Carries the codec's own description.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecFault(String);

impl CodecFault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    pub fn detail(&self) -> &str {
        &self.0
    }

    pub fn into_detail(self) -> String {
        self.0
    }
}

/// Raw pixel data handed to [`NativeCodec::compress`].
///
/// All buffers are tightly packed: row stride equals plane width times bytes
/// per pixel.
#[derive(Clone, Copy, Debug)]
pub enum PixelPlanes<'a> {
    /// One buffer. Gray is 1 byte per pixel, RGB and CMYK are 4.
    Interleaved(&'a [u8]),
    /// Luma plus two chroma planes sized by the subsampling ratio.
    Planar {
        y: &'a [u8],
        cb: &'a [u8],
        cr: &'a [u8],
    },
}

/// Everything the codec needs to compress one image.
#[derive(Clone, Copy, Debug)]
pub struct CompressInput<'a> {
    pub planes: PixelPlanes<'a>,
    pub width: u32,
    pub height: u32,
    pub colorspace: Colorspace,
    pub subsampling: SubsampleRatio,
}

/// A JPEG codec that decodes into caller-allocated buffers and compresses
/// into codec-owned buffers.
///
/// Implementations must be reentrant: the adapters call them from any
/// thread, and concurrent calls share nothing but `&self`.
pub trait NativeCodec {
    /// Codec-owned compressed output. Dropping it releases the allocation.
    type Buffer: AsRef<[u8]>;

    /// Probe (`output == None`) or fully decode `input`.
    ///
    /// In probe mode only the frame header is inspected. In full mode the
    /// codec writes pixels into `output`, which the adapter sized from the
    /// probe result, and reports the geometry it actually produced. Target
    /// dimensions in `config` are hints; both phases must report the same
    /// geometry for the same input and config.
    fn probe_or_decode(
        &self,
        input: &[u8],
        config: &DecodeConfig,
        output: Option<&mut [u8]>,
    ) -> Result<RawFrame, CodecFault>;

    /// Compress one image. An empty buffer signals failure.
    fn compress(&self, input: &CompressInput<'_>, config: &EncodeConfig) -> Self::Buffer;
}

impl<C: NativeCodec + ?Sized> NativeCodec for &C {
    type Buffer = C::Buffer;

    fn probe_or_decode(
        &self,
        input: &[u8],
        config: &DecodeConfig,
        output: Option<&mut [u8]>,
    ) -> Result<RawFrame, CodecFault> {
        (**self).probe_or_decode(input, config, output)
    }

    fn compress(&self, input: &CompressInput<'_>, config: &EncodeConfig) -> Self::Buffer {
        (**self).compress(input, config)
    }
}
