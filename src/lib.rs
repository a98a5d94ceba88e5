//! # zenjpegshim
//!
//! Colorspace-aware adapter between a JPEG codec and typed in-memory images.
//!
//! Decoding is two-phase: a probe reads the frame header for geometry,
//! colorspace and chroma subsampling, then a full decode fills a buffer
//! sized exactly for that geometry. The result is an [`Image`] matching the
//! source colorspace: gray, RGBA, CMYK, or planar YCbCr with the stream's
//! chroma ratio.
//!
//! Encoding dispatches on the image layout. Gray, RGBA, CMYK and planar
//! YCbCr go to the codec as-is; every other layout is converted to RGBA
//! first.
//!
//! The codec itself sits behind [`NativeCodec`]. [`JpegCodec`] is the
//! pure-Rust default.
//!
//! ## Usage
//!
//! ```no_run
//! use zenjpegshim::{DecodeRequest, EncodeConfig, EncodeRequest, SubsampleRatio};
//!
//! let data: &[u8] = &[]; // your JPEG bytes
//!
//! // Geometry only; reads the first 1 KiB
//! let config = zenjpegshim::decode_config(data)?;
//! println!("{}x{} {:?}", config.width, config.height, config.colorspace);
//!
//! // Full decode
//! let image = zenjpegshim::decode(data)?;
//!
//! // Re-encode
//! let jpeg = EncodeRequest::new()
//!     .with_config(EncodeConfig::new().with_quality(90).with_chroma_subsampling(SubsampleRatio::R444))
//!     .encode_to_vec(&image)?;
//! # Ok::<(), zenjpegshim::JpegError>(())
//! ```

#![forbid(unsafe_code)]

extern crate alloc;

mod codecs;
mod colorspace;
mod config;
mod convert;
mod decode;
mod encode;
mod error;
mod image;
mod io;
mod limits;
mod native;
mod subsample;

// Re-exports
pub use codecs::JpegCodec;
pub use colorspace::{ColorModel, Colorspace, ColorspaceDescriptor, PlaneLayout, describe};
pub use config::{DctMethod, DecodeConfig, EncodeConfig};
pub use decode::{DEFAULT_PROBE_PREFIX, DecodeOutput, DecodeRequest, ImageConfig};
pub use encode::EncodeRequest;
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{DecodePhase, JpegError};
pub use image::{Cmyk, Image, PixelLayoutClass, YCbCrImage};
pub use io::{ByteSink, ByteSource};
pub use limits::Limits;
pub use native::{CodecFault, CompressInput, NativeCodec, PixelPlanes, RawFrame};
pub use subsample::{RATIOS, SubsampleGeometry, SubsampleRatio, geometry};

pub use imgref;
pub use rgb;

/// Decode a JPEG with default options.
pub fn decode(source: impl ByteSource) -> Result<Image, JpegError> {
    decode_with_options(source, DecodeConfig::default())
}

/// Decode a JPEG with the given options.
pub fn decode_with_options(source: impl ByteSource, config: DecodeConfig) -> Result<Image, JpegError> {
    DecodeRequest::new()
        .with_config(config)
        .decode(source)?
        .into_image()
        .ok_or_else(|| JpegError::decode_failure(DecodePhase::Full, "no image produced"))
}

/// Read geometry and colorspace from the first
/// [`DEFAULT_PROBE_PREFIX`] bytes without decoding pixels.
pub fn decode_config(source: impl ByteSource) -> Result<ImageConfig, JpegError> {
    DecodeRequest::new().probe(source)
}

/// Encode an image with default options.
pub fn encode(sink: impl ByteSink, image: &Image) -> Result<(), JpegError> {
    encode_with_options(sink, image, EncodeConfig::default())
}

/// Encode an image with the given options.
pub fn encode_with_options(
    sink: impl ByteSink,
    image: &Image,
    config: EncodeConfig,
) -> Result<(), JpegError> {
    EncodeRequest::new().with_config(config).encode(image, sink)
}
