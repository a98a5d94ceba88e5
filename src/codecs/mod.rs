//! Codec backends.
//!
//! [`JpegCodec`] is the default implementation of
//! [`NativeCodec`](crate::native::NativeCodec); the adapters accept any other.

pub(crate) mod color;
mod jpeg;
pub(crate) mod markers;

pub use jpeg::JpegCodec;
