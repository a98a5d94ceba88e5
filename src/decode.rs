//! Decoder adapter: the two-phase probe-then-decode protocol.

use alloc::vec;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};
use imgref::ImgVec;
use log::{debug, trace};
use rgb::{Gray, Rgba};

use crate::codecs::JpegCodec;
use crate::colorspace::{self, ColorModel, Colorspace, ColorspaceDescriptor, PlaneLayout};
use crate::config::DecodeConfig;
use crate::error::{DecodePhase, JpegError};
use crate::image::{Cmyk, Image, YCbCrImage};
use crate::io::{ByteSource, read_prefix};
use crate::limits::Limits;
use crate::native::{NativeCodec, RawFrame};
use crate::subsample::{SubsampleRatio, geometry};

/// Bytes read for a configuration-only probe unless overridden.
pub const DEFAULT_PROBE_PREFIX: usize = 1024;

/// Geometry and colorspace of a JPEG stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    /// Output width; reflects any scaled decode.
    pub width: u32,
    /// Output height; reflects any scaled decode.
    pub height: u32,
    pub colorspace: Colorspace,
    /// Color model of the decoded [`Image`].
    pub color_model: ColorModel,
    /// Chroma ratio; present only for YCbCr.
    pub subsampling: Option<SubsampleRatio>,
}

/// Result of a decode request.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pub config: ImageConfig,
    /// Decoded pixels. `None` for configuration-only requests.
    pub image: Option<Image>,
}

impl DecodeOutput {
    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn into_image(self) -> Option<Image> {
        self.image
    }
}

/// JPEG decode request builder.
///
/// # Example
///
/// ```no_run
/// use zenjpegshim::{DecodeConfig, DecodeRequest};
///
/// let data: &[u8] = &[]; // your JPEG bytes
/// let output = DecodeRequest::new()
///     .with_config(DecodeConfig::new().with_target_size(320, 240))
///     .decode(data)?;
/// println!("{}x{}", output.width(), output.height());
/// # Ok::<(), zenjpegshim::JpegError>(())
/// ```
pub struct DecodeRequest<'a> {
    config: DecodeConfig,
    config_only: bool,
    probe_prefix: usize,
    limits: Option<&'a Limits>,
    stop: Option<&'a dyn Stop>,
}

impl Default for DecodeRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DecodeRequest<'a> {
    pub fn new() -> Self {
        Self {
            config: DecodeConfig::default(),
            config_only: false,
            probe_prefix: DEFAULT_PROBE_PREFIX,
            limits: None,
            stop: None,
        }
    }

    /// Set decoding options.
    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Return geometry and colorspace only, without allocating pixels.
    pub fn with_config_only(mut self, config_only: bool) -> Self {
        self.config_only = config_only;
        self
    }

    /// Bytes read before probing a configuration-only request.
    ///
    /// The frame header must fit in this prefix; streams with large
    /// metadata segments ahead of it need a larger value.
    pub fn with_probe_prefix(mut self, bytes: usize) -> Self {
        self.probe_prefix = bytes;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set a cancellation token.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Decode with the default backend.
    pub fn decode(self, source: impl ByteSource) -> Result<DecodeOutput, JpegError> {
        self.decode_with(&JpegCodec, source)
    }

    /// Read only the header prefix and report geometry and colorspace.
    pub fn probe(self, source: impl ByteSource) -> Result<ImageConfig, JpegError> {
        let output = self.with_config_only(true).decode_with(&JpegCodec, source)?;
        Ok(output.config)
    }

    /// Decode with any codec.
    pub fn decode_with<C: NativeCodec + ?Sized>(
        self,
        codec: &C,
        mut source: impl ByteSource,
    ) -> Result<DecodeOutput, JpegError> {
        let stop = self.stop.unwrap_or(&Unstoppable);
        let limits = self.limits;
        stop.check()?;

        let mut input = read_prefix(&mut source, self.probe_prefix).map_err(JpegError::Read)?;
        if !self.config_only {
            source.read_all(&mut input).map_err(JpegError::Read)?;
        }
        if let Some(limits) = limits {
            limits.check_input(input.len() as u64)?;
        }
        trace!(
            "jpeg probe on {} bytes (config_only={})",
            input.len(),
            self.config_only
        );

        let frame = codec
            .probe_or_decode(&input, &self.config, None)
            .map_err(|f| JpegError::decode_failure(DecodePhase::Probe, f.into_detail()))?;
        let resolved = resolve(&frame)?;
        if frame.width == 0 || frame.height == 0 {
            return Err(JpegError::decode_failure(
                DecodePhase::Probe,
                alloc::format!("codec reported empty image {}x{}", frame.width, frame.height),
            ));
        }
        let config = resolved.config(&frame);
        debug!(
            "jpeg probe: {}x{} {:?}{}",
            config.width,
            config.height,
            config.colorspace,
            config
                .subsampling
                .map(|r| alloc::format!(" {r}"))
                .unwrap_or_default()
        );

        if self.config_only {
            return Ok(DecodeOutput {
                config,
                image: None,
            });
        }

        stop.check()?;
        let (width, height) = (frame.width as usize, frame.height as usize);
        if let Some(limits) = limits {
            limits.check_dimensions(u64::from(frame.width), u64::from(frame.height))?;
        }
        let len = resolved.buffer_len(width, height).ok_or_else(|| {
            JpegError::LimitExceeded(alloc::format!("{width}x{height} buffer size overflows"))
        })?;
        if let Some(limits) = limits {
            limits.check_memory(len as u64)?;
        }

        let mut buf = vec![0u8; len];
        let decoded = codec
            .probe_or_decode(&input, &self.config, Some(&mut buf))
            .map_err(|f| JpegError::decode_failure(DecodePhase::Full, f.into_detail()))?;
        stop.check()?;

        // The image is built from the geometry reported by the full call.
        let resolved = resolve(&decoded).map_err(|e| match e {
            JpegError::UnsupportedColorspace(_) | JpegError::UnsupportedSubsampling(_) => {
                JpegError::decode_failure(
                    DecodePhase::Full,
                    alloc::format!("full decode reported different metadata than probe: {e}"),
                )
            }
            other => other,
        })?;
        let (out_w, out_h) = (decoded.width as usize, decoded.height as usize);
        if resolved.buffer_len(out_w, out_h) != Some(len) || out_w == 0 || out_h == 0 {
            return Err(JpegError::decode_failure(
                DecodePhase::Full,
                alloc::format!(
                    "codec reported {out_w}x{out_h} {:?} after probing {width}x{height} {:?}",
                    resolved.descriptor.colorspace,
                    config.colorspace
                ),
            ));
        }

        let config = resolved.config(&decoded);
        let image = build_image(resolved, buf, out_w, out_h)?;
        debug!("jpeg decoded {}x{} {:?}", out_w, out_h, config.color_model);
        Ok(DecodeOutput {
            config,
            image: Some(image),
        })
    }
}

/// Descriptor and ratio validated from raw codec ids.
#[derive(Clone, Copy)]
struct Resolved {
    descriptor: &'static ColorspaceDescriptor,
    ratio: Option<SubsampleRatio>,
}

fn resolve(frame: &RawFrame) -> Result<Resolved, JpegError> {
    let descriptor = colorspace::describe(frame.colorspace)?;
    let ratio = match descriptor.layout {
        PlaneLayout::Planar => Some(SubsampleRatio::from_id(frame.subsampling)?),
        PlaneLayout::Interleaved { .. } => None,
    };
    Ok(Resolved { descriptor, ratio })
}

impl Resolved {
    fn config(&self, frame: &RawFrame) -> ImageConfig {
        ImageConfig {
            width: frame.width,
            height: frame.height,
            colorspace: self.descriptor.colorspace,
            color_model: self.descriptor.color_model,
            subsampling: self.ratio,
        }
    }

    /// Exact decoded buffer size, `None` on overflow.
    fn buffer_len(&self, width: usize, height: usize) -> Option<usize> {
        match (self.descriptor.layout, self.ratio) {
            (PlaneLayout::Interleaved { bytes_per_pixel }, _) => {
                width.checked_mul(height)?.checked_mul(bytes_per_pixel)
            }
            (PlaneLayout::Planar, Some(ratio)) => geometry(width, height, ratio).checked_total_len(),
            (PlaneLayout::Planar, None) => None,
        }
    }
}

/// Wrap the filled buffer in the image type for its color model.
fn build_image(
    resolved: Resolved,
    buf: Vec<u8>,
    width: usize,
    height: usize,
) -> Result<Image, JpegError> {
    let image = match (resolved.descriptor.color_model, resolved.ratio) {
        (ColorModel::Gray, _) => Image::Gray8(ImgVec::new(cast_pixels::<Gray<u8>>(buf), width, height)),
        (ColorModel::Rgba, _) => Image::Rgba8(ImgVec::new(cast_pixels::<Rgba<u8>>(buf), width, height)),
        (ColorModel::Cmyk, _) => Image::Cmyk8(ImgVec::new(cast_pixels::<Cmyk>(buf), width, height)),
        (ColorModel::YCbCr, Some(ratio)) => {
            Image::YCbCr(YCbCrImage::from_packed(buf, geometry(width, height, ratio))?)
        }
        (ColorModel::YCbCr, None) => {
            return Err(JpegError::decode_failure(
                DecodePhase::Full,
                "YCbCr frame without a subsampling ratio",
            ));
        }
    };
    Ok(image)
}

/// Reinterpret a byte buffer as pixels, reusing the allocation when the
/// pixel alignment allows it.
fn cast_pixels<P: bytemuck::Pod>(buf: Vec<u8>) -> Vec<P> {
    match bytemuck::allocation::try_cast_vec(buf) {
        Ok(pixels) => pixels,
        Err((_, buf)) => bytemuck::pod_collect_to_vec(&buf),
    }
}
