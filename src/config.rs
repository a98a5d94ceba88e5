//! Decode and encode option sets.
//!
//! Both configs are plain values with builder methods. [`Default`] carries
//! the documented defaults, so a request built without options behaves the
//! same as one built from `DecodeConfig::default()` / `EncodeConfig::default()`.

use crate::subsample::SubsampleRatio;

/// DCT/IDCT implementation variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DctMethod {
    /// Accurate integer transform.
    #[default]
    IntegerSlow,
    /// Faster, less accurate integer transform.
    IntegerFast,
    /// Floating-point transform.
    Float,
}

/// Options for decoding.
///
/// Options are hints: a backend that cannot honor one logs it and decodes
/// anyway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecodeConfig {
    /// Higher-quality (non-replicating) chroma upsampling.
    pub fancy_upsampling: bool,
    /// Smoothing across DCT block edges in progressive images.
    pub block_smoothing: bool,
    /// Expect arithmetic rather than Huffman entropy coding.
    pub arithmetic_coding: bool,
    pub dct_method: DctMethod,
    /// Desired output width; 0 means full size.
    pub target_width: u32,
    /// Desired output height; 0 means full size.
    pub target_height: u32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            fancy_upsampling: true,
            block_smoothing: true,
            arithmetic_coding: false,
            dct_method: DctMethod::IntegerSlow,
            target_width: 0,
            target_height: 0,
        }
    }
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fancy_upsampling(mut self, enable: bool) -> Self {
        self.fancy_upsampling = enable;
        self
    }

    pub fn with_block_smoothing(mut self, enable: bool) -> Self {
        self.block_smoothing = enable;
        self
    }

    pub fn with_arithmetic_coding(mut self, enable: bool) -> Self {
        self.arithmetic_coding = enable;
        self
    }

    pub fn with_dct_method(mut self, method: DctMethod) -> Self {
        self.dct_method = method;
        self
    }

    /// Request a scaled decode.
    ///
    /// The codec scales in the DCT domain, picking the smallest of 1/8,
    /// 1/4, 1/2 whose output reaches the target in either dimension, else
    /// full size. The decoded image may be larger than requested; read the
    /// size back from the output. Zero leaves a dimension unconstrained.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Whether a scaled decode was requested.
    pub fn is_scaled(&self) -> bool {
        self.target_width != 0 || self.target_height != 0
    }
}

/// Options for encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct EncodeConfig {
    /// Quality 1..=100. Out-of-range values are clamped by the codec.
    pub quality: u8,
    /// Requested chroma subsampling for RGB input.
    ///
    /// CMYK is always written without subsampling, and planar YCbCr images
    /// are written with their own ratio.
    pub chroma_subsampling: SubsampleRatio,
    /// 0 writes a sequential (baseline) JPEG; 1 and 2 write progressively
    /// deeper scan scripts.
    pub progressive_level: u8,
    /// Compute optimal Huffman tables.
    pub optimize_coding: bool,
    /// Perceptual adaptive quantization.
    pub adaptive_quantization: bool,
    /// Force the Annex K example quantization tables.
    pub standard_quant_tables: bool,
    /// Higher-quality chroma downsampling.
    pub fancy_downsampling: bool,
    pub dct_method: DctMethod,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            chroma_subsampling: SubsampleRatio::R420,
            progressive_level: 2,
            optimize_coding: true,
            adaptive_quantization: true,
            standard_quant_tables: false,
            fancy_downsampling: true,
            dct_method: DctMethod::IntegerSlow,
        }
    }
}

impl EncodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_chroma_subsampling(mut self, ratio: SubsampleRatio) -> Self {
        self.chroma_subsampling = ratio;
        self
    }

    pub fn with_progressive_level(mut self, level: u8) -> Self {
        self.progressive_level = level;
        self
    }

    pub fn with_optimize_coding(mut self, enable: bool) -> Self {
        self.optimize_coding = enable;
        self
    }

    pub fn with_adaptive_quantization(mut self, enable: bool) -> Self {
        self.adaptive_quantization = enable;
        self
    }

    pub fn with_standard_quant_tables(mut self, enable: bool) -> Self {
        self.standard_quant_tables = enable;
        self
    }

    pub fn with_fancy_downsampling(mut self, enable: bool) -> Self {
        self.fancy_downsampling = enable;
        self
    }

    pub fn with_dct_method(mut self, method: DctMethod) -> Self {
        self.dct_method = method;
        self
    }
}
