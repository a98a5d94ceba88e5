//! Default codec backend: `jpeg-decoder` for decoding, `jpeg-encoder` for
//! encoding, and the marker scanner for what neither library reports.

use alloc::string::ToString;
use alloc::vec::Vec;

use jpeg_decoder::{ColorTransform, PixelFormat};
use jpeg_encoder::{ColorType, Encoder, QuantizationTableType, SamplingFactor};
use log::{debug, trace};

use super::color::{interleave_ycbcr, split_ycbcr};
use super::markers::{FrameHeader, read_frame_header};
use crate::colorspace::Colorspace;
use crate::config::{DctMethod, DecodeConfig, EncodeConfig};
use crate::native::{CodecFault, CompressInput, NativeCodec, PixelPlanes, RawFrame};
use crate::subsample::{SubsampleRatio, geometry};

/// Subsampling id reported for frames whose sampling factors fit no ratio.
const UNKNOWN_RATIO: u32 = u32::MAX;

/// Pure-Rust JPEG codec.
///
/// Stateless; one value can serve any number of threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegCodec;

impl JpegCodec {
    pub const fn new() -> Self {
        Self
    }
}

impl NativeCodec for JpegCodec {
    type Buffer = Vec<u8>;

    fn probe_or_decode(
        &self,
        input: &[u8],
        config: &DecodeConfig,
        output: Option<&mut [u8]>,
    ) -> Result<RawFrame, CodecFault> {
        let header = read_frame_header(input).map_err(|e| CodecFault::new(e.to_string()))?;
        if header.width == 0 || header.height == 0 {
            return Err(CodecFault::new("frame has zero width or height"));
        }
        let colorspace = header.colorspace();
        let ratio = header.subsampling();
        let scale = scale_request(config);

        let Some(output) = output else {
            let (width, height) = match scale.filter(|_| colorspace.is_some()) {
                Some((rw, rh)) => {
                    let mut decoder = jpeg_decoder::Decoder::new(input);
                    decoder.read_info().map_err(fault)?;
                    let (w, h) = decoder.scale(rw, rh).map_err(fault)?;
                    (u32::from(w), u32::from(h))
                }
                None => (u32::from(header.width), u32::from(header.height)),
            };
            trace!(
                "jpeg probe: {}x{} -> {width}x{height}, {} components, precision {}, progressive={}, lossless={}",
                header.width,
                header.height,
                header.components.len(),
                header.precision,
                header.progressive,
                header.lossless
            );
            return Ok(RawFrame {
                width,
                height,
                colorspace: colorspace.map_or(0, Colorspace::id),
                subsampling: ratio.map_or(UNKNOWN_RATIO, SubsampleRatio::id),
            });
        };

        let colorspace = colorspace.ok_or_else(|| {
            CodecFault::new(alloc::format!(
                "{} components have no JPEG colorspace",
                header.components.len()
            ))
        })?;
        log_ignored_decode_hints(&header, config);
        if header.arithmetic {
            return Err(CodecFault::new("arithmetic-coded frames are not supported"));
        }

        let decoded = decode_frame(input, &header, colorspace, ratio, scale)?;
        if decoded.pixels.len() != output.len() {
            return Err(CodecFault::new(alloc::format!(
                "output buffer is {} bytes, frame needs {}",
                output.len(),
                decoded.pixels.len()
            )));
        }
        output.copy_from_slice(&decoded.pixels);
        Ok(RawFrame {
            width: u32::from(decoded.width),
            height: u32::from(decoded.height),
            colorspace: colorspace.id(),
            subsampling: ratio.map_or(UNKNOWN_RATIO, SubsampleRatio::id),
        })
    }

    fn compress(&self, input: &CompressInput<'_>, config: &EncodeConfig) -> Vec<u8> {
        match compress_frame(input, config) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("jpeg compress failed: {e}");
                Vec::new()
            }
        }
    }
}

fn fault(e: jpeg_decoder::Error) -> CodecFault {
    CodecFault::new(e.to_string())
}

/// Target size in the form `Decoder::scale` takes, or `None` for a full
/// size decode.
///
/// The decoder picks the smallest DCT scale (1/8, 1/4, 1/2) whose output
/// reaches the request in either dimension, else 8/8. An unset dimension
/// becomes `u16::MAX` so it never decides the scale.
fn scale_request(config: &DecodeConfig) -> Option<(u16, u16)> {
    if !config.is_scaled() {
        return None;
    }
    let axis = |target: u32| match target {
        0 => u16::MAX,
        t => u16::try_from(t).unwrap_or(u16::MAX),
    };
    Some((axis(config.target_width), axis(config.target_height)))
}

fn log_ignored_decode_hints(header: &FrameHeader, config: &DecodeConfig) {
    if config.arithmetic_coding != header.arithmetic {
        debug!(
            "arithmetic_coding={} hint does not match frame (arithmetic={})",
            config.arithmetic_coding, header.arithmetic
        );
    }
    trace!(
        "decode hints not used by this backend: fancy_upsampling={}, block_smoothing={}, dct_method={:?}",
        config.fancy_upsampling, config.block_smoothing, config.dct_method
    );
}

/// Pixels laid out for the frame's colorspace, at the decoded size.
struct DecodedFrame {
    pixels: Vec<u8>,
    width: u16,
    height: u16,
}

/// Decode (DCT-scaled when requested) and convert to the layout the
/// colorspace calls for.
fn decode_frame(
    input: &[u8],
    header: &FrameHeader,
    colorspace: Colorspace,
    ratio: Option<SubsampleRatio>,
    scale: Option<(u16, u16)>,
) -> Result<DecodedFrame, CodecFault> {
    let mut decoder = jpeg_decoder::Decoder::new(input);
    if colorspace == Colorspace::YCbCr {
        // Raw samples, chroma upsampled to the output size.
        decoder.set_color_transform(ColorTransform::None);
    }
    decoder.read_info().map_err(fault)?;
    if let Some((rw, rh)) = scale {
        let (w, h) = decoder.scale(rw, rh).map_err(fault)?;
        trace!("jpeg dct scale {}x{} -> {w}x{h}", header.width, header.height);
    }
    let pixels = decoder.decode().map_err(fault)?;
    let info = decoder
        .info()
        .ok_or_else(|| CodecFault::new("decoder reported no frame info"))?;
    if scale.is_none() && (info.width, info.height) != (header.width, header.height) {
        return Err(CodecFault::new(alloc::format!(
            "decoder produced {}x{}, frame header says {}x{}",
            info.width,
            info.height,
            header.width,
            header.height
        )));
    }
    let (w, h) = (usize::from(info.width), usize::from(info.height));
    if pixels.len() != w * h * info.pixel_format.pixel_bytes() {
        return Err(CodecFault::new(alloc::format!(
            "decoder produced {} bytes for {w}x{h} {:?}",
            pixels.len(),
            info.pixel_format
        )));
    }

    let pixels = match (info.pixel_format, colorspace) {
        (PixelFormat::L8, Colorspace::Grayscale) => pixels,
        (PixelFormat::RGB24, Colorspace::Rgb) => {
            let mut rgba = Vec::with_capacity(w * h * 4);
            for px in pixels.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            rgba
        }
        (PixelFormat::RGB24, Colorspace::YCbCr) => {
            let ratio = ratio.ok_or_else(|| CodecFault::new("unsupported sampling factors"))?;
            let g = geometry(w, h, ratio);
            let mut planes = alloc::vec![0u8; g.total_len()];
            split_ycbcr(&pixels, &g, &mut planes);
            planes
        }
        (PixelFormat::CMYK32, Colorspace::Cmyk | Colorspace::Ycck) => pixels,
        (PixelFormat::L16, _) => {
            return Err(CodecFault::new(alloc::format!(
                "{}-bit samples are not supported",
                header.precision
            )));
        }
        #[allow(unreachable_patterns)]
        (format, colorspace) => {
            return Err(CodecFault::new(alloc::format!(
                "decoder produced {format:?} for a {colorspace:?} frame"
            )));
        }
    };
    Ok(DecodedFrame {
        pixels,
        width: info.width,
        height: info.height,
    })
}

fn sampling_factor(ratio: SubsampleRatio) -> SamplingFactor {
    match ratio {
        SubsampleRatio::R444 => SamplingFactor::F_1_1,
        SubsampleRatio::R422 => SamplingFactor::F_2_1,
        SubsampleRatio::R420 => SamplingFactor::F_2_2,
        SubsampleRatio::R440 => SamplingFactor::F_1_2,
        SubsampleRatio::R411 => SamplingFactor::F_4_1,
        SubsampleRatio::R410 => SamplingFactor::F_4_2,
    }
}

fn quant_tables(standard: bool) -> QuantizationTableType {
    if standard {
        QuantizationTableType::Default
    } else {
        QuantizationTableType::ImageMagick
    }
}

/// Progressive scan count for a level; `None` is sequential.
fn progressive_scans(level: u8) -> Option<u8> {
    match level {
        0 => None,
        1 => Some(2),
        _ => Some(4),
    }
}

fn compress_frame(input: &CompressInput<'_>, config: &EncodeConfig) -> Result<Vec<u8>, CodecFault> {
    let too_large = || {
        CodecFault::new(alloc::format!(
            "{}x{} exceeds the 65535 pixel JPEG dimension limit",
            input.width,
            input.height
        ))
    };
    let width = u16::try_from(input.width).map_err(|_| too_large())?;
    let height = u16::try_from(input.height).map_err(|_| too_large())?;

    let interleaved;
    let (data, color_type): (&[u8], ColorType) = match (input.planes, input.colorspace) {
        (PixelPlanes::Interleaved(buf), Colorspace::Grayscale) => (buf, ColorType::Luma),
        (PixelPlanes::Interleaved(buf), Colorspace::Rgb) => (buf, ColorType::Rgba),
        (PixelPlanes::Interleaved(buf), Colorspace::Cmyk) => (buf, ColorType::Cmyk),
        (PixelPlanes::Planar { y, cb, cr }, Colorspace::YCbCr) => {
            let g = geometry(input.width as usize, input.height as usize, input.subsampling);
            let mut packed = Vec::with_capacity(g.total_len());
            packed.extend_from_slice(y);
            packed.extend_from_slice(cb);
            packed.extend_from_slice(cr);
            if packed.len() != g.total_len() {
                return Err(CodecFault::new("plane sizes do not match subsampling"));
            }
            interleaved = interleave_ycbcr(&packed, &g);
            (&interleaved, ColorType::Ycbcr)
        }
        (_, colorspace) => {
            return Err(CodecFault::new(alloc::format!(
                "cannot compress {colorspace:?} from this plane layout"
            )));
        }
    };

    let quality = config.quality.clamp(1, 100);
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, quality);
    encoder.set_sampling_factor(sampling_factor(input.subsampling));
    encoder.set_optimized_huffman_tables(config.optimize_coding);
    if let Some(scans) = progressive_scans(config.progressive_level) {
        encoder.set_progressive(true);
        encoder.set_progressive_scans(scans);
    }
    encoder.set_quantization_tables(
        quant_tables(config.standard_quant_tables),
        quant_tables(config.standard_quant_tables),
    );
    if config.dct_method != DctMethod::IntegerSlow {
        trace!("dct_method={:?} not used by this backend", config.dct_method);
    }
    trace!(
        "encode hints not used by this backend: adaptive_quantization={}, fancy_downsampling={}",
        config.adaptive_quantization, config.fancy_downsampling
    );

    encoder
        .encode(data, width, height, color_type)
        .map_err(|e| CodecFault::new(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::markers::tests::header_bytes;
    use alloc::vec;

    fn gray_jpeg(w: u32, h: u32) -> Vec<u8> {
        let px: Vec<u8> = (0..w * h).map(|i| (i * 7 % 256) as u8).collect();
        let input = CompressInput {
            planes: PixelPlanes::Interleaved(&px),
            width: w,
            height: h,
            colorspace: Colorspace::Grayscale,
            subsampling: SubsampleRatio::R444,
        };
        JpegCodec.compress(&input, &EncodeConfig::default())
    }

    fn ycbcr_jpeg(w: u32, h: u32, ratio: SubsampleRatio, samples: [u8; 3]) -> Vec<u8> {
        let g = geometry(w as usize, h as usize, ratio);
        let y = vec![samples[0]; g.luma_len()];
        let cb = vec![samples[1]; g.chroma_len()];
        let cr = vec![samples[2]; g.chroma_len()];
        let input = CompressInput {
            planes: PixelPlanes::Planar {
                y: &y,
                cb: &cb,
                cr: &cr,
            },
            width: w,
            height: h,
            colorspace: Colorspace::YCbCr,
            subsampling: ratio,
        };
        JpegCodec.compress(&input, &EncodeConfig::new().with_quality(100))
    }

    #[test]
    fn scale_request_mapping() {
        assert_eq!(scale_request(&DecodeConfig::new()), None);
        let at = |tw, th| scale_request(&DecodeConfig::new().with_target_size(tw, th));
        assert_eq!(at(10, 0), Some((10, u16::MAX)));
        assert_eq!(at(0, 7), Some((u16::MAX, 7)));
        assert_eq!(at(100_000, 5), Some((u16::MAX, 5)));
    }

    #[test]
    fn dct_scale_choice() {
        let jpeg = gray_jpeg(100, 60);
        let at = |tw, th| {
            let cfg = DecodeConfig::new().with_target_size(tw, th);
            let probed = JpegCodec.probe_or_decode(&jpeg, &cfg, None).unwrap();
            let mut out = vec![0u8; (probed.width * probed.height) as usize];
            let full = JpegCodec.probe_or_decode(&jpeg, &cfg, Some(&mut out)).unwrap();
            assert_eq!(probed, full);
            (full.width, full.height)
        };
        assert_eq!(at(0, 0), (100, 60));
        assert_eq!(at(10, 5), (13, 8));
        assert_eq!(at(13, 0), (13, 8));
        assert_eq!(at(14, 0), (25, 15));
        assert_eq!(at(50, 30), (50, 30));
        assert_eq!(at(51, 0), (100, 60));
        assert_eq!(at(1000, 1000), (100, 60));
        // Either dimension reaching its target settles the scale.
        assert_eq!(at(20, 8), (13, 8));
        assert_eq!(at(0, 8), (13, 8));
    }

    #[test]
    fn ycbcr_decode_returns_stored_samples() {
        // Far outside the RGB gamut: any trip through RGB would clip.
        let samples = [240u8, 40, 250];
        for ratio in crate::subsample::RATIOS {
            let jpeg = ycbcr_jpeg(9, 5, ratio, samples);
            let g = geometry(9, 5, ratio);
            let mut out = vec![0u8; g.total_len()];
            let frame = JpegCodec
                .probe_or_decode(&jpeg, &DecodeConfig::default(), Some(&mut out))
                .unwrap();
            assert_eq!(frame.subsampling, ratio.id());
            let [y_end, cb_end, _] = g.plane_ends();
            assert!(out[..y_end].iter().all(|&v| v == 240), "{ratio}: luma");
            assert!(out[y_end..cb_end].iter().all(|&v| v == 40), "{ratio}: cb");
            assert!(out[cb_end..].iter().all(|&v| v == 250), "{ratio}: cr");
        }
    }

    #[test]
    fn progressive_levels() {
        assert_eq!(progressive_scans(0), None);
        assert_eq!(progressive_scans(1), Some(2));
        assert_eq!(progressive_scans(2), Some(4));
        assert_eq!(progressive_scans(9), Some(4));
    }

    #[test]
    fn probe_reads_header_only() {
        let jpeg = gray_jpeg(20, 10);
        assert!(!jpeg.is_empty());
        // Cut the stream right after the header; probe still succeeds.
        let sos = jpeg.windows(2).position(|w| w == [0xFF, 0xDA]).unwrap();
        let frame = JpegCodec
            .probe_or_decode(&jpeg[..sos + 2], &DecodeConfig::default(), None)
            .unwrap();
        assert_eq!((frame.width, frame.height), (20, 10));
        assert_eq!(frame.colorspace, Colorspace::Grayscale.id());
        assert_eq!(frame.subsampling, SubsampleRatio::R444.id());
    }

    #[test]
    fn full_decode_fills_output() {
        let jpeg = gray_jpeg(16, 8);
        let mut out = vec![0u8; 16 * 8];
        let frame = JpegCodec
            .probe_or_decode(&jpeg, &DecodeConfig::default(), Some(&mut out))
            .unwrap();
        assert_eq!((frame.width, frame.height), (16, 8));
        assert!(out.iter().any(|&b| b != 0));
    }

    #[test]
    fn wrong_output_size_is_a_fault() {
        let jpeg = gray_jpeg(16, 8);
        let mut out = vec![0u8; 16 * 8 - 1];
        let err = JpegCodec
            .probe_or_decode(&jpeg, &DecodeConfig::default(), Some(&mut out))
            .unwrap_err();
        assert!(err.detail().contains("output buffer"), "{err}");
    }

    #[test]
    fn arithmetic_frames_probe_but_do_not_decode() {
        let data = header_bytes(0xC9, 8, 8, &[(1, 1, 1)], &[]);
        let cfg = DecodeConfig::default();
        assert!(JpegCodec.probe_or_decode(&data, &cfg, None).is_ok());
        let mut out = vec![0u8; 64];
        let err = JpegCodec
            .probe_or_decode(&data, &cfg, Some(&mut out))
            .unwrap_err();
        assert!(err.detail().contains("arithmetic"));
    }

    #[test]
    fn unknown_sampling_reports_out_of_table_id() {
        let data = header_bytes(0xC0, 8, 8, &[(1, 3, 1), (2, 1, 1), (3, 1, 1)], &[]);
        let frame = JpegCodec
            .probe_or_decode(&data, &DecodeConfig::default(), None)
            .unwrap();
        assert_eq!(frame.colorspace, Colorspace::YCbCr.id());
        assert_eq!(frame.subsampling, UNKNOWN_RATIO);
    }

    #[test]
    fn oversized_compress_returns_empty() {
        let px = [0u8; 4];
        let input = CompressInput {
            planes: PixelPlanes::Interleaved(&px),
            width: 70_000,
            height: 1,
            colorspace: Colorspace::Grayscale,
            subsampling: SubsampleRatio::R444,
        };
        assert!(JpegCodec.compress(&input, &EncodeConfig::default()).is_empty());
    }

    #[test]
    fn garbage_is_a_fault() {
        let err = JpegCodec
            .probe_or_decode(b"not a jpeg", &DecodeConfig::default(), None)
            .unwrap_err();
        assert!(err.detail().contains("SOI"));
    }
}
