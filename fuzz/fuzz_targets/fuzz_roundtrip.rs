#![no_main]
use libfuzzer_sys::fuzz_target;
use zenjpegshim::imgref::ImgVec;
use zenjpegshim::rgb::Rgba;
use zenjpegshim::{EncodeConfig, EncodeRequest, Image, RATIOS};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let width = usize::from(data[0] % 32) + 1;
    let ratio = RATIOS[usize::from(data[1]) % RATIOS.len()];
    let pixels: Vec<Rgba<u8>> = data[2..]
        .chunks_exact(4)
        .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
        .collect();
    let height = pixels.len() / width;
    if height == 0 {
        return;
    }
    let img = ImgVec::new(pixels[..width * height].to_vec(), width, height);

    let config = EncodeConfig::new().with_chroma_subsampling(ratio);
    let jpeg = EncodeRequest::new()
        .with_config(config)
        .encode_to_vec(&Image::Rgba8(img))
        .expect("encoding valid pixels must succeed");
    let decoded = zenjpegshim::decode(&jpeg[..]).expect("own output must decode");
    assert_eq!((decoded.width(), decoded.height()), (width, height));
});
