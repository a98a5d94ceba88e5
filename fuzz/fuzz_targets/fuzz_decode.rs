#![no_main]
use libfuzzer_sys::fuzz_target;
use zenjpegshim::{DecodeConfig, DecodeRequest, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::none().with_max_pixels(1 << 24);

    // Probe and full decode must never panic
    let _ = zenjpegshim::decode_config(data);
    let _ = DecodeRequest::new()
        .with_limits(&limits)
        .with_stop(&enough::Unstoppable)
        .decode(data);

    // Scaled decode derives its size from the header
    if let Some(&t) = data.last() {
        let config = DecodeConfig::new().with_target_size(u32::from(t), 0);
        let _ = DecodeRequest::new()
            .with_limits(&limits)
            .with_config(config)
            .decode(data);
    }
});
