#![no_main]
use libfuzzer_sys::fuzz_target;
use ranger_core::decode::LineDecoder;

fuzz_target!(|data: &str| {
    // The decoder eats arbitrary event-stream garbage; it must never panic,
    // only decode or silently skip.
    let decoder = LineDecoder::new("ABS_HAT1X");
    if let Some(sample) = decoder.decode(data) {
        // The packed split is total over u32; both halves fit u16 by
        // construction.
        let _ = (sample.distance_mm, sample.status);
    }
});
