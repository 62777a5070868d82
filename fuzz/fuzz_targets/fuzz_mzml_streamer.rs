#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use lcms_qc::mzml::MzMLStreamer;
use lcms_qc::run::Run;

fuzz_target!(|data: &[u8]| {
    // Malformed documents must surface as errors, never panics
    if let Ok(mut streamer) = MzMLStreamer::new(Cursor::new(data)) {
        for _ in 0..100 {
            match streamer.next_spectrum() {
                Ok(Some(_spectrum)) => {}
                Ok(None) | Err(_) => break,
            }
        }
    }

    let _ = Run::from_reader(Cursor::new(data));
});
