#![no_main]

use libfuzzer_sys::fuzz_target;
use pgmock::MockRows;

fuzz_target!(|data: &[u8]| {
    // Fuzz CSV fixture parsing
    if let Ok(text) = std::str::from_utf8(data) {
        let rows = MockRows::new(&["a", "b", "c"]).from_csv(text);
        let _ = rows.validate();
        let _ = rows.len();
    }
});
