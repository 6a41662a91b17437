#![no_main]

use std::io::Write;

use framestore_storage::legacy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes straight to the legacy (pre-magic) reader.
    // Every inconsistency must surface as an error, never a panic:
    // - Negative column and key counts
    // - Key indices and type codes out of range
    // - Non-monotonic block positions
    // - Truncated name payloads
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();

    let _ = legacy::read_meta(file.path());
});
