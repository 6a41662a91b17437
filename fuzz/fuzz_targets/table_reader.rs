#![no_main]

use std::io::Write;

use framestore_storage::{read_meta, read_table, ReadRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes to the table reader.
    // The reader must reject all malformed inputs gracefully:
    // - Invalid magic (dispatches to the legacy reader)
    // - Truncated headers and metadata blocks
    // - Bad column type codes and key indices
    // - Corrupt block indexes and compressed payloads
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    let path = file.path();

    let _ = read_meta(path);

    if let Ok(result) = read_table(path, &ReadRequest::default()) {
        // If reading succeeded, partial reads over the same file must too
        let rows = result.columns.first().map(|c| c.len()).unwrap_or(0);
        if rows > 1 {
            let request = ReadRequest {
                columns: Some(result.names.clone()),
                from_row: rows / 2,
                to_row: Some(rows),
            };
            let _ = read_table(path, &request);
        }
    }
});
