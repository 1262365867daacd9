//! Line-oriented log scanning.
//!
//! Logs are read as raw bytes and decoded line by line with lossy UTF-8
//! replacement, so a stray invalid byte never aborts analysis of a file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tbench_common::BenchResult;

/// Call `visit` with every line of the file at `path`, without the trailing
/// line terminator.
pub fn for_each_line(path: &Path, mut visit: impl FnMut(&str)) -> BenchResult<()> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let mut line = buf.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        visit(&String::from_utf8_lossy(line));
    }
    Ok(())
}
