//! Duplicate detection helpers.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::sgf;

const CHUNK: usize = 8 * 1024;

/// Whether two files have exactly the same bytes.
pub fn binary_compare(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<bool> {
    let (a, b) = (a.as_ref(), b.as_ref());
    if a.metadata()?.len() != b.metadata()?.len() {
        return Ok(false);
    }
    let mut left = BufReader::new(File::open(a)?);
    let mut right = BufReader::new(File::open(b)?);
    let mut lbuf = [0u8; CHUNK];
    let mut rbuf = [0u8; CHUNK];
    loop {
        let n = read_full(&mut left, &mut lbuf)?;
        let m = read_full(&mut right, &mut rbuf)?;
        if n != m || lbuf[..n] != rbuf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows; a short count means end of input.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Whether two SGF files record the same game, ignoring formatting.
pub fn compare_sgf(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<bool> {
    let (a, b) = (a.as_ref(), b.as_ref());
    let same = sgf::from_path(a)?.is_same_game(&sgf::from_path(b)?);
    debug!(a = %a.display(), b = %b.display(), same, "compared games");
    Ok(same)
}
