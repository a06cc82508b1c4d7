//! Compresses a file to a classic 13-byte-header `.lzma` stream on stdout.
//!
//! Usage: `lzma_writer <path-to-input-file>`

use std::{env, error::Error, fs::File, io, io::Read as _};

use lzma2_codec_core::{LzmaOptions, LzmaWriter, Write};

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: lzma_writer <path-to-input-file>")?;
    let metadata = std::fs::metadata(&path)?;
    let mut input = File::open(&path)?;

    let mut stdout = io::stdout().lock();
    let mut writer = LzmaWriter::new(&mut stdout, LzmaOptions::with_preset(6), Some(metadata.len()))?;

    let mut buf = [0u8; 8192];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    writer.finish()?;
    Ok(())
}
