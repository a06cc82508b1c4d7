//! Compresses a file to a raw LZMA2 chunk stream (no `.xz` container) on
//! stdout.
//!
//! Usage: `lzma2_writer <path-to-input-file> [preset 0-9]`

use std::{env, error::Error, fs::File, io, io::Read as _};

use lzma2_codec_core::{Lzma2Writer, LzmaOptions, Write};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: lzma2_writer <path-to-input-file> [preset 0-9]")?;
    let preset = args.next().map(|s| s.parse::<u32>()).transpose()?.unwrap_or(6);

    let mut input = File::open(path)?;
    let mut writer = Lzma2Writer::new(io::stdout(), LzmaOptions::with_preset(preset))?;

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
