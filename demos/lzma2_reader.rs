//! Decompresses a raw LZMA2 chunk stream (no `.xz` container) to stdout.
//!
//! Usage: `lzma2_reader <path-to-lzma2-file> [dict-size-bytes]`

use std::{env, error::Error, fs::File, io};

use lzma2_codec_core::{Lzma2Reader, LzmaOptions, Read};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: lzma2_reader <path-to-lzma2-file> [dict-size-bytes]")?;
    let dict_size = args
        .next()
        .map(|s| s.parse::<u32>())
        .transpose()?
        .unwrap_or(LzmaOptions::DICT_SIZE_DEFAULT);

    let file = File::open(path)?;
    let mut reader = Lzma2Reader::new(file, dict_size, None);

    let mut stdout = io::stdout().lock();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        io::Write::write_all(&mut stdout, &buf[..n])?;
    }
    Ok(())
}
