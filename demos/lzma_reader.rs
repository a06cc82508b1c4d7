//! Decompresses a classic 13-byte-header `.lzma` file to stdout.
//!
//! Usage: `lzma_reader <path-to-lzma-file>`

use std::{env, error::Error, fs::File, io};

use lzma2_codec_core::LzmaReader;

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: lzma_reader <path-to-lzma-file>")?;
    let file = File::open(path)?;
    let mut reader = LzmaReader::new(file)?;
    let mut stdout = io::stdout().lock();
    read_to_writer(&mut reader, &mut stdout)?;
    Ok(())
}

fn read_to_writer<R: lzma2_codec_core::Read, W: io::Write>(
    reader: &mut R,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }
    Ok(())
}
