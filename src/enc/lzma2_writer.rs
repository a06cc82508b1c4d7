use super::{
    encoder::{LzmaEncoder, LZMA2_COMPRESSED_LIMIT},
    range_enc::{RangeEncoder, RangeEncoderBuffer},
};
use crate::{LzmaOptions, Result, Write};

/// A single-threaded LZMA2 compressor: chunks the input through
/// [`LzmaEncoder`], buffering each chunk so its compressed size is
/// known before deciding whether to keep it or fall back to storing
/// the chunk uncompressed.
///
/// # Examples
/// ```ignore
/// use std::io::Write;
///
/// use lzma2_codec_core::{Lzma2Writer, LzmaOptions};
///
/// let mut writer = Lzma2Writer::new(Vec::new(), LzmaOptions::default()).unwrap();
/// writer.write_all(b"hello world").unwrap();
/// let compressed = writer.finish().unwrap();
/// ```
pub struct Lzma2Writer<W> {
    inner: W,
    rc: RangeEncoder<RangeEncoderBuffer>,
    lzma: LzmaEncoder,
    props: u8,
    dict_reset_needed: bool,
    state_reset_needed: bool,
    props_needed: bool,
    pending_size: u32,
    finished: bool,
}

impl<W: Write> Lzma2Writer<W> {
    pub fn new(inner: W, options: LzmaOptions) -> Result<Self> {
        let props = options.properties()?;
        let rc = RangeEncoder::new_buffer(LZMA2_COMPRESSED_LIMIT);
        let lzma = LzmaEncoder::new(
            props,
            options.mf,
            options.depth_limit,
            options.dict_size,
            options.nice_len,
            (64 << 10) - options.dict_size.min(64 << 10),
            0,
        );
        Ok(Self {
            inner,
            rc,
            lzma,
            props: props.to_byte(),
            dict_reset_needed: true,
            state_reset_needed: true,
            props_needed: true,
            pending_size: 0,
            finished: false,
        })
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Writes one compressed ("LZMA") chunk header followed by the
    /// buffered compressed bytes. The control byte packs which of the
    /// dictionary, LZMA state, and literal-coder properties reset at
    /// this chunk's start, per the LZMA2 framing in `lzma2_reader.rs`.
    fn write_lzma(&mut self, uncompressed_size: u32, compressed_size: u32) -> Result<()> {
        let mut control: u32 = if self.props_needed {
            if self.dict_reset_needed {
                0x80 + (3 << 5)
            } else {
                0x80 + (2 << 5)
            }
        } else if self.state_reset_needed {
            0x80 + (1 << 5)
        } else {
            0x80
        };
        control |= (uncompressed_size - 1) >> 16;

        let mut header = [0u8; 6];
        header[0] = control as u8;
        header[1] = ((uncompressed_size - 1) >> 8) as u8;
        header[2] = (uncompressed_size - 1) as u8;
        header[3] = ((compressed_size - 1) >> 8) as u8;
        header[4] = (compressed_size - 1) as u8;
        if self.props_needed {
            header[5] = self.props;
            self.inner.write_all(&header)?;
        } else {
            self.inner.write_all(&header[..5])?;
        }
        self.rc.write_to(&mut self.inner)?;

        self.props_needed = false;
        self.state_reset_needed = false;
        self.dict_reset_needed = false;
        Ok(())
    }

    /// Writes one or more uncompressed chunks, each capped at 64 KiB.
    fn write_uncompressed(&mut self, mut uncompressed_size: u32) -> Result<()> {
        while uncompressed_size > 0 {
            let chunk_size = uncompressed_size.min(64 << 10);
            let mut header = [0u8; 3];
            header[0] = if self.dict_reset_needed { 0x01 } else { 0x02 };
            header[1] = ((chunk_size - 1) >> 8) as u8;
            header[2] = (chunk_size - 1) as u8;
            self.inner.write_all(&header)?;
            self.lzma
                .lz
                .copy_uncompressed(&mut self.inner, uncompressed_size as i32, chunk_size as usize)?;
            uncompressed_size -= chunk_size;
            self.dict_reset_needed = false;
        }
        self.state_reset_needed = true;
        Ok(())
    }

    /// Closes out the chunk currently buffered in `self.rc`: keeps it
    /// compressed when that's actually smaller, otherwise re-encodes
    /// the same span as one or more uncompressed chunks.
    fn write_chunk(&mut self) -> Result<()> {
        let compressed_size = self.rc.finish_buffer()? as u32;
        let uncompressed_size = self.lzma.uncompressed_size;
        if compressed_size + 2 < uncompressed_size {
            self.write_lzma(uncompressed_size, compressed_size)?;
        } else {
            self.lzma.reset();
            self.write_uncompressed(uncompressed_size)?;
        }
        self.pending_size -= uncompressed_size;
        self.lzma.reset_uncompressed_size();
        self.rc.reset_buffer();
        Ok(())
    }

    /// Drains every chunk the match finder can currently produce, then
    /// writes the LZMA2 end-of-stream marker. Consumes the writer since
    /// no further writes are meaningful afterward.
    pub fn finish(mut self) -> Result<W> {
        self.lzma.lz.set_finishing();
        while self.pending_size > 0 {
            self.lzma.encode_for_lzma2(&mut self.rc)?;
            self.write_chunk()?;
        }
        self.inner.write_all(&[0x00])?;
        self.finished = true;
        Ok(self.inner)
    }
}

impl<W: Write> Write for Lzma2Writer<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut off = 0;
        let mut remaining = buf.len();
        while remaining > 0 {
            let used = self.lzma.lz.fill_window(&buf[off..off + remaining]);
            off += used;
            remaining -= used;
            self.pending_size += used as u32;
            if self.lzma.encode_for_lzma2(&mut self.rc)? {
                self.write_chunk()?;
            }
        }
        Ok(off)
    }

    fn flush(&mut self) -> Result<()> {
        self.lzma.lz.set_flushing();
        while self.pending_size > 0 {
            self.lzma.encode_for_lzma2(&mut self.rc)?;
            self.write_chunk()?;
        }
        self.inner.flush()
    }
}

impl<W> Drop for Lzma2Writer<W> {
    fn drop(&mut self) {
        debug_assert!(
            self.finished || self.pending_size == 0,
            "Lzma2Writer dropped with unflushed data; call finish() first"
        );
    }
}
