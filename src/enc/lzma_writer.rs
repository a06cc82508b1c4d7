use super::{encoder::LzmaEncoder, range_enc::RangeEncoder};
use crate::{error::error_config, ByteWriter, LzmaOptions, Result, Write, DICT_SIZE_MIN};

/// A single-threaded LZMA1 compressor.
///
/// # Examples
/// ```ignore
/// use std::io::Write;
///
/// use lzma2_codec_core::{LzmaOptions, LzmaWriter};
///
/// let mut compressed = Vec::new();
/// let mut writer = LzmaWriter::new(&mut compressed, LzmaOptions::default(), Some(13)).unwrap();
/// writer.write_all(b"Hello, world!").unwrap();
/// writer.finish().unwrap();
/// ```
pub struct LzmaWriter<W> {
    rc: RangeEncoder<W>,
    lzma: LzmaEncoder,
    props_byte: u8,
    dict_size: u32,
    uncomp_size: Option<u64>,
    finished: bool,
}

impl<W: Write> LzmaWriter<W> {
    /// Writes the classic 13-byte `.lzma` header, then prepares to
    /// stream-compress the bytes written via [`crate::Write::write`].
    /// `uncomp_size`, when known up front, is written verbatim into the
    /// header; `None` writes the all-ones "unknown" marker and relies on
    /// the LZMA end-of-stream marker written by [`Self::finish`].
    pub fn new(mut inner: W, options: LzmaOptions, uncomp_size: Option<u64>) -> Result<Self> {
        if options.dict_size < DICT_SIZE_MIN {
            return Err(error_config("dictionary size below the minimum of 4 KiB"));
        }
        let props = options.properties()?;
        inner.write_all(&[props.to_byte()])?;
        ByteWriter::write_u32(&mut inner, options.dict_size)?;
        ByteWriter::write_u64(&mut inner, uncomp_size.unwrap_or(u64::MAX))?;

        let lzma = LzmaEncoder::new(
            props,
            options.mf,
            options.depth_limit,
            options.dict_size,
            options.nice_len,
            0,
            0,
        );
        Ok(Self {
            rc: RangeEncoder::new(inner),
            lzma,
            props_byte: props.to_byte(),
            dict_size: options.dict_size,
            uncomp_size,
            finished: false,
        })
    }

    /// Returns a mutable reference to the inner writer.
    pub fn inner_mut(&mut self) -> &mut W {
        self.rc.inner_mut()
    }

    /// Unwraps the writer, returning the underlying writer. Panics if
    /// [`Self::finish`] has not been called.
    pub fn into_inner(self) -> W {
        assert!(self.finished, "LzmaWriter must be finished before unwrapping");
        self.rc.into_inner()
    }

    /// Flushes all buffered input through the encoder, writes the
    /// end-of-stream marker (when the uncompressed size wasn't declared
    /// up front) and the range coder's final bytes. The writer must not
    /// be used for further writes afterward.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.lzma.lz.set_finishing();
        self.lzma.encode_for_lzma1(&mut self.rc)?;
        if self.uncomp_size.is_none() {
            self.lzma.encode_end_marker(&mut self.rc)?;
        }
        self.rc.finish()?;
        self.finished = true;
        Ok(())
    }

    /// Encoder memory usage in KiB at the given dictionary size, mirroring
    /// [`crate::lzma2_get_memory_usage`]'s role on the decode side.
    pub fn get_memory_usage(&self) -> u32 {
        let _ = self.props_byte;
        10 + (self.dict_size >> 10) * 3
    }
}

impl<W: Write> Write for LzmaWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.lzma.lz.fill_window(buf);
        self.lzma.encode_for_lzma1(&mut self.rc)?;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.rc.inner_mut().flush()
    }
}
