use crate::{
    decoder::LzmaDecoder,
    error::{error_bad_termination, error_config, error_uncompressed_size_mismatch},
    lz::LzDecoder,
    range_dec::RangeDecoder,
    ByteReader, Properties, Read, Result, DICT_SIZE_MIN,
};

/// A single-threaded LZMA1 decompressor.
///
/// # Examples
/// ```ignore
/// use std::io::Read;
///
/// use lzma2_codec_core::LzmaReader;
///
/// // `compressed` holds a classic 13-byte-header `.lzma` stream.
/// let mut reader = LzmaReader::new(compressed.as_slice()).unwrap();
/// let mut decompressed = Vec::new();
/// reader.read_to_end(&mut decompressed).unwrap();
/// ```
pub struct LzmaReader<R> {
    rc: Option<RangeDecoder<R>>,
    lz: LzDecoder,
    lzma: LzmaDecoder,
    remaining: u64,
    end_reached: bool,
}

impl<R> LzmaReader<R> {
    /// Unwraps the reader, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.rc.expect("reader already consumed").into_inner()
    }
}

impl<R: Read> LzmaReader<R> {
    /// Returns a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut R {
        self.rc.as_mut().expect("reader already consumed").inner_mut()
    }

    /// Parses the classic 13-byte `.lzma` header (1 properties byte, a
    /// little-endian `u32` dictionary size, and a little-endian `u64`
    /// uncompressed size where all-ones means "unknown, rely on the
    /// end-of-stream marker") and builds a reader from it.
    pub fn new(mut inner: R) -> Result<Self> {
        let props_byte = inner.read_u8()?;
        let props = Properties::from_byte(props_byte)?;
        let dict_size_header = inner.read_u32()?;
        let uncomp_size = inner.read_u64()?;
        let dict_size = dict_size_header.max(DICT_SIZE_MIN);
        Self::new_with_props(inner, uncomp_size, props, dict_size, None)
    }

    /// Builds a reader directly from already-known properties, without
    /// reading any header from `inner`. `uncomp_size == u64::MAX` means
    /// the uncompressed size is unknown and the stream must end with the
    /// LZMA end-of-stream marker.
    pub fn new_with_props(
        inner: R,
        uncomp_size: u64,
        props: Properties,
        dict_size: u32,
        preset_dict: Option<&[u8]>,
    ) -> Result<Self> {
        if dict_size < DICT_SIZE_MIN {
            return Err(error_config("dictionary size below the minimum of 4 KiB"));
        }
        let lz = LzDecoder::new(dict_size as usize, preset_dict);
        let rc = RangeDecoder::new(inner)?;
        let lzma = LzmaDecoder::new(props.lc(), props.lp(), props.pb());
        Ok(Self {
            rc: Some(rc),
            lz,
            lzma,
            remaining: uncomp_size,
            end_reached: false,
        })
    }
}

impl<R: Read> Read for LzmaReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || self.end_reached {
            return Ok(0);
        }

        let mut size = 0usize;
        let mut off = 0usize;
        let mut len = buf.len();

        while len > 0 {
            if self.remaining == 0 {
                self.end_reached = true;
                break;
            }

            let copy_size_max = if self.remaining == u64::MAX {
                len
            } else {
                self.remaining.min(len as u64) as usize
            };

            self.lz.set_limit(copy_size_max);
            let rc = self.rc.as_mut().expect("reader already consumed");
            self.lzma.decode(&mut self.lz, rc)?;

            let copied = self.lz.flush(buf, off)?;
            off += copied;
            len -= copied;
            size += copied;
            if self.remaining != u64::MAX {
                self.remaining -= copied as u64;
            }

            if self.lzma.end_reached {
                self.end_reached = true;
                if self.remaining != u64::MAX && self.remaining != 0 {
                    return Err(error_uncompressed_size_mismatch(
                        "end-of-stream marker appeared before the declared size was reached",
                    ));
                }
                if !rc.is_finished() {
                    return Err(error_bad_termination(
                        "range coder was not finished at the end-of-stream marker",
                    ));
                }
                break;
            }

            if self.remaining == 0 {
                self.end_reached = true;
                break;
            }

            if copied == 0 {
                // No forward progress was made and no terminal condition
                // was hit: the source has nothing more to offer this call.
                break;
            }
        }

        Ok(size)
    }
}
