use alloc::{vec, vec::Vec};

use crate::{
    error::{error_bad_header, error_bad_termination, error_config, error_unexpected_eof},
    Read, ByteReader,
};

const TOP_VALUE: u32 = 1 << 24;
pub(crate) const BIT_MODEL_TOTAL_BITS: u32 = 11;
pub(crate) const BIT_MODEL_TOTAL: u32 = 1 << BIT_MODEL_TOTAL_BITS;
pub(crate) const MOVE_BITS: u32 = 5;
pub(crate) const PROB_INIT: u16 = (BIT_MODEL_TOTAL / 2) as u16;

/// A single byte source the range decoder pulls renormalization bytes
/// from. Implemented once for anything that is [`Read`] and once more
/// for [`RangeDecoderBuffer`], which has no stream of its own.
pub(crate) trait InByte {
    fn read_byte(&mut self) -> crate::Result<u8>;
}

impl<R: Read> InByte for R {
    #[inline(always)]
    fn read_byte(&mut self) -> crate::Result<u8> {
        ByteReader::read_u8(self)
    }
}

/// A fixed-capacity byte buffer pre-loaded with one LZMA2 chunk's worth
/// of compressed bytes. Decoupling the range decoder from the LZMA2
/// reader's own byte source lets a chunk's coder state be reset without
/// fighting the outer `Read` impl's borrow.
pub(crate) struct RangeDecoderBuffer {
    buf: Vec<u8>,
    pos: usize,
    len: usize,
}

impl RangeDecoderBuffer {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            buf: vec![0; max_size],
            pos: 0,
            len: 0,
        }
    }

    fn fill<R: Read>(&mut self, reader: &mut R, len: usize) -> crate::Result<()> {
        if len > self.buf.len() {
            return Err(error_config(
                "LZMA2 compressed chunk size exceeds the decoder's buffer capacity",
            ));
        }
        reader.read_exact(&mut self.buf[..len])?;
        self.pos = 0;
        self.len = len;
        Ok(())
    }
}

impl InByte for RangeDecoderBuffer {
    #[inline(always)]
    fn read_byte(&mut self) -> crate::Result<u8> {
        if self.pos >= self.len {
            return Err(error_unexpected_eof("LZMA2 chunk exhausted mid-symbol"));
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }
}

/// The LZMA range decoder: an adaptive binary arithmetic decoder with
/// 11-bit probabilities.
pub(crate) struct RangeDecoder<R> {
    inner: R,
    code: u32,
    range: u32,
}

impl<R: InByte> RangeDecoder<R> {
    #[inline(always)]
    fn normalize(&mut self) -> crate::Result<()> {
        if self.range < TOP_VALUE {
            self.code = (self.code << 8) | self.inner.read_byte()? as u32;
            self.range <<= 8;
        }
        Ok(())
    }

    /// Decodes one bit using and adapting `prob`.
    #[inline(always)]
    pub(crate) fn decode_bit(&mut self, prob: &mut u16) -> crate::Result<u32> {
        self.normalize()?;
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * (*prob as u32);
        let bit = if self.code < bound {
            self.range = bound;
            *prob += ((BIT_MODEL_TOTAL - *prob as u32) >> MOVE_BITS) as u16;
            0
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> MOVE_BITS;
            1
        };
        Ok(bit)
    }

    /// Decodes `count` bits with a uniform (non-adaptive) distribution.
    pub(crate) fn decode_direct_bits(&mut self, count: u32) -> crate::Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            self.normalize()?;
            self.range >>= 1;
            self.code = self.code.wrapping_sub(self.range);
            let t = 0u32.wrapping_sub(self.code >> 31);
            self.code = self.code.wrapping_add(self.range & t);
            result = (result << 1).wrapping_add(t.wrapping_add(1));
        }
        Ok(result)
    }

    /// Decodes a symbol coded with a forward bit tree of `probs.len()` leaves.
    pub(crate) fn decode_bit_tree(&mut self, probs: &mut [u16]) -> crate::Result<u32> {
        let mut node = 1usize;
        let limit = probs.len();
        while node < limit {
            node = (node << 1) + self.decode_bit(&mut probs[node])? as usize;
        }
        Ok((node - limit) as u32)
    }

    /// Decodes a symbol coded with a reverse (LSB-first) bit tree.
    pub(crate) fn decode_reverse_bit_tree(&mut self, probs: &mut [u16]) -> crate::Result<u32> {
        let mut node = 1usize;
        let mut result = 0u32;
        let mut i = 0u32;
        while node < probs.len() {
            let bit = self.decode_bit(&mut probs[node])?;
            node = (node << 1) + bit as usize;
            result |= bit << i;
            i += 1;
        }
        Ok(result)
    }

    /// True once the coder has consumed all meaningful precision — the
    /// expected state at the end of a well-formed stream or chunk.
    #[inline(always)]
    pub(crate) fn is_finished(&self) -> bool {
        self.code == 0
    }
}

impl<R: Read> RangeDecoder<R> {
    /// Reads the 5-byte range coder initializer directly from `inner`.
    /// Used for LZMA1 streams, which have no chunk framing of their own.
    pub(crate) fn new(mut inner: R) -> crate::Result<Self> {
        let b0 = inner.read_u8()?;
        if b0 != 0 {
            return Err(error_bad_header("range coder initializer byte must be 0"));
        }
        let mut code = 0u32;
        for _ in 0..4 {
            code = (code << 8) | inner.read_u8()? as u32;
        }
        Ok(Self {
            inner,
            code,
            range: 0xFFFF_FFFF,
        })
    }

    pub(crate) fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl RangeDecoder<RangeDecoderBuffer> {
    /// Creates a decoder whose renormalization bytes come from an
    /// internal buffer rather than directly from a stream; `max_size`
    /// should be the largest compressed chunk size the format allows.
    pub(crate) fn new_buffer(max_size: usize) -> Self {
        Self {
            inner: RangeDecoderBuffer::new(max_size),
            code: 0,
            range: 0xFFFF_FFFF,
        }
    }

    /// Loads the next `len` compressed bytes from `reader` and
    /// re-initializes the coder state from their first 5 bytes, as
    /// required at the start of every LZMA2 compressed chunk.
    pub(crate) fn prepare<R: Read>(&mut self, reader: &mut R, len: usize) -> crate::Result<()> {
        if len < 5 {
            return Err(error_bad_header("LZMA2 chunk too short for range coder init"));
        }
        self.inner.fill(reader, len)?;
        let b0 = self.inner.read_byte()?;
        if b0 != 0 {
            return Err(error_bad_termination("range coder initializer byte must be 0"));
        }
        let mut code = 0u32;
        for _ in 0..4 {
            code = (code << 8) | self.inner.read_byte()? as u32;
        }
        self.code = code;
        self.range = 0xFFFF_FFFF;
        Ok(())
    }
}
