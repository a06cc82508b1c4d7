use alloc::{vec, vec::Vec};

use crate::{
    range_dec::{BIT_MODEL_TOTAL, BIT_MODEL_TOTAL_BITS, MOVE_BITS},
    Write,
};

const TOP_VALUE: u32 = 1 << 24;

/// A single byte sink the range encoder pushes renormalization bytes
/// to. Implemented once for anything that is [`Write`] and once more
/// for [`RangeEncoderBuffer`], which buffers a chunk's bytes for later
/// inspection (LZMA2 needs to know a chunk's compressed size before
/// deciding whether to keep it or fall back to an uncompressed chunk).
pub(crate) trait OutByte {
    fn write_byte(&mut self, b: u8) -> crate::Result<()>;
}

impl<W: Write> OutByte for W {
    #[inline(always)]
    fn write_byte(&mut self, b: u8) -> crate::Result<()> {
        self.write_all(&[b])
    }
}

/// A growable byte buffer the range encoder fills before the caller
/// decides what to do with the finished chunk.
pub(crate) struct RangeEncoderBuffer {
    buf: Vec<u8>,
}

impl RangeEncoderBuffer {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_size),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn write_to<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        out.write_all(&self.buf)
    }
}

impl OutByte for RangeEncoderBuffer {
    #[inline(always)]
    fn write_byte(&mut self, b: u8) -> crate::Result<()> {
        self.buf.push(b);
        Ok(())
    }
}

/// The LZMA range encoder: an adaptive binary arithmetic encoder with
/// 11-bit probabilities, mirroring [`crate::range_dec::RangeDecoder`]
/// bit for bit.
pub(crate) struct RangeEncoder<W> {
    inner: W,
    low: u64,
    range: u32,
    cache_size: u64,
    cache: u8,
}

impl<W: OutByte> RangeEncoder<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            low: 0,
            range: 0xFFFF_FFFF,
            cache_size: 1,
            cache: 0,
        }
    }

    pub(crate) fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }

    /// Encodes one bit, adapting `prob` the same way the decoder does.
    #[inline(always)]
    pub(crate) fn encode_bit(&mut self, prob: &mut u16, bit: u32) -> crate::Result<()> {
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * (*prob as u32);
        if bit == 0 {
            self.range = bound;
            *prob += ((BIT_MODEL_TOTAL - *prob as u32) >> MOVE_BITS) as u16;
        } else {
            self.low += bound as u64;
            self.range -= bound;
            *prob -= *prob >> MOVE_BITS;
        }
        while self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low()?;
        }
        Ok(())
    }

    /// Encodes `count` bits with a uniform (non-adaptive) distribution,
    /// MSB first.
    pub(crate) fn encode_direct_bits(&mut self, value: u32, count: u32) -> crate::Result<()> {
        for i in (0..count).rev() {
            self.range >>= 1;
            if (value >> i) & 1 != 0 {
                self.low += self.range as u64;
            }
            while self.range < TOP_VALUE {
                self.range <<= 8;
                self.shift_low()?;
            }
        }
        Ok(())
    }

    /// Encodes `symbol` (one of `probs.len()` leaves) as a forward
    /// (MSB-first) bit tree, mirroring [`crate::range_dec::RangeDecoder::decode_bit_tree`].
    pub(crate) fn encode_bit_tree(&mut self, probs: &mut [u16], symbol: u32) -> crate::Result<()> {
        let limit = probs.len() as u32;
        let mut node = 1u32;
        let mut i = limit.trailing_zeros();
        while i > 0 {
            i -= 1;
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut probs[node as usize], bit)?;
            node = (node << 1) | bit;
        }
        Ok(())
    }

    /// Encodes `symbol` as a reverse (LSB-first) bit tree, mirroring
    /// [`crate::range_dec::RangeDecoder::decode_reverse_bit_tree`].
    pub(crate) fn encode_reverse_bit_tree(
        &mut self,
        probs: &mut [u16],
        symbol: u32,
    ) -> crate::Result<()> {
        let mut node = 1usize;
        let mut symbol = symbol;
        while node < probs.len() {
            let bit = symbol & 1;
            symbol >>= 1;
            self.encode_bit(&mut probs[node], bit)?;
            node = (node << 1) + bit as usize;
        }
        Ok(())
    }

    /// Classic carry-propagating range-coder flush: `low`'s top byte is
    /// only emitted once it's known whether a pending carry from a later
    /// bit will bump it, which is why one byte of output always trails
    /// one `shift_low` call behind.
    fn shift_low(&mut self) -> crate::Result<()> {
        if (self.low as u32) < 0xFF00_0000 || (self.low >> 32) != 0 {
            let mut temp = self.cache;
            let carry = (self.low >> 32) as u8;
            loop {
                self.inner.write_byte(temp.wrapping_add(carry))?;
                temp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low as u32 as u64) << 8;
        Ok(())
    }

    /// Flushes the final five bytes, guaranteeing every byte that could
    /// still be affected by a pending carry has been written.
    pub(crate) fn finish(&mut self) -> crate::Result<()> {
        for _ in 0..5 {
            self.shift_low()?;
        }
        Ok(())
    }
}

impl RangeEncoder<RangeEncoderBuffer> {
    pub(crate) fn new_buffer(max_size: usize) -> Self {
        Self::new(RangeEncoderBuffer::new(max_size))
    }

    /// Bytes written so far into the buffer, including whatever a final
    /// [`Self::finish`] would still need to flush.
    pub(crate) fn get_pending_size(&self) -> usize {
        self.inner.len()
    }

    /// Resets the coder to encode a fresh chunk into a cleared buffer.
    pub(crate) fn reset_buffer(&mut self) {
        self.inner.clear();
        self.low = 0;
        self.range = 0xFFFF_FFFF;
        self.cache_size = 1;
        self.cache = 0;
    }

    /// Finishes the current chunk and returns its total compressed size.
    pub(crate) fn finish_buffer(&mut self) -> crate::Result<usize> {
        self.finish()?;
        Ok(self.inner.len())
    }

    pub(crate) fn write_to<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        self.inner.write_to(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range_dec::{RangeDecoder, PROB_INIT};

    /// A handful of bits round-tripped through the encoder and decoder
    /// with freshly-initialized (and therefore adapting) probabilities
    /// must come back out exactly as fed in.
    #[test]
    fn bit_round_trip() {
        let bits = [0u32, 1, 1, 0, 0, 0, 1, 1, 1, 0, 1, 0];
        let mut enc_prob = PROB_INIT;
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut rc = RangeEncoder::new(&mut buf);
            for &b in &bits {
                rc.encode_bit(&mut enc_prob, b).unwrap();
            }
            rc.finish().unwrap();
        }

        let mut dec_prob = PROB_INIT;
        let mut rc = RangeDecoder::new(buf.as_slice()).unwrap();
        for &b in &bits {
            assert_eq!(rc.decode_bit(&mut dec_prob).unwrap(), b);
        }
    }

    #[test]
    fn direct_bits_round_trip() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut rc = RangeEncoder::new(&mut buf);
            rc.encode_direct_bits(0x3A5, 12).unwrap();
            rc.finish().unwrap();
        }
        let mut rc = RangeDecoder::new(buf.as_slice()).unwrap();
        assert_eq!(rc.decode_direct_bits(12).unwrap(), 0x3A5);
    }
}
