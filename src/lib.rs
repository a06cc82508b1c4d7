//! Core LZMA and LZMA2 compression and decompression.
//!
//! This crate implements the LZMA1 and LZMA2 coding algorithms: the
//! range coder, the literal/length/distance probability models, the
//! sliding-window dictionary, and (with the `encoder` feature) greedy
//! match-finding encoders. It does not implement the `.xz` or `.lzma`
//! container formats, checksums, or a command-line tool — callers
//! needing those should layer them on top.
//!
//! With the default `std` feature, [`LzmaReader`]/[`Lzma2Reader`] and
//! (with `encoder`) [`LzmaWriter`]/[`Lzma2Writer`] work directly over
//! `std::io::Read`/`std::io::Write`. Without `std`, the crate is
//! `no_std + alloc` and callers implement the local [`Read`]/[`Write`]
//! traits themselves.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod decoder;
#[cfg(feature = "encoder")]
pub mod enc;
mod error;
mod io;
mod lz;
mod lzma2_reader;
mod lzma_reader;
mod range_dec;
mod state;

pub use error::{Error, ErrorKind, Result};
pub use io::{Read, Write};
pub(crate) use io::{ByteReader, ByteWriter};
pub(crate) use error::*;

pub use lz::MfType;
pub use lzma2_reader::{get_memory_usage as lzma2_get_memory_usage, Lzma2Reader};
pub use lzma_reader::LzmaReader;

#[cfg(feature = "encoder")]
pub use enc::{Lzma2Writer, LzmaWriter};

use alloc::vec::Vec;

/// Minimum length (in bytes) of a back-reference match.
pub(crate) const MATCH_LEN_MIN: usize = 2;
/// Maximum length (in bytes) of a back-reference match.
pub const MATCH_LEN_MAX: usize = MATCH_LEN_MIN + LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + LEN_HIGH_SYMBOLS - 1;

pub(crate) const LEN_LOW_SYMBOLS: usize = 8;
pub(crate) const LEN_MID_SYMBOLS: usize = 8;
pub(crate) const LEN_HIGH_SYMBOLS: usize = 256;
pub(crate) const LEN_LOW_BITS: u32 = 3;
pub(crate) const LEN_MID_BITS: u32 = 3;
pub(crate) const LEN_HIGH_BITS: u32 = 8;

pub(crate) const STATES: usize = 12;
pub(crate) const POS_STATES_MAX: usize = 1 << 4;

pub(crate) const DIST_SLOT_BITS: u32 = 6;
pub(crate) const DIST_SLOTS: usize = 1 << DIST_SLOT_BITS;
pub(crate) const DIST_STATES: usize = 4;
pub(crate) const ALIGN_BITS: u32 = 4;
pub(crate) const ALIGN_SIZE: usize = 1 << ALIGN_BITS;
pub(crate) const END_POS_MODEL_INDEX: u32 = 14;
pub(crate) const FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX >> 1);

/// Default dictionary size used when a caller doesn't otherwise specify one.
pub(crate) const DICT_SIZE_DEFAULT: u32 = 8 << 20;

/// Minimum number of output bytes the window must keep around after the
/// active position so `MATCH_LEN_MAX`-byte matches can always be
/// extended and read back.
pub(crate) const DICT_SIZE_MIN: u32 = 1 << 12;

/// The validated `(lc, lp, pb)` literal/position-context triple shared by
/// LZMA1 headers and LZMA2 chunk properties.
///
/// `lc` is the number of high bits of the previous byte used to select a
/// literal sub-coder, `lp` is the number of low position bits folded into
/// that same selection, and `pb` is the number of low position bits used
/// to select the match/literal and length contexts. The LZMA1 format
/// allows `lc + lp <= 4` is not enforced, but LZMA2 requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    lc: u32,
    lp: u32,
    pb: u32,
}

impl Properties {
    /// Default used by [`LzmaOptions::with_preset`]: `lc=3, lp=0, pb=2`.
    pub const DEFAULT: Self = Self { lc: 3, lp: 0, pb: 2 };

    /// Validates and constructs a properties triple.
    ///
    /// `lc`, `lp`, and `pb` must each be at most 4, and `lc + lp` must
    /// not exceed 4 (the constraint LZMA2 enforces on every chunk; this
    /// crate applies it uniformly to LZMA1 too).
    pub fn new(lc: u32, lp: u32, pb: u32) -> Result<Self> {
        if lc > 8 || lp > 4 || pb > 4 || lc + lp > 4 {
            return Err(error::error_bad_properties(alloc::format!(
                "invalid lc/lp/pb: {lc}/{lp}/{pb}"
            )));
        }
        Ok(Self { lc, lp, pb })
    }

    pub fn lc(&self) -> u32 {
        self.lc
    }

    pub fn lp(&self) -> u32 {
        self.lp
    }

    pub fn pb(&self) -> u32 {
        self.pb
    }

    /// Decodes the single properties byte used by the LZMA1 header and
    /// LZMA2 chunk framing: `(pb * 5 + lp) * 9 + lc`.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let mut d = byte as u32;
        if d >= 9 * 5 * 5 {
            return Err(error::error_bad_properties(alloc::format!(
                "properties byte out of range: {byte}"
            )));
        }
        let lc = d % 9;
        d /= 9;
        let lp = d % 5;
        let pb = d / 5;
        Self::new(lc, lp, pb)
    }

    /// Encodes back to the single properties byte form.
    pub fn to_byte(self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encoder-facing configuration: literal/position context plus the
/// match-finder and dictionary knobs that only matter when compressing.
///
/// Decoders only ever need [`Properties`] plus a dictionary size; this
/// wider struct exists so callers can go from a single preset level
/// (`0..=9`, mirroring `xz -0` .. `xz -9`) to a full set of encoder
/// parameters the way the reference implementation's CLI does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzmaOptions {
    pub lc: u32,
    pub lp: u32,
    pub pb: u32,
    pub dict_size: u32,
    pub nice_len: u32,
    pub depth_limit: i32,
    pub mf: MfType,
}

impl LzmaOptions {
    /// Dictionary size used by [`Self::with_preset`] at every level.
    pub const DICT_SIZE_DEFAULT: u32 = DICT_SIZE_DEFAULT;

    /// Builds options matching one of the ten standard presets (`0..=9`),
    /// the same ladder `xz`'s `-0` through `-9 -e` map onto.
    pub fn with_preset(preset: u32) -> Self {
        let preset = preset.min(9);
        let (dict_size, nice_len, mf, depth_limit) = match preset {
            0 => (1 << 18, 32, MfType::Hc4, 4),
            1 => (1 << 20, 32, MfType::Hc4, 8),
            2 => (1 << 21, 32, MfType::Hc4, 16),
            3 => (1 << 22, 32, MfType::Bt4, 0),
            4 => (1 << 22, 16, MfType::Bt4, 0),
            5 => (1 << 23, 32, MfType::Bt4, 0),
            6 => (1 << 23, 64, MfType::Bt4, 0),
            7 => (1 << 24, 64, MfType::Bt4, 0),
            8 => (1 << 25, 64, MfType::Bt4, 0),
            _ => (1 << 26, 64, MfType::Bt4, 0),
        };
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
            dict_size,
            nice_len,
            depth_limit,
            mf,
        }
    }

    pub fn set_preset(&mut self, preset: u32) {
        *self = Self::with_preset(preset);
    }

    pub(crate) fn properties(&self) -> Result<Properties> {
        Properties::new(self.lc, self.lp, self.pb)
    }
}

impl Default for LzmaOptions {
    fn default() -> Self {
        Self::with_preset(6)
    }
}

/// One literal sub-coder's 0x300 context probabilities.
///
/// The `0x300` layout packs three regions together: `[0x100..0x200)` is
/// used while decoding a literal following a match (compared bit-by-bit
/// against the matched byte), and `[0x001..0x100)` / the implicit node-1
/// root cover the plain bit-tree used after another literal.
pub(crate) struct LiteralSubCoder {
    probs: [u16; 0x300],
}

impl Default for LiteralSubCoder {
    fn default() -> Self {
        Self {
            probs: [range_dec::PROB_INIT; 0x300],
        }
    }
}

impl LiteralSubCoder {
    #[inline(always)]
    pub(crate) fn prob_mut(&mut self, index: usize) -> &mut u16 {
        &mut self.probs[index]
    }
}

pub(crate) struct LiteralCoder {
    lc: u32,
    lp: u32,
    coders: Vec<LiteralSubCoder>,
}

impl LiteralCoder {
    pub(crate) fn new(lc: u32, lp: u32) -> Self {
        let count = 1usize << (lc + lp);
        let mut coders = Vec::with_capacity(count);
        coders.resize_with(count, LiteralSubCoder::default);
        Self { lc, lp, coders }
    }

    pub(crate) fn reset(&mut self) {
        for c in self.coders.iter_mut() {
            c.probs = [range_dec::PROB_INIT; 0x300];
        }
    }

    #[inline(always)]
    pub(crate) fn get_sub_coder_index(&self, prev_byte: u8, pos: u32) -> usize {
        let low = (prev_byte as u32) >> (8 - self.lc);
        let high = (pos & ((1 << self.lp) - 1)) << self.lc;
        (low | high) as usize
    }

    #[inline(always)]
    pub(crate) fn get_sub_coder(&mut self, prev_byte: u8, pos: u32) -> &mut LiteralSubCoder {
        let idx = self.get_sub_coder_index(prev_byte, pos);
        &mut self.coders[idx]
    }
}

/// Shared length-coder probabilities, used for both match lengths and
/// (in the encoder) rep-match lengths.
pub(crate) struct LengthCoder {
    choice: u16,
    choice2: u16,
    low: [[u16; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
    mid: [[u16; LEN_MID_SYMBOLS]; POS_STATES_MAX],
    high: [u16; LEN_HIGH_SYMBOLS],
}

impl Default for LengthCoder {
    fn default() -> Self {
        Self {
            choice: range_dec::PROB_INIT,
            choice2: range_dec::PROB_INIT,
            low: [[range_dec::PROB_INIT; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
            mid: [[range_dec::PROB_INIT; LEN_MID_SYMBOLS]; POS_STATES_MAX],
            high: [range_dec::PROB_INIT; LEN_HIGH_SYMBOLS],
        }
    }
}

impl LengthCoder {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decodes one length symbol (`0..=271`, i.e. before adding
    /// [`MATCH_LEN_MIN`]) using the choice bits to pick the low/mid/high range.
    pub(crate) fn decode<IB: range_dec::InByte>(
        &mut self,
        rc: &mut range_dec::RangeDecoder<IB>,
        pos_state: usize,
    ) -> Result<u32> {
        if rc.decode_bit(&mut self.choice)? == 0 {
            return rc.decode_bit_tree(&mut self.low[pos_state]);
        }
        if rc.decode_bit(&mut self.choice2)? == 0 {
            return Ok(LEN_LOW_SYMBOLS as u32 + rc.decode_bit_tree(&mut self.mid[pos_state])?);
        }
        Ok((LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32 + rc.decode_bit_tree(&mut self.high)?)
    }

    /// Encodes one length symbol (`0..=271`, i.e. already minus
    /// [`MATCH_LEN_MIN`]), mirroring [`Self::decode`].
    #[cfg(feature = "encoder")]
    pub(crate) fn encode<W: crate::enc::range_enc::OutByte>(
        &mut self,
        rc: &mut crate::enc::range_enc::RangeEncoder<W>,
        pos_state: usize,
        len: u32,
    ) -> Result<()> {
        if len < LEN_LOW_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice, 0)?;
            rc.encode_bit_tree(&mut self.low[pos_state], len)
        } else if len < (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32 {
            rc.encode_bit(&mut self.choice, 1)?;
            rc.encode_bit(&mut self.choice2, 0)?;
            rc.encode_bit_tree(&mut self.mid[pos_state], len - LEN_LOW_SYMBOLS as u32)
        } else {
            rc.encode_bit(&mut self.choice, 1)?;
            rc.encode_bit(&mut self.choice2, 1)?;
            rc.encode_bit_tree(&mut self.high, len - (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32)
        }
    }
}
