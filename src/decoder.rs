use alloc::vec::Vec;

use crate::{
    error::error_bad_distance,
    lz::LzDecoder,
    range_dec::{InByte, RangeDecoder, PROB_INIT},
    state::State,
    LiteralCoder, LengthCoder, ALIGN_BITS, ALIGN_SIZE, DIST_SLOTS, DIST_STATES, END_POS_MODEL_INDEX,
    MATCH_LEN_MIN, POS_STATES_MAX, STATES,
};

/// All adaptive probabilities and the small amount of history (the
/// state machine's current state plus the four most recent repeat
/// distances) the LZMA1 core needs, shared verbatim between the decoder
/// and (in the `encoder` feature) the encoder's mirrored bookkeeping.
pub(crate) struct LzmaCoder {
    pub(crate) pos_mask: u32,
    pub(crate) literal_coder: LiteralCoder,
    pub(crate) is_match: [[u16; POS_STATES_MAX]; STATES],
    pub(crate) is_rep: [u16; STATES],
    pub(crate) is_rep_g0: [u16; STATES],
    pub(crate) is_rep_g1: [u16; STATES],
    pub(crate) is_rep_g2: [u16; STATES],
    pub(crate) is_rep0_long: [[u16; POS_STATES_MAX]; STATES],
    pub(crate) dist_slots: [[u16; DIST_SLOTS]; DIST_STATES],
    pub(crate) dist_special: Vec<Vec<u16>>,
    pub(crate) dist_align: [u16; ALIGN_SIZE],
    pub(crate) reps: [i32; 4],
    pub(crate) state: State,
}

impl LzmaCoder {
    pub(crate) fn new(lc: u32, lp: u32, pb: u32) -> Self {
        let mut dist_special = Vec::with_capacity((END_POS_MODEL_INDEX - 4) as usize);
        for slot in 4u32..END_POS_MODEL_INDEX {
            let footer_bits = (slot >> 1) - 1;
            dist_special.push(alloc::vec![PROB_INIT; 1usize << footer_bits]);
        }
        Self {
            pos_mask: (1 << pb) - 1,
            literal_coder: LiteralCoder::new(lc, lp),
            is_match: [[PROB_INIT; POS_STATES_MAX]; STATES],
            is_rep: [PROB_INIT; STATES],
            is_rep_g0: [PROB_INIT; STATES],
            is_rep_g1: [PROB_INIT; STATES],
            is_rep_g2: [PROB_INIT; STATES],
            is_rep0_long: [[PROB_INIT; POS_STATES_MAX]; STATES],
            dist_slots: [[PROB_INIT; DIST_SLOTS]; DIST_STATES],
            dist_special,
            dist_align: [PROB_INIT; ALIGN_SIZE],
            reps: [0; 4],
            state: State::default(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.literal_coder.reset();
        self.is_match = [[PROB_INIT; POS_STATES_MAX]; STATES];
        self.is_rep = [PROB_INIT; STATES];
        self.is_rep_g0 = [PROB_INIT; STATES];
        self.is_rep_g1 = [PROB_INIT; STATES];
        self.is_rep_g2 = [PROB_INIT; STATES];
        self.is_rep0_long = [[PROB_INIT; POS_STATES_MAX]; STATES];
        self.dist_slots = [[PROB_INIT; DIST_SLOTS]; DIST_STATES];
        for s in self.dist_special.iter_mut() {
            s.iter_mut().for_each(|p| *p = PROB_INIT);
        }
        self.dist_align = [PROB_INIT; ALIGN_SIZE];
        self.reps = [0; 4];
        self.state.reset();
    }
}

/// The LZMA1 decoding core: drives the range decoder against [`LzDecoder`]
/// until the chunk/stream's declared size is reached or (for LZMA1's
/// "unknown size" mode) the end-of-stream marker distance is decoded.
pub(crate) struct LzmaDecoder {
    coder: LzmaCoder,
    match_len_decoder: LengthCoder,
    rep_len_decoder: LengthCoder,
    pub(crate) end_reached: bool,
}

impl LzmaDecoder {
    pub(crate) fn new(lc: u32, lp: u32, pb: u32) -> Self {
        Self {
            coder: LzmaCoder::new(lc, lp, pb),
            match_len_decoder: LengthCoder::default(),
            rep_len_decoder: LengthCoder::default(),
            end_reached: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.coder.reset();
        self.match_len_decoder.reset();
        self.rep_len_decoder.reset();
        self.end_reached = false;
    }

    fn decode_literal<IB: InByte>(
        &mut self,
        lz: &mut LzDecoder,
        rc: &mut RangeDecoder<IB>,
    ) -> crate::Result<()> {
        let prev_byte = if lz.get_pos() == 0 { 0 } else { lz.get_byte(0) };
        let pos = lz.get_pos() as u32;
        let sub = self.coder.literal_coder.get_sub_coder(prev_byte, pos);

        let mut symbol = 1u32;
        if self.coder.state.is_literal() {
            while symbol < 0x100 {
                let bit = rc.decode_bit(&mut sub_prob(sub, symbol as usize))?;
                symbol = (symbol << 1) | bit;
            }
        } else {
            let mut match_byte = lz.get_byte(self.coder.reps[0] as usize) as u32;
            while symbol < 0x100 {
                let match_bit = (match_byte >> 7) & 1;
                match_byte <<= 1;
                let idx = (((1 + match_bit) << 8) + symbol) as usize;
                let bit = rc.decode_bit(&mut sub_prob(sub, idx))?;
                symbol = (symbol << 1) | bit;
                if match_bit != bit {
                    break;
                }
            }
            while symbol < 0x100 {
                let bit = rc.decode_bit(&mut sub_prob(sub, symbol as usize))?;
                symbol = (symbol << 1) | bit;
            }
        }

        lz.put_byte((symbol & 0xFF) as u8);
        self.coder.state.update_literal();
        Ok(())
    }

    fn decode_distance<IB: InByte>(
        &mut self,
        rc: &mut RangeDecoder<IB>,
        len: u32,
    ) -> crate::Result<u32> {
        let len_state = ((len - MATCH_LEN_MIN as u32) as usize).min(DIST_STATES - 1);
        let dist_slot = rc.decode_bit_tree(&mut self.coder.dist_slots[len_state])?;
        if dist_slot < 4 {
            return Ok(dist_slot);
        }

        let footer_bits = (dist_slot >> 1) - 1;
        let base = (2 | (dist_slot & 1)) << footer_bits;

        if dist_slot < END_POS_MODEL_INDEX {
            let probs = &mut self.coder.dist_special[(dist_slot - 4) as usize];
            Ok(base + rc.decode_reverse_bit_tree(probs)?)
        } else {
            let direct = rc.decode_direct_bits(footer_bits - ALIGN_BITS)?;
            let aligned = rc.decode_reverse_bit_tree(&mut self.coder.dist_align)?;
            Ok(base + (direct << ALIGN_BITS) + aligned)
        }
    }

    /// Decodes symbols until `lz`'s chunk limit is reached, the
    /// end-of-stream marker is seen (setting [`Self::end_reached`]), or a
    /// decoding error occurs.
    pub(crate) fn decode<IB: InByte>(
        &mut self,
        lz: &mut LzDecoder,
        rc: &mut RangeDecoder<IB>,
    ) -> crate::Result<()> {
        while lz.has_space() {
            let pos_state = (lz.get_pos() as u32) & self.coder.pos_mask;
            let state_idx = self.coder.state.get();

            if rc.decode_bit(&mut self.coder.is_match[state_idx][pos_state as usize])? == 0 {
                self.decode_literal(lz, rc)?;
                continue;
            }

            let len;
            if rc.decode_bit(&mut self.coder.is_rep[state_idx])? != 0 {
                // Repeat match: choose which of the four recent distances to reuse.
                if rc.decode_bit(&mut self.coder.is_rep_g0[state_idx])? == 0 {
                    if rc.decode_bit(&mut self.coder.is_rep0_long[state_idx][pos_state as usize])?
                        == 0
                    {
                        self.coder.state.update_short_rep();
                        let byte = lz.get_byte(self.coder.reps[0] as usize);
                        lz.put_byte(byte);
                        continue;
                    }
                } else {
                    let dist;
                    if rc.decode_bit(&mut self.coder.is_rep_g1[state_idx])? == 0 {
                        dist = self.coder.reps[1];
                    } else if rc.decode_bit(&mut self.coder.is_rep_g2[state_idx])? == 0 {
                        dist = self.coder.reps[2];
                        self.coder.reps[2] = self.coder.reps[1];
                    } else {
                        dist = self.coder.reps[3];
                        self.coder.reps[3] = self.coder.reps[2];
                        self.coder.reps[2] = self.coder.reps[1];
                    }
                    self.coder.reps[1] = self.coder.reps[0];
                    self.coder.reps[0] = dist;
                }
                len = self
                    .rep_len_decoder
                    .decode(rc, pos_state as usize)?
                    .saturating_add(MATCH_LEN_MIN as u32);
                self.coder.state.update_rep();
            } else {
                self.coder.reps[3] = self.coder.reps[2];
                self.coder.reps[2] = self.coder.reps[1];
                self.coder.reps[1] = self.coder.reps[0];
                len = self
                    .match_len_decoder
                    .decode(rc, pos_state as usize)?
                    .saturating_add(MATCH_LEN_MIN as u32);
                self.coder.state.update_match();
                let dist = self.decode_distance(rc, len)?;
                if dist == u32::MAX {
                    self.end_reached = true;
                    return Ok(());
                }
                self.coder.reps[0] = dist as i32;
            }

            lz.repeat(self.coder.reps[0] as usize, len as usize)
                .map_err(|_| error_bad_distance("decoded distance exceeds available dictionary content"))?;
        }
        Ok(())
    }
}

/// Indexes into a literal sub-coder's flat probability array.
///
/// The context byte and bit-tree node are folded into a single `0x300`
/// array, so every access goes through this helper rather than a nested
/// index, matching the layout [`crate::LiteralSubCoder`] documents.
#[inline(always)]
fn sub_prob(sub: &mut crate::LiteralSubCoder, index: usize) -> &mut u16 {
    sub.prob_mut(index)
}
