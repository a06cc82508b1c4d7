use crate::{
    decoder::LzmaCoder,
    enc::range_enc::{OutByte, RangeEncoder},
    lz::{LzEncoder, MfType},
    LengthCoder, Properties, Result, ALIGN_BITS, ALIGN_SIZE, DIST_STATES, END_POS_MODEL_INDEX,
    MATCH_LEN_MAX, MATCH_LEN_MIN,
};

/// Largest uncompressed size an LZMA2 chunk may declare (`2 MiB`, minus
/// one match's worth of slack so a chunk never has to split a match).
pub(crate) const LZMA2_UNCOMPRESSED_LIMIT: u32 = (2 << 20) - MATCH_LEN_MAX as u32;
/// Largest compressed size an LZMA2 chunk's 16-bit size field can hold.
pub(crate) const LZMA2_COMPRESSED_LIMIT: usize = (64 << 10) - 26;

/// The LZMA1 encoding core: walks the match finder greedily, emitting
/// literals, repeat matches, and new matches, and keeps the same
/// adaptive state [`LzmaCoder`] the decoder uses.
pub(crate) struct LzmaEncoder {
    pub(crate) coder: LzmaCoder,
    pub(crate) lz: LzEncoder,
    match_len_encoder: LengthCoder,
    rep_len_encoder: LengthCoder,
    pub(crate) uncompressed_size: u32,
}

impl LzmaEncoder {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        props: Properties,
        mf: MfType,
        depth_limit: i32,
        dict_size: u32,
        nice_len: u32,
        extra_size_before: u32,
        extra_size_after: u32,
    ) -> Self {
        let nice_len = nice_len.clamp(MATCH_LEN_MIN as u32, MATCH_LEN_MAX as u32);
        let lz = match mf {
            MfType::Hc4 => LzEncoder::new_hc4(
                dict_size,
                extra_size_before,
                extra_size_after,
                nice_len,
                MATCH_LEN_MAX as u32,
                depth_limit,
            ),
            MfType::Bt4 => LzEncoder::new_bt4(
                dict_size,
                extra_size_before,
                extra_size_after,
                nice_len,
                MATCH_LEN_MAX as u32,
                depth_limit,
            ),
        };
        Self {
            coder: LzmaCoder::new(props.lc(), props.lp(), props.pb()),
            lz,
            match_len_encoder: LengthCoder::default(),
            rep_len_encoder: LengthCoder::default(),
            uncompressed_size: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.coder.reset();
        self.match_len_encoder.reset();
        self.rep_len_encoder.reset();
    }

    pub(crate) fn reset_uncompressed_size(&mut self) {
        self.uncompressed_size = 0;
    }

    /// Maps a full match distance to its 6-bit distance-slot symbol;
    /// the inverse of the decoder's base/footer reconstruction in
    /// `LzmaDecoder::decode_distance`.
    fn get_dist_slot(dist: u32) -> u32 {
        if dist < 4 {
            return dist;
        }
        let i = 31 - dist.leading_zeros();
        (i << 1) + ((dist >> (i - 1)) & 1)
    }

    fn encode_distance<W: OutByte>(
        &mut self,
        rc: &mut RangeEncoder<W>,
        len: u32,
        dist: u32,
    ) -> Result<()> {
        let len_state = ((len - MATCH_LEN_MIN as u32) as usize).min(DIST_STATES - 1);
        let dist_slot = Self::get_dist_slot(dist);
        rc.encode_bit_tree(&mut self.coder.dist_slots[len_state], dist_slot)?;

        if dist_slot < 4 {
            return Ok(());
        }

        let footer_bits = (dist_slot >> 1) - 1;
        let base = (2 | (dist_slot & 1)) << footer_bits;
        let dist_reduced = dist - base;

        if dist_slot < END_POS_MODEL_INDEX {
            let probs = &mut self.coder.dist_special[(dist_slot - 4) as usize];
            rc.encode_reverse_bit_tree(probs, dist_reduced)
        } else {
            rc.encode_direct_bits(dist_reduced >> ALIGN_BITS, footer_bits - ALIGN_BITS)?;
            rc.encode_reverse_bit_tree(
                &mut self.coder.dist_align,
                dist_reduced & (ALIGN_SIZE as u32 - 1),
            )
        }
    }

    /// Encodes the byte at the match finder's current position as a
    /// literal, mirroring `LzmaDecoder::decode_literal`'s bit order and
    /// sub-coder/index selection exactly, but in the encode direction.
    fn encode_literal<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<()> {
        let prev_byte = if self.lz.get_pos() == 0 {
            0
        } else {
            self.lz.get_byte_backward(1)
        };
        let pos = self.lz.get_pos() as u32;
        let cur_byte = self.lz.get_current_byte();
        let sub = self.coder.literal_coder.get_sub_coder(prev_byte, pos);

        let mut symbol = 1u32;
        if self.coder.state.is_literal() {
            for i in (0..8).rev() {
                let bit = ((cur_byte >> i) & 1) as u32;
                rc.encode_bit(sub.prob_mut(symbol as usize), bit)?;
                symbol = (symbol << 1) | bit;
            }
        } else {
            let match_byte = self.lz.get_byte_backward(self.coder.reps[0] + 1) as u32;
            let mut in_sync = true;
            for i in (0..8).rev() {
                let bit = ((cur_byte as u32) >> i) & 1;
                if in_sync {
                    let match_bit = (match_byte >> i) & 1;
                    let idx = ((1 + match_bit) << 8) + symbol;
                    rc.encode_bit(sub.prob_mut(idx as usize), bit)?;
                    if match_bit != bit {
                        in_sync = false;
                    }
                } else {
                    rc.encode_bit(sub.prob_mut(symbol as usize), bit)?;
                }
                symbol = (symbol << 1) | bit;
            }
        }

        self.coder.state.update_literal();
        Ok(())
    }

    fn encode_match<W: OutByte>(
        &mut self,
        rc: &mut RangeEncoder<W>,
        pos_state: u32,
        dist: u32,
        len: u32,
    ) -> Result<()> {
        let state = self.coder.state.get();
        rc.encode_bit(&mut self.coder.is_match[state][pos_state as usize], 1)?;
        rc.encode_bit(&mut self.coder.is_rep[state], 0)?;
        self.coder.state.update_match();
        self.match_len_encoder
            .encode(rc, pos_state as usize, len - MATCH_LEN_MIN as u32)?;
        self.encode_distance(rc, len, dist)?;

        self.coder.reps[3] = self.coder.reps[2];
        self.coder.reps[2] = self.coder.reps[1];
        self.coder.reps[1] = self.coder.reps[0];
        self.coder.reps[0] = dist as i32;
        Ok(())
    }

    fn encode_rep_match<W: OutByte>(
        &mut self,
        rc: &mut RangeEncoder<W>,
        pos_state: u32,
        rep_idx: usize,
        len: u32,
    ) -> Result<()> {
        let state = self.coder.state.get();
        rc.encode_bit(&mut self.coder.is_match[state][pos_state as usize], 1)?;
        rc.encode_bit(&mut self.coder.is_rep[state], 1)?;

        if rep_idx == 0 {
            rc.encode_bit(&mut self.coder.is_rep_g0[state], 0)?;
            rc.encode_bit(&mut self.coder.is_rep0_long[state][pos_state as usize], 1)?;
        } else {
            let dist = self.coder.reps[rep_idx];
            rc.encode_bit(&mut self.coder.is_rep_g0[state], 1)?;
            if rep_idx == 1 {
                rc.encode_bit(&mut self.coder.is_rep_g1[state], 0)?;
            } else {
                rc.encode_bit(&mut self.coder.is_rep_g1[state], 1)?;
                rc.encode_bit(&mut self.coder.is_rep_g2[state], if rep_idx == 2 { 0 } else { 1 })?;
                if rep_idx == 3 {
                    self.coder.reps[3] = self.coder.reps[2];
                }
                self.coder.reps[2] = self.coder.reps[1];
            }
            self.coder.reps[1] = self.coder.reps[0];
            self.coder.reps[0] = dist;
        }

        self.coder.state.update_rep();
        self.rep_len_encoder
            .encode(rc, pos_state as usize, len - MATCH_LEN_MIN as u32)
    }

    fn encode_short_rep<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>, pos_state: u32) -> Result<()> {
        let state = self.coder.state.get();
        rc.encode_bit(&mut self.coder.is_match[state][pos_state as usize], 1)?;
        rc.encode_bit(&mut self.coder.is_rep[state], 1)?;
        rc.encode_bit(&mut self.coder.is_rep_g0[state], 0)?;
        rc.encode_bit(&mut self.coder.is_rep0_long[state][pos_state as usize], 0)?;
        self.coder.state.update_short_rep();
        Ok(())
    }

    /// Encodes the bootstrap literal at position 0. There is no history
    /// yet to form a previous byte or a repeat distance from, so this
    /// byte is always a plain literal using sub-coder index 0, which is
    /// also what `get_sub_coder_index` produces for `(prev_byte=0,
    /// pos=0)` regardless of `lc`/`lp`.
    fn encode_init<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<bool> {
        if !self.lz.has_enough_data(0) {
            return Ok(false);
        }
        self.lz.skip(1);

        let state = self.coder.state.get();
        rc.encode_bit(&mut self.coder.is_match[state][0], 0)?;
        let cur_byte = self.lz.get_current_byte();
        let sub = self.coder.literal_coder.get_sub_coder(0, 0);
        let mut symbol = 1u32;
        for i in (0..8).rev() {
            let bit = ((cur_byte >> i) & 1) as u32;
            rc.encode_bit(sub.prob_mut(symbol as usize), bit)?;
            symbol = (symbol << 1) | bit;
        }
        self.coder.state.update_literal();
        self.uncompressed_size += 1;
        Ok(true)
    }

    /// Finds matches/reps at the current position and greedily picks one
    /// operation: the longest raw match, unless a repeat-distance match
    /// is within one byte of it (repeat distances are cheaper to code),
    /// or failing either of those, a one-byte "short rep", or else a
    /// plain literal. Returns the number of source bytes consumed.
    fn encode_symbol<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<u32> {
        self.lz.find_matches();
        let pos_state = (self.lz.get_pos() as u32) & self.coder.pos_mask;
        let len_limit = self.lz.get_avail().min(MATCH_LEN_MAX as i32);

        let mut best_rep_idx = 0usize;
        let mut best_rep_len = 0u32;
        for i in 0..4 {
            let dist = self.coder.reps[i];
            let len = self.lz.get_match_len(dist, len_limit) as u32;
            if len > best_rep_len {
                best_rep_len = len;
                best_rep_idx = i;
            }
        }

        let (main_len, main_dist) = {
            let matches = self.lz.matches();
            if matches.count > 0 {
                let idx = matches.count as usize - 1;
                (matches.len[idx], matches.dist[idx] as u32)
            } else {
                (0u32, 0u32)
            }
        };

        let len = if best_rep_len >= MATCH_LEN_MIN as u32
            && (main_len < MATCH_LEN_MIN as u32 || best_rep_len + 1 >= main_len)
        {
            self.encode_rep_match(rc, pos_state, best_rep_idx, best_rep_len)?;
            best_rep_len
        } else if main_len >= MATCH_LEN_MIN as u32 {
            self.encode_match(rc, pos_state, main_dist, main_len)?;
            main_len
        } else if best_rep_idx == 0 && best_rep_len == 1 {
            self.encode_short_rep(rc, pos_state)?;
            1
        } else {
            let state = self.coder.state.get();
            rc.encode_bit(&mut self.coder.is_match[state][pos_state as usize], 0)?;
            self.encode_literal(rc)?;
            1
        };

        if len > 1 {
            self.lz.skip((len - 1) as usize);
        }
        self.uncompressed_size += len;
        Ok(len)
    }

    fn ensure_started<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<bool> {
        if self.lz.is_started() {
            return Ok(true);
        }
        self.encode_init(rc)
    }

    /// Encodes symbols for one LZMA2 chunk's worth of input, stopping
    /// once either the chunk's uncompressed-size or compressed-size
    /// budget is exhausted (returning `true`, meaning the caller should
    /// close out the chunk now) or the match finder runs dry before
    /// either limit is hit (returning `false`).
    pub(crate) fn encode_for_lzma2(
        &mut self,
        rc: &mut RangeEncoder<super::range_enc::RangeEncoderBuffer>,
    ) -> Result<bool> {
        self.ensure_started(rc)?;
        loop {
            if self.uncompressed_size >= LZMA2_UNCOMPRESSED_LIMIT
                || rc.get_pending_size() >= LZMA2_COMPRESSED_LIMIT
            {
                return Ok(true);
            }
            if !self.lz.has_enough_data(0) {
                return Ok(false);
            }
            self.encode_symbol(rc)?;
        }
    }

    /// Drains every symbol the match finder currently has available,
    /// used once the whole input has been fed in and the window has
    /// been marked finishing. Used by the plain LZMA1 writer, which has
    /// no chunk framing to size-bound the run.
    pub(crate) fn encode_for_lzma1<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<()> {
        if !self.ensure_started(rc)? {
            return Ok(());
        }
        while self.lz.has_enough_data(0) {
            self.encode_symbol(rc)?;
        }
        Ok(())
    }

    /// Encodes the canonical LZMA end-of-stream marker: a "new match"
    /// with distance `u32::MAX`, which `LzmaDecoder::decode_distance`
    /// recognizes and treats as end-of-stream rather than a real offset.
    pub(crate) fn encode_end_marker<W: OutByte>(&mut self, rc: &mut RangeEncoder<W>) -> Result<()> {
        let pos_state = (self.lz.get_pos() as u32) & self.coder.pos_mask;
        self.encode_match(rc, pos_state, u32::MAX, MATCH_LEN_MIN as u32)
    }
}
