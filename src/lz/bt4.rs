use alloc::{vec, vec::Vec};

use super::{
    extend_match,
    hc4::{get_hash_4_bits, hash2, hash3, hash4, HASH_2_SIZE, HASH_3_SIZE},
    lz_encoder::{LzEncoderData, MatchFind, Matches},
};

/// Binary-tree match finder for 4-byte entries. Each hash bucket roots a
/// binary search tree ordered by how far the candidate's suffix matches
/// the current position, so the search converges faster and finds
/// better (if not always optimal) matches than [`super::hc4::Hc4`] at
/// the cost of more memory and more comparisons per position.
pub(crate) struct Bt4 {
    hash_2_table: Vec<i32>,
    hash_3_table: Vec<i32>,
    hash_4_table: Vec<i32>,
    hash_4_mask: u32,
    /// Packed child pointers: `tree[2*p]` / `tree[2*p + 1]` are the
    /// left/right children of the node at cyclic position `p`.
    tree: Vec<i32>,
    cyclic_size: i32,
    cyclic_pos: i32,
    lz_pos: i32,
    depth_limit: i32,
    nice_len: u32,
}

impl Bt4 {
    pub(crate) fn get_mem_usage(dict_size: u32) -> u32 {
        let hash_4_bits = get_hash_4_bits(dict_size);
        10 + (dict_size >> 10) * 16
            + (((HASH_2_SIZE + HASH_3_SIZE) >> 8) as u32)
            + ((1u32 << hash_4_bits) >> 8)
    }

    pub(crate) fn new(dict_size: u32, nice_len: u32, depth_limit: i32) -> Self {
        let hash_4_bits = get_hash_4_bits(dict_size);
        let cyclic_size = dict_size.max(1) as i32;
        Self {
            hash_2_table: vec![-1; HASH_2_SIZE],
            hash_3_table: vec![-1; HASH_3_SIZE],
            hash_4_table: vec![-1; 1usize << hash_4_bits],
            hash_4_mask: (1u32 << hash_4_bits) - 1,
            tree: vec![-1; 2 * cyclic_size as usize],
            cyclic_size,
            cyclic_pos: 0,
            lz_pos: 0,
            depth_limit: if depth_limit > 0 { depth_limit } else { 64 },
            nice_len,
        }
    }

    #[inline(always)]
    fn advance(&mut self, data: &mut LzEncoderData) -> i32 {
        let avail = data.move_pos(4, 4);
        if avail != 0 {
            self.lz_pos += 1;
            self.cyclic_pos += 1;
            if self.cyclic_pos == self.cyclic_size {
                self.cyclic_pos = 0;
            }
        }
        avail
    }

    /// Inserts the current position into the hash-4 tree, walking
    /// existing candidates and recording any match found along the way.
    /// Returns the best match length found (0 if none, or if `len_limit < 4`).
    fn insert_and_find(
        &mut self,
        data: &LzEncoderData,
        cur_pos: i32,
        len_limit: i32,
        match_len_best_in: u32,
        matches: &mut Matches,
    ) {
        let mut match_len_best = match_len_best_in;

        let b0 = data.get_current_byte();
        let b1 = data.get_byte(1, 0);
        let b2 = data.get_byte(2, 0);
        let b3 = if len_limit >= 4 { data.get_byte(3, 0) } else { 0 };
        let h4 = hash4(b0, b1, b2, b3, self.hash_4_mask);
        let mut cur_match = self.hash_4_table[h4];
        self.hash_4_table[h4] = cur_pos;

        let nice_len_eff = (self.nice_len as i32).min(len_limit);

        let mut ptr0 = (self.cyclic_pos * 2 + 1) as usize;
        let mut ptr1 = (self.cyclic_pos * 2) as usize;
        let mut len0 = 0i32;
        let mut len1 = 0i32;
        let mut depth = self.depth_limit;

        loop {
            let delta = cur_pos - cur_match;
            if depth == 0 || delta <= 0 || delta > self.cyclic_size {
                self.tree[ptr0] = -1;
                self.tree[ptr1] = -1;
                break;
            }
            depth -= 1;

            let back_cyclic = if delta <= self.cyclic_pos {
                self.cyclic_pos - delta
            } else {
                self.cyclic_pos - delta + self.cyclic_size
            };
            let pair = (back_cyclic * 2) as usize;

            let start_len = len0.min(len1);
            let len = extend_match(&data.buf, data.read_pos, start_len as u32, delta, len_limit) as i32;

            if len > match_len_best as i32 {
                match_len_best = len as u32;
                let idx = matches.count as usize;
                if idx < matches.len.len() {
                    matches.len[idx] = match_len_best;
                    matches.dist[idx] = delta - 1;
                    matches.count += 1;
                }
                if len >= nice_len_eff {
                    self.tree[ptr1] = self.tree[pair];
                    self.tree[ptr0] = self.tree[pair + 1];
                    break;
                }
            }

            if len < len_limit && data.get_byte(len, delta) < data.get_byte(len, 0) {
                self.tree[ptr1] = cur_match;
                ptr1 = pair + 1;
                cur_match = self.tree[ptr1];
                len1 = len;
            } else {
                self.tree[ptr0] = cur_match;
                ptr0 = pair;
                cur_match = self.tree[ptr0];
                len0 = len;
            }
        }
    }
}

impl MatchFind for Bt4 {
    fn find_matches(&mut self, data: &mut LzEncoderData, matches: &mut Matches) {
        matches.count = 0;
        let avail = self.advance(data);
        if avail == 0 {
            return;
        }
        let len_limit = avail.min(data.match_len_max as i32);
        let cur_pos = self.lz_pos;

        let mut match_len_best = 0u32;

        let b0 = data.get_current_byte();
        let b1 = data.get_byte(1, 0);
        let h2 = hash2(b0, b1);
        let pos2 = self.hash_2_table[h2];
        self.hash_2_table[h2] = cur_pos;
        if pos2 >= 0 {
            let dist = cur_pos - pos2;
            if dist > 0 && dist <= self.cyclic_size {
                let len = data.get_match_len(dist - 1, len_limit.min(2));
                if len >= 2 {
                    match_len_best = len as u32;
                    matches.len[0] = match_len_best;
                    matches.dist[0] = dist - 1;
                    matches.count = 1;
                }
            }
        }

        if len_limit >= 3 {
            let b2 = data.get_byte(2, 0);
            let h3 = hash3(b0, b1, b2);
            let pos3 = self.hash_3_table[h3];
            self.hash_3_table[h3] = cur_pos;
            if pos3 >= 0 {
                let dist = cur_pos - pos3;
                if dist > 0 && dist <= self.cyclic_size {
                    let len = data.get_match_len(dist - 1, len_limit.min(3)) as u32;
                    if len > match_len_best && len >= 3 {
                        match_len_best = len;
                        let idx = matches.count as usize;
                        matches.len[idx] = len;
                        matches.dist[idx] = dist - 1;
                        matches.count += 1;
                    }
                }
            }
        }

        if len_limit >= 4 {
            self.insert_and_find(data, cur_pos, len_limit, match_len_best, matches);
        } else {
            self.tree[(self.cyclic_pos * 2) as usize] = -1;
            self.tree[(self.cyclic_pos * 2 + 1) as usize] = -1;
        }
    }

    fn skip(&mut self, data: &mut LzEncoderData, len: usize) {
        let mut empty_matches = Matches::new(0);
        for _ in 0..len {
            let avail = self.advance(data);
            if avail == 0 {
                continue;
            }
            let len_limit = avail.min(data.match_len_max as i32);
            let cur_pos = self.lz_pos;

            let b0 = data.get_current_byte();
            let b1 = data.get_byte(1, 0);
            let h2 = hash2(b0, b1);
            self.hash_2_table[h2] = cur_pos;
            if len_limit >= 3 {
                let b2 = data.get_byte(2, 0);
                let h3 = hash3(b0, b1, b2);
                self.hash_3_table[h3] = cur_pos;
            }
            if len_limit >= 4 {
                self.insert_and_find(data, cur_pos, len_limit, u32::MAX, &mut empty_matches);
            } else {
                self.tree[(self.cyclic_pos * 2) as usize] = -1;
                self.tree[(self.cyclic_pos * 2 + 1) as usize] = -1;
            }
        }
    }
}
