use alloc::{vec, vec::Vec};

use super::lz_encoder::{LzEncoderData, MatchFind, Matches};

pub(crate) const HASH_2_SIZE: usize = 1 << 10;
pub(crate) const HASH_3_SIZE: usize = 1 << 16;

pub(crate) fn get_hash_4_bits(dict_size: u32) -> u32 {
    let mut bits = 16;
    while bits < 24 && (1u32 << bits) < dict_size {
        bits += 1;
    }
    bits
}

#[inline(always)]
pub(crate) fn hash2(b0: u8, b1: u8) -> usize {
    ((b0 as usize) | ((b1 as usize) << 8)) & (HASH_2_SIZE - 1)
}

#[inline(always)]
pub(crate) fn hash3(b0: u8, b1: u8, b2: u8) -> usize {
    let v = (b0 as u32) ^ ((b1 as u32) << 8) ^ ((b2 as u32) << 16);
    ((v.wrapping_mul(0x9E37_79B1) >> 16) as usize) & (HASH_3_SIZE - 1)
}

#[inline(always)]
pub(crate) fn hash4(b0: u8, b1: u8, b2: u8, b3: u8, mask: u32) -> usize {
    let v = (b0 as u32) | ((b1 as u32) << 8) | ((b2 as u32) << 16) | ((b3 as u32) << 24);
    ((v.wrapping_mul(0x9E37_79B1) >> 8) & mask) as usize
}

/// Hash-chain match finder for 4-byte entries. Lower memory and faster
/// than [`super::bt4::Bt4`] at the cost of weaker match candidates, since
/// each hash bucket is walked as a linked list rather than searched as a
/// sorted tree.
pub(crate) struct Hc4 {
    hash_2_table: Vec<i32>,
    hash_3_table: Vec<i32>,
    hash_4_table: Vec<i32>,
    hash_4_mask: u32,
    chain: Vec<i32>,
    cyclic_size: i32,
    lz_pos: i32,
    depth_limit: i32,
    nice_len: u32,
}

impl Hc4 {
    pub(crate) fn get_mem_usage(dict_size: u32) -> u32 {
        let hash_4_bits = get_hash_4_bits(dict_size);
        10 + (dict_size >> 10) * 8
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
            chain: vec![-1; cyclic_size as usize],
            cyclic_size,
            lz_pos: 0,
            depth_limit: if depth_limit > 0 { depth_limit } else { 32 },
            nice_len,
        }
    }

    #[inline(always)]
    fn advance(&mut self, data: &mut LzEncoderData) -> i32 {
        let avail = data.move_pos(4, 4);
        if avail != 0 {
            self.lz_pos += 1;
        }
        avail
    }

    /// Inserts the byte at `cur_pos` into all three hash structures
    /// without computing match candidates, for use by [`Self::skip`].
    #[inline(always)]
    fn insert(&mut self, data: &LzEncoderData, cur_pos: i32) {
        let avail = data.get_avail();
        let b0 = data.get_current_byte();
        let b1 = data.get_byte(1, 0);
        let b2 = data.get_byte(2, 0);
        let b3 = if avail >= 4 { data.get_byte(3, 0) } else { 0 };

        let h2 = hash2(b0, b1);
        let h3 = hash3(b0, b1, b2);
        let h4 = hash4(b0, b1, b2, b3, self.hash_4_mask);

        let pos4_head = self.hash_4_table[h4];
        self.hash_2_table[h2] = cur_pos;
        self.hash_3_table[h3] = cur_pos;
        self.hash_4_table[h4] = cur_pos;
        self.chain[(cur_pos % self.cyclic_size) as usize] = pos4_head;
    }
}

impl MatchFind for Hc4 {
    fn find_matches(&mut self, data: &mut LzEncoderData, matches: &mut Matches) {
        matches.count = 0;
        let avail = self.advance(data);
        if avail == 0 {
            return;
        }
        let len_limit = avail.min(data.match_len_max as i32);
        let cur_pos = self.lz_pos;

        let b0 = data.get_current_byte();
        let b1 = data.get_byte(1, 0);
        let b2 = data.get_byte(2, 0);
        let b3 = if avail >= 4 { data.get_byte(3, 0) } else { 0 };

        let h2 = hash2(b0, b1);
        let h3 = hash3(b0, b1, b2);
        let h4 = hash4(b0, b1, b2, b3, self.hash_4_mask);

        let pos2 = self.hash_2_table[h2];
        let pos3 = self.hash_3_table[h3];
        let pos4_head = self.hash_4_table[h4];

        self.hash_2_table[h2] = cur_pos;
        self.hash_3_table[h3] = cur_pos;
        self.hash_4_table[h4] = cur_pos;
        self.chain[(cur_pos % self.cyclic_size) as usize] = pos4_head;

        let mut match_len_best = 0u32;

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

        if len_limit >= 4 {
            let mut cur = pos4_head;
            let mut depth = self.depth_limit;
            while cur >= 0 && depth > 0 {
                let dist = cur_pos - cur;
                if dist <= 0 || dist > self.cyclic_size {
                    break;
                }
                depth -= 1;
                let len = data.get_match_len_fast_reject::<4>(dist - 1, len_limit) as u32;
                if len > match_len_best {
                    match_len_best = len;
                    let idx = matches.count as usize;
                    if idx < matches.len.len() {
                        matches.len[idx] = len;
                        matches.dist[idx] = dist - 1;
                        matches.count += 1;
                    }
                    if len >= self.nice_len || len as i32 >= len_limit {
                        break;
                    }
                }
                cur = self.chain[(cur % self.cyclic_size) as usize];
            }
        }
    }

    fn skip(&mut self, data: &mut LzEncoderData, len: usize) {
        for _ in 0..len {
            let avail = self.advance(data);
            if avail == 0 {
                continue;
            }
            let cur_pos = self.lz_pos;
            self.insert(data, cur_pos);
        }
    }
}
