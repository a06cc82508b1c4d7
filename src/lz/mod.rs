#[cfg(feature = "encoder")]
pub(crate) mod bt4;
#[cfg(feature = "encoder")]
pub(crate) mod hc4;
pub(crate) mod lz_decoder;
#[cfg(feature = "encoder")]
pub(crate) mod lz_encoder;

pub(crate) use lz_decoder::LzDecoder;
#[cfg(feature = "encoder")]
pub(crate) use lz_encoder::{LzEncoder, LzEncoderData, MatchFind, MatchFinders, Matches};

/// Match finders to use when encoding.
///
/// Kept available regardless of the `encoder` feature so that
/// [`crate::LzmaOptions`] (a plain configuration struct) doesn't need the
/// feature gate itself; only the match finder implementations it names
/// require `encoder`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfType {
    /// Hash chain for 4 bytes entries (lower quality but faster).
    #[default]
    Hc4,
    /// Binary tree for 4 byte entries (higher quality but slower).
    Bt4,
}

/// Counts how many bytes starting at `pos` match the bytes `dist` positions
/// earlier, starting from an already-verified prefix of `start_len` bytes,
/// capped at `len_limit`.
///
/// Shared by both match finders and by match verification: the window
/// buffer is always padded with at least `match_len_max` bytes past
/// `write_pos`, so reading past `pos` up to `len_limit` is always in
/// bounds.
#[inline(always)]
pub(crate) fn extend_match(buf: &[u8], pos: i32, start_len: u32, dist: i32, len_limit: i32) -> u32 {
    if len_limit <= 0 {
        return 0;
    }
    let mut len = start_len as i32;
    if len >= len_limit {
        return len_limit as u32;
    }
    let fwd = pos as usize;
    let back = (pos - dist) as usize;
    while len < len_limit && buf[fwd + len as usize] == buf[back + len as usize] {
        len += 1;
    }
    len as u32
}
