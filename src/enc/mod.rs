//! Greedy LZMA1/LZMA2 encoding, enabled by the `encoder` feature.
//!
//! Unlike the reference Java/C implementations this crate otherwise
//! tracks, there is no price-table-driven optimal parser here: each
//! position picks the longest available match (preferring a cheap
//! repeat-distance match when it's within one byte of the longest
//! found match) and commits to it immediately. This keeps the encoder
//! a small, predictable pass over the match finder's output rather
//! than a second adaptive model layered on top of it.

mod encoder;
mod lzma2_writer;
mod lzma_writer;
pub(crate) mod range_enc;

pub use lzma2_writer::Lzma2Writer;
pub use lzma_writer::LzmaWriter;
