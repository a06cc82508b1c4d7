//! End-to-end encode/decode round-trips and malformed-stream checks.

use lzma2_codec_core::{
    ErrorKind, Lzma2Reader, Lzma2Writer, LzmaOptions, LzmaReader, LzmaWriter, Properties, Read,
    Write,
};

fn read_all<R: Read>(r: &mut R) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let n = r.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

fn lzma1_compress(data: &[u8], options: LzmaOptions, uncomp_size: Option<u64>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = LzmaWriter::new(&mut out, options, uncomp_size).unwrap();
    w.write_all(data).unwrap();
    w.finish().unwrap();
    out
}

fn lzma2_compress(data: &[u8], options: LzmaOptions) -> Vec<u8> {
    let mut w = Lzma2Writer::new(Vec::new(), options).unwrap();
    w.write_all(data).unwrap();
    w.finish().unwrap()
}

/// Scenario 1: LZMA1 round-trip of a short ASCII sentence with the
/// end-of-stream marker (uncompressed size declared unknown).
#[test]
fn lzma1_round_trip_ascii_text() {
    let text = b"The quick brown fox jumps over the lazy dog.\n";
    let options = LzmaOptions::with_preset(6);
    let compressed = lzma1_compress(text, options, None);

    let mut reader = LzmaReader::new(compressed.as_slice()).unwrap();
    let decompressed = read_all(&mut reader);
    assert_eq!(decompressed, text);
}

/// Scenario 2: a short, heavily repetitive string (containing two
/// repeats of "foo" and two of "foobar") round-trips through LZMA1
/// with a small dictionary.
#[test]
fn lzma1_round_trip_repetitive_string() {
    let text = b"=====foofoobar==foobar====";
    let props = Properties::new(3, 0, 2).unwrap();
    let options = LzmaOptions {
        lc: props.lc(),
        lp: props.lp(),
        pb: props.pb(),
        dict_size: 4096,
        ..LzmaOptions::with_preset(6)
    };
    let compressed = lzma1_compress(text, options, None);

    let mut reader = LzmaReader::new(compressed.as_slice()).unwrap();
    let decompressed = read_all(&mut reader);
    assert_eq!(decompressed, text);
}

/// Scenario 3: the same sentence round-tripped through LZMA2 framing,
/// whatever chunking the encoder happens to choose.
#[test]
fn lzma2_round_trip_ascii_text() {
    let text = b"The quick brown fox jumps over the lazy dog.\n";
    let options = LzmaOptions::with_preset(6);
    let compressed = lzma2_compress(text, options);

    let mut reader = Lzma2Reader::new(compressed.as_slice(), LzmaOptions::DICT_SIZE_DEFAULT, None);
    let decompressed = read_all(&mut reader);
    assert_eq!(decompressed, text);
}

/// Scenario 4: high-entropy data round-trips through LZMA2 even when
/// the encoder has to fall back to an uncompressed chunk because the
/// compressed form would have been larger.
#[test]
fn lzma2_round_trip_high_entropy_falls_back_to_uncompressed() {
    // A fixed pseudo-random byte sequence: incompressible enough that
    // the greedy finder cannot profitably match anything, so the
    // chunk's compressed size will exceed its uncompressed size and
    // `write_chunk` must choose the uncompressed chunk path.
    let mut data = Vec::with_capacity(16);
    let mut x: u32 = 0x1234_5678;
    for _ in 0..16 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        data.push((x & 0xFF) as u8);
    }

    let options = LzmaOptions::with_preset(6);
    let compressed = lzma2_compress(&data, options);
    assert_eq!(compressed[0] & 0x80, 0, "expected an uncompressed chunk control byte");

    let mut reader = Lzma2Reader::new(compressed.as_slice(), LzmaOptions::DICT_SIZE_DEFAULT, None);
    let decompressed = read_all(&mut reader);
    assert_eq!(decompressed, data);
}

/// Scenario 5: an LZMA1 stream whose end-of-stream marker appears
/// before the caller's declared uncompressed size is reached must be
/// rejected as `UncompressedSizeMismatch`, not silently truncated.
#[test]
fn lzma1_eos_before_declared_size_is_mismatch() {
    let text = b"short";
    let options = LzmaOptions::with_preset(6);
    let compressed = lzma1_compress(text, options, None);

    // Re-parse the header ourselves so we can lie about the declared
    // uncompressed size, then hand the rest of the stream to the
    // lower-level constructor with a size larger than what's actually
    // encoded.
    let props_byte = compressed[0];
    let props = Properties::from_byte(props_byte).unwrap();
    let dict_size = u32::from_le_bytes(compressed[1..5].try_into().unwrap());
    let body = &compressed[13..];

    let mut reader =
        LzmaReader::new_with_props(body, text.len() as u64 + 10, props, dict_size.max(4096), None)
            .unwrap();
    let err = loop {
        let mut buf = [0u8; 64];
        match reader.read(&mut buf) {
            Ok(0) => panic!("expected an error before EOF"),
            Ok(_) => continue,
            Err(e) => break e,
        }
    };
    assert_eq!(err.kind(), ErrorKind::UncompressedSizeMismatch);
}

/// Scenario 6: a second LZMA2 chunk that omits the new-properties flag
/// before any properties have ever been supplied is `BadControlByte`.
#[test]
fn lzma2_missing_props_before_any_seen_is_bad_control_byte() {
    let mut stream = Vec::new();
    // Chunk 1: uncompressed, dictionary reset, one payload byte.
    stream.extend_from_slice(&[0x01, 0x00, 0x00, 0xAA]);
    // Chunk 2: compressed chunk control byte in 0x80..0xC0 (no props,
    // no state reset) while `need_props` is still set from chunk 1.
    stream.extend_from_slice(&[0x80, 0x00, 0x00, 0x00, 0x00]);

    let mut reader = Lzma2Reader::new(stream.as_slice(), LzmaOptions::DICT_SIZE_DEFAULT, None);
    let mut buf = [0u8; 64];
    let err = match reader.read(&mut buf) {
        Ok(n) => panic!("expected an error, decoded {n} bytes"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::BadControlByte);
}

/// A longer, moderately repetitive input exercising the `Bt4` match
/// finder path end to end.
#[test]
fn lzma2_round_trip_longer_input() {
    let mut data = Vec::new();
    for i in 0..20_000usize {
        data.push((i % 251) as u8);
    }
    let options = LzmaOptions::with_preset(3);
    let compressed = lzma2_compress(&data, options);

    let mut reader = Lzma2Reader::new(compressed.as_slice(), LzmaOptions::DICT_SIZE_DEFAULT, None);
    let decompressed = read_all(&mut reader);
    assert_eq!(decompressed, data);
}
