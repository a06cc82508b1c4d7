use alloc::string::String;
use core::fmt;

/// Classifies why a core operation failed.
///
/// These map directly onto the failure semantics described for the
/// range coder, the LZMA1 core, and the LZMA2 framer: a decoding error
/// is terminal for the stream object it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The 13-byte LZMA1 header or LZMA2 properties byte failed to parse.
    BadHeader,
    /// LC/LP/PB are out of range, or LC+LP > 4 for LZMA2.
    BadProperties,
    /// An LZMA2 chunk control byte was reserved or arrived out of order.
    BadControlByte,
    /// A decoded match distance exceeds the dictionary's stored content.
    BadDistance,
    /// A decoded match length fell outside `[2, 273]`.
    BadLength,
    /// The range coder's `code` register was non-zero at stream end.
    BadTermination,
    /// The byte source was exhausted while more input was required.
    UnexpectedEof,
    /// The LZMA1 end-of-stream marker appeared before the declared size.
    UnexpectedEos,
    /// Bytes remained in the source after a stream's logical end.
    TrailingData,
    /// An LZMA2 chunk's compressed size did not match what was declared.
    CompressedSizeMismatch,
    /// The decoded/declared uncompressed size did not match actual output.
    UncompressedSizeMismatch,
    /// The byte sink rejected a write (full, closed, or bound exceeded).
    SinkFull,
    /// The underlying byte source or sink reported an I/O error.
    SourceError,
    /// A configuration value (dict size, nice_len, ...) was invalid.
    ConfigError,
    /// A position counter or length would overflow its domain.
    OverflowError,
    /// An operation was attempted on an already-closed stream object.
    AlreadyClosed,
    /// Internal invariant violation not exposed as a distinct kind above.
    Other,
}

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

macro_rules! error_ctor {
    ($name:ident, $kind:ident) => {
        pub(crate) fn $name(message: impl Into<String>) -> Error {
            Error::new(ErrorKind::$kind, message)
        }
    };
}

error_ctor!(error_bad_header, BadHeader);
error_ctor!(error_bad_properties, BadProperties);
error_ctor!(error_bad_control_byte, BadControlByte);
error_ctor!(error_bad_distance, BadDistance);
error_ctor!(error_bad_length, BadLength);
error_ctor!(error_bad_termination, BadTermination);
error_ctor!(error_unexpected_eof, UnexpectedEof);
error_ctor!(error_unexpected_eos, UnexpectedEos);
error_ctor!(error_trailing_data, TrailingData);
error_ctor!(error_compressed_size_mismatch, CompressedSizeMismatch);
error_ctor!(error_uncompressed_size_mismatch, UncompressedSizeMismatch);
error_ctor!(error_sink_full, SinkFull);
error_ctor!(error_config, ConfigError);
error_ctor!(error_overflow, OverflowError);
error_ctor!(error_already_closed, AlreadyClosed);

/// Internal invariant violation (buffer slicing, bookkeeping) with no
/// public `ErrorKind` of its own — should never trigger on valid input.
pub(crate) fn error_invalid_data(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Other, message)
}

/// Same role as [`error_invalid_data`], used at call sites ported from
/// the upstream decoder where the distinction was purely stylistic.
pub(crate) fn error_other(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Other, message)
}

pub(crate) fn error_invalid_input(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::BadControlByte, message)
}

pub(crate) fn error_out_of_memory(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::ConfigError, message)
}

pub(crate) fn error_source(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::SourceError, message)
}
