use std::fmt;
use std::io;

/// Errors produced by [`crate::Encoder`] and [`crate::Decoder`].
///
/// All variants except [`Error::InternalAliasingFailure`] are sticky on the
/// instance that raised them: once an operation returns one of these, every
/// subsequent call on the same instance returns the same error again until
/// the instance is reset or rebuilt.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The decoder reached the end of its input exactly at a record
    /// boundary. This is the normal, expected end of a stream.
    Eof,
    /// The decoder reached the end of its input in the middle of a record.
    UnexpectedEof,
    /// The decoder encountered a meta record with an unrecognised tag.
    UnsupportedMeta(u8),
    /// The decoder encountered a tag byte that no branch of the format
    /// accepts. Indicates a corrupted or non-eazy stream.
    ImpossibleTag(u8),
    /// The encoder's sink rejected a write, or accepted fewer bytes than
    /// given. The encoder resets itself so the next `write` starts a fresh,
    /// self-contained stream.
    SinkFailure(io::Error),
    /// The encoder's post-shrink aliasing invariant (spec §4.3 step 7)
    /// failed. This indicates a bug in the match-search algorithm, not
    /// malformed input; it is not sticky the way the other variants are.
    InternalAliasingFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Eof => write!(f, "end of stream"),
            Error::UnexpectedEof => write!(f, "unexpected end of stream mid-record"),
            Error::UnsupportedMeta(code) => write!(f, "unsupported meta tag: {code:#x}"),
            Error::ImpossibleTag(byte) => write!(f, "impossible tag byte: {byte:#x}"),
            Error::SinkFailure(e) => write!(f, "sink write failed: {e}"),
            Error::InternalAliasingFailure => {
                write!(f, "internal aliasing invariant violated in match search")
            }
        }
    }
}

impl Clone for Error {
    // io::Error isn't Clone; SinkFailure is rebuilt from its kind and message
    // so the sticky-error contract (spec §7) can hand back the same error on
    // every subsequent call without consuming the original.
    fn clone(&self) -> Self {
        match self {
            Error::Eof => Error::Eof,
            Error::UnexpectedEof => Error::UnexpectedEof,
            Error::UnsupportedMeta(code) => Error::UnsupportedMeta(*code),
            Error::ImpossibleTag(byte) => Error::ImpossibleTag(*byte),
            Error::SinkFailure(e) => Error::SinkFailure(io::Error::new(e.kind(), e.to_string())),
            Error::InternalAliasingFailure => Error::InternalAliasingFailure,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SinkFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::SinkFailure(e)
        }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string()),
            Error::SinkFailure(inner) => inner,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
