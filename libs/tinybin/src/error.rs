//! Error handling types.
//!
//! Encoding, decoding, strategy construction and registration all share one
//! error type.

use std::io;

/// Boxed error returned by the capability traits in [`crate::overrides`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Potential errors to encounter when building strategies, encoding or
/// decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input ended before the value was fully decoded.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Tried to decode a [`str`] value but it contained invalid UTF-8.
    #[error("invalid utf-8 in data for string")]
    InvalidUtf8,
    /// Tried to decode a [`char`] value but its code was invalid.
    #[error("invalid char code")]
    InvalidChar,
    /// While reading LEB128 integer data, the data overflowed the target type.
    #[error("LEB encoded integer overflows target type")]
    IntegerOverflow,
    /// A length prefix was larger than [`EngineConfig::max_length`].
    ///
    /// [`EngineConfig::max_length`]: crate::EngineConfig::max_length
    #[error("length prefix {len} exceeds the configured maximum of {max}")]
    LengthLimit { len: usize, max: usize },
    /// A dynamic value named a type that isn't registered.
    #[error("unknown dynamic type: {0}")]
    UnknownDynamicType(String),
    /// A type's own decode or encode method reported a failure.
    #[error("capability codec for `{type_name}` failed: {source}")]
    Capability {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    /// A decoder was requested without any targets.
    #[error("at least one decode target is required")]
    NoTargets,
    /// The number of destinations didn't match the decoder's targets.
    #[error("expected {expected} decode targets, got {actual}")]
    TargetCount { expected: usize, actual: usize },
    /// A destination didn't have the type the decoder was built for.
    #[error("decode target is not a `{expected}`")]
    TargetMismatch { expected: &'static str },
    /// The type carries no data that could be encoded, such as a channel.
    #[error("`{type_name}` is a {kind} and cannot be encoded or decoded")]
    Unsupported {
        type_name: &'static str,
        kind: &'static str,
    },
    /// Tried to encode a dynamic value whose type has no registered name.
    #[error("dynamic type `{0}` has no registered name")]
    UnregisteredType(&'static str),
    /// The name is already registered for a different type.
    #[error("name \"{name}\" is already registered for `{existing}`")]
    DuplicateName {
        name: String,
        existing: &'static str,
    },

    /// A deferred strategy was run after the engine that built it was dropped.
    #[error("decode strategy for `{0}` is not bound")]
    Unbound(&'static str),
}

impl Error {
    /// Whether the error is caused by the caller violating the API contract,
    /// rather than by the data that was being decoded.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::NoTargets
                | Self::TargetCount { .. }
                | Self::TargetMismatch { .. }
                | Self::Unsupported { .. }
                | Self::UnregisteredType(_)
                | Self::DuplicateName { .. }
        )
    }

    /// Whether the error is caused by malformed or incompatible input data.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::InvalidUtf8
                | Self::InvalidChar
                | Self::IntegerOverflow
                | Self::LengthLimit { .. }
                | Self::UnknownDynamicType(_)
                | Self::Capability { .. }
        )
    }

    pub(crate) fn capability<T>(source: BoxError) -> Self {
        Self::Capability {
            type_name: std::any::type_name::<T>(),
            source,
        }
    }

    pub(crate) fn unsupported<T>(kind: &'static str) -> Self {
        Self::Unsupported {
            type_name: std::any::type_name::<T>(),
            kind,
        }
    }
}

/// Returns an [`io::Error`] with kind [`io::ErrorKind::UnexpectedEof`].
pub(crate) fn eof() -> Error {
    io::Error::from(io::ErrorKind::UnexpectedEof).into()
}
