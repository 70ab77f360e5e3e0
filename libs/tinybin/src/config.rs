//! Engine configuration.

use serde::Deserialize;

/// Default for [`EngineConfig::max_length`].
pub const DEFAULT_MAX_LENGTH: usize = 1 << 24;

/// Tunables of an [`Engine`](crate::Engine).
///
/// Deserializable so it can be embedded in an application's configuration
/// file. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The largest length prefix any string, byte sequence, sequence or map may
    /// declare. Larger values are rejected outright. Smaller ones only reserve
    /// as much space as the remaining input could fill.
    pub max_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}
