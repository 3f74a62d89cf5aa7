use thiserror::Error;

/// Failures the bridge reports back to its host.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Ds2482Error {
    /// A command arrived while the 1-Wire line was flagged busy.
    #[error("1-Wire line is busy")]
    Busy,
    /// Channel selection was attempted on a single-channel bridge.
    #[error("channel selection is not supported on this bridge")]
    NotSupported,
    /// The channel selection payload named a channel the bridge does not have.
    #[error("invalid channel selection payload {0:#04x}")]
    InvalidChannel(u8),
}
