use thiserror::Error;

/// Errors produced by sealing and opening containers.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS random number generator failed.
    #[error("failed to read from the system random source")]
    RandomSource(#[source] rand::Error),

    /// The KDF or AEAD library rejected the supplied parameters.
    #[error("cryptographic library rejected parameters: {0}")]
    Crypto(String),

    /// Poly1305 verification failed: wrong password or corrupted data.
    #[error("message authentication failed")]
    InvalidTag,

    /// The version byte does not name a known container format.
    #[error("unknown file format")]
    Format,

    /// The input ends before the declared minimum container size.
    #[error("unexpected end of input")]
    Truncated,
}
