//! goenc-crypto: password-based encryption container
//!
//! Container format (version 1, binary):
//! ```text
//! [1 byte: version = 0x01]
//! [4 bytes: Argon2 time, LE u32][4 bytes: Argon2 memory in KiB, LE u32][1 byte: threads]
//! [16 bytes: random salt]
//! [24 bytes: random XChaCha20 nonce]
//! [N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = the first 26 bytes (version through salt; the nonce is not bound)
//! ```
//!
//! The KDF parameters travel inside the container so decryption can reproduce
//! the derived key without any out-of-band state. `seal`/`open` are pure over
//! their inputs apart from the 40 bytes of OS randomness `seal` consumes.

pub mod error;
pub mod format;
pub mod kdf;
pub mod params;

pub use error::Error;
pub use format::{check_container, open, seal};
pub use kdf::derive_key;
pub use params::Params;

/// Size of the derived encryption key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the random salt stored in the container
pub const SALT_SIZE: usize = 16;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Bytes of header preceding the nonce: version + params + salt
pub const HEADER_SIZE: usize = 10 + SALT_SIZE;

/// Smallest well-formed container: header + nonce + tag around an empty message
pub const MIN_SIZE: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;
