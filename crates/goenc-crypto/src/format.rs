//! Container v1: seal and open
//!
//! See the crate-level docs for the byte layout. The version byte is the
//! format discriminator; new versions widen the dispatch on byte 0.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::Error;
use crate::kdf::derive_key;
use crate::params::Params;
use crate::{HEADER_SIZE, MIN_SIZE, NONCE_SIZE, SALT_SIZE};

const VERSION_1: u8 = 0x01;

/// Encrypt `plaintext` under a key derived from `password`.
///
/// The output is a self-describing container of exactly
/// `MIN_SIZE + plaintext.len()` bytes. Consumes 40 bytes of OS randomness
/// (salt + nonce) per call.
pub fn seal(password: &[u8], plaintext: &[u8], params: &Params) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(MIN_SIZE + plaintext.len());
    out.push(VERSION_1);
    out.extend_from_slice(&params.time.to_le_bytes());
    out.extend_from_slice(&params.memory.to_le_bytes());
    out.push(params.threads);

    let mut random = [0u8; SALT_SIZE + NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut random)
        .map_err(Error::RandomSource)?;
    out.extend_from_slice(&random);

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&random[..SALT_SIZE]);
    let key = derive_key(password, &salt, params)?;

    let cipher = XChaCha20Poly1305::new((&*key).into());
    let nonce = XNonce::from_slice(&out[HEADER_SIZE..HEADER_SIZE + NONCE_SIZE]);
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &out[..HEADER_SIZE],
            },
        )
        .map_err(|e| Error::Crypto(e.to_string()))?;

    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Check that `input` looks like a container we can open.
///
/// Distinguishes an unknown version byte (`Format`) from an input that ends
/// before the minimum container size (`Truncated`). Callers that need a
/// password prompt run this first so a malformed file fails before the user
/// is asked for anything.
pub fn check_container(input: &[u8]) -> Result<(), Error> {
    if input.is_empty() {
        return Err(Error::Truncated);
    }
    if input[0] != VERSION_1 {
        return Err(Error::Format);
    }
    if input.len() < MIN_SIZE {
        return Err(Error::Truncated);
    }
    Ok(())
}

/// Decrypt a container produced by [`seal`].
///
/// The KDF parameters are read back from the header and are not validated
/// beyond what the KDF library accepts; a hostile header can demand an
/// expensive derivation before the tag check can fail.
pub fn open(password: &[u8], input: &[u8]) -> Result<Vec<u8>, Error> {
    check_container(input)?;

    let params = Params {
        time: u32::from_le_bytes([input[1], input[2], input[3], input[4]]),
        memory: u32::from_le_bytes([input[5], input[6], input[7], input[8]]),
        threads: input[9],
    };
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&input[10..HEADER_SIZE]);

    let key = derive_key(password, &salt, &params)?;

    let cipher = XChaCha20Poly1305::new((&*key).into());
    let nonce = XNonce::from_slice(&input[HEADER_SIZE..HEADER_SIZE + NONCE_SIZE]);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &input[HEADER_SIZE + NONCE_SIZE..],
                aad: &input[..HEADER_SIZE],
            },
        )
        .map_err(|_| Error::InvalidTag)
}
