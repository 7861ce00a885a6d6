//! Key derivation: Argon2id password → symmetric key

use argon2::{Algorithm, Argon2, Version};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::params::Params;
use crate::KEY_SIZE;

/// Derive a 256-bit key from a password and salt using Argon2id v1.3.
///
/// The memory cost is raised to `8 × threads` KiB when the caller asks for
/// less, mirroring the reference implementation's clamp, so that containers
/// declaring tiny memory parameters derive the same key everywhere.
///
/// Zeroized on drop.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; crate::SALT_SIZE],
    params: &Params,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, Error> {
    let m_cost = params.memory.max(8 * u32::from(params.threads));
    let argon2_params = argon2::Params::new(
        m_cost,
        params.time,
        u32::from(params.threads),
        Some(KEY_SIZE),
    )
    .map_err(|e| Error::Crypto(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(password, salt, &mut *key)
        .map_err(|e| Error::Crypto(e.to_string()))?;

    Ok(key)
}
