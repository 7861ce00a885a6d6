//! Argon2id cost parameters carried inside the container header.

/// Argon2id cost parameters.
///
/// All three fields must be strictly positive. `memory` is expressed in KiB,
/// matching what the KDF consumes and what the container header stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Time cost / iterations
    pub time: u32,
    /// Memory cost in KiB
    pub memory: u32,
    /// Parallelism
    pub threads: u8,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            time: 8,
            memory: 1024 * 1024, // 1 GiB
            threads: 4,
        }
    }
}
