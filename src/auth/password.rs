use rand::{Rng, distr::Alphanumeric};

use crate::error::AppError;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

const TEMPORARY_PASSWORD_LEN: usize = 12;

pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plaintext, HASH_COST)?)
}

/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

pub fn generate_temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
