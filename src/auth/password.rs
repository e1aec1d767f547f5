use base64::engine::general_purpose::STANDARD as B64Engine;
use base64::Engine;
use pbkdf2::pbkdf2_hmac_array;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SALT_LENGTH: usize = 24;
#[cfg(not(test))]
const PBKDF2_ROUNDS: u32 = 100_000;
#[cfg(test)]
const PBKDF2_ROUNDS: u32 = 1_000;

pub fn generate_salt() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// PBKDF2-HMAC-SHA256 of the password, base64 encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let key = pbkdf2_hmac_array::<Sha256, 32>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS);
    B64Engine.encode(key)
}

/// Compares in constant time. A stored hash that is not valid base64 never
/// matches.
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    let stored = match B64Engine.decode(hash) {
        Ok(stored) => stored,
        Err(_) => return false,
    };
    let key = pbkdf2_hmac_array::<Sha256, 32>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS);
    key[..].ct_eq(&stored[..]).into()
}
