use rand::Rng;
use rand::rngs::OsRng;

/// Characters a generated secret key is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*(-_=+)";

pub const KEY_LEN: usize = 50;

/// Generate a secret key from the operating system's CSPRNG,
/// each character drawn uniformly from [`ALPHABET`].
#[must_use]
pub fn generate_key() -> String {
    let mut rng = OsRng;
    (0..KEY_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// The Python module that holds the key.
#[must_use]
pub fn key_module(key: &str) -> String {
    format!("SECRET_KEY = '{key}'\n")
}
