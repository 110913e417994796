//! Password hashing with PBKDF2-HMAC-SHA256
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt_hex>$<digest_hex>`.
//! Verification parses the iteration count back out of the stored value, so
//! the cost can be raised without invalidating existing hashes.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Iteration count for newly created hashes
pub const DEFAULT_ITERATIONS: u32 = 260_000;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const SCHEME: &str = "pbkdf2-sha256";

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(plain: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = pbkdf2_sha256(plain.as_bytes(), &salt, DEFAULT_ITERATIONS);
    format!(
        "{}${}${}${}",
        SCHEME,
        DEFAULT_ITERATIONS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Check a plaintext password against a stored hash
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (scheme, iterations, salt_hex, digest_hex) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(s), Some(i), Some(salt), Some(digest), None) => (s, i, salt, digest),
        _ => return false,
    };
    if scheme != SCHEME {
        return false;
    }
    let iterations: u32 = match iterations.parse() {
        Ok(n) if n > 0 => n,
        _ => return false,
    };
    let salt = match hex::decode(salt_hex) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let expected = match hex::decode(digest_hex) {
        Ok(d) if d.len() == DIGEST_LEN => d,
        _ => return false,
    };

    let actual = pbkdf2_sha256(plain.as_bytes(), &salt, iterations);
    constant_time_eq(&actual, &expected)
}

/// PBKDF2 with a single HMAC-SHA256 block (the digest length equals the
/// HMAC output length, so one block is exactly the derived key).
fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut block = [0u8; DIGEST_LEN];

    // U1 = HMAC(password, salt || INT_32_BE(1))
    let mut mac = HmacSha256::new_from_slice(password).expect("hmac accepts any key length");
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u = mac.finalize().into_bytes();
    block.copy_from_slice(&u);

    for _ in 1..iterations {
        let mut mac = HmacSha256::new_from_slice(password).expect("hmac accepts any key length");
        mac.update(&u);
        u = mac.finalize().into_bytes();
        for (b, x) in block.iter_mut().zip(u.iter()) {
            *b ^= x;
        }
    }

    block
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
