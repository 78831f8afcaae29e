//! Near-duplicate detection using Simhash.
//!
//! Fingerprints are 64-bit Simhash values rendered as `0x…` hex strings;
//! the empty fingerprint is the literal `"0"`. Two texts are considered
//! near-duplicates when their fingerprints differ in at most
//! [`DUPLICATE_THRESHOLD`] bits.

use std::collections::HashMap;

use md5::{Digest, Md5};

/// Max Hamming distance at which two fingerprints count as duplicates.
pub const DUPLICATE_THRESHOLD: u32 = 3;

/// Shingle width used when extracting features from text.
const SHINGLE_WIDTH: usize = 4;

/// Compute the Simhash fingerprint for a text.
///
/// Returns a `0x…` hex string, or `"0"` for empty / whitespace-only input.
pub fn compute_simhash(text: &str) -> String {
    if text.trim().is_empty() {
        return "0".into();
    }
    format!("{:#x}", simhash64(text))
}

/// Hamming distance between two fingerprints. Inputs that fail to parse
/// as hex are treated as zero.
pub fn hamming_distance(hash1: &str, hash2: &str) -> u32 {
    (parse_hex(hash1) ^ parse_hex(hash2)).count_ones()
}

/// Whether two fingerprints are within `threshold` differing bits.
pub fn is_duplicate(hash1: &str, hash2: &str, threshold: u32) -> bool {
    hamming_distance(hash1, hash2) <= threshold
}

fn parse_hex(hash: &str) -> u64 {
    let digits = hash
        .strip_prefix("0x")
        .or_else(|| hash.strip_prefix("0X"))
        .unwrap_or(hash);
    u64::from_str_radix(digits, 16).unwrap_or(0)
}

// ── simhash internals ───────────────────────────────────────────────

/// 64-bit Simhash over weighted character shingles.
fn simhash64(text: &str) -> u64 {
    let content: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    let mut weights: HashMap<String, i64> = HashMap::new();
    for shingle in shingles(&content) {
        *weights.entry(shingle).or_insert(0) += 1;
    }

    let mut votes = [0i64; 64];
    for (feature, weight) in &weights {
        let h = feature_hash(feature);
        for (bit, vote) in votes.iter_mut().enumerate() {
            if h >> bit & 1 == 1 {
                *vote += weight;
            } else {
                *vote -= weight;
            }
        }
    }

    let mut value = 0u64;
    for (bit, vote) in votes.iter().enumerate() {
        // A tied vote sets the bit.
        if *vote >= 0 {
            value |= 1 << bit;
        }
    }
    value
}

/// Sliding character shingles; short inputs yield a single feature.
fn shingles(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let count = chars.len().saturating_sub(SHINGLE_WIDTH - 1).max(1);
    (0..count)
        .map(|i| chars[i..(i + SHINGLE_WIDTH).min(chars.len())].iter().collect())
        .collect()
}

/// Low 64 bits of the MD5 digest, as the feature hash.
fn feature_hash(feature: &str) -> u64 {
    let digest = Md5::digest(feature.as_bytes());
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[8..16]);
    u64::from_be_bytes(tail)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
