//! Signing secret strength checks
//!
//! HS256 is only as strong as the shared secret, so the codec refuses to start
//! with a secret classified as [`SecretStrength::Weak`].

const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum
const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS: f64 = 4.0;
const STRONG_ENTROPY_BITS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Rejected at startup
    Weak,
    /// Accepted with a warning
    Acceptable,
    Strong,
}

/// Classify a signing secret.
///
/// - shorter than 32 bytes is weak
/// - Shannon entropy below 4 bits/byte is weak
/// - runs of 4 repeated or ascending bytes are weak
/// - 64+ bytes at 5+ bits/byte is strong, everything else acceptable
pub fn validate_secret_strength(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if bytes.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = shannon_entropy(bytes);
    if entropy < MIN_ENTROPY_BITS || has_obvious_patterns(bytes) {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= STRONG_ENTROPY_BITS {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte (0-8)
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    let len = data.len() as f64;

    for &byte in data {
        freq[byte as usize] += 1;
    }

    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

fn has_obvious_patterns(data: &[u8]) -> bool {
    longest_run(data, |a, b| a == b) >= 4 || longest_run(data, |a, b| b as i16 - a as i16 == 1) >= 4
}

fn longest_run(data: &[u8], continues: impl Fn(u8, u8) -> bool) -> usize {
    let mut best = usize::from(!data.is_empty());
    let mut current = best;
    for window in data.windows(2) {
        if continues(window[0], window[1]) {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_secret_too_short() {
        assert_eq!(validate_secret_strength("short"), SecretStrength::Weak);
    }

    #[test]
    fn test_weak_secret_low_entropy() {
        let weak = "abababababababababababababababab";
        assert_eq!(validate_secret_strength(weak), SecretStrength::Weak);
    }

    #[test]
    fn test_weak_secret_sequential_pattern() {
        let weak = "abcdefghijklmnopqrstuvwxyzabcdef";
        assert_eq!(validate_secret_strength(weak), SecretStrength::Weak);
    }

    #[test]
    fn test_acceptable_secret() {
        let acceptable = "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W";
        assert_eq!(
            validate_secret_strength(acceptable),
            SecretStrength::Acceptable
        );
    }

    #[test]
    fn test_strong_secret() {
        let strong = "y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6Wq8Lj5BtNu1Zp0MkYhVgCxFbAsSdQwEr";
        assert_eq!(validate_secret_strength(strong), SecretStrength::Strong);
    }

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy(&[b'a'; 100]) < 0.1);

        let uniform: Vec<u8> = (0..=255).collect();
        assert!(shannon_entropy(&uniform) > 7.5);
    }

    #[test]
    fn test_pattern_detection() {
        assert!(has_obvious_patterns(b"aaaa"));
        assert!(has_obvious_patterns(b"xx1234yy"));
        assert!(!has_obvious_patterns(b"aZ3$"));
        assert!(!has_obvious_patterns(b"aab"));
    }
}
