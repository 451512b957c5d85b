//! Coin reward derivation from a scanned code.
//!
//! The reward is a pure function of the code's SHA-1 digest: the byte at the
//! middle of the digest is the *base* and the byte after it the *multiplier*.
//! The multiplier picks a tier:
//!
//! | Multiplier | Coins | Cap |
//! |------------|-------|-----|
//! | `>= 251` | `base * (mult / 100) + 1000` | 2000 |
//! | `242..251` | `base * (mult / 100) + 400` | 750 |
//! | `216..242` | `base * (mult / 100) + 150` | 400 |
//! | `85..216` | `base * (mult / 100)`, then `/ 10` if above 25 | -- |
//! | `< 85` | `base`, then `/ 10` if above 25 | -- |
//!
//! Every result is floored at [`MIN_REWARD`]. A multiplier in `85..100`
//! yields `base * 0` and therefore always the floor.
//!
//! Values must stay bit-for-bit identical to rewards already paid out, so
//! the digest and every integer step here are fixed.

use sha1::{Digest, Sha1};

/// Smallest reward any code can produce.
pub const MIN_REWARD: i64 = 5;

/// Substitute for a zero base byte.
const ZERO_BASE: i64 = 5;

/// Substitute for a zero multiplier byte.
const ZERO_MULTIPLIER: i64 = 10;

/// Derive the coin reward for a scanned code.
pub fn coins_for_scan_code(code: &str) -> i64 {
    let digest = Sha1::digest(code.as_bytes());
    let mid = digest.len() / 2;
    let base = digest.get(mid).copied().unwrap_or(0);
    let multiplier = digest.get(mid.saturating_add(1)).copied().unwrap_or(0);
    coins_from_bytes(base, multiplier)
}

/// Apply the tiering rules to a (base, multiplier) byte pair.
pub fn coins_from_bytes(base: u8, multiplier: u8) -> i64 {
    let base = match i64::from(base) {
        0 => ZERO_BASE,
        b => b,
    };
    let multiplier = match i64::from(multiplier) {
        0 => ZERO_MULTIPLIER,
        m => m,
    };
    let factor = multiplier / 100;

    let coins = if multiplier >= 251 {
        base.saturating_mul(factor).saturating_add(1000).min(2000)
    } else if multiplier >= 242 {
        base.saturating_mul(factor).saturating_add(400).min(750)
    } else if multiplier >= 216 {
        base.saturating_mul(factor).saturating_add(150).min(400)
    } else {
        let scaled = if multiplier >= 85 {
            base.saturating_mul(factor)
        } else {
            base
        };
        if scaled > 25 { scaled / 10 } else { scaled }
    };

    coins.max(MIN_REWARD)
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    use super::*;

    #[test]
    fn golden_values() {
        // Fixed outputs; changing any of these breaks existing balances.
        assert_eq!(coins_for_scan_code("mnstr"), 22);
        assert_eq!(coins_for_scan_code("hello"), 22);
        assert_eq!(coins_for_scan_code("qr-0001"), 1110);
        assert_eq!(coins_for_scan_code("a"), 208);
        assert_eq!(coins_for_scan_code("abc"), 5);
        assert_eq!(coins_for_scan_code("https://mnstr.app/c/42"), 9);
    }

    #[test]
    fn golden_values_per_tier() {
        assert_eq!(coins_for_scan_code("code-14"), 1240); // mult 251
        assert_eq!(coins_for_scan_code("code-128"), 616); // mult 244
        assert_eq!(coins_for_scan_code("code-19"), 278); // mult 218
        assert_eq!(coins_for_scan_code("code-0"), 6); // mult 197
        assert_eq!(coins_for_scan_code("code-7"), 5); // mult 95
    }

    #[test]
    fn zero_bytes_use_substitutes() {
        // base 0 -> 5, multiplier 0 -> 10 (low tier): 5 coins.
        assert_eq!(coins_from_bytes(0, 0), 5);
        assert_eq!(coins_from_bytes(0, 251), 1010);
    }

    #[test]
    fn top_tiers_add_bonus_and_cap() {
        assert_eq!(coins_from_bytes(255, 255), 1510);
        assert_eq!(coins_from_bytes(255, 250), 750);
        assert_eq!(coins_from_bytes(100, 242), 600);
        assert_eq!(coins_from_bytes(255, 241), 400);
        assert_eq!(coins_from_bytes(10, 216), 170);
    }

    #[test]
    fn low_tier_divides_large_values() {
        assert_eq!(coins_from_bytes(255, 200), 51);
        assert_eq!(coins_from_bytes(25, 120), 25);
        assert_eq!(coins_from_bytes(30, 50), 5);
        assert_eq!(coins_from_bytes(84, 84), 8);
    }

    #[test]
    fn dead_zone_collapses_to_floor() {
        for multiplier in 85..100 {
            assert_eq!(coins_from_bytes(255, multiplier), MIN_REWARD);
        }
    }

    #[test]
    fn every_byte_pair_is_bounded() {
        for base in 0..=u8::MAX {
            for multiplier in 0..=u8::MAX {
                let coins = coins_from_bytes(base, multiplier);
                assert!((MIN_REWARD..=2000).contains(&coins));
            }
        }
    }

    #[test]
    fn arbitrary_codes_are_deterministic_and_floored() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let len = rng.random_range(1..64);
            let code: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect();
            let first = coins_for_scan_code(&code);
            assert!(first >= MIN_REWARD);
            assert_eq!(first, coins_for_scan_code(&code));
        }
    }

    #[test]
    fn unicode_codes_hash_their_utf8_bytes() {
        let coins = coins_for_scan_code("モンスター");
        assert!(coins >= MIN_REWARD);
        assert_eq!(coins, coins_for_scan_code("モンスター"));
    }
}
