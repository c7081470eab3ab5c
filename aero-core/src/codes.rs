//! Lookup-token generators. Each draw is uniform over its token space; the
//! caller re-draws on collision against existing rows (expected O(1) retries
//! given the 36^6 and 10^12 spaces).

use rand::Rng;

const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BARCODE_LEN: usize = 12;

/// One draw of a 6-character reservation code over {A-Z, 0-9}.
pub fn reservation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// One draw of a 12-digit numeric ticket barcode.
pub fn ticket_barcode() -> String {
    let mut rng = rand::thread_rng();
    (0..BARCODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn thousand_codes_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let code = reservation_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            assert!(seen.insert(code), "duplicate code drawn");
        }
    }

    #[test]
    fn barcode_is_twelve_digits() {
        for _ in 0..100 {
            let barcode = ticket_barcode();
            assert_eq!(barcode.len(), 12);
            assert!(barcode.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
