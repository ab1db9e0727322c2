//! OIB, the Croatian personal identification number
//!
//! Eleven digits: ten random digits followed by an ISO 7064 MOD 11,10 check
//! digit.

use rand::Rng;

pub const LEN: usize = 11;

/// MOD 11,10 check digit over `digits` (each 0..=9)
pub fn check_digit(digits: &[u8]) -> u8 {
    let mut a: u32 = 10;
    for &d in digits {
        a = (a + d as u32) % 10;
        if a == 0 {
            a = 10;
        }
        a = (a * 2) % 11;
    }
    let check = 11 - a;
    if check == 10 {
        0
    } else {
        check as u8
    }
}

/// A random, checksum-valid OIB
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> String {
    let digits: Vec<u8> = (0..LEN - 1).map(|_| rng.gen_range(0..=9)).collect();
    let check = check_digit(&digits);
    digits
        .iter()
        .chain(std::iter::once(&check))
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// Whether `oib` is eleven digits with a correct check digit
pub fn is_valid(oib: &str) -> bool {
    if oib.len() != LEN || !oib.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u8> = oib.bytes().map(|b| b - b'0').collect();
    check_digit(&digits[..LEN - 1]) == digits[LEN - 1]
}
