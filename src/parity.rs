/// Returns `true` when the XOR of all 16 bits of the command word is zero.
pub(crate) fn even_parity(word: u16) -> bool {
    (word.count_ones() & 1) == 0
}

/// Parity bit that makes `address << 1 | bit` and `code` pass [`even_parity`].
pub(crate) fn parity_bit(address: u8, code: u8) -> u8 {
    ((address.count_ones() + code.count_ones()) & 1) as u8
}

pub(crate) fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

pub(crate) fn hi8(x: u16) -> u8 {
    (x >> 8) as u8
}

pub(crate) fn lo8(x: u16) -> u8 {
    (x & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_bit_balances_word() {
        for address in 0..=0x7fu8 {
            for code in [0x00, 0x01, 0x55, 0x73, 0x99, 0xff] {
                let word = ((((address << 1) | parity_bit(address, code)) as u16) << 8) | code as u16;
                assert!(even_parity(word), "address {address:#x} code {code:#x}");
                assert!(!even_parity(word ^ 0x0100));
            }
        }
    }

    #[test]
    fn test_xor_fold() {
        assert_eq!(xor_fold(&[]), 0);
        assert_eq!(xor_fold(&[0x12, 0x34, 0x12]), 0x34);
    }

    #[test]
    fn test_byte_split() {
        assert_eq!(hi8(0xabcd), 0xab);
        assert_eq!(lo8(0xabcd), 0xcd);
    }
}
