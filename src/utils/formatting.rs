// src/utils/formatting.rs
//! Display helpers for `bytes32` values.

use ethers_core::types::H256;

/// Renders a `bytes32` value for display.
///
/// Values that hold short printable ASCII (e.g. `formatBytes32String("GENERAL")`)
/// are shown as text with trailing NUL padding removed; anything else is shown as
/// a truncated hex string such as `0x1234...abcd`.
pub fn format_hash(hash: H256) -> String {
    let text: String = String::from_utf8_lossy(hash.as_bytes())
        .trim_end_matches('\0')
        .trim()
        .to_string();
    if !text.is_empty() && text.chars().all(|c| (' '..='~').contains(&c)) {
        return text;
    }
    truncate_hex(&format!("{:#x}", hash))
}

/// Shortens a long hex string to `0x1234...abcd`.
pub fn truncate_hex(value: &str) -> String {
    if value.len() <= 12 {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_bytes32_is_shown_as_text() {
        let mut bytes = [0u8; 32];
        bytes[..7].copy_from_slice(b"GENERAL");
        assert_eq!(format_hash(H256::from(bytes)), "GENERAL");
    }

    #[test]
    fn test_binary_bytes32_is_truncated() {
        let hash = H256::repeat_byte(0xab);
        assert_eq!(format_hash(hash), "0xabab...abab");
        assert_eq!(format_hash(H256::zero()), "0x0000...0000");
    }

    #[test]
    fn test_short_values_are_not_truncated() {
        assert_eq!(truncate_hex("0x1234"), "0x1234");
    }
}
