use bitcoin::secp256k1::SecretKey;
use zeroize::Zeroizing;

use crate::error::BtcError;

/// Parse a secp256k1 secret key from a hex string (with or without a `0x`
/// prefix). The intermediate byte buffer is wiped on drop.
pub fn secret_key_from_hex(hex_str: &str) -> Result<SecretKey, BtcError> {
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = Zeroizing::new(
        hex::decode(stripped).map_err(|e| BtcError::InvalidKey(format!("invalid hex: {e}")))?,
    );
    SecretKey::from_slice(&bytes).map_err(|e| BtcError::InvalidKey(format!("invalid secret key: {e}")))
}

/// Generate a fresh random secret key.
pub fn generate_secret_key() -> SecretKey {
    SecretKey::new(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_prefix() {
        let plain = "0000000000000000000000000000000000000000000000000000000000000001";
        let a = secret_key_from_hex(plain).unwrap();
        let b = secret_key_from_hex(&format!("0x{plain}")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_zero_scalar() {
        let zero = "00".repeat(32);
        assert!(secret_key_from_hex(&zero).is_err());
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(secret_key_from_hex("not-hex").is_err());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_secret_key(), generate_secret_key());
    }
}
