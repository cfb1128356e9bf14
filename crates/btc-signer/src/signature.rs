use btc_core::error::BtcError;

/// A Bitcoin signature as exchanged with consumers, classified from its
/// textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitcoinSignature {
    /// 64-byte Schnorr signature, hex encoded.
    Schnorr(String),
    Unrecognized(String),
}

impl BitcoinSignature {
    /// Classify a signature string. A 128-hex-char value is a bare Schnorr
    /// signature; anything else is left unrecognized. Idempotent.
    pub fn canonicalize(value: &str) -> Self {
        if value.len() == 128 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            BitcoinSignature::Schnorr(value.to_string())
        } else {
            BitcoinSignature::Unrecognized(value.to_string())
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            BitcoinSignature::Schnorr(raw) | BitcoinSignature::Unrecognized(raw) => raw,
        }
    }

    /// Shortened form for logs.
    pub fn abbreviated(&self) -> String {
        let raw = self.raw();
        if raw.len() <= 10 {
            return raw.to_string();
        }
        format!("{}...{}", &raw[..6], &raw[raw.len() - 4..])
    }
}

impl std::fmt::Display for BitcoinSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw())
    }
}

/// A parsed witness-stack signature blob: a count byte followed by
/// length-prefixed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessBlob {
    pub items: Vec<Vec<u8>>,
}

impl WitnessBlob {
    /// Serialize as emitted by the signer: `count (len item)*`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.items.len() as u8];
        for item in &self.items {
            out.push(item.len() as u8);
            out.extend_from_slice(item);
        }
        out
    }

    /// Parse a blob, requiring every byte to be consumed.
    pub fn parse(bytes: &[u8]) -> Result<Self, BtcError> {
        let (&count, mut rest) = bytes
            .split_first()
            .ok_or_else(|| BtcError::Encoding("empty witness blob".into()))?;
        let mut items = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let (&len, tail) = rest
                .split_first()
                .ok_or_else(|| BtcError::Encoding("truncated witness item length".into()))?;
            let len = usize::from(len);
            if tail.len() < len {
                return Err(BtcError::Encoding("truncated witness item".into()));
            }
            items.push(tail[..len].to_vec());
            rest = &tail[len..];
        }
        if !rest.is_empty() {
            return Err(BtcError::Encoding("trailing bytes after witness blob".into()));
        }
        Ok(Self { items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_schnorr_by_length() {
        let hex128 = "ab".repeat(64);
        assert!(matches!(
            BitcoinSignature::canonicalize(&hex128),
            BitcoinSignature::Schnorr(_)
        ));
    }

    #[test]
    fn canonicalize_rejects_non_hex() {
        let not_hex = "zz".repeat(64);
        assert!(matches!(
            BitcoinSignature::canonicalize(&not_hex),
            BitcoinSignature::Unrecognized(_)
        ));
    }

    #[test]
    fn canonicalize_other_lengths_unrecognized() {
        assert!(matches!(
            BitcoinSignature::canonicalize("abcd"),
            BitcoinSignature::Unrecognized(_)
        ));
    }

    #[test]
    fn abbreviated_form() {
        let sig = BitcoinSignature::canonicalize(&"ab".repeat(64));
        assert_eq!(sig.abbreviated(), "ababab...abab");
    }

    #[test]
    fn blob_roundtrip() {
        let blob = WitnessBlob {
            items: vec![vec![1, 2, 3], vec![4; 33]],
        };
        let bytes = blob.to_bytes();
        assert_eq!(bytes[0], 2);
        assert_eq!(WitnessBlob::parse(&bytes).unwrap(), blob);
    }

    #[test]
    fn blob_rejects_truncation() {
        let blob = WitnessBlob {
            items: vec![vec![1, 2, 3]],
        };
        let mut bytes = blob.to_bytes();
        bytes.pop();
        assert!(WitnessBlob::parse(&bytes).is_err());
    }

    #[test]
    fn blob_rejects_trailing_garbage() {
        let blob = WitnessBlob {
            items: vec![vec![1, 2, 3]],
        };
        let mut bytes = blob.to_bytes();
        bytes.push(0xff);
        assert!(WitnessBlob::parse(&bytes).is_err());
    }

    #[test]
    fn blob_rejects_empty() {
        assert!(WitnessBlob::parse(&[]).is_err());
    }
}
