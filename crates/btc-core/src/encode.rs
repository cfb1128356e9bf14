//! Low-level script and wire encoding helpers shared by the address,
//! sighash, and transaction code.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Encode a length as a Bitcoin compact-size (varint) prefix.
pub fn compact_size(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(n as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(n as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&n.to_le_bytes());
            out
        }
    }
}

/// Encode a data push: the minimal push opcode followed by the data.
pub fn push_data(data: &[u8]) -> Vec<u8> {
    const OP_PUSHDATA1: u8 = 0x4c;
    const OP_PUSHDATA2: u8 = 0x4d;
    const OP_PUSHDATA4: u8 = 0x4e;

    let mut out = Vec::with_capacity(data.len() + 5);
    match data.len() {
        len if len < 0x4c => out.push(len as u8),
        len if len <= 0xff => {
            out.push(OP_PUSHDATA1);
            out.push(len as u8);
        }
        len if len <= 0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// RIPEMD160(SHA256(data)), the standard public-key hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(sha));
    out
}

/// SHA256(SHA256(data)).
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(first));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_one_byte() {
        assert_eq!(compact_size(0), vec![0x00]);
        assert_eq!(compact_size(25), vec![0x19]);
        assert_eq!(compact_size(0xfc), vec![0xfc]);
    }

    #[test]
    fn compact_size_two_byte() {
        assert_eq!(compact_size(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(compact_size(0xffff), vec![0xfd, 0xff, 0xff]);
    }

    #[test]
    fn compact_size_four_and_eight_byte() {
        assert_eq!(compact_size(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(
            compact_size(0x1_0000_0000),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn push_data_short() {
        assert_eq!(push_data(&[0xab; 20])[0], 20);
        assert_eq!(push_data(&[0xab; 20]).len(), 21);
    }

    #[test]
    fn push_data_pushdata1() {
        let data = vec![0x11; 0x60];
        let encoded = push_data(&data);
        assert_eq!(&encoded[..2], &[0x4c, 0x60]);
        assert_eq!(encoded.len(), 2 + 0x60);
    }

    #[test]
    fn push_data_pushdata2() {
        let data = vec![0x22; 0x1234];
        let encoded = push_data(&data);
        assert_eq!(&encoded[..3], &[0x4d, 0x34, 0x12]);
    }

    #[test]
    fn hash160_known_vector() {
        // hash160 of the generator-point pubkey (secret key 1), per BIP-173.
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn double_sha256_of_empty() {
        assert_eq!(
            hex::encode(double_sha256(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }
}
