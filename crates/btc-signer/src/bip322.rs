//! BIP-322 virtual transaction construction.
//!
//! A message-ownership proof is a signature over a synthetic pair of
//! transactions: `to_spend` commits to the message hash and carries the
//! proving address's scriptPubKey, `to_sign` spends it back to an
//! `OP_RETURN`. Neither is ever broadcast, but every "fixed to zero" field
//! below (version, sequence, locktime, output value) is recomputed verbatim
//! by verifiers and must not be changed.

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use sha2::{Digest, Sha256};

const OP_RETURN: u8 = 0x6a;

/// SHA256(tag) repeated twice, the prefix of a BIP-340 style tagged hash.
pub fn tag_hash(tag: &[u8]) -> [u8; 64] {
    let hashed = Sha256::digest(tag);
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&hashed);
    out[32..].copy_from_slice(&hashed);
    out
}

/// The BIP-322 message commitment:
/// `SHA256(tag_hash("BIP0322-signed-message") ++ message)`.
pub fn message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag_hash(b"BIP0322-signed-message"));
    hasher.update(message);
    hasher.finalize().into()
}

/// The `to_spend` / `to_sign` pair for a message and a target scriptPubKey.
#[derive(Debug, Clone)]
pub struct VirtualTxPair {
    pub to_spend: Transaction,
    pub to_sign: Transaction,
}

impl VirtualTxPair {
    /// The scriptPubKey being proven, as carried by `to_sign`'s input.
    pub fn spend_script(&self) -> &[u8] {
        self.to_sign.input[0].script_sig.as_bytes()
    }

    /// The single `OP_RETURN` output script of `to_sign`.
    pub fn output_script(&self) -> &[u8] {
        self.to_sign.output[0].script_pubkey.as_bytes()
    }
}

/// Build the canonical virtual transaction pair of BIP-322.
pub fn virtual_tx_pair(message: &[u8], script_pubkey: &[u8]) -> VirtualTxPair {
    let msg_hash = message_hash(message);

    // scriptSig = OP_0 <push 32-byte message hash>
    let mut script_sig = Vec::with_capacity(34);
    script_sig.push(0x00);
    script_sig.push(32);
    script_sig.extend_from_slice(&msg_hash);

    let to_spend = Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::all_zeros(),
                vout: 0xffff_ffff,
            },
            script_sig: ScriptBuf::from(script_sig),
            sequence: Sequence::ZERO,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::from(script_pubkey.to_vec()),
        }],
    };

    let to_sign = Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: to_spend.compute_txid(),
                vout: 0,
            },
            // The spent scriptPubKey rides along here; the taproot digest
            // hashes it as the single prevout's script.
            script_sig: ScriptBuf::from(script_pubkey.to_vec()),
            sequence: Sequence::ZERO,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::from(vec![OP_RETURN]),
        }],
    };

    VirtualTxPair { to_spend, to_sign }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btc_core::address::BitcoinAddress;

    #[test]
    fn to_spend_txid_matches_published_bip322_vectors() {
        // Address and to_spend txids from the test vectors in BIP-322.
        let addr = BitcoinAddress::canonicalize("bc1q9vza2e8x573nczrlzms0wvx3gsqjx7vavgkx0l");
        let script = addr.script().unwrap();

        let empty = virtual_tx_pair(b"", &script);
        assert_eq!(
            empty.to_spend.compute_txid().to_string(),
            "c5680aa69bb8d860bf82d4e9cd3504b55dde018de765a91bb566283c545a99a7"
        );

        let hello = virtual_tx_pair(b"Hello World", &script);
        assert_eq!(
            hello.to_spend.compute_txid().to_string(),
            "b79d196740ad5217771c1098fc4a4b51e0535c32236c71f1ea4d61a2d603352b"
        );
    }

    #[test]
    fn tag_hash_is_doubled_sha256() {
        let tag = tag_hash(b"BIP0322-signed-message");
        assert_eq!(tag[..32], tag[32..]);
        let single: [u8; 32] = Sha256::digest(b"BIP0322-signed-message").into();
        assert_eq!(tag[..32], single);
    }

    #[test]
    fn message_hash_is_deterministic_and_message_bound() {
        let a = message_hash(b"hello");
        let b = message_hash(b"hello");
        let c = message_hash(b"hello!");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn to_spend_layout() {
        let script = vec![0x00, 0x14, 0xab];
        let pair = virtual_tx_pair(b"msg", &script);

        let to_spend = &pair.to_spend;
        assert_eq!(to_spend.version, Version(0));
        assert_eq!(to_spend.input.len(), 1);
        assert_eq!(to_spend.input[0].previous_output.txid, Txid::all_zeros());
        assert_eq!(to_spend.input[0].previous_output.vout, 0xffff_ffff);
        assert_eq!(to_spend.input[0].sequence, Sequence::ZERO);
        assert_eq!(to_spend.output.len(), 1);
        assert_eq!(to_spend.output[0].value, Amount::ZERO);
        assert_eq!(to_spend.output[0].script_pubkey.as_bytes(), &script[..]);

        // OP_0 <32-byte push>
        let script_sig = to_spend.input[0].script_sig.as_bytes();
        assert_eq!(script_sig.len(), 34);
        assert_eq!(script_sig[0], 0x00);
        assert_eq!(script_sig[1], 32);
        assert_eq!(&script_sig[2..], &message_hash(b"msg"));
    }

    #[test]
    fn to_sign_spends_to_spend_output_zero() {
        let script = vec![0x51, 0x20, 0xcd];
        let pair = virtual_tx_pair(b"msg", &script);

        let to_sign = &pair.to_sign;
        assert_eq!(to_sign.version, Version(0));
        assert_eq!(
            to_sign.input[0].previous_output.txid,
            pair.to_spend.compute_txid()
        );
        assert_eq!(to_sign.input[0].previous_output.vout, 0);
        assert_eq!(to_sign.output[0].script_pubkey.as_bytes(), &[OP_RETURN]);
        assert_eq!(pair.spend_script(), &script[..]);
        assert_eq!(pair.output_script(), &[OP_RETURN]);
    }

    #[test]
    fn pair_is_message_dependent() {
        let script = vec![0x00, 0x14, 0xab];
        let a = virtual_tx_pair(b"one", &script);
        let b = virtual_tx_pair(b"two", &script);
        assert_ne!(a.to_spend.compute_txid(), b.to_spend.compute_txid());
    }
}
