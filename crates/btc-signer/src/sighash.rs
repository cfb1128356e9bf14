//! The two BIP-322 signing digests.
//!
//! Both hash the virtual `to_sign` transaction, but with different
//! disciplines: P2WPKH uses the BIP-143 witness digest (double-SHA256),
//! P2TR the BIP-341 tagged digest (single tagged SHA256). The digests are
//! assembled manually rather than through a sighash cache because the
//! virtual transaction forces version, sequence, locktime, and value to
//! zero, and the resulting byte layout is the contract a remote verifier
//! recomputes.

use bitcoin::hashes::Hash;
use btc_core::address::BitcoinAddress;
use btc_core::encode::{compact_size, double_sha256, hash160, push_data};
use btc_core::error::BtcError;
use sha2::{Digest, Sha256};

use crate::bip322::{tag_hash, virtual_tx_pair};

/// `SIGHASH_DEFAULT` (taproot only): digest byte 0, nothing appended to the
/// signature.
pub const SIGHASH_DEFAULT: u8 = 0x00;
/// `SIGHASH_ALL`.
pub const SIGHASH_ALL: u8 = 0x01;

const OP_DUP: u8 = 0x76;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;

const ZERO4: [u8; 4] = [0u8; 4];
const ZERO8: [u8; 8] = [0u8; 8];

/// Single-signature script code for the given address family.
///
/// For taproot this is `<pubkey> OP_CHECKSIG`; for everything else the
/// P2PKH redeem script over hash160 of the public key. Note this is the
/// script *code* hashing into the digest, not the address's scriptPubKey.
pub fn single_sig_script(pubkey: &[u8], address: &BitcoinAddress) -> Vec<u8> {
    match address {
        BitcoinAddress::Taproot { .. } => {
            let mut script = push_data(pubkey);
            script.push(OP_CHECKSIG);
            script
        }
        _ => {
            let hash = hash160(pubkey);
            let mut script = vec![OP_DUP, OP_HASH160];
            script.extend_from_slice(&push_data(&hash));
            script.push(OP_EQUALVERIFY);
            script.push(OP_CHECKSIG);
            script
        }
    }
}

/// BIP-143-style segwit digest of the BIP-322 virtual transaction.
///
/// `pubkey` is the signer's 33-byte compressed public key; its hash160
/// forms the P2WPKH script code.
pub fn segwit_message_hash(
    address: &BitcoinAddress,
    message: &[u8],
    pubkey: &[u8],
) -> Result<[u8; 32], BtcError> {
    let script = address.script()?;
    let pair = virtual_tx_pair(message, &script);
    let script_code = single_sig_script(pubkey, address);

    // Wire-order (little-endian) txid of to_spend.
    let spend_txid = pair.to_sign.input[0]
        .previous_output
        .txid
        .to_byte_array();
    let output_script = pair.output_script();

    let mut outpoint = Vec::with_capacity(36);
    outpoint.extend_from_slice(&spend_txid);
    outpoint.extend_from_slice(&ZERO4);

    let mut outputs = Vec::new();
    outputs.extend_from_slice(&ZERO8);
    outputs.extend_from_slice(&compact_size(output_script.len() as u64));
    outputs.extend_from_slice(output_script);

    let mut preimage = Vec::new();
    // version (fixed 0), hashPrevouts, hashSequence
    preimage.extend_from_slice(&ZERO4);
    preimage.extend_from_slice(&double_sha256(&outpoint));
    preimage.extend_from_slice(&double_sha256(&ZERO4));
    // outpoint
    preimage.extend_from_slice(&outpoint);
    // script code
    preimage.extend_from_slice(&compact_size(script_code.len() as u64));
    preimage.extend_from_slice(&script_code);
    // value (fixed 0), sequence (fixed 0)
    preimage.extend_from_slice(&ZERO8);
    preimage.extend_from_slice(&ZERO4);
    // hashOutputs, locktime (fixed 0)
    preimage.extend_from_slice(&double_sha256(&outputs));
    preimage.extend_from_slice(&ZERO4);
    // sighash type, little-endian u32
    preimage.extend_from_slice(&(u32::from(SIGHASH_ALL)).to_le_bytes());

    Ok(double_sha256(&preimage))
}

/// BIP-341-style taproot digest of the BIP-322 virtual transaction
/// (key path, annex-less, single input).
pub fn taproot_message_hash(
    address: &BitcoinAddress,
    message: &[u8],
    sighash_byte: u8,
) -> Result<[u8; 32], BtcError> {
    let script = address.script()?;
    let pair = virtual_tx_pair(message, &script);

    let spend_txid = pair.to_sign.input[0]
        .previous_output
        .txid
        .to_byte_array();
    let spend_script = pair.spend_script();
    let output_script = pair.output_script();

    let mut outpoint = Vec::with_capacity(36);
    outpoint.extend_from_slice(&spend_txid);
    outpoint.extend_from_slice(&ZERO4);

    let mut scripts = Vec::new();
    scripts.extend_from_slice(&compact_size(spend_script.len() as u64));
    scripts.extend_from_slice(spend_script);

    let mut outputs = Vec::new();
    outputs.extend_from_slice(&ZERO8);
    outputs.extend_from_slice(&compact_size(output_script.len() as u64));
    outputs.extend_from_slice(output_script);

    let mut sig_msg = Vec::new();
    sig_msg.push(sighash_byte);
    // version (fixed 0), locktime (fixed 0)
    sig_msg.extend_from_slice(&ZERO4);
    sig_msg.extend_from_slice(&ZERO4);
    sig_msg.extend_from_slice(&Sha256::digest(&outpoint));
    sig_msg.extend_from_slice(&Sha256::digest(ZERO8));
    sig_msg.extend_from_slice(&Sha256::digest(&scripts));
    sig_msg.extend_from_slice(&Sha256::digest(ZERO4));
    sig_msg.extend_from_slice(&Sha256::digest(&outputs));
    // spend type (key path, no annex), input index
    sig_msg.push(0x00);
    sig_msg.extend_from_slice(&ZERO4);

    let mut hasher = Sha256::new();
    hasher.update(tag_hash(b"TapSighash"));
    hasher.update([0x00]);
    hasher.update(&sig_msg);
    Ok(hasher.finalize().into())
}
