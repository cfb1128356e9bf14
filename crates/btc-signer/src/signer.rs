//! Message signing and witness blob assembly.

use bitcoin::key::TapTweak;
use bitcoin::secp256k1::{ecdsa, schnorr, Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use btc_core::address::BitcoinAddress;
use btc_core::encode::hash160;
use btc_core::error::BtcError;

use crate::sighash::{segwit_message_hash, taproot_message_hash, SIGHASH_DEFAULT};
use crate::signature::WitnessBlob;

/// DER-encode an ECDSA signature over an already-hashed 32-byte digest.
pub fn sign_der_prehashed(secret: &SecretKey, digest: [u8; 32]) -> Vec<u8> {
    let secp = Secp256k1::new();
    let msg = Message::from_digest(digest);
    secp.sign_ecdsa(&msg, secret).serialize_der().to_vec()
}

/// BIP-341 key-path tweak of a keypair (empty script tree).
pub fn tweaked_keypair(secret: &SecretKey) -> Keypair {
    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, secret);
    keypair.tap_tweak(&secp, None).to_inner()
}

/// Produce a BIP-322 proof-of-ownership signature blob for the address.
///
/// SegWit addresses get an ECDSA witness stack
/// `{0x02, len+1, der_sig, 0x01, 33, pubkey}`; taproot addresses a Schnorr
/// stack `{0x01, 64|65, sig[, sighash_byte]}` signed with the tweaked key.
/// Other families are refused: BIP-322 signing here covers P2WPKH and P2TR
/// only.
pub fn sign_message(
    secret: &SecretKey,
    address: &BitcoinAddress,
    message: &[u8],
    sighash_byte: u8,
) -> Result<Vec<u8>, BtcError> {
    let secp = Secp256k1::new();
    match address {
        BitcoinAddress::Segwit { .. } => {
            let pubkey = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, secret).serialize();
            let digest = segwit_message_hash(address, message, &pubkey)?;
            let mut sig = sign_der_prehashed(secret, digest);
            sig.push(crate::sighash::SIGHASH_ALL);
            Ok(WitnessBlob {
                items: vec![sig, pubkey.to_vec()],
            }
            .to_bytes())
        }
        BitcoinAddress::Taproot { .. } => {
            let digest = taproot_message_hash(address, message, sighash_byte)?;
            let keypair = tweaked_keypair(secret);
            let sig = secp.sign_schnorr(&Message::from_digest(digest), &keypair);
            let mut item = sig.as_ref().to_vec();
            if sighash_byte != SIGHASH_DEFAULT {
                item.push(sighash_byte);
            }
            Ok(WitnessBlob { items: vec![item] }.to_bytes())
        }
        other => Err(BtcError::UnsupportedAddressType {
            expected: "segwit or taproot",
            got: other.kind_name(),
        }),
    }
}

/// Verify a signature blob produced by [`sign_message`] against the address
/// it claims to prove. Structural problems are errors; a well-formed blob
/// that fails cryptographic verification returns `Ok(false)`.
pub fn verify_message(
    address: &BitcoinAddress,
    message: &[u8],
    blob: &[u8],
) -> Result<bool, BtcError> {
    let secp = Secp256k1::verification_only();
    let parsed = WitnessBlob::parse(blob)?;
    let script = address.script()?;

    match address {
        BitcoinAddress::Segwit { .. } => {
            if parsed.items.len() != 2 {
                return Err(BtcError::Encoding("expected a two-item witness stack".into()));
            }
            let sig_item = &parsed.items[0];
            let pubkey = &parsed.items[1];
            if sig_item.is_empty() {
                return Err(BtcError::Encoding("empty signature item".into()));
            }

            // The pubkey must hash to the witness program being proven.
            if script.len() != 22 || script[2..22] != hash160(pubkey) {
                return Ok(false);
            }

            let der = &sig_item[..sig_item.len() - 1];
            let signature = ecdsa::Signature::from_der(der)
                .map_err(|e| BtcError::Encoding(format!("invalid DER signature: {e}")))?;
            let public_key = bitcoin::secp256k1::PublicKey::from_slice(pubkey)
                .map_err(|e| BtcError::Encoding(format!("invalid public key: {e}")))?;

            let digest = segwit_message_hash(address, message, pubkey)?;
            Ok(secp
                .verify_ecdsa(&Message::from_digest(digest), &signature, &public_key)
                .is_ok())
        }
        BitcoinAddress::Taproot { .. } => {
            if parsed.items.len() != 1 {
                return Err(BtcError::Encoding("expected a one-item witness stack".into()));
            }
            let item = &parsed.items[0];
            let (sig_bytes, sighash_byte) = match item.len() {
                64 => (&item[..64], SIGHASH_DEFAULT),
                65 => (&item[..64], item[64]),
                n => {
                    return Err(BtcError::Encoding(format!(
                        "schnorr signature item of length {n}"
                    )))
                }
            };
            let signature = schnorr::Signature::from_slice(sig_bytes)
                .map_err(|e| BtcError::Encoding(format!("invalid schnorr signature: {e}")))?;

            // The tweaked output key lives in the address's witness program.
            if script.len() != 34 {
                return Err(BtcError::Encoding("taproot script is not 34 bytes".into()));
            }
            let output_key = XOnlyPublicKey::from_slice(&script[2..34])
                .map_err(|e| BtcError::Encoding(format!("invalid output key: {e}")))?;

            let digest = taproot_message_hash(address, message, sighash_byte)?;
            Ok(secp
                .verify_schnorr(&signature, &Message::from_digest(digest), &output_key)
                .is_ok())
        }
        other => Err(BtcError::UnsupportedAddressType {
            expected: "segwit or taproot",
            got: other.kind_name(),
        }),
    }
}
