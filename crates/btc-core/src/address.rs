use bitcoin::secp256k1::{Secp256k1, SecretKey, XOnlyPublicKey};
use bitcoin::{Address, CompressedPublicKey};

use crate::encode::push_data;
use crate::error::BtcError;
use crate::network::BtcNetwork;

// Script opcodes used by the four supported output script families.
const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;

/// Address family requested when deriving an address from a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Segwit,
    Taproot,
}

/// A classified Bitcoin address.
///
/// The variant is fully determined by the human-readable prefix of the raw
/// string; strings matching no known prefix fall into `Unrecognized` rather
/// than producing an error, and callers that require a specific family must
/// match on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BitcoinAddress {
    P2pkh { raw: String, testnet: bool },
    P2sh { raw: String, testnet: bool },
    Segwit { raw: String, testnet: bool },
    Taproot { raw: String, testnet: bool },
    Unrecognized { raw: String },
}

impl BitcoinAddress {
    /// Classify an address string by prefix. Idempotent; never fails.
    pub fn canonicalize(value: &str) -> Self {
        let raw = value.to_string();
        if value.starts_with("bc1q") {
            BitcoinAddress::Segwit { raw, testnet: false }
        } else if value.starts_with("tb1q") || value.starts_with("bcrt1q") {
            BitcoinAddress::Segwit { raw, testnet: true }
        } else if value.starts_with("bc1p") {
            BitcoinAddress::Taproot { raw, testnet: false }
        } else if value.starts_with("tb1p") || value.starts_with("bcrt1p") {
            BitcoinAddress::Taproot { raw, testnet: true }
        } else if value.starts_with('3') {
            BitcoinAddress::P2sh { raw, testnet: false }
        } else if value.starts_with('2') {
            BitcoinAddress::P2sh { raw, testnet: true }
        } else if value.starts_with('1') {
            BitcoinAddress::P2pkh { raw, testnet: false }
        } else if value.starts_with('m') || value.starts_with('n') {
            BitcoinAddress::P2pkh { raw, testnet: true }
        } else {
            BitcoinAddress::Unrecognized { raw }
        }
    }

    /// Derive a SegWit (P2WPKH) or Taproot (P2TR key-path) address from a
    /// 32-byte secp256k1 secret key.
    pub fn from_private_key(
        secret: &[u8; 32],
        kind: AddressKind,
        network: BtcNetwork,
    ) -> Result<Self, BtcError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(secret)
            .map_err(|e| BtcError::InvalidKey(format!("invalid secret key: {e}")))?;
        let net = network.to_bitcoin_network();

        let address = match kind {
            AddressKind::Segwit => {
                let public_key = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
                Address::p2wpkh(&CompressedPublicKey(public_key), net)
            }
            AddressKind::Taproot => {
                let keypair = bitcoin::secp256k1::Keypair::from_secret_key(&secp, &secret_key);
                let (internal_key, _parity) = XOnlyPublicKey::from_keypair(&keypair);
                // BIP-341 key-path output: tweak with an empty script tree.
                Address::p2tr(&secp, internal_key, None, net)
            }
        };
        Ok(Self::canonicalize(&address.to_string()))
    }

    /// The raw address string.
    pub fn raw(&self) -> &str {
        match self {
            BitcoinAddress::P2pkh { raw, .. }
            | BitcoinAddress::P2sh { raw, .. }
            | BitcoinAddress::Segwit { raw, .. }
            | BitcoinAddress::Taproot { raw, .. }
            | BitcoinAddress::Unrecognized { raw } => raw,
        }
    }

    /// True for testnet/regtest addresses. `Unrecognized` reports false.
    pub fn is_testnet(&self) -> bool {
        match self {
            BitcoinAddress::P2pkh { testnet, .. }
            | BitcoinAddress::P2sh { testnet, .. }
            | BitcoinAddress::Segwit { testnet, .. }
            | BitcoinAddress::Taproot { testnet, .. } => *testnet,
            BitcoinAddress::Unrecognized { .. } => false,
        }
    }

    /// Family name, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BitcoinAddress::P2pkh { .. } => "p2pkh",
            BitcoinAddress::P2sh { .. } => "p2sh",
            BitcoinAddress::Segwit { .. } => "segwit",
            BitcoinAddress::Taproot { .. } => "taproot",
            BitcoinAddress::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Shortened form for logs.
    pub fn abbreviated(&self) -> String {
        let raw = self.raw();
        if raw.len() <= 10 {
            return raw.to_string();
        }
        format!("{}...{}", &raw[..5], &raw[raw.len() - 5..])
    }

    /// Serialize the exact scriptPubKey for this address.
    pub fn script(&self) -> Result<Vec<u8>, BtcError> {
        match self {
            BitcoinAddress::Segwit { raw, .. } => {
                let program = decode_witness_program(raw, 0)?;
                let mut script = vec![OP_0];
                script.extend_from_slice(&push_data(&program));
                Ok(script)
            }
            BitcoinAddress::Taproot { raw, .. } => {
                let program = decode_witness_program(raw, 1)?;
                let mut script = vec![OP_1];
                script.extend_from_slice(&push_data(&program));
                Ok(script)
            }
            BitcoinAddress::P2sh { raw, .. } => {
                let hash = base58check_hash(raw)?;
                let mut script = vec![OP_HASH160];
                script.extend_from_slice(&push_data(&hash));
                script.push(OP_EQUAL);
                Ok(script)
            }
            BitcoinAddress::P2pkh { raw, .. } => {
                let hash = base58check_hash(raw)?;
                let mut script = vec![OP_DUP, OP_HASH160];
                script.extend_from_slice(&push_data(&hash));
                script.push(OP_EQUALVERIFY);
                script.push(OP_CHECKSIG);
                Ok(script)
            }
            BitcoinAddress::Unrecognized { raw } => {
                Err(BtcError::UnrecognizedAddress(raw.clone()))
            }
        }
    }

    /// Re-encode a SegWit or Taproot address under the opposite network's
    /// bech32 prefix (bc <-> tb). Base58 families are not re-encodable this
    /// way and report `UnsupportedAddressType`.
    pub fn alternate_address(&self) -> Result<Self, BtcError> {
        match self {
            BitcoinAddress::Segwit { raw, testnet } => {
                Ok(Self::canonicalize(&reencode_hrp(raw, 0, !*testnet)?))
            }
            BitcoinAddress::Taproot { raw, testnet } => {
                Ok(Self::canonicalize(&reencode_hrp(raw, 1, !*testnet)?))
            }
            other => Err(BtcError::UnsupportedAddressType {
                expected: "segwit or taproot",
                got: other.kind_name(),
            }),
        }
    }
}

impl std::fmt::Display for BitcoinAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw())
    }
}

/// Decode the witness program of a bech32/bech32m address, checking the
/// expected witness version. The decoder enforces the strict 5-to-8 bit
/// regrouping: no padding, no leftover bits.
fn decode_witness_program(raw: &str, expected_version: u8) -> Result<Vec<u8>, BtcError> {
    let (_hrp, version, program) = bech32::segwit::decode(raw)
        .map_err(|e| BtcError::Encoding(format!("bech32 decode failed: {e}")))?;
    if version.to_u8() != expected_version {
        return Err(BtcError::Encoding(format!(
            "unexpected witness version {}, wanted {expected_version}",
            version.to_u8()
        )));
    }
    Ok(program)
}

fn reencode_hrp(raw: &str, version: u8, target_testnet: bool) -> Result<String, BtcError> {
    let (_hrp, fe_version, program) = bech32::segwit::decode(raw)
        .map_err(|e| BtcError::Encoding(format!("bech32 decode failed: {e}")))?;
    debug_assert_eq!(fe_version.to_u8(), version);
    let hrp = if target_testnet {
        bech32::hrp::TB
    } else {
        bech32::hrp::BC
    };
    bech32::segwit::encode(hrp, fe_version, &program)
        .map_err(|e| BtcError::Encoding(format!("bech32 encode failed: {e}")))
}

/// Base58Check-decode a legacy address and return the 20-byte hash payload.
fn base58check_hash(raw: &str) -> Result<[u8; 20], BtcError> {
    let payload = bs58::decode(raw)
        .with_check(None)
        .into_vec()
        .map_err(|e| BtcError::Encoding(format!("base58check decode failed: {e}")))?;
    // One version byte followed by the hash160.
    if payload.len() != 21 {
        return Err(BtcError::Encoding(format!(
            "base58 payload length {} != 21",
            payload.len()
        )));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..21]);
    Ok(hash)
}
