//! Construction and signing of an on-chain funding (deposit) transaction.
//!
//! Unlike the BIP-322 path, everything here is real: inputs spend actual
//! P2WPKH outputs, the BIP-143 digest runs over real amounts and sequences,
//! and the result is consensus-serialized for the external broadcast
//! collaborator.

use bitcoin::absolute::LockTime;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, CompressedPublicKey, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use rand::Rng;
use tracing::debug;

use btc_core::address::{AddressKind, BitcoinAddress};
use btc_core::config::BitcoinConfig;
use btc_core::error::BtcError;
use btc_core::utxo::{InputSelector, SelectionStrategy, UnspentOutput};

/// Pre-selection virtual-size estimate for a P2WPKH transaction shape.
pub fn estimate_vsize(num_inputs: usize, num_outputs: usize) -> u64 {
    11 + num_inputs as u64 * 63 + num_outputs as u64 * 41
}

/// A signed deposit transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct DepositTransaction {
    pub tx: Transaction,
    pub selected: Vec<UnspentOutput>,
    pub fee_sat: u64,
    pub change_sat: u64,
}

impl DepositTransaction {
    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// Standard wire serialization (with segwit marker/flag).
    pub fn raw_bytes(&self) -> Vec<u8> {
        bitcoin::consensus::serialize(&self.tx)
    }
}

/// Estimate the fee for a deposit spending `utxos`, by building a
/// placeholder with the final transaction's shape (destination + change
/// outputs, every input dummy-signed) and measuring its virtual size.
pub fn estimate_deposit_fee(
    config: &BitcoinConfig,
    secret: &SecretKey,
    destination: &BitcoinAddress,
    utxos: &[UnspentOutput],
    fee_rate_sat_per_vbyte: u64,
) -> Result<u64, BtcError> {
    let secp = Secp256k1::new();
    let public_key = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, secret);
    let change_script = own_change_script(secret, config)?;

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs_for(utxos)?,
        output: vec![
            TxOut {
                value: Amount::ZERO,
                script_pubkey: ScriptBuf::from(destination.script()?),
            },
            TxOut {
                value: Amount::ZERO,
                script_pubkey: change_script,
            },
        ],
    };

    // Dummy witnesses with worst-case DER signature size.
    for input in &mut tx.input {
        let mut witness = Witness::new();
        witness.push(vec![0u8; 72]);
        witness.push(public_key.serialize());
        input.witness = witness;
    }

    let rate = config.clamp_fee_rate(fee_rate_sat_per_vbyte);
    Ok(tx.vsize() as u64 * rate)
}

/// Build and sign a deposit transaction paying `amount_sat` to
/// `destination`, funded from `available` UTXOs owned by `secret`'s P2WPKH
/// address.
///
/// Input selection uses the preliminary one-input/two-output vsize
/// estimate; the final fee comes from a dummy-signed placeholder over the
/// actual selection. Change below the dust threshold is absorbed into the
/// fee.
pub fn build_and_sign_deposit_tx<R: Rng + ?Sized>(
    config: &BitcoinConfig,
    secret: &SecretKey,
    destination: &BitcoinAddress,
    amount_sat: u64,
    available: &[UnspentOutput],
    fee_rate_sat_per_vbyte: u64,
    rng: &mut R,
) -> Result<DepositTransaction, BtcError> {
    let rate = config.clamp_fee_rate(fee_rate_sat_per_vbyte);
    let preliminary_fee = estimate_vsize(1, 2) * rate;

    let selected = InputSelector::default().select_inputs(
        amount_sat,
        preliminary_fee,
        available,
        SelectionStrategy::RandomDraw,
        rng,
    )?;

    let fee_sat = estimate_deposit_fee(config, secret, destination, &selected, rate)?;
    let total_sat: u64 = selected.iter().map(|u| u.amount_sat).sum();
    let change_sat = total_sat.saturating_sub(amount_sat + fee_sat);

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: ScriptBuf::from(destination.script()?),
    }];
    let change_kept = change_sat > config.change_dust_threshold_sat;
    if change_kept {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: own_change_script(secret, config)?,
        });
    }

    let unsigned = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs_for(&selected)?,
        output: outputs,
    };

    let tx = sign_p2wpkh_inputs(unsigned, secret, &selected)?;
    debug!(
        txid = %tx.compute_txid(),
        inputs = selected.len(),
        fee_sat,
        change_sat = if change_kept { change_sat } else { 0 },
        "built deposit transaction"
    );

    Ok(DepositTransaction {
        tx,
        selected,
        fee_sat,
        change_sat: if change_kept { change_sat } else { 0 },
    })
}

fn inputs_for(utxos: &[UnspentOutput]) -> Result<Vec<TxIn>, BtcError> {
    utxos
        .iter()
        .map(|utxo| {
            let txid: Txid = utxo
                .utxo_id
                .txid()
                .parse()
                .map_err(|e| BtcError::TransactionBuild(format!("invalid txid: {e}")))?;
            Ok(TxIn {
                previous_output: OutPoint::new(txid, utxo.utxo_id.vout()),
                script_sig: ScriptBuf::new(), // Empty for segwit.
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::default(),
            })
        })
        .collect()
}

fn own_change_script(secret: &SecretKey, config: &BitcoinConfig) -> Result<ScriptBuf, BtcError> {
    let address =
        BitcoinAddress::from_private_key(&secret.secret_bytes(), AddressKind::Segwit, config.network)?;
    Ok(ScriptBuf::from(address.script()?))
}

/// BIP-143 `SIGHASH_ALL` signing of every input as a standard P2WPKH spend.
fn sign_p2wpkh_inputs(
    unsigned: Transaction,
    secret: &SecretKey,
    selected: &[UnspentOutput],
) -> Result<Transaction, BtcError> {
    let secp = Secp256k1::new();
    let public_key = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, secret);
    let compressed = CompressedPublicKey(public_key);
    let spent_script = ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash());

    let mut signed = unsigned.clone();
    for input_index in 0..signed.input.len() {
        let mut cache = SighashCache::new(&unsigned);
        let sighash = cache
            .p2wpkh_signature_hash(
                input_index,
                &spent_script,
                Amount::from_sat(selected[input_index].amount_sat),
                EcdsaSighashType::All,
            )
            .map_err(|e| BtcError::TransactionBuild(format!("sighash computation failed: {e}")))?;

        use bitcoin::hashes::Hash;
        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_ecdsa(&msg, secret);

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All as u8);

        let mut witness = Witness::new();
        witness.push(&sig_bytes);
        witness.push(public_key.serialize());
        signed.input[input_index].witness = witness;
    }
    Ok(signed)
}
