//! # Configuration Publication
//!
//! Dealer side: turn a set of oracle credentials and protocol parameters
//! into the [`ContractConfig`] the contract would publish. Used by operator
//! tooling and by tests that need a real, decryptable configuration.

use crate::domain::digest::compute_config_digest;
use crate::domain::encoding::SUPPORTED_ENCODED_CONFIG_VERSION;
use crate::domain::errors::DerivationError;
use crate::domain::public_config::{OracleIdentity, PublicConfig};
use crate::domain::shared_secret::{SharedSecret, SharedSecretEncryptions};
use rand::{CryptoRng, RngCore};
use shared_types::{Address, ConfigDigest, ContractConfig};
use std::time::Duration;
use zeroize::Zeroize;

/// Public keys and addresses one oracle registers for a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCredentials {
    /// On-chain signing address.
    pub on_chain_signing_address: Address,
    /// On-chain transmit address.
    pub transmit_address: Address,
    /// Ed25519 off-chain public key.
    pub offchain_public_key: [u8; 32],
    /// X25519 key the shared secret is encrypted to.
    pub config_public_key: [u8; 32],
    /// Transport peer id.
    pub peer_id: String,
}

/// Protocol parameters chosen by the contract owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolParameters {
    /// Epoch progress timeout.
    pub delta_progress: Duration,
    /// Leader-election resend interval.
    pub delta_resend: Duration,
    /// Round interval.
    pub delta_round: Duration,
    /// Observation grace period.
    pub delta_grace: Duration,
    /// Heartbeat interval.
    pub delta_c: Duration,
    /// Deviation threshold in parts per billion.
    pub alpha_ppb: u64,
    /// Delay between transmission stages.
    pub delta_stage: Duration,
    /// Maximum rounds per epoch.
    pub r_max: u8,
    /// Transmission stage weights.
    pub s: Vec<u8>,
    /// Fault-tolerance bound.
    pub f: u8,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            delta_progress: Duration::from_secs(35),
            delta_resend: Duration::from_secs(17),
            delta_round: Duration::from_secs(30),
            delta_grace: Duration::from_secs(12),
            delta_c: Duration::from_secs(600),
            alpha_ppb: 10_000_000,
            delta_stage: Duration::from_secs(60),
            r_max: 6,
            s: vec![1, 2, 2],
            f: 1,
        }
    }
}

/// Build the published configuration: draw a fresh shared secret, encrypt it
/// to every oracle, encode the blob and compute its digest.
pub fn build_contract_config<R: RngCore + CryptoRng>(
    contract_address: Address,
    config_count: u64,
    oracles: &[OracleCredentials],
    params: &ProtocolParameters,
    rng: &mut R,
) -> Result<ContractConfig, DerivationError> {
    let public_config = PublicConfig {
        delta_progress: params.delta_progress,
        delta_resend: params.delta_resend,
        delta_round: params.delta_round,
        delta_grace: params.delta_grace,
        delta_c: params.delta_c,
        alpha_ppb: params.alpha_ppb,
        delta_stage: params.delta_stage,
        r_max: params.r_max,
        s: params.s.clone(),
        oracle_identities: oracles
            .iter()
            .map(|o| OracleIdentity {
                peer_id: o.peer_id.clone(),
                offchain_public_key: o.offchain_public_key,
                on_chain_signing_address: o.on_chain_signing_address,
                transmit_address: o.transmit_address,
            })
            .collect(),
        f: params.f,
        config_digest: ConfigDigest::ZERO,
    };
    public_config.check_parameters()?;

    let mut secret: SharedSecret = [0u8; 16];
    rng.fill_bytes(&mut secret);
    let config_keys: Vec<[u8; 32]> = oracles.iter().map(|o| o.config_public_key).collect();
    let encryptions = SharedSecretEncryptions::encrypt(&config_keys, &secret, rng);
    secret.zeroize();
    let encoded = public_config.encode(&encryptions?)?;

    let signers: Vec<Address> = oracles.iter().map(|o| o.on_chain_signing_address).collect();
    let transmitters: Vec<Address> = oracles.iter().map(|o| o.transmit_address).collect();
    let config_digest = compute_config_digest(
        contract_address,
        config_count,
        &signers,
        &transmitters,
        params.f,
        SUPPORTED_ENCODED_CONFIG_VERSION,
        &encoded,
    );

    Ok(ContractConfig {
        config_digest,
        signers,
        transmitters,
        threshold: params.f,
        encoded_config_version: SUPPORTED_ENCODED_CONFIG_VERSION,
        encoded,
    })
}
