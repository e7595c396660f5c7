//! # Config Digest
//!
//! `keccak256(abi.encode(contractAddress, configCount, signers, transmitters,
//! threshold, encodedConfigVersion, encodedConfig))`, matching what the
//! contract computes when it emits its "config set" event.

use alloy_primitives::{Address as AbiAddress, Bytes};
use alloy_sol_types::SolValue;
use shared_crypto::keccak256;
use shared_types::{Address, ConfigDigest, ContractConfig};

/// Compute the digest of one configuration version.
pub fn compute_config_digest(
    contract_address: Address,
    config_count: u64,
    signers: &[Address],
    transmitters: &[Address],
    threshold: u8,
    encoded_config_version: u64,
    encoded_config: &[u8],
) -> ConfigDigest {
    let addresses = |list: &[Address]| -> Vec<AbiAddress> {
        list.iter().map(|a| AbiAddress::new(a.0)).collect()
    };
    let packed = (
        AbiAddress::new(contract_address.0),
        config_count,
        addresses(signers),
        addresses(transmitters),
        u16::from(threshold), // u8 lacks SolValue; uintN ABI words encode identically
        encoded_config_version,
        Bytes::copy_from_slice(encoded_config),
    )
        .abi_encode_params();
    ConfigDigest(keccak256(&[&packed]))
}

/// Whether `config` carries the digest its contents produce for the given
/// contract and config count.
pub fn verify_config_digest(
    contract_address: Address,
    config_count: u64,
    config: &ContractConfig,
) -> bool {
    compute_config_digest(
        contract_address,
        config_count,
        &config.signers,
        &config.transmitters,
        config.threshold,
        config.encoded_config_version,
        &config.encoded,
    ) == config.config_digest
}
