//! # Public Configuration
//!
//! The protocol parameters every participant (and any observer of the chain)
//! can read, combined from the contract's identity lists and the decoded
//! off-chain blob.

use crate::domain::encoding::{
    self, SetConfigEncodedComponents, SUPPORTED_ENCODED_CONFIG_VERSION,
};
use crate::domain::errors::ConfigError;
use crate::domain::shared_secret::SharedSecretEncryptions;
use shared_types::{Address, ConfigDigest, ContractConfig};
use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

/// Upper bound on the oracle population of one configuration.
pub const MAX_ORACLES: usize = 31;

/// One oracle's identity within a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleIdentity {
    /// Transport-level peer identifier.
    pub peer_id: String,
    /// Ed25519 key used to authenticate off-chain messages.
    pub offchain_public_key: [u8; 32],
    /// Address recovered from the oracle's report signatures.
    pub on_chain_signing_address: Address,
    /// Address the oracle submits transactions from.
    pub transmit_address: Address,
}

/// Protocol parameters of one configuration version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicConfig {
    /// Epoch progress timeout.
    pub delta_progress: Duration,
    /// Resend interval for leader-election messages.
    pub delta_resend: Duration,
    /// Round interval.
    pub delta_round: Duration,
    /// Grace period for late observations.
    pub delta_grace: Duration,
    /// Maximum age of the latest on-chain report before a heartbeat.
    pub delta_c: Duration,
    /// Deviation threshold in parts per billion.
    pub alpha_ppb: u64,
    /// Delay between consecutive transmission stages.
    pub delta_stage: Duration,
    /// Maximum rounds per epoch.
    pub r_max: u8,
    /// Transmission stage weights; sums to the population size.
    pub s: Vec<u8>,
    /// Oracle identities, indexed by `OracleId`.
    pub oracle_identities: Vec<OracleIdentity>,
    /// Fault-tolerance bound.
    pub f: u8,
    /// Digest of the configuration this was derived from.
    pub config_digest: ConfigDigest,
}

impl PublicConfig {
    /// Population size.
    pub fn n(&self) -> usize {
        self.oracle_identities.len()
    }

    /// Structural constraints every usable configuration satisfies.
    pub fn check_parameters(&self) -> Result<(), ConfigError> {
        let n = self.n();
        ensure(n > 0 && n <= MAX_ORACLES, || {
            format!("oracle count {n} outside 1..={MAX_ORACLES}")
        })?;
        ensure(3 * usize::from(self.f) < n, || {
            format!("3f < n violated: f={}, n={n}", self.f)
        })?;
        ensure(self.r_max > 0, || "rMax must be positive".to_string())?;

        for (name, delta) in [
            ("deltaProgress", self.delta_progress),
            ("deltaResend", self.delta_resend),
            ("deltaRound", self.delta_round),
            ("deltaGrace", self.delta_grace),
            ("deltaC", self.delta_c),
            ("deltaStage", self.delta_stage),
        ] {
            ensure(!delta.is_zero(), || format!("{name} must be positive"))?;
        }
        ensure(self.delta_progress > self.delta_round, || {
            "deltaProgress must exceed deltaRound".to_string()
        })?;
        ensure(self.delta_round > self.delta_grace, || {
            "deltaRound must exceed deltaGrace".to_string()
        })?;

        ensure(!self.s.is_empty(), || "S must not be empty".to_string())?;
        let weight: usize = self.s.iter().map(|w| usize::from(*w)).sum();
        ensure(weight == n, || format!("sum(S) = {weight}, n = {n}"))?;

        let ids = &self.oracle_identities;
        ensure(all_unique(ids.iter().map(|i| &i.peer_id)), || {
            "duplicate peer id".to_string()
        })?;
        ensure(
            all_unique(ids.iter().map(|i| i.on_chain_signing_address)),
            || "duplicate signing address".to_string(),
        )?;
        ensure(all_unique(ids.iter().map(|i| i.transmit_address)), || {
            "duplicate transmit address".to_string()
        })?;
        ensure(all_unique(ids.iter().map(|i| i.offchain_public_key)), || {
            "duplicate off-chain public key".to_string()
        })
    }

    /// Decode and validate the public part of a contract configuration.
    ///
    /// Also returns the shared-secret encryptions, which have one entry per
    /// oracle.
    pub fn from_contract_config(
        change: &ContractConfig,
    ) -> Result<(PublicConfig, SharedSecretEncryptions), ConfigError> {
        if change.encoded_config_version != SUPPORTED_ENCODED_CONFIG_VERSION {
            return Err(ConfigError::UnknownVersion {
                got: change.encoded_config_version,
                expected: SUPPORTED_ENCODED_CONFIG_VERSION,
            });
        }
        let components = encoding::decode(&change.encoded)?;

        let n = change.signers.len();
        let lengths = [
            ("transmitters", change.transmitters.len()),
            ("peer ids", components.peer_ids.len()),
            ("off-chain public keys", components.offchain_public_keys.len()),
            (
                "shared secret encryptions",
                components.shared_secret_encryptions.encryptions.len(),
            ),
        ];
        for (name, len) in lengths {
            ensure(len == n, || format!("{len} {name} for {n} signers"))?;
        }

        let oracle_identities = change
            .signers
            .iter()
            .zip(&change.transmitters)
            .zip(components.peer_ids.iter().zip(&components.offchain_public_keys))
            .map(|((signer, transmitter), (peer_id, key))| OracleIdentity {
                peer_id: peer_id.clone(),
                offchain_public_key: *key,
                on_chain_signing_address: *signer,
                transmit_address: *transmitter,
            })
            .collect();

        let config = PublicConfig {
            delta_progress: duration("deltaProgress", components.delta_progress)?,
            delta_resend: duration("deltaResend", components.delta_resend)?,
            delta_round: duration("deltaRound", components.delta_round)?,
            delta_grace: duration("deltaGrace", components.delta_grace)?,
            delta_c: duration("deltaC", components.delta_c)?,
            alpha_ppb: components.alpha_ppb,
            delta_stage: duration("deltaStage", components.delta_stage)?,
            r_max: components.r_max,
            s: components.s,
            oracle_identities,
            f: change.threshold,
            config_digest: change.config_digest,
        };
        config.check_parameters()?;
        Ok((config, components.shared_secret_encryptions))
    }

    /// Encode this configuration's off-chain half together with `encryptions`.
    pub fn encode(&self, encryptions: &SharedSecretEncryptions) -> Result<Vec<u8>, ConfigError> {
        let components = SetConfigEncodedComponents {
            delta_progress: nanos("deltaProgress", self.delta_progress)?,
            delta_resend: nanos("deltaResend", self.delta_resend)?,
            delta_round: nanos("deltaRound", self.delta_round)?,
            delta_grace: nanos("deltaGrace", self.delta_grace)?,
            delta_c: nanos("deltaC", self.delta_c)?,
            alpha_ppb: self.alpha_ppb,
            delta_stage: nanos("deltaStage", self.delta_stage)?,
            r_max: self.r_max,
            s: self.s.clone(),
            offchain_public_keys: self
                .oracle_identities
                .iter()
                .map(|i| i.offchain_public_key)
                .collect(),
            peer_ids: self.oracle_identities.iter().map(|i| i.peer_id.clone()).collect(),
            shared_secret_encryptions: encryptions.clone(),
        };
        encoding::encode(&components)
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameters(message()))
    }
}

fn all_unique<T: Eq + Hash>(items: impl Iterator<Item = T>) -> bool {
    let mut seen = HashSet::new();
    items.into_iter().all(|item| seen.insert(item))
}

fn duration(name: &str, nanos: i64) -> Result<Duration, ConfigError> {
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| ConfigError::InvalidParameters(format!("{name} is negative")))
}

fn nanos(name: &str, duration: Duration) -> Result<i64, ConfigError> {
    i64::try_from(duration.as_nanos())
        .map_err(|_| ConfigError::InvalidParameters(format!("{name} overflows int64")))
}
