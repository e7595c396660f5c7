//! # Shared Configuration
//!
//! [`PublicConfig`] plus the decrypted shared secret: everything one oracle
//! needs to run a protocol instance. Immutable; a reconfiguration replaces it.

use crate::domain::errors::{DerivationError, IdentityError};
use crate::domain::public_config::PublicConfig;
use crate::domain::shared_secret::SharedSecret;
use crate::ports::PrivateKeys;
use shared_crypto::keccak256;
use shared_types::{Address, ContractConfig, OracleId};
use std::fmt;
use zeroize::Zeroize;

const LEADER_SELECTION_DOMAIN: &[u8] = b"offchain reporting v1 leader selection key";
const TRANSMISSION_ORDER_DOMAIN: &[u8] = b"offchain reporting v1 transmission order key";

/// Public configuration and the secret shared by its oracles.
pub struct SharedConfig {
    /// Parameters readable by anyone.
    pub public_config: PublicConfig,
    shared_secret: SharedSecret,
}

impl SharedConfig {
    /// Combine a validated public configuration with its recovered secret.
    pub fn new(public_config: PublicConfig, shared_secret: SharedSecret) -> Self {
        Self {
            public_config,
            shared_secret,
        }
    }

    /// Key seeding the external leader-election schedule.
    pub fn leader_selection_key(&self) -> [u8; 16] {
        self.derive_key(LEADER_SELECTION_DOMAIN)
    }

    /// Key seeding the per-round transmission order.
    pub fn transmission_order_key(&self) -> [u8; 16] {
        self.derive_key(TRANSMISSION_ORDER_DOMAIN)
    }

    fn derive_key(&self, domain: &[u8]) -> [u8; 16] {
        let mut key = [0u8; 16];
        key.copy_from_slice(&keccak256(&[&self.shared_secret, domain])[..16]);
        key
    }

    /// Derive this node's view of `change`.
    ///
    /// The node is located by its on-chain signing address; the identity at
    /// that position must also list our off-chain key, peer id and transmit
    /// address.
    pub fn from_contract_config<K: PrivateKeys + ?Sized>(
        change: &ContractConfig,
        keys: &K,
        peer_id: &str,
        transmit_address: Address,
    ) -> Result<(SharedConfig, OracleId), DerivationError> {
        let (public_config, encryptions) = PublicConfig::from_contract_config(change)?;
        let oracle_id = locate(&public_config, keys, peer_id, transmit_address)?;
        let shared_secret = encryptions.decrypt(oracle_id, keys)?;
        Ok((SharedConfig::new(public_config, shared_secret), oracle_id))
    }
}

fn locate<K: PrivateKeys + ?Sized>(
    config: &PublicConfig,
    keys: &K,
    peer_id: &str,
    transmit_address: Address,
) -> Result<OracleId, IdentityError> {
    let signing_address = keys.public_key_address_onchain();
    let (index, identity) = config
        .oracle_identities
        .iter()
        .enumerate()
        .find(|(_, identity)| identity.on_chain_signing_address == signing_address)
        .ok_or(IdentityError::NotInConfig(signing_address))?;
    // check_parameters bounds n by MAX_ORACLES, so the index fits.
    let oracle_id = index as u8;

    if identity.offchain_public_key != keys.public_key_offchain() {
        return Err(IdentityError::OffchainKeyMismatch(oracle_id));
    }
    if identity.peer_id != peer_id {
        return Err(IdentityError::PeerIdMismatch {
            oracle_id,
            expected: identity.peer_id.clone(),
            actual: peer_id.to_string(),
        });
    }
    if identity.transmit_address != transmit_address {
        return Err(IdentityError::TransmitAddressMismatch {
            oracle_id,
            expected: identity.transmit_address,
            actual: transmit_address,
        });
    }
    Ok(OracleId(oracle_id))
}

impl fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConfig")
            .field("public_config", &self.public_config)
            .field("shared_secret", &"<redacted>")
            .finish()
    }
}

impl Drop for SharedConfig {
    fn drop(&mut self) {
        self.shared_secret.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalPrivateKeys;
    use crate::domain::errors::{ConfigError, CryptoError};
    use crate::domain::publication::{build_contract_config, ProtocolParameters};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct Fixture {
        keys: Vec<LocalPrivateKeys>,
        change: ContractConfig,
    }

    fn fixture(n: usize) -> Fixture {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let keys: Vec<_> = (0..n).map(|_| LocalPrivateKeys::generate(&mut rng)).collect();
        let credentials: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| k.credentials(format!("peer-{i}"), Address([0x70 + i as u8; 20])))
            .collect();
        let params = ProtocolParameters {
            s: vec![1; n],
            ..ProtocolParameters::default()
        };
        let change =
            build_contract_config(Address([0xCC; 20]), 1, &credentials, &params, &mut rng).unwrap();
        Fixture { keys, change }
    }

    #[test]
    fn test_all_oracles_agree_on_keys() {
        let fx = fixture(4);
        let derived: Vec<_> = fx
            .keys
            .iter()
            .enumerate()
            .map(|(i, k)| {
                SharedConfig::from_contract_config(
                    &fx.change,
                    k,
                    &format!("peer-{i}"),
                    Address([0x70 + i as u8; 20]),
                )
                .unwrap()
            })
            .collect();

        for (i, (config, oracle_id)) in derived.iter().enumerate() {
            assert_eq!(*oracle_id, OracleId(i as u8));
            assert_eq!(
                config.transmission_order_key(),
                derived[0].0.transmission_order_key()
            );
            assert_eq!(config.leader_selection_key(), derived[0].0.leader_selection_key());
        }
        assert_ne!(
            derived[0].0.leader_selection_key(),
            derived[0].0.transmission_order_key()
        );
    }

    #[test]
    fn test_unknown_signer_not_in_config() {
        let fx = fixture(4);
        let outsider = LocalPrivateKeys::generate(&mut ChaCha20Rng::seed_from_u64(99));
        let result =
            SharedConfig::from_contract_config(&fx.change, &outsider, "peer-x", Address([1; 20]));
        assert!(matches!(
            result,
            Err(DerivationError::Identity(IdentityError::NotInConfig(_)))
        ));
    }

    #[test]
    fn test_peer_id_mismatch() {
        let fx = fixture(4);
        let result = SharedConfig::from_contract_config(
            &fx.change,
            &fx.keys[2],
            "someone-else",
            Address([0x72; 20]),
        );
        assert!(matches!(
            result,
            Err(DerivationError::Identity(IdentityError::PeerIdMismatch { oracle_id: 2, .. }))
        ));
    }

    #[test]
    fn test_transmit_address_mismatch() {
        let fx = fixture(4);
        let result =
            SharedConfig::from_contract_config(&fx.change, &fx.keys[1], "peer-1", Address([0; 20]));
        assert!(matches!(
            result,
            Err(DerivationError::Identity(
                IdentityError::TransmitAddressMismatch { oracle_id: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_tampered_encryption_fails_with_hash_mismatch() {
        let mut fx = fixture(4);
        let (public, mut encryptions) = PublicConfig::from_contract_config(&fx.change).unwrap();
        encryptions.encryptions[0][0] ^= 0x80;
        fx.change.encoded = public.encode(&encryptions).unwrap();

        let result =
            SharedConfig::from_contract_config(&fx.change, &fx.keys[0], "peer-0", Address([0x70; 20]));
        assert_eq!(
            result.map(|_| ()),
            Err(DerivationError::Crypto(CryptoError::HashMismatch))
        );
    }

    #[test]
    fn test_garbage_blob_fails_with_config_error() {
        let mut fx = fixture(4);
        fx.change.encoded = vec![0xEE; 10];
        let result =
            SharedConfig::from_contract_config(&fx.change, &fx.keys[0], "peer-0", Address([0x70; 20]));
        assert!(matches!(
            result,
            Err(DerivationError::Config(ConfigError::DecodeFailed(_)))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let fx = fixture(4);
        let (config, _) =
            SharedConfig::from_contract_config(&fx.change, &fx.keys[0], "peer-0", Address([0x70; 20]))
                .unwrap();
        assert!(format!("{config:?}").contains("<redacted>"));
    }
}
