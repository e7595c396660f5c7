//! # Single-Block AES-128
//!
//! The shared secret is exactly one AES block, and each oracle's copy is
//! encrypted under a key derived from a fresh Diffie-Hellman exchange, so a
//! raw block cipher is used without a mode of operation.

use aes_gcm::aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes_gcm::aes::{Aes128, Block};

/// AES block (and AES-128 key) length in bytes.
pub const AES_BLOCK_LENGTH: usize = 16;

/// Encrypt one block under `key`.
pub fn aes128_encrypt_block(
    key: &[u8; AES_BLOCK_LENGTH],
    plaintext: [u8; AES_BLOCK_LENGTH],
) -> [u8; AES_BLOCK_LENGTH] {
    let cipher = Aes128::new(key.into());
    let mut block = Block::from(plaintext);
    cipher.encrypt_block(&mut block);
    block.into()
}

/// Decrypt one block under `key`.
pub fn aes128_decrypt_block(
    key: &[u8; AES_BLOCK_LENGTH],
    ciphertext: [u8; AES_BLOCK_LENGTH],
) -> [u8; AES_BLOCK_LENGTH] {
    let cipher = Aes128::new(key.into());
    let mut block = Block::from(ciphertext);
    cipher.decrypt_block(&mut block);
    block.into()
}
