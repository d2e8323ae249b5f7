//! # Crypto Helpers
//!
//! Transaction hashing and a reference Ed25519 signer.
//!
//! The signing capability proper is an external collaborator — production
//! key material lives behind the platform's secure enclave, not in this
//! crate. What lives here is the hash construction everything agrees on
//! (double SHA-256, resistant to length-extension games) and
//! [`LocalSigner`], an in-process implementation of the signing trait for
//! development, testing, and the CLI.
//!
//! Key bytes are never logged. If you add logging to this module, you
//! will be asked to leave.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config;
use crate::lifecycle::services::{SignedBlob, Signer, SigningError};
use crate::transaction::{Address, Transaction};

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// SHA-256, fixed-size output.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// `SHA-256(SHA-256(data))` — the transaction-hash construction.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256_array(&sha256_array(data))
}

/// Derives the ledger address of an Ed25519 public key: the first 20
/// bytes of its double-SHA-256.
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = double_sha256(public_key);
    let mut id = [0u8; config::ACCOUNT_ID_LENGTH];
    id.copy_from_slice(&digest[..config::ACCOUNT_ID_LENGTH]);
    Address::from_account_id(&id)
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Errors raised loading key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Wrong length or non-hex input. Deliberately vague about which —
    /// error text describing key material is a classic leak.
    #[error("invalid secret key material")]
    InvalidSecretKey,
}

/// An Ed25519 keypair for a wallet account.
///
/// Deliberately NOT `Serialize`/`Deserialize`: exporting a private key
/// should be a conscious act, not a side effect of shoving a struct into
/// JSON. Use the explicit byte accessors.
pub struct WalletKeypair {
    signing_key: SigningKey,
}

impl WalletKeypair {
    /// Generates a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> WalletKeypair {
        WalletKeypair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuilds a keypair from a 32-byte seed (the Ed25519 secret key).
    pub fn from_seed(seed: &[u8; 32]) -> WalletKeypair {
        WalletKeypair {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Loads a keypair from a hex-encoded seed. Convenient for devnet;
    /// production keys belong in the platform keystore.
    pub fn from_hex(hex_str: &str) -> Result<WalletKeypair, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(WalletKeypair::from_seed(&seed))
    }

    /// The public (verifying) key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The ledger address this keypair controls.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key_bytes())
    }

    /// Signs a message, returning the 64 raw signature bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verifies a signature made by this keypair's public half.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        let sig = Signature::from_bytes(signature);
        self.signing_key.verifying_key().verify(message, &sig).is_ok()
    }
}

/// Verifies a signature against explicit public key bytes.
pub fn verify_with_public_key(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key.verify(message, &Signature::from_bytes(signature)).is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// LocalSigner
// ---------------------------------------------------------------------------

/// An in-process [`Signer`] holding its key material directly.
///
/// The signed blob layout is `signable_bytes ‖ signature(64) ‖ pubkey(32)`,
/// hex-encoded; the transaction hash is the double-SHA-256 of the
/// canonical bytes, so it matches [`Transaction::hash_hex`] and is stable
/// whether or not the ledger has seen the transaction yet.
pub struct LocalSigner {
    keypair: WalletKeypair,
}

impl LocalSigner {
    pub fn new(keypair: WalletKeypair) -> LocalSigner {
        LocalSigner { keypair }
    }

    /// The address this signer can sign for.
    pub fn address(&self) -> Address {
        self.keypair.address()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(
        &self,
        transaction: &Transaction,
        account: &Address,
    ) -> Result<SignedBlob, SigningError> {
        // Refuse to sign for an account this key does not control; a
        // signature the ledger will reject is worse than no signature.
        if *account != self.keypair.address() {
            return Err(SigningError::KeyUnavailable {
                account: account.as_str().to_string(),
            });
        }

        let signable = transaction.signable_bytes();
        let signature = self.keypair.sign(&signable);

        let mut envelope = signable;
        envelope.extend_from_slice(&signature);
        envelope.extend_from_slice(&self.keypair.public_key_bytes());

        Ok(SignedBlob {
            blob: hex::encode(&envelope),
            tx_hash: transaction.hash_hex(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
