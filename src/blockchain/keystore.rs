//! Local accounts and transaction signing.
//!
//! # Security
//! - Private keys come from the environment or are generated in memory
//! - Keys and passphrases are never logged or serialized
//! - Only a SHA-256 digest of each passphrase is kept

use alloy::consensus::{SignableTransaction, Signed, TxLegacy};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::config::KeystoreConfig;
use crate::error::{ErrorCode, SdkError, SdkResult};

/// Holds the keys for local accounts and signs on their behalf.
pub trait AccountProvider: Send + Sync {
    fn accounts(&self) -> Vec<Address>;

    /// `Ok` when `address` is held here, [`SdkError::AccountNotFound`] otherwise.
    fn find(&self, address: Address) -> SdkResult<()>;

    fn new_account(&self, passphrase: &str) -> SdkResult<Address>;

    /// Sign with an unlocked account. `chain_param` is the EIP-155 chain id to sign with.
    fn sign_transaction(&self, address: Address, tx: TxLegacy, chain_param: u64) -> SdkResult<Signed<TxLegacy>>;

    /// Sign after checking `passphrase`, whether or not the account is unlocked.
    fn sign_transaction_with_passphrase(
        &self,
        address: Address,
        passphrase: &str,
        tx: TxLegacy,
        chain_param: u64,
    ) -> SdkResult<Signed<TxLegacy>>;
}

struct KeyEntry {
    signer: PrivateKeySigner,
    passphrase: [u8; 32],
    unlocked: bool,
}

/// In-memory [`AccountProvider`].
///
/// Imported keys carry an empty passphrase. New accounts start unlocked.
#[derive(Default)]
pub struct LocalKeystore {
    keys: DashMap<Address, KeyEntry>,
}

fn digest(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

fn sign_with(signer: &PrivateKeySigner, mut tx: TxLegacy, chain_param: u64, code: ErrorCode) -> SdkResult<Signed<TxLegacy>> {
    tx.chain_id = Some(chain_param);
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .map_err(|e| SdkError::wallet(code, e))?;
    Ok(tx.into_signed(signature))
}

impl LocalKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys from the configured environment variable (comma-separated
    /// `hexkey[:passphrase]`), then the configured unlock list.
    pub fn from_env(config: &KeystoreConfig) -> SdkResult<Self> {
        let keystore = Self::new();
        match std::env::var(&config.private_keys_env) {
            Ok(keys) => {
                for entry in keys.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
                    match entry.split_once(':') {
                        Some((key, passphrase)) => keystore.import_with_passphrase(key, passphrase)?,
                        None => keystore.import(entry)?,
                    };
                }
            }
            Err(_) => tracing::info!(var = %config.private_keys_env, "No private keys in environment"),
        }

        for (address, passphrase) in &config.unlock {
            let parsed = match address.parse::<Address>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Skipping unlock of malformed address");
                    continue;
                }
            };
            if let Err(e) = keystore.unlock(parsed, passphrase) {
                tracing::warn!(address = %parsed, error = %e, "Unlock failed");
            }
        }

        tracing::info!(accounts = keystore.keys.len(), "Keystore loaded");
        Ok(keystore)
    }

    /// Add a hex private key (with or without `0x`). The account is unlocked.
    pub fn import(&self, private_key_hex: &str) -> SdkResult<Address> {
        self.import_with_passphrase(private_key_hex, "")
    }

    /// Add a hex private key guarded by `passphrase`. Stays locked unless the
    /// passphrase is empty.
    pub fn import_with_passphrase(&self, private_key_hex: &str, passphrase: &str) -> SdkResult<Address> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SdkError::wallet(ErrorCode::NewAccount, format!("invalid private key: {}", e)))?;
        let address = signer.address();
        let unlocked = passphrase.is_empty();
        self.keys.insert(
            address,
            KeyEntry {
                signer,
                passphrase: digest(passphrase),
                unlocked,
            },
        );
        tracing::info!(address = %address, unlocked, "Imported account");
        Ok(address)
    }

    pub fn unlock(&self, address: Address, passphrase: &str) -> SdkResult<()> {
        let mut entry = self.keys.get_mut(&address).ok_or(SdkError::AccountNotFound(address))?;
        if entry.passphrase != digest(passphrase) {
            return Err(SdkError::wallet(ErrorCode::SignTxWithPassphrase, "could not decrypt key with given passphrase"));
        }
        entry.unlocked = true;
        tracing::info!(address = %address, "Account unlocked");
        Ok(())
    }

    pub fn lock(&self, address: Address) -> SdkResult<()> {
        let mut entry = self.keys.get_mut(&address).ok_or(SdkError::AccountNotFound(address))?;
        entry.unlocked = false;
        Ok(())
    }

    pub fn is_unlocked(&self, address: Address) -> bool {
        self.keys.get(&address).map(|entry| entry.unlocked).unwrap_or(false)
    }
}

impl AccountProvider for LocalKeystore {
    fn accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self.keys.iter().map(|entry| *entry.key()).collect();
        accounts.sort_unstable();
        accounts
    }

    fn find(&self, address: Address) -> SdkResult<()> {
        if self.keys.contains_key(&address) {
            Ok(())
        } else {
            Err(SdkError::AccountNotFound(address))
        }
    }

    fn new_account(&self, passphrase: &str) -> SdkResult<Address> {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        self.keys.insert(
            address,
            KeyEntry {
                signer,
                passphrase: digest(passphrase),
                unlocked: true,
            },
        );
        tracing::info!(address = %address, "Created account");
        Ok(address)
    }

    fn sign_transaction(&self, address: Address, tx: TxLegacy, chain_param: u64) -> SdkResult<Signed<TxLegacy>> {
        let entry = self.keys.get(&address).ok_or(SdkError::AccountNotFound(address))?;
        if !entry.unlocked {
            return Err(SdkError::wallet(ErrorCode::SignTx, "authentication needed: password or unlock"));
        }
        sign_with(&entry.signer, tx, chain_param, ErrorCode::SignTx)
    }

    fn sign_transaction_with_passphrase(
        &self,
        address: Address,
        passphrase: &str,
        tx: TxLegacy,
        chain_param: u64,
    ) -> SdkResult<Signed<TxLegacy>> {
        let entry = self.keys.get(&address).ok_or(SdkError::AccountNotFound(address))?;
        if entry.passphrase != digest(passphrase) {
            return Err(SdkError::wallet(
                ErrorCode::SignTxWithPassphrase,
                "could not decrypt key with given passphrase",
            ));
        }
        sign_with(&entry.signer, tx, chain_param, ErrorCode::SignTxWithPassphrase)
    }
}

impl std::fmt::Debug for LocalKeystore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeystore").field("accounts", &self.keys.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transaction::{LegacyTxCodec, TxCodec};
    use alloy::primitives::{TxKind, U256};

    // Anvil's first account.
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn tx() -> TxLegacy {
        TxLegacy {
            chain_id: None,
            nonce: 3,
            gas_price: 100_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(Address::repeat_byte(0x42)),
            value: U256::from(1u64),
            input: Default::default(),
        }
    }

    #[test]
    fn test_import_known_key() {
        let keystore = LocalKeystore::new();
        let address = keystore.import(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(
            address.to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert!(keystore.find(address).is_ok());
        assert_eq!(keystore.accounts(), vec![address]);
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let err = LocalKeystore::new().import("not-a-key").unwrap_err();
        assert_eq!(err.code(), -1004);
    }

    #[test]
    fn test_unknown_account_is_lookup_error() {
        let err = LocalKeystore::new().find(Address::repeat_byte(9)).unwrap_err();
        assert!(matches!(err, SdkError::AccountNotFound(_)));
        assert_eq!(err.code(), -1002);
    }

    #[test]
    fn test_signature_recovers_sender_with_chain_param() {
        let keystore = LocalKeystore::new();
        let address = keystore.import(TEST_PRIVATE_KEY).unwrap();

        let signed = keystore.sign_transaction(address, tx(), 0x31).unwrap();
        assert_eq!(signed.tx().chain_id, Some(0x31));
        let recovered = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .unwrap();
        assert_eq!(recovered, address);

        let raw = LegacyTxCodec.encode_canonical(&signed).unwrap();
        assert_eq!(alloy::primitives::keccak256(&raw), LegacyTxCodec.hash(&signed));
    }

    #[test]
    fn test_passphrase_signing() {
        let keystore = LocalKeystore::new();
        let address = keystore.new_account("hunter2").unwrap();
        assert!(keystore.is_unlocked(address));

        keystore.lock(address).unwrap();
        let err = keystore.sign_transaction(address, tx(), 0x31).unwrap_err();
        assert_eq!(err.code(), -1006);

        let err = keystore
            .sign_transaction_with_passphrase(address, "wrong", tx(), 0x31)
            .unwrap_err();
        assert_eq!(err.code(), -1009);

        assert!(keystore
            .sign_transaction_with_passphrase(address, "hunter2", tx(), 0x31)
            .is_ok());

        keystore.unlock(address, "hunter2").unwrap();
        assert!(keystore.sign_transaction(address, tx(), 0x31).is_ok());
    }

    #[test]
    fn test_from_env_with_guarded_key() {
        let var = "BAAS_SDK_TEST_KEYS_FROM_ENV";
        std::env::set_var(var, format!(" {}:s3cret ,", TEST_PRIVATE_KEY));

        let mut config = KeystoreConfig {
            private_keys_env: var.to_string(),
            ..KeystoreConfig::default()
        };
        let keystore = LocalKeystore::from_env(&config).unwrap();
        let address = keystore.accounts()[0];
        assert!(!keystore.is_unlocked(address));
        assert!(keystore.sign_transaction(address, tx(), 0x31).is_err());

        config.unlock.insert(format!("{:#x}", address), "s3cret".to_string());
        let keystore = LocalKeystore::from_env(&config).unwrap();
        assert!(keystore.is_unlocked(address));

        std::env::remove_var(var);
    }

    #[test]
    fn test_debug_hides_keys() {
        let keystore = LocalKeystore::new();
        keystore.import(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", keystore);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
    }
}
