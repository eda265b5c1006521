//! Application-facing wallet operations: create/import, build and sign,
//! broadcast, and the serialized send path

use super::gas::GasEstimator;
use super::nonce::NonceCoordinator;
use super::signer::TransactionSigner;
use super::types::{GasSetting, SignedTransaction, UnsignedTransaction};
use crate::config::GasConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::Wallet;
use crate::network::{BlockTag, Network, TxSkeleton};

use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transaction sender bound to one network
pub struct TransactionSender {
    /// Network collaborator
    network: Arc<dyn Network>,
    /// Nonce coordinator
    nonces: NonceCoordinator,
    /// Gas estimator
    gas: GasEstimator,
    /// Chain served by `network`
    chain_id: u64,
}

impl TransactionSender {
    pub fn new(network: Arc<dyn Network>, chain_id: u64, gas_config: &GasConfig) -> Self {
        Self {
            nonces: NonceCoordinator::new(network.clone()),
            gas: GasEstimator::new(network.clone(), gas_config),
            network,
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn nonces(&self) -> &NonceCoordinator {
        &self.nonces
    }

    pub fn gas(&self) -> &GasEstimator {
        &self.gas
    }

    /// Fresh wallet from OS entropy
    pub fn create_wallet(&self) -> WalletResult<Wallet> {
        Wallet::generate()
    }

    /// Wallet from a hex private key
    pub fn import_wallet(&self, private_key: &str) -> WalletResult<Wallet> {
        Wallet::from_private_key(private_key)
    }

    /// Build and sign a transfer using the next cached nonce. The nonce is
    /// not advanced; that happens when the payload is broadcast.
    pub async fn build_and_sign_transfer(
        &self,
        wallet: &Wallet,
        to: Address,
        value: U256,
        gas_price: GasSetting,
        gas_limit: GasSetting,
        chain_id: u64,
    ) -> WalletResult<SignedTransaction> {
        check_inputs(gas_limit, chain_id)?;
        let nonce = self.nonces.get_nonce(wallet.address()).await?;
        self.sign_transfer(wallet, nonce, to, value, gas_price, gas_limit, chain_id)
            .await
    }

    /// Submit a signed payload. The sender's cached nonce is advanced on
    /// success and evicted when the network reports a nonce conflict.
    pub async fn broadcast(&self, signed_hex: &str) -> WalletResult<B256> {
        let signed = SignedTransaction::from_hex(signed_hex)?;
        let chain_id = signed.transaction().chain_id;
        if chain_id != self.chain_id {
            return Err(WalletError::Encoding(format!(
                "transaction is signed for chain {}, network is chain {}",
                chain_id, self.chain_id
            )));
        }
        let sender = signed.recover_signer()?;

        match self.submit(&signed).await {
            Ok(hash) => {
                self.nonces.advance(sender).await;
                Ok(hash)
            }
            Err(e) => {
                if e.requires_nonce_reset() {
                    self.nonces.reset(sender).await;
                }
                Err(e)
            }
        }
    }

    /// Fetch nonce, build, sign, check affordability, broadcast and advance,
    /// holding the sender's nonce for the whole sequence
    pub async fn send_transfer(
        &self,
        wallet: &Wallet,
        to: Address,
        value: U256,
        gas_price: GasSetting,
        gas_limit: GasSetting,
    ) -> WalletResult<B256> {
        check_inputs(gas_limit, self.chain_id)?;
        let reservation = self.nonces.reserve(wallet.address()).await?;

        let signed = self
            .sign_transfer(
                wallet,
                reservation.nonce(),
                to,
                value,
                gas_price,
                gas_limit,
                self.chain_id,
            )
            .await?;

        let tx = signed.transaction();
        let cost = GasEstimator::transaction_cost(tx.gas_limit, tx.gas_price, tx.value)?;
        let balance = self.balance(wallet.address()).await?;
        if cost > balance {
            return Err(WalletError::InsufficientBalance {
                have: balance.to_string(),
                need: cost.to_string(),
            });
        }

        match self.submit(&signed).await {
            Ok(hash) => {
                reservation.commit();
                Ok(hash)
            }
            Err(e) => {
                reservation.release();
                Err(e)
            }
        }
    }

    /// Balance in wei at the latest block
    pub async fn balance(&self, address: Address) -> WalletResult<U256> {
        self.network.get_balance(address, BlockTag::Latest).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn sign_transfer(
        &self,
        wallet: &Wallet,
        nonce: u64,
        to: Address,
        value: U256,
        gas_price: GasSetting,
        gas_limit: GasSetting,
        chain_id: u64,
    ) -> WalletResult<SignedTransaction> {
        let gas_limit = match gas_limit {
            GasSetting::Auto => {
                let skeleton = TxSkeleton {
                    from: wallet.address(),
                    to,
                    value,
                    data: Vec::new(),
                };
                self.gas.buffered_gas_limit(&skeleton).await
            }
            GasSetting::Manual(limit) => manual_gas_limit(limit)?,
        };
        let gas_price = match gas_price {
            GasSetting::Auto => self.gas.current_gas_price().await?,
            GasSetting::Manual(price) => price,
        };

        let tx = UnsignedTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data: Vec::new(),
            chain_id,
        };
        debug!(
            "Built transfer from {}: nonce {}, gas {} @ {} wei",
            wallet.address(),
            nonce,
            gas_limit,
            gas_price
        );

        TransactionSigner::sign(wallet, tx)
    }

    async fn submit(&self, signed: &SignedTransaction) -> WalletResult<B256> {
        let chain_id = signed.transaction().chain_id;
        let nonce = signed.transaction().nonce;

        match self.network.send_raw_transaction(signed.raw()).await {
            Ok(hash) => {
                if hash != signed.hash() {
                    warn!(
                        "Network reported hash {}, payload hashes to {}",
                        hash,
                        signed.hash()
                    );
                }
                crate::metrics::record_tx_broadcast(chain_id);
                info!("Transaction sent: {} (nonce {}, chain {})", hash, nonce, chain_id);
                Ok(hash)
            }
            Err(e) if e.is_already_known() => {
                // An earlier attempt reached the mempool, e.g. before a failover
                crate::metrics::record_tx_broadcast(chain_id);
                info!(
                    "Transaction already known: {} (nonce {}, chain {})",
                    signed.hash(),
                    nonce,
                    chain_id
                );
                Ok(signed.hash())
            }
            Err(e) => {
                crate::metrics::record_tx_failed(chain_id);
                warn!("Broadcast of nonce {} failed: {}", nonce, e);
                Err(e)
            }
        }
    }
}

/// Input checks that must fail before any network call
fn check_inputs(gas_limit: GasSetting, chain_id: u64) -> WalletResult<()> {
    if chain_id == 0 {
        return Err(WalletError::Encoding("chain id must be positive".to_string()));
    }
    if let GasSetting::Manual(limit) = gas_limit {
        manual_gas_limit(limit)?;
    }
    Ok(())
}

fn manual_gas_limit(limit: U256) -> WalletResult<u64> {
    u64::try_from(limit)
        .map_err(|_| WalletError::Encoding(format!("gas limit {} does not fit in 64 bits", limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockNetwork;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn sender(network: MockNetwork) -> TransactionSender {
        TransactionSender::new(Arc::new(network), 1, &GasConfig::default())
    }

    fn recipient() -> Address {
        Address::repeat_byte(0x35)
    }

    fn one_ether() -> U256 {
        U256::from(1_000_000_000_000_000_000u64)
    }

    #[tokio::test]
    async fn test_build_and_sign_with_manual_gas() {
        let mut network = MockNetwork::new();
        network
            .expect_get_transaction_count()
            .times(1)
            .returning(|_, _| Ok(0));
        network.expect_estimate_gas().never();
        network.expect_gas_price().never();
        let sender = sender(network);
        let wallet = sender.import_wallet(KEY_ONE).unwrap();

        let signed = sender
            .build_and_sign_transfer(
                &wallet,
                recipient(),
                one_ether(),
                GasSetting::parse("0x4a817c800").unwrap(),
                GasSetting::parse("0x5208").unwrap(),
                1,
            )
            .await
            .unwrap();

        assert_eq!(
            signed.to_hex(),
            "0xf86c808504a817c800825208943535353535353535353535353535353535353535\
             880de0b6b3a76400008025a0097b8d4cb2431209543081bcc597644ca4f94c055241\
             1759060b8a7b11745b90a07abb2e080d29c6d2c9b2a94c5514c1b494868d9f9a5c0d\
             40b7da8f19fd67de08"
        );
    }

    #[tokio::test]
    async fn test_auto_gas_buffers_estimate() {
        let mut network = MockNetwork::new();
        network.expect_get_transaction_count().returning(|_, _| Ok(3));
        network.expect_estimate_gas().returning(|_| Ok(21_000));
        network
            .expect_gas_price()
            .returning(|| Ok(U256::from(1_000_000_000u64)));
        let sender = sender(network);
        let wallet = sender.create_wallet().unwrap();

        let signed = sender
            .build_and_sign_transfer(
                &wallet,
                recipient(),
                U256::from(1u64),
                GasSetting::Auto,
                GasSetting::Auto,
                1,
            )
            .await
            .unwrap();

        assert_eq!(signed.transaction().nonce, 3);
        assert_eq!(signed.transaction().gas_limit, 23_100);
        assert_eq!(signed.transaction().gas_price, U256::from(1_000_000_000u64));
        assert_eq!(signed.recover_signer().unwrap(), wallet.address());
    }

    #[test]
    fn test_invalid_input_rejected_before_network() {
        let mut network = MockNetwork::new();
        network.expect_get_transaction_count().never();
        let sender = sender(network);
        let wallet = Wallet::generate().unwrap();

        let err = tokio_test::block_on(sender.build_and_sign_transfer(
            &wallet,
            recipient(),
            U256::from(1u64),
            GasSetting::Auto,
            GasSetting::Manual(U256::MAX),
            1,
        ))
        .unwrap_err();
        assert!(err.is_user_error());

        let err = tokio_test::block_on(sender.build_and_sign_transfer(
            &wallet,
            recipient(),
            U256::ZERO,
            GasSetting::Auto,
            GasSetting::Auto,
            0,
        ))
        .unwrap_err();
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn test_gas_price_failure_is_not_masked() {
        let mut network = MockNetwork::new();
        network.expect_get_transaction_count().returning(|_, _| Ok(0));
        network.expect_estimate_gas().returning(|_| Ok(21_000));
        network
            .expect_gas_price()
            .returning(|| Err(WalletError::network("eth_gasPrice", "bad gateway")));
        let sender = sender(network);
        let wallet = Wallet::generate().unwrap();

        let err = sender
            .build_and_sign_transfer(&wallet, recipient(), U256::ZERO, GasSetting::Auto, GasSetting::Auto, 1)
            .await
            .unwrap_err();
        assert!(err.is_network_error());
    }

    #[tokio::test]
    async fn test_broadcast_advances_sender_nonce() {
        let mut network = MockNetwork::new();
        network
            .expect_get_transaction_count()
            .times(1)
            .returning(|_, _| Ok(0));
        network
            .expect_send_raw_transaction()
            .times(1)
            .returning(|raw| Ok(crate::encoding::keccak256(raw)));
        let sender = sender(network);
        let wallet = sender.import_wallet(KEY_ONE).unwrap();

        let signed = sender
            .build_and_sign_transfer(
                &wallet,
                recipient(),
                one_ether(),
                GasSetting::Manual(U256::from(20_000_000_000u64)),
                GasSetting::Manual(U256::from(21_000u64)),
                1,
            )
            .await
            .unwrap();
        let hash = sender.broadcast(&signed.to_hex()).await.unwrap();

        assert_eq!(hash, signed.hash());
        assert_eq!(sender.nonces().get_nonce(wallet.address()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_nonce_conflict_resets_cache() {
        let mut network = MockNetwork::new();
        network
            .expect_get_transaction_count()
            .times(2)
            .returning(|_, _| Ok(0));
        network
            .expect_send_raw_transaction()
            .returning(|_| Err(WalletError::NonceConflict("nonce too low".to_string())));
        let sender = sender(network);
        let wallet = sender.import_wallet(KEY_ONE).unwrap();

        let signed = sender
            .build_and_sign_transfer(
                &wallet,
                recipient(),
                one_ether(),
                GasSetting::Manual(U256::from(1u64)),
                GasSetting::Manual(U256::from(21_000u64)),
                1,
            )
            .await
            .unwrap();
        let err = sender.broadcast(&signed.to_hex()).await.unwrap_err();

        assert!(err.requires_nonce_reset());
        // Second lookup goes back to the network
        sender.nonces().get_nonce(wallet.address()).await.unwrap();
    }

    #[tokio::test]
    async fn test_broadcast_rejects_foreign_chain() {
        let mut network = MockNetwork::new();
        network.expect_get_transaction_count().returning(|_, _| Ok(0));
        network.expect_send_raw_transaction().never();
        let sender = sender(network);
        let wallet = sender.import_wallet(KEY_ONE).unwrap();

        let signed = sender
            .build_and_sign_transfer(
                &wallet,
                recipient(),
                one_ether(),
                GasSetting::Manual(U256::from(1u64)),
                GasSetting::Manual(U256::from(21_000u64)),
                5,
            )
            .await
            .unwrap();
        assert!(sender.broadcast(&signed.to_hex()).await.is_err());
    }

    #[tokio::test]
    async fn test_send_transfer_checks_balance() {
        let mut network = MockNetwork::new();
        network
            .expect_get_transaction_count()
            .times(2)
            .returning(|_, _| Ok(0));
        network
            .expect_get_balance()
            .returning(|_, _| Ok(U256::from(1_000u64)));
        network.expect_send_raw_transaction().never();
        let sender = sender(network);
        let wallet = Wallet::generate().unwrap();

        let err = sender
            .send_transfer(
                &wallet,
                recipient(),
                one_ether(),
                GasSetting::Manual(U256::from(1u64)),
                GasSetting::Manual(U256::from(21_000u64)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InsufficientBalance { .. }));

        // The failed attempt evicted the nonce
        assert_eq!(sender.nonces().get_nonce(wallet.address()).await.unwrap(), 0);
    }
}
