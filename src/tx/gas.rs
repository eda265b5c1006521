//! Gas limit estimation and legacy gas pricing

use crate::config::GasConfig;
use crate::error::{WalletError, WalletResult};
use crate::network::{Network, TxSkeleton};

use alloy_primitives::U256;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gas estimator for transfers
pub struct GasEstimator {
    network: Arc<dyn Network>,
    /// Buffer percentage for gas limit (e.g., 10 = 10% buffer)
    limit_buffer_percent: u64,
    /// Limit used when the network cannot estimate
    fallback_gas_limit: u64,
}

impl GasEstimator {
    pub fn new(network: Arc<dyn Network>, config: &GasConfig) -> Self {
        Self {
            network,
            limit_buffer_percent: config.limit_buffer_percent,
            fallback_gas_limit: config.fallback_gas_limit,
        }
    }

    /// Network gas estimate, or the fallback limit when estimation fails.
    ///
    /// The fallback only covers a plain value transfer. Contract calls that
    /// reach it will run out of gas.
    pub async fn estimate_gas_limit(&self, tx: &TxSkeleton) -> u64 {
        self.try_estimate(tx).await.unwrap_or(self.fallback_gas_limit)
    }

    /// Buffered network estimate; the fallback limit is used as is
    pub async fn buffered_gas_limit(&self, tx: &TxSkeleton) -> u64 {
        match self.try_estimate(tx).await {
            Some(estimate) => {
                let buffered = Self::apply_buffer(estimate, self.limit_buffer_percent);
                debug!("Gas limit {} buffered to {}", estimate, buffered);
                buffered
            }
            None => self.fallback_gas_limit,
        }
    }

    async fn try_estimate(&self, tx: &TxSkeleton) -> Option<u64> {
        match self.network.estimate_gas(tx).await {
            Ok(estimate) => Some(estimate),
            Err(e) => {
                warn!(
                    "Gas estimation failed for {} -> {}, using fallback {}: {}",
                    tx.from, tx.to, self.fallback_gas_limit, e
                );
                crate::metrics::record_gas_fallback();
                None
            }
        }
    }

    /// Inflate `estimate` by `percent`, rounding up
    pub fn apply_buffer(estimate: u64, percent: u64) -> u64 {
        let scaled = u128::from(estimate) * (100 + u128::from(percent));
        let buffered = (scaled + 99) / 100;
        u64::try_from(buffered).unwrap_or(u64::MAX)
    }

    /// Current suggested gas price; failures propagate
    pub async fn current_gas_price(&self) -> WalletResult<U256> {
        let price = self.network.gas_price().await?;
        debug!("Network gas price: {} wei", price);
        Ok(price)
    }

    /// Maximum amount a transaction can debit: `value + gas_limit * gas_price`
    pub fn transaction_cost(gas_limit: u64, gas_price: U256, value: U256) -> WalletResult<U256> {
        gas_price
            .checked_mul(U256::from(gas_limit))
            .and_then(|fee| fee.checked_add(value))
            .ok_or_else(|| WalletError::Encoding("transaction cost exceeds 256 bits".to_string()))
    }
}
