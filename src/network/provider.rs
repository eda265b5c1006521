//! JSON-RPC network provider with multi-endpoint failover

use super::{BlockTag, Network, TxSkeleton};
use crate::config::NetworkConfig;
use crate::error::{WalletError, WalletResult};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{BlockId, BlockNumber, Bytes, TransactionRequest, H160};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Rejection messages that mean the nonce we used is stale or taken
const NONCE_REJECTIONS: &[&str] = &[
    "nonce too low",
    "nonce too high",
    "replacement transaction underpriced",
];

/// Multi-provider wrapper with automatic failover
pub struct RpcProvider {
    /// Network name, for logs
    name: String,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
    /// Upper bound for a single call
    request_timeout: Duration,
}

impl RpcProvider {
    /// Create a provider for every configured endpoint
    pub fn new(config: &NetworkConfig) -> WalletResult<Self> {
        let mut http_providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    http_providers.push(provider);
                    debug!("Added HTTP provider for {}: {}", config.name, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(WalletError::Config(format!(
                "No valid RPC providers for {}",
                config.name
            )));
        }

        Ok(Self {
            name: config.name.clone(),
            http_providers,
            current_provider: AtomicUsize::new(0),
            request_timeout: config.request_timeout(),
        })
    }

    /// Get the active HTTP provider
    fn http(&self) -> Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        self.http_providers[idx % self.http_providers.len()].clone()
    }

    /// Switch to next available provider
    fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("{} failover to provider {}", self.name, next);
    }

    /// Run one call, rotating endpoints on transport failures and timeouts.
    /// A JSON-RPC error response is a definitive answer and is not retried.
    async fn call<T, F, Fut>(&self, method: &'static str, request: F) -> WalletResult<T>
    where
        F: Fn(Provider<Http>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for _ in 0..self.http_providers.len() {
            let started = Instant::now();
            match timeout(self.request_timeout, request(self.http())).await {
                Ok(Ok(value)) => {
                    crate::metrics::record_rpc_latency(method, started.elapsed().as_secs_f64());
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    if let Some(response) = e.as_error_response() {
                        return Err(classify_rejection(method, &response.message));
                    }
                    warn!("{} failed on {}: {}", method, self.name, e);
                    last_error = Some(WalletError::network(method, e.to_string()));
                }
                Err(_) => {
                    warn!("{} timed out on {}", method, self.name);
                    last_error = Some(WalletError::Timeout {
                        operation: method.to_string(),
                    });
                }
            }
            self.failover();
        }

        Err(last_error.unwrap_or_else(|| WalletError::network(method, "All providers failed")))
    }
}

/// Map a JSON-RPC error message onto the error taxonomy
pub fn classify_rejection(method: &str, message: &str) -> WalletError {
    let lowered = message.to_lowercase();
    if NONCE_REJECTIONS.iter().any(|pattern| lowered.contains(pattern)) {
        return WalletError::NonceConflict(message.to_string());
    }
    if lowered.contains("insufficient funds") {
        return WalletError::InsufficientBalance {
            have: "unknown".to_string(),
            need: "unknown".to_string(),
        };
    }
    WalletError::network(method, message)
}

fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}

fn from_eth_u256(value: ethers::types::U256) -> U256 {
    U256::from_limbs(value.0)
}

fn to_eth_u256(value: U256) -> ethers::types::U256 {
    ethers::types::U256(value.into_limbs())
}

fn to_u64(method: &str, value: ethers::types::U256) -> WalletResult<u64> {
    if value > ethers::types::U256::from(u64::MAX) {
        return Err(WalletError::network(
            method,
            format!("value {} does not fit in 64 bits", value),
        ));
    }
    Ok(value.as_u64())
}

fn block_id(block: BlockTag) -> BlockId {
    match block {
        BlockTag::Latest => BlockId::Number(BlockNumber::Latest),
        BlockTag::Pending => BlockId::Number(BlockNumber::Pending),
    }
}

#[async_trait]
impl Network for RpcProvider {
    async fn get_transaction_count(&self, address: Address, block: BlockTag) -> WalletResult<u64> {
        let method = "eth_getTransactionCount";
        let count = self
            .call(method, move |provider| async move {
                provider
                    .get_transaction_count(to_h160(address), Some(block_id(block)))
                    .await
            })
            .await?;
        to_u64(method, count)
    }

    async fn estimate_gas(&self, tx: &TxSkeleton) -> WalletResult<u64> {
        let method = "eth_estimateGas";
        let request: TypedTransaction = TransactionRequest::new()
            .from(to_h160(tx.from))
            .to(to_h160(tx.to))
            .value(to_eth_u256(tx.value))
            .data(Bytes::from(tx.data.clone()))
            .into();

        let estimate = self
            .call(method, |provider| {
                let request = request.clone();
                async move { provider.estimate_gas(&request, None).await }
            })
            .await?;
        to_u64(method, estimate)
    }

    async fn gas_price(&self) -> WalletResult<U256> {
        let price = self
            .call("eth_gasPrice", |provider| async move {
                provider.get_gas_price().await
            })
            .await?;
        Ok(from_eth_u256(price))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> WalletResult<B256> {
        let payload = Bytes::from(raw.to_vec());
        let hash = self
            .call("eth_sendRawTransaction", |provider| {
                let payload = payload.clone();
                async move {
                    provider
                        .send_raw_transaction(payload)
                        .await
                        .map(|pending| pending.tx_hash())
                }
            })
            .await?;
        Ok(B256::from(hash.0))
    }

    async fn get_balance(&self, address: Address, block: BlockTag) -> WalletResult<U256> {
        let balance = self
            .call("eth_getBalance", move |provider| async move {
                provider
                    .get_balance(to_h160(address), Some(block_id(block)))
                    .await
            })
            .await?;
        Ok(from_eth_u256(balance))
    }
}
