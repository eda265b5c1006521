//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transaction signing and broadcast outcomes
//! - Nonce cache resets
//! - Gas-limit estimation fallbacks
//! - RPC latency per method

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Transaction metrics
    pub static ref TX_SIGNED: CounterVec = register_counter_vec!(
        "wallet_transactions_signed_total",
        "Total transactions signed",
        &["chain_id"]
    ).unwrap();

    pub static ref TX_BROADCAST: CounterVec = register_counter_vec!(
        "wallet_transactions_broadcast_total",
        "Total transactions accepted by the network",
        &["chain_id"]
    ).unwrap();

    pub static ref TX_FAILED: CounterVec = register_counter_vec!(
        "wallet_transactions_failed_total",
        "Total transactions rejected or not delivered",
        &["chain_id"]
    ).unwrap();

    // Nonce metrics
    pub static ref NONCE_RESETS: CounterVec = register_counter_vec!(
        "wallet_nonce_resets_total",
        "Total nonce cache evictions",
        &[]
    ).unwrap();

    // Gas metrics
    pub static ref GAS_FALLBACKS: CounterVec = register_counter_vec!(
        "wallet_gas_limit_fallbacks_total",
        "Total gas-limit estimates replaced by the fallback constant",
        &[]
    ).unwrap();

    // RPC metrics
    pub static ref RPC_LATENCY: HistogramVec = register_histogram_vec!(
        "wallet_rpc_latency_seconds",
        "JSON-RPC call latency",
        &["method"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();
}

/// Text exposition of every registered metric
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_tx_signed(chain_id: u64) {
    TX_SIGNED
        .with_label_values(&[&chain_id.to_string()])
        .inc();
}

pub fn record_tx_broadcast(chain_id: u64) {
    TX_BROADCAST
        .with_label_values(&[&chain_id.to_string()])
        .inc();
}

pub fn record_tx_failed(chain_id: u64) {
    TX_FAILED
        .with_label_values(&[&chain_id.to_string()])
        .inc();
}

pub fn record_nonce_reset() {
    NONCE_RESETS.with_label_values(&[]).inc();
}

pub fn record_gas_fallback() {
    GAS_FALLBACKS.with_label_values(&[]).inc();
}

pub fn record_rpc_latency(method: &str, latency_secs: f64) {
    RPC_LATENCY
        .with_label_values(&[method])
        .observe(latency_secs);
}
