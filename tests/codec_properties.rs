//! Property-based tests for the length-prefixed codec and minimal integers.

use alloy_primitives::{Address, U256};
use evm_wallet_engine::codec::{decode, encode, RlpItem};
use evm_wallet_engine::encoding::{minimal_be_bytes, uint_from_be, MinimalBytes};
use evm_wallet_engine::{SignedTransaction, TransactionSigner, UnsignedTransaction, Wallet};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_u256() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| U256::from_be_bytes(bytes))
}

fn arb_item() -> impl Strategy<Value = RlpItem> {
    let leaf = prop::collection::vec(any::<u8>(), 0..80).prop_map(RlpItem::Bytes);
    leaf.prop_recursive(3, 48, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(RlpItem::List)
    })
}

fn arb_transfer() -> impl Strategy<Value = UnsignedTransaction> {
    (
        any::<u64>(),
        arb_u256(),
        21_000u64..10_000_000u64,
        prop::array::uniform20(any::<u8>()),
        arb_u256(),
        prop::collection::vec(any::<u8>(), 0..128),
        1u64..1_000_000_000u64,
    )
        .prop_map(
            |(nonce, gas_price, gas_limit, to, value, data, chain_id)| UnsignedTransaction {
                nonce,
                gas_price,
                gas_limit,
                to: Address::from(to),
                value,
                data,
                chain_id,
            },
        )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_minimal_bytes_have_no_leading_zero(value in arb_u256()) {
        let bytes = minimal_be_bytes(value);
        prop_assert!(bytes.first() != Some(&0));
        prop_assert_eq!(value.is_zero(), bytes.is_empty());
        prop_assert_eq!(uint_from_be(&bytes).unwrap(), value);
    }

    #[test]
    fn prop_minimal_integer_survives_codec(value in arb_u256()) {
        let minimal = MinimalBytes::from_uint(value);
        let encoded = encode(&RlpItem::Bytes(minimal.as_slice().to_vec()));
        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes().unwrap(), minimal.as_slice());
    }

    #[test]
    fn prop_nested_items_survive_codec(item in arb_item()) {
        prop_assert_eq!(decode(&encode(&item)).unwrap(), item);
    }

    #[test]
    fn prop_truncated_encoding_is_rejected(item in arb_item()) {
        let encoded = encode(&item);
        prop_assert!(decode(&encoded[..encoded.len() - 1]).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_signed_transfer_recovers_signer(tx in arb_transfer()) {
        let wallet = Wallet::from_private_key(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        ).unwrap();
        let signed = TransactionSigner::sign(&wallet, tx.clone()).unwrap();
        let decoded = SignedTransaction::decode(signed.raw()).unwrap();

        prop_assert_eq!(decoded.transaction(), &tx);
        prop_assert_eq!(decoded.recover_signer().unwrap(), wallet.address());
    }
}
