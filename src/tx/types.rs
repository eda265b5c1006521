//! Legacy transaction states: `Unsigned -> Hashed -> Signed`

use super::signer::TransactionSignature;
use crate::codec::{self, encode_fields, RlpItem};
use crate::encoding::{
    decode_bytes, encode_hex, keccak256, parse_quantity, uint_from_be, FieldValue, MinimalBytes,
};
use crate::error::{WalletError, WalletResult};

use alloy_primitives::{Address, B256, U256};

/// Number of fields in both the signing list and the broadcast list
const FIELD_COUNT: usize = 9;

const ADDRESS_LEN: usize = 20;

/// Fields of a value transfer before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// The six fields shared by the signing and broadcast lists
    fn body(&self) -> Vec<FieldValue> {
        vec![
            self.nonce.into(),
            self.gas_price.into(),
            self.gas_limit.into(),
            self.to.into(),
            self.value.into(),
            FieldValue::Fixed(self.data.clone()),
        ]
    }

    /// EIP-155 signing list: the body followed by `chain_id, 0, 0`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = self.body();
        fields.push(self.chain_id.into());
        fields.push(0u64.into());
        fields.push(0u64.into());
        encode_fields(&fields)
    }

    pub fn hash(self) -> HashedTransaction {
        let digest = keccak256(self.signing_payload());
        HashedTransaction { tx: self, digest }
    }
}

/// A transaction paired with the digest its signature must cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedTransaction {
    tx: UnsignedTransaction,
    digest: B256,
}

impl HashedTransaction {
    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn digest(&self) -> B256 {
        self.digest
    }

    pub(crate) fn into_signed(self, signature: TransactionSignature) -> SignedTransaction {
        SignedTransaction::assemble(self.tx, signature)
    }
}

/// A replay-protected transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: UnsignedTransaction,
    signature: TransactionSignature,
    raw: Vec<u8>,
    hash: B256,
}

impl SignedTransaction {
    fn assemble(tx: UnsignedTransaction, signature: TransactionSignature) -> Self {
        let mut fields = tx.body();
        fields.push(signature.v().into());
        fields.push(signature.r().clone().into());
        fields.push(signature.s().clone().into());

        let raw = encode_fields(&fields);
        let hash = keccak256(&raw);
        Self {
            tx,
            signature,
            raw,
            hash,
        }
    }

    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn signature(&self) -> &TransactionSignature {
        &self.signature
    }

    /// Broadcast payload
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Transaction id the network will report for this payload
    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn to_hex(&self) -> String {
        encode_hex(&self.raw)
    }

    pub fn from_hex(input: &str) -> WalletResult<Self> {
        Self::decode(&decode_bytes(input)?)
    }

    /// Parse a broadcast payload. The chain id is taken from `v`; payloads
    /// without replay protection are rejected.
    pub fn decode(raw: &[u8]) -> WalletResult<Self> {
        let item = codec::decode(raw)?;
        let items = item
            .as_list()
            .ok_or_else(|| WalletError::Encoding("transaction must be a list".to_string()))?;
        if items.len() != FIELD_COUNT {
            return Err(WalletError::Encoding(format!(
                "transaction has {} fields, expected {}",
                items.len(),
                FIELD_COUNT
            )));
        }

        let to = field(items, 3, "to")?;
        if to.len() != ADDRESS_LEN {
            return Err(WalletError::Encoding(format!(
                "recipient must be {} bytes, found {}",
                ADDRESS_LEN,
                to.len()
            )));
        }

        let signature = TransactionSignature::from_parts(
            u64_field(items, 6, "v")?,
            MinimalBytes::new(field(items, 7, "r")?.to_vec())?,
            MinimalBytes::new(field(items, 8, "s")?.to_vec())?,
        )?;

        let tx = UnsignedTransaction {
            nonce: u64_field(items, 0, "nonce")?,
            gas_price: uint_from_be(field(items, 1, "gasPrice")?)?,
            gas_limit: u64_field(items, 2, "gasLimit")?,
            to: Address::from_slice(to),
            value: uint_from_be(field(items, 4, "value")?)?,
            data: field(items, 5, "data")?.to_vec(),
            chain_id: signature.chain_id(),
        };

        Ok(Self::assemble(tx, signature))
    }

    /// Address of the key that produced the signature
    pub fn recover_signer(&self) -> WalletResult<Address> {
        super::signer::TransactionSigner::recover(&self.tx, &self.signature)
    }
}

fn field<'a>(items: &'a [RlpItem], index: usize, name: &str) -> WalletResult<&'a [u8]> {
    items[index]
        .as_bytes()
        .ok_or_else(|| WalletError::Encoding(format!("{} must be a byte string", name)))
}

fn u64_field(items: &[RlpItem], index: usize, name: &str) -> WalletResult<u64> {
    let value = uint_from_be(field(items, index, name)?)?;
    u64::try_from(value)
        .map_err(|_| WalletError::Encoding(format!("{} does not fit in 64 bits", name)))
}

/// Gas price or gas limit as supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GasSetting {
    /// Ask the network
    #[default]
    Auto,
    Manual(U256),
}

impl GasSetting {
    /// `"auto"`, an empty string or a bare `0x` select `Auto`; anything else
    /// must be a hex quantity
    pub fn parse(input: &str) -> WalletResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") || trimmed == "0x" {
            return Ok(GasSetting::Auto);
        }
        parse_quantity(trimmed).map(GasSetting::Manual)
    }
}
