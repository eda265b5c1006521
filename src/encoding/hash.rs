use alloy_primitives::B256;
use sha3::{Digest, Keccak256};

/// Keccak-256 as used for addresses, signing digests and transaction ids
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let digest: [u8; 32] = Keccak256::digest(data.as_ref()).into();
    B256::from(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
