use super::{RlpItem, LONG_LIST, LONG_STRING, SHORT_LIMIT, SHORT_LIST, SHORT_STRING};
use crate::error::{WalletError, WalletResult};

/// Deepest list nesting accepted; a transaction is a single flat list
const MAX_DEPTH: usize = 16;

/// Decode exactly one item. Trailing bytes, non-canonical length prefixes
/// and lists nested more than 16 deep are rejected.
pub fn decode(input: &[u8]) -> WalletResult<RlpItem> {
    let (item, rest) = decode_item(input, 0)?;
    if !rest.is_empty() {
        return Err(malformed(format!("{} trailing bytes", rest.len())));
    }
    Ok(item)
}

fn malformed(message: impl Into<String>) -> WalletError {
    WalletError::Encoding(format!("malformed encoding: {}", message.into()))
}

fn decode_item(input: &[u8], depth: usize) -> WalletResult<(RlpItem, &[u8])> {
    let tag = *input.first().ok_or_else(|| malformed("unexpected end of input"))?;

    match tag {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![tag]), &input[1..])),
        SHORT_STRING..=LONG_STRING => {
            let len = (tag - SHORT_STRING) as usize;
            let (payload, rest) = take(&input[1..], len)?;
            if len == 1 && payload[0] < SHORT_STRING {
                return Err(malformed("single byte below 0x80 must not be prefixed"));
            }
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let (len, body) = long_length(&input[1..], (tag - LONG_STRING) as usize)?;
            let (payload, rest) = take(body, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        SHORT_LIST..=0xff if depth >= MAX_DEPTH => Err(malformed(format!(
            "lists nested deeper than {}",
            MAX_DEPTH
        ))),
        SHORT_LIST..=LONG_LIST => {
            let len = (tag - SHORT_LIST) as usize;
            let (payload, rest) = take(&input[1..], len)?;
            Ok((RlpItem::List(decode_members(payload, depth + 1)?), rest))
        }
        0xf8..=0xff => {
            let (len, body) = long_length(&input[1..], (tag - LONG_LIST) as usize)?;
            let (payload, rest) = take(body, len)?;
            Ok((RlpItem::List(decode_members(payload, depth + 1)?), rest))
        }
    }
}

fn decode_members(mut payload: &[u8], depth: usize) -> WalletResult<Vec<RlpItem>> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_item(payload, depth)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn long_length(input: &[u8], len_of_len: usize) -> WalletResult<(usize, &[u8])> {
    let (len_bytes, rest) = take(input, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(malformed("length has a leading zero byte"));
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(malformed("length does not fit in memory"));
    }
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if len < SHORT_LIMIT {
        return Err(malformed("long form used for a short payload"));
    }
    Ok((len, rest))
}

fn take(input: &[u8], len: usize) -> WalletResult<(&[u8], &[u8])> {
    if input.len() < len {
        return Err(malformed(format!(
            "expected {} bytes, found {}",
            len,
            input.len()
        )));
    }
    Ok(input.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::super::{encode, RlpItem};
    use super::*;

    #[test]
    fn test_decode_nested() {
        let item = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::List(vec![RlpItem::Bytes(vec![]), RlpItem::Bytes(vec![0x05])]),
        ]);
        assert_eq!(decode(&encode(&item)).unwrap(), item);
    }

    #[test]
    fn test_decode_long_string() {
        let item = RlpItem::Bytes(vec![0xaa; 300]);
        let encoded = encode(&item);
        assert_eq!(&encoded[..3], &[0xb9, 0x01, 0x2c]);
        assert_eq!(decode(&encoded).unwrap(), item);
    }

    #[test]
    fn test_rejects_truncated_input() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x83, b'd', b'o']).is_err());
        assert!(decode(&[0xc8, 0x83, b'c', b'a', b't']).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        assert!(decode(&[0x80, 0x80]).is_err());
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let nested = |depth: usize| {
            (0..depth).fold(RlpItem::List(vec![]), |inner, _| RlpItem::List(vec![inner]))
        };
        // `nested(n)` holds n + 1 lists
        let deepest = nested(MAX_DEPTH - 1);
        assert_eq!(decode(&encode(&deepest)).unwrap(), deepest);
        assert!(decode(&encode(&nested(MAX_DEPTH))).is_err());
    }

    #[test]
    fn test_deeply_nested_input_is_an_error() {
        // 60k single-member lists wrapped around an empty one
        let mut prefixes = Vec::new();
        let mut inner_len = 1usize;
        for _ in 0..60_000 {
            let prefix = if inner_len < SHORT_LIMIT {
                vec![SHORT_LIST + inner_len as u8]
            } else {
                let len_bytes: Vec<u8> = (inner_len as u64)
                    .to_be_bytes()
                    .into_iter()
                    .skip_while(|b| *b == 0)
                    .collect();
                let mut prefix = vec![LONG_LIST + len_bytes.len() as u8];
                prefix.extend(len_bytes);
                prefix
            };
            inner_len += prefix.len();
            prefixes.push(prefix);
        }
        let mut payload: Vec<u8> = prefixes.into_iter().rev().flatten().collect();
        payload.push(0xc0);
        assert_eq!(payload.len(), inner_len);

        let err = decode(&payload).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_rejects_non_canonical_forms() {
        // 0x05 wrapped in a string prefix
        assert!(decode(&[0x81, 0x05]).is_err());
        // long form for a 3-byte string
        assert!(decode(&[0xb8, 0x03, b'd', b'o', b'g']).is_err());
        // length with a leading zero
        let mut padded = vec![0xb9, 0x00, 0x38];
        padded.extend(vec![0u8; 56]);
        assert!(decode(&padded).is_err());
    }
}
