//! Positional decoding of order list entries.
//!
//! The vault returns each order as an independently ABI-encoded parameter
//! list. Every record type declares its layout once through [`OrderSchema`]
//! (field names plus a `sol!` struct carrying the primitive types), and
//! [`decode`] / [`decode_all`] turn raw entries into records.
//!
//! An entry has to consume exactly the bytes its schema describes and
//! re-encode to itself. Short or malformed entries, entries with trailing
//! data and entries with non-zero padding fail the whole list.

use alloy::primitives::Bytes;
use alloy_sol_types::{Error as AbiError, SolValue};
use tracing::trace;

use crate::error::DecodeError;

/// Statically declared positional layout of a list entry.
pub trait OrderSchema: Sized {
    /// Primitive field types, in encoding order.
    type Fields: SolValue;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Field names, in encoding order.
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: Self::Fields) -> Self;

    fn to_fields(&self) -> Self::Fields;

    /// Decodes the raw field values as a parameter list.
    fn decode_fields(data: &[u8]) -> Result<Self::Fields, AbiError>;

    /// Encodes the raw field values as a parameter list.
    fn encode_fields(fields: &Self::Fields) -> Vec<u8>;

    /// Number of fields of the schema.
    fn width() -> usize {
        Self::FIELDS.len()
    }
}

/// Decodes a single entry.
pub fn decode<S: OrderSchema>(data: &[u8]) -> Result<S, DecodeError> {
    decode_entry(0, data)
}

/// Decodes every entry of a list, failing on the first one that does not
/// match the schema.
pub fn decode_all<S: OrderSchema>(entries: &[Bytes]) -> Result<Vec<S>, DecodeError> {
    let records = entries
        .iter()
        .enumerate()
        .map(|(index, data)| decode_entry(index, data))
        .collect::<Result<Vec<S>, _>>()?;
    trace!(schema = S::NAME, count = records.len(), "decoded list");
    Ok(records)
}

/// Encodes the record back into its positional layout.
pub fn encode<S: OrderSchema>(record: &S) -> Bytes {
    S::encode_fields(&record.to_fields()).into()
}

fn decode_entry<S: OrderSchema>(index: usize, data: &[u8]) -> Result<S, DecodeError> {
    let fields = S::decode_fields(data).map_err(|source| DecodeError::Malformed {
        schema: S::NAME,
        index,
        source,
    })?;
    let canonical = S::encode_fields(&fields);
    if canonical.len() != data.len() {
        return Err(DecodeError::Width {
            schema: S::NAME,
            index,
            expected: canonical.len(),
            actual: data.len(),
        });
    }
    // Dirty padding of narrow slots is dropped by the decoder.
    if canonical != data {
        return Err(DecodeError::NonCanonical {
            schema: S::NAME,
            index,
        });
    }
    Ok(S::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{U256, address};

    use super::*;
    use crate::{
        abi::schema::UserOrderFields,
        testing::{feed_order_fields, user_order_fields},
        types::{FeedOrder, UserOrder},
    };

    #[test]
    fn test_schema_widths() {
        assert_eq!(UserOrder::width(), 12);
        assert_eq!(FeedOrder::width(), 14);
    }

    #[test]
    fn test_decode_user_order() {
        let fields = UserOrderFields {
            nonce: U256::from(5),
            indexOfPriceFeedOrder: U256::from(2),
            description: "desc".to_string(),
            currentAmountA: U256::from(100),
            currentAmountB: U256::from(200),
            userInitialAmount: U256::from(50),
            userDepositAmountA: U256::from(10),
            userDepositAmountB: U256::from(10),
            priceFeedAddress: address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            paramsAddress: address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            nonceBefore: U256::from(3),
            nonceAfter: U256::from(4),
        };
        let data = fields.abi_encode_params();

        let order: UserOrder = decode(&data).unwrap();
        assert_eq!(order.nonce().to_string(), "5");
        assert_eq!(order.index_of_price_feed_order().to_string(), "2");
        assert_eq!(order.description(), "desc");
        assert_eq!(order.current_amount_a().to_string(), "100");
        assert_eq!(order.current_amount_b().to_string(), "200");
        assert_eq!(order.user_initial_amount().to_string(), "50");
        assert_eq!(order.user_deposit_amount_a().to_string(), "10");
        assert_eq!(order.user_deposit_amount_b().to_string(), "10");
        assert_eq!(
            order.price_feed_address(),
            address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
        );
        assert_eq!(
            order.price_feed_address().to_string(),
            address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").to_checksum(None)
        );
        assert_eq!(
            order.params_address(),
            address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")
        );
        assert_eq!(order.nonce_before().to_string(), "3");
        assert_eq!(order.nonce_after().to_string(), "4");
    }

    #[test]
    fn test_decode_feed_order_ma() {
        let mut fields = feed_order_fields(9);
        fields.ma1 = 500;
        fields.ma2 = 250;
        fields.maInterval = 100;
        let order: FeedOrder = decode(&fields.abi_encode_params()).unwrap();
        assert_eq!(order.index(), U256::from(9));
        assert_eq!(order.ma1().map(|v| v.to_string()), Some("5".to_string()));
        assert_eq!(order.ma2(), Some(2));
        assert_eq!(order.ma_interval(), 100);
    }

    #[test]
    fn test_round_trip_reproduces_entry() {
        let user = user_order_fields(11).abi_encode_params();
        let decoded: UserOrder = decode(&user).unwrap();
        assert_eq!(encode(&decoded).as_ref(), user.as_slice());

        let feed = feed_order_fields(3).abi_encode_params();
        let decoded: FeedOrder = decode(&feed).unwrap();
        assert_eq!(encode(&decoded).as_ref(), feed.as_slice());
    }

    #[test]
    fn test_truncated_entry_fails() {
        let data = user_order_fields(1).abi_encode_params();
        let err = decode::<UserOrder>(&data[..data.len() - 32]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { schema: "user order", .. }));
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut data = user_order_fields(1).abi_encode_params();
        let expected = data.len();
        data.extend_from_slice(&[0u8; 32]);
        let err = decode::<UserOrder>(&data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Width { expected: e, actual: a, .. } if e == expected && a == expected + 32
        ));
    }

    #[test]
    fn test_dirty_narrow_slot_fails() {
        let mut fields = feed_order_fields(1);
        fields.ma1 = 500;
        fields.maInterval = 100;
        let mut data = fields.abi_encode_params();
        // high byte of the MA1 slot
        data[9 * 32] = 0x01;
        let err = decode::<FeedOrder>(&data).unwrap_err();
        assert!(matches!(err, DecodeError::NonCanonical { schema: "feed order", index: 0 }));
    }

    #[test]
    fn test_dirty_address_padding_fails() {
        let mut data = user_order_fields(1).abi_encode_params();
        // padding of priceFeedAddress
        data[8 * 32] = 0xff;
        let err = decode_all::<UserOrder>(&[Bytes::from(data)]).unwrap_err();
        assert!(matches!(err, DecodeError::NonCanonical { schema: "user order", index: 0 }));
    }

    #[test]
    fn test_feed_entry_does_not_decode_as_user_order() {
        let data = feed_order_fields(1).abi_encode_params();
        assert!(decode::<UserOrder>(&data).is_err());
    }

    #[test]
    fn test_decode_all_reports_failing_index() {
        let good = Bytes::from(feed_order_fields(1).abi_encode_params());
        let bad = Bytes::from(vec![0u8; 40]);
        let err = decode_all::<FeedOrder>(&[good.clone(), good, bad]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { index: 2, .. }));
    }

    #[test]
    fn test_decode_all_empty_list() {
        assert!(decode_all::<UserOrder>(&[]).unwrap().is_empty());
    }
}
