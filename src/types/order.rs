use alloy::{
    primitives::{Address, U256},
    sol_types::{self, SolValue},
};

use crate::{
    abi::schema::{FeedOrderFields, UserOrderFields},
    decode::OrderSchema,
};

/// Order placed by a user against one of the price-feed orders.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct UserOrder {
    nonce: U256,
    index_of_price_feed_order: U256,
    description: String,
    current_amount_a: U256,
    current_amount_b: U256,
    user_initial_amount: U256,
    user_deposit_amount_a: U256,
    user_deposit_amount_b: U256,
    #[debug("{price_feed_address}")]
    price_feed_address: Address,
    #[debug("{params_address}")]
    params_address: Address,
    nonce_before: U256,
    nonce_after: U256,
}

impl UserOrder {
    /// Sequence number of the order.
    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Index of the price-feed order this order follows.
    /// Not guaranteed to reference an existing feed order.
    pub fn index_of_price_feed_order(&self) -> U256 {
        self.index_of_price_feed_order
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn current_amount_a(&self) -> U256 {
        self.current_amount_a
    }

    pub fn current_amount_b(&self) -> U256 {
        self.current_amount_b
    }

    pub fn user_initial_amount(&self) -> U256 {
        self.user_initial_amount
    }

    pub fn user_deposit_amount_a(&self) -> U256 {
        self.user_deposit_amount_a
    }

    pub fn user_deposit_amount_b(&self) -> U256 {
        self.user_deposit_amount_b
    }

    pub fn price_feed_address(&self) -> Address {
        self.price_feed_address
    }

    pub fn params_address(&self) -> Address {
        self.params_address
    }

    /// Nonce of the previous order in the user's chain, zero for the first one.
    pub fn nonce_before(&self) -> U256 {
        self.nonce_before
    }

    /// Nonce of the next order in the user's chain, zero for the last one.
    pub fn nonce_after(&self) -> U256 {
        self.nonce_after
    }

    /// Looks up the referenced price-feed order in the given list.
    pub fn feed_order<'a>(&self, feed_orders: &'a [FeedOrder]) -> Option<&'a FeedOrder> {
        feed_orders
            .iter()
            .find(|f| f.index == self.index_of_price_feed_order)
    }
}

impl OrderSchema for UserOrder {
    type Fields = UserOrderFields;

    const NAME: &'static str = "user order";

    const FIELDS: &'static [&'static str] = &[
        "nonce",
        "indexOfPriceFeedOrder",
        "description",
        "currentAmountA",
        "currentAmountB",
        "userInitialAmount",
        "userDepositAmountA",
        "userDepositAmountB",
        "priceFeedAddress",
        "paramsAddress",
        "nonceBefore",
        "nonceAfter",
    ];

    fn from_fields(f: UserOrderFields) -> Self {
        Self {
            nonce: f.nonce,
            index_of_price_feed_order: f.indexOfPriceFeedOrder,
            description: f.description,
            current_amount_a: f.currentAmountA,
            current_amount_b: f.currentAmountB,
            user_initial_amount: f.userInitialAmount,
            user_deposit_amount_a: f.userDepositAmountA,
            user_deposit_amount_b: f.userDepositAmountB,
            price_feed_address: f.priceFeedAddress,
            params_address: f.paramsAddress,
            nonce_before: f.nonceBefore,
            nonce_after: f.nonceAfter,
        }
    }

    fn decode_fields(data: &[u8]) -> Result<UserOrderFields, sol_types::Error> {
        UserOrderFields::abi_decode_params(data)
    }

    fn encode_fields(fields: &UserOrderFields) -> Vec<u8> {
        fields.abi_encode_params()
    }

    fn to_fields(&self) -> UserOrderFields {
        UserOrderFields {
            nonce: self.nonce,
            indexOfPriceFeedOrder: self.index_of_price_feed_order,
            description: self.description.clone(),
            currentAmountA: self.current_amount_a,
            currentAmountB: self.current_amount_b,
            userInitialAmount: self.user_initial_amount,
            userDepositAmountA: self.user_deposit_amount_a,
            userDepositAmountB: self.user_deposit_amount_b,
            priceFeedAddress: self.price_feed_address,
            paramsAddress: self.params_address,
            nonceBefore: self.nonce_before,
            nonceAfter: self.nonce_after,
        }
    }
}

/// Price-feed order: a pool following two moving averages of a data feed.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct FeedOrder {
    index: U256,
    description: String,
    #[debug("{data_feed}")]
    data_feed: Address,
    #[debug("{params_address}")]
    params_address: Address,
    #[debug("{token_a}")]
    token_a: Address,
    #[debug("{token_b}")]
    token_b: Address,
    initial_total_amount: U256,
    current_total_amount_a: U256,
    current_total_amount_b: U256,
    raw_ma1: u32,
    raw_ma2: u32,
    ma_interval: u32,
    execution_interval: u32,
    timestamp: u128,
}

impl FeedOrder {
    pub fn index(&self) -> U256 {
        self.index
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_feed(&self) -> Address {
        self.data_feed
    }

    pub fn params_address(&self) -> Address {
        self.params_address
    }

    pub fn token_a(&self) -> Address {
        self.token_a
    }

    pub fn token_b(&self) -> Address {
        self.token_b
    }

    pub fn initial_total_amount(&self) -> U256 {
        self.initial_total_amount
    }

    pub fn current_total_amount_a(&self) -> U256 {
        self.current_total_amount_a
    }

    pub fn current_total_amount_b(&self) -> U256 {
        self.current_total_amount_b
    }

    /// First moving average normalized by [`Self::ma_interval`],
    /// `None` if the interval is zero.
    pub fn ma1(&self) -> Option<u32> {
        self.raw_ma1.checked_div(self.ma_interval)
    }

    /// Second moving average normalized by [`Self::ma_interval`],
    /// `None` if the interval is zero.
    pub fn ma2(&self) -> Option<u32> {
        self.raw_ma2.checked_div(self.ma_interval)
    }

    /// Accumulated first moving average as stored on-chain.
    pub fn raw_ma1(&self) -> u32 {
        self.raw_ma1
    }

    /// Accumulated second moving average as stored on-chain.
    pub fn raw_ma2(&self) -> u32 {
        self.raw_ma2
    }

    pub fn ma_interval(&self) -> u32 {
        self.ma_interval
    }

    pub fn execution_interval(&self) -> u32 {
        self.execution_interval
    }

    pub fn timestamp(&self) -> u128 {
        self.timestamp
    }
}

impl OrderSchema for FeedOrder {
    type Fields = FeedOrderFields;

    const NAME: &'static str = "feed order";

    const FIELDS: &'static [&'static str] = &[
        "index",
        "description",
        "dataFeed",
        "paramsAddress",
        "tokenA",
        "tokenB",
        "initialTotalAmount",
        "currentTotalAmountA",
        "currentTotalAmountB",
        "MA1",
        "MA2",
        "MAInterval",
        "executionInterval",
        "timeStamp",
    ];

    fn from_fields(f: FeedOrderFields) -> Self {
        Self {
            index: f.index,
            description: f.description,
            data_feed: f.dataFeed,
            params_address: f.paramsAddress,
            token_a: f.tokenA,
            token_b: f.tokenB,
            initial_total_amount: f.initialTotalAmount,
            current_total_amount_a: f.currentTotalAmountA,
            current_total_amount_b: f.currentTotalAmountB,
            raw_ma1: f.ma1,
            raw_ma2: f.ma2,
            ma_interval: f.maInterval,
            execution_interval: f.executionInterval,
            timestamp: f.timeStamp,
        }
    }

    fn decode_fields(data: &[u8]) -> Result<FeedOrderFields, sol_types::Error> {
        FeedOrderFields::abi_decode_params(data)
    }

    fn encode_fields(fields: &FeedOrderFields) -> Vec<u8> {
        fields.abi_encode_params()
    }

    fn to_fields(&self) -> FeedOrderFields {
        FeedOrderFields {
            index: self.index,
            description: self.description.clone(),
            dataFeed: self.data_feed,
            paramsAddress: self.params_address,
            tokenA: self.token_a,
            tokenB: self.token_b,
            initialTotalAmount: self.initial_total_amount,
            currentTotalAmountA: self.current_total_amount_a,
            currentTotalAmountB: self.current_total_amount_b,
            ma1: self.raw_ma1,
            ma2: self.raw_ma2,
            maInterval: self.ma_interval,
            executionInterval: self.execution_interval,
            timeStamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{feed_order_fields, user_order_fields};

    #[test]
    fn test_ma_normalized_by_interval() {
        let mut fields = feed_order_fields(1);
        fields.ma1 = 500;
        fields.ma2 = 1299;
        fields.maInterval = 100;
        let order = FeedOrder::from_fields(fields);
        assert_eq!(order.ma1(), Some(5));
        assert_eq!(order.ma2(), Some(12));
        assert_eq!(order.raw_ma2(), 1299);
    }

    #[test]
    fn test_ma_with_zero_interval_is_undefined() {
        let mut fields = feed_order_fields(1);
        fields.ma1 = 500;
        fields.maInterval = 0;
        let order = FeedOrder::from_fields(fields);
        assert_eq!(order.ma1(), None);
        assert_eq!(order.ma2(), None);
    }

    #[test]
    fn test_feed_order_lookup() {
        let feed = vec![
            FeedOrder::from_fields(feed_order_fields(1)),
            FeedOrder::from_fields(feed_order_fields(2)),
        ];
        let mut fields = user_order_fields(7);
        fields.indexOfPriceFeedOrder = U256::from(2);
        let order = UserOrder::from_fields(fields);
        assert_eq!(order.feed_order(&feed).map(|f| f.index()), Some(U256::from(2)));

        let mut fields = user_order_fields(8);
        fields.indexOfPriceFeedOrder = U256::from(42);
        let dangling = UserOrder::from_fields(fields);
        assert!(dangling.feed_order(&feed).is_none());
    }
}
