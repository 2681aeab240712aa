#[allow(clippy::too_many_arguments)]
pub mod vault {
    alloy::sol!(
        /// Order vault: moving-average strategy orders, price-feed orders
        /// and the transfer counter.
        #[derive(Debug)]
        #[sol(rpc)]
        interface OrderVault {
            function getUserOrderListBytes(address user, uint256 offset, uint256 limit) external view returns (bytes[] memory);
            function getPriceFeedOrderListBytes(uint256 offset, uint256 limit) external view returns (bytes[] memory);
            function testDepositETH() external payable;
            function store(uint256 num) external;
            function retrieve() external view returns (uint256);
        }
    );
}

#[allow(clippy::too_many_arguments, non_snake_case)]
pub mod schema {
    alloy::sol!(
        /// Positional layout of a single user order entry.
        #[derive(Debug, PartialEq, Eq)]
        struct UserOrderFields {
            uint256 nonce;
            uint256 indexOfPriceFeedOrder;
            string description;
            uint256 currentAmountA;
            uint256 currentAmountB;
            uint256 userInitialAmount;
            uint256 userDepositAmountA;
            uint256 userDepositAmountB;
            address priceFeedAddress;
            address paramsAddress;
            uint256 nonceBefore;
            uint256 nonceAfter;
        }

        /// Positional layout of a single price-feed order entry.
        #[derive(Debug, PartialEq, Eq)]
        struct FeedOrderFields {
            uint256 index;
            string description;
            address dataFeed;
            address paramsAddress;
            address tokenA;
            address tokenB;
            uint256 initialTotalAmount;
            uint256 currentTotalAmountA;
            uint256 currentTotalAmountB;
            uint32 ma1;
            uint32 ma2;
            uint32 maInterval;
            uint32 executionInterval;
            uint128 timeStamp;
        }
    );
}
