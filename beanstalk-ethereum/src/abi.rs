//! Solidity interfaces of Beanstalk and the Curve pools it routes through.

use alloy::core::sol;

sol! {
    /// The Beanstalk diamond, restricted to the farm entry point and the calls it batches.
    interface IBeanstalk {
        function farm(bytes[] data) external payable returns (bytes[] results);

        function wrapEth(uint256 amount, uint8 mode) external payable;
        function unwrapEth(uint256 amount, uint8 mode) external;
        function transferToken(
            address token,
            address recipient,
            uint256 amount,
            uint8 fromMode,
            uint8 toMode
        ) external payable;

        function exchange(
            address pool,
            address registry,
            address fromToken,
            address toToken,
            uint256 amountIn,
            uint256 minAmountOut,
            uint8 fromMode,
            uint8 toMode
        ) external payable;
        function exchangeUnderlying(
            address pool,
            address fromToken,
            address toToken,
            uint256 amountIn,
            uint256 minAmountOut,
            uint8 fromMode,
            uint8 toMode
        ) external payable;
        function addLiquidity(
            address pool,
            address registry,
            uint256[] amounts,
            uint256 minAmountOut,
            uint8 fromMode,
            uint8 toMode
        ) external payable;
        function removeLiquidityOneToken(
            address pool,
            address registry,
            address toToken,
            uint256 amountIn,
            uint256 minAmountOut,
            uint8 fromMode,
            uint8 toMode
        ) external payable;
    }

    interface IStableSwap3 {
        function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256);
        function calc_token_amount(uint256[3] amounts, bool is_deposit) external view returns (uint256);
        function calc_withdraw_one_coin(uint256 token_amount, int128 i) external view returns (uint256);
    }

    interface ITricrypto {
        function get_dy(uint256 i, uint256 j, uint256 dx) external view returns (uint256);
        function calc_token_amount(uint256[3] amounts, bool is_deposit) external view returns (uint256);
        function calc_withdraw_one_coin(uint256 token_amount, uint256 i) external view returns (uint256);
    }

    interface IMetaPool {
        function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256);
        function get_dy_underlying(int128 i, int128 j, uint256 dx) external view returns (uint256);
        function calc_token_amount(uint256[2] amounts, bool is_deposit) external view returns (uint256);
        function calc_withdraw_one_coin(uint256 token_amount, int128 i) external view returns (uint256);
    }

    interface ICryptoFactoryPool {
        function get_dy(uint256 i, uint256 j, uint256 dx) external view returns (uint256);
        function calc_token_amount(uint256[2] amounts) external view returns (uint256);
        function calc_withdraw_one_coin(uint256 token_amount, uint256 i) external view returns (uint256);
    }
}
