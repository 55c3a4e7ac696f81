//! ABI bindings for the deployed contracts.
//!
//! Signatures must stay bit-exact with the deployed bytecode: argument
//! order and types decide the 4-byte selectors.

use alloy::sol;

sol! {
    /// ERC-20 subset used by the client.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Three-pair constant-product DEX. Pair ids: 1 = A/B, 2 = A/C, 3 = B/C.
    #[derive(Debug, PartialEq, Eq)]
    interface ITripleSwap {
        function addLiquidity(uint8 pair, uint256 amount1, uint256 amount2) external;
        function swapExactInput(uint8 pair, address tokenIn, uint256 amountIn, uint256 minAmountOut, address recipient) external;
        function previewSwap(uint8 pair, address tokenIn, uint256 amountIn) external view returns (uint256);
        function getReservesAB() external view returns (uint256, uint256);
        function getReservesAC() external view returns (uint256, uint256);
        function getReservesBC() external view returns (uint256, uint256);
    }

    /// Time-gated faucet handing out a fixed amount of each token.
    #[derive(Debug, PartialEq, Eq)]
    interface IFaucet {
        function claim() external;
        function lastClaimTime(address user) external view returns (uint256);
        function CLAIM_INTERVAL() external view returns (uint256);
        function CLAIM_AMOUNT() external view returns (uint256);
        function tokenA() external view returns (address);
        function tokenB() external view returns (address);
        function tokenC() external view returns (address);
    }

    /// Escrow marketplace pricing listings in token A.
    #[derive(Debug, PartialEq, Eq)]
    interface IMarketplace {
        function listNFT(uint256 tokenId, uint256 priceInTokenA) external;
        function buyWithTokenA(uint256 tokenId) external;
        function buyWithTokenB(uint256 tokenId) external;
        function buyWithTokenC(uint256 tokenId) external;
        function getListing(uint256 tokenId) external view returns (address seller, uint256 price, bool active);
        function calculatePriceInToken(uint256 tokenId, address paymentToken) external view returns (uint256);
    }

    /// ERC-721 collection.
    #[derive(Debug, PartialEq, Eq)]
    interface INft {
        function ownerOf(uint256 tokenId) external view returns (address);
        function balanceOf(address owner) external view returns (uint256);
    }
}
