//! Tulia Lend View Constants
//!
//! Display scaling factors, loan-state codes, and the reference flash-loan
//! borrower contract shown for flash-loan pools.

/// Loan-state codes reported by `TuliaPool.getLoanState()`
pub mod loan_state {
    /// Pool created, lender has not funded it yet
    pub const PENDING: u8 = 0;
    pub const WAITING_FOR_BORROWER: u8 = 1;
    pub const BORROWER_FOUND: u8 = 2;

    pub const WAITING_FOR_BORROWER_LABEL: &str = "Waiting for Borrower";
    pub const BORROWER_FOUND_LABEL: &str = "Borrower Found";
}

/// Fixed-point scales used by the reward manager and display code
pub mod scale {
    /// `calculateRewardAPY` returns percent with 4 implied decimals
    pub const APY_DIVISOR: f64 = 10_000.0;
    /// Reward-manager claimable amounts carry 7 implied decimals
    pub const REWARD_DIVISOR: f64 = 10_000_000.0;
    /// Claimable interest is shown truncated to this many characters
    pub const INTEREST_DISPLAY_CHARS: usize = 8;
    /// Borrower address is shown truncated to this many characters
    pub const BORROWER_DISPLAY_CHARS: usize = 7;
    /// Interest rates are carried at this precision (micro-percent) in integer math
    pub const RATE_PRECISION: u64 = 1_000_000;
}

/// Reference ERC-3156 borrower handed to borrowers of flash-loan pools
pub const FLASH_BORROWER_TEMPLATE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity 0.8.20;

import "@openzeppelin/contracts/token/ERC20/IERC20.sol";
import "@openzeppelin/contracts/token/ERC20/utils/SafeERC20.sol";
import "@openzeppelin/contracts/interfaces/IERC3156FlashBorrower.sol";
import "@openzeppelin/contracts/interfaces/IERC3156FlashLender.sol";

contract MockFlashBorrower is IERC3156FlashBorrower {
    using SafeERC20 for IERC20;

    IERC3156FlashLender public lender;
    address public admin;

    constructor(address _lender) {
        lender = IERC3156FlashLender(_lender);
        admin = msg.sender;
    }

    function requestFlashLoan(address token, uint256 amount, bytes calldata data) external {
        require(msg.sender == admin, "Only admin can initiate flash loan");
        lender.flashLoan(this, token, amount, data);
    }

    function onFlashLoan(
        address initiator,
        address token,
        uint256 amount,
        uint256 fee,
        bytes calldata data
    ) external override returns (bytes32) {
        require(msg.sender == address(lender), "Only lender can call this function");
        require(initiator == address(this), "Unrecognized initiator");

        // Custom logic using the borrowed amount goes here

        uint256 totalRepayment = amount + fee;
        IERC20(token).safeTransfer(msg.sender, totalRepayment);

        return keccak256("ERC3156FlashBorrower.onFlashLoan");
    }

    function setLender(address _lender) external {
        require(msg.sender == admin, "Only admin can set lender");
        lender = IERC3156FlashLender(_lender);
    }
}
"#;
