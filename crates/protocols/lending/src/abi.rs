//! Contract interfaces the lend view calls.
//!
//! Only the functions used here are declared.

use alloy_sol_types::sol;

sol! {
    /// One lender/borrower funding arrangement
    interface TuliaPool {
        function getLoanState() external view returns (uint8 state);
        function getRemainingRepaymentPeriod() external view returns (uint256 remaining);
        function fundLoan() external;
        function checkAndHandleDefault() external;
        function reclaimLoanAndClosePool() external;
    }

    /// ERC-20 loan currency
    interface Token {
        function approve(address spender, uint256 amount) external returns (bool success);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
    }

    interface VaultManager {
        function calculateClaimableInterest(address pool) external view returns (uint256 interest);
        function distributeInterest(address pool, address lender) external;
    }

    interface RewardManager {
        function calculateClaimableInterest(address pool, bool isLender) external view returns (uint256 interest);
        function calculateRewardAPY(uint256 loanAmount, uint256 durationSeconds) external view returns (uint256 apy);
        function claimRewards(address pool, bool isLender) external;
    }
}
