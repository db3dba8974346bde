//! Lend View Calculator
//!
//! Pure functions for collateral, durations, and display scaling.
//! No I/O - just calculations.

use alloy_primitives::utils::format_units;
use alloy_primitives::U256;
use tulia_core::constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

use crate::constants::{loan_state, scale};

/// Map a ledger loan-state code to its label.
///
/// Codes without a label return `None`; callers keep whatever label they had.
pub fn loan_state_label(code: u8) -> Option<&'static str> {
    match code {
        loan_state::WAITING_FOR_BORROWER => Some(loan_state::WAITING_FOR_BORROWER_LABEL),
        loan_state::BORROWER_FOUND => Some(loan_state::BORROWER_FOUND_LABEL),
        _ => None,
    }
}

/// Calculate the collateral a borrower posts: principal plus interest.
/// total = principal + principal * rate / 100
///
/// The rate is carried at micro-percent precision so the math stays in
/// integers. Negative or non-finite rates count as zero.
pub fn calculate_collateral(principal: U256, interest_rate_pct: f64) -> U256 {
    let rate_scaled = if interest_rate_pct.is_finite() && interest_rate_pct > 0.0 {
        (interest_rate_pct * scale::RATE_PRECISION as f64).round() as u128
    } else {
        0
    };

    let interest = principal.saturating_mul(U256::from(rate_scaled))
        / U256::from(100u64 * scale::RATE_PRECISION);

    principal.saturating_add(interest)
}

/// Days, hours, and minutes of a remaining duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl DurationParts {
    pub fn total_seconds(&self) -> u64 {
        self.days * SECONDS_PER_DAY
            + self.hours * SECONDS_PER_HOUR
            + self.minutes * SECONDS_PER_MINUTE
    }
}

/// Split seconds into whole days, hours, and minutes (seconds dropped)
pub fn split_duration(seconds: u64) -> DurationParts {
    DurationParts {
        days: seconds / SECONDS_PER_DAY,
        hours: (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
        minutes: (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
    }
}

/// Format remaining seconds as "Xd Yh Zm"
pub fn format_duration(seconds: u64) -> String {
    let parts = split_duration(seconds);
    format!("{}d {}h {}m", parts.days, parts.hours, parts.minutes)
}

/// Repayment period in days (fractional)
pub fn repayment_period_days(period_seconds: u64) -> f64 {
    period_seconds as f64 / SECONDS_PER_DAY as f64
}

/// Render a fixed-point amount as a decimal string without trailing zeros
pub fn format_amount(value: U256, decimals: u8) -> String {
    let formatted = match format_units(value, decimals) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(%value, decimals, error = %e, "Failed to format amount");
            return value.to_string();
        }
    };
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Fixed-point amount as a float for display
pub fn amount_to_f64(value: U256, decimals: u8) -> f64 {
    format_amount(value, decimals).parse().unwrap_or(f64::MAX)
}

/// Lossy integer conversion for display math
pub fn to_f64(value: U256) -> f64 {
    u128::try_from(value).map(|v| v as f64).unwrap_or(f64::MAX)
}

/// Reward APY in percent
pub fn apy_percent(raw_apy: U256) -> f64 {
    to_f64(raw_apy) / scale::APY_DIVISOR
}

/// Claimable rewards in whole reward units
pub fn rewards_display(raw_rewards: U256) -> f64 {
    to_f64(raw_rewards) / scale::REWARD_DIVISOR
}

/// Claimable interest formatted as an 18-decimal figure, truncated for display
pub fn interest_display(raw_interest: U256, decimals: u8) -> String {
    format_amount(raw_interest, decimals)
        .chars()
        .take(scale::INTEREST_DISPLAY_CHARS)
        .collect()
}

/// Leading characters of an address string
pub fn short_address(address: &str) -> String {
    address.chars().take(scale::BORROWER_DISPLAY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_state_labels() {
        assert_eq!(loan_state_label(1), Some("Waiting for Borrower"));
        assert_eq!(loan_state_label(2), Some("Borrower Found"));
        assert_eq!(loan_state_label(0), None);
        assert_eq!(loan_state_label(7), None);
    }

    #[test]
    fn test_collateral_principal_plus_interest() {
        // 1000 at 10% -> 1100
        assert_eq!(
            calculate_collateral(U256::from(1000u64), 10.0),
            U256::from(1100u64)
        );
    }

    #[test]
    fn test_collateral_fractional_rate() {
        // 1 token at 2.5% -> 1.025 tokens
        let principal = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(
            calculate_collateral(principal, 2.5),
            U256::from(1_025_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_collateral_ignores_bad_rates() {
        let principal = U256::from(1000u64);
        assert_eq!(calculate_collateral(principal, -5.0), principal);
        assert_eq!(calculate_collateral(principal, f64::NAN), principal);
    }

    #[test]
    fn test_collateral_monotonic() {
        let base = calculate_collateral(U256::from(1000u64), 10.0);
        assert!(calculate_collateral(U256::from(1001u64), 10.0) >= base);
        assert!(calculate_collateral(U256::from(1000u64), 10.5) >= base);

        let principals = [1u64, 10, 1_000, 1_000_000_000_000_000_000];
        let rates = [0.0, 1.0, 12.5, 100.0];

        for rate in rates {
            let shown: Vec<f64> = principals
                .iter()
                .map(|p| amount_to_f64(calculate_collateral(U256::from(*p), rate), 18))
                .collect();
            assert!(shown.windows(2).all(|w| w[0] <= w[1]), "rate {}", rate);
        }
        for principal in principals {
            let shown: Vec<f64> = rates
                .iter()
                .map(|r| amount_to_f64(calculate_collateral(U256::from(principal), *r), 18))
                .collect();
            assert!(shown.windows(2).all(|w| w[0] <= w[1]), "principal {}", principal);
        }
    }

    #[test]
    fn test_collateral_does_not_overflow() {
        assert_eq!(calculate_collateral(U256::MAX, 50.0), U256::MAX);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0d 0h 0m");
        assert_eq!(format_duration(120), "0d 0h 2m");
        assert_eq!(format_duration(90_061), "1d 1h 1m");
        assert_eq!(format_duration(30 * 86_400), "30d 0h 0m");
    }

    #[test]
    fn test_duration_parts_never_exceed_input() {
        for seconds in (0..200_000u64).step_by(997).chain([59, 3_599, 86_399, u64::MAX / 2]) {
            let parts = split_duration(seconds);
            assert!(parts.total_seconds() <= seconds, "{} -> {:?}", seconds, parts);
            assert!(seconds - parts.total_seconds() < 60);
            assert!(parts.hours < 24);
            assert!(parts.minutes < 60);
        }
    }

    #[test]
    fn test_repayment_period_days() {
        assert_eq!(repayment_period_days(2_592_000), 30.0);
        assert_eq!(repayment_period_days(43_200), 0.5);
    }

    #[test]
    fn test_format_amount_trims() {
        assert_eq!(format_amount(U256::from(1_100_000_000_000_000_000u64), 18), "1.1");
        assert_eq!(format_amount(U256::from(2_000_000_000_000_000_000u64), 18), "2");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_display_scaling() {
        assert_eq!(apy_percent(U256::from(125_000u64)), 12.5);
        assert_eq!(rewards_display(U256::from(25_000_000u64)), 2.5);
        // 0.000123456789 tokens truncated to 8 chars
        assert_eq!(
            interest_display(U256::from(123_456_789_000_000u64), 18),
            "0.000123"
        );
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0xAbCdEf0123456789abcdef0123456789ABCDEF01"),
            "0xAbCdE"
        );
    }
}
