// Copyright 2021 Parallel Finance Developer.
// This file is part of Parallel Finance.

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::*;
use crate::math::{apply_bps, mul_div, Rounding, BPS};
use primitives::{Rate, SECONDS_PER_YEAR};
use sp_runtime::FixedPointNumber;

/// Grows `index` by `rate_bps` per year over `elapsed` seconds, rounded down.
pub fn increment_index(index: Rate, rate_bps: u32, elapsed: Timestamp) -> Option<Rate> {
    let numerator = u128::from(rate_bps).checked_mul(elapsed.into())?;
    let denominator = BPS.checked_mul(SECONDS_PER_YEAR.into())?;
    let delta = mul_div(index.into_inner(), numerator, denominator, Rounding::Down)?;

    index.into_inner().checked_add(delta).map(Rate::from_inner)
}

/// The state of `reserve` once interest is accrued up to `now`.
///
/// A `now` at or before the last accrual leaves the reserve untouched.
pub fn accrue(reserve: &ReserveAccount, now: Timestamp) -> Option<ReserveAccount> {
    let elapsed = now.saturating_sub(reserve.last_accrual_timestamp);
    if elapsed.is_zero() {
        return Some(reserve.clone());
    }

    let config = &reserve.config;
    let utilization = reserve.utilization_bps()?;
    let borrow_rate = config.rate_model.get_borrow_rate(utilization)?;
    let supply_rate = JumpModel::get_supply_rate(
        borrow_rate,
        utilization,
        config.reserve_ratio_bps.into(),
    )?;

    let borrow_index = increment_index(reserve.borrow_index, borrow_rate, elapsed)?;
    let supply_index = increment_index(reserve.supply_index, supply_rate, elapsed)?;
    // Rounded down so the pool total never exceeds the sum of the position
    // debts, which round up from their own snapshots.
    let total_borrowed = mul_div(
        reserve.total_borrowed,
        borrow_index.into_inner(),
        reserve.borrow_index.into_inner(),
        Rounding::Down,
    )?;
    let interest = total_borrowed.checked_sub(reserve.total_borrowed)?;
    let total_reserves = reserve.total_reserves.checked_add(apply_bps(
        interest,
        config.reserve_ratio_bps.into(),
        Rounding::Down,
    )?)?;

    Some(ReserveAccount {
        total_borrowed,
        total_reserves,
        borrow_index,
        supply_index,
        last_accrual_timestamp: now,
        ..reserve.clone()
    })
}

impl<T: Config> Pallet<T> {
    /// Accrues interest of `reserve` in place.
    pub fn accrue_interest(reserve: &mut ReserveAccount, now: Timestamp) -> DispatchResult {
        *reserve = accrue(reserve, now).ok_or(Error::<T>::ArithmeticOverflow)?;
        Ok(())
    }

    /// The pool of `asset` accrued up to `now`. Nothing is written.
    pub fn accrued_reserve(asset: CurrencyId, now: Timestamp) -> Result<ReserveAccount, DispatchError> {
        let mut reserve = Self::reserve(asset)?;
        Self::accrue_interest(&mut reserve, now)?;
        Ok(reserve)
    }

    /// Accrued copies of the pools of `assets`, in ascending asset order.
    pub fn accrued_reserves(
        assets: &BTreeSet<CurrencyId>,
        now: Timestamp,
    ) -> Result<BTreeMap<CurrencyId, ReserveAccount>, DispatchError> {
        assets
            .iter()
            .map(|&asset| Ok((asset, Self::accrued_reserve(asset, now)?)))
            .collect()
    }

    pub(crate) fn store_reserves(reserves: BTreeMap<CurrencyId, ReserveAccount>) {
        for (asset, reserve) in reserves {
            Reserves::<T>::insert(asset, reserve);
        }
    }

    pub(crate) fn accrue_stored_reserve(asset: CurrencyId, now: Timestamp) -> DispatchResult {
        Reserves::<T>::try_mutate(asset, |reserve| -> DispatchResult {
            let reserve = reserve.as_mut().ok_or(Error::<T>::ReserveNotFound)?;
            Self::accrue_interest(reserve, now)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Test;
    use sp_runtime::{traits::One, FixedU128};

    fn reserve() -> ReserveAccount {
        let config = ReserveConfig {
            reserve_ratio_bps: 1_000,
            collateral_factor_bps: 7_500,
            close_factor_bps: 5_000,
            liquidation_bonus_bps: 500,
            rate_model: JumpModel::from_slopes(500, 8_000, 400, 7_500),
        };
        let mut reserve = ReserveAccount::new(0, 6, config, 1_000);
        reserve.available_liquidity = 5_000_000_000;
        reserve.total_borrowed = 5_000_000_000;
        reserve
    }

    #[test]
    fn increment_index_works() {
        // 7.5% for a whole year
        assert_eq!(
            increment_index(Rate::one(), 750, SECONDS_PER_YEAR),
            Some(FixedU128::saturating_from_rational(1075, 1000))
        );
        assert_eq!(increment_index(Rate::one(), 0, SECONDS_PER_YEAR), Some(Rate::one()));
        assert_eq!(increment_index(Rate::one(), 750, 0), Some(Rate::one()));
    }

    #[test]
    fn accrue_for_a_year_works() {
        let accrued = accrue(&reserve(), 1_000 + SECONDS_PER_YEAR).unwrap();
        // utilization 50%, borrow rate 5% + 4% * 50 / 80 = 7.5%
        assert_eq!(
            accrued.borrow_index,
            FixedU128::saturating_from_rational(1075, 1000)
        );
        // supply rate 7.5% * 50% * 90% = 3.375%, floored to 3.37%
        assert_eq!(
            accrued.supply_index,
            FixedU128::saturating_from_rational(10337, 10000)
        );
        assert_eq!(accrued.total_borrowed, 5_375_000_000);
        assert_eq!(accrued.total_reserves, 37_500_000);
        assert_eq!(accrued.available_liquidity, 5_000_000_000);
        assert_eq!(accrued.last_accrual_timestamp, 1_000 + SECONDS_PER_YEAR);
    }

    #[test]
    fn accrue_without_elapsed_time_is_noop() {
        let reserve = reserve();
        assert_eq!(accrue(&reserve, 1_000), Some(reserve.clone()));
        // a clock going backwards does not move anything
        assert_eq!(accrue(&reserve, 10), Some(reserve.clone()));
    }

    #[test]
    fn accrue_without_borrows_keeps_balances() {
        let mut reserve = reserve();
        reserve.total_borrowed = 0;
        let accrued = accrue(&reserve, 1_000 + SECONDS_PER_YEAR).unwrap();
        // base rate still applies to the index, nobody owes it
        assert_eq!(
            accrued.borrow_index,
            FixedU128::saturating_from_rational(105, 100)
        );
        assert_eq!(accrued.supply_index, Rate::one());
        assert_eq!(accrued.total_borrowed, 0);
        assert_eq!(accrued.total_reserves, 0);
    }

    #[test]
    fn total_borrowed_rounds_down() {
        let mut reserve = reserve();
        reserve.available_liquidity = 1;
        reserve.total_borrowed = 3;
        let accrued = accrue(&reserve, 1_001).unwrap();
        assert!(accrued.borrow_index > Rate::one());
        assert_eq!(accrued.total_borrowed, 3);
        assert_eq!(accrued.total_reserves, 0);

        // A position of the same size still owes the extra base unit
        let debt = IndexedBalance::new(3, Rate::one());
        assert_eq!(debt.current(accrued.borrow_index, Rounding::Up), Some(4));
    }

    #[test]
    fn accrue_interest_reports_overflow() {
        let mut reserve = reserve();
        reserve.total_borrowed = u128::MAX;
        reserve.available_liquidity = 0;
        assert_eq!(
            Pallet::<Test>::accrue_interest(&mut reserve, 1_000 + SECONDS_PER_YEAR),
            Err(Error::<Test>::ArithmeticOverflow.into())
        );
        assert_eq!(reserve.last_accrual_timestamp, 1_000);
    }
}
