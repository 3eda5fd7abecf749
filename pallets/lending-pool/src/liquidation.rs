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
use crate::math::{apply_bps, mul_div, unit, Rounding};
use sp_runtime::FixedPointNumber;

impl<T: Config> Pallet<T> {
    /// Repays up to the close factor of an unhealthy borrower's debt and
    /// hands the liquidator collateral worth the repaid value plus the
    /// liquidation bonus of the debt pool.
    ///
    /// The seized collateral is credited to the liquidator's position. When
    /// the borrower holds less collateral than that, all of it is seized and
    /// the outcome is marked as a partial seizure. A repayment too small to
    /// buy a single base unit of collateral is rejected.
    pub fn do_liquidate(
        liquidator: &T::AccountId,
        borrower: &T::AccountId,
        debt_asset: CurrencyId,
        collateral_asset: CurrencyId,
        repay_amount: Balance,
    ) -> Result<LiquidationOutcome, DispatchError> {
        ensure!(liquidator != borrower, Error::<T>::LiquidatorIsBorrower);
        ensure!(!repay_amount.is_zero(), Error::<T>::ZeroAmount);

        let mut borrower_position = Self::position_of(borrower);
        let mut reserves =
            Self::working_set(&borrower_position, &[debt_asset, collateral_asset])?;
        let health = Self::health_of(&borrower_position, &reserves)?;
        ensure!(!health.is_healthy(), Error::<T>::PositionHealthy);

        let debt_reserve = reserves
            .get_mut(&debt_asset)
            .ok_or(Error::<T>::ReserveNotFound)?;
        let debt = borrower_position
            .debt_of(debt_asset, debt_reserve.borrow_index)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(!debt.is_zero(), Error::<T>::NoOutstandingDebt);
        let close_limit = apply_bps(
            debt,
            debt_reserve.config.close_factor_bps.into(),
            Rounding::Up,
        )
        .ok_or(Error::<T>::ArithmeticOverflow)?
        .min(debt);
        ensure!(repay_amount <= close_limit, Error::<T>::ExceedsCloseFactor);

        Self::apply_repayment(debt_reserve, &mut borrower_position, debt, repay_amount)?;
        T::Custody::transfer_in(liquidator, debt_asset, repay_amount)?;

        let bonus_bps = debt_reserve.config.liquidation_bonus_bps;
        let repaid_value = Self::value_of(debt_reserve, repay_amount, Rounding::Down)?;
        let seize_value = apply_bps(
            repaid_value.into_inner(),
            BPS + u128::from(bonus_bps),
            Rounding::Down,
        )
        .ok_or(Error::<T>::ArithmeticOverflow)?;

        let collateral_reserve = reserves
            .get_mut(&collateral_asset)
            .ok_or(Error::<T>::ReserveNotFound)?;
        let supply_index = collateral_reserve.supply_index;
        let available = borrower_position
            .collateral_of(collateral_asset, supply_index)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(!available.is_zero(), Error::<T>::NoCollateralToSeize);

        let collateral_price = Self::get_price(collateral_asset)?.value;
        let seizable = unit(collateral_reserve.decimals)
            .and_then(|unit| {
                mul_div(
                    seize_value,
                    unit,
                    collateral_price.into_inner(),
                    Rounding::Down,
                )
            })
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(!seizable.is_zero(), Error::<T>::SeizeAmountTooSmall);
        let partial_seizure = seizable > available;
        let seized = seizable.min(available);

        let mut liquidator_position = Self::position_of(liquidator);
        let liquidator_collateral = liquidator_position
            .collateral_of(collateral_asset, supply_index)
            .and_then(|collateral| collateral.checked_add(seized))
            .ok_or(Error::<T>::ArithmeticOverflow)?;

        let borrower_was_referenced = borrower_position.references(collateral_asset);
        borrower_position.set_collateral(collateral_asset, available - seized, supply_index);
        Self::update_references(
            collateral_reserve,
            borrower_was_referenced,
            borrower_position.references(collateral_asset),
        )?;

        let liquidator_was_referenced = liquidator_position.references(collateral_asset);
        liquidator_position.set_collateral(collateral_asset, liquidator_collateral, supply_index);
        Self::update_references(
            collateral_reserve,
            liquidator_was_referenced,
            liquidator_position.references(collateral_asset),
        )?;
        Self::ensure_entry_limit(&liquidator_position)?;

        Self::store_reserves(reserves);
        Self::store_position(borrower_position);
        Self::store_position(liquidator_position);

        log::debug!(
            target: LOG_TARGET,
            "liquidated {:?} of asset {:?} for {:?} of asset {:?}, partial seizure: {:?}",
            repay_amount,
            debt_asset,
            seized,
            collateral_asset,
            partial_seizure,
        );

        Ok(LiquidationOutcome {
            repaid: repay_amount,
            seized,
            partial_seizure,
        })
    }
}
