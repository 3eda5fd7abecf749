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
use primitives::{Liquidity, Price, Rate, Shortfall};
use sp_runtime::{
    traits::{CheckedAdd, Saturating, Zero},
    FixedPointNumber,
};

impl<T: Config> Pallet<T> {
    /// USD value of `amount` base units of the reserve's asset, in
    /// `FixedU128` units.
    pub fn value_of(
        reserve: &ReserveAccount,
        amount: Balance,
        rounding: Rounding,
    ) -> Result<Price, DispatchError> {
        if amount.is_zero() {
            return Ok(Price::zero());
        }
        let price = Self::get_price(reserve.asset)?.value;
        let unit = unit(reserve.decimals).ok_or(Error::<T>::ArithmeticOverflow)?;
        let value = mul_div(amount, price.into_inner(), unit, rounding)
            .ok_or(Error::<T>::ArithmeticOverflow)?;

        Ok(Price::from_inner(value))
    }

    /// Risk-weighted collateral value and debt value of `position`.
    ///
    /// `reserves` must hold every pool the position refers to, accrued to now.
    pub fn position_values(
        position: &PositionAccount<T::AccountId>,
        reserves: &BTreeMap<CurrencyId, ReserveAccount>,
    ) -> Result<PositionValues, DispatchError> {
        let mut values = PositionValues::default();

        for (asset, entry) in position.collateral.iter() {
            let reserve = reserves.get(asset).ok_or(Error::<T>::ReserveNotFound)?;
            let amount = entry
                .current(reserve.supply_index, Rounding::Down)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            let value = Self::value_of(reserve, amount, Rounding::Down)?;
            let weighted = apply_bps(
                value.into_inner(),
                reserve.config.collateral_factor_bps.into(),
                Rounding::Down,
            )
            .ok_or(Error::<T>::ArithmeticOverflow)?;
            values.collateral_value = values
                .collateral_value
                .checked_add(&Price::from_inner(weighted))
                .ok_or(Error::<T>::ArithmeticOverflow)?;
        }

        for (asset, entry) in position.debt.iter() {
            let reserve = reserves.get(asset).ok_or(Error::<T>::ReserveNotFound)?;
            let amount = entry
                .current(reserve.borrow_index, Rounding::Up)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            let value = Self::value_of(reserve, amount, Rounding::Up)?;
            values.debt_value = values
                .debt_value
                .checked_add(&value)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
        }

        Ok(values)
    }

    /// Health factor of `position` against already accrued `reserves`.
    pub fn health_of(
        position: &PositionAccount<T::AccountId>,
        reserves: &BTreeMap<CurrencyId, ReserveAccount>,
    ) -> Result<HealthFactor, DispatchError> {
        if position.debt.is_empty() {
            return Ok(HealthFactor::Infinite);
        }
        let values = Self::position_values(position, reserves)?;
        if values.debt_value.is_zero() {
            return Ok(HealthFactor::Infinite);
        }
        // Too large to represent still reads as healthy.
        let factor = mul_div(
            values.collateral_value.into_inner(),
            Rate::DIV,
            values.debt_value.into_inner(),
            Rounding::Down,
        )
        .unwrap_or(u128::MAX);

        Ok(HealthFactor::Finite(Rate::from_inner(factor)))
    }

    /// Current health factor of `who`. Accrual happens on scratch copies of
    /// the pools, storage is left untouched.
    pub fn health_factor(who: &T::AccountId) -> Result<HealthFactor, DispatchError> {
        let position = Self::position_of(who);
        let reserves = Self::accrued_reserves(&position.reserves(), Self::now())?;
        Self::health_of(&position, &reserves)
    }

    /// Calculates user's risk-weighted collateral value minus debt value.
    ///
    /// Returns `(liquidity, shortfall)`, at most one of them is non-zero.
    pub fn get_account_liquidity(
        who: &T::AccountId,
    ) -> Result<(Liquidity, Shortfall), DispatchError> {
        let position = Self::position_of(who);
        let reserves = Self::accrued_reserves(&position.reserves(), Self::now())?;
        let values = Self::position_values(&position, &reserves)?;

        if values.collateral_value >= values.debt_value {
            Ok((
                values.collateral_value.saturating_sub(values.debt_value),
                Shortfall::zero(),
            ))
        } else {
            Ok((
                Liquidity::zero(),
                values.debt_value.saturating_sub(values.collateral_value),
            ))
        }
    }
}
