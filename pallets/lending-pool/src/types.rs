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

use crate::{
    math::{apply_bps, mul_div, Rounding, BPS},
    rate_model::{InterestRateModelLike, JumpModel},
};
use codec::{Decode, Encode, MaxEncodedLen};
use primitives::{Balance, CurrencyId, Price, Rate, Timestamp};
use scale_info::TypeInfo;
use sp_runtime::{
    traits::{One, Zero},
    FixedPointNumber, RuntimeDebug,
};
use sp_std::collections::{btree_map::BTreeMap, btree_set::BTreeSet};

/// Highest number of decimals a reserve asset may use.
pub const MAX_DECIMALS: u8 = 18;

/// An amount that grows with an index.
///
/// The current value is `principal * index_now / index`.
#[derive(
    Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, Default, TypeInfo, MaxEncodedLen,
)]
pub struct IndexedBalance {
    /// Amount at the time of the last balance-changing action
    pub principal: Balance,
    /// Index at the time of the last balance-changing action
    pub index: Rate,
}

impl IndexedBalance {
    pub fn new(principal: Balance, index: Rate) -> Self {
        Self { principal, index }
    }

    /// The balance at `current_index`.
    pub fn current(&self, current_index: Rate, rounding: Rounding) -> Option<Balance> {
        if self.principal.is_zero() {
            return Some(Zero::zero());
        }
        mul_div(
            self.principal,
            current_index.into_inner(),
            self.index.into_inner(),
            rounding,
        )
    }
}

/// Risk parameters of a reserve.
#[cfg_attr(feature = "std", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct ReserveConfig {
    /// Fraction of the pool held back from borrowing, also the protocol cut of interest
    pub reserve_ratio_bps: u16,
    /// The collateral utilization ratio
    pub collateral_factor_bps: u16,
    /// The percent of a liquidatable account's borrow that can be repaid in a
    /// single liquidate transaction.
    pub close_factor_bps: u16,
    /// Extra collateral paid to a liquidator on top of the repaid value
    pub liquidation_bonus_bps: u16,
    /// Current interest rate model being used
    pub rate_model: JumpModel,
}

impl ReserveConfig {
    pub fn is_valid(&self) -> bool {
        let within_one = |bps: u16| u128::from(bps) <= BPS;
        within_one(self.reserve_ratio_bps)
            && within_one(self.collateral_factor_bps)
            && within_one(self.close_factor_bps)
            && within_one(self.liquidation_bonus_bps)
            && !self.close_factor_bps.is_zero()
            && self.rate_model.check_model()
    }
}

/// A pool of a single asset available for deposit and borrow.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct ReserveAccount {
    /// Underlying asset
    pub asset: CurrencyId,
    /// Number of decimals of the underlying asset
    pub decimals: u8,
    /// Tokens held by the pool and not lent out
    pub available_liquidity: Balance,
    /// Outstanding borrows, interest included
    pub total_borrowed: Balance,
    /// Protocol share of the accrued interest
    pub total_reserves: Balance,
    /// Accumulator of the borrow interest since the opening of the reserve
    pub borrow_index: Rate,
    /// Accumulator of the supply interest since the opening of the reserve
    pub supply_index: Rate,
    /// Last time the indices were advanced
    pub last_accrual_timestamp: Timestamp,
    /// Number of positions holding collateral or debt in this reserve
    pub references: u32,
    pub config: ReserveConfig,
}

impl ReserveAccount {
    pub fn new(asset: CurrencyId, decimals: u8, config: ReserveConfig, now: Timestamp) -> Self {
        Self {
            asset,
            decimals,
            available_liquidity: Zero::zero(),
            total_borrowed: Zero::zero(),
            total_reserves: Zero::zero(),
            borrow_index: Rate::one(),
            supply_index: Rate::one(),
            last_accrual_timestamp: now,
            references: Zero::zero(),
            config,
        }
    }

    /// `total_borrowed / (available_liquidity + total_borrowed)` in basis points, rounded down.
    pub fn utilization_bps(&self) -> Option<u32> {
        let total = self.available_liquidity.checked_add(self.total_borrowed)?;
        if total.is_zero() {
            return Some(Zero::zero());
        }
        mul_div(self.total_borrowed, BPS, total, Rounding::Down)?
            .try_into()
            .ok()
    }

    /// Liquidity that may be lent out once the reserve ratio is held back.
    pub fn borrowable(&self) -> Option<Balance> {
        let total = self.available_liquidity.checked_add(self.total_borrowed)?;
        let held_back = apply_bps(
            total,
            self.config.reserve_ratio_bps.into(),
            Rounding::Up,
        )?;

        Some(self.available_liquidity.saturating_sub(held_back))
    }

    /// Hands rounding dust to the protocol: once no position refers to the
    /// reserve and nothing is borrowed, all of its liquidity is reserves.
    pub fn claim_unowned_liquidity(&mut self) {
        if self.references.is_zero() && self.total_borrowed.is_zero() {
            self.total_reserves = self.total_reserves.max(self.available_liquidity);
        }
    }

    /// Whether the reserve holds nothing and nobody refers to it.
    pub fn is_unused(&self) -> bool {
        self.available_liquidity.is_zero()
            && self.total_borrowed.is_zero()
            && self.total_reserves.is_zero()
            && self.references.is_zero()
    }
}

/// A user's collateral and debt across reserves.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct PositionAccount<AccountId> {
    pub owner: AccountId,
    /// Reserve -> deposited collateral, grows with the supply index
    pub collateral: BTreeMap<CurrencyId, IndexedBalance>,
    /// Reserve -> borrowed amount, grows with the borrow index
    pub debt: BTreeMap<CurrencyId, IndexedBalance>,
}

impl<AccountId> PositionAccount<AccountId> {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            collateral: BTreeMap::new(),
            debt: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collateral.is_empty() && self.debt.is_empty()
    }

    /// Every reserve the position holds collateral or debt in, ascending.
    pub fn reserves(&self) -> BTreeSet<CurrencyId> {
        self.collateral
            .keys()
            .chain(self.debt.keys())
            .copied()
            .collect()
    }

    /// Whether the position refers to `asset` at all.
    pub fn references(&self, asset: CurrencyId) -> bool {
        self.collateral.contains_key(&asset) || self.debt.contains_key(&asset)
    }

    /// Current collateral in `asset`, rounded down.
    pub fn collateral_of(&self, asset: CurrencyId, supply_index: Rate) -> Option<Balance> {
        self.collateral
            .get(&asset)
            .map_or(Some(Zero::zero()), |entry| {
                entry.current(supply_index, Rounding::Down)
            })
    }

    /// Current debt in `asset`, rounded up.
    pub fn debt_of(&self, asset: CurrencyId, borrow_index: Rate) -> Option<Balance> {
        self.debt
            .get(&asset)
            .map_or(Some(Zero::zero()), |entry| {
                entry.current(borrow_index, Rounding::Up)
            })
    }

    pub fn set_collateral(&mut self, asset: CurrencyId, amount: Balance, supply_index: Rate) {
        if amount.is_zero() {
            self.collateral.remove(&asset);
        } else {
            self.collateral
                .insert(asset, IndexedBalance::new(amount, supply_index));
        }
    }

    pub fn set_debt(&mut self, asset: CurrencyId, amount: Balance, borrow_index: Rate) {
        if amount.is_zero() {
            self.debt.remove(&asset);
        } else {
            self.debt
                .insert(asset, IndexedBalance::new(amount, borrow_index));
        }
    }
}

/// A price read from the feeder that passed the staleness check.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct PriceQuote {
    pub asset: CurrencyId,
    /// USD per whole token
    pub value: Price,
    pub observed_at: Timestamp,
}

/// Risk-weighted collateral value over debt value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, RuntimeDebug)]
pub enum HealthFactor {
    Finite(Rate),
    /// The position has no debt
    Infinite,
}

impl HealthFactor {
    /// A factor of exactly one is healthy.
    pub fn is_healthy(&self) -> bool {
        match self {
            HealthFactor::Finite(factor) => *factor >= Rate::one(),
            HealthFactor::Infinite => true,
        }
    }
}

/// USD values of a position, in `FixedU128` units.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug, Default)]
pub struct PositionValues {
    /// Collateral value weighted by each reserve's collateral factor
    pub collateral_value: Price,
    pub debt_value: Price,
}

#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct LiquidationOutcome {
    pub repaid: Balance,
    pub seized: Balance,
    /// The borrower had less collateral than the repayment was worth
    pub partial_seizure: bool,
}
