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

//! # Lending pool pallet
//!
//! ## Overview
//!
//! Lending pool pallet keeps one reserve per asset. Accounts deposit collateral
//! into reserves and borrow against it; the interest rate of each reserve is
//! determined by its utilization. Collateral and debt are valued with prices
//! from the oracle, and positions whose risk-weighted collateral falls below
//! their debt can be liquidated by anyone for a bonus.

#![cfg_attr(not(feature = "std"), no_std)]

pub use crate::rate_model::*;

use frame_support::{log, pallet_prelude::*, traits::UnixTime, transactional};
use frame_system::pallet_prelude::*;
pub use pallet::*;
use pallet_traits::TokenCustody;
use primitives::{Balance, CurrencyId, PriceFeeder, Timestamp};
use sp_runtime::traits::{StaticLookup, Zero};
use sp_std::{
    collections::{btree_map::BTreeMap, btree_set::BTreeSet},
    prelude::*,
    result::Result,
};

pub use types::{
    HealthFactor, IndexedBalance, LiquidationOutcome, PositionAccount, PositionValues, PriceQuote,
    ReserveAccount, ReserveConfig, MAX_DECIMALS,
};
pub use weights::WeightInfo;

mod benchmarking;

#[cfg(test)]
mod mock;

mod health;
mod interest;
mod liquidation;
mod oracle;
mod rate_model;
mod types;

pub mod math;
pub mod weights;

use math::BPS;

pub(crate) const LOG_TARGET: &str = "lending-pool";

/// Sets up funds and prices for the benchmarks.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
    fn fund(who: &AccountId, asset: CurrencyId, amount: Balance);
    fn set_price(asset: CurrencyId, price: primitives::Price);
}

#[frame_support::pallet]
pub mod pallet {

    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// The oracle price feeder
        type PriceFeeder: PriceFeeder;

        /// Moves tokens in and out of the pool
        type Custody: TokenCustody<Self::AccountId>;

        /// The origin which can initialize, update and close pools and
        /// reduce reserves.
        type PoolAuthority: EnsureOrigin<Self::RuntimeOrigin>;

        /// Unix time
        type UnixTime: UnixTime;

        /// Oldest price, in seconds, that can still be used.
        #[pallet::constant]
        type MaxPriceStaleness: Get<Timestamp>;

        /// Close factor of newly initialized pools.
        #[pallet::constant]
        type DefaultCloseFactorBps: Get<u16>;

        /// Liquidation bonus of newly initialized pools.
        #[pallet::constant]
        type DefaultLiquidationBonusBps: Get<u16>;

        /// Jump point of the rate model of newly initialized pools.
        #[pallet::constant]
        type OptimalUtilizationBps: Get<u32>;

        /// Rate increase from zero up to the optimal utilization.
        #[pallet::constant]
        type OptimalRateSlopeBps: Get<u32>;

        /// Rate increase from the optimal utilization up to 100%.
        #[pallet::constant]
        type JumpRateSlopeBps: Get<u32>;

        /// Maximum number of distinct reserves a position may hold.
        #[pallet::constant]
        type MaxPositionEntries: Get<u32>;

        /// Weight information for extrinsics in this pallet.
        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: BenchmarkHelper<Self::AccountId>;
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Invalid reserve parameters
        InvalidConfig,
        /// Pool already exists
        AlreadyInitialized,
        /// Amount must be greater than zero
        ZeroAmount,
        /// Withdraw amount greater than the deposited collateral
        InsufficientCollateral,
        /// Insufficient liquidity in the pool
        InsufficientLiquidity,
        /// The position would be unhealthy after the operation
        HealthCheckFailed,
        /// Position is healthy and cannot be liquidated
        PositionHealthy,
        /// Repay amount greater than the close factor allows
        ExceedsCloseFactor,
        /// Oracle price is too old
        StalePrice,
        /// Arithmetic overflow
        ArithmeticOverflow,
        /// Pool does not exist
        ReserveNotFound,
        /// Pool still has liquidity, debt, reserves or positions
        ReserveInUse,
        /// Currency's oracle price not ready
        PriceOracleNotReady,
        /// Liquidator is same as borrower
        LiquidatorIsBorrower,
        /// Borrower has no debt in this asset
        NoOutstandingDebt,
        /// Borrower has no collateral in this asset
        NoCollateralToSeize,
        /// Insufficient reserves
        InsufficientReserves,
        /// Position holds too many distinct assets
        TooManyPositionEntries,
        /// Repay amount is worth less than one base unit of the collateral
        SeizeAmountTooSmall,
    }

    #[pallet::event]
    #[pallet::generate_deposit(pub(crate) fn deposit_event)]
    pub enum Event<T: Config> {
        /// New pool is initialized
        /// [asset_id, config]
        PoolInitialized(CurrencyId, ReserveConfig),
        /// Risk parameters of a pool are updated
        /// [asset_id, config]
        ReserveConfigUpdated(CurrencyId, ReserveConfig),
        /// An unused pool is removed
        /// [asset_id]
        PoolClosed(CurrencyId),
        /// Event emitted when collateral is deposited
        /// [sender, asset_id, amount]
        Deposited(T::AccountId, CurrencyId, Balance),
        /// Event emitted when collateral is withdrawn
        /// [sender, asset_id, amount]
        Withdrawn(T::AccountId, CurrencyId, Balance),
        /// Event emitted when cash is borrowed
        /// [sender, asset_id, amount]
        Borrowed(T::AccountId, CurrencyId, Balance),
        /// Event emitted when a borrow is repaid
        /// [payer, borrower, asset_id, amount]
        Repaid(T::AccountId, T::AccountId, CurrencyId, Balance),
        /// Event emitted when a borrow is liquidated
        /// [liquidator, borrower, debt_asset, collateral_asset, repaid, seized, partial_seizure]
        Liquidated(
            T::AccountId,
            T::AccountId,
            CurrencyId,
            CurrencyId,
            Balance,
            Balance,
            bool,
        ),
        /// Event emitted when the reserves are added
        /// [payer, asset_id, added_amount, total_reserves]
        ReservesAdded(T::AccountId, CurrencyId, Balance, Balance),
        /// Event emitted when the reserves are reduced
        /// [receiver, asset_id, reduced_amount, total_reserves]
        ReservesReduced(T::AccountId, CurrencyId, Balance, Balance),
    }

    /// Mapping of asset id to its pool
    #[pallet::storage]
    #[pallet::getter(fn reserves)]
    pub type Reserves<T: Config> = StorageMap<_, Blake2_128Concat, CurrencyId, ReserveAccount>;

    /// Mapping of account addresses to their collateral and debt
    #[pallet::storage]
    #[pallet::getter(fn positions)]
    pub type Positions<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, PositionAccount<T::AccountId>>;

    #[pallet::pallet]
    #[pallet::without_storage_info]
    pub struct Pallet<T>(PhantomData<T>);

    #[pallet::hooks]
    impl<T: Config> Hooks<T::BlockNumber> for Pallet<T> {
        /// Brings every pool up to date once per block. A pool that fails to
        /// accrue is skipped and keeps its old indices; since interest is
        /// computed from elapsed time, it catches up on the next success.
        fn on_initialize(block_number: T::BlockNumber) -> Weight {
            let now = Self::now();
            let assets: Vec<CurrencyId> = Reserves::<T>::iter_keys().collect();
            for asset in assets.iter() {
                if let Err(err) = Self::accrue_stored_reserve(*asset, now) {
                    log::error!(
                        target: LOG_TARGET,
                        "Could not accrue interest of asset {:?} at block {:?}: {:?}",
                        asset,
                        block_number,
                        err
                    );
                }
            }

            T::WeightInfo::accrue_interest().saturating_mul(assets.len() as u64)
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Creates the pool of `asset` with empty balances and indices at one.
        ///
        /// Close factor, liquidation bonus and the slopes of the rate model
        /// come from the pallet constants.
        ///
        /// - `asset`: Pool related currency
        /// - `decimals`: Decimals of the currency, at most 18
        /// - `reserve_ratio_bps`: Share of the pool held back from borrowing
        /// - `collateral_factor_bps`: Risk weight of the currency as collateral
        /// - `base_rate_bps`: Borrow rate at zero utilization
        #[pallet::weight(T::WeightInfo::initialize_pool())]
        #[transactional]
        pub fn initialize_pool(
            origin: OriginFor<T>,
            asset: CurrencyId,
            decimals: u8,
            reserve_ratio_bps: u16,
            collateral_factor_bps: u16,
            base_rate_bps: u16,
        ) -> DispatchResultWithPostInfo {
            T::PoolAuthority::ensure_origin(origin)?;
            ensure!(
                decimals <= MAX_DECIMALS && u128::from(base_rate_bps) <= BPS,
                Error::<T>::InvalidConfig
            );
            let config = ReserveConfig {
                reserve_ratio_bps,
                collateral_factor_bps,
                close_factor_bps: T::DefaultCloseFactorBps::get(),
                liquidation_bonus_bps: T::DefaultLiquidationBonusBps::get(),
                rate_model: JumpModel::from_slopes(
                    base_rate_bps.into(),
                    T::OptimalUtilizationBps::get(),
                    T::OptimalRateSlopeBps::get(),
                    T::JumpRateSlopeBps::get(),
                ),
            };
            ensure!(config.is_valid(), Error::<T>::InvalidConfig);
            ensure!(
                !Reserves::<T>::contains_key(asset),
                Error::<T>::AlreadyInitialized
            );

            let reserve = ReserveAccount::new(asset, decimals, config.clone(), Self::now());
            Reserves::<T>::insert(asset, reserve);

            Self::deposit_event(Event::<T>::PoolInitialized(asset, config));
            Ok(().into())
        }

        /// Replaces the risk parameters of a pool.
        ///
        /// Interest up to now is accrued with the old parameters first.
        ///
        /// - `asset`: Pool related currency
        /// - `config`: The new parameters
        #[pallet::weight(T::WeightInfo::update_reserve_config())]
        #[transactional]
        pub fn update_reserve_config(
            origin: OriginFor<T>,
            asset: CurrencyId,
            config: ReserveConfig,
        ) -> DispatchResultWithPostInfo {
            T::PoolAuthority::ensure_origin(origin)?;
            ensure!(config.is_valid(), Error::<T>::InvalidConfig);

            let mut reserve = Self::accrued_reserve(asset, Self::now())?;
            reserve.config = config.clone();
            Reserves::<T>::insert(asset, reserve);

            Self::deposit_event(Event::<T>::ReserveConfigUpdated(asset, config));
            Ok(().into())
        }

        /// Removes a pool that holds nothing and is referenced by no position.
        ///
        /// - `asset`: Pool related currency
        #[pallet::weight(T::WeightInfo::close_pool())]
        #[transactional]
        pub fn close_pool(origin: OriginFor<T>, asset: CurrencyId) -> DispatchResultWithPostInfo {
            T::PoolAuthority::ensure_origin(origin)?;
            let reserve = Self::reserve(asset)?;
            ensure!(reserve.is_unused(), Error::<T>::ReserveInUse);
            Reserves::<T>::remove(asset);

            Self::deposit_event(Event::<T>::PoolClosed(asset));
            Ok(().into())
        }

        /// Sender supplies assets into the pool as collateral.
        ///
        /// - `asset`: the asset to be deposited.
        /// - `amount`: the amount to be deposited.
        #[pallet::weight(T::WeightInfo::deposit())]
        #[transactional]
        pub fn deposit(
            origin: OriginFor<T>,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let who = ensure_signed(origin)?;
            Self::do_deposit(&who, asset, amount)?;

            Self::deposit_event(Event::<T>::Deposited(who, asset, amount));
            Ok(().into())
        }

        /// Sender takes collateral back out of the pool.
        ///
        /// - `asset`: the asset to be withdrawn.
        /// - `amount`: the amount to be withdrawn.
        #[pallet::weight(T::WeightInfo::withdraw())]
        #[transactional]
        pub fn withdraw(
            origin: OriginFor<T>,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let who = ensure_signed(origin)?;
            Self::do_withdraw(&who, asset, amount)?;

            Self::deposit_event(Event::<T>::Withdrawn(who, asset, amount));
            Ok(().into())
        }

        /// Sender withdraws all of its collateral in `asset`.
        ///
        /// - `asset`: the asset to be withdrawn.
        #[pallet::weight(T::WeightInfo::withdraw_all())]
        #[transactional]
        pub fn withdraw_all(origin: OriginFor<T>, asset: CurrencyId) -> DispatchResultWithPostInfo {
            let who = ensure_signed(origin)?;
            let reserve = Self::accrued_reserve(asset, Self::now())?;
            let amount = Self::position_of(&who)
                .collateral_of(asset, reserve.supply_index)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            Self::do_withdraw(&who, asset, amount)?;

            Self::deposit_event(Event::<T>::Withdrawn(who, asset, amount));
            Ok(().into())
        }

        /// Sender borrows assets from the pool against its collateral.
        ///
        /// - `asset`: the asset to be borrowed.
        /// - `amount`: the amount to be borrowed.
        #[pallet::weight(T::WeightInfo::borrow())]
        #[transactional]
        pub fn borrow(
            origin: OriginFor<T>,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let who = ensure_signed(origin)?;
            Self::do_borrow(&who, asset, amount)?;

            Self::deposit_event(Event::<T>::Borrowed(who, asset, amount));
            Ok(().into())
        }

        /// Sender repays some of the debt of `borrower`. Repaying more than
        /// is owed repays the whole debt.
        ///
        /// - `borrower`: the account whose debt is repaid, may be the sender.
        /// - `asset`: the asset to be repaid.
        /// - `amount`: the amount to be repaid.
        #[pallet::weight(T::WeightInfo::repay())]
        #[transactional]
        pub fn repay(
            origin: OriginFor<T>,
            borrower: <T::Lookup as StaticLookup>::Source,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let payer = ensure_signed(origin)?;
            let borrower = T::Lookup::lookup(borrower)?;
            let repaid = Self::do_repay(&payer, &borrower, asset, amount)?;

            Self::deposit_event(Event::<T>::Repaid(payer, borrower, asset, repaid));
            Ok(().into())
        }

        /// Sender repays the whole debt of `borrower` in `asset`.
        ///
        /// - `borrower`: the account whose debt is repaid, may be the sender.
        /// - `asset`: the asset to be repaid.
        #[pallet::weight(T::WeightInfo::repay_all())]
        #[transactional]
        pub fn repay_all(
            origin: OriginFor<T>,
            borrower: <T::Lookup as StaticLookup>::Source,
            asset: CurrencyId,
        ) -> DispatchResultWithPostInfo {
            let payer = ensure_signed(origin)?;
            let borrower = T::Lookup::lookup(borrower)?;
            let repaid = Self::do_repay(&payer, &borrower, asset, Balance::MAX)?;

            Self::deposit_event(Event::<T>::Repaid(payer, borrower, asset, repaid));
            Ok(().into())
        }

        /// The sender liquidates the borrower's collateral.
        ///
        /// - `borrower`: the borrower to be liquidated.
        /// - `debt_asset`: the asset to be repaid.
        /// - `collateral_asset`: the collateral to be seized.
        /// - `repay_amount`: the amount to be repaid, at most the close factor
        ///   of the borrower's debt.
        #[pallet::weight(T::WeightInfo::liquidate())]
        #[transactional]
        pub fn liquidate(
            origin: OriginFor<T>,
            borrower: T::AccountId,
            debt_asset: CurrencyId,
            collateral_asset: CurrencyId,
            #[pallet::compact] repay_amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let liquidator = ensure_signed(origin)?;
            let outcome = Self::do_liquidate(
                &liquidator,
                &borrower,
                debt_asset,
                collateral_asset,
                repay_amount,
            )?;

            Self::deposit_event(Event::<T>::Liquidated(
                liquidator,
                borrower,
                debt_asset,
                collateral_asset,
                outcome.repaid,
                outcome.seized,
                outcome.partial_seizure,
            ));
            Ok(().into())
        }

        /// Sender funds the protocol reserves of a pool.
        ///
        /// - `asset`: Pool related currency
        /// - `amount`: The amount to be added
        #[pallet::weight(T::WeightInfo::add_reserves())]
        #[transactional]
        pub fn add_reserves(
            origin: OriginFor<T>,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            let payer = ensure_signed(origin)?;
            ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

            let mut reserve = Self::accrued_reserve(asset, Self::now())?;
            reserve.available_liquidity = reserve
                .available_liquidity
                .checked_add(amount)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            reserve.total_reserves = reserve
                .total_reserves
                .checked_add(amount)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            T::Custody::transfer_in(&payer, asset, amount)?;
            let total_reserves = reserve.total_reserves;
            Reserves::<T>::insert(asset, reserve);

            Self::deposit_event(Event::<T>::ReservesAdded(
                payer,
                asset,
                amount,
                total_reserves,
            ));
            Ok(().into())
        }

        /// Pays protocol reserves of a pool out to `receiver`.
        ///
        /// Liquidity left in a pool that no position refers to counts as
        /// reserves.
        ///
        /// - `receiver`: the receiver of the reserves
        /// - `asset`: Pool related currency
        /// - `amount`: The amount to be reduced
        #[pallet::weight(T::WeightInfo::reduce_reserves())]
        #[transactional]
        pub fn reduce_reserves(
            origin: OriginFor<T>,
            receiver: <T::Lookup as StaticLookup>::Source,
            asset: CurrencyId,
            #[pallet::compact] amount: Balance,
        ) -> DispatchResultWithPostInfo {
            T::PoolAuthority::ensure_origin(origin)?;
            let receiver = T::Lookup::lookup(receiver)?;
            ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

            let mut reserve = Self::accrued_reserve(asset, Self::now())?;
            reserve.claim_unowned_liquidity();
            ensure!(
                amount <= reserve.total_reserves && amount <= reserve.available_liquidity,
                Error::<T>::InsufficientReserves
            );
            reserve.available_liquidity -= amount;
            reserve.total_reserves -= amount;
            T::Custody::transfer_out(&receiver, asset, amount)?;
            let total_reserves = reserve.total_reserves;
            Reserves::<T>::insert(asset, reserve);

            Self::deposit_event(Event::<T>::ReservesReduced(
                receiver,
                asset,
                amount,
                total_reserves,
            ));
            Ok(().into())
        }
    }
}

impl<T: Config> Pallet<T> {
    pub fn now() -> Timestamp {
        T::UnixTime::now().as_secs()
    }

    /// The stored pool of `asset`, without accruing.
    pub fn reserve(asset: CurrencyId) -> Result<ReserveAccount, DispatchError> {
        Reserves::<T>::get(asset).ok_or_else(|| Error::<T>::ReserveNotFound.into())
    }

    /// The stored position of `who`, or an empty one.
    pub fn position_of(who: &T::AccountId) -> PositionAccount<T::AccountId> {
        Positions::<T>::get(who).unwrap_or_else(|| PositionAccount::new(who.clone()))
    }

    pub(crate) fn store_position(position: PositionAccount<T::AccountId>) {
        if position.is_empty() {
            Positions::<T>::remove(&position.owner);
        } else {
            Positions::<T>::insert(position.owner.clone(), position);
        }
    }

    pub(crate) fn update_references(
        reserve: &mut ReserveAccount,
        was_referenced: bool,
        is_referenced: bool,
    ) -> DispatchResult {
        match (was_referenced, is_referenced) {
            (false, true) => {
                reserve.references = reserve
                    .references
                    .checked_add(1)
                    .ok_or(Error::<T>::ArithmeticOverflow)?;
            }
            (true, false) => {
                reserve.references = reserve.references.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn ensure_entry_limit(position: &PositionAccount<T::AccountId>) -> DispatchResult {
        ensure!(
            position.reserves().len() as u32 <= T::MaxPositionEntries::get(),
            Error::<T>::TooManyPositionEntries
        );
        Ok(())
    }

    pub(crate) fn ensure_healthy(
        position: &PositionAccount<T::AccountId>,
        reserves: &BTreeMap<CurrencyId, ReserveAccount>,
    ) -> DispatchResult {
        let health = Self::health_of(position, reserves)?;
        ensure!(health.is_healthy(), Error::<T>::HealthCheckFailed);
        Ok(())
    }

    /// Every pool `position` refers to plus `assets`, accrued to now.
    pub(crate) fn working_set(
        position: &PositionAccount<T::AccountId>,
        assets: &[CurrencyId],
    ) -> Result<BTreeMap<CurrencyId, ReserveAccount>, DispatchError> {
        let mut touched: BTreeSet<CurrencyId> = position.reserves();
        touched.extend(assets.iter().copied());
        Self::accrued_reserves(&touched, Self::now())
    }

    pub fn do_deposit(who: &T::AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        let mut reserve = Self::accrued_reserve(asset, Self::now())?;
        let mut position = Self::position_of(who);
        let collateral = position
            .collateral_of(asset, reserve.supply_index)
            .and_then(|collateral| collateral.checked_add(amount))
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        let was_referenced = position.references(asset);
        position.set_collateral(asset, collateral, reserve.supply_index);
        Self::ensure_entry_limit(&position)?;

        reserve.available_liquidity = reserve
            .available_liquidity
            .checked_add(amount)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        Self::update_references(&mut reserve, was_referenced, true)?;

        T::Custody::transfer_in(who, asset, amount)?;
        Reserves::<T>::insert(asset, reserve);
        Self::store_position(position);

        log::trace!(
            target: LOG_TARGET,
            "deposited {:?} of asset {:?}, collateral is now {:?}",
            amount,
            asset,
            collateral,
        );
        Ok(())
    }

    pub fn do_withdraw(who: &T::AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        let mut position = Self::position_of(who);
        let mut reserves = Self::working_set(&position, &[asset])?;
        let reserve = reserves
            .get_mut(&asset)
            .ok_or(Error::<T>::ReserveNotFound)?;
        let collateral = position
            .collateral_of(asset, reserve.supply_index)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(amount <= collateral, Error::<T>::InsufficientCollateral);
        ensure!(
            amount <= reserve.available_liquidity,
            Error::<T>::InsufficientLiquidity
        );

        let was_referenced = position.references(asset);
        position.set_collateral(asset, collateral - amount, reserve.supply_index);
        reserve.available_liquidity -= amount;
        Self::update_references(reserve, was_referenced, position.references(asset))?;

        Self::ensure_healthy(&position, &reserves)?;

        T::Custody::transfer_out(who, asset, amount)?;
        Self::store_reserves(reserves);
        Self::store_position(position);
        Ok(())
    }

    pub fn do_borrow(who: &T::AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        let mut position = Self::position_of(who);
        let mut reserves = Self::working_set(&position, &[asset])?;
        let reserve = reserves
            .get_mut(&asset)
            .ok_or(Error::<T>::ReserveNotFound)?;
        let borrowable = reserve
            .borrowable()
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(amount <= borrowable, Error::<T>::InsufficientLiquidity);

        let debt = position
            .debt_of(asset, reserve.borrow_index)
            .and_then(|debt| debt.checked_add(amount))
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        let was_referenced = position.references(asset);
        position.set_debt(asset, debt, reserve.borrow_index);
        reserve.available_liquidity -= amount;
        reserve.total_borrowed = reserve
            .total_borrowed
            .checked_add(amount)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        Self::update_references(reserve, was_referenced, true)?;

        Self::ensure_entry_limit(&position)?;
        Self::ensure_healthy(&position, &reserves)?;

        T::Custody::transfer_out(who, asset, amount)?;
        Self::store_reserves(reserves);
        Self::store_position(position);
        Ok(())
    }

    /// Repays at most `amount` of the debt of `borrower`, returning what was repaid.
    pub fn do_repay(
        payer: &T::AccountId,
        borrower: &T::AccountId,
        asset: CurrencyId,
        amount: Balance,
    ) -> Result<Balance, DispatchError> {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        let mut reserve = Self::accrued_reserve(asset, Self::now())?;
        let mut position = Self::position_of(borrower);
        let debt = position
            .debt_of(asset, reserve.borrow_index)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        ensure!(!debt.is_zero(), Error::<T>::NoOutstandingDebt);

        let repay_amount = amount.min(debt);
        Self::apply_repayment(&mut reserve, &mut position, debt, repay_amount)?;

        T::Custody::transfer_in(payer, asset, repay_amount)?;
        Reserves::<T>::insert(asset, reserve);
        Self::store_position(position);
        Ok(repay_amount)
    }

    /// Books a repayment of `amount` out of the current `debt` of `position`.
    pub(crate) fn apply_repayment(
        reserve: &mut ReserveAccount,
        position: &mut PositionAccount<T::AccountId>,
        debt: Balance,
        amount: Balance,
    ) -> DispatchResult {
        let asset = reserve.asset;
        let remaining = debt
            .checked_sub(amount)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        let was_referenced = position.references(asset);
        position.set_debt(asset, remaining, reserve.borrow_index);

        reserve.available_liquidity = reserve
            .available_liquidity
            .checked_add(amount)
            .ok_or(Error::<T>::ArithmeticOverflow)?;
        // Per-position debt rounds up, so the pool total may run out first.
        reserve.total_borrowed = reserve.total_borrowed.saturating_sub(amount);
        Self::update_references(reserve, was_referenced, position.references(asset))
    }
}
