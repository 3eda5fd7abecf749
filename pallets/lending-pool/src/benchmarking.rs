//! Benchmarking setup for pallet-lending-pool

#![cfg(feature = "runtime-benchmarks")]

use super::*;

use crate::Pallet as LendingPool;
use frame_benchmarking::{account, benchmarks, impl_benchmark_test_suite, whitelisted_caller};
use frame_support::assert_ok;
use frame_system::RawOrigin as SystemOrigin;
use primitives::Price;
use sp_runtime::{
    traits::{One, StaticLookup},
    FixedPointNumber,
};

const COLLATERAL: CurrencyId = 1000;
const BORROWED: CurrencyId = 1001;
const DECIMALS: u8 = 6;
const INITIAL_AMOUNT: Balance = 1_000_000_000_000;
const SEED: u32 = 0;

fn initial_set_up<T: Config>(who: &T::AccountId) {
    T::BenchmarkHelper::fund(who, COLLATERAL, INITIAL_AMOUNT);
    T::BenchmarkHelper::fund(who, BORROWED, INITIAL_AMOUNT);
}

fn set_up_pools<T: Config>() {
    for asset in [COLLATERAL, BORROWED] {
        T::BenchmarkHelper::set_price(asset, Price::one());
        assert_ok!(LendingPool::<T>::initialize_pool(
            SystemOrigin::Root.into(),
            asset,
            DECIMALS,
            1_000,
            7_500,
            200
        ));
    }
    let supplier: T::AccountId = account("supplier", 0, SEED);
    initial_set_up::<T>(&supplier);
    assert_ok!(LendingPool::<T>::deposit(
        SystemOrigin::Signed(supplier).into(),
        BORROWED,
        INITIAL_AMOUNT
    ));
}

fn set_up_borrow<T: Config>(borrower: &T::AccountId, collateral: Balance, borrowed: Balance) {
    initial_set_up::<T>(borrower);
    assert_ok!(LendingPool::<T>::deposit(
        SystemOrigin::Signed(borrower.clone()).into(),
        COLLATERAL,
        collateral
    ));
    assert_ok!(LendingPool::<T>::borrow(
        SystemOrigin::Signed(borrower.clone()).into(),
        BORROWED,
        borrowed
    ));
}

benchmarks! {
    initialize_pool {
        T::BenchmarkHelper::set_price(COLLATERAL, Price::one());
    }: _(SystemOrigin::Root, COLLATERAL, DECIMALS, 1_000, 7_500, 200)
    verify {
        assert!(Reserves::<T>::contains_key(COLLATERAL));
    }

    update_reserve_config {
        set_up_pools::<T>();
        let mut config = LendingPool::<T>::reserve(COLLATERAL)?.config;
        config.collateral_factor_bps = 5_000;
    }: _(SystemOrigin::Root, COLLATERAL, config)
    verify {
        assert_eq!(LendingPool::<T>::reserve(COLLATERAL)?.config.collateral_factor_bps, 5_000);
    }

    close_pool {
        T::BenchmarkHelper::set_price(COLLATERAL, Price::one());
        assert_ok!(LendingPool::<T>::initialize_pool(
            SystemOrigin::Root.into(),
            COLLATERAL,
            DECIMALS,
            1_000,
            7_500,
            200
        ));
    }: _(SystemOrigin::Root, COLLATERAL)
    verify {
        assert!(!Reserves::<T>::contains_key(COLLATERAL));
    }

    deposit {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        initial_set_up::<T>(&caller);
        let amount = 100_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), COLLATERAL, amount)
    verify {
        assert!(Positions::<T>::get(&caller).is_some());
    }

    withdraw {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        set_up_borrow::<T>(&caller, 200_000_000, 100_000_000);
        let amount = 50_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), COLLATERAL, amount)
    verify {
        let reserve = LendingPool::<T>::reserve(COLLATERAL)?;
        assert_eq!(reserve.available_liquidity, 150_000_000);
    }

    withdraw_all {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        set_up_borrow::<T>(&caller, 200_000_000, 100_000_000);
        assert_ok!(LendingPool::<T>::deposit(
            SystemOrigin::Signed(caller.clone()).into(),
            BORROWED,
            200_000_000
        ));
    }: _(SystemOrigin::Signed(caller.clone()), COLLATERAL)
    verify {
        let reserve = LendingPool::<T>::reserve(COLLATERAL)?;
        assert_eq!(reserve.available_liquidity, 0);
    }

    borrow {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        initial_set_up::<T>(&caller);
        assert_ok!(LendingPool::<T>::deposit(
            SystemOrigin::Signed(caller.clone()).into(),
            COLLATERAL,
            200_000_000
        ));
        let amount = 100_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), BORROWED, amount)
    verify {
        let reserve = LendingPool::<T>::reserve(BORROWED)?;
        assert_eq!(reserve.total_borrowed, amount);
    }

    repay {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        set_up_borrow::<T>(&caller, 200_000_000, 100_000_000);
        let borrower = T::Lookup::unlookup(caller.clone());
        let amount = 50_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), borrower, BORROWED, amount)
    verify {
        let reserve = LendingPool::<T>::reserve(BORROWED)?;
        assert_eq!(reserve.total_borrowed, 50_000_000);
    }

    repay_all {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        set_up_borrow::<T>(&caller, 200_000_000, 100_000_000);
        let borrower = T::Lookup::unlookup(caller.clone());
    }: _(SystemOrigin::Signed(caller.clone()), borrower, BORROWED)
    verify {
        let reserve = LendingPool::<T>::reserve(BORROWED)?;
        assert_eq!(reserve.total_borrowed, 0);
    }

    liquidate {
        set_up_pools::<T>();
        let borrower: T::AccountId = account("borrower", 0, SEED);
        set_up_borrow::<T>(&borrower, 200_000_000, 150_000_000);
        T::BenchmarkHelper::set_price(COLLATERAL, Price::saturating_from_rational(8, 10));
        let caller: T::AccountId = whitelisted_caller();
        initial_set_up::<T>(&caller);
        let amount = 75_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), borrower, BORROWED, COLLATERAL, amount)
    verify {
        assert!(Positions::<T>::get(&caller).is_some());
    }

    add_reserves {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        initial_set_up::<T>(&caller);
        let amount = 100_000_000;
    }: _(SystemOrigin::Signed(caller.clone()), BORROWED, amount)
    verify {
        assert_eq!(LendingPool::<T>::reserve(BORROWED)?.total_reserves, amount);
    }

    reduce_reserves {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        initial_set_up::<T>(&caller);
        let amount = 100_000_000;
        assert_ok!(LendingPool::<T>::add_reserves(
            SystemOrigin::Signed(caller.clone()).into(),
            BORROWED,
            amount
        ));
        let receiver = T::Lookup::unlookup(caller);
    }: _(SystemOrigin::Root, receiver, BORROWED, amount)
    verify {
        assert_eq!(LendingPool::<T>::reserve(BORROWED)?.total_reserves, 0);
    }

    accrue_interest {
        set_up_pools::<T>();
        let caller: T::AccountId = whitelisted_caller();
        set_up_borrow::<T>(&caller, 200_000_000, 100_000_000);
    }: {
        LendingPool::<T>::accrue_stored_reserve(BORROWED, LendingPool::<T>::now())?;
    }
    verify {
        assert!(Reserves::<T>::contains_key(BORROWED));
    }
}

impl_benchmark_test_suite!(
    LendingPool,
    crate::mock::ExtBuilder::default().build(),
    crate::mock::Test,
);
