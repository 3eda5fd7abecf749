// This file is part of Substrate.

// Copyright (C) 2021 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(clippy::all)]

use frame_support::{
    traits::Get,
    weights::{constants::RocksDbWeight, Weight},
};
use sp_std::marker::PhantomData;

/// Weight functions needed for pallet_lending_pool.
pub trait WeightInfo {
    fn initialize_pool() -> Weight;
    fn update_reserve_config() -> Weight;
    fn close_pool() -> Weight;
    fn deposit() -> Weight;
    fn withdraw() -> Weight;
    fn withdraw_all() -> Weight;
    fn borrow() -> Weight;
    fn repay() -> Weight;
    fn repay_all() -> Weight;
    fn liquidate() -> Weight;
    fn add_reserves() -> Weight;
    fn reduce_reserves() -> Weight;
    fn accrue_interest() -> Weight;
}

/// Weights for pallet_lending_pool using the Substrate node and recommended hardware.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
    fn initialize_pool() -> Weight {
        Weight::from_ref_time(23_540_000 as u64)
            .saturating_add(T::DbWeight::get().reads(1 as u64))
            .saturating_add(T::DbWeight::get().writes(1 as u64))
    }
    fn update_reserve_config() -> Weight {
        Weight::from_ref_time(26_310_000 as u64)
            .saturating_add(T::DbWeight::get().reads(1 as u64))
            .saturating_add(T::DbWeight::get().writes(1 as u64))
    }
    fn close_pool() -> Weight {
        Weight::from_ref_time(21_870_000 as u64)
            .saturating_add(T::DbWeight::get().reads(1 as u64))
            .saturating_add(T::DbWeight::get().writes(1 as u64))
    }
    fn deposit() -> Weight {
        Weight::from_ref_time(58_920_000 as u64)
            .saturating_add(T::DbWeight::get().reads(4 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn withdraw() -> Weight {
        Weight::from_ref_time(97_140_000 as u64)
            .saturating_add(T::DbWeight::get().reads(7 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn withdraw_all() -> Weight {
        Weight::from_ref_time(101_660_000 as u64)
            .saturating_add(T::DbWeight::get().reads(8 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn borrow() -> Weight {
        Weight::from_ref_time(104_250_000 as u64)
            .saturating_add(T::DbWeight::get().reads(8 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn repay() -> Weight {
        Weight::from_ref_time(61_380_000 as u64)
            .saturating_add(T::DbWeight::get().reads(4 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn repay_all() -> Weight {
        Weight::from_ref_time(62_030_000 as u64)
            .saturating_add(T::DbWeight::get().reads(4 as u64))
            .saturating_add(T::DbWeight::get().writes(4 as u64))
    }
    fn liquidate() -> Weight {
        Weight::from_ref_time(168_720_000 as u64)
            .saturating_add(T::DbWeight::get().reads(11 as u64))
            .saturating_add(T::DbWeight::get().writes(6 as u64))
    }
    fn add_reserves() -> Weight {
        Weight::from_ref_time(49_800_000 as u64)
            .saturating_add(T::DbWeight::get().reads(3 as u64))
            .saturating_add(T::DbWeight::get().writes(3 as u64))
    }
    fn reduce_reserves() -> Weight {
        Weight::from_ref_time(50_410_000 as u64)
            .saturating_add(T::DbWeight::get().reads(3 as u64))
            .saturating_add(T::DbWeight::get().writes(3 as u64))
    }
    fn accrue_interest() -> Weight {
        Weight::from_ref_time(14_120_000 as u64)
            .saturating_add(T::DbWeight::get().reads(1 as u64))
            .saturating_add(T::DbWeight::get().writes(1 as u64))
    }
}

// For backwards compatibility and tests
impl WeightInfo for () {
    fn initialize_pool() -> Weight {
        Weight::from_ref_time(23_540_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(1 as u64))
            .saturating_add(RocksDbWeight::get().writes(1 as u64))
    }
    fn update_reserve_config() -> Weight {
        Weight::from_ref_time(26_310_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(1 as u64))
            .saturating_add(RocksDbWeight::get().writes(1 as u64))
    }
    fn close_pool() -> Weight {
        Weight::from_ref_time(21_870_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(1 as u64))
            .saturating_add(RocksDbWeight::get().writes(1 as u64))
    }
    fn deposit() -> Weight {
        Weight::from_ref_time(58_920_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(4 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn withdraw() -> Weight {
        Weight::from_ref_time(97_140_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(7 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn withdraw_all() -> Weight {
        Weight::from_ref_time(101_660_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(8 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn borrow() -> Weight {
        Weight::from_ref_time(104_250_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(8 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn repay() -> Weight {
        Weight::from_ref_time(61_380_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(4 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn repay_all() -> Weight {
        Weight::from_ref_time(62_030_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(4 as u64))
            .saturating_add(RocksDbWeight::get().writes(4 as u64))
    }
    fn liquidate() -> Weight {
        Weight::from_ref_time(168_720_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(11 as u64))
            .saturating_add(RocksDbWeight::get().writes(6 as u64))
    }
    fn add_reserves() -> Weight {
        Weight::from_ref_time(49_800_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(3 as u64))
            .saturating_add(RocksDbWeight::get().writes(3 as u64))
    }
    fn reduce_reserves() -> Weight {
        Weight::from_ref_time(50_410_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(3 as u64))
            .saturating_add(RocksDbWeight::get().writes(3 as u64))
    }
    fn accrue_interest() -> Weight {
        Weight::from_ref_time(14_120_000 as u64)
            .saturating_add(RocksDbWeight::get().reads(1 as u64))
            .saturating_add(RocksDbWeight::get().writes(1 as u64))
    }
}
