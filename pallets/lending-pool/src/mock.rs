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

use super::*;

use frame_support::{
    assert_ok, construct_runtime, parameter_types,
    storage::unhashed,
    traits::{ConstU32, Everything},
};
use frame_system::EnsureRoot;
use primitives::{tokens, Moment, Price, PriceDetail};
use sp_core::H256;
use sp_runtime::{
    testing::Header,
    traits::{BlakeTwo256, IdentityLookup, One},
    ArithmeticError, FixedPointNumber,
};
use std::{cell::RefCell, collections::HashMap};

type UncheckedExtrinsic = frame_system::mocking::MockUncheckedExtrinsic<Test>;
type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
    pub enum Test where
        Block = Block,
        NodeBlock = Block,
        UncheckedExtrinsic = UncheckedExtrinsic,
    {
        System: frame_system::{Pallet, Call, Config, Storage, Event<T>},
        TimestampPallet: pallet_timestamp::{Pallet, Call, Storage, Inherent},
        LendingPool: crate::{Pallet, Call, Storage, Event<T>},
    }
);

pub type AccountId = u128;
pub type BlockNumber = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const DAVE: AccountId = 4;
/// Holds every token the pool has in custody
pub const POOL_ACCOUNT: AccountId = 1_000;

pub const USDC: CurrencyId = tokens::USDC;
pub const USDT: CurrencyId = tokens::USDT;
pub const SOL: CurrencyId = tokens::SOL;
pub const BTC: CurrencyId = tokens::BTC;

/// Unix time, in seconds, of the first block
pub const START_TIME: Timestamp = 1_640_995_200;

parameter_types! {
    pub const BlockHashCount: u64 = 250;
    pub const SS58Prefix: u8 = 42;
}

impl frame_system::Config for Test {
    type BaseCallFilter = Everything;
    type BlockWeights = ();
    type BlockLength = ();
    type DbWeight = ();
    type RuntimeOrigin = RuntimeOrigin;
    type RuntimeCall = RuntimeCall;
    type Index = u64;
    type BlockNumber = BlockNumber;
    type Hash = H256;
    type Hashing = BlakeTwo256;
    type AccountId = AccountId;
    type Lookup = IdentityLookup<Self::AccountId>;
    type Header = Header;
    type RuntimeEvent = RuntimeEvent;
    type BlockHashCount = BlockHashCount;
    type Version = ();
    type PalletInfo = PalletInfo;
    type AccountData = ();
    type OnNewAccount = ();
    type OnKilledAccount = ();
    type SystemWeightInfo = ();
    type SS58Prefix = SS58Prefix;
    type OnSetCode = ();
    type MaxConsumers = ConstU32<16>;
}

parameter_types! {
    pub const MinimumPeriod: Moment = 5;
}

impl pallet_timestamp::Config for Test {
    type Moment = Moment;
    type OnTimestampSet = ();
    type MinimumPeriod = MinimumPeriod;
    type WeightInfo = ();
}

thread_local! {
    static PRICES: RefCell<HashMap<CurrencyId, Price>> = RefCell::new(HashMap::new());
    static OBSERVED_AT: RefCell<HashMap<CurrencyId, Timestamp>> = RefCell::new(HashMap::new());
}

/// Prices are observed "now" unless pinned with `set_price_at`.
pub struct MockPriceFeeder;

impl MockPriceFeeder {
    pub fn set_price(asset_id: CurrencyId, price: Price) {
        PRICES.with(|prices| prices.borrow_mut().insert(asset_id, price));
        OBSERVED_AT.with(|observed_at| observed_at.borrow_mut().remove(&asset_id));
    }

    pub fn set_price_at(asset_id: CurrencyId, price: Price, observed_at: Timestamp) {
        PRICES.with(|prices| prices.borrow_mut().insert(asset_id, price));
        OBSERVED_AT.with(|times| times.borrow_mut().insert(asset_id, observed_at));
    }

    pub fn remove_price(asset_id: CurrencyId) {
        PRICES.with(|prices| prices.borrow_mut().remove(&asset_id));
    }

    pub fn reset() {
        PRICES.with(|prices| prices.borrow_mut().clear());
        OBSERVED_AT.with(|times| times.borrow_mut().clear());
        Self::set_price(USDC, Price::one());
        Self::set_price(USDT, Price::one());
        Self::set_price(SOL, Price::saturating_from_integer(100));
        Self::set_price(BTC, Price::saturating_from_integer(20_000));
    }
}

impl PriceFeeder for MockPriceFeeder {
    fn get_price(asset_id: &CurrencyId) -> Option<PriceDetail> {
        let price = PRICES.with(|prices| prices.borrow().get(asset_id).copied())?;
        let observed_at = OBSERVED_AT
            .with(|times| times.borrow().get(asset_id).copied())
            .unwrap_or_else(LendingPool::now);
        Some((price, observed_at))
    }
}

/// A token ledger kept in plain storage, so it is rolled back together with
/// the pallet's own writes when an extrinsic fails.
pub struct MockCustody;

impl MockCustody {
    fn key(asset: CurrencyId, who: &AccountId) -> Vec<u8> {
        (b"mock/custody", asset, who).encode()
    }

    pub fn balance(asset: CurrencyId, who: &AccountId) -> Balance {
        unhashed::get_or_default(&Self::key(asset, who))
    }

    pub fn set_balance(asset: CurrencyId, who: &AccountId, amount: Balance) {
        unhashed::put(&Self::key(asset, who), &amount);
    }

    fn transfer(
        asset: CurrencyId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> DispatchResult {
        let from_balance = Self::balance(asset, from)
            .checked_sub(amount)
            .ok_or(DispatchError::Other("InsufficientBalance"))?;
        let to_balance = Self::balance(asset, to)
            .checked_add(amount)
            .ok_or(ArithmeticError::Overflow)?;
        Self::set_balance(asset, from, from_balance);
        Self::set_balance(asset, to, to_balance);
        Ok(())
    }
}

impl TokenCustody<AccountId> for MockCustody {
    fn transfer_in(payer: &AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult {
        Self::transfer(asset, payer, &POOL_ACCOUNT, amount)
    }

    fn transfer_out(recipient: &AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult {
        Self::transfer(asset, &POOL_ACCOUNT, recipient, amount)
    }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl BenchmarkHelper<AccountId> for MockBenchmarkHelper {
    fn fund(who: &AccountId, asset: CurrencyId, amount: Balance) {
        MockCustody::set_balance(asset, who, amount);
    }

    fn set_price(asset: CurrencyId, price: Price) {
        MockPriceFeeder::set_price(asset, price);
    }
}

parameter_types! {
    pub const MaxPriceStaleness: Timestamp = 60;
    pub const DefaultCloseFactorBps: u16 = 5_000;
    pub const DefaultLiquidationBonusBps: u16 = 500;
    pub const OptimalUtilizationBps: u32 = 8_000;
    pub const OptimalRateSlopeBps: u32 = 400;
    pub const JumpRateSlopeBps: u32 = 7_500;
    pub const MaxPositionEntries: u32 = 4;
}

impl Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type PriceFeeder = MockPriceFeeder;
    type Custody = MockCustody;
    type PoolAuthority = EnsureRoot<AccountId>;
    type UnixTime = TimestampPallet;
    type MaxPriceStaleness = MaxPriceStaleness;
    type DefaultCloseFactorBps = DefaultCloseFactorBps;
    type DefaultLiquidationBonusBps = DefaultLiquidationBonusBps;
    type OptimalUtilizationBps = OptimalUtilizationBps;
    type OptimalRateSlopeBps = OptimalRateSlopeBps;
    type JumpRateSlopeBps = JumpRateSlopeBps;
    type MaxPositionEntries = MaxPositionEntries;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = MockBenchmarkHelper;
}

pub const fn usdc(amount: Balance) -> Balance {
    amount * 1_000_000
}

pub const fn usdt(amount: Balance) -> Balance {
    amount * 1_000_000
}

pub const fn sol(amount: Balance) -> Balance {
    amount * 1_000_000_000
}

pub const fn btc(amount: Balance) -> Balance {
    amount * 100_000_000
}

/// Moves the clock forward by `seconds`.
pub fn advance_time(seconds: Timestamp) {
    TimestampPallet::set_timestamp(TimestampPallet::get() + seconds * 1_000);
}

/// Starts the next block, running the accrual hook.
pub fn next_block() {
    let block_number = System::block_number() + 1;
    System::set_block_number(block_number);
    LendingPool::on_initialize(block_number);
}

pub fn pool_balance(asset: CurrencyId) -> Balance {
    MockCustody::balance(asset, &POOL_ACCOUNT)
}

/// (asset, decimals, reserve_ratio_bps, collateral_factor_bps, base_rate_bps)
pub const POOLS: [(CurrencyId, u8, u16, u16, u16); 4] = [
    (USDC, 6, 1_000, 7_500, 500),
    (USDT, 6, 1_000, 7_500, 500),
    (SOL, 9, 1_500, 6_500, 200),
    (BTC, 8, 2_000, 7_000, 200),
];

pub struct ExtBuilder {
    with_pools: bool,
}

impl Default for ExtBuilder {
    fn default() -> Self {
        Self { with_pools: true }
    }
}

impl ExtBuilder {
    pub fn without_pools(mut self) -> Self {
        self.with_pools = false;
        self
    }

    pub fn build(self) -> sp_io::TestExternalities {
        let t = frame_system::GenesisConfig::default()
            .build_storage::<Test>()
            .unwrap();

        let mut ext = sp_io::TestExternalities::new(t);
        ext.execute_with(|| {
            System::set_block_number(1);
            TimestampPallet::set_timestamp(START_TIME * 1_000);
            MockPriceFeeder::reset();

            for who in [ALICE, BOB, CHARLIE, DAVE] {
                MockCustody::set_balance(USDC, &who, usdc(1_000_000));
                MockCustody::set_balance(USDT, &who, usdt(1_000_000));
                MockCustody::set_balance(SOL, &who, sol(10_000));
                MockCustody::set_balance(BTC, &who, btc(100));
            }

            if self.with_pools {
                for (asset, decimals, reserve_ratio, collateral_factor, base_rate) in POOLS {
                    assert_ok!(LendingPool::initialize_pool(
                        RuntimeOrigin::root(),
                        asset,
                        decimals,
                        reserve_ratio,
                        collateral_factor,
                        base_rate,
                    ));
                }
            }
        });
        ext
    }
}
