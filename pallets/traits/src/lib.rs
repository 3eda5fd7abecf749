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

#![cfg_attr(not(feature = "std"), no_std)]

use frame_support::dispatch::DispatchResult;
use primitives::{Balance, CurrencyId};

/// Moves tokens between user accounts and the custody of the lending pool.
///
/// Both directions are all-or-nothing: either the full `amount` moves or an
/// error is returned and no balance changes.
pub trait TokenCustody<AccountId> {
    /// Pull `amount` of `asset` from `payer` into the pool.
    fn transfer_in(payer: &AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult;

    /// Pay `amount` of `asset` out of the pool to `recipient`.
    fn transfer_out(recipient: &AccountId, asset: CurrencyId, amount: Balance) -> DispatchResult;
}
