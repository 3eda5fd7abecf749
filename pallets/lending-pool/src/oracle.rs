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
use sp_runtime::traits::Zero;

impl<T: Config> Pallet<T> {
    /// Latest price of `asset`.
    ///
    /// Missing and zero prices are not ready; prices observed more than
    /// `MaxPriceStaleness` seconds ago are stale. Prices stamped in the
    /// future count as fresh.
    pub fn get_price(asset: CurrencyId) -> Result<PriceQuote, DispatchError> {
        let (value, observed_at) =
            T::PriceFeeder::get_price(&asset).ok_or(Error::<T>::PriceOracleNotReady)?;
        if value.is_zero() {
            log::error!(target: LOG_TARGET, "Price of asset {:?} is zero", asset);
            return Err(Error::<T>::PriceOracleNotReady.into());
        }

        let now = Self::now();
        if now.saturating_sub(observed_at) > T::MaxPriceStaleness::get() {
            log::warn!(
                target: LOG_TARGET,
                "Price of asset {:?} observed at {:?} is stale at {:?}",
                asset,
                observed_at,
                now
            );
            return Err(Error::<T>::StalePrice.into());
        }

        Ok(PriceQuote {
            asset,
            value,
            observed_at,
        })
    }
}
