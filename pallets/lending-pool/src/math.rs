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

//! Integer helpers with explicit rounding.
//!
//! Every product is computed over 256 bits so that `amount * index` style
//! expressions never overflow before the division brings them back into range.

use sp_core::U256;

/// Basis points in one whole.
pub const BPS: u128 = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Down,
    Up,
}

/// Computes `a * b / c`.
///
/// Returns `None` when `c` is zero or the result does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, c: u128, rounding: Rounding) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let product = U256::from(a).checked_mul(U256::from(b))?;
    let (quotient, remainder) = product.div_mod(U256::from(c));
    let quotient = match rounding {
        Rounding::Up if !remainder.is_zero() => quotient.checked_add(U256::one())?,
        _ => quotient,
    };
    if quotient > U256::from(u128::MAX) {
        return None;
    }

    Some(quotient.low_u128())
}

/// Scales `amount` by `bps / 10000`.
pub fn apply_bps(amount: u128, bps: u128, rounding: Rounding) -> Option<u128> {
    mul_div(amount, bps, BPS, rounding)
}

/// `10^decimals`, the number of base units in one whole token.
pub fn unit(decimals: u8) -> Option<u128> {
    10u128.checked_pow(decimals.into())
}
