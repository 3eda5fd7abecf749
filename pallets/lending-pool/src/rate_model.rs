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

use crate::math::BPS;
use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};
use sp_runtime::RuntimeDebug;

/// Highest borrow APR a model may reach, 1000%.
pub const MAX_BORROW_RATE_BPS: u32 = 100_000;

pub trait InterestRateModelLike {
    /// Check the model for sanity
    fn check_model(&self) -> bool;

    /// Calculates the annual borrow rate, in basis points, at `utilization_bps`
    fn get_borrow_rate(&self, utilization_bps: u32) -> Option<u32>;
}

/// The jump interest rate model
///
/// All rates are annual and expressed in basis points.
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(
    Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, Default, TypeInfo, MaxEncodedLen,
)]
pub struct JumpModel {
    /// The borrow rate when utilization is 0
    pub base_rate_bps: u32,
    /// The borrow rate at the jump utilization point
    pub optimal_rate_bps: u32,
    /// The borrow rate when utilization is 100%
    pub max_rate_bps: u32,
    /// The utilization point at which the optimal rate is applied
    pub optimal_utilization_bps: u32,
}

impl JumpModel {
    /// Create a new rate model
    pub fn new_model(
        base_rate_bps: u32,
        optimal_rate_bps: u32,
        max_rate_bps: u32,
        optimal_utilization_bps: u32,
    ) -> JumpModel {
        Self {
            base_rate_bps,
            optimal_rate_bps,
            max_rate_bps,
            optimal_utilization_bps,
        }
    }

    /// Builds a model from a base rate and the slopes of the two segments.
    ///
    /// The resulting max rate is capped at `MAX_BORROW_RATE_BPS`.
    pub fn from_slopes(
        base_rate_bps: u32,
        optimal_utilization_bps: u32,
        optimal_slope_bps: u32,
        jump_slope_bps: u32,
    ) -> JumpModel {
        let max_rate_bps = base_rate_bps
            .saturating_add(optimal_slope_bps)
            .saturating_add(jump_slope_bps)
            .min(MAX_BORROW_RATE_BPS);
        let optimal_rate_bps = base_rate_bps
            .saturating_add(optimal_slope_bps)
            .min(max_rate_bps);

        Self::new_model(
            base_rate_bps,
            optimal_rate_bps,
            max_rate_bps,
            optimal_utilization_bps,
        )
    }

    /// Calculates the supply rate paid to depositors
    ///
    /// `borrow_rate * utilization * (1 - reserve_ratio)`, rounded down.
    pub fn get_supply_rate(
        borrow_rate_bps: u32,
        utilization_bps: u32,
        reserve_ratio_bps: u32,
    ) -> Option<u32> {
        let rate_to_pool = BPS.checked_sub(reserve_ratio_bps.into())?;
        let rate = u128::from(borrow_rate_bps)
            .checked_mul(utilization_bps.into())?
            .checked_mul(rate_to_pool)?
            / (BPS * BPS);

        rate.try_into().ok()
    }
}

impl InterestRateModelLike for JumpModel {
    fn check_model(&self) -> bool {
        if self.optimal_utilization_bps == 0 || u128::from(self.optimal_utilization_bps) > BPS {
            return false;
        }
        if self.base_rate_bps > self.optimal_rate_bps
            || self.optimal_rate_bps > self.max_rate_bps
            || self.max_rate_bps > MAX_BORROW_RATE_BPS
        {
            return false;
        }

        true
    }

    fn get_borrow_rate(&self, utilization_bps: u32) -> Option<u32> {
        let utilization = u128::from(utilization_bps).min(BPS);
        let optimal_utilization = u128::from(self.optimal_utilization_bps);

        let rate = if utilization <= optimal_utilization {
            // base_rate + (optimal_rate - base_rate) * utilization / optimal_utilization
            let slope = self.optimal_rate_bps.checked_sub(self.base_rate_bps)?;
            let climb = if optimal_utilization == 0 {
                0
            } else {
                u128::from(slope).checked_mul(utilization)? / optimal_utilization
            };
            u128::from(self.base_rate_bps).checked_add(climb)?
        } else {
            // optimal_rate + (max_rate - optimal_rate) * (utilization - optimal_utilization) / (1 - optimal_utilization)
            let slope = self.max_rate_bps.checked_sub(self.optimal_rate_bps)?;
            let excess_util = utilization - optimal_utilization;
            let climb =
                u128::from(slope).checked_mul(excess_util)? / (BPS - optimal_utilization);
            u128::from(self.optimal_rate_bps).checked_add(climb)?
        };

        u32::try_from(rate)
            .ok()
            .map(|rate| rate.min(self.max_rate_bps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> JumpModel {
        JumpModel::new_model(200, 1_000, 3_200, 8_000)
    }

    #[test]
    fn init_jump_model_works() {
        let jump_model = JumpModel::from_slopes(500, 8_000, 400, 7_500);
        assert_eq!(
            jump_model,
            JumpModel {
                base_rate_bps: 500,
                optimal_rate_bps: 900,
                max_rate_bps: 8_400,
                optimal_utilization_bps: 8_000,
            }
        );
        assert!(jump_model.check_model());
    }

    #[test]
    fn from_slopes_caps_max_rate() {
        let jump_model = JumpModel::from_slopes(10_000, 8_000, 50_000, 90_000);
        assert_eq!(jump_model.max_rate_bps, MAX_BORROW_RATE_BPS);
        assert_eq!(jump_model.optimal_rate_bps, 60_000);
        assert!(jump_model.check_model());
    }

    #[test]
    fn check_model_rejects_bad_params() {
        assert!(model().check_model());
        assert!(!JumpModel::new_model(200, 1_000, 3_200, 0).check_model());
        assert!(!JumpModel::new_model(200, 1_000, 3_200, 10_001).check_model());
        assert!(!JumpModel::new_model(1_100, 1_000, 3_200, 8_000).check_model());
        assert!(!JumpModel::new_model(200, 3_300, 3_200, 8_000).check_model());
        assert!(!JumpModel::new_model(200, 1_000, MAX_BORROW_RATE_BPS + 1, 8_000).check_model());
        assert!(JumpModel::new_model(200, 1_000, 3_200, 10_000).check_model());
    }

    #[test]
    fn get_borrow_rate_works() {
        let jump_model = model();

        assert_eq!(jump_model.get_borrow_rate(0), Some(200));
        // 200 + 800 * 4000 / 8000
        assert_eq!(jump_model.get_borrow_rate(4_000), Some(600));
        assert_eq!(jump_model.get_borrow_rate(8_000), Some(1_000));
        // 1000 + 2200 * 1000 / 2000
        assert_eq!(jump_model.get_borrow_rate(9_000), Some(2_100));
        assert_eq!(jump_model.get_borrow_rate(10_000), Some(3_200));
        // utilization above 100% is clamped
        assert_eq!(jump_model.get_borrow_rate(12_000), Some(3_200));
    }

    #[test]
    fn get_borrow_rate_rounds_down() {
        let jump_model = JumpModel::new_model(0, 1, 2, 3_000);
        assert_eq!(jump_model.get_borrow_rate(2_999), Some(0));
        assert_eq!(jump_model.get_borrow_rate(3_000), Some(1));
    }

    #[test]
    fn full_optimal_utilization_never_jumps() {
        let jump_model = JumpModel::new_model(200, 1_000, 3_200, 10_000);
        assert_eq!(jump_model.get_borrow_rate(10_000), Some(1_000));
    }

    #[test]
    fn borrow_rate_is_monotone_in_utilization() {
        let models = [
            model(),
            JumpModel::new_model(0, 0, 0, 5_000),
            JumpModel::new_model(0, 7, 100_000, 1),
            JumpModel::new_model(1_234, 5_678, 9_999, 9_999),
            JumpModel::from_slopes(500, 8_000, 400, 7_500),
        ];
        for jump_model in models {
            assert!(jump_model.check_model());
            let mut previous = 0;
            for utilization in 0..=10_000 {
                let rate = jump_model.get_borrow_rate(utilization).unwrap();
                assert!(rate >= previous, "{:?} at {}", jump_model, utilization);
                assert!(rate <= jump_model.max_rate_bps);
                previous = rate;
            }
        }
    }

    #[test]
    fn get_supply_rate_works() {
        // 750 * 0.5 * 0.9 = 337.5
        assert_eq!(JumpModel::get_supply_rate(750, 5_000, 1_000), Some(337));
        assert_eq!(JumpModel::get_supply_rate(750, 0, 1_000), Some(0));
        assert_eq!(JumpModel::get_supply_rate(750, 10_000, 0), Some(750));
        assert_eq!(JumpModel::get_supply_rate(750, 10_000, 10_001), None);
    }
}
