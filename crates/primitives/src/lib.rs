//! Shared numeric primitives for the Glow impact engine.
//!
//! Every monetary amount in the engine is an unsigned integer in one of two
//! fixed-point units:
//!
//! - **GLW-wei**: 18 decimals, `1_000_000_000_000_000_000` = 1 GLW
//! - **scaled6**: 6 decimals, `1_000_000` = 1.0 (points, multipliers, split
//!   percentages)
//!
//! All division floors. Products that may exceed `u128` go through a 256-bit
//! intermediate in [`mul_div`].
//!
//! The [`week`] module carries protocol week math anchored on the genesis
//! timestamp.

#![warn(missing_docs)]

pub mod fixed;
pub mod week;

pub use fixed::{
    add_points, apply_multiplier_scaled6, clamp_to_zero, format_points_scaled6, format_scaled6,
    glw_wei_to_points_scaled6, mul_div, parse_points_scaled6, ParseError, GLW_DECIMALS,
    MULTIPLIER_SCALE, POINTS_SCALE, SPLIT_SCALE,
};
pub use week::{
    current_week, last_completed_week, week_end_timestamp, week_from_claim_nonce,
    week_of_timestamp, week_start_timestamp, Clock, ManualClock, RangeError, SystemClock, Week,
    WeekRange, FIRST_V2_WEEK, GENESIS_TIMESTAMP, SECONDS_PER_WEEK,
};
