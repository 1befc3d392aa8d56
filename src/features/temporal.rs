//! Cyclical calendar encodings: the wrap from Sunday back to Monday stays adjacent.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const DAYS_PER_WEEK: f64 = 7.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// (sin, cos) of `value` mapped onto a circle with period `period`.
pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let theta = 2.0 * PI * value / period;
    (theta.sin(), theta.cos())
}

/// Angle in [0, 2π) recovered from an encoded pair.
pub fn angle(sin: f64, cos: f64) -> f64 {
    sin.atan2(cos).rem_euclid(2.0 * PI)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub dow_sin: f64,
    pub dow_cos: f64,
    pub doy_sin: f64,
    pub doy_cos: f64,
}

impl TemporalFeatures {
    /// Monday = 0 for day-of-week, 1 January = 1 for day-of-year.
    pub fn from_date(date: NaiveDate) -> Self {
        let dow = date.weekday().num_days_from_monday() as f64;
        let doy = date.ordinal() as f64;
        let (dow_sin, dow_cos) = cyclical(dow, DAYS_PER_WEEK);
        let (doy_sin, doy_cos) = cyclical(doy, DAYS_PER_YEAR);
        Self {
            dow_sin,
            dow_cos,
            doy_sin,
            doy_cos,
        }
    }
}
