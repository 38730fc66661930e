//! Temporal bracketing and blending of hourly fields.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use num_traits::Float;

/// Where a sample timestamp falls on the timestep axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBracket {
    /// The timestamp equals timestep `k`.
    Exact(usize),
    /// Strictly between timesteps `k` and `k + 1`, with the weight of the
    /// later one.
    Between { k: usize, weight: f64 },
}

impl TimeBracket {
    /// Bracket `dt` on a strictly increasing timestep axis.
    ///
    /// Returns `None` when `dt` is before the first or after the last
    /// timestep, or the axis is empty. Out-of-range times are never clamped.
    ///
    /// The weight is the elapsed fraction of the bracketing interval. For an
    /// hourly axis on the hour this is `minutes_past_hour(dt) / 60`.
    pub fn locate(timesteps: &[DateTime<Utc>], dt: &DateTime<Utc>) -> Option<Self> {
        match timesteps.binary_search(dt) {
            Ok(k) => Some(Self::Exact(k)),
            Err(0) => None,
            Err(pos) if pos >= timesteps.len() => None,
            Err(pos) => {
                let k = pos - 1;
                let elapsed = (*dt - timesteps[k]).num_milliseconds() as f64 / 60_000.0;
                let span = (timesteps[pos] - timesteps[k]).num_milliseconds() as f64 / 60_000.0;
                Some(Self::Between {
                    k,
                    weight: elapsed / span,
                })
            }
        }
    }

    /// Resolve the bracket against per-timestep fields.
    ///
    /// An exact bracket borrows the stored field untouched. Returns `None`
    /// if a referenced field does not exist.
    pub fn apply<'a, F>(&self, field: F) -> Option<Cow<'a, [f64]>>
    where
        F: Fn(usize) -> Option<&'a [f64]>,
    {
        match *self {
            Self::Exact(k) => field(k).map(Cow::Borrowed),
            Self::Between { k, weight } => {
                let previous = field(k)?;
                let next = field(k + 1)?;
                Some(Cow::Owned(blend_fields(previous, next, weight)))
            }
        }
    }
}

/// Linear blend `previous * (1 - weight) + next * weight`, elementwise.
///
/// Both fields must have the same length; extra elements of the longer one
/// are ignored.
pub fn blend_fields<T: Float>(previous: &[T], next: &[T], weight: T) -> Vec<T> {
    let keep = T::one() - weight;
    previous
        .iter()
        .zip(next)
        .map(|(&p, &n)| p * keep + n * weight)
        .collect()
}
