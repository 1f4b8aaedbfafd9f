//! Pitch axis of the A320 fly-by-wire normal law.
//!
//! Sidestick input and aircraft state go in, a commanded elevator position
//! comes out. Pitch control laws are described in the A320 FCOM 1.27.20.
//!
//! Each control cycle runs, in order: time, data history, flight data
//! recorder, pitch control mode, normal law protections, control surfaces.
//! See [`fbw::FBW`].

pub mod config;
pub mod controls;
pub mod data;
pub mod error;
pub mod fbw;
pub mod input;
pub mod pid;
pub mod pitch_control;
pub mod pitch_controller;
pub mod protections;
pub mod recorder;
pub mod sim_time;

pub use config::FbwConfig;
pub use error::{Error, Result};
pub use fbw::FBW;

pub(crate) fn clamp(x: f64, min: f64, max: f64) -> f64 {
    debug_assert!(min <= max);
    x.max(min).min(max)
}

/// Maps a `[0, 1]` coefficient onto `[min, max]`.
pub fn linear_range(coefficient: f64, min: f64, max: f64) -> f64 {
    (max - min) * coefficient + min
}

/// Goes linearly from 0 at `from` to 1 at `to`, clamped outside that range.
///
/// `from` may lie on either side of `to`. An empty range gives 0.
pub fn linear_decay_coefficient(value: f64, from: f64, to: f64) -> f64 {
    if from == to {
        return 0.0;
    }
    clamp((value - from) / (to - from), 0.0, 1.0)
}
