use crate::{clamp, data::Data};
use tracing::debug;

// Pitch control laws are described in the A320 FCOM 1.27.20
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchControlMode {
    Ground,
    Flight,
    Flare,
}

/// Ground/flight/flare mode with continuous blend weights between them.
///
/// Weights are clamped to `[0, 1]` individually and never renormalized, so
/// their sum can briefly differ from 1 while more than one blend is running.
#[derive(Debug, Clone)]
pub struct PitchControl {
    mode: PitchControlMode,
    ground_effect: f64,
    flight_effect: f64,
    flare_effect: f64,
    saved_flare_pitch_attitude: f64, // The pitch attitude of the airplane at 50 feet RA
}

impl Default for PitchControl {
    fn default() -> Self {
        PitchControl {
            mode: PitchControlMode::Ground,
            ground_effect: 1.0,
            flight_effect: 0.0,
            flare_effect: 0.0,
            saved_flare_pitch_attitude: 0.0,
        }
    }
}

/// Radio height separating flight from flare, in feet.
const FLARE_HEIGHT: f64 = 50.0;
/// Seconds to blend ground mode in or out.
const GROUND_BLEND_TIME: f64 = 5.0;
/// Seconds to blend flare mode in or out.
const FLARE_BLEND_TIME: f64 = 1.0;

fn blend_effect(blend_in: &mut f64, blend_out: &mut f64, increment: f64) {
    *blend_in = clamp(*blend_in + increment, 0.0, 1.0);
    *blend_out = clamp(*blend_out - increment, 0.0, 1.0);
}

impl PitchControl {
    pub fn update(&mut self, data: &Data, dt: f64) {
        // TODO: Handle other laws, these transitions are only valid for normal law
        let previous = self.mode;
        match self.mode {
            PitchControlMode::Ground => self.handle_ground_transitions(data, dt),
            PitchControlMode::Flight => self.handle_flight_transitions(data, dt),
            PitchControlMode::Flare => self.handle_flare_transitions(data, dt),
        }
        if self.mode != previous {
            debug!(from = ?previous, to = ?self.mode, "pitch control mode changed");
        }
    }

    fn handle_ground_transitions(&mut self, data: &Data, dt: f64) {
        let in_flight = !data.on_ground();
        if data.radio_height() > FLARE_HEIGHT || (in_flight && data.pitch() > 8.0) {
            blend_effect(
                &mut self.flight_effect,
                &mut self.ground_effect,
                dt / GROUND_BLEND_TIME,
            );
            if self.flight_effect == 1.0 {
                self.mode = PitchControlMode::Flight;
            }
        } else {
            blend_effect(
                &mut self.ground_effect,
                &mut self.flight_effect,
                dt / GROUND_BLEND_TIME,
            );
        }
    }

    fn handle_flight_transitions(&mut self, data: &Data, dt: f64) {
        if data.radio_height() <= FLARE_HEIGHT {
            if self.flare_effect == 0.0 {
                // "The system memorizes the attitude at 50 feet, and that attitude becomes the
                // initial reference for pitch attitude control."
                self.saved_flare_pitch_attitude = data.pitch();
            }
            blend_effect(
                &mut self.flare_effect,
                &mut self.flight_effect,
                dt / FLARE_BLEND_TIME,
            );
            if self.flare_effect == 1.0 {
                self.mode = PitchControlMode::Flare;
            }
        } else {
            blend_effect(
                &mut self.flight_effect,
                &mut self.flare_effect,
                dt / FLARE_BLEND_TIME,
            );
        }
    }

    fn handle_flare_transitions(&mut self, data: &Data, dt: f64) {
        if data.radio_height() > FLARE_HEIGHT {
            // Flare to flight
            blend_effect(
                &mut self.flight_effect,
                &mut self.flare_effect,
                dt / FLARE_BLEND_TIME,
            );
            if self.flight_effect == 1.0 {
                self.mode = PitchControlMode::Flight;
            }
        } else if data.on_ground() && data.pitch() < 2.5 {
            // Flare to ground
            blend_effect(
                &mut self.ground_effect,
                &mut self.flare_effect,
                dt / GROUND_BLEND_TIME,
            );
            if self.ground_effect == 1.0 {
                self.mode = PitchControlMode::Ground;
                self.saved_flare_pitch_attitude = 0.0;
            }
        } else {
            if self.ground_effect > 0.0 {
                blend_effect(
                    &mut self.flare_effect,
                    &mut self.ground_effect,
                    dt / GROUND_BLEND_TIME,
                );
            }
            if self.flight_effect > 0.0 {
                blend_effect(
                    &mut self.flare_effect,
                    &mut self.flight_effect,
                    dt / FLARE_BLEND_TIME,
                );
            }
        }
    }

    pub fn mode(&self) -> PitchControlMode {
        self.mode
    }

    pub fn ground_effect(&self) -> f64 {
        self.ground_effect
    }

    pub fn flight_effect(&self) -> f64 {
        self.flight_effect
    }

    pub fn flare_effect(&self) -> f64 {
        self.flare_effect
    }

    pub fn saved_flare_pitch_attitude(&self) -> f64 {
        self.saved_flare_pitch_attitude
    }
}
