//! Pitch normal law.
//!
//! Selects a demand law from the pitch control mode and protection state,
//! turns it into an elevator movement, then runs that movement through the
//! envelope protections. Each protection either passes the proposed movement
//! through or replaces it, and later protections assume earlier ones have
//! already run.

use crate::{
    clamp,
    data::Data,
    input::Input,
    linear_decay_coefficient, linear_range,
    pid::{AntiWindupPIDController, PidGains},
    pitch_control::{PitchControl, PitchControlMode},
    protections::EnvelopeLimits,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Seconds of pitch hold, with the sidestick released, before holding the flight path angle.
const PITCH_HOLD_TIME: f64 = 5.0;
/// Flare pitch rate at full sidestick deflection, in degrees/second.
const FLARE_MAX_PITCH_RATE: f64 = 5.0;
/// Radio height below which the flare law starts lowering the nose.
const FLARE_NOSE_DOWN_HEIGHT: f64 = 30.0;

/// Gains of the four pitch control loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchGains {
    /// AoA error -> elevator handle movement rate
    pub aoa: PidGains,
    /// GForce error -> elevator handle movement rate
    pub load_factor: PidGains,
    /// Vertical FPA error -> elevator handle movement rate
    pub vertical_fpa: PidGains,
    /// Pitch rate error -> elevator handle movement rate
    pub pitch_rate: PidGains,
}

impl Default for PitchGains {
    fn default() -> Self {
        PitchGains {
            aoa: PidGains::new(-2.0, 2.0, 0.002, 0.0, 0.0002),
            load_factor: PidGains::new(-2.0, 2.0, 0.008, 0.008, 0.001),
            vertical_fpa: PidGains::new(-2.0, 2.0, 0.0015, 0.0020, 0.002),
            pitch_rate: PidGains::new(-2.0, 2.0, 0.01, 0.015, 0.0025),
        }
    }
}

/// Everything the pitch law reads during one cycle.
#[derive(Clone, Copy)]
pub struct PitchLawContext<'a> {
    pub data: &'a Data,
    pub input: &'a Input,
    pub limits: &'a dyn EnvelopeLimits,
    pub pitch_control: &'a PitchControl,
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct PitchController {
    aoa_controller: AntiWindupPIDController,
    gforce_controller: AntiWindupPIDController,
    vertical_fpa_controller: AntiWindupPIDController,
    pitch_rate_controller: AntiWindupPIDController,

    held_pitch_time: f64,
    held_vertical_fpa: f64,
}

impl Default for PitchController {
    fn default() -> Self {
        PitchController::new(&PitchGains::default())
    }
}

impl PitchController {
    pub fn new(gains: &PitchGains) -> Self {
        PitchController {
            aoa_controller: AntiWindupPIDController::from_gains(&gains.aoa),
            gforce_controller: AntiWindupPIDController::from_gains(&gains.load_factor),
            vertical_fpa_controller: AntiWindupPIDController::from_gains(&gains.vertical_fpa),
            pitch_rate_controller: AntiWindupPIDController::from_gains(&gains.pitch_rate),
            held_pitch_time: 0.0,
            held_vertical_fpa: 0.0,
        }
    }

    pub fn held_pitch_time(&self) -> f64 {
        self.held_pitch_time
    }

    pub fn held_vertical_fpa(&self) -> f64 {
        self.held_vertical_fpa
    }

    /// Returns the elevator position for this cycle given the current one.
    pub fn calculate(&mut self, elevator: f64, ctx: &PitchLawContext) -> f64 {
        // On the ground, pitch is direct
        // TODO: Add ground mode calculations (e.g. when aircraft reaches 70 knots during the T/O roll, maximum deflection of elevators is affected)
        if ctx.pitch_control.mode() == PitchControlMode::Ground {
            return clamp(ctx.input.raw_yoke_y, -1.0, 1.0);
        }

        // Nothing to integrate over; hold the surface where it is
        if !(ctx.dt > 0.0) {
            return clamp(elevator, -1.0, 1.0);
        }

        let delta_elevator = if ctx.limits.aoa_demand_active() {
            // AoA protections are available in both flight/flare modes
            self.angle_of_attack_demand(ctx)
        } else if ctx.pitch_control.flare_effect() > 0.0 {
            // Flare mode has a special effect and does not have all the protections of flight mode
            self.flare_mode_demand(ctx)
        } else {
            self.load_factor_demand(ctx)
        };

        let new_elevator = clamp(elevator + delta_elevator, -1.0, 1.0);
        trace!(
            pitch = ctx.data.pitch(),
            pitch_rate = ctx.data.pitch_rate(),
            vfpa = ctx.data.vfpa(),
            vfpa_rate = ctx.data.vfpa_rate(),
            gforce = ctx.data.gforce(),
            delta_elevator = new_elevator - elevator,
            elevator = new_elevator,
            "pitch law"
        );
        new_elevator
    }

    // Applies rules assuming sidestick demands angle of attack
    fn angle_of_attack_demand(&mut self, ctx: &PitchLawContext) -> f64 {
        let data = ctx.data;
        let yoke_y = ctx.input.yoke_y;
        self.held_pitch_time = 0.0;
        self.held_vertical_fpa = 0.0;

        let commanded_aoa = if yoke_y >= 0.0 {
            // Neutral -> Full Up = AoA proportional range from alpha_prot -> alpha_max
            linear_range(yoke_y, data.alpha_prot(), data.alpha_max())
        } else {
            // Neutral -> Full Down = AoA proportional range from alpha_prot -> 0 AoA
            linear_range(-yoke_y, data.alpha_prot(), 0.0)
        };

        let error = commanded_aoa - data.alpha();
        let mut delta_elevator = self.aoa_controller.update(error, ctx.dt);
        trace!(alpha = data.alpha(), commanded_aoa, error, "AoA demand");

        // Apply protections
        delta_elevator = self.load_factor_limitation(delta_elevator, ctx);
        // This isn't specified in the FCOM, but the flight model is not true enough to real life
        delta_elevator = self.pitch_attitude_protection(delta_elevator, ctx);

        delta_elevator
    }

    // Applies rules assuming sidestick demands load factor
    fn load_factor_demand(&mut self, ctx: &PitchLawContext) -> f64 {
        let data = ctx.data;
        let input = ctx.input;
        let dt = ctx.dt;

        let delta_elevator = if input.sidestick_neutral() {
            // Neutral x and y = Hold FPA
            if self.held_pitch_time < PITCH_HOLD_TIME {
                // Hold the current pitch for 5 seconds to allow VFPA to stabilize
                self.held_vertical_fpa = data.vfpa();
                self.held_pitch_time += dt;
                trace!(held_pitch_time = self.held_pitch_time, "hold pitch");
                self.pitch_rate_controller.update(0.0 - data.pitch_rate(), dt)
            } else {
                trace!(held_vertical_fpa = self.held_vertical_fpa, "hold VFPA");
                self.vertical_fpa_controller
                    .update(self.held_vertical_fpa - data.vfpa(), dt)
            }
        } else if input.yoke_y == 0.0 && data.roll().abs() > ctx.limits.nominal_bank_angle() {
            // Neutral y, but we're rolling beyond the nominal bank angle = Drop pitch to 1G LF
            self.held_pitch_time = 0.0;
            self.held_vertical_fpa = 0.0;
            trace!(roll = data.roll(), "roll 1G");
            self.gforce_controller.update(1.0 - data.gforce(), dt)
        } else if input.yoke_y == 0.0 {
            // Neutral y, and bank angle within the nominal bank angle = Hold pitch
            self.held_pitch_time = 0.0;
            self.held_vertical_fpa = 0.0;
            trace!("hold pitch");
            self.pitch_rate_controller.update(0.0 - data.pitch_rate(), dt)
        } else {
            self.held_pitch_time = 0.0;
            self.held_vertical_fpa = 0.0;

            // Determine the normal load factor for our bank angle
            let normal_load_factor = 1.0 / data.roll().to_radians().cos();

            // Determine the user's requested load factor
            let requested_load_factor = if input.yoke_y >= 0.0 {
                linear_range(
                    input.yoke_y,
                    normal_load_factor,
                    ctx.limits.max_load_factor(),
                )
            } else {
                linear_range(
                    -input.yoke_y,
                    normal_load_factor,
                    ctx.limits.min_load_factor(),
                )
            };

            let error = requested_load_factor - data.gforce();
            trace!(normal_load_factor, requested_load_factor, error, "commanded load factor");
            self.gforce_controller.update(error, dt)
        };

        // Apply protections
        let delta_elevator = self.high_speed_protection(delta_elevator, ctx);
        let delta_elevator = self.load_factor_limitation(delta_elevator, ctx);
        self.pitch_attitude_protection(delta_elevator, ctx)
    }

    // Let's make the sidestick action at flare mode just a pitch rate mode for simplicity's sake
    fn flare_mode_demand(&mut self, ctx: &PitchLawContext) -> f64 {
        let data = ctx.data;
        let mut pitch_rate = FLARE_MAX_PITCH_RATE * ctx.input.yoke_y;
        if data.radio_height() <= FLARE_NOSE_DOWN_HEIGHT {
            // "As the aircraft descends through 30 feet, the system begins to reduce the pitch attitude,
            // reducing it to 2 degrees nose down over a period of 8 seconds. This means that it takes
            // gentle nose-up action by the pilot to flare the aircraft."
            pitch_rate += (-2.0 - data.pitch()) / 8.0;
        }

        trace!(
            desired_pitch_rate = pitch_rate,
            radio_height = data.radio_height(),
            "flare"
        );
        self.pitch_rate_controller
            .update(pitch_rate - data.pitch_rate(), ctx.dt)
    }

    // Applies load factor limitation protection to a proposed elevator movement
    fn load_factor_limitation(&mut self, delta_elevator: f64, ctx: &PitchLawContext) -> f64 {
        let gforce = ctx.data.gforce();
        let limit = if gforce > ctx.limits.max_load_factor() {
            ctx.limits.max_load_factor()
        } else if gforce < ctx.limits.min_load_factor() {
            ctx.limits.min_load_factor()
        } else {
            return delta_elevator;
        };

        let new_delta_elevator = self.gforce_controller.update(limit - gforce, ctx.dt);
        debug!(
            gforce,
            limit,
            pre = delta_elevator,
            post = new_delta_elevator,
            "load factor limitation"
        );
        new_delta_elevator
    }

    // Applies high speed protection to a proposed elevator movement
    fn high_speed_protection(&mut self, delta_elevator: f64, ctx: &PitchLawContext) -> f64 {
        if !ctx.limits.high_speed_protection_active() {
            return delta_elevator;
        }
        let data = ctx.data;
        self.held_pitch_time = 0.0;
        self.held_vertical_fpa = 0.0;

        // Recovery pitch rate ramps from 0 at Vmo + 16, Mmo + 0.024
        // up to 5 degrees/second by Vmo - 1, Mmo - 0.0015
        let recovery_pitch_rate_knots =
            5.0 * linear_decay_coefficient(data.ias(), data.vmo() + 16.0, data.vmo() - 1.0);
        let recovery_pitch_rate_mach =
            5.0 * linear_decay_coefficient(data.mach(), data.mmo() + 0.024, data.mmo() - 0.0015);
        let recovery_pitch_rate = recovery_pitch_rate_knots.max(recovery_pitch_rate_mach);

        let new_delta_elevator = self
            .pitch_rate_controller
            .update(recovery_pitch_rate - data.pitch_rate(), ctx.dt);
        debug!(
            ias = data.ias(),
            mach = data.mach(),
            recovery_pitch_rate,
            pre = delta_elevator,
            post = new_delta_elevator,
            "high speed protection"
        );
        new_delta_elevator
    }

    // Applies pitch attitude protection to a proposed elevator movement
    fn pitch_attitude_protection(&mut self, delta_elevator: f64, ctx: &PitchLawContext) -> f64 {
        let pitch = ctx.data.pitch();
        let pitch_rate = ctx.data.pitch_rate();
        let max_pitch_angle = ctx.limits.max_pitch_angle();
        let min_pitch_angle = ctx.limits.min_pitch_angle();

        let target_pitch_rate = if pitch > max_pitch_angle {
            // Correct using -5 degrees/second pitch rate at the limit, fading out by 1 degree above it
            -5.0 * linear_decay_coefficient(pitch, max_pitch_angle + 1.0, max_pitch_angle)
        } else if pitch < min_pitch_angle {
            5.0 * linear_decay_coefficient(pitch, min_pitch_angle - 1.0, min_pitch_angle)
        } else {
            // Naturally limit the pitch up/down rate from +/-30 degree/sec to 0 as we approach our limits
            let max_pitch_rate = 30.0 * linear_decay_coefficient(pitch, max_pitch_angle, 0.0);
            let min_pitch_rate = -30.0 * linear_decay_coefficient(pitch, min_pitch_angle, 0.0);
            if pitch_rate > max_pitch_rate && delta_elevator >= 0.0 {
                max_pitch_rate
            } else if pitch_rate < min_pitch_rate && delta_elevator <= 0.0 {
                min_pitch_rate
            } else {
                return delta_elevator;
            }
        };

        let new_delta_elevator = self
            .pitch_rate_controller
            .update(target_pitch_rate - pitch_rate, ctx.dt);
        debug!(
            pitch,
            pitch_rate,
            target_pitch_rate,
            pre = delta_elevator,
            post = new_delta_elevator,
            "pitch attitude protection"
        );
        new_delta_elevator
    }
}
