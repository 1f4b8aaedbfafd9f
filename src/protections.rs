use crate::{data::Data, input::Input};
use tracing::{debug, info};

/// Flight envelope limits consumed by the pitch laws.
pub trait EnvelopeLimits {
    fn aoa_demand_active(&self) -> bool;
    fn high_speed_protection_active(&self) -> bool;
    fn nominal_bank_angle(&self) -> f64;
    fn min_load_factor(&self) -> f64;
    fn max_load_factor(&self) -> f64;
    fn min_pitch_angle(&self) -> f64;
    fn max_pitch_angle(&self) -> f64;
}

#[derive(Debug, Default, Clone)]
pub struct NormalLawProtections {
    pub aoa_demand_active: bool,
    pub aoa_demand_deactivation_timer: f64,
    pub high_speed_protection_active: bool,
    pub nominal_bank_angle: f64,
    pub min_load_factor: f64,
    pub max_load_factor: f64,
    pub min_pitch_angle: f64,
    pub max_pitch_angle: f64,
}

impl NormalLawProtections {
    // Spiral static stability in degrees
    // - Normally: 33 degrees
    // - High Angle of Attack Protection: 0 degrees
    // - High Speed Protection: 0 degrees
    const NOMINAL_BANK_ANGLE_NORMAL: f64 = 33.0;
    const NOMINAL_BANK_ANGLE_PROTECTED: f64 = 0.0;

    // -1g for clean configuration, 0g for other configurations
    const MIN_LOAD_FACTOR_NORMAL: f64 = -1.0;
    const MIN_LOAD_FACTOR_PROTECTED: f64 = 0.0;
    // 2.5g for clean configuration, 2g for other configurations
    const MAX_LOAD_FACTOR_NORMAL: f64 = 2.5;
    const MAX_LOAD_FACTOR_PROTECTED: f64 = 2.0;

    // Maximum pitch attitude in degrees
    // 30 degrees nose up in conf 0-3 (progressively reduced to 25 degrees at low speed)
    // 25 degrees nose up in conf FULL (progressively reduced to 20 degrees at low speed)
    // TODO: To implement the 'progressively reduced' limitation, we need to find a way to
    //       calculate speeds like V_alpha_prot or V_alpha_max.
    const MAX_PITCH_ANGLE_NORMAL: f64 = 30.0;
    const MAX_PITCH_ANGLE_PROTECTED: f64 = 25.0;

    // Minimum pitch attitude in degrees
    const MIN_PITCH_ANGLE_NORMAL: f64 = -15.0;

    pub fn update(&mut self, data: &Data, input: &Input, dt: f64) {
        // Check if we are in AoA demand mode (as dictated by the High Angle of Attack Protection)
        if self.aoa_demand_active {
            // Exit condition 1: Sidestick must be pushed more than 8 degrees forward (assuming this is ~50% down)
            let condition1 = input.yoke_y < -0.5;
            // Exit condition 2: Sidestick must be pushed more than 0.5 degrees forward for at least 0.5 seconds when alpha < alpha_max
            let condition2 = self.aoa_demand_deactivation_timer >= 0.5;
            if condition1 || condition2 {
                self.aoa_demand_active = false;
                self.aoa_demand_deactivation_timer = 0.0;
                info!(alpha = data.alpha(), "AoA demand deactivated");
            } else if input.yoke_y < 0.0 && data.alpha() < data.alpha_max() {
                // We're still building the target duration to meet condition 2
                self.aoa_demand_deactivation_timer += dt;
            } else {
                self.aoa_demand_deactivation_timer = 0.0;
            }
        } else {
            // Enter condition 1: Sidestick must not be pushed down, and AoA is greater than alpha_prot
            let condition1 = input.yoke_y >= 0.0 && data.alpha() > data.alpha_prot();
            // Enter condition 2: We are at or above alpha max
            let condition2 = data.alpha() >= data.alpha_max();
            if condition1 || condition2 {
                self.aoa_demand_active = true;
                self.aoa_demand_deactivation_timer = 0.0;
                info!(
                    alpha = data.alpha(),
                    alpha_prot = data.alpha_prot(),
                    alpha_max = data.alpha_max(),
                    "AoA demand activated"
                );
            }
        }

        let high_speed = data.ias() > data.vmo() || data.mach() > data.mmo();
        if high_speed != self.high_speed_protection_active {
            info!(
                ias = data.ias(),
                mach = data.mach(),
                active = high_speed,
                "high speed protection changed"
            );
        }
        self.high_speed_protection_active = high_speed;

        // Update the bank angle beyond which a released stick drops to 1g
        if self.aoa_demand_active || self.high_speed_protection_active {
            self.nominal_bank_angle = Self::NOMINAL_BANK_ANGLE_PROTECTED;
        } else {
            self.nominal_bank_angle = Self::NOMINAL_BANK_ANGLE_NORMAL;
        }

        // Update load and pitch factors
        self.min_pitch_angle = Self::MIN_PITCH_ANGLE_NORMAL;
        match data.flaps() {
            0 => {
                self.min_load_factor = Self::MIN_LOAD_FACTOR_NORMAL;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_NORMAL;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE_NORMAL;
            }
            1 | 2 | 3 => {
                self.min_load_factor = Self::MIN_LOAD_FACTOR_PROTECTED;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_PROTECTED;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE_NORMAL;
            }
            flaps => {
                if flaps != 4 {
                    debug!(flaps, "unknown flaps configuration, using CONF FULL limits");
                }
                self.min_load_factor = Self::MIN_LOAD_FACTOR_PROTECTED;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_PROTECTED;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE_PROTECTED;
            }
        };
    }
}

impl EnvelopeLimits for NormalLawProtections {
    fn aoa_demand_active(&self) -> bool {
        self.aoa_demand_active
    }

    fn high_speed_protection_active(&self) -> bool {
        self.high_speed_protection_active
    }

    fn nominal_bank_angle(&self) -> f64 {
        self.nominal_bank_angle
    }

    fn min_load_factor(&self) -> f64 {
        self.min_load_factor
    }

    fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    fn min_pitch_angle(&self) -> f64 {
        self.min_pitch_angle
    }

    fn max_pitch_angle(&self) -> f64 {
        self.max_pitch_angle
    }
}
