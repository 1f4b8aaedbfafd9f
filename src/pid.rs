use crate::clamp;
use serde::{Deserialize, Serialize};

/// Output clamp and gains of a single control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub output_min: f64,
    pub output_max: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(output_min: f64, output_max: f64, kp: f64, ki: f64, kd: f64) -> Self {
        PidGains {
            output_min,
            output_max,
            kp,
            ki,
            kd,
        }
    }
}

/// PID controller with a clamped output and conditional integration.
///
/// The integral accumulator holds `ki * error * dt` summed over time. An
/// increment is dropped whenever the unclamped output is already past a limit
/// in the direction the increment would push it.
#[derive(Debug, Clone)]
pub struct AntiWindupPIDController {
    output_min: f64,
    output_max: f64,
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    last_error: Option<f64>,
    last_output: f64,
}

impl AntiWindupPIDController {
    pub fn new(
        output_min: f64,
        output_max: f64,
        kp: f64,
        ki: f64,
        kd: f64,
    ) -> AntiWindupPIDController {
        AntiWindupPIDController {
            output_min,
            output_max,
            kp,
            ki,
            kd,
            integral: 0.0,
            last_error: None,
            last_output: 0.0,
        }
    }

    pub fn from_gains(gains: &PidGains) -> AntiWindupPIDController {
        Self::new(
            gains.output_min,
            gains.output_max,
            gains.kp,
            gains.ki,
            gains.kd,
        )
    }

    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        // A degenerate time step holds the previous command
        if !(dt > 0.0) {
            return self.last_output;
        }

        // Proportional term
        let p = self.kp * error;

        // Integral term
        let increment = self.ki * error * dt;
        let integral = self.integral + increment;

        // Derivative term
        let d = match self.last_error {
            Some(last_error) => self.kd * (error - last_error) / dt,
            None => 0.0,
        };

        let unclamped = p + integral + d;
        let winding_up = (unclamped > self.output_max && increment > 0.0)
            || (unclamped < self.output_min && increment < 0.0);
        if !winding_up {
            self.integral = integral;
        }

        let output = clamp(unclamped, self.output_min, self.output_max);

        // Save terms
        self.last_output = output;
        self.last_error = Some(error);

        output
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pure_proportional() {
        let mut pid = AntiWindupPIDController::new(-10.0, 10.0, 2.0, 0.0, 0.0);
        assert!((pid.update(1.5, 0.1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_is_zero_on_first_call() {
        let mut pid = AntiWindupPIDController::new(-100.0, 100.0, 0.0, 0.0, 1.0);
        assert_eq!(pid.update(5.0, 0.1), 0.0);
        // (6 - 5) / 0.1 = 10
        assert!((pid.update(6.0, 0.1) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn integral_accumulates_scaled_error() {
        let mut pid = AntiWindupPIDController::new(-100.0, 100.0, 0.0, 2.0, 0.0);
        for _ in 0..10 {
            pid.update(1.0, 0.5);
        }
        // 10 * 2 * 1 * 0.5
        assert!((pid.integral() - 10.0).abs() < 1e-9);
        assert!((pid.last_output() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn integral_stops_while_saturated() {
        let mut pid = AntiWindupPIDController::new(-1.0, 1.0, 0.0, 1.0, 0.0);
        for _ in 0..100 {
            pid.update(1.0, 0.1);
        }
        assert_eq!(pid.last_output(), 1.0);
        assert!(pid.integral() <= 1.0);

        // Reversing the error unwinds immediately
        let out = pid.update(-1.0, 0.1);
        assert!(out < 1.0);
    }

    #[test]
    fn increment_against_saturation_is_committed() {
        let mut pid = AntiWindupPIDController::new(-1.0, 1.0, 10.0, 1.0, 1.0);
        // Saturated low and pushing lower: dropped
        assert_eq!(pid.update(-5.0, 0.1), -1.0);
        assert_eq!(pid.integral(), 0.0);
        // Derivative kick saturates high while the increment is negative: kept
        assert_eq!(pid.update(-0.1, 0.1), 1.0);
        assert!((pid.integral() + 0.01).abs() < 1e-12);
    }

    #[test]
    fn degenerate_time_step_holds_previous_output() {
        let mut pid = AntiWindupPIDController::new(-2.0, 2.0, 0.01, 0.015, 0.0025);
        let out = pid.update(3.0, 0.05);
        let integral = pid.integral();
        assert_eq!(pid.update(100.0, 0.0), out);
        assert_eq!(pid.update(-100.0, -1.0), out);
        assert_eq!(pid.update(-100.0, f64::NAN), out);
        assert_eq!(pid.integral(), integral);
    }

    proptest! {
        #[test]
        fn constant_error_is_monotonic_and_bounded(
            min in -10.0f64..0.0,
            span in 0.0f64..20.0,
            kp in 0.0f64..5.0,
            ki in 0.0f64..5.0,
            kd in 0.0f64..5.0,
            error in 0.001f64..10.0,
            dt in 0.001f64..1.0,
            steps in 1usize..200,
        ) {
            let max = min + span;
            let mut pid = AntiWindupPIDController::new(min, max, kp, ki, kd);
            let mut previous = f64::NEG_INFINITY;
            for _ in 0..steps {
                let out = pid.update(error, dt);
                prop_assert!(out >= previous - 1e-12);
                prop_assert!(out <= max);
                previous = out;
            }
        }

        #[test]
        fn non_positive_time_steps_never_change_output(
            errors in proptest::collection::vec(-100.0f64..100.0, 1..50),
            dts in proptest::collection::vec(-1.0f64..=0.0, 1..50),
        ) {
            let mut pid = AntiWindupPIDController::new(-2.0, 2.0, 0.008, 0.008, 0.001);
            let held = pid.update(0.7, 0.05);
            for (error, dt) in errors.iter().zip(dts.iter()) {
                prop_assert_eq!(pid.update(*error, *dt), held);
            }
        }
    }
}
