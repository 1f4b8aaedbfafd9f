use crate::clamp;

/// Full deflection of a simulator control axis event.
const AXIS_FULL_SCALE: f64 = 16384.0;

/// Control axis events delivered by the host simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    // Elevator Group
    ElevatorSet(i32), // AXIS_ELEVATOR_SET
    // Aileron Group
    AileronsSet(i32),     // AXIS_AILERONS_SET
    CenterAileronsRudder, // CENTER_AILER_RUDDER
    // Rudder group
    RudderSet(i32), // AXIS_RUDDER_SET
    RudderCenter,   // RUDDER_CENTER
}

/// Pilot input captured from the sidestick and rudder pedals.
#[derive(Debug, Default, Clone)]
pub struct Input {
    pub yoke_y: f64,     // -1 is full down, and +1 is full up
    pub yoke_x: f64,     // -1 is full left, and +1 is full right
    pub raw_yoke_y: f64, // yoke_y without the deadband
    pub rudder: f64,     // -1 is full left, and +1 is full right
    deadband: f64,
}

impl Input {
    /// `deadband` is the fraction of each sidestick axis around neutral that
    /// reads as exactly zero.
    pub fn new(deadband: f64) -> Self {
        Input {
            deadband: clamp(deadband, 0.0, 0.99),
            ..Default::default()
        }
    }

    pub fn handle(&mut self, event: InputEvent) {
        // scale from [-16384, 16384] to [-1,1] and reverse the sign
        let map = |n: i32| clamp(-(n as f64 / AXIS_FULL_SCALE), -1.0, 1.0);

        match event {
            InputEvent::ElevatorSet(n) => {
                self.raw_yoke_y = map(n);
                self.yoke_y = self.apply_deadband(self.raw_yoke_y);
            }
            InputEvent::AileronsSet(n) => {
                self.yoke_x = self.apply_deadband(map(n));
            }
            InputEvent::CenterAileronsRudder => {
                self.yoke_x = 0.0;
                self.rudder = 0.0;
            }
            InputEvent::RudderSet(n) => {
                self.rudder = map(n);
            }
            InputEvent::RudderCenter => {
                self.rudder = 0.0;
            }
        }
    }

    /// Sets both sidestick axes directly, as already-scaled values.
    pub fn set_sidestick(&mut self, yoke_x: f64, yoke_y: f64) {
        self.raw_yoke_y = clamp(yoke_y, -1.0, 1.0);
        self.yoke_y = self.apply_deadband(self.raw_yoke_y);
        self.yoke_x = self.apply_deadband(clamp(yoke_x, -1.0, 1.0));
    }

    fn apply_deadband(&self, value: f64) -> f64 {
        let magnitude = value.abs();
        if magnitude <= self.deadband {
            0.0
        } else {
            value.signum() * (magnitude - self.deadband) / (1.0 - self.deadband)
        }
    }

    pub fn sidestick_neutral(&self) -> bool {
        self.yoke_x == 0.0 && self.yoke_y == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_events_are_scaled_and_inverted() {
        let mut input = Input::default();
        input.handle(InputEvent::ElevatorSet(-16384));
        assert_eq!(input.yoke_y, 1.0);
        assert_eq!(input.raw_yoke_y, 1.0);
        input.handle(InputEvent::AileronsSet(8192));
        assert_eq!(input.yoke_x, -0.5);
        input.handle(InputEvent::RudderSet(16384));
        assert_eq!(input.rudder, -1.0);
    }

    #[test]
    fn out_of_range_events_are_clamped() {
        let mut input = Input::default();
        input.handle(InputEvent::ElevatorSet(40000));
        assert_eq!(input.yoke_y, -1.0);
    }

    #[test]
    fn center_events_zero_their_axes() {
        let mut input = Input::default();
        input.handle(InputEvent::AileronsSet(1000));
        input.handle(InputEvent::RudderSet(1000));
        input.handle(InputEvent::ElevatorSet(1000));
        input.handle(InputEvent::CenterAileronsRudder);
        assert_eq!(input.yoke_x, 0.0);
        assert_eq!(input.rudder, 0.0);
        assert!(input.yoke_y != 0.0);

        input.handle(InputEvent::RudderSet(1000));
        input.handle(InputEvent::RudderCenter);
        assert_eq!(input.rudder, 0.0);
    }

    #[test]
    fn deadband_zeroes_small_deflections_but_not_raw_pitch() {
        let mut input = Input::new(0.1);
        input.set_sidestick(0.05, -0.08);
        assert!(input.sidestick_neutral());
        assert_eq!(input.raw_yoke_y, -0.08);

        input.set_sidestick(1.0, -0.55);
        assert_eq!(input.yoke_x, 1.0);
        assert!((input.yoke_y + 0.5).abs() < 1e-12);
    }
}
