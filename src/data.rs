use crate::sim_time::SimTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of frames kept in the rolling history.
pub const DATA_FRAME_HISTORY_LENGTH: usize = 50;

/// Something that can be asked for simulation variables by name.
///
/// A value that cannot be sampled is reported as NaN; the caller substitutes
/// its own fallback.
pub trait SensorSource {
    fn read(&mut self, name: &str, units: &str, index: u32) -> f64;
}

/// In-memory [`SensorSource`] keyed by variable name and index. Units are not
/// checked. Missing variables read as NaN.
#[derive(Debug, Default, Clone)]
pub struct SimVarTable {
    values: HashMap<(String, u32), f64>,
}

impl SimVarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64) -> &mut Self {
        self.set_indexed(name, 0, value)
    }

    pub fn set_indexed(&mut self, name: &str, index: u32, value: f64) -> &mut Self {
        self.values.insert((name.to_owned(), index), value);
        self
    }
}

impl SensorSource for SimVarTable {
    fn read(&mut self, name: &str, _units: &str, index: u32) -> f64 {
        self.values
            .get(&(name.to_owned(), index))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

fn unbounded() -> f64 {
    f64::MAX
}

/// One sample of aircraft state. Field order is the recorder's column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    pub aileron: f64,         // Aileron input deflection (-1.0 full left, +1.0 full right)
    pub altitude: f64,        // The altitude in feet
    pub aoa: f64,             // The angle of attack in degrees
    #[serde(skip)]
    pub autopilot: bool,      // True if the autopilot is on
    pub cg_lateral: f64,      // The lateral CG as a percent of the reference chord
    pub cg_longitudinal: f64, // The longitudinal CG as a percent of the reference chord
    pub density: f64,         // The density of the air in slugs per cubic feet
    pub elevator: f64,        // Elevator input deflection (-1.0 full down, +1.0 full up)
    pub elevator_trim: f64,   // Elevator trim in degrees (+13.5 full up, -4.0 full down)
    pub engine_thrust_1: f64, // Engine #1 thrust in pounds
    pub engine_thrust_2: f64, // Engine #2 thrust in pounds
    pub flaps: u8, // The current position of the flaps handle (0 = Clean CONF, 4 = CONF FULL)
    pub gforce: f64, // The current gforce (load factor)
    pub ias: f64,  // The indicated airspeed in knots
    pub mach: f64, // The current speed in mach
    #[serde(skip, default = "unbounded")]
    pub mmo: f64, // The Mmo speed in mach
    #[serde(skip)]
    pub on_ground: bool, // True if the plane is on the ground
    pub pitch: f64, // Pitch attitude in degrees (+ is up, - is down)
    pub radio_height: f64, // Radio altimeter in feet
    pub roll: f64, // Roll attitude in degrees (+ is right, - is left)
    pub rudder: f64, // Rudder input deflection (-1.0 full left, +1.0 full right)
    #[serde(skip)]
    pub sim_controllable: bool, // True if the sim might be controllable
    pub speed_lateral: f64, // Lateral speed (relative to the earth in a north/south direction) in feet/second
    pub speed_longitudinal: f64, // Longitudinal speed (relative to the earth in an east/west direction) in feet/second
    pub speed_vertical: f64,     // Vertical speed (relative to the earth) in feet/second
    pub tas: f64,                // The true airspeed in knots
    pub time: f64,               // The simulation time
    #[serde(skip, default = "unbounded")]
    pub vmo: f64, // The Vmo speed in knots
    pub weight: f64, // Total weight of the airplane in pounds
    pub wind_lateral: f64, // Lateral wind (relative to the earth in a north/south direction) in feet/second
    pub wind_longitudinal: f64, // Longitudinal wind (relative to the earth in a east/west direction) in feet/second
    pub wind_vertical: f64,     // Vertical wind (relative to the earth) in feet/second
}

impl Default for DataFrame {
    fn default() -> Self {
        DataFrame {
            aileron: 0.0,
            altitude: 0.0,
            aoa: 0.0,
            autopilot: false,
            cg_lateral: 0.0,
            cg_longitudinal: 0.0,
            density: 0.0,
            elevator: 0.0,
            elevator_trim: 0.0,
            engine_thrust_1: 0.0,
            engine_thrust_2: 0.0,
            flaps: 0,
            gforce: 0.0,
            ias: 0.0,
            mach: 0.0,
            mmo: f64::MAX,
            on_ground: true,
            pitch: 0.0,
            radio_height: 0.0,
            roll: 0.0,
            rudder: 0.0,
            sim_controllable: false,
            speed_lateral: 0.0,
            speed_longitudinal: 0.0,
            speed_vertical: 0.0,
            tas: 0.0,
            time: 0.0,
            vmo: f64::MAX,
            weight: 0.0,
            wind_lateral: 0.0,
            wind_longitudinal: 0.0,
            wind_vertical: 0.0,
        }
    }
}

impl DataFrame {
    /// Samples every field from `source`, substituting a fallback for
    /// anything the source cannot supply.
    pub fn sample<S: SensorSource + ?Sized>(source: &mut S, time: f64) -> DataFrame {
        let mut fetch = |name: &str, units: &str, index: u32, fallback: f64| {
            let r = source.read(name, units, index);
            if r.is_finite() {
                r
            } else {
                fallback
            }
        };

        DataFrame {
            aileron: fetch("AILERON POSITION", "Position", 0, 0.0),
            altitude: fetch("PLANE ALTITUDE", "Feet", 0, 0.0),
            aoa: fetch("INCIDENCE ALPHA", "Degrees", 0, 0.0),
            autopilot: fetch("AUTOPILOT MASTER", "Bool", 0, 0.0) != 0.0,
            cg_lateral: fetch("CG PERCENT LATERAL", "Percent", 0, 0.0),
            cg_longitudinal: fetch("CG PERCENT", "Percent", 0, 0.0),
            density: fetch("AMBIENT DENSITY", "Slugs per cubic feet", 0, 0.0),
            elevator: fetch("ELEVATOR POSITION", "Position", 0, 0.0),
            elevator_trim: fetch("ELEVATOR TRIM POSITION", "Degrees", 0, 0.0),
            engine_thrust_1: fetch("TURB ENG JET THRUST", "Pounds", 1, 0.0),
            engine_thrust_2: fetch("TURB ENG JET THRUST", "Pounds", 2, 0.0),
            flaps: fetch("FLAPS HANDLE INDEX", "Number", 0, 0.0) as u8,
            gforce: fetch("G FORCE", "GForce", 0, 0.0),
            ias: fetch("AIRSPEED INDICATED", "Knots", 0, 0.0),
            mach: fetch("AIRSPEED MACH", "Mach", 0, 0.0),
            // TODO: Get this data from the FCOM instead of the SimVar
            mmo: fetch("BARBER POLE MACH", "Mach", 0, f64::MAX),
            on_ground: fetch("SIM ON GROUND", "Bool", 0, 0.0) != 0.0,
            pitch: -fetch("PLANE PITCH DEGREES", "Degrees", 0, 0.0),
            radio_height: fetch("RADIO HEIGHT", "Feet", 0, 0.0),
            roll: -fetch("PLANE BANK DEGREES", "Degrees", 0, 0.0),
            rudder: fetch("RUDDER POSITION", "Position", 0, 0.0),
            sim_controllable: fetch("IS LATITUDE LONGITUDE FREEZE ON", "Bool", 0, 0.0) == 0.0
                && fetch("IS ALTITUDE FREEZE ON", "Bool", 0, 0.0) == 0.0
                && fetch("IS ATTITUDE FREEZE ON", "Bool", 0, 0.0) == 0.0
                && fetch("SIM DISABLED", "Bool", 0, 0.0) == 0.0
                && fetch("IS SLEW ACTIVE", "Bool", 0, 0.0) == 0.0,
            speed_lateral: fetch("VELOCITY WORLD Z", "Feet per second", 0, 0.0),
            speed_longitudinal: fetch("VELOCITY WORLD X", "Feet per second", 0, 0.0),
            speed_vertical: fetch("VELOCITY WORLD Y", "Feet per second", 0, 0.0),
            tas: fetch("AIRSPEED TRUE", "Knots", 0, 0.0),
            time,
            // TODO: Get this data from the FCOM instead of the SimVar
            vmo: fetch("AIRSPEED BARBER POLE", "Knots", 0, f64::MAX),
            weight: fetch("TOTAL WEIGHT", "Pounds", 0, 0.0),
            wind_lateral: fetch("AMBIENT WIND Z", "Feet per second", 0, 0.0),
            wind_longitudinal: fetch("AMBIENT WIND X", "Feet per second", 0, 0.0),
            wind_vertical: fetch("AMBIENT WIND Y", "Feet per second", 0, 0.0),
        }
    }

    /// Vertical flight path angle in degrees, relative to the ground.
    pub fn vertical_flight_path_angle(&self) -> f64 {
        let horizontal_speed = self.speed_lateral.hypot(self.speed_longitudinal);
        let vertical_speed = self.speed_vertical;
        if horizontal_speed == 0.0 {
            return if vertical_speed < 0.0 {
                -90.0 // Straight down
            } else if vertical_speed > 0.0 {
                90.0 // Straight up
            } else {
                0.0 // Neutral
            };
        }
        (vertical_speed / horizontal_speed).atan().to_degrees()
    }
}

/// Rolling history of [`DataFrame`]s, oldest first.
#[derive(Debug, Clone)]
pub struct Data {
    initialized: bool,
    frames: Vec<DataFrame>,
}

impl Default for Data {
    fn default() -> Data {
        Data {
            initialized: false,
            frames: vec![DataFrame::default(); DATA_FRAME_HISTORY_LENGTH],
        }
    }
}

impl Data {
    pub fn update<S: SensorSource + ?Sized>(&mut self, source: &mut S, sim_time: &SimTime) {
        let frame = DataFrame::sample(source, sim_time.current());
        self.push(frame);
    }

    /// Shifts the history left by one and stores `frame` as the newest sample.
    pub fn push(&mut self, frame: DataFrame) {
        self.frames.rotate_left(1);
        self.frames[DATA_FRAME_HISTORY_LENGTH - 1] = frame;

        // If we've only ever seen a single data point, copy that to all data points
        if !self.initialized {
            self.frames.iter_mut().for_each(|f| *f = frame);
            self.initialized = true;
        }
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn frames(&self) -> &[DataFrame] {
        &self.frames
    }

    pub fn current_frame(&self) -> &DataFrame {
        &self.frames[DATA_FRAME_HISTORY_LENGTH - 1]
    }

    pub fn previous_frame(&self) -> &DataFrame {
        &self.frames[DATA_FRAME_HISTORY_LENGTH - 2]
    }

    /// Seconds between the two newest samples.
    fn frame_delta(&self) -> f64 {
        self.current_frame().time - self.previous_frame().time
    }

    fn rate(&self, current: f64, previous: f64) -> f64 {
        let dt = self.frame_delta();
        if dt > 0.0 {
            (current - previous) / dt
        } else {
            0.0
        }
    }

    pub fn alpha(&self) -> f64 {
        self.current_frame().aoa
    }

    pub fn alpha_floor(&self) -> f64 {
        // These values are hardcoded in the FCOM in 1.27.20 under "High Angle of Attack Protection"
        // Note: 2. a.floor is activated through A/THR system when:
        // - a > a floor (9.5 degrees in configuration 0; 15 degrees in configuration 1, 2; 14 degrees in
        //   configuration 3; 13 degrees in configuration FULL), or,...
        match self.current_frame().flaps {
            0 => 9.5,
            1 | 2 => 15.0,
            3 => 14.0,
            4 => 13.0,
            _ => 9.5,
        }
    }

    pub fn alpha_prot(&self) -> f64 {
        // This ratio was estimated using the graph in the FCOM in 1.27.20 under "High Angle of Attack Protection"
        // The graph plots CL (lift coefficient) to alpha.
        const RATIO_WITH_ALPHA_FLOOR: f64 = 19.0 / 21.0;
        RATIO_WITH_ALPHA_FLOOR * self.alpha_floor()
    }

    pub fn alpha_max(&self) -> f64 {
        // Estimated from the same graph as alpha prot
        const RATIO_WITH_ALPHA_FLOOR: f64 = 7.0 / 6.0;
        RATIO_WITH_ALPHA_FLOOR * self.alpha_floor()
    }

    pub fn autopilot(&self) -> bool {
        self.current_frame().autopilot
    }

    pub fn flaps(&self) -> u8 {
        self.current_frame().flaps
    }

    pub fn gforce(&self) -> f64 {
        self.current_frame().gforce
    }

    pub fn ias(&self) -> f64 {
        self.current_frame().ias
    }

    pub fn mach(&self) -> f64 {
        self.current_frame().mach
    }

    pub fn mmo(&self) -> f64 {
        self.current_frame().mmo
    }

    pub fn on_ground(&self) -> bool {
        self.current_frame().on_ground
    }

    pub fn pitch(&self) -> f64 {
        self.current_frame().pitch
    }

    /// Degrees per second.
    pub fn pitch_rate(&self) -> f64 {
        self.rate(self.current_frame().pitch, self.previous_frame().pitch)
    }

    pub fn radio_height(&self) -> f64 {
        self.current_frame().radio_height
    }

    pub fn roll(&self) -> f64 {
        self.current_frame().roll
    }

    pub fn sim_controllable(&self) -> bool {
        self.current_frame().sim_controllable
    }

    pub fn vfpa(&self) -> f64 {
        self.current_frame().vertical_flight_path_angle()
    }

    pub fn vfpa_rate(&self) -> f64 {
        self.rate(
            self.current_frame().vertical_flight_path_angle(),
            self.previous_frame().vertical_flight_path_angle(),
        )
    }

    pub fn vmo(&self) -> f64 {
        self.current_frame().vmo
    }
}
