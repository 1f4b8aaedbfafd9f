use crate::{
    data::Data,
    input::Input,
    pitch_control::PitchControl,
    pitch_controller::{PitchController, PitchGains, PitchLawContext},
    protections::EnvelopeLimits,
    Result,
};

/// Commanded control surface positions, each in `[-1, 1]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ControlSurfaces {
    pub elevator: f64, // "ELEVATOR POSITION"
    pub ailerons: f64, // "AILERON POSITION"
    pub rudder: f64,   // "RUDDER POSITION"
}

/// Receives the surface commands at the end of every control cycle.
pub trait ActuatorSink {
    fn set_surfaces(&mut self, surfaces: &ControlSurfaces) -> Result<()>;
}

impl ActuatorSink for ControlSurfaces {
    fn set_surfaces(&mut self, surfaces: &ControlSurfaces) -> Result<()> {
        *self = *surfaces;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Controls {
    surfaces: ControlSurfaces,
    pitch_controller: PitchController,
}

impl Controls {
    pub fn new(gains: &PitchGains) -> Self {
        Controls {
            surfaces: ControlSurfaces::default(),
            pitch_controller: PitchController::new(gains),
        }
    }

    pub fn surfaces(&self) -> &ControlSurfaces {
        &self.surfaces
    }

    pub fn pitch_controller(&self) -> &PitchController {
        &self.pitch_controller
    }

    pub fn update(
        &mut self,
        data: &Data,
        input: &Input,
        limits: &dyn EnvelopeLimits,
        pitch_control: &PitchControl,
        dt: f64,
    ) -> &ControlSurfaces {
        if data.autopilot() {
            self.surfaces.elevator = input.yoke_y;
            self.surfaces.ailerons = input.yoke_x;
            self.surfaces.rudder = input.rudder;
        } else {
            let ctx = PitchLawContext {
                data,
                input,
                limits,
                pitch_control,
                dt,
            };
            self.surfaces.elevator = self.pitch_controller.calculate(self.surfaces.elevator, &ctx);
            self.surfaces.ailerons = input.yoke_x; // TODO: roll FBW
            self.surfaces.rudder = input.rudder; // TODO: yaw FBW
        }
        &self.surfaces
    }
}
