use crate::{
    config::FbwConfig,
    controls::{ActuatorSink, ControlSurfaces, Controls},
    data::{Data, SensorSource},
    input::{Input, InputEvent},
    pitch_control::PitchControl,
    pitch_controller::PitchController,
    protections::NormalLawProtections,
    recorder::{DirectorySink, FlightDataRecorder},
    sim_time::SimTime,
    Result,
};
use tracing::{info, warn};

/// The fly-by-wire system: owns every component and runs one control cycle
/// per host tick.
pub struct FBW {
    enable_fbw_system: bool,
    sim_time: SimTime,
    input: Input,
    normal_law_protections: NormalLawProtections,
    pitch_control: PitchControl,
    controls: Controls,
    data: Data,
    recorder: Option<FlightDataRecorder<DirectorySink>>,
}

impl Default for FBW {
    fn default() -> Self {
        FBW::new(&FbwConfig::default())
    }
}

impl FBW {
    pub fn new(config: &FbwConfig) -> Self {
        let recorder = config.enable_data_recorder.then(|| {
            info!(directory = %config.recorder_directory.display(), "flight data recorder enabled");
            FlightDataRecorder::new(DirectorySink::new(config.recorder_directory.clone()))
        });
        FBW {
            enable_fbw_system: config.enable_fbw_system,
            sim_time: SimTime::default(),
            input: Input::new(config.sidestick_deadband),
            normal_law_protections: NormalLawProtections::default(),
            pitch_control: PitchControl::default(),
            controls: Controls::new(&config.gains),
            data: Data::default(),
            recorder,
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        self.input.handle(event);
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    /// Runs one control cycle at simulation time `time`.
    ///
    /// Returns the commanded surfaces, or `None` when the fly-by-wire system
    /// is disabled and only the data history is maintained.
    pub fn update<S, A>(
        &mut self,
        time: f64,
        source: &mut S,
        sink: &mut A,
    ) -> Result<Option<ControlSurfaces>>
    where
        S: SensorSource + ?Sized,
        A: ActuatorSink + ?Sized,
    {
        self.sim_time.update(time);
        self.data.update(source, &self.sim_time);
        self.record();

        if !self.enable_fbw_system {
            return Ok(None);
        }

        let dt = self.sim_time.delta();
        self.pitch_control.update(&self.data, dt);
        self.normal_law_protections
            .update(&self.data, &self.input, dt);
        let surfaces = *self.controls.update(
            &self.data,
            &self.input,
            &self.normal_law_protections,
            &self.pitch_control,
            dt,
        );
        sink.set_surfaces(&surfaces)?;

        Ok(Some(surfaces))
    }

    // A failing recorder must not stop the control laws
    fn record(&mut self) {
        if let Some(recorder) = &mut self.recorder {
            if let Err(e) = recorder.update(&self.data) {
                warn!(error = %e, "flight data recorder failed, disabling it");
                self.recorder = None;
            }
        }
    }

    /// Closes any open flight data recording.
    pub fn shutdown(&mut self) -> Result<()> {
        match &mut self.recorder {
            Some(recorder) => recorder.close(),
            None => Ok(()),
        }
    }

    pub fn sim_time(&self) -> &SimTime {
        &self.sim_time
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn pitch_control(&self) -> &PitchControl {
        &self.pitch_control
    }

    pub fn protections(&self) -> &NormalLawProtections {
        &self.normal_law_protections
    }

    pub fn pitch_controller(&self) -> &PitchController {
        self.controls.pitch_controller()
    }

    pub fn surfaces(&self) -> &ControlSurfaces {
        self.controls.surfaces()
    }

    pub fn recording(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.recording())
    }
}
