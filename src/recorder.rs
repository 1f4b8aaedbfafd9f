//! Flight data recorder.
//!
//! Captures the data history to CSV while the aircraft is being hand flown,
//! so that the control laws can later be tuned against real flight data.

use crate::{
    data::{Data, DATA_FRAME_HISTORY_LENGTH},
    Result,
};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Opens a fresh output for each recording.
pub trait RecordingSink {
    type Writer: Write;

    /// `time` is the simulation time at which the recording starts.
    fn open(&mut self, time: f64) -> io::Result<Self::Writer>;
}

/// Writes each recording to `FlightDataRecorder-<time>.csv` in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectorySink {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(time: f64) -> String {
        format!("FlightDataRecorder-{}.csv", time as i64)
    }
}

impl RecordingSink for DirectorySink {
    type Writer = BufWriter<File>;

    fn open(&mut self, time: f64) -> io::Result<Self::Writer> {
        let path = self.directory.join(Self::file_name(time));
        info!(path = %path.display(), "recording flight data");
        Ok(BufWriter::new(File::create(path)?))
    }
}

impl<W, F> RecordingSink for F
where
    W: Write,
    F: FnMut(f64) -> io::Result<W>,
{
    type Writer = W;

    fn open(&mut self, time: f64) -> io::Result<W> {
        self(time)
    }
}

pub struct FlightDataRecorder<S: RecordingSink> {
    sink: S,
    writer: Option<csv::Writer<S::Writer>>,
    valid_updates_seen: usize,
}

impl<S: RecordingSink> FlightDataRecorder<S> {
    pub fn new(sink: S) -> Self {
        FlightDataRecorder {
            sink,
            writer: None,
            valid_updates_seen: 0,
        }
    }

    pub fn recording(&self) -> bool {
        self.writer.is_some()
    }

    pub fn valid_updates_seen(&self) -> usize {
        self.valid_updates_seen
    }

    pub fn update(&mut self, data: &Data) -> Result<()> {
        // Don't capture bad data: autopilot flying, sim not running, or on the ground
        if data.autopilot() || !data.sim_controllable() || data.on_ground() {
            self.valid_updates_seen = 0;
            return self.close();
        }

        self.valid_updates_seen += 1;
        if self.valid_updates_seen < DATA_FRAME_HISTORY_LENGTH {
            return Ok(());
        }

        if self.writer.is_none() {
            // Enough data for a file: start it with the first (n - 1) frames
            let sink = self.sink.open(data.current_frame().time)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink);
            for frame in &data.frames()[..DATA_FRAME_HISTORY_LENGTH - 1] {
                writer.serialize(frame)?;
            }
            self.writer = Some(writer);
        }

        if let Some(writer) = &mut self.writer {
            writer.serialize(data.current_frame())?;
        }
        Ok(())
    }

    /// Flushes and closes the current recording, if any.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!("flight data recording closed");
        }
        Ok(())
    }
}

impl<S: RecordingSink> Drop for FlightDataRecorder<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close flight data recording");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataFrame;
    use std::{cell::RefCell, rc::Rc};

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    type Recordings = Rc<RefCell<Vec<(f64, SharedBuffer)>>>;

    fn memory_recorder() -> (
        FlightDataRecorder<impl FnMut(f64) -> io::Result<SharedBuffer>>,
        Recordings,
    ) {
        let recordings: Recordings = Default::default();
        let opened = recordings.clone();
        let recorder = FlightDataRecorder::new(move |time: f64| -> io::Result<SharedBuffer> {
            let buffer = SharedBuffer::default();
            opened.borrow_mut().push((time, buffer.clone()));
            Ok(buffer)
        });
        (recorder, recordings)
    }

    fn airborne(time: f64) -> DataFrame {
        DataFrame {
            on_ground: false,
            sim_controllable: true,
            altitude: 10000.0,
            time,
            ..DataFrame::default()
        }
    }

    fn lines(buffer: &SharedBuffer) -> Vec<String> {
        String::from_utf8(buffer.0.borrow().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn waits_for_a_full_history_before_opening() {
        let (mut recorder, recordings) = memory_recorder();
        let mut data = Data::default();
        for k in 1..DATA_FRAME_HISTORY_LENGTH {
            data.push(airborne(k as f64));
            recorder.update(&data).unwrap();
        }
        assert!(!recorder.recording());
        assert!(recordings.borrow().is_empty());

        data.push(airborne(50.0));
        recorder.update(&data).unwrap();
        assert!(recorder.recording());
        recorder.close().unwrap();
        let recordings = recordings.borrow();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].0, 50.0);
        assert_eq!(lines(&recordings[0].1).len(), DATA_FRAME_HISTORY_LENGTH);
    }

    #[test]
    fn appends_one_row_per_update_after_opening() {
        let (mut recorder, recordings) = memory_recorder();
        let mut data = Data::default();
        for k in 1..=60 {
            data.push(airborne(k as f64));
            recorder.update(&data).unwrap();
        }
        recorder.close().unwrap();
        let recordings = recordings.borrow();
        let rows = lines(&recordings[0].1);
        assert_eq!(rows.len(), 60);
        // Rows are in time order: time column is 23rd
        let times: Vec<f64> = rows
            .iter()
            .map(|r| r.split(',').nth(22).unwrap().parse().unwrap())
            .collect();
        assert_eq!(times.first(), Some(&1.0));
        assert_eq!(times.last(), Some(&60.0));
    }

    #[test]
    fn rows_omit_status_columns() {
        let (mut recorder, recordings) = memory_recorder();
        let mut data = Data::default();
        for k in 1..=DATA_FRAME_HISTORY_LENGTH {
            data.push(DataFrame {
                flaps: 2,
                vmo: 350.0,
                ..airborne(k as f64)
            });
            recorder.update(&data).unwrap();
        }
        recorder.close().unwrap();
        let recordings = recordings.borrow();
        let rows = lines(&recordings[0].1);
        let columns: Vec<&str> = rows[0].split(',').collect();
        assert_eq!(columns.len(), 27);
        assert_eq!(columns[10], "2");
        assert!(!rows[0].contains("350"));
        assert!(!rows[0].contains("true"));
    }

    #[test]
    fn landing_closes_and_restarts_the_count() {
        let (mut recorder, recordings) = memory_recorder();
        let mut data = Data::default();
        let mut time = 0.0;
        let mut step = |data: &mut Data, frame: fn(f64) -> DataFrame| {
            time += 1.0;
            data.push(frame(time));
        };

        for _ in 0..DATA_FRAME_HISTORY_LENGTH {
            step(&mut data, airborne);
            recorder.update(&data).unwrap();
        }
        assert!(recorder.recording());

        step(&mut data, |time| DataFrame {
            on_ground: true,
            ..airborne(time)
        });
        recorder.update(&data).unwrap();
        assert!(!recorder.recording());
        assert_eq!(recorder.valid_updates_seen(), 0);

        for _ in 0..DATA_FRAME_HISTORY_LENGTH - 1 {
            step(&mut data, airborne);
            recorder.update(&data).unwrap();
        }
        assert!(!recorder.recording());
        step(&mut data, airborne);
        recorder.update(&data).unwrap();
        assert!(recorder.recording());
        assert_eq!(recordings.borrow().len(), 2);
    }

    #[test]
    fn autopilot_or_frozen_sim_is_not_recorded() {
        let (mut recorder, recordings) = memory_recorder();
        let mut data = Data::default();
        for k in 1..=100 {
            data.push(DataFrame {
                autopilot: k % 2 == 0,
                sim_controllable: k % 3 != 0,
                ..airborne(k as f64)
            });
            recorder.update(&data).unwrap();
        }
        assert!(recordings.borrow().is_empty());
    }

    #[test]
    fn writes_named_files_to_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = FlightDataRecorder::new(DirectorySink::new(dir.path()));
        let mut data = Data::default();
        for k in 0..55 {
            data.push(airborne(1000.0 + k as f64 * 0.5));
            recorder.update(&data).unwrap();
        }
        recorder.close().unwrap();

        // 50th valid frame is at t = 1024.5
        let path = dir.path().join("FlightDataRecorder-1024.csv");
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 55);
    }

    #[test]
    fn failing_sink_surfaces_an_error() {
        let mut recorder = FlightDataRecorder::new(|_time: f64| -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        });
        let mut data = Data::default();
        let mut result = Ok(());
        for k in 1..=DATA_FRAME_HISTORY_LENGTH {
            data.push(airborne(k as f64));
            result = recorder.update(&data);
        }
        assert!(matches!(result, Err(crate::Error::Io(_))));
        assert!(!recorder.recording());
    }
}
