/// Simulated time, advanced by the host once per cycle before anything else runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimTime {
    previous: f64,
    current: f64,
    initialized: bool,
}

impl SimTime {
    pub fn update(&mut self, now: f64) {
        if !self.initialized {
            // The first sample has nothing to measure against
            self.previous = now;
            self.initialized = true;
        } else {
            self.previous = self.current;
        }
        self.current = now;
    }

    /// Seconds since the previous cycle. Never negative.
    pub fn delta(&self) -> f64 {
        let dt = self.current - self.previous;
        if dt > 0.0 {
            dt
        } else {
            0.0
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_has_no_delta() {
        let mut t = SimTime::default();
        t.update(1234.5);
        assert_eq!(t.delta(), 0.0);
        assert_eq!(t.current(), 1234.5);
    }

    #[test]
    fn delta_tracks_consecutive_updates() {
        let mut t = SimTime::default();
        t.update(10.0);
        t.update(10.25);
        assert_eq!(t.delta(), 0.25);
        t.update(11.0);
        assert_eq!(t.delta(), 0.75);
    }

    #[test]
    fn time_going_backwards_is_a_zero_step() {
        let mut t = SimTime::default();
        t.update(10.0);
        t.update(5.0);
        assert_eq!(t.delta(), 0.0);
        assert_eq!(t.current(), 5.0);
    }
}
