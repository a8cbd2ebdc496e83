use std::time::Instant;

/// Gates how often a logical algorithm step may run, decoupling the external
/// tick rate from the configured step rate.
///
/// A step is authorized whenever the average time per step so far exceeds
/// the action interval, which converges on one step per interval no matter
/// how often the driver ticks. Each gate opening authorizes exactly one
/// step; excess ticks are dropped, never queued.
#[derive(Debug)]
pub struct StepScheduler {
    action_interval: f64,
    started_at: Instant,
    steps: u32,
}

impl StepScheduler {
    pub fn new(action_interval: f64) -> StepScheduler {
        StepScheduler {
            action_interval,
            started_at: Instant::now(),
            steps: 0,
        }
    }

    /// Steps authorized since the run (re)started.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Reset the clock and the step counter for a fresh run.
    pub fn restart(&mut self) {
        self.started_at = Instant::now();
        self.steps = 0;
    }

    /// Called once per external tick. True authorizes exactly one step.
    pub fn should_step(&mut self) -> bool {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        self.gate(elapsed)
    }

    /// The gate decision for a given elapsed run time, separated from the
    /// wall clock so it can be exercised deterministically.
    pub fn gate(&mut self, elapsed_seconds: f64) -> bool {
        // With no steps taken yet the average is unbounded, so the first
        // tick always opens the gate.
        let open = self.steps == 0 ||
                   elapsed_seconds / f64::from(self.steps) > self.action_interval;
        if open {
            self.steps += 1;
        }
        open
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn first_tick_always_steps() {
        let mut scheduler = StepScheduler::new(1.0);
        assert!(scheduler.gate(0.0));
        assert_eq!(scheduler.steps(), 1);
    }

    #[test]
    fn authorizes_one_step_per_interval() {
        let mut scheduler = StepScheduler::new(0.5);
        assert!(scheduler.gate(0.0));

        // Ticks arriving before half a second of average step time pass by.
        assert!(!scheduler.gate(0.1));
        assert!(!scheduler.gate(0.3));
        assert!(!scheduler.gate(0.5));
        assert_eq!(scheduler.steps(), 1);

        assert!(scheduler.gate(0.6));
        assert_eq!(scheduler.steps(), 2);
        assert!(!scheduler.gate(0.9));
        assert!(scheduler.gate(1.1));
        assert_eq!(scheduler.steps(), 3);
    }

    #[test]
    fn excess_ticks_are_dropped_not_queued() {
        let mut scheduler = StepScheduler::new(1.0);
        assert!(scheduler.gate(0.0));

        // A long stall raises the average, so each opening closes the gate a
        // little further until the average falls back to the interval.
        for _ in 0..9 {
            assert!(scheduler.gate(10.0));
        }
        assert_eq!(scheduler.steps(), 10);
        // Average time per step is now exactly the interval: gate closed.
        assert!(!scheduler.gate(10.0));
        assert!(scheduler.gate(10.5));
        assert!(!scheduler.gate(10.5));
    }

    #[test]
    fn step_rate_approaches_the_interval() {
        let mut scheduler = StepScheduler::new(0.05);
        // Simulate 10 seconds of 240Hz ticking.
        let mut authorized = 0;
        for tick in 0..2400 {
            let elapsed = tick as f64 / 240.0;
            if scheduler.gate(elapsed) {
                authorized += 1;
            }
        }
        // 10s / 0.05s = 200 steps, give or take rounding at the edges.
        assert!((195..=201).contains(&authorized), "authorized {}", authorized);
    }

    #[test]
    fn restart_clears_the_counter() {
        let mut scheduler = StepScheduler::new(0.5);
        assert!(scheduler.gate(0.0));
        assert!(scheduler.gate(1.0));
        assert_eq!(scheduler.steps(), 2);
        scheduler.restart();
        assert_eq!(scheduler.steps(), 0);
        assert!(scheduler.gate(0.0));
    }
}
