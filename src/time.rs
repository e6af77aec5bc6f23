use std::time::{Duration, Instant};

/// Turns wall-clock time into a number of fixed simulation steps.
pub struct StepClock {
    step: Duration,
    accumulated: Duration,
    last_update: Instant,
}

impl StepClock {
    /// Caps the catch-up after a stall.
    const MAX_STEPS_PER_UPDATE: u32 = 50;

    pub fn new(step: Duration) -> StepClock {
        StepClock {
            step,
            accumulated: Duration::ZERO,
            last_update: Instant::now(),
        }
    }

    pub fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Steps that are due since the last call.
    pub fn update(&mut self) -> u32 {
        let now = Instant::now();
        self.accumulated += now - self.last_update;
        self.last_update = now;

        let mut steps = 0;
        while self.accumulated >= self.step && steps < Self::MAX_STEPS_PER_UPDATE {
            self.accumulated -= self.step;
            steps += 1;
        }
        if steps == Self::MAX_STEPS_PER_UPDATE {
            self.accumulated = Duration::ZERO;
        }
        steps
    }
}
