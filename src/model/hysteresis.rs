use std::time::Instant;

use crate::model::controller_config::ControllerConfig;

/// Outcome of one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Neither condition holds, or the qualifying direction is blocked by a
    /// boundary. The excursion timer restarts.
    Hold,
    /// A threshold condition holds but its dwell time has not elapsed. The
    /// excursion keeps accumulating.
    Dwell,
    /// One level toward the higher clock (index - 1).
    StepUp,
    /// One level toward the lower clock (index + 1).
    StepDown,
}

impl Decision {
    pub fn is_transition(self) -> bool {
        matches!(self, Decision::StepUp | Decision::StepDown)
    }
}

/// Level index and excursion timer of one device.
///
/// Level 0 is bound to the highest clock, `max_level` to the lowest. The
/// dwell time measures an uninterrupted run of qualifying ticks: any tick that
/// does not continue the excursion restarts the timer.
#[derive(Debug, Clone)]
pub struct HysteresisState {
    level: usize,
    max_level: usize,
    excursion_start: Instant,
}

impl HysteresisState {
    pub fn new(max_level: usize, now: Instant) -> Self {
        Self::starting_at(0, max_level, now)
    }

    /// State at a given level. Out-of-range levels are clamped to `max_level`.
    pub fn starting_at(level: usize, max_level: usize, now: Instant) -> Self {
        Self {
            level: level.min(max_level),
            max_level,
            excursion_start: now,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    #[cfg(test)]
    pub fn excursion_start(&self) -> Instant {
        self.excursion_start
    }

    /// Decides the action for this tick without changing state.
    pub fn evaluate(&self, config: &ControllerConfig, utilization: u32, now: Instant) -> Decision {
        let elapsed = now.saturating_duration_since(self.excursion_start);

        // Boost first, a pending boost excursion ends the tick
        if self.level > 0 && utilization >= config.boost_threshold {
            return if elapsed >= config.boost_dwell {
                Decision::StepUp
            } else {
                Decision::Dwell
            };
        }

        if self.level < self.max_level && utilization <= config.low_power_threshold {
            return if elapsed >= config.low_power_dwell {
                Decision::StepDown
            } else {
                Decision::Dwell
            };
        }

        Decision::Hold
    }

    /// Level that `decision` leads to.
    pub fn target_level(&self, decision: Decision) -> usize {
        match decision {
            Decision::StepUp => self.level.saturating_sub(1),
            Decision::StepDown => (self.level + 1).min(self.max_level),
            Decision::Hold | Decision::Dwell => self.level,
        }
    }

    /// Applies a decision returned by `evaluate`.
    pub fn commit(&mut self, decision: Decision, now: Instant) {
        match decision {
            Decision::StepUp | Decision::StepDown => {
                self.level = self.target_level(decision);
                self.excursion_start = now;
            }
            Decision::Hold => self.excursion_start = now,
            Decision::Dwell => {}
        }
    }

    /// `evaluate` followed by `commit`.
    #[cfg(test)]
    pub fn step(&mut self, config: &ControllerConfig, utilization: u32, now: Instant) -> Decision {
        let decision = self.evaluate(config, utilization, now);
        self.commit(decision, now);
        decision
    }
}
