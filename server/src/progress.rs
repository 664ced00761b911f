//! Generation progress stages
//!
//! Generation is one opaque call lasting tens of seconds, so callers show
//! timed stages instead of real progress. Purely cosmetic.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub label: &'static str,
    /// Progress bar target, in percent
    pub percent: u8,
    /// How long the stage is shown before advancing
    pub hold: Duration,
}

pub const STAGES: [Stage; 4] = [
    Stage {
        label: "Generating logo…",
        percent: 30,
        hold: Duration::from_millis(8_000),
    },
    Stage {
        label: "Enhancing design…",
        percent: 70,
        hold: Duration::from_millis(8_500),
    },
    Stage {
        label: "Finalizing…",
        percent: 95,
        hold: Duration::from_millis(5_000),
    },
    Stage {
        label: "Complete",
        percent: 100,
        hold: Duration::ZERO,
    },
];

/// Stage to display `elapsed` into a request.
///
/// Timed stages advance on their own but never reach "Complete"; that is
/// shown only once the request has finished.
pub fn stage_at(elapsed: Duration, finished: bool) -> &'static Stage {
    let last = STAGES.len() - 1;
    if finished {
        return &STAGES[last];
    }

    let mut start = Duration::ZERO;
    for stage in &STAGES[..last - 1] {
        start += stage.hold;
        if elapsed < start {
            return stage;
        }
    }
    &STAGES[last - 1]
}
