use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::config::InputConfig;

/// Discrete player intent delivered by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Intent {
    #[display("MOVE_LEFT")]
    MoveLeft = 0,
    #[display("MOVE_RIGHT")]
    MoveRight = 1,
    #[display("SOFT_DROP")]
    SoftDrop = 2,
    #[display("ROTATE_CW")]
    RotateCw = 3,
    #[display("ROTATE_CCW")]
    RotateCcw = 4,
    #[display("HARD_DROP")]
    HardDrop = 5,
    #[display("TOGGLE_PAUSE")]
    TogglePause = 6,
}

impl Intent {
    pub const LEN: usize = 7;

    pub const ALL: [Intent; Self::LEN] = [
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::SoftDrop,
        Intent::RotateCw,
        Intent::RotateCcw,
        Intent::HardDrop,
        Intent::TogglePause,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Horizontal moves wait for the DAS delay before their first repeat.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Intent::MoveLeft | Intent::MoveRight)
    }

    /// Intents that auto-repeat while the key is held.
    #[must_use]
    pub const fn is_repeatable(self) -> bool {
        matches!(
            self,
            Intent::MoveLeft | Intent::MoveRight | Intent::SoftDrop
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeldState {
    held: bool,
    next_due_ms: Option<u64>,
}

/// DAS/ARR scheduler turning held keys into discrete repeated intents.
///
/// A press fires once immediately. Horizontal moves then wait `das_ms`
/// before the first repeat, soft drop waits `soft_drop_ms`, and anything
/// else waits `arr_ms`. After the first repeat, each intent repeats at its
/// steady cadence: `soft_drop_ms` for soft drop and `arr_ms` otherwise.
///
/// # Example
///
/// ```
/// use blockfall_engine::{InputConfig, InputRepeater, Intent};
///
/// let mut repeater = InputRepeater::new(InputConfig::default());
///
/// assert_eq!(repeater.hold(Intent::MoveLeft, true, 0), Some(Intent::MoveLeft));
/// assert!(repeater.due(159).is_empty());
/// assert_eq!(repeater.due(160).as_slice(), &[Intent::MoveLeft]);
/// assert_eq!(repeater.due(200).as_slice(), &[Intent::MoveLeft]);
///
/// assert_eq!(repeater.hold(Intent::MoveLeft, false, 210), None);
/// assert!(repeater.due(1000).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct InputRepeater {
    timing: InputConfig,
    states: [HeldState; Intent::LEN],
}

impl InputRepeater {
    #[must_use]
    pub fn new(timing: InputConfig) -> Self {
        Self {
            timing,
            states: [HeldState::default(); Intent::LEN],
        }
    }

    /// Records a press or release of `intent` at `now_ms`.
    ///
    /// A press returns the intent to fire immediately and schedules its
    /// first repeat; pressing an already held key restarts its schedule. A
    /// release clears the intent's schedule and returns `None`.
    pub fn hold(&mut self, intent: Intent, is_down: bool, now_ms: u64) -> Option<Intent> {
        let first_delay = self.first_delay(intent);
        let state = &mut self.states[intent.index()];
        if !is_down {
            *state = HeldState::default();
            return None;
        }
        *state = HeldState {
            held: true,
            next_due_ms: Some(now_ms.saturating_add(first_delay)),
        };
        Some(intent)
    }

    /// Returns every held intent whose next repeat is due at `now_ms`, and
    /// reschedules each one at its steady cadence.
    pub fn due(&mut self, now_ms: u64) -> ArrayVec<Intent, { Intent::LEN }> {
        let mut fired = ArrayVec::new();
        for intent in Intent::ALL {
            let cadence = self.cadence(intent);
            let state = &mut self.states[intent.index()];
            if !state.held {
                continue;
            }
            let Some(next_due_ms) = state.next_due_ms else {
                continue;
            };
            if now_ms >= next_due_ms {
                fired.push(intent);
                state.next_due_ms = Some(now_ms.saturating_add(cadence));
            }
        }
        fired
    }

    /// Releases every held intent.
    pub fn clear(&mut self) {
        self.states = [HeldState::default(); Intent::LEN];
    }

    #[must_use]
    pub fn is_held(&self, intent: Intent) -> bool {
        self.states[intent.index()].held
    }

    fn first_delay(&self, intent: Intent) -> u64 {
        if intent.is_horizontal() {
            self.timing.das_ms
        } else {
            self.cadence(intent)
        }
    }

    fn cadence(&self, intent: Intent) -> u64 {
        match intent {
            Intent::SoftDrop => self.timing.soft_drop_ms,
            _ => self.timing.arr_ms,
        }
    }
}
