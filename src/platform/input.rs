//! Logical actions and the per-tick pressed-state map

use serde::{Deserialize, Serialize};

/// Logical actions the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Shoot,
    /// Release the special charge (ulti)
    Special,
    Dash,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Shoot,
        Action::Special,
        Action::Dash,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Pressed state of every [`Action`], sampled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    pressed: [bool; Action::ALL.len()],
}

impl ActionState {
    /// Nothing pressed
    pub fn new() -> Self {
        Self::default()
    }

    /// State with exactly the given actions held
    pub fn with(actions: &[Action]) -> Self {
        let mut state = Self::default();
        for &action in actions {
            state.set(action, true);
        }
        state
    }

    #[inline]
    pub fn pressed(&self, action: Action) -> bool {
        self.pressed[action.index()]
    }

    #[inline]
    pub fn set(&mut self, action: Action, down: bool) {
        self.pressed[action.index()] = down;
    }

    /// Horizontal and vertical move intent in {-1, 0, 1}
    pub fn move_axis(&self) -> (f32, f32) {
        let axis = |neg: Action, pos: Action| match (self.pressed(neg), self.pressed(pos)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        (
            axis(Action::MoveLeft, Action::MoveRight),
            axis(Action::MoveUp, Action::MoveDown),
        )
    }
}
