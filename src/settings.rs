//! Player preferences
//!
//! Volume and the key-binding map. Persisted inside the save envelope, with
//! the bindings stored under plain string names so unknown or future entries
//! survive a round trip through older builds.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::platform::input::{Action, ActionState};

/// Bindable controls. Shop and menu are handled outside the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Shoot,
    Special,
    Dash,
    Shop,
    Menu,
}

impl Control {
    pub const ALL: [Control; 9] = [
        Control::Up,
        Control::Down,
        Control::Left,
        Control::Right,
        Control::Shoot,
        Control::Special,
        Control::Dash,
        Control::Shop,
        Control::Menu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Control::Up => "up",
            Control::Down => "down",
            Control::Left => "left",
            Control::Right => "right",
            Control::Shoot => "shoot",
            Control::Special => "special",
            Control::Dash => "dash",
            Control::Shop => "shop",
            Control::Menu => "menu",
        }
    }

    /// Simulation action driven by this control, if any
    pub fn action(&self) -> Option<Action> {
        match self {
            Control::Up => Some(Action::MoveUp),
            Control::Down => Some(Action::MoveDown),
            Control::Left => Some(Action::MoveLeft),
            Control::Right => Some(Action::MoveRight),
            Control::Shoot => Some(Action::Shoot),
            Control::Special => Some(Action::Special),
            Control::Dash => Some(Action::Dash),
            Control::Shop | Control::Menu => None,
        }
    }

    fn default_key(&self) -> &'static str {
        match self {
            Control::Up => "w",
            Control::Down => "s",
            Control::Left => "a",
            Control::Right => "d",
            Control::Shoot => "space",
            Control::Special => "e",
            Control::Dash => "left shift",
            Control::Shop => "i",
            Control::Menu => "escape",
        }
    }
}

impl FromStr for Control {
    type Err = ();

    /// Case-insensitive control name; `ulti` is accepted for the special
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ulti") {
            return Ok(Control::Special);
        }
        Control::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub key_bindings: BTreeMap<Control, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            key_bindings: Control::ALL
                .into_iter()
                .map(|c| (c, c.default_key().to_string()))
                .collect(),
        }
    }
}

impl Settings {
    pub fn set_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn bind(&mut self, control: Control, key: impl Into<String>) {
        self.key_bindings.insert(control, key.into().to_lowercase());
    }

    pub fn key_for(&self, control: Control) -> Option<&str> {
        self.key_bindings.get(&control).map(String::as_str)
    }

    /// Control bound to a key name, case-insensitive
    pub fn control_for(&self, key: &str) -> Option<Control> {
        self.key_bindings
            .iter()
            .find(|(_, bound)| bound.eq_ignore_ascii_case(key))
            .map(|(&control, _)| control)
    }

    /// Build the per-tick input map from the names of currently held keys
    pub fn resolve<'a>(&self, held_keys: impl IntoIterator<Item = &'a str>) -> ActionState {
        let mut state = ActionState::new();
        for key in held_keys {
            if let Some(action) = self.control_for(key).and_then(|c| c.action()) {
                state.set(action, true);
            }
        }
        state
    }

    /// Bindings keyed by control name, as stored in the save envelope
    pub fn raw_bindings(&self) -> BTreeMap<String, String> {
        self.key_bindings
            .iter()
            .map(|(c, key)| (c.as_str().to_string(), key.clone()))
            .collect()
    }

    /// Rebuild from persisted values. Unknown control names are skipped;
    /// controls missing from `raw` keep their defaults.
    pub fn from_raw(volume: f32, raw: &BTreeMap<String, String>) -> Self {
        let mut settings = Self::default();
        settings.set_volume(volume);
        for (name, key) in raw {
            match name.parse::<Control>() {
                Ok(control) => settings.bind(control, key.as_str()),
                Err(()) => log::debug!("Ignoring binding for unknown control {name:?}"),
            }
        }
        settings
    }
}
