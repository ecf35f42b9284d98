use std::collections::HashMap;
use std::hash::Hash;

/// One of the eight buttons on a standard controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Left,
    Right,
    Up,
    Down,
}

impl Button {
    /// All buttons in engine wire order.
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
    ];

    /// Position of this button in the engine wire order.
    pub const fn index(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::Select => 2,
            Button::Start => 3,
            Button::Left => 4,
            Button::Right => 5,
            Button::Up => 6,
            Button::Down => 7,
        }
    }

    /// Human-readable name, also used as the key in binding config files.
    pub const fn name(self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::Select => "select",
            Button::Start => "start",
            Button::Left => "left",
            Button::Right => "right",
            Button::Up => "up",
            Button::Down => "down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }
}

/// Latched state of one gamepad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ControllerState {
    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::Select => self.select,
            Button::Start => self.start,
            Button::Left => self.left,
            Button::Right => self.right,
            Button::Up => self.up,
            Button::Down => self.down,
        }
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        let field = match button {
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Select => &mut self.select,
            Button::Start => &mut self.start,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
        };
        *field = pressed;
    }

    /// Buttons as eight booleans in engine wire order (see [`Button::ALL`]).
    pub fn to_ordered(&self) -> [bool; 8] {
        Button::ALL.map(|b| self.is_pressed(b))
    }

    pub fn from_ordered(buttons: [bool; 8]) -> Self {
        let mut state = Self::default();
        for (button, pressed) in Button::ALL.into_iter().zip(buttons) {
            state.set(button, pressed);
        }
        state
    }

    /// Pack into a bitmask, bit N = `Button::ALL[N]`.
    pub fn bits(&self) -> u8 {
        self.to_ordered()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &p)| acc | ((p as u8) << i))
    }
}

/// Maps physical key identifiers to controller buttons.
#[derive(Debug, Clone)]
pub struct KeyMap<K> {
    map: HashMap<K, Button>,
}

impl<K: Eq + Hash> KeyMap<K> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a key to a button. A key maps to at most one button; rebinding
    /// replaces the previous mapping.
    pub fn bind(&mut self, key: K, button: Button) {
        self.map.insert(key, button);
    }

    pub fn get(&self, key: &K) -> Option<Button> {
        self.map.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash> Default for KeyMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> FromIterator<(K, Button)> for KeyMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, Button)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Folds key transitions into a [`ControllerState`].
///
/// Edge-triggered: only key-down and key-up events change state, and only
/// the state at tick time is observed by the engine.
#[derive(Debug, Clone)]
pub struct InputAggregator<K> {
    keys: KeyMap<K>,
    state: ControllerState,
}

impl<K: Eq + Hash> InputAggregator<K> {
    pub fn new(keys: KeyMap<K>) -> Self {
        Self {
            keys,
            state: ControllerState::default(),
        }
    }

    /// Returns the button the key is bound to, or `None` if the key was ignored.
    pub fn key_down(&mut self, key: &K) -> Option<Button> {
        self.transition(key, true)
    }

    pub fn key_up(&mut self, key: &K) -> Option<Button> {
        self.transition(key, false)
    }

    fn transition(&mut self, key: &K, pressed: bool) -> Option<Button> {
        let button = self.keys.get(key)?;
        self.state.set(button, pressed);
        Some(button)
    }

    /// Release every button (e.g. when the window loses focus).
    pub fn release_all(&mut self) {
        self.state = ControllerState::default();
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn key_map(&self) -> &KeyMap<K> {
        &self.keys
    }
}
