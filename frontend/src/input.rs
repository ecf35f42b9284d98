use std::collections::BTreeMap;

use nesplay_core::input::{Button, KeyMap};
use sdl2::keyboard::Scancode;

use crate::error::FrontendError;

/// Keyboard layout used when the config file binds nothing, in wire order.
pub const DEFAULT_BINDINGS: [(Button, Scancode); 8] = [
    (Button::A, Scancode::Z),
    (Button::B, Scancode::X),
    (Button::Select, Scancode::RShift),
    (Button::Start, Scancode::Return),
    (Button::Left, Scancode::Left),
    (Button::Right, Scancode::Right),
    (Button::Up, Scancode::Up),
    (Button::Down, Scancode::Down),
];

/// Keys the host loop handles itself; they cannot be bound to buttons.
pub const RESERVED: [Scancode; 3] = [Scancode::Escape, Scancode::Space, Scancode::Tab];

/// Build the key map, replacing default bindings with `overrides`
/// (button name to SDL scancode name, as in `config.toml`).
pub fn key_map(overrides: &BTreeMap<String, String>) -> Result<KeyMap<Scancode>, FrontendError> {
    let mut bindings = DEFAULT_BINDINGS;

    for (button_name, key_name) in overrides {
        let button = Button::from_name(button_name)
            .ok_or_else(|| FrontendError::Binding(format!("unknown button '{button_name}'")))?;
        let scancode = Scancode::from_name(key_name)
            .ok_or_else(|| FrontendError::Binding(format!("unknown key '{key_name}'")))?;
        if RESERVED.contains(&scancode) {
            return Err(FrontendError::Binding(format!(
                "'{key_name}' is reserved for playback control"
            )));
        }
        bindings[button.index()].1 = scancode;
    }

    for (i, (button, scancode)) in bindings.iter().enumerate() {
        if let Some((other, _)) = bindings[..i].iter().find(|(_, sc)| sc == scancode) {
            return Err(FrontendError::Binding(format!(
                "'{}' is bound to both {} and {}",
                scancode.name(),
                other.name(),
                button.name()
            )));
        }
    }

    for (button, scancode) in &bindings {
        tracing::debug!("{} -> {}", button.name(), scancode.name());
    }
    Ok(bindings.into_iter().map(|(b, sc)| (sc, b)).collect())
}
