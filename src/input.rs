/// Pressed/released edge carried on host button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// One host input event, as delivered to the dispatcher each tick.
///
/// Codes are the host's raw scan/button codes; the dispatcher matches them
/// against the configured hotkeys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { code: u32, state: ButtonState },
    PointerButton { button: u32, state: ButtonState },
    PointerMove { dx: f32, dy: f32 },
}

impl InputEvent {
    pub fn key_down(code: u32) -> Self {
        InputEvent::Key {
            code,
            state: ButtonState::Pressed,
        }
    }

    pub fn key_up(code: u32) -> Self {
        InputEvent::Key {
            code,
            state: ButtonState::Released,
        }
    }
}
