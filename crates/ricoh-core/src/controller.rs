//! Standard NES joypad.
//!
//! Writing 1 then 0 to `$4016` latches every pad's buttons into an 8-bit
//! shift register; each read of `$4016`/`$4017` then returns the next bit in
//! the order A, B, Select, Start, Up, Down, Left, Right. Once all eight have
//! been read the register returns 1s.

/// Open-bus bits that ride along with every controller read.
const OPEN_BUS_BITS: u8 = 0x40;

/// Buttons in shift-register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// One button transition reported by an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerEvent {
    /// 0 for `$4016`, 1 for `$4017`.
    pub port: u8,
    pub button: Button,
    pub pressed: bool,
}

impl ControllerEvent {
    pub fn new(port: u8, button: Button, pressed: bool) -> Self {
        Self {
            port,
            button,
            pressed,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Controller {
    /// Live button state, bit per [`Button`].
    buttons: u8,
    /// Shift register as last latched; bit 0 is the next one out.
    shift: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
        // With strobe held high the register tracks the pad continuously.
        if self.strobe {
            self.shift = self.buttons;
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    /// `$4016` write. Only bit 0 matters.
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.shift = self.buttons;
        }
    }

    /// Shifts out the next bit.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            // Reads while strobe is high keep returning A.
            return OPEN_BUS_BITS | (self.buttons & 0x01);
        }
        let bit = self.shift & 0x01;
        self.shift = (self.shift >> 1) | 0x80;
        OPEN_BUS_BITS | bit
    }

    /// What [`Controller::read`] would return, without shifting.
    pub fn peek(&self) -> u8 {
        let source = if self.strobe { self.buttons } else { self.shift };
        OPEN_BUS_BITS | (source & 0x01)
    }
}
