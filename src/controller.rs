/*!
Standard pad on $4016/$4017.

Behavior:
- Buttons are shifted out in the order A, B, Select, Start, Up, Down,
  Left, Right (bit 0 through bit 7 of the pressed mask).
- Bit 0 of a $4016 write is the strobe. While it is high the shift register
  keeps reloading from the live buttons, so every read reports A.
- With the strobe low each read returns the next bit; once all eight have
  been shifted out the pad returns 1.
*/

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
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

    /// Button for a numeric id in shift-out order (0 = A .. 7 = Right).
    pub fn from_index(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    fn mask(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Controller {
    pressed: u8,
    shift: u8,
    // Bits already shifted out since the last reload; 8 means exhausted
    reads: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.pressed |= button.mask();
        } else {
            self.pressed &= !button.mask();
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed & button.mask() != 0
    }

    /// CPU write to $4016 (both pads see the same strobe line).
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.reload();
        }
    }

    /// CPU read of this pad's port. Only bit 0 carries data.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.reload();
            return self.shift & 1;
        }
        if self.reads >= 8 {
            return 1;
        }
        let bit = self.shift & 1;
        self.shift >>= 1;
        self.reads += 1;
        bit
    }

    fn reload(&mut self) {
        self.shift = self.pressed;
        self.reads = 0;
    }
}
