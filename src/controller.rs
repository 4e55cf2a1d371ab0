//! NES controller input handling.
//!
//! Implements the standard NES controller protocol on $4016: while the strobe bit is high every
//! read reports button A; once it drops, successive reads walk A, B, Select, Start, Up, Down,
//! Left, Right. Reads past the eighth return 0 until the next strobe.

/// Buttons in the order the controller reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A = 0,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
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
}

/// Represents a single NES controller connected to port 1 ($4016).
#[derive(Debug, Default, Clone)]
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub state: u8,
    index: u8,
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let bit = 1 << button as u8;
        if pressed {
            self.state |= bit;
        } else {
            self.state &= !bit;
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.state & (1 << button as u8) != 0
    }

    /// Read one button state from $4016 and advance to the next button.
    pub fn read(&mut self) -> u8 {
        let bit = if self.index < 8 {
            (self.state >> self.index) & 1
        } else {
            0
        };
        if self.strobe {
            self.index = 0;
        } else if self.index < 8 {
            self.index += 1;
        }
        bit
    }

    /// Write to $4016. Bit 0 is the strobe; any write restarts the read sequence.
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latched(buttons: &[Button]) -> Controller {
        let mut controller = Controller::new();
        for &button in buttons {
            controller.set_button(button, true);
        }
        controller.write(1);
        controller.write(0);
        controller
    }

    #[test]
    fn reads_buttons_in_order() {
        let mut controller = latched(&[Button::A, Button::Start, Button::Right]);
        let bits: Vec<u8> = (0..8).map(|_| controller.read()).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn reads_after_eighth_return_zero() {
        let mut controller = latched(&Button::ALL);
        for _ in 0..8 {
            assert_eq!(controller.read(), 1);
        }
        assert_eq!(controller.read(), 0);
        assert_eq!(controller.read(), 0);
    }

    #[test]
    fn strobe_high_keeps_reporting_a() {
        let mut controller = Controller::new();
        controller.set_button(Button::A, true);
        controller.write(1);
        for _ in 0..10 {
            assert_eq!(controller.read(), 1);
        }
    }

    #[test]
    fn strobe_restarts_sequence() {
        let mut controller = latched(&[Button::B]);
        assert_eq!(controller.read(), 0);
        assert_eq!(controller.read(), 1);
        controller.write(1);
        controller.write(0);
        assert_eq!(controller.read(), 0);
        assert_eq!(controller.read(), 1);
    }

    #[test]
    fn releasing_a_button_clears_its_bit() {
        let mut controller = Controller::new();
        controller.set_button(Button::Left, true);
        assert!(controller.is_pressed(Button::Left));
        controller.set_button(Button::Left, false);
        assert_eq!(controller.state, 0);
    }
}
