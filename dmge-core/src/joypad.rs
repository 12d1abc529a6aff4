use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

/// One of the eight DMG buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoypadButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Debug, Clone, Default)]
pub struct JoypadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    start: bool,
    select: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_field_mut(&mut self, button: JoypadButton) -> &mut bool {
        match button {
            JoypadButton::Up => &mut self.up,
            JoypadButton::Down => &mut self.down,
            JoypadButton::Left => &mut self.left,
            JoypadButton::Right => &mut self.right,
            JoypadButton::A => &mut self.a,
            JoypadButton::B => &mut self.b,
            JoypadButton::Start => &mut self.start,
            JoypadButton::Select => &mut self.select,
        }
    }

    pub fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        *self.get_field_mut(button) = pressed;
        log::debug!("Button {button:?} pressed={pressed}, current state: {self:?}");
    }
}

// An input line firing is a 1 -> 0 transition on one of the low four bits
fn should_flag_interrupt(old_joyp: u8, new_joyp: u8) -> bool {
    old_joyp & !new_joyp & 0x0F != 0
}

/// Recompute the low nibble of JOYP from the button state and the select bits, requesting a
/// joypad interrupt when a selected button line goes low.
///
/// The matrix has to be refreshed after each CPU instruction since games flip the select bits
/// (4 and 5, active low) to multiplex both button groups over the same four input lines. With
/// neither group selected the nibble floats high (0x0F); with both selected the groups are
/// OR'd onto the lines.
pub(crate) fn update_joyp_register(joypad_state: &JoypadState, io_registers: &mut IoRegisters) {
    let joyp = io_registers.read_register(IoRegister::JOYP);

    let mut pressed = 0x00_u8;
    if joyp & 0x20 == 0 {
        pressed |= u8::from(joypad_state.start) << 3
            | u8::from(joypad_state.select) << 2
            | u8::from(joypad_state.b) << 1
            | u8::from(joypad_state.a);
    }
    if joyp & 0x10 == 0 {
        pressed |= u8::from(joypad_state.down) << 3
            | u8::from(joypad_state.up) << 2
            | u8::from(joypad_state.left) << 1
            | u8::from(joypad_state.right);
    }

    // Pressed buttons pull their line low
    let new_joyp = (joyp & 0x30) | (!pressed & 0x0F);
    io_registers.privileged_set_joyp(new_joyp);

    if should_flag_interrupt(joyp, new_joyp) {
        io_registers.interrupt_flags().set(InterruptType::Joypad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joyp_low_nibble(joypad_state: &JoypadState, select_bits: u8) -> u8 {
        let mut io_registers = IoRegisters::new();
        io_registers.write_address(0xFF00, select_bits);
        update_joyp_register(joypad_state, &mut io_registers);
        io_registers.read_address(0xFF00) & 0x0F
    }

    #[test]
    fn direction_group() {
        let mut joypad_state = JoypadState::new();
        joypad_state.set_button(JoypadButton::Down, true);
        joypad_state.set_button(JoypadButton::Right, true);

        // Bit 4 clear selects directions: Down=bit 3, Up=bit 2, Left=bit 1, Right=bit 0
        assert_eq!(0x06, joyp_low_nibble(&joypad_state, 0x20));
        // Bit 5 clear selects actions; none pressed
        assert_eq!(0x0F, joyp_low_nibble(&joypad_state, 0x10));
    }

    #[test]
    fn action_group() {
        let mut joypad_state = JoypadState::new();
        joypad_state.set_button(JoypadButton::A, true);
        joypad_state.set_button(JoypadButton::Start, true);

        // Start=bit 3, Select=bit 2, B=bit 1, A=bit 0
        assert_eq!(0x06, joyp_low_nibble(&joypad_state, 0x10));
        assert_eq!(0x0F, joyp_low_nibble(&joypad_state, 0x20));
    }

    #[test]
    fn neither_group_selected_reads_0f() {
        let mut joypad_state = JoypadState::new();
        joypad_state.set_button(JoypadButton::A, true);
        joypad_state.set_button(JoypadButton::Down, true);

        assert_eq!(0x0F, joyp_low_nibble(&joypad_state, 0x30));
    }

    #[test]
    fn both_groups_selected_are_ord() {
        let mut joypad_state = JoypadState::new();
        joypad_state.set_button(JoypadButton::A, true);
        joypad_state.set_button(JoypadButton::Down, true);

        // A pulls bit 0 low, Down pulls bit 3 low
        assert_eq!(0x06, joyp_low_nibble(&joypad_state, 0x00));
    }

    #[test]
    fn press_requests_interrupt() {
        let mut io_registers = IoRegisters::new();
        io_registers.write_address(0xFF00, 0x10);
        io_registers.interrupt_flags().clear(InterruptType::Joypad);

        let mut joypad_state = JoypadState::new();
        update_joyp_register(&joypad_state, &mut io_registers);
        assert!(!io_registers.interrupt_flags().get(InterruptType::Joypad));

        joypad_state.set_button(JoypadButton::B, true);
        update_joyp_register(&joypad_state, &mut io_registers);
        assert!(io_registers.interrupt_flags().get(InterruptType::Joypad));
    }
}
