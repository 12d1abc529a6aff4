pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit_mask(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }

    /// The highest-priority interrupt out of the given IF & IE bits, lowest bit first.
    fn highest_priority(pending: u8) -> Option<Self> {
        [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad]
            .into_iter()
            .find(|interrupt_type| pending & interrupt_type.bit_mask() != 0)
    }
}

pub(crate) const ISR_CYCLES_REQUIRED: u32 = 20;

pub(crate) fn pending_interrupts(address_space: &AddressSpace) -> u8 {
    address_space.get_ie_register()
        & address_space.get_io_registers().read_register(IoRegister::IF)
        & 0x1F
}

fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.interrupt_delay && pending_interrupts(address_space) != 0
}

/// Jump to the handler of the highest-priority pending interrupt: push PC, clear IME and the
/// serviced IF bit, and set PC to the interrupt vector.
fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
) {
    let Some(interrupt_type) = InterruptType::highest_priority(pending_interrupts(address_space))
    else {
        return;
    };

    log::trace!("servicing {interrupt_type:?} interrupt");

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);

    address_space.get_io_registers_mut().interrupt_flags().clear(interrupt_type);
    cpu_registers.ime = false;
    cpu_registers.pc = interrupt_type.handler_address();
}

/// Run the CPU for one step: service a pending interrupt, execute one instruction, or idle if
/// halted/stopped. Returns the number of clock cycles consumed.
pub(crate) fn tick(address_space: &mut AddressSpace, cpu_registers: &mut CpuRegisters) -> u32 {
    if cpu_registers.stopped {
        return 4;
    }

    if interrupt_triggered(cpu_registers, address_space) {
        cpu_registers.halted = false;
        execute_interrupt_service_routine(cpu_registers, address_space);

        return ISR_CYCLES_REQUIRED;
    }

    if cpu_registers.halted {
        // Any pending interrupt exits HALT, even with IME cleared
        if pending_interrupts(address_space) != 0 {
            cpu_registers.halted = false;
        } else {
            return 4;
        }
    }

    let (instruction, pc) = instructions::parse_next_instruction(
        address_space,
        cpu_registers.pc,
        cpu_registers.halt_bug_triggered,
    );

    cpu_registers.halt_bug_triggered = false;

    log::trace!("updating PC from {:04X} to {pc:04X}", cpu_registers.pc);
    cpu_registers.pc = pc;

    let cycles_required = instruction.cycles_required(cpu_registers);

    log::trace!("executing instruction {instruction:02X?}, will take {cycles_required} cycles");
    instruction.execute(address_space, cpu_registers);

    cycles_required
}
