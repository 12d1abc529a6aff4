use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

const MAX_CYCLES_PER_UPDATE: u32 = 256;

pub(crate) fn read_timer_modulo(io_registers: &IoRegisters) -> u8 {
    io_registers.read_register(IoRegister::TMA)
}

/// Advance the internal 16-bit divider by the given number of clock cycles and apply any TIMA
/// increments that result.
///
/// DIV (FF04) exposes the high byte of the divider. While TAC bit 2 is set, TIMA increments on
/// every falling edge of the divider bit selected by TAC bits 0-1 (bit 9 / 3 / 5 / 7); a falling
/// edge of bit B occurs exactly when the divider crosses a multiple of 2^(B+1). On overflow TIMA
/// reloads from TMA and a timer interrupt is requested.
///
/// `timer_modulo` is passed in rather than read here because TIMA reloads use the TMA value from
/// before the instruction executed.
pub(crate) fn update_timer_registers(
    io_registers: &mut IoRegisters,
    timer_modulo: u8,
    cycles: u32,
) {
    if cycles > MAX_CYCLES_PER_UPDATE {
        panic!("timer updates are limited to {MAX_CYCLES_PER_UPDATE} cycles, got {cycles}");
    }

    let old_divider = u32::from(io_registers.divider());
    let new_divider = old_divider + cycles;
    io_registers.set_divider(new_divider as u16);

    let timer_control = io_registers.read_register(IoRegister::TAC);
    if timer_control & 0x04 == 0 {
        // TIMA updates are disabled
        return;
    }

    // One past the watched divider bit: 4096 / 262144 / 65536 / 16384 Hz
    let tima_update_frequency_bits = match timer_control & 0x03 {
        0x00 => 10, // bit 9
        0x01 => 4,  // bit 3
        0x02 => 6,  // bit 5
        0x03 => 8,  // bit 7
        _ => unreachable!("two-bit clock select field out of range: {timer_control:02X}"),
    };

    let tima_diff =
        (new_divider >> tima_update_frequency_bits) - (old_divider >> tima_update_frequency_bits);

    // At most a handful of edges fit in one instruction's cycles, so a plain loop keeps the
    // overflow reload straightforward
    for _ in 0..tima_diff {
        let old_tima = io_registers.read_register(IoRegister::TIMA);
        match old_tima.overflowing_add(1) {
            (new_tima, false) => {
                io_registers.write_register(IoRegister::TIMA, new_tima);
            }
            (_, true) => {
                io_registers.write_register(IoRegister::TIMA, timer_modulo);

                io_registers.interrupt_flags().set(InterruptType::Timer);
            }
        }
    }
}
