mod parse;

use crate::cpu::registers::{
    CFlag, CpuRegister, CpuRegisterPair, CpuRegisters, HFlag, NFlag, ZFlag,
};
use crate::memory::AddressSpace;

pub use parse::parse_next_instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.z_flag(),
            Self::Z => cpu_registers.z_flag(),
            Self::NC => !cpu_registers.c_flag(),
            Self::C => cpu_registers.c_flag(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Immediate(u8),
    IndirectHL,
    IndirectHLInc,
    IndirectHLDec,
    IndirectBC,
    IndirectDE,
    Accumulator,
    FFIndirectC,
    FFDirect(u8),
    Direct(u16),
}

impl ReadTarget {
    fn read_value(self, cpu_registers: &mut CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::Immediate(n) => n,
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                let value = address_space.read_address_u8(hl);
                cpu_registers.set_hl(hl.wrapping_add(1));
                value
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                let value = address_space.read_address_u8(hl);
                cpu_registers.set_hl(hl.wrapping_sub(1));
                value
            }
            Self::IndirectBC => address_space.read_address_u8(cpu_registers.bc()),
            Self::IndirectDE => address_space.read_address_u8(cpu_registers.de()),
            Self::Accumulator => cpu_registers.accumulator,
            Self::FFIndirectC => {
                let address = u16::from_be_bytes([0xFF, cpu_registers.c]);
                address_space.read_address_u8(address)
            }
            Self::FFDirect(n) => {
                let address = u16::from_be_bytes([0xFF, n]);
                address_space.read_address_u8(address)
            }
            Self::Direct(nn) => address_space.read_address_u8(nn),
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::Immediate(..)
            | Self::IndirectHL
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    IndirectHL,
    IndirectHLInc,
    IndirectHLDec,
    IndirectBC,
    IndirectDE,
    Accumulator,
    FFIndirectC,
    FFDirect(u8),
    Direct(u16),
}

impl WriteTarget {
    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
            Self::IndirectBC => {
                address_space.write_address_u8(cpu_registers.bc(), value);
            }
            Self::IndirectDE => {
                address_space.write_address_u8(cpu_registers.de(), value);
            }
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::FFIndirectC => {
                let address = u16::from_be_bytes([0xFF, cpu_registers.c]);
                address_space.write_address_u8(address, value);
            }
            Self::FFDirect(n) => {
                let address = u16::from_be_bytes([0xFF, n]);
                address_space.write_address_u8(address, value);
            }
            Self::Direct(nn) => {
                address_space.write_address_u8(nn, value);
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::IndirectHL
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Register(CpuRegister),
    IndirectHL,
    Accumulator,
}

impl ModifyTarget {
    fn read_value(self, cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
            Self::Accumulator => cpu_registers.accumulator,
        }
    }

    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::IndirectHL => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD/LDH across every 8-bit addressing mode
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LDHL SP, e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD r / (HL) / n
    Add(ReadTarget),
    // ADC r / (HL) / n
    AddWithCarry(ReadTarget),
    // SUB r / (HL) / n
    Subtract(ReadTarget),
    // SBC r / (HL) / n
    SubtractWithCarry(ReadTarget),
    // CP r / (HL) / n
    Compare(ReadTarget),
    // INC r / (HL)
    Increment(ModifyTarget),
    // DEC r / (HL)
    Decrement(ModifyTarget),
    // AND r / (HL) / n
    And(ReadTarget),
    // OR r / (HL) / n
    Or(ReadTarget),
    // XOR r / (HL) / n
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC r / RLC (HL)
    RotateLeft(ModifyTarget),
    // RLA / RL r / RL (HL)
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC r / RRC (HL)
    RotateRight(ModifyTarget),
    // RRA / RR r / RR (HL)
    RotateRightThruCarry(ModifyTarget),
    // SLA r / (HL)
    ShiftLeft(ModifyTarget),
    // SWAP r / (HL)
    Swap(ModifyTarget),
    // SRA r / (HL)
    ArithmeticShiftRight(ModifyTarget),
    // SRL r / (HL)
    LogicalShiftRight(ModifyTarget),
    // BIT n, r / (HL)
    TestBit(u8, ReadTarget),
    // RES n, r / (HL)
    ResetBit(u8, ModifyTarget),
    // SET n, r / (HL)
    SetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
    // One of the opcodes with no assigned instruction; executes as a 4-cycle NOP
    Illegal(u8),
}

impl Instruction {
    /// Apply this instruction's effects to the CPU registers, flags, and memory.
    ///
    /// The caller is responsible for having advanced PC past the instruction already; control
    /// flow instructions then overwrite PC with their target.
    pub fn execute(self, address_space: &mut AddressSpace, cpu_registers: &mut CpuRegisters) {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                write_target.write_value(value, cpu_registers, address_space);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::PushStack(rr) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space
                    .write_address_u16(cpu_registers.sp, cpu_registers.read_register_pair(rr));
            }
            Self::PopStack(rr) => {
                cpu_registers
                    .set_register_pair(rr, address_space.read_address_u16(cpu_registers.sp));
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::Add(read_target) => {
                let (sum, c_flag, h_flag) = alu_add(
                    cpu_registers.accumulator,
                    read_target.read_value(cpu_registers, address_space),
                    false,
                );
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(ZFlag(sum == 0), NFlag(false), h_flag, c_flag);
            }
            Self::AddWithCarry(read_target) => {
                let (sum, c_flag, h_flag) = alu_add(
                    cpu_registers.accumulator,
                    read_target.read_value(cpu_registers, address_space),
                    cpu_registers.c_flag(),
                );
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(ZFlag(sum == 0), NFlag(false), h_flag, c_flag);
            }
            Self::Subtract(read_target) => {
                let (difference, c_flag, h_flag) = alu_sub(
                    cpu_registers.accumulator,
                    read_target.read_value(cpu_registers, address_space),
                    false,
                );
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(ZFlag(difference == 0), NFlag(true), h_flag, c_flag);
            }
            Self::SubtractWithCarry(read_target) => {
                let (difference, c_flag, h_flag) = alu_sub(
                    cpu_registers.accumulator,
                    read_target.read_value(cpu_registers, address_space),
                    cpu_registers.c_flag(),
                );
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(ZFlag(difference == 0), NFlag(true), h_flag, c_flag);
            }
            Self::Compare(read_target) => {
                let (difference, c_flag, h_flag) = alu_sub(
                    cpu_registers.accumulator,
                    read_target.read_value(cpu_registers, address_space),
                    false,
                );
                cpu_registers.set_flags(ZFlag(difference == 0), NFlag(true), h_flag, c_flag);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let (sum, _, h_flag) = alu_add(value, 1, false);
                modify_target.write_value(sum, cpu_registers, address_space);
                cpu_registers.set_some_flags(
                    Some(ZFlag(sum == 0)),
                    Some(NFlag(false)),
                    Some(h_flag),
                    None,
                );
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let (difference, _, h_flag) = alu_sub(value, 1, false);
                modify_target.write_value(difference, cpu_registers, address_space);
                cpu_registers.set_some_flags(
                    Some(ZFlag(difference == 0)),
                    Some(NFlag(true)),
                    Some(h_flag),
                    None,
                );
            }
            Self::And(read_target) => {
                let value = cpu_registers.accumulator
                    & read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(ZFlag(value == 0), NFlag(false), HFlag(true), CFlag(false));
            }
            Self::Or(read_target) => {
                let value = cpu_registers.accumulator
                    | read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(
                    ZFlag(value == 0),
                    NFlag(false),
                    HFlag(false),
                    CFlag(false),
                );
            }
            Self::Xor(read_target) => {
                let value = cpu_registers.accumulator
                    ^ read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(
                    ZFlag(value == 0),
                    NFlag(false),
                    HFlag(false),
                    CFlag(false),
                );
            }
            Self::AddHLRegister(rr) => {
                let (sum, c_flag, h_flag) =
                    alu_add_u16(cpu_registers.hl(), cpu_registers.read_register_pair(rr));
                cpu_registers.set_hl(sum);
                cpu_registers.set_some_flags(None, Some(NFlag(false)), Some(h_flag), Some(c_flag));
            }
            Self::IncRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_sub(1));
            }
            Self::AddSPImmediate(e) => {
                let (sp, c_flag, h_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = sp;
                cpu_registers.set_flags(ZFlag(false), NFlag(false), h_flag, c_flag);
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (sp, c_flag, h_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_hl(sp);
                cpu_registers.set_flags(ZFlag(false), NFlag(false), h_flag, c_flag);
            }
            Self::RotateLeft(modify_target) => {
                let (value, c_flag) =
                    rlc(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                let z_flag = ZFlag(modify_target != ModifyTarget::Accumulator && value == 0);
                cpu_registers.set_flags(z_flag, NFlag(false), HFlag(false), c_flag);
            }
            Self::RotateLeftThruCarry(modify_target) => {
                let (value, c_flag) = rl(
                    modify_target.read_value(cpu_registers, address_space),
                    cpu_registers.c_flag(),
                );
                modify_target.write_value(value, cpu_registers, address_space);
                let z_flag = ZFlag(modify_target != ModifyTarget::Accumulator && value == 0);
                cpu_registers.set_flags(z_flag, NFlag(false), HFlag(false), c_flag);
            }
            Self::RotateRight(modify_target) => {
                let (value, c_flag) =
                    rrc(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                let z_flag = ZFlag(modify_target != ModifyTarget::Accumulator && value == 0);
                cpu_registers.set_flags(z_flag, NFlag(false), HFlag(false), c_flag);
            }
            Self::RotateRightThruCarry(modify_target) => {
                let (value, c_flag) = rr(
                    modify_target.read_value(cpu_registers, address_space),
                    cpu_registers.c_flag(),
                );
                modify_target.write_value(value, cpu_registers, address_space);
                let z_flag = ZFlag(modify_target != ModifyTarget::Accumulator && value == 0);
                cpu_registers.set_flags(z_flag, NFlag(false), HFlag(false), c_flag);
            }
            Self::ShiftLeft(modify_target) => {
                let (value, c_flag) =
                    sla(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                cpu_registers.set_flags(ZFlag(value == 0), NFlag(false), HFlag(false), c_flag);
            }
            Self::Swap(modify_target) => {
                let value = swap_nibbles(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                cpu_registers.set_flags(
                    ZFlag(value == 0),
                    NFlag(false),
                    HFlag(false),
                    CFlag(false),
                );
            }
            Self::ArithmeticShiftRight(modify_target) => {
                let (value, c_flag) =
                    sra(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                cpu_registers.set_flags(ZFlag(value == 0), NFlag(false), HFlag(false), c_flag);
            }
            Self::LogicalShiftRight(modify_target) => {
                let (value, c_flag) =
                    srl(modify_target.read_value(cpu_registers, address_space));
                modify_target.write_value(value, cpu_registers, address_space);
                cpu_registers.set_flags(ZFlag(value == 0), NFlag(false), HFlag(false), c_flag);
            }
            Self::TestBit(n, read_target) => {
                let r_value = read_target.read_value(cpu_registers, address_space);
                let z_flag = ZFlag(r_value & (1 << n) == 0);
                cpu_registers.set_some_flags(
                    Some(z_flag),
                    Some(NFlag(false)),
                    Some(HFlag(true)),
                    None,
                );
            }
            Self::SetBit(n, modify_target) => {
                let value = (1 << n) | modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value, cpu_registers, address_space);
            }
            Self::ResetBit(n, modify_target) => {
                let value = !(1 << n) & modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value, cpu_registers, address_space);
            }
            Self::ComplementCarryFlag => {
                cpu_registers.set_some_flags(
                    None,
                    Some(NFlag(false)),
                    Some(HFlag(false)),
                    Some(CFlag(!cpu_registers.c_flag())),
                );
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(
                    None,
                    Some(NFlag(false)),
                    Some(HFlag(false)),
                    Some(CFlag(true)),
                );
            }
            Self::DecimalAdjustAccumulator => {
                decimal_adjust(cpu_registers);
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(NFlag(true)), Some(HFlag(true)), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                let pc = (i32::from(cpu_registers.pc) + i32::from(e)) as u16;
                cpu_registers.pc = pc;
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    let pc = (i32::from(cpu_registers.pc) + i32::from(e)) as u16;
                    cpu_registers.pc = pc;
                }
            }
            Self::Call(nn) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                    address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                cpu_registers.ime = true;
            }
            Self::RestartCall(rst_address) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                cpu_registers.pc = rst_address.into();
            }
            Self::Halt => {
                if !cpu_registers.ime && crate::cpu::pending_interrupts(address_space) != 0 {
                    // HALT with IME clear and an interrupt already pending does not halt; the
                    // byte after HALT is fetched twice
                    cpu_registers.halt_bug_triggered = true;
                } else {
                    cpu_registers.halted = true;
                }
            }
            Self::Stop => {
                // The operand byte was already consumed by the parser; execution freezes until
                // the next reset
                log::info!("STOP executed, freezing CPU");
                cpu_registers.stopped = true;
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
            }
            Self::EnableInterrupts => {
                cpu_registers.ime = true;

                // EI arms the one-instruction delay, so it must not fall through to the reset
                // at the bottom
                cpu_registers.interrupt_delay = true;
                return;
            }
            Self::NoOp => {}
            Self::Illegal(_) => {}
        }

        cpu_registers.interrupt_delay = false;
    }

    /// The clock cycle cost of this instruction.
    ///
    /// The register state is needed here: conditional jumps, calls, and returns are cheaper
    /// when the branch is not taken.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::RotateLeft(ModifyTarget::Accumulator)
            | Self::RotateLeftThruCarry(ModifyTarget::Accumulator)
            | Self::RotateRight(ModifyTarget::Accumulator)
            | Self::RotateRightThruCarry(ModifyTarget::Accumulator)
            | Self::SetCarryFlag
            | Self::ComplementCarryFlag
            | Self::NoOp
            | Self::Illegal(..)
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::JumpHL
            | Self::Halt
            | Self::Stop => 4,

            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::LoadRegisterPairImmediate(..)
            | Self::PopStack(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::RelativeJump(..) => 12,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::LoadDirectStackPointer(..) => 20,
            Self::Call(..) => 24,
            Self::JumpCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::CallCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
            Self::Load(write_target, read_target) => {
                4 + read_target.cycles_required() + write_target.cycles_required()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target)
            | Self::Compare(read_target) => 4 + read_target.cycles_required(),
            Self::TestBit(_, read_target) => 8 + read_target.cycles_required(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => {
                4 + 2 * modify_target.cycles_required()
            }
            Self::RotateLeft(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::ResetBit(_, modify_target)
            | Self::SetBit(_, modify_target) => 8 + 2 * modify_target.cycles_required(),
        }
    }
}

// ALU helpers below compute the result in a wider integer so the carry and half-carry fall out
// of simple comparisons.

fn alu_add(lhs: u8, rhs: u8, carry_in: bool) -> (u8, CFlag, HFlag) {
    let carry_in = u8::from(carry_in);
    let wide = u16::from(lhs) + u16::from(rhs) + u16::from(carry_in);
    let nibble_sum = (lhs & 0x0F) + (rhs & 0x0F) + carry_in;

    (wide as u8, CFlag(wide > 0x00FF), HFlag(nibble_sum > 0x0F))
}

fn alu_add_u16(lhs: u16, rhs: u16) -> (u16, CFlag, HFlag) {
    let wide = u32::from(lhs) + u32::from(rhs);
    let low_12_sum = (lhs & 0x0FFF) + (rhs & 0x0FFF);

    (wide as u16, CFlag(wide > 0xFFFF), HFlag(low_12_sum > 0x0FFF))
}

fn alu_sub(lhs: u8, rhs: u8, borrow_in: bool) -> (u8, CFlag, HFlag) {
    let borrow_in = u16::from(borrow_in);
    let wide = u16::from(lhs).wrapping_sub(u16::from(rhs)).wrapping_sub(borrow_in);
    let nibble_borrow = u16::from(lhs & 0x0F) < u16::from(rhs & 0x0F) + borrow_in;

    (wide as u8, CFlag(wide > 0x00FF), HFlag(nibble_borrow))
}

fn rlc(value: u8) -> (u8, CFlag) {
    (value.rotate_left(1), CFlag(value & 0x80 != 0))
}

fn rl(value: u8, carry_in: bool) -> (u8, CFlag) {
    ((value << 1) | u8::from(carry_in), CFlag(value & 0x80 != 0))
}

fn rrc(value: u8) -> (u8, CFlag) {
    (value.rotate_right(1), CFlag(value & 0x01 != 0))
}

fn rr(value: u8, carry_in: bool) -> (u8, CFlag) {
    ((value >> 1) | (u8::from(carry_in) << 7), CFlag(value & 0x01 != 0))
}

fn sla(value: u8) -> (u8, CFlag) {
    (value << 1, CFlag(value & 0x80 != 0))
}

fn sra(value: u8) -> (u8, CFlag) {
    // Bit 7 is duplicated rather than cleared
    ((value >> 1) | (value & 0x80), CFlag(value & 0x01 != 0))
}

fn srl(value: u8) -> (u8, CFlag) {
    (value >> 1, CFlag(value & 0x01 != 0))
}

fn swap_nibbles(value: u8) -> u8 {
    value.rotate_left(4)
}

fn decimal_adjust(cpu_registers: &mut CpuRegisters) {
    let mut a = cpu_registers.accumulator;

    if cpu_registers.n_flag() {
        // After a subtraction, only the digits that borrowed need the 6 taken back off; the
        // carry flag is left alone
        if cpu_registers.h_flag() {
            a = a.wrapping_sub(0x06);
        }
        if cpu_registers.c_flag() {
            a = a.wrapping_sub(0x60);
        }

        cpu_registers.accumulator = a;
        cpu_registers.set_some_flags(Some(ZFlag(a == 0)), None, Some(HFlag(false)), None);
    } else {
        // After an addition, any digit past 9 (or that carried) gets bumped into the next
        // decade; a high-digit fixup also sets the carry flag
        let carry_out = a > 0x99 || cpu_registers.c_flag();
        if carry_out {
            a = a.wrapping_add(0x60);
        }
        if a & 0x0F > 0x09 || cpu_registers.h_flag() {
            a = a.wrapping_add(0x06);
        }

        cpu_registers.accumulator = a;
        cpu_registers.set_some_flags(
            Some(ZFlag(a == 0)),
            None,
            Some(HFlag(false)),
            Some(CFlag(carry_out)),
        );
    }
}

// H and C come from the XOR trick: bit k of (a ^ b ^ (a + b)) is the carry into bit k, so bits
// 4 and 8 give the nibble and byte carries of the low-byte addition regardless of the offset's
// sign.
fn add_sp_offset(sp: u16, offset: i8) -> (u16, CFlag, HFlag) {
    let offset = offset as u16;
    let result = sp.wrapping_add(offset);
    let carry_bits = sp ^ offset ^ result;

    (result, CFlag(carry_bits & 0x0100 != 0), HFlag(carry_bits & 0x0010 != 0))
}
