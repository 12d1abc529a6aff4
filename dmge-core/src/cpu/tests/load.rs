use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS, INITIAL_FLAGS};

#[test]
fn load_register_register() {
    run_test(
        // LD B, 0x42; LD A, B
        "064278",
        &ExpectedState {
            a: Some(0x42),
            b: Some(0x42),
            f: Some(INITIAL_FLAGS),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_register_immediate() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);
        let load_opcode_hex = format!("{load_opcode:02x}");

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, 0xC7);

        // LD <r>, 0xC7
        run_test(&format!("{load_opcode_hex}C7"), &expected_state);
    }
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xD123; LD (HL), 0x59; LD E, (HL)
        "2123D136595E",
        &ExpectedState {
            e: Some(0x59),
            memory: hash_map! { 0xD123: 0x59 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl_increment_decrement() {
    // LD A, (HL+) reads then increments HL
    run_test(
        // LD HL, 0xC500; LD (HL), 0x77; LD A, (HL+)
        "2100C536772A",
        &ExpectedState {
            a: Some(0x77),
            h: Some(0xC5),
            l: Some(0x01),
            ..ExpectedState::empty()
        },
    );

    // LD A, (HL-) reads then decrements HL
    run_test(
        // LD HL, 0xC500; LD (HL), 0x77; LD A, (HL-)
        "2100C536773A",
        &ExpectedState {
            a: Some(0x77),
            h: Some(0xC4),
            l: Some(0xFF),
            ..ExpectedState::empty()
        },
    );

    // LD (HL-), A writes then decrements HL
    run_test(
        // LD HL, 0xC500; LD A, 0x12; LD (HL-), A
        "2100C53E1232",
        &ExpectedState {
            h: Some(0xC4),
            l: Some(0xFF),
            memory: hash_map! { 0xC500: 0x12 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de() {
    run_test(
        // LD BC, 0xC234; LD A, 0x9D; LD (BC), A
        "0134C23E9D02",
        &ExpectedState { memory: hash_map! { 0xC234: 0x9D }, ..ExpectedState::empty() },
    );

    run_test(
        // LD DE, 0xC345; LD A, 0x6E; LD (DE), A; LD A, 0x00; LD A, (DE)
        "1145C33E6E123E001A",
        &ExpectedState { a: Some(0x6E), ..ExpectedState::empty() },
    );
}

#[test]
fn load_direct_and_ff_page() {
    run_test(
        // LD A, 0x4B; LD (0xC777), A
        "3E4BEA77C7",
        &ExpectedState { memory: hash_map! { 0xC777: 0x4B }, ..ExpectedState::empty() },
    );

    // LDH uses the 0xFF00 page; 0xFF85 is HRAM
    run_test(
        // LD A, 0x2C; LDH (0x85), A; LD A, 0x00; LDH A, (0x85)
        "3E2CE0853E00F085",
        &ExpectedState {
            a: Some(0x2C),
            memory: hash_map! { 0xFF85: 0x2C },
            ..ExpectedState::empty()
        },
    );

    // LD (C), A with C holding the page offset
    run_test(
        // LD C, 0x86; LD A, 0x99; LD (C), A
        "0E863E99E2",
        &ExpectedState { memory: hash_map! { 0xFF86: 0x99 }, ..ExpectedState::empty() },
    );
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        // LD BC, 0x1234; LD DE, 0x5678; LD HL, 0x9ABC; LD SP, 0xDEF0
        "01341211785621BC9A31F0DE",
        &ExpectedState {
            b: Some(0x12),
            c: Some(0x34),
            d: Some(0x56),
            e: Some(0x78),
            h: Some(0x9A),
            l: Some(0xBC),
            sp: Some(0xDEF0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct_stack_pointer() {
    // LD (a16), SP writes the stack pointer little-endian
    run_test(
        // LD SP, 0xBEEF; LD (0xC600), SP
        "31EFBE0800C6",
        &ExpectedState {
            sp: Some(0xBEEF),
            memory: hash_map! { 0xC600: 0xEF, 0xC601: 0xBE },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer_hl() {
    run_test(
        // LD HL, 0xD000; LD SP, HL
        "2100D0F9",
        &ExpectedState { sp: Some(0xD000), ..ExpectedState::empty() },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    run_test(
        // LD SP, 0xFFF8; LD HL, SP+0x02
        "31F8FFF802",
        &ExpectedState {
            h: Some(0xFF),
            l: Some(0xFA),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xC000; LD HL, SP-0x01
        "3100C0F8FF",
        &ExpectedState { h: Some(0xBF), l: Some(0xFF), ..ExpectedState::empty() },
    );
}

#[test]
fn push_pop_round_trips() {
    run_test(
        // LD SP, 0xD000; LD BC, 0x1234; PUSH BC; POP DE
        "3100D0013412C5D1",
        &ExpectedState {
            d: Some(0x12),
            e: Some(0x34),
            sp: Some(0xD000),
            memory: hash_map! { 0xCFFE: 0x34, 0xCFFF: 0x12 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_af_masks_low_flag_bits() {
    run_test(
        // LD SP, 0xD000; LD BC, 0x12FF; PUSH BC; POP AF
        "3100D001FF12C5F1",
        &ExpectedState { a: Some(0x12), f: Some(0xF0), ..ExpectedState::empty() },
    );

    // Round trip through AF preserves only the high nibble of F
    run_test(
        // LD SP, 0xD000; LD BC, 0xAB5A; PUSH BC; POP AF; PUSH AF; POP HL
        "3100D0015AABC5F1F5E1",
        &ExpectedState { h: Some(0xAB), l: Some(0x50), ..ExpectedState::empty() },
    );
}
