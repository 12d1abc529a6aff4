use super::{hash_map, run_test, ExpectedState, ALL_REGISTERS, INITIAL_FLAGS};

use crate::cpu::registers::CpuRegister;

#[test]
fn add_immediate() {
    run_test(
        // LD A, 0x05; ADD 0xDE
        "3E05C6DE",
        &ExpectedState { a: Some(0xE3), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x01; ADD 0x03
        "3E01C603",
        &ExpectedState { a: Some(0x04), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x0F; ADD 0x01
        "3E0FC601",
        &ExpectedState { a: Some(0x10), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFF; ADD 0x01
        "3EFFC601",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFF; SCF; ADD 0x12
        "3EFF37C612",
        &ExpectedState { a: Some(0x11), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn add_indirect_hl() {
    run_test(
        // LD HL, 0xCDA4; LD (HL), 0x3B; LD A, 0xA1; ADD (HL)
        "21A4CD363B3EA186",
        &ExpectedState { a: Some(0xDC), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn add_register() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);
        let load_opcode_hex = format!("{load_opcode:02x}");

        let add_opcode = 0x80 | r.to_opcode_bits();
        let add_opcode_hex = format!("{add_opcode:02x}");

        let (expected_a, expected_f) = match r {
            CpuRegister::A => (0x68, 0x10),
            _ => (0xEA, 0x00),
        };

        run_test(
            // LD A, 0x36; LD <r>, 0xB4; ADD <r>
            &format!("3E36{load_opcode_hex}B4{add_opcode_hex}"),
            &ExpectedState {
                a: Some(expected_a),
                f: Some(expected_f),
                ..ExpectedState::empty()
            },
        );
    }
}

#[test]
fn adc_immediate() {
    run_test(
        // LD A, 0xBC; ADC 0x15
        "3EBCCE15",
        &ExpectedState { a: Some(0xD1), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xBC; SCF; ADC 0x15
        "3EBC37CE15",
        &ExpectedState { a: Some(0xD2), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFD; SCF; ADC 0x02
        "3EFD37CE02",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );
}

#[test]
fn sub_immediate() {
    run_test(
        // LD A, 0x10; SUB 0x01
        "3E10D601",
        &ExpectedState { a: Some(0x0F), f: Some(0x60), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x42; SUB 0x42
        "3E42D642",
        &ExpectedState { a: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x05; SUB 0x10
        "3E05D610",
        &ExpectedState { a: Some(0xF5), f: Some(0x50), ..ExpectedState::empty() },
    );
}

#[test]
fn sbc_immediate() {
    run_test(
        // LD A, 0x10; SCF; SBC 0x05
        "3E1037DE05",
        &ExpectedState { a: Some(0x0A), f: Some(0x60), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x00; SCF; SBC 0x00
        "3E0037DE00",
        &ExpectedState { a: Some(0xFF), f: Some(0x70), ..ExpectedState::empty() },
    );
}

#[test]
fn compare() {
    run_test(
        // LD A, 0x01; CP 0x01
        "3E01FE01",
        &ExpectedState { a: Some(0x01), f: Some(0xC0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x10; CP 0x20
        "3E10FE20",
        &ExpectedState { a: Some(0x10), f: Some(0x50), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0xC400; LD (HL), 0x05; LD A, 0x07; CP (HL)
        "2100C436053E07BE",
        &ExpectedState { a: Some(0x07), f: Some(0x40), ..ExpectedState::empty() },
    );
}

#[test]
fn increment() {
    run_test(
        // XOR A; LD A, 0x0F; INC A
        "AF3E0F3C",
        &ExpectedState { a: Some(0x10), f: Some(0x20), ..ExpectedState::empty() },
    );

    // The carry flag is unaffected by INC
    run_test(
        // LD A, 0xFF; INC A
        "3EFF3C",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0xCDA4; LD (HL), 0xFF; INC (HL)
        "21A4CD36FF34",
        &ExpectedState {
            f: Some(0xB0),
            memory: hash_map! { 0xCDA4: 0x00 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn decrement() {
    run_test(
        // XOR A; LD A, 0x10; DEC A
        "AF3E103D",
        &ExpectedState { a: Some(0x0F), f: Some(0x60), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; LD A, 0x01; DEC A
        "AF3E013D",
        &ExpectedState { a: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );
}

#[test]
fn and_or_xor() {
    run_test(
        // LD A, 0x3C; AND 0x0F
        "3E3CE60F",
        &ExpectedState { a: Some(0x0C), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xF0; AND 0x0F
        "3EF0E60F",
        &ExpectedState { a: Some(0x00), f: Some(0xA0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x50; OR 0x05
        "3E50F605",
        &ExpectedState { a: Some(0x55), f: Some(0x00), ..ExpectedState::empty() },
    );

    // XOR A always clears A and sets only Z
    run_test("AF", &ExpectedState { a: Some(0x00), f: Some(0x80), ..ExpectedState::empty() });
}

#[test]
fn xor_twice_is_identity() {
    run_test(
        // LD A, 0x5A; XOR 0x3C; XOR 0x3C
        "3E5AEE3CEE3C",
        &ExpectedState { a: Some(0x5A), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn decimal_adjust_after_addition() {
    run_test(
        // LD A, 0x45; ADD 0x38; DAA
        "3E45C63827",
        &ExpectedState { a: Some(0x83), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x99; ADD 0x01; DAA
        "3E99C60127",
        &ExpectedState { a: Some(0x00), f: Some(0x90), ..ExpectedState::empty() },
    );
}

#[test]
fn decimal_adjust_after_subtraction() {
    run_test(
        // LD A, 0x42; SUB 0x05; DAA
        "3E42D60527",
        &ExpectedState { a: Some(0x37), f: Some(0x40), ..ExpectedState::empty() },
    );
}

#[test]
fn decimal_adjust_is_idempotent_on_valid_bcd() {
    run_test(
        // XOR A; LD A, 0x45; DAA; DAA
        "AF3E452727",
        &ExpectedState { a: Some(0x45), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn add_hl_register_pair() {
    // Half carry out of bit 11
    run_test(
        // LD HL, 0x0FFF; LD BC, 0x0001; ADD HL, BC
        "21FF0F01010009",
        &ExpectedState {
            h: Some(0x10),
            l: Some(0x00),
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );

    // Carry out of bit 15; Z is unaffected
    run_test(
        // LD HL, 0x8000; ADD HL, HL
        "21008029",
        &ExpectedState {
            h: Some(0x00),
            l: Some(0x00),
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_sp_immediate() {
    run_test(
        // LD SP, 0xFFF8; ADD SP, 0x02
        "31F8FFE802",
        &ExpectedState { sp: Some(0xFFFA), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD SP, 0x00FF; ADD SP, 0x01
        "31FF00E801",
        &ExpectedState { sp: Some(0x0100), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn increment_decrement_register_pair() {
    run_test(
        // LD BC, 0x0000; DEC BC
        "0100000B",
        &ExpectedState {
            b: Some(0xFF),
            c: Some(0xFF),
            f: Some(INITIAL_FLAGS),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0x12FF; INC DE
        "11FF1213",
        &ExpectedState {
            d: Some(0x13),
            e: Some(0x00),
            f: Some(INITIAL_FLAGS),
            ..ExpectedState::empty()
        },
    );
}
