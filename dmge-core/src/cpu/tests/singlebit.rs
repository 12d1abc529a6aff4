use super::{hash_map, run_test, ExpectedState};

#[test]
fn test_bit() {
    // BIT 7, H with H = 0x80: Z=0, N=0, H=1
    run_test(
        // XOR A; LD H, 0x80; BIT 7, H
        "AF2680CB7C",
        &ExpectedState { h: Some(0x80), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; LD H, 0x00; BIT 7, H
        "AF2600CB7C",
        &ExpectedState { h: Some(0x00), f: Some(0xA0), ..ExpectedState::empty() },
    );

    // The carry flag is unaffected by BIT
    run_test(
        // XOR A; SCF; LD B, 0x01; BIT 0, B
        "AF370601CB40",
        &ExpectedState { b: Some(0x01), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn test_bit_indirect_hl() {
    run_test(
        // XOR A; LD HL, 0xC808; LD (HL), 0x10; BIT 4, (HL)
        "AF2108C83610CB66",
        &ExpectedState { f: Some(0x20), ..ExpectedState::empty() },
    );
}

#[test]
fn set_bit() {
    run_test(
        // LD C, 0x00; SET 3, C
        "0E00CBD9",
        &ExpectedState { c: Some(0x08), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0xC900; LD (HL), 0x00; SET 7, (HL)
        "2100C93600CBFE",
        &ExpectedState { memory: hash_map! { 0xC900: 0x80 }, ..ExpectedState::empty() },
    );
}

#[test]
fn reset_bit() {
    run_test(
        // LD D, 0xFF; RES 5, D
        "16FFCBAA",
        &ExpectedState { d: Some(0xDF), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0xC901; LD (HL), 0xFF; RES 0, (HL)
        "2101C936FFCB86",
        &ExpectedState { memory: hash_map! { 0xC901: 0xFE }, ..ExpectedState::empty() },
    );
}

#[test]
fn set_and_reset_do_not_touch_flags() {
    run_test(
        // XOR A; LD B, 0x00; SET 0, B; RES 0, B
        "AF0600CBC0CB80",
        &ExpectedState { b: Some(0x00), f: Some(0x80), ..ExpectedState::empty() },
    );
}
