//! Whole-machine tests: datapath microcycles and the stepping protocol.

use mic1_core::common::bits::Bits;
use mic1_core::common::error::WiringError;
use mic1_core::config::Config;
use mic1_core::machine::{Machine, AC, AMASK, MINUS1, PC, PLUS1, SMASK, SP, ZERO};
use pretty_assertions::assert_eq;

use crate::common::{as_u32, bits, machine, machine_with_delays, Microword};

#[test]
fn power_on_state() {
    let m = machine();
    assert_eq!(m.current_phase(), None);
    assert_eq!(as_u32(&m.register(PC)), 0);
    assert_eq!(as_u32(&m.register(AC)), 0);
    assert_eq!(m.register(SP), bits("0001000000000000"));
    assert_eq!(as_u32(&m.register(PLUS1)), 1);
    assert_eq!(as_u32(&m.register(MINUS1)), 0xFFFF);
    assert_eq!(as_u32(&m.register(AMASK)), 0x0FFF);
    assert_eq!(as_u32(&m.register(SMASK)), 0x00FF);
    assert_eq!(as_u32(&m.register(ZERO)), 0);
}

#[test]
fn construction_rejects_a_memory_the_address_slice_overruns() {
    // 3000 cells need 12 address bits, but a 12-bit slice reaches cell 4095.
    let config = Config {
        memory_words: 3000,
        ..Config::default()
    };
    assert_eq!(
        Machine::new(&config).unwrap_err(),
        WiringError::AddressRangeTooWide {
            cells: 3000,
            width: 12
        }
    );
}

#[test]
fn construction_rejects_a_control_store_the_counter_overruns() {
    let config = Config {
        control_store_words: 128,
        ..Config::default()
    };
    assert_eq!(
        Machine::new(&config).unwrap_err(),
        WiringError::AddressRangeTooWide {
            cells: 128,
            width: 8
        }
    );
}

#[test]
fn non_stock_power_of_two_memory_builds() {
    let config = Config {
        memory_words: 1024,
        ..Config::default()
    };
    assert!(Machine::new(&config).is_ok());
}

#[test]
fn write_back_routes_the_shifter_to_the_c_register() {
    let mut m = machine();
    // PLUS1 through the ALU into scratch register 10.
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).enc().c(10).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(10)), 1);
}

#[test]
fn write_back_happens_only_on_phase_three() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).enc().c(10).build())])
        .unwrap();
    m.step_phase(); // phase 0: fetch
    m.step_phase(); // phase 1: latches
    m.step_phase(); // phase 2: MAR
    assert_eq!(as_u32(&m.register(10)), 0);
    m.step_phase(); // phase 3: write back
    assert_eq!(as_u32(&m.register(10)), 1);
}

#[test]
fn without_enc_no_register_changes() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).c(10).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(10)), 0);
}

#[test]
fn alu_sums_both_operand_latches() {
    let mut m = machine();
    // PLUS1 + MINUS1 wraps to zero.
    m.load_microcode(&[(0, Microword::new().a(6).b(7).alu(0).enc().c(11).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(11)), 0);
}

#[test]
fn shifter_applies_to_the_write_back_value() {
    let mut m = machine();
    // PLUS1 shifted toward the high end: 2.
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).shift(2).enc().c(12).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(12)), 2);
}

#[test]
fn preloaded_registers_feed_the_datapath() {
    let mut m = machine();
    m.set_register(10, &Bits::from_u32(5, 16));
    m.load_microcode(&[(0, Microword::new().a(10).alu(2).enc().c(11).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(11)), 5);
}

#[test]
fn alu_and_shifter_settle_when_the_latches_open() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).shift(2).build())])
        .unwrap();
    m.step_phase(); // phase 0
    m.step_phase(); // phase 1
    assert_eq!(as_u32(&m.alu_out()), 1);
    assert_eq!(as_u32(&m.shifter_out()), 2);
}

#[test]
fn operand_latches_capture_on_phase_one() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a(9).b(8).build())]).unwrap();
    m.step_phase(); // phase 0
    assert_eq!(m.a_source(), 9);
    assert_eq!(m.b_source(), 8);
    assert_eq!(as_u32(&m.a_latch()), 0);
    m.step_phase(); // phase 1
    assert!(m.latches_open());
    assert_eq!(as_u32(&m.a_latch()), 0x00FF);
    assert_eq!(as_u32(&m.b_latch()), 0x0FFF);
}

#[test]
fn mar_loads_the_b_latch_on_phase_two() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().b(6).build())]).unwrap();
    m.step_phase();
    m.step_phase();
    assert_eq!(as_u32(&m.mar_value()), 0);
    m.step_phase(); // phase 2
    assert_eq!(as_u32(&m.mar_value()), 1);
}

#[test]
fn memory_read_lands_in_the_buffer_on_the_second_microcycle() {
    let mut m = machine();
    m.set_memory_cell(0, &Bits::from_u32(0xABCD, 16)).unwrap();
    // RD held across two microcycles, address 0 via the ZERO register.
    let read = Microword::new().rd().b(5).build();
    m.load_microcode(&[(0, read.clone()), (1, read)]).unwrap();

    m.step_micro();
    assert_eq!(as_u32(&m.mbr_read_value()), 0);
    m.step_micro();
    assert_eq!(as_u32(&m.mbr_read_value()), 0xABCD);
}

#[test]
fn a_short_read_delay_lands_within_one_microcycle() {
    let mut m = machine_with_delays(2, 2);
    m.set_memory_cell(0, &Bits::from_u32(0x0F0F, 16)).unwrap();
    m.load_microcode(&[(0, Microword::new().rd().b(5).build())])
        .unwrap();
    // Delay 2 completes on the tick before phase 3, in time for the buffer.
    m.step_micro();
    assert_eq!(as_u32(&m.mbr_read_value()), 0x0F0F);
}

#[test]
fn read_buffer_feeds_the_alu_through_the_a_mux() {
    let mut m = machine();
    m.set_memory_cell(0, &Bits::from_u32(0x0042, 16)).unwrap();
    let read = Microword::new().rd().b(5).build();
    m.load_microcode(&[
        (0, read.clone()),
        (1, read),
        (2, Microword::new().a_from_mbr().alu(2).enc().c(10).build()),
    ])
    .unwrap();

    m.step_micro();
    m.step_micro();
    m.step_micro();
    assert_eq!(as_u32(&m.register(10)), 0x0042);
}

#[test]
fn a_mux_selection_follows_the_microword() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a_from_mbr().build())])
        .unwrap();
    assert!(!m.a_mux_takes_mbr());
    m.step_phase(); // phase 0
    assert!(m.a_mux_takes_mbr());
}

#[test]
fn memory_write_lands_on_the_delayed_tick() {
    let mut m = machine();
    // MINUS1 through the datapath into the write buffer; address 1 via
    // PLUS1 on the B bus. WR held across both microcycles.
    let write = Microword::new().wr().mbr().a(7).alu(2).b(6).build();
    m.load_microcode(&[(0, write.clone()), (1, write)]).unwrap();

    m.step_micro();
    assert_eq!(as_u32(&m.mbr_write_value()), 0xFFFF);
    assert_eq!(as_u32(&m.memory_cell(1).unwrap()), 0);
    m.step_micro();
    assert_eq!(as_u32(&m.memory_cell(1).unwrap()), 0xFFFF);
}

#[test]
fn step_macro_runs_until_the_counter_returns_to_zero() {
    let mut m = machine();
    m.load_microcode(&[
        (0, Microword::new().a(6).alu(2).enc().c(10).cond(3).addr(1).build()),
        (1, Microword::new().a(6).b(6).alu(0).enc().c(11).cond(3).addr(0).build()),
    ])
    .unwrap();

    m.step_macro();
    assert_eq!(m.mpc().to_index(), 0);
    assert_eq!(as_u32(&m.register(10)), 1);
    assert_eq!(as_u32(&m.register(11)), 2);
}

#[test]
fn step_macro_with_a_jump_to_zero_is_one_microcycle() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().cond(3).addr(0).build())])
        .unwrap();
    m.step_macro();
    assert_eq!(m.mpc().to_index(), 0);
    assert_eq!(m.current_phase(), Some(0));
}

#[test]
fn reset_restores_the_power_on_state() {
    let mut m = machine();
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).enc().c(1).build())])
        .unwrap();
    m.set_memory_cell(3, &Bits::from_u32(7, 16)).unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(AC)), 1);

    m.reset();
    assert_eq!(m.current_phase(), None);
    assert_eq!(as_u32(&m.register(AC)), 0);
    assert_eq!(m.register(SP), bits("0001000000000000"));
    assert_eq!(as_u32(&m.memory_cell(3).unwrap()), 0);
    assert!(!m.mpc().any_set());
    assert!(!m.microinstruction().any_set());

    // The machine runs again from scratch.
    m.step_micro();
    assert_eq!(as_u32(&m.register(AC)), 1);
}

#[test]
fn load_program_places_words_from_cell_zero() {
    let m = machine();
    let program = vec![Bits::from_u32(0x7001, 16), Bits::from_u32(0x1004, 16)];
    m.load_program(&program).unwrap();
    assert_eq!(as_u32(&m.memory_cell(0).unwrap()), 0x7001);
    assert_eq!(as_u32(&m.memory_cell(1).unwrap()), 0x1004);
}

#[test]
fn constant_registers_are_not_write_protected() {
    let mut m = machine();
    // The microprogram may overwrite ZERO; nothing in the datapath stops it.
    m.load_microcode(&[(0, Microword::new().a(6).alu(2).enc().c(5).build())])
        .unwrap();
    m.step_micro();
    assert_eq!(as_u32(&m.register(ZERO)), 1);
}
