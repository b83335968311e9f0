//! Memory tests, immediate and delayed.

use mic1_core::common::bits::Bits;
use mic1_core::common::error::MemoryError;
use mic1_core::components::Memory;
use mic1_core::signal::clock::Clock;
use mic1_core::signal::{Net, PortId};
use pretty_assertions::assert_eq;

use crate::common::as_u32;

struct Harness {
    net: Net,
    clock: Clock,
    address: PortId,
    data: PortId,
    rd: PortId,
    wr: PortId,
    out: PortId,
    memory: std::rc::Rc<std::cell::RefCell<Memory>>,
}

fn immediate() -> Harness {
    build(None)
}

fn delayed(read_delay: usize, write_delay: usize) -> Harness {
    build(Some((read_delay, write_delay)))
}

fn build(delays: Option<(usize, usize)>) -> Harness {
    let mut net = Net::new();
    let clock = Clock::new(&mut net, 4);
    let address = net.add_port(4);
    let data = net.add_port(16);
    let rd = net.add_port(1);
    let wr = net.add_port(1);
    let memory = match delays {
        None => Memory::attach(
            &mut net,
            16,
            16,
            address,
            Some(data),
            Some(rd),
            Some(wr),
            "ram",
        ),
        Some((read_delay, write_delay)) => Memory::attach_delayed(
            &mut net,
            &clock,
            16,
            16,
            read_delay,
            write_delay,
            address,
            Some(data),
            Some(rd),
            Some(wr),
            "ram",
        ),
    };
    let out = memory.borrow().out();
    Harness {
        net,
        clock,
        address,
        data,
        rd,
        wr,
        out,
        memory,
    }
}

#[test]
fn immediate_read_completes_inside_the_strobe() {
    let h = immediate();
    h.memory
        .borrow_mut()
        .set_cell(3, &Bits::from_u32(0xBEEF, 16))
        .unwrap();
    h.net.set(h.address, &Bits::from_u32(3, 4));
    h.net.drive_bit(h.rd, true);
    assert_eq!(as_u32(&h.net.value(h.out)), 0xBEEF);
}

#[test]
fn immediate_write_completes_inside_the_strobe() {
    let h = immediate();
    h.net.set(h.address, &Bits::from_u32(5, 4));
    h.net.set(h.data, &Bits::from_u32(0x1234, 16));
    h.net.drive_bit(h.wr, true);
    assert_eq!(as_u32(h.memory.borrow().cell(5).unwrap()), 0x1234);
}

#[test]
fn deasserted_strobes_do_nothing() {
    let h = immediate();
    h.net.set(h.data, &Bits::from_u32(0xFFFF, 16));
    h.net.drive_bit(h.wr, true);
    h.net.drive_bit(h.wr, false);
    h.net.set(h.address, &Bits::from_u32(1, 4));
    assert_eq!(as_u32(h.memory.borrow().cell(1).unwrap()), 0);
}

#[test]
fn delayed_read_is_visible_on_the_exact_tick() {
    let mut h = delayed(3, 3);
    h.memory
        .borrow_mut()
        .set_cell(2, &Bits::from_u32(0xCAFE, 16))
        .unwrap();
    h.net.set(h.address, &Bits::from_u32(2, 4));

    h.clock.step(&h.net); // raise phase 0, no tick
    h.net.drive_bit(h.rd, true); // arm

    h.clock.step(&h.net); // tick 1
    assert_eq!(as_u32(&h.net.value(h.out)), 0);
    h.clock.step(&h.net); // tick 2
    assert_eq!(as_u32(&h.net.value(h.out)), 0);
    h.clock.step(&h.net); // tick 3: data appears
    assert_eq!(as_u32(&h.net.value(h.out)), 0xCAFE);
}

#[test]
fn delayed_write_is_visible_on_the_exact_tick() {
    let mut h = delayed(3, 3);
    h.net.set(h.address, &Bits::from_u32(7, 4));
    h.net.set(h.data, &Bits::from_u32(0x5555, 16));

    h.clock.step(&h.net);
    h.net.drive_bit(h.wr, true);

    h.clock.step(&h.net);
    h.clock.step(&h.net);
    assert_eq!(as_u32(h.memory.borrow().cell(7).unwrap()), 0);
    h.clock.step(&h.net);
    assert_eq!(as_u32(h.memory.borrow().cell(7).unwrap()), 0x5555);
}

#[test]
fn delayed_access_reads_the_ports_at_completion_time() {
    let mut h = delayed(2, 2);
    h.net.set(h.address, &Bits::from_u32(1, 4));
    h.net.set(h.data, &Bits::from_u32(0x1111, 16));

    h.clock.step(&h.net);
    h.net.drive_bit(h.wr, true);
    h.clock.step(&h.net); // tick 1

    // Address and data move while the access is in flight; the completed
    // write uses their final values.
    h.net.set(h.address, &Bits::from_u32(9, 4));
    h.net.set(h.data, &Bits::from_u32(0x2222, 16));
    h.clock.step(&h.net); // tick 2: write completes

    assert_eq!(as_u32(h.memory.borrow().cell(1).unwrap()), 0);
    assert_eq!(as_u32(h.memory.borrow().cell(9).unwrap()), 0x2222);
}

#[test]
fn deasserting_mid_count_cancels_the_access() {
    let mut h = delayed(3, 3);
    h.memory
        .borrow_mut()
        .set_cell(0, &Bits::from_u32(0xAAAA, 16))
        .unwrap();

    h.clock.step(&h.net);
    h.net.drive_bit(h.rd, true);
    h.clock.step(&h.net); // tick 1
    h.net.drive_bit(h.rd, false); // cancel
    h.clock.step(&h.net);
    h.clock.step(&h.net);
    h.clock.step(&h.net);
    assert_eq!(as_u32(&h.net.value(h.out)), 0);
}

#[test]
fn reassert_while_counting_is_absorbed() {
    let mut h = delayed(2, 2);
    h.memory
        .borrow_mut()
        .set_cell(0, &Bits::from_u32(0x7777, 16))
        .unwrap();

    h.clock.step(&h.net);
    h.net.drive_bit(h.rd, true);
    h.clock.step(&h.net); // tick 1
    h.net.set(h.rd, &Bits::from_u32(1, 1)); // renotify, still asserted
    h.clock.step(&h.net); // tick 2: completes on the original schedule
    assert_eq!(as_u32(&h.net.value(h.out)), 0x7777);
}

#[test]
fn direct_access_is_bounds_checked() {
    let h = immediate();
    let mut memory = h.memory.borrow_mut();
    assert_eq!(
        memory.cell(16).map(as_u32),
        Err(MemoryError::AddressOutOfRange {
            address: 16,
            cells: 16
        })
    );
    assert_eq!(
        memory.set_cell(99, &Bits::new(16)),
        Err(MemoryError::AddressOutOfRange {
            address: 99,
            cells: 16
        })
    );
}

#[test]
fn set_cell_width_adapts() {
    let h = immediate();
    h.memory
        .borrow_mut()
        .set_cell(0, &Bits::from_u32(0xF_FFFF, 20))
        .unwrap();
    assert_eq!(as_u32(h.memory.borrow().cell(0).unwrap()), 0xFFFF);
}

#[test]
fn reset_clears_every_cell_but_not_the_out_port() {
    let h = immediate();
    h.memory
        .borrow_mut()
        .set_cell(4, &Bits::from_u32(0xDEAD, 16))
        .unwrap();
    h.net.set(h.address, &Bits::from_u32(4, 4));
    h.net.drive_bit(h.rd, true);

    h.memory.borrow_mut().reset();
    assert_eq!(as_u32(h.memory.borrow().cell(4).unwrap()), 0);
    // The out port keeps the last read until the next strobe.
    assert_eq!(as_u32(&h.net.value(h.out)), 0xDEAD);
}
