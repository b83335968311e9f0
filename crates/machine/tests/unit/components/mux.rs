//! Multiplexer tests.

use mic1_core::common::bits::Bits;
use mic1_core::components::Mux;
use mic1_core::signal::{Net, PortId};
use pretty_assertions::assert_eq;

use crate::common::as_u32;

struct Harness {
    net: Net,
    inputs: Vec<PortId>,
    control: PortId,
    out: PortId,
}

fn harness(ways: usize, control_width: usize) -> Harness {
    let mut net = Net::new();
    let inputs: Vec<_> = (0..ways).map(|_| net.add_port(16)).collect();
    let control = net.add_port(control_width);
    let mux = Mux::attach(&mut net, 16, inputs.clone(), control);
    let out = mux.borrow().out();
    Harness {
        net,
        inputs,
        control,
        out,
    }
}

#[test]
fn follows_the_selected_input() {
    let h = harness(2, 1);
    h.net.set(h.inputs[0], &Bits::from_u32(0xAAAA, 16));
    assert_eq!(as_u32(&h.net.value(h.out)), 0xAAAA);
}

#[test]
fn ignores_deselected_inputs() {
    let h = harness(2, 1);
    h.net.set(h.inputs[1], &Bits::from_u32(0xBBBB, 16));
    assert_eq!(as_u32(&h.net.value(h.out)), 0);
}

#[test]
fn switching_publishes_the_new_input_immediately() {
    let h = harness(2, 1);
    h.net.set(h.inputs[1], &Bits::from_u32(0xBBBB, 16));
    // The new input has not changed since selection; its current value must
    // still appear.
    h.net.set(h.control, &Bits::from_u32(1, 1));
    assert_eq!(as_u32(&h.net.value(h.out)), 0xBBBB);
}

#[test]
fn switching_moves_the_input_subscription() {
    let h = harness(2, 1);
    h.net.set(h.control, &Bits::from_u32(1, 1));

    // The previously selected input no longer reaches the output.
    h.net.set(h.inputs[0], &Bits::from_u32(0x1111, 16));
    assert_eq!(as_u32(&h.net.value(h.out)), 0);

    h.net.set(h.inputs[1], &Bits::from_u32(0x2222, 16));
    assert_eq!(as_u32(&h.net.value(h.out)), 0x2222);
}

#[test]
fn sixteen_way_selection() {
    let h = harness(16, 4);
    for (index, &input) in h.inputs.iter().enumerate() {
        h.net.set(input, &Bits::from_u32(index as u32 + 100, 16));
    }
    for index in (0..16).rev() {
        h.net.set(h.control, &Bits::from_u32(index, 4));
        assert_eq!(as_u32(&h.net.value(h.out)), index + 100);
    }
}

#[test]
fn initial_selection_reads_the_control_port() {
    let mut net = Net::new();
    let inputs: Vec<_> = (0..2).map(|_| net.add_port(8)).collect();
    let control = net.add_port(1);
    net.set(control, &Bits::from_u32(1, 1));
    net.set(inputs[1], &Bits::from_u32(42, 8));

    let mux = Mux::attach(&mut net, 8, inputs, control);
    let out = mux.borrow().out();
    assert_eq!(as_u32(&net.value(out)), 42);
    assert_eq!(mux.borrow().selected(), 1);
}
