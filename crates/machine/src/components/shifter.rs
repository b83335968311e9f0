//! Single-position shifter.

use std::cell::RefCell;
use std::rc::Rc;

use crate::signal::{Net, Node, PortId};

/// Shifter function, decoded from the 2-bit selector.
///
/// Named by bit movement rather than left/right: selector 1 moves every bit
/// toward the low-index end (halving), 2 toward the high-index end
/// (doubling); any other value passes the input unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    /// Input unchanged.
    Pass,
    /// One position toward the low-index end.
    TowardLow,
    /// One position toward the high-index end.
    TowardHigh,
}

impl ShiftOp {
    fn decode(selector: usize) -> Self {
        match selector {
            1 => Self::TowardLow,
            2 => Self::TowardHigh,
            _ => Self::Pass,
        }
    }
}

/// Passes its input through, optionally shifted one bit position.
#[derive(Debug)]
pub struct Shifter {
    input: PortId,
    control: PortId,
    out: PortId,
}

impl Shifter {
    /// Creates a shifter over `input` and wires it into the arena.
    pub fn attach(net: &mut Net, input: PortId, control: PortId) -> Rc<RefCell<Self>> {
        let out = net.add_port(net.width(input));
        let shifter = Rc::new(RefCell::new(Self {
            input,
            control,
            out,
        }));
        let id = net.add_node(shifter.clone());
        net.subscribe(input, id);
        net.subscribe(control, id);
        shifter
    }

    /// The result port.
    pub fn out(&self) -> PortId {
        self.out
    }
}

impl Node for Shifter {
    fn on_signal(&mut self, net: &Net, _origin: PortId) {
        let input = net.value(self.input);
        let result = match ShiftOp::decode(net.value(self.control).to_index()) {
            ShiftOp::TowardLow => input.shift_low(),
            ShiftOp::TowardHigh => input.shift_high(),
            ShiftOp::Pass => input,
        };
        net.set(self.out, &result);
    }
}
