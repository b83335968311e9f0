//! Microword jump-condition evaluation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::signal::{Net, Node, PortId};

/// Condition field: never jump.
pub const COND_NEVER: usize = 0;
/// Condition field: jump when the ALU result is negative.
pub const COND_NEGATIVE: usize = 1;
/// Condition field: jump when the ALU result is zero.
pub const COND_ZERO: usize = 2;
/// Condition field: unconditional jump.
pub const COND_ALWAYS: usize = 3;

/// Evaluates the microword condition field against the ALU flag lines.
///
/// Recomputes on any change of the negative line, the zero line, or the
/// condition field. The output is lowered first and conditionally raised, so
/// downstream observers may see a low-high pair within one evaluation; the
/// next-address mux tolerates that by re-reading its selector on each edge.
#[derive(Debug)]
pub struct FlagsRegister {
    negative: PortId,
    zero: PortId,
    condition: PortId,
    out: PortId,
}

impl FlagsRegister {
    /// Creates the evaluator and wires it into the arena.
    pub fn attach(
        net: &mut Net,
        negative: PortId,
        zero: PortId,
        condition: PortId,
    ) -> Rc<RefCell<Self>> {
        let out = net.add_port(1);
        let flags = Rc::new(RefCell::new(Self {
            negative,
            zero,
            condition,
            out,
        }));
        let id = net.add_node(flags.clone());
        net.subscribe(negative, id);
        net.subscribe(zero, id);
        net.subscribe(condition, id);
        flags
    }

    /// 1-bit line, high when the condition currently holds.
    pub fn out(&self) -> PortId {
        self.out
    }
}

impl Node for FlagsRegister {
    fn on_signal(&mut self, net: &Net, _origin: PortId) {
        net.drive_bit(self.out, false);
        let take = match net.value(self.condition).to_index() {
            COND_NEGATIVE => net.value(self.negative).all_set(),
            COND_ZERO => net.value(self.zero).all_set(),
            COND_ALWAYS => true,
            _ => false,
        };
        if take {
            net.drive_bit(self.out, true);
        }
    }
}
