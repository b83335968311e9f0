//! Arithmetic-logic unit.

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::bits::Bits;
use crate::common::error::WiringError;
use crate::signal::{Net, Node, PortId};

/// ALU function, decoded from the low two bits of the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Ripple-carry sum of A and B.
    Sum,
    /// Bitwise AND of A and B.
    And,
    /// A unchanged.
    PassA,
    /// Bitwise NOT of A.
    NotA,
}

impl AluOp {
    fn decode(selector: usize) -> Self {
        match selector & 0b11 {
            0 => Self::Sum,
            1 => Self::And,
            2 => Self::PassA,
            _ => Self::NotA,
        }
    }
}

/// Combinational ALU over two equal-width operands.
///
/// Recomputes on any change of either operand or the 2-bit function selector,
/// publishing the result followed by the negative and zero flag lines. The
/// flags are edge-driven 1-bit ports: negative is the result's top bit, zero
/// is its NOR.
#[derive(Debug)]
pub struct Alu {
    in_a: PortId,
    in_b: PortId,
    control: PortId,
    out: PortId,
    negative: PortId,
    zero: PortId,
}

impl Alu {
    /// Creates an ALU over `in_a` and `in_b` and wires it into the arena.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::WidthMismatch`] if the operand widths differ.
    pub fn attach(
        net: &mut Net,
        in_a: PortId,
        in_b: PortId,
        control: PortId,
    ) -> Result<Rc<RefCell<Self>>, WiringError> {
        let width = net.width(in_a);
        if width != net.width(in_b) {
            return Err(WiringError::WidthMismatch {
                left: width,
                right: net.width(in_b),
            });
        }
        let out = net.add_port(width);
        let negative = net.add_port(1);
        let zero = net.add_port(1);
        let alu = Rc::new(RefCell::new(Self {
            in_a,
            in_b,
            control,
            out,
            negative,
            zero,
        }));
        let id = net.add_node(alu.clone());
        net.subscribe(in_a, id);
        net.subscribe(in_b, id);
        net.subscribe(control, id);
        Ok(alu)
    }

    /// The result port.
    pub fn out(&self) -> PortId {
        self.out
    }

    /// 1-bit line mirroring the result's most significant bit.
    pub fn negative(&self) -> PortId {
        self.negative
    }

    /// 1-bit line high when the result is all-zero.
    pub fn zero(&self) -> PortId {
        self.zero
    }

    /// Ripple-carry addition, discarding the final carry.
    fn sum(a: &Bits, b: &Bits) -> Bits {
        let width = a.len();
        let mut result = Bits::new(width);
        let mut carry = false;
        for i in 0..width {
            let bit_a = a.bit(i);
            let bit_b = b.bit(i);
            result.set_bit(i, bit_a ^ bit_b ^ carry);
            carry = (bit_a && bit_b) || (bit_a && carry) || (bit_b && carry);
        }
        result
    }
}

impl Node for Alu {
    fn on_signal(&mut self, net: &Net, _origin: PortId) {
        let a = net.value(self.in_a);
        let b = net.value(self.in_b);
        let result = match AluOp::decode(net.value(self.control).to_index()) {
            AluOp::Sum => Self::sum(&a, &b),
            AluOp::And => a.and(&b),
            AluOp::PassA => a,
            AluOp::NotA => a.inverted(),
        };
        let top = result.len().saturating_sub(1);
        let negative = result.bit(top);
        let zero = !result.any_set();
        net.set(self.out, &result);
        net.drive_bit(self.negative, negative);
        net.drive_bit(self.zero, zero);
    }
}
