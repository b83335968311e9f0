//! N-way multiplexer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::signal::{Net, Node, NodeId, PortId};

/// Selects one of its input ports onto the output.
///
/// The multiplexer subscribes only to the control port and the currently
/// selected input. When the selector changes it drops the old input
/// subscription, subscribes to the new one, and republishes; changes on
/// deselected inputs are never observed. The residual subscription means a
/// newly selected input's current value appears on the output immediately,
/// not on its next change.
#[derive(Debug)]
pub struct Mux {
    inputs: Vec<PortId>,
    control: PortId,
    out: PortId,
    current: usize,
    node: NodeId,
}

impl Mux {
    /// Creates a multiplexer over `inputs` driven by `control` and wires it
    /// into the arena. The initial selection follows the control port's
    /// current value.
    ///
    /// # Panics
    ///
    /// Panics if the control value selects past the end of `inputs`; selector
    /// widths are a construction-time obligation.
    pub fn attach(
        net: &mut Net,
        width: usize,
        inputs: Vec<PortId>,
        control: PortId,
    ) -> Rc<RefCell<Self>> {
        let out = net.add_port(width);
        let current = net.value(control).to_index();
        let mux = Rc::new(RefCell::new(Self {
            inputs,
            control,
            out,
            current,
            node: NodeId::UNREGISTERED,
        }));
        let id = net.add_node(mux.clone());
        {
            let mut this = mux.borrow_mut();
            this.node = id;
            net.subscribe(control, id);
            net.subscribe(this.inputs[current], id);
            net.set(out, &net.value(this.inputs[current]));
        }
        mux
    }

    /// The multiplexer's output port.
    pub fn out(&self) -> PortId {
        self.out
    }

    /// Index of the currently selected input.
    pub fn selected(&self) -> usize {
        self.current
    }

    fn select(&mut self, net: &Net, index: usize) {
        net.unsubscribe(self.inputs[self.current], self.node);
        self.current = index;
        net.subscribe(self.inputs[index], self.node);
        net.set(self.out, &net.value(self.inputs[index]));
    }
}

impl Node for Mux {
    fn on_signal(&mut self, net: &Net, origin: PortId) {
        if origin == self.control {
            let index = net.value(self.control).to_index();
            self.select(net, index);
        } else {
            net.set(self.out, &net.value(self.inputs[self.current]));
        }
    }
}
