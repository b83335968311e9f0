//! Edge-sampled registers and transparent latches.
//!
//! The two storage elements differ in exactly one way:
//! 1. **[`Register`]:** Samples its data port only when its control port goes
//!    all-high. It never subscribes to the data port, so it can sit inside a
//!    combinational feedback loop (the microprogram counter does) without
//!    re-entering the engine.
//! 2. **[`Latch`]:** Transparent while its control is high; it mirrors every
//!    data change and freezes the last value when the control drops.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::common::bits::Bits;
use crate::signal::{Net, Node, NodeId, PortId};

/// A clocked register.
///
/// The data and control ports are optional and rebindable, matching the
/// construction protocol of the datapath: registers are created first so
/// their output ports exist, and wired to their inputs once the sources
/// exist. A register with no data port ignores its control entirely.
pub struct Register {
    name: &'static str,
    out: PortId,
    data: Option<PortId>,
    control: Option<PortId>,
    node: NodeId,
}

impl Register {
    /// Creates an unwired register of the given width and registers it in the
    /// arena.
    pub fn attach(net: &mut Net, width: usize, name: &'static str) -> Rc<RefCell<Self>> {
        let out = net.add_port(width);
        let register = Rc::new(RefCell::new(Self {
            name,
            out,
            data: None,
            control: None,
            node: NodeId::UNREGISTERED,
        }));
        let id = net.add_node(register.clone());
        register.borrow_mut().node = id;
        register
    }

    /// The register's output port.
    pub fn out(&self) -> PortId {
        self.out
    }

    /// Binds the port sampled on a control edge. The register does not
    /// subscribe to it.
    pub fn set_data(&mut self, data: PortId) {
        self.data = Some(data);
    }

    /// Binds (or rebinds) the control port and subscribes to it.
    ///
    /// Rebinding moves the register to the end of the new port's subscriber
    /// list, which is how the datapath fixes its phase ordering.
    pub fn set_control(&mut self, net: &Net, control: PortId) {
        if let Some(old) = self.control {
            net.unsubscribe(old, self.node);
        }
        self.control = Some(control);
        net.subscribe(control, self.node);
    }

    /// Directly stores a value, notifying downstream subscribers.
    ///
    /// Used for constants, program loading, and reset; the datapath itself
    /// only writes through the control edge.
    pub fn store(&self, net: &Net, value: &Bits) {
        net.set(self.out, value);
        debug!(register = self.name, value = %net.value(self.out), "register write");
    }

    /// Clears the register to all-zero.
    pub fn reset(&self, net: &Net) {
        let width = net.width(self.out);
        self.store(net, &Bits::new(width));
    }

    /// Current stored value.
    pub fn value(&self, net: &Net) -> Bits {
        net.value(self.out)
    }
}

impl Node for Register {
    fn on_signal(&mut self, net: &Net, _origin: PortId) {
        // Only the control port is subscribed.
        let Some(data) = self.data else { return };
        let Some(control) = self.control else { return };
        if net.value(control).all_set() {
            self.store(net, &net.value(data));
        }
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register").field("name", &self.name).finish()
    }
}

/// A transparent latch.
///
/// While the control port is all-high the output mirrors the data port;
/// while it is low the output holds. The control state is evaluated once at
/// attach time, so a latch wired to an already-high phase starts transparent.
#[derive(Debug)]
pub struct Latch {
    out: PortId,
    data: PortId,
    control: PortId,
    enabled: bool,
}

impl Latch {
    /// Creates a latch over `data` gated by `control` and wires it into the
    /// arena.
    pub fn attach(net: &mut Net, data: PortId, control: PortId) -> Rc<RefCell<Self>> {
        let out = net.add_port(net.width(data));
        let latch = Rc::new(RefCell::new(Self {
            out,
            data,
            control,
            enabled: false,
        }));
        let id = net.add_node(latch.clone());
        net.subscribe(data, id);
        net.subscribe(control, id);
        {
            let mut this = latch.borrow_mut();
            this.enabled = net.value(control).all_set();
            if this.enabled {
                net.set(out, &net.value(data));
            }
        }
        latch
    }

    /// The latch's output port.
    pub fn out(&self) -> PortId {
        self.out
    }

    /// Whether the latch is currently transparent.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Clears the held value without touching the control state.
    pub fn reset(&self, net: &Net) {
        let width = net.width(self.out);
        net.set(self.out, &Bits::new(width));
    }
}

impl Node for Latch {
    fn on_signal(&mut self, net: &Net, origin: PortId) {
        if origin == self.control {
            self.enabled = net.value(self.control).all_set();
        }
        if self.enabled {
            net.set(self.out, &net.value(self.data));
        }
    }
}
