//! Signal ports and the synchronous propagation engine.
//!
//! Every wire in the machine is a port owned by a [`Net`] arena and addressed
//! by an integer handle. The module provides:
//! 1. **Sourced ports:** Value-holding nodes written by exactly one component.
//! 2. **Derived ports:** Pure projections (slice, increment, decode, AND) that
//!    recompute from their upstream ports on demand.
//! 3. **Propagation:** Setting a sourced port synchronously notifies every
//!    subscriber, depth-first and re-entrantly, in registration order.
//!
//! There is no batching, topological ordering, or de-duplication: a node with
//! two changed upstream paths recomputes once per incoming notification, and
//! downstream observers may see intermediate values. The converged state
//! after a stimulus therefore depends on subscription order, which is fixed
//! at registration and deterministic. Feedback loops are only safe when every
//! cycle passes through a clocked storage element whose control gating stops
//! re-entrant firing; the engine performs no cycle detection.

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::bits::Bits;

/// Multi-phase clock and tick-delayed signal taps.
pub mod clock;

/// Handle to a port inside a [`Net`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortId(usize);

/// Handle to a registered listener inside a [`Net`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

impl NodeId {
    /// Placeholder for components that learn their handle right after
    /// registration.
    pub(crate) const UNREGISTERED: Self = Self(usize::MAX);
}

/// A component that reacts to port changes.
///
/// `origin` is the port the node subscribed to, letting a component with
/// several inputs tell which one fired. The callback may set other ports,
/// re-entering the engine within the same call.
pub trait Node {
    /// Called synchronously whenever a subscribed port changes.
    fn on_signal(&mut self, net: &Net, origin: PortId);
}

/// The pure projections a derived port can apply.
///
/// A closed enum instead of a function table: every kind is matched
/// exhaustively where values are computed.
#[derive(Clone, Copy, Debug)]
enum Derive {
    /// `len` bits starting at `offset` of the single source; out-of-range
    /// positions read as 0.
    Interval { offset: usize, len: usize },
    /// Source read as an unsigned integer plus a constant, re-encoded at the
    /// source width (wrapping on overflow).
    Increment { by: u32 },
    /// Low 4 bits of the source as a one-hot 16-bit vector.
    Decoder4To16,
    /// Bitwise AND across all sources, truncated to the narrowest width.
    AndAll,
}

enum PortKind {
    Sourced,
    Derived { sources: Vec<PortId>, derive: Derive },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Subscriber {
    Node(NodeId),
    Port(PortId),
}

struct PortState {
    width: usize,
    value: Bits,
    kind: PortKind,
    subscribers: Vec<Subscriber>,
}

/// Arena owning every port and registered listener of one machine.
///
/// The wiring graph is built once, before the first clock step; after that
/// only the multiplexer's subscription moves. All propagation happens through
/// shared references, so components can re-enter the engine from their
/// callbacks.
pub struct Net {
    ports: RefCell<Vec<PortState>>,
    nodes: RefCell<Vec<Rc<RefCell<dyn Node>>>>,
}

impl Default for Net {
    fn default() -> Self {
        Self::new()
    }
}

impl Net {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            ports: RefCell::new(Vec::new()),
            nodes: RefCell::new(Vec::new()),
        }
    }

    /// Adds a sourced port of the given width, initially all-zero.
    pub fn add_port(&mut self, width: usize) -> PortId {
        self.push_port(PortState {
            width,
            value: Bits::new(width),
            kind: PortKind::Sourced,
            subscribers: Vec::new(),
        })
    }

    /// Adds a derived port selecting `len` bits of `source` starting at
    /// `offset`; positions past the source width read as 0.
    pub fn interval(&mut self, source: PortId, offset: usize, len: usize) -> PortId {
        self.add_derived(vec![source], Derive::Interval { offset, len }, len)
    }

    /// Adds a derived port carrying `source + by`, wrapped at the source
    /// width.
    pub fn increment(&mut self, source: PortId, by: u32) -> PortId {
        let width = self.width(source);
        self.add_derived(vec![source], Derive::Increment { by }, width)
    }

    /// Adds a derived port decoding the low 4 bits of `source` into a 16-bit
    /// one-hot vector.
    pub fn decoder_4_to_16(&mut self, source: PortId) -> PortId {
        self.add_derived(vec![source], Derive::Decoder4To16, 16)
    }

    /// Adds a derived port ANDing all `sources`, truncated to the narrowest
    /// source width.
    pub fn and_all(&mut self, sources: &[PortId]) -> PortId {
        let width = sources.iter().map(|&s| self.width(s)).min().unwrap_or(0);
        self.add_derived(sources.to_vec(), Derive::AndAll, width)
    }

    fn add_derived(&mut self, sources: Vec<PortId>, derive: Derive, width: usize) -> PortId {
        let id = self.push_port(PortState {
            width,
            value: Bits::new(width),
            kind: PortKind::Derived {
                sources: sources.clone(),
                derive,
            },
            subscribers: Vec::new(),
        });
        for source in sources {
            self.ports.borrow_mut()[source.0]
                .subscribers
                .push(Subscriber::Port(id));
        }
        id
    }

    fn push_port(&mut self, state: PortState) -> PortId {
        let mut ports = self.ports.borrow_mut();
        ports.push(state);
        PortId(ports.len() - 1)
    }

    /// Registers a listener and returns its handle.
    pub fn add_node(&mut self, node: Rc<RefCell<dyn Node>>) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        NodeId(nodes.len() - 1)
    }

    /// Appends `node` to the subscriber list of `port`.
    ///
    /// Subscribers are invoked in registration order; that order is part of
    /// the engine's contract.
    pub fn subscribe(&self, port: PortId, node: NodeId) {
        self.ports.borrow_mut()[port.0]
            .subscribers
            .push(Subscriber::Node(node));
    }

    /// Removes the first subscription of `node` on `port`, if any.
    pub fn unsubscribe(&self, port: PortId, node: NodeId) {
        let subscribers = &mut self.ports.borrow_mut()[port.0].subscribers;
        if let Some(position) = subscribers
            .iter()
            .position(|&s| s == Subscriber::Node(node))
        {
            let _ = subscribers.remove(position);
        }
    }

    /// Width of a port in bits.
    pub fn width(&self, port: PortId) -> usize {
        self.ports.borrow()[port.0].width
    }

    /// Current value of a port, as an independent copy.
    ///
    /// Sourced ports return their stored value; derived ports recompute from
    /// their sources.
    pub fn value(&self, port: PortId) -> Bits {
        let (sources, derive) = {
            let ports = self.ports.borrow();
            match &ports[port.0].kind {
                PortKind::Sourced => return ports[port.0].value.clone(),
                PortKind::Derived { sources, derive } => (sources.clone(), *derive),
            }
        };
        self.compute(&sources, derive)
    }

    /// Stores a width-adapted copy of `value` in a sourced port and notifies
    /// every subscriber, whether or not the value changed.
    ///
    /// # Panics
    ///
    /// Panics if `port` is a derived port; derived ports are written only
    /// through their sources.
    pub fn set(&self, port: PortId, value: &Bits) {
        {
            let mut ports = self.ports.borrow_mut();
            let state = &mut ports[port.0];
            assert!(
                matches!(state.kind, PortKind::Sourced),
                "derived ports cannot be set directly"
            );
            state.value = value.resized(state.width);
        }
        self.fan_out(port);
    }

    /// Drives a 1-bit port to `level`, notifying only on an actual change.
    ///
    /// This reproduces the guarded single-bit senders of the original design:
    /// flag and phase lines fire their subscribers only on edges.
    pub fn drive_bit(&self, port: PortId, level: bool) {
        if self.value(port).all_set() == level {
            return;
        }
        self.set(port, &Bits::from_u32(u32::from(level), 1));
    }

    fn fan_out(&self, port: PortId) {
        // Snapshot: the multiplexer rewires other ports' lists mid-cascade.
        let subscribers = self.ports.borrow()[port.0].subscribers.clone();
        for subscriber in subscribers {
            match subscriber {
                Subscriber::Port(derived) => self.fan_out(derived),
                Subscriber::Node(node) => {
                    let handler = self.nodes.borrow()[node.0].clone();
                    handler.borrow_mut().on_signal(self, port);
                }
            }
        }
    }

    fn compute(&self, sources: &[PortId], derive: Derive) -> Bits {
        match derive {
            Derive::Interval { offset, len } => {
                let source = self.value(sources[0]);
                let mut out = Bits::new(len);
                for i in 0..len {
                    if let Some(bit) = source.get(offset + i) {
                        out.set_bit(i, bit);
                    }
                }
                out
            }
            Derive::Increment { by } => {
                let source = self.value(sources[0]);
                let sum = (source.to_index() as u32).wrapping_add(by);
                Bits::from_u32(sum, source.len())
            }
            Derive::Decoder4To16 => {
                let source = self.value(sources[0]);
                let mut index = 0;
                for i in 0..4 {
                    if source.get(i) == Some(true) {
                        index |= 1 << i;
                    }
                }
                let mut out = Bits::new(16);
                out.set_bit(index, true);
                out
            }
            Derive::AndAll => {
                let width = sources
                    .iter()
                    .map(|&s| self.width(s))
                    .min()
                    .unwrap_or(0);
                let mut out = match sources.first() {
                    Some(&first) => self.value(first).resized(width),
                    None => return Bits::new(0),
                };
                for &source in &sources[1..] {
                    out = out.and(&self.value(source).resized(width));
                }
                out
            }
        }
    }
}

impl std::fmt::Debug for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Net")
            .field("ports", &self.ports.borrow().len())
            .field("nodes", &self.nodes.borrow().len())
            .finish()
    }
}
