use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::traits::{OneWireClient, OneWireMaster, OneWireMessage};

/// Shared handle to a device attached to a bus.
///
/// Clients are independently owned; the bus only registers a handle. Holding
/// on to the original `Rc` lets the owner keep reconfiguring the device (for
/// example changing a sensor's temperature) while it is attached.
pub type SharedClient = Rc<RefCell<dyn OneWireClient>>;

/// Shared handle to a bus instance, as wired into a bridge channel.
pub type SharedBus = Rc<RefCell<OneWireBus>>;

/// A single 1-Wire bus segment.
///
/// The bus delivers master-originated traffic to every attached client in
/// attach order and arbitrates client-to-master reads: the first attached
/// client with data queued supplies the byte. The emulation assumes a single
/// responder per transaction instead of modeling the wired-AND electrical
/// behavior, so attach order decides ties.
#[derive(Default)]
pub struct OneWireBus {
    clients: Vec<SharedClient>,
    master: Option<Weak<RefCell<dyn OneWireMaster>>>,
}

impl OneWireBus {
    /// Creates an empty bus with no clients and no master.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a client to the end of the delivery order.
    ///
    /// Attaching a handle that is already on this bus is ignored, so a client
    /// never receives the same broadcast twice. A client belongs to at most
    /// one bus; the bus checks only its own membership, so keeping a handle
    /// off other buses is up to the caller.
    pub fn attach(&mut self, client: SharedClient) {
        if self.clients.iter().any(|c| Rc::ptr_eq(c, &client)) {
            return;
        }
        self.clients.push(client);
    }

    /// Detaches a client, matched by handle identity.
    ///
    /// Returns whether the client was attached. Delivery order of the
    /// remaining clients is preserved.
    pub fn detach(&mut self, client: &SharedClient) -> bool {
        let before = self.clients.len();
        self.clients.retain(|c| !Rc::ptr_eq(c, client));
        self.clients.len() != before
    }

    /// Broadcasts a reset pulse to every client.
    ///
    /// Returns whether any client acknowledged, which models bus-level
    /// presence detect. An acknowledgement is also relayed upstream to the
    /// registered master, if there is one.
    pub fn broadcast_reset(&mut self) -> bool {
        let responded = self.broadcast(OneWireMessage::Reset);
        if responded
            && let Some(master) = self.master()
        {
            master.borrow_mut().send(OneWireMessage::Reset);
        }
        responded
    }

    /// Broadcasts a data byte to every client.
    ///
    /// Returns whether any client reported handling the byte.
    pub fn broadcast_byte(&mut self, byte: u8) -> bool {
        self.broadcast(OneWireMessage::Data(byte))
    }

    /// Reads one byte off the bus.
    ///
    /// The first attached client with data queued supplies it; 0 when no
    /// client has anything to say.
    pub fn read_byte(&mut self) -> u8 {
        for client in &self.clients {
            if client.borrow().has_data() {
                return client.borrow_mut().recv();
            }
        }
        0
    }

    /// Registers the upstream master endpoint.
    ///
    /// The reference is non-owning; the bus never keeps a master alive.
    pub fn set_master(&mut self, master: Weak<RefCell<dyn OneWireMaster>>) {
        self.master = Some(master);
    }

    /// The registered master, if one is set and still alive.
    pub fn master(&self) -> Option<Rc<RefCell<dyn OneWireMaster>>> {
        self.master.as_ref()?.upgrade()
    }

    /// Relays a data byte upstream to the registered master.
    ///
    /// Returns whether a master was there to take it.
    pub fn send_to_master(&self, data: u8) -> bool {
        match self.master() {
            Some(master) => master.borrow_mut().send(OneWireMessage::Data(data)),
            None => false,
        }
    }

    fn broadcast(&mut self, message: OneWireMessage) -> bool {
        let mut responded = false;
        for client in &self.clients {
            if client.borrow_mut().send(message) {
                responded = true;
            }
        }
        responded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<OneWireMessage>,
        ack_reset: bool,
        queue: VecDeque<u8>,
    }

    impl Recorder {
        fn acking() -> Self {
            Recorder {
                ack_reset: true,
                ..Default::default()
            }
        }

        fn queued(bytes: &[u8]) -> Self {
            Recorder {
                queue: bytes.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl OneWireClient for Recorder {
        fn send(&mut self, message: OneWireMessage) -> bool {
            self.seen.push(message);
            matches!(message, OneWireMessage::Reset) && self.ack_reset
        }

        fn recv(&mut self) -> u8 {
            self.queue.pop_front().unwrap_or(0)
        }

        fn has_data(&self) -> bool {
            !self.queue.is_empty()
        }
    }

    #[derive(Default)]
    struct UpstreamLog {
        seen: Vec<OneWireMessage>,
    }

    impl OneWireMaster for UpstreamLog {
        fn send(&mut self, message: OneWireMessage) -> bool {
            self.seen.push(message);
            true
        }
    }

    #[test]
    fn detach_reports_membership() {
        let mut bus = OneWireBus::new();
        let client = Rc::new(RefCell::new(Recorder::default()));
        bus.attach(client.clone());

        let handle: SharedClient = client.clone();
        assert!(bus.detach(&handle));
        assert!(!bus.detach(&handle));

        bus.broadcast_byte(0x55);
        assert!(client.borrow().seen.is_empty());
    }

    #[test]
    fn double_attach_delivers_once() {
        let mut bus = OneWireBus::new();
        let client = Rc::new(RefCell::new(Recorder::default()));
        bus.attach(client.clone());
        bus.attach(client.clone());

        bus.broadcast_byte(0xcc);
        assert_eq!(client.borrow().seen, vec![OneWireMessage::Data(0xcc)]);
    }

    #[test]
    fn reset_aggregates_presence() {
        let mut bus = OneWireBus::new();
        assert!(!bus.broadcast_reset());

        let silent = Rc::new(RefCell::new(Recorder::default()));
        bus.attach(silent.clone());
        assert!(!bus.broadcast_reset());

        let present = Rc::new(RefCell::new(Recorder::acking()));
        bus.attach(present.clone());
        assert!(bus.broadcast_reset());
        // every client still saw both pulses
        assert_eq!(silent.borrow().seen.len(), 2);
        assert_eq!(present.borrow().seen.len(), 1);
    }

    #[test]
    fn first_attached_client_wins_reads() {
        let mut bus = OneWireBus::new();
        let first = Rc::new(RefCell::new(Recorder::queued(&[0xaa])));
        let second = Rc::new(RefCell::new(Recorder::queued(&[0x55])));
        bus.attach(first.clone());
        bus.attach(second.clone());

        assert_eq!(bus.read_byte(), 0xaa);
        assert!(second.borrow().has_data());
        assert_eq!(bus.read_byte(), 0x55);
        assert_eq!(bus.read_byte(), 0);
    }

    #[test]
    fn reset_ack_reaches_registered_master() {
        let mut bus = OneWireBus::new();
        let upstream = Rc::new(RefCell::new(UpstreamLog::default()));
        bus.set_master(Rc::<RefCell<UpstreamLog>>::downgrade(&upstream));

        let silent = Rc::new(RefCell::new(Recorder::default()));
        bus.attach(silent);
        bus.broadcast_reset();
        assert!(upstream.borrow().seen.is_empty());

        let present = Rc::new(RefCell::new(Recorder::acking()));
        bus.attach(present);
        bus.broadcast_reset();
        assert_eq!(upstream.borrow().seen, vec![OneWireMessage::Reset]);
    }

    #[test]
    fn data_relay_to_master() {
        let mut bus = OneWireBus::new();
        assert!(!bus.send_to_master(0x31));

        let upstream = Rc::new(RefCell::new(UpstreamLog::default()));
        bus.set_master(Rc::<RefCell<UpstreamLog>>::downgrade(&upstream));
        assert!(bus.send_to_master(0x31));
        assert_eq!(upstream.borrow().seen, vec![OneWireMessage::Data(0x31)]);
    }

    #[test]
    fn dead_master_is_absent() {
        let mut bus = OneWireBus::new();
        let upstream = Rc::new(RefCell::new(UpstreamLog::default()));
        bus.set_master(Rc::<RefCell<UpstreamLog>>::downgrade(&upstream));
        drop(upstream);

        assert!(bus.master().is_none());
        assert!(!bus.send_to_master(0x00));
    }
}
