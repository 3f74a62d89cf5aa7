/// Traffic carried by the 1-Wire fabric.
///
/// The emulation collapses the electrical protocol into two message kinds: a
/// reset pulse and a byte of data. Bit-level primitives (single-bit writes,
/// triplet direction hints) still travel as a [`OneWireMessage::Data`] byte;
/// clients that do not understand them ignore the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireMessage {
    /// A reset pulse. Clients acknowledge it to signal their presence.
    Reset,
    /// One byte of bus traffic, most commonly a ROM or function command.
    Data(u8),
}

/// A device hanging off a [`OneWireBus`](crate::OneWireBus).
///
/// Clients are passive: they only ever see traffic the bus delivers through
/// [`send`](OneWireClient::send), and they surface response bytes by queuing
/// them for the bus to collect via [`recv`](OneWireClient::recv).
pub trait OneWireClient {
    /// Handles a message broadcast on the bus.
    ///
    /// Returns whether the client responded. For a reset pulse the return
    /// value is the presence pulse. For data the return is advisory; a
    /// client may report `false` for a byte it acts on.
    fn send(&mut self, message: OneWireMessage) -> bool;

    /// Surrenders the next queued response byte, or 0 if none is queued.
    fn recv(&mut self) -> u8;

    /// Whether the client currently has response bytes queued.
    fn has_data(&self) -> bool;
}

/// The upstream endpoint of a [`OneWireBus`](crate::OneWireBus).
///
/// The master is whatever drives the bus from above, typically a bridge
/// controller relaying for a host. The fabric notifies it of presence
/// acknowledgements and relays device data bytes addressed upstream.
pub trait OneWireMaster {
    /// Handles a message travelling up from the bus side.
    ///
    /// Returns whether the master accepted the message.
    fn send(&mut self, message: OneWireMessage) -> bool;
}
