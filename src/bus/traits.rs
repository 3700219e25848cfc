// optiga-rs/src/bus/traits.rs

use crate::types::BusAddress;
use crate::Result;

/// Two-wire master abstraction the driver is built on.
///
/// Implementations wrap whatever gives the host a bus: a Linux i2c-dev
/// node, a USB-to-I2C bridge, or the in-process mock used by tests. The
/// element stretches its internal busy phases into NACKs, so a single
/// failed transaction is ordinary; the physical layer retries before
/// treating it as an I/O failure.
///
/// `Send` is required because the whole stack moves into the dispatcher
/// worker thread after initialisation.
pub trait TwoWireBus: Send {
    /// One master write transaction to `addr`. `Err(Error::Nack)` models
    /// an unacknowledged transaction.
    fn write(&mut self, addr: BusAddress, bytes: &[u8]) -> Result<()>;

    /// One master read transaction from `addr`, filling `buf` completely.
    fn read(&mut self, addr: BusAddress, buf: &mut [u8]) -> Result<()>;
}
