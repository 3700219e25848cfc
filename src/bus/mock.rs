// optiga-rs/src/bus/mock.rs

use std::collections::VecDeque;

use crate::bus::traits::TwoWireBus;
use crate::types::BusAddress;
use crate::{Error, Result};

/// Register-level scripted bus for unit tests. It records every write
/// transaction and serves queued read results in FIFO order.
///
/// For full round-trip tests against a protocol-aware element model, use
/// `test_support::MockElement` instead.
#[derive(Debug, Default)]
pub struct MockBus {
    /// Raw write transactions, register address first.
    pub written: Vec<Vec<u8>>,
    /// Queued read results, served front to back.
    pub reads: VecDeque<Vec<u8>>,
    /// Number of upcoming write transactions that should NACK.
    pub write_failures: usize,
    /// Number of upcoming read transactions that should NACK.
    pub read_failures: usize,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of a future read transaction. Shorter scripts are
    /// zero-extended to the reader's buffer length.
    pub fn push_read(&mut self, bytes: Vec<u8>) {
        self.reads.push_back(bytes);
    }

    /// Make the next `n` write transactions fail with a NACK.
    pub fn fail_writes(&mut self, n: usize) {
        self.write_failures = n;
    }

    /// Make the next `n` read transactions fail with a NACK.
    pub fn fail_reads(&mut self, n: usize) {
        self.read_failures = n;
    }

    /// Last register address selected or written.
    pub fn last_register(&self) -> Option<u8> {
        self.written.last().and_then(|w| w.first().copied())
    }
}

/// Handle to a [`MockBus`] that stays inspectable after the driver takes
/// ownership of the bus. All clones share the same scripted state.
#[derive(Debug, Clone, Default)]
pub struct SharedMockBus(pub std::sync::Arc<std::sync::Mutex<MockBus>>);

impl SharedMockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the underlying mock for scripting or assertions.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, MockBus> {
        self.0.lock().expect("mock bus poisoned")
    }
}

impl TwoWireBus for SharedMockBus {
    fn write(&mut self, addr: BusAddress, bytes: &[u8]) -> Result<()> {
        self.lock().write(addr, bytes)
    }

    fn read(&mut self, addr: BusAddress, buf: &mut [u8]) -> Result<()> {
        self.lock().read(addr, buf)
    }
}

impl TwoWireBus for MockBus {
    fn write(&mut self, _addr: BusAddress, bytes: &[u8]) -> Result<()> {
        if self.write_failures > 0 {
            self.write_failures -= 1;
            return Err(Error::Nack);
        }
        self.written.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, _addr: BusAddress, buf: &mut [u8]) -> Result<()> {
        if self.read_failures > 0 {
            self.read_failures -= 1;
            return Err(Error::Nack);
        }
        let scripted = self.reads.pop_front().unwrap_or_default();
        for (dst, src) in buf.iter_mut().zip(scripted.iter().chain(std::iter::repeat(&0))) {
            *dst = *src;
        }
        Ok(())
    }
}
