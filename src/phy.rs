// optiga-rs/src/phy.rs
//! Physical layer: framed register access over the two-wire bus.
//!
//! The element exposes a handful of byte-addressed registers; the DATA
//! register behaves as a frame FIFO. Every transaction may NACK while the
//! element is internally busy, so both phases of a register access are
//! retried with a pause in between.

use std::thread;
use std::time::Duration;

use crate::bus::TwoWireBus;
use crate::config::Config;
use crate::constants::{
    DATA_REG_LEN_MIN, I2C_STATE_FLAG_BUSY, I2C_STATE_FLAG_RESP_READY, REG_DATA, REG_DATA_REG_LEN,
    REG_I2C_STATE, REG_SOFT_RESET,
};
use crate::types::BusAddress;
use crate::utils::get_be16;
use crate::{Error, Result};

/// Snapshot of the I2C_STATE register.
#[derive(Debug, Clone, Copy)]
pub struct BusState {
    pub flags: u8,
    /// Length of the frame waiting in the DATA register, zero if none.
    pub read_len: u16,
}

impl BusState {
    pub fn busy(&self) -> bool {
        self.flags & I2C_STATE_FLAG_BUSY != 0
    }

    pub fn response_ready(&self) -> bool {
        self.flags & I2C_STATE_FLAG_RESP_READY != 0
    }
}

/// Physical layer state: the bus handle and the negotiated DATA_REG_LEN.
pub struct Phy {
    bus: Box<dyn TwoWireBus>,
    addr: BusAddress,
    data_reg_len: u16,
    ack_tries: u32,
    ack_pause: Duration,
    poll_tries: u32,
    poll_interval: Duration,
    guard_time: Duration,
    data_reg_len_limit: u16,
}

impl Phy {
    pub fn new(bus: Box<dyn TwoWireBus>, config: &Config) -> Self {
        Self {
            bus,
            addr: config.bus_address,
            data_reg_len: config.data_reg_len_limit,
            ack_tries: config.ack_tries,
            ack_pause: config.ack_pause,
            poll_tries: config.poll_tries,
            poll_interval: config.poll_interval,
            guard_time: config.guard_time,
            data_reg_len_limit: config.data_reg_len_limit,
        }
    }

    /// Negotiated DATA_REG_LEN; the frame length ceiling for the layers
    /// above.
    pub fn data_reg_len(&self) -> u16 {
        self.data_reg_len
    }

    fn pause(d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }

    /// One write transaction, retried while the element NACKs.
    fn acked_write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut last = Error::Nack;
        for _ in 0..self.ack_tries {
            match self.bus.write(self.addr, bytes) {
                Ok(()) => return Ok(()),
                Err(e) => last = e,
            }
            Self::pause(self.ack_pause);
        }
        Err(last)
    }

    /// One read transaction, retried while the element NACKs.
    fn acked_read(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut last = Error::Nack;
        for _ in 0..self.ack_tries {
            match self.bus.read(self.addr, buf) {
                Ok(()) => return Ok(()),
                Err(e) => last = e,
            }
            Self::pause(self.ack_pause);
        }
        Err(last)
    }

    /// Write `data` to register `reg` in one transaction.
    pub fn reg_write(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        let mut tx = Vec::with_capacity(1 + data.len());
        tx.push(reg);
        tx.extend_from_slice(data);
        self.acked_write(&tx)
    }

    /// Select register `reg`, then read `buf.len()` bytes. Both phases are
    /// retried independently.
    pub fn reg_read(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(Error::InvalidLength {
                expected: 1,
                actual: 0,
            });
        }
        self.acked_write(&[reg])?;
        // Guard time required by the element between transactions
        Self::pause(self.guard_time);
        self.acked_read(buf)
    }

    /// Read the I2C_STATE register.
    pub fn bus_state(&mut self) -> Result<BusState> {
        let mut raw = [0u8; 4];
        self.reg_read(REG_I2C_STATE, &mut raw)?;
        // byte 1 is reserved
        Ok(BusState {
            flags: raw[0],
            read_len: get_be16(&raw, 2),
        })
    }

    fn soft_reset(&mut self) -> Result<()> {
        self.reg_write(REG_SOFT_RESET, &[0x00, 0x00])
    }

    fn read_data_reg_len(&mut self) -> Result<u16> {
        let mut raw = [0u8; 2];
        self.reg_read(REG_DATA_REG_LEN, &mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }

    /// Negotiate DATA_REG_LEN: cap the element's advertised value at the
    /// host limit, write the cap back and confirm it took effect.
    fn negotiate_data_reg_len(&mut self) -> Result<()> {
        let mut advertised = self.read_data_reg_len()?;

        if advertised > self.data_reg_len_limit {
            let limit = self.data_reg_len_limit;
            self.reg_write(REG_DATA_REG_LEN, &limit.to_be_bytes())?;
            advertised = self.read_data_reg_len()?;
            if advertised != limit {
                return Err(Error::DataRegLen { value: advertised });
            }
        } else if advertised < DATA_REG_LEN_MIN {
            return Err(Error::DataRegLen { value: advertised });
        }

        self.data_reg_len = advertised;
        Ok(())
    }

    /// Bring the element to a known state: soft reset, wait for it to come
    /// back, negotiate the data register window.
    pub fn init(&mut self) -> Result<()> {
        self.soft_reset()?;
        self.wait_ready()?;
        self.negotiate_data_reg_len()?;
        Ok(())
    }

    /// Poll I2C_STATE until the element accepts commands or has a response,
    /// bounded by the poll budget.
    fn wait_ready(&mut self) -> Result<BusState> {
        for _ in 0..self.poll_tries {
            let state = self.bus_state()?;
            if !state.busy() || state.response_ready() {
                return Ok(state);
            }
            Self::pause(self.poll_interval);
        }
        Err(Error::Timeout)
    }

    /// Write one frame to the DATA register. The caller guarantees
    /// `frame.len() <= data_reg_len`.
    pub fn write_data(&mut self, frame: &[u8]) -> Result<()> {
        debug_assert!(frame.len() <= self.data_reg_len as usize);
        self.reg_write(REG_DATA, frame)
    }

    /// Wait for a frame to become available and read it whole.
    pub fn read_data(&mut self) -> Result<Vec<u8>> {
        let mut state = self.wait_ready()?;

        // Ready but nothing advertised yet: give the element the rest of
        // the poll budget to post its frame length.
        if state.read_len == 0 {
            for _ in 0..self.poll_tries {
                Self::pause(self.poll_interval);
                state = self.bus_state()?;
                if state.read_len != 0 {
                    break;
                }
            }
            if state.read_len == 0 {
                return Err(Error::Timeout);
            }
        }

        let mut buf = vec![0u8; state.read_len as usize];
        self.reg_read(REG_DATA, &mut buf)?;
        Ok(buf)
    }

    /// Length of the frame currently waiting in the DATA register, without
    /// blocking. Used by the data-link layer to spot pending control
    /// frames after a send.
    pub fn available(&mut self) -> Result<u16> {
        Ok(self.bus_state()?.read_len)
    }
}
