// optiga-rs/src/config.rs

use std::time::Duration;

use crate::constants;
use crate::types::BusAddress;

/// Tuning knobs for one driver instance.
///
/// The defaults match the element's datasheet timings; tests shrink the
/// pauses so fault-injection runs stay fast.
#[derive(Debug, Clone)]
pub struct Config {
    /// 7-bit bus address of the element.
    pub bus_address: BusAddress,
    /// Register transaction attempts before a NACK becomes an I/O failure.
    pub ack_tries: u32,
    /// Pause between register transaction attempts.
    pub ack_pause: Duration,
    /// Status poll attempts while waiting for a response frame.
    pub poll_tries: u32,
    /// Pause between status polls. `poll_tries * poll_interval` bounds the
    /// receive deadline of the data-link layer.
    pub poll_interval: Duration,
    /// Guard pause between register select and register read.
    pub guard_time: Duration,
    /// Host ceiling for the negotiated DATA_REG_LEN.
    pub data_reg_len_limit: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_address: BusAddress::default(),
            ack_tries: constants::PHY_ACK_TRIES,
            ack_pause: Duration::from_millis(constants::PHY_ACK_RETRY_MS),
            poll_tries: constants::PHY_POLL_TRIES,
            poll_interval: Duration::from_millis(constants::PHY_POLL_INTERVAL_MS),
            guard_time: Duration::from_micros(constants::PHY_GUARD_TIME_US),
            data_reg_len_limit: constants::DATA_REG_LEN_DEFAULT,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus_address(mut self, addr: BusAddress) -> Self {
        self.bus_address = addr;
        self
    }

    pub fn with_poll(mut self, tries: u32, interval: Duration) -> Self {
        self.poll_tries = tries;
        self.poll_interval = interval;
        self
    }

    pub fn with_ack_retry(mut self, tries: u32, pause: Duration) -> Self {
        self.ack_tries = tries;
        self.ack_pause = pause;
        self
    }

    pub fn with_data_reg_len_limit(mut self, limit: u16) -> Self {
        self.data_reg_len_limit = limit;
        self
    }

    /// Configuration with all pauses zeroed, for tests against in-process
    /// mock elements that are always ready.
    pub fn fast() -> Self {
        Self {
            ack_pause: Duration::ZERO,
            poll_interval: Duration::ZERO,
            guard_time: Duration::ZERO,
            ..Self::default()
        }
    }
}
