// optiga-rs/src/nettran.rs
//! Network/transport layer: fragment one APDU across chain-flagged
//! packets on transmit, reassemble the chain on receive.

use crate::constants::{MAX_APDU_LEN, PACKET_HEADER_LEN};
use crate::datalink::DataLink;
use crate::protocol::packet::{wrap_fragment, Chain};
use crate::{Error, Result};

pub struct Nettran {
    dl: DataLink,
}

impl Nettran {
    pub fn new(dl: DataLink) -> Self {
        Self { dl }
    }

    /// Initialise the layers below. The chain state itself is per-APDU and
    /// needs no reset.
    pub fn init(&mut self) -> Result<()> {
        self.dl.init()
    }

    /// Largest APDU fragment that fits one frame.
    pub fn mtu(&self) -> usize {
        self.dl.max_packet_len() - PACKET_HEADER_LEN
    }

    /// Transmit one APDU, splitting it into a packet chain when it exceeds
    /// the MTU. Aborts on the first data-link failure.
    pub fn send_apdu(&mut self, apdu: &[u8]) -> Result<()> {
        if apdu.is_empty() {
            return Err(Error::InvalidLength {
                expected: 1,
                actual: 0,
            });
        }
        if apdu.len() > MAX_APDU_LEN {
            return Err(Error::ApduTooLong { len: apdu.len() });
        }

        let mtu = self.mtu();
        let total = apdu.len().div_ceil(mtu);
        for (index, fragment) in apdu.chunks(mtu).enumerate() {
            let chain = Chain::for_fragment(index, total);
            let packet = wrap_fragment(chain, fragment);
            self.dl.send(&packet)?;
        }
        Ok(())
    }

    /// Receive one APDU of at most `capacity` bytes. No partial APDU is
    /// ever delivered: chain violations and overflows fail the whole
    /// receive.
    pub fn recv_apdu(&mut self, capacity: usize) -> Result<Vec<u8>> {
        let mut apdu = Vec::new();

        let packet = self.dl.recv()?;
        let chain = Self::split_packet(&packet, &mut apdu, capacity)?;

        match chain {
            Chain::Only => return Ok(apdu),
            Chain::First => {}
            _ => {
                return Err(Error::ChainViolation {
                    pctr: chain.pctr(),
                })
            }
        }

        loop {
            let packet = self.dl.recv()?;
            match Self::split_packet(&packet, &mut apdu, capacity)? {
                Chain::Middle => {}
                Chain::Last => return Ok(apdu),
                other => {
                    return Err(Error::ChainViolation {
                        pctr: other.pctr(),
                    })
                }
            }
        }
    }

    /// Validate one packet, append its fragment to `apdu` and return its
    /// chain position.
    fn split_packet(packet: &[u8], apdu: &mut Vec<u8>, capacity: usize) -> Result<Chain> {
        let (&pctr, fragment) = packet.split_first().ok_or(Error::InvalidLength {
            expected: PACKET_HEADER_LEN,
            actual: 0,
        })?;
        let chain = Chain::from_pctr(pctr)?;

        if apdu.len() + fragment.len() > capacity {
            return Err(Error::BufferOverflow {
                capacity,
                needed: apdu.len() + fragment.len(),
            });
        }

        apdu.extend_from_slice(fragment);
        Ok(chain)
    }
}
