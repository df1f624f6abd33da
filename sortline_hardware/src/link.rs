//! In-process byte link connecting the two nodes.
//!
//! `pair()` returns two connected endpoints backed by unbounded
//! crossbeam channels, one per direction. The link is a plain FIFO of
//! bytes: no framing, no acknowledgement. A hung-up peer surfaces as
//! `HwError::LinkClosed` on write; reads drain whatever the peer sent
//! before disconnecting, then report empty.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use sortline_traits::{HwResult, LinkPort};

use crate::error::HwError;

pub struct ChannelLink {
    tx: Sender<u8>,
    rx: Receiver<u8>,
}

/// Two connected endpoints; bytes written to one come out of the other.
pub fn pair() -> (ChannelLink, ChannelLink) {
    let (a_tx, a_rx) = unbounded();
    let (b_tx, b_rx) = unbounded();
    (
        ChannelLink { tx: a_tx, rx: b_rx },
        ChannelLink { tx: b_tx, rx: a_rx },
    )
}

impl LinkPort for ChannelLink {
    fn write(&mut self, bytes: &[u8]) -> HwResult<bool> {
        for &b in bytes {
            if self.tx.send(b).is_err() {
                return Err(HwError::LinkClosed.into());
            }
        }
        Ok(true)
    }

    fn read_byte(&mut self) -> HwResult<Option<u8>> {
        match self.rx.try_recv() {
            Ok(b) => Ok(Some(b)),
            Err(TryRecvError::Empty) => Ok(None),
            // Drained and hung up: nothing more will ever arrive.
            Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn available(&self) -> usize {
        self.rx.len()
    }
}
