//! Channel-backed delegate adapter.
//!
//! Bridges the callback-style [`AcquisitionDelegate`] into an async
//! channel so reactive consumers can await acquisition outcomes as a
//! stream instead of implementing the trait themselves.

use async_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::flow::{AcquisitionDelegate, AcquisitionEvent};

/// Delegate forwarding every event into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    sender: Sender<AcquisitionEvent>,
}

impl ChannelDelegate {
    /// Creates the delegate and the receiving side of its channel.
    #[must_use]
    pub fn unbounded() -> (Self, Receiver<AcquisitionEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl AcquisitionDelegate for ChannelDelegate {
    fn on_event(&self, event: AcquisitionEvent) {
        if let Err(err) = self.sender.try_send(event) {
            warn!("dropping acquisition event: {err}");
        }
    }
}
