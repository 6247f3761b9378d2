use tokio::sync::mpsc;

use crate::error::{BridgeError, Result};

/// Outbound half of the message channel to the native host.
///
/// On device this is the WebView's `postMessage` binding; the inbound half is
/// whatever feeds [`BridgeClient::dispatch`](crate::bridge::BridgeClient::dispatch).
pub trait HostTransport: Send + Sync {
    fn post_message(&self, message: String) -> Result<()>;
}

/// Transport backed by an unbounded tokio channel. The embedding layer (or a
/// test) drains the receiver and forwards each message to the host.
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl HostTransport for ChannelTransport {
    fn post_message(&self, message: String) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| BridgeError::transport("host channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_transport_delivers_in_order() {
        let (transport, mut receiver) = ChannelTransport::new();
        transport.post_message("one".to_string()).unwrap();
        transport.post_message("two".to_string()).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), "one");
        assert_eq!(receiver.try_recv().unwrap(), "two");
    }

    #[test]
    fn test_closed_channel_is_a_transport_error() {
        let (transport, receiver) = ChannelTransport::new();
        drop(receiver);
        assert!(matches!(
            transport.post_message("lost".to_string()),
            Err(BridgeError::Transport(_))
        ));
    }
}
