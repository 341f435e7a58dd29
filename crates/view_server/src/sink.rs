//! Client connection collaborator.

use crate::delivery::Delivery;
use zone_protocol::ViewRef;

/// Receives deliveries on behalf of a view's remote client.
///
/// The view server calls `deliver` once per watching view, in queue order.
/// Implementations own the transport and its framing.
pub trait ClientSink {
    fn deliver(&mut self, view: ViewRef, delivery: &Delivery);
}

impl<F> ClientSink for F
where
    F: FnMut(ViewRef, &Delivery),
{
    fn deliver(&mut self, view: ViewRef, delivery: &Delivery) {
        (*self)(view, delivery)
    }
}

/// Sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct BufferedSink {
    pub deliveries: Vec<(ViewRef, Delivery)>,
}

impl BufferedSink {
    pub fn take(&mut self) -> Vec<(ViewRef, Delivery)> {
        std::mem::take(&mut self.deliveries)
    }

    /// Deliveries received for one view, in order.
    pub fn for_view(&self, view: ViewRef) -> Vec<&Delivery> {
        self.deliveries
            .iter()
            .filter(|(recipient, _)| *recipient == view)
            .map(|(_, delivery)| delivery)
            .collect()
    }
}

impl ClientSink for BufferedSink {
    fn deliver(&mut self, view: ViewRef, delivery: &Delivery) {
        self.deliveries.push((view, delivery.clone()));
    }
}
