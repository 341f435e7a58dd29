//! Client sink of the reference driver.
//!
//! Real client connections are outside the backplane; this sink renders each
//! delivery as the JSON frame a client would receive and logs it.

use serde::Serialize;
use tracing::{debug, warn};
use view_server::{ClientSink, Delivery};
use zone_protocol::ViewRef;

/// Frame sent to one view's client.
#[derive(Debug, Serialize)]
pub struct ClientFrame<'a> {
    pub view: ViewRef,
    pub delivery: &'a Delivery,
}

/// Renders `delivery` for `view`'s client.
pub fn render(view: ViewRef, delivery: &Delivery) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ClientFrame { view, delivery })
}

#[derive(Debug, Default)]
pub struct JsonSink {
    rendered: u64,
    failed: u64,
}

impl JsonSink {
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

impl ClientSink for JsonSink {
    fn deliver(&mut self, view: ViewRef, delivery: &Delivery) {
        match render(view, delivery) {
            Ok(frame) => {
                self.rendered += 1;
                debug!("📤 {}", frame);
            }
            Err(e) => {
                self.failed += 1;
                warn!("Failed to render delivery of {} for {}: {}", delivery.object(), view, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_protocol::{ObjectData, ObjectRef, Vec2d, ZoneCoord, ZoneRef};

    #[test]
    fn test_render_update_frame() {
        let delivery = Delivery::Update {
            object: ObjectRef::new(3),
            zone: ZoneRef::new(1, ZoneCoord::new(2, -1)),
            data: ObjectData::at(Vec2d::new(2500.0, -10.0)),
        };
        let frame = render(ViewRef::new(9), &delivery).expect("render");
        let value: serde_json::Value = serde_json::from_str(&frame).expect("valid json");

        assert_eq!(value["view"]["view_id"], 9);
        assert_eq!(value["delivery"]["kind"], "update");
        assert_eq!(value["delivery"]["object"]["object_id"], 3);
        assert_eq!(value["delivery"]["zone"]["coord"]["x"], 2);
        assert_eq!(value["delivery"]["zone"]["coord"]["y"], -1);
        assert_eq!(value["delivery"]["data"]["pos"]["x"], 2500.0);
    }

    #[test]
    fn test_sink_counts_frames() {
        let mut sink = JsonSink::default();
        let delivery = Delivery::Remove {
            object: ObjectRef::new(1),
        };
        sink.deliver(ViewRef::new(1), &delivery);
        sink.deliver(ViewRef::new(2), &delivery);
        assert_eq!(sink.rendered(), 2);
        assert_eq!(sink.failed(), 0);
    }
}
