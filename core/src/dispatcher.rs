use std::sync::Arc;

use log::{debug, trace};

use crate::ident::identity_from_path;
use crate::model::DeviceEvent;
use crate::sink::EventSink;
use crate::watch_list::WatchList;

/// Payload of a device-change broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Broadcast {
    DeviceInterface { path: String },
    /// Any other broadcast category (volume, port, handle...), by raw type tag.
    Other(u32),
}

/// Device-change notification as delivered by the host platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Arrival(Broadcast),
    RemoveComplete(Broadcast),
    /// Query/cancel/node-change codes that carry no transition.
    Other(u32),
}

/// Turns device-change notifications into watched-device events.
pub struct ChangeEventDispatcher {
    watch_list: Arc<WatchList>,
}

impl ChangeEventDispatcher {
    pub fn new(watch_list: Arc<WatchList>) -> Self {
        Self { watch_list }
    }

    /// Handles one notification to completion, invoking `sink` at most once.
    /// Returns the event that was emitted, if any.
    pub fn handle<E: EventSink>(&self, notification: &Notification, sink: &mut E) -> Option<DeviceEvent> {
        let event = self.translate(notification)?;
        sink.dispatch(event);
        Some(event)
    }

    fn translate(&self, notification: &Notification) -> Option<DeviceEvent> {
        let (broadcast, arrival) = match notification {
            Notification::Arrival(b) => (b, true),
            Notification::RemoveComplete(b) => (b, false),
            Notification::Other(code) => {
                trace!("Ignoring device change 0x{code:04x}");
                return None;
            }
        };

        let path = match broadcast {
            Broadcast::DeviceInterface { path } => path,
            Broadcast::Other(devtype) => {
                trace!("Ignoring broadcast of device type {devtype}");
                return None;
            }
        };

        let Some(identity) = identity_from_path(path) else {
            debug!("No vendor/product id in {path:?}");
            return None;
        };
        if !self.watch_list.is_watched(&identity) {
            trace!("Unwatched device {identity} at {path:?}");
            return None;
        }

        Some(if arrival {
            DeviceEvent::Detected(identity)
        } else {
            DeviceEvent::Removed(identity)
        })
    }
}
