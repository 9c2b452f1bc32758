use log::info;

use crate::model::{DeviceEvent, DeviceIdentity};

/// Consumer of watched-device transitions.
pub trait EventSink {
    fn on_detected(&mut self, identity: DeviceIdentity);
    fn on_removed(&mut self, identity: DeviceIdentity);

    fn dispatch(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Detected(id) => self.on_detected(id),
            DeviceEvent::Removed(id) => self.on_removed(id),
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_detected(&mut self, identity: DeviceIdentity) {
        (**self).on_detected(identity)
    }

    fn on_removed(&mut self, identity: DeviceIdentity) {
        (**self).on_removed(identity)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn on_detected(&mut self, identity: DeviceIdentity) {
        (**self).on_detected(identity)
    }

    fn on_removed(&mut self, identity: DeviceIdentity) {
        (**self).on_removed(identity)
    }
}

/// Reports transitions through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_detected(&mut self, identity: DeviceIdentity) {
        info!("Listed device detected: {}", identity);
    }

    fn on_removed(&mut self, identity: DeviceIdentity) {
        info!("Listed device removed: {}", identity);
    }
}

/// Adapts a closure taking a [DeviceEvent] into an [EventSink].
pub struct FnSink<F: FnMut(DeviceEvent)>(pub F);

impl<F: FnMut(DeviceEvent)> EventSink for FnSink<F> {
    fn on_detected(&mut self, identity: DeviceIdentity) {
        (self.0)(DeviceEvent::Detected(identity))
    }

    fn on_removed(&mut self, identity: DeviceIdentity) {
        (self.0)(DeviceEvent::Removed(identity))
    }
}
