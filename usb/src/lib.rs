#[cfg(windows)]
mod raw_input;
#[cfg(windows)]
mod notify;

use anyhow::*;
use devwatch_core::{EventSink, WatchList};

#[cfg(windows)]
pub use imp::*;

#[cfg(not(windows))]
pub use nop::*;

#[cfg(windows)]
mod imp {
    use super::*;
    use core::result::Result::Ok;
    use std::sync::Arc;
    use log::info;
    use devwatch_core::{ChangeEventDispatcher, StartupScanner};

    pub use crate::notify::{decode_device_change, DeviceNotifier};
    pub use crate::raw_input::RawInput;

    /// Reports watched devices that are already attached, then subscribes
    /// to device changes. Notifications are delivered through the message
    /// loop of the calling thread for as long as the returned notifier lives.
    pub fn watch_attach<E: EventSink + 'static>(watch_list: WatchList, mut sink: E) -> Result<DeviceNotifier> {
        let watch_list = Arc::new(watch_list);
        info!("Watching {} device(s)", watch_list.len());

        StartupScanner::new(watch_list.clone()).scan(&RawInput, &mut sink);

        let dispatcher = ChangeEventDispatcher::new(watch_list);
        DeviceNotifier::new(move |notification| {
            dispatcher.handle(&notification, &mut sink);
        })
    }

    /// Like [watch_attach], then runs the message loop until `WM_QUIT`.
    pub fn watch_start<E: EventSink + 'static>(watch_list: WatchList, sink: E) -> Result<()> {
        let notifier = watch_attach(watch_list, sink)?;
        info!("Waiting for device changes...");
        notifier.run()
    }

    pub const fn watch_supported() -> bool {
        true
    }
}

#[cfg(not(windows))]
mod nop {
    use super::*;

    pub fn watch_start<E: EventSink + 'static>(_watch_list: WatchList, _sink: E) -> Result<()> {
        bail!("Device change notifications are only available on Windows")
    }

    pub const fn watch_supported() -> bool {
        false
    }
}
