pub mod model;
pub mod ident;
pub mod watch_list;
pub mod sink;
pub mod scanner;
pub mod dispatcher;
pub mod config;

pub use model::{DeviceEvent, DeviceIdentity};
pub use watch_list::{ConfigurationError, WatchList};
pub use sink::{EventSink, FnSink, LogSink};
pub use scanner::{DeviceKind, DeviceSource, RawDeviceRecord, ScanReport, StartupScanner};
pub use dispatcher::{Broadcast, ChangeEventDispatcher, Notification};
