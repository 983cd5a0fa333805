//! Service side of the freedesktop StatusNotifierItem tray protocol: a
//! [`Watcher`] bus service that accepts item registrations, resolves each
//! item's icon into a raw RGBA8 buffer and maintains the deduplicated
//! [`Registry`] a display layer rebuilds from.

pub mod proxy;

mod error;
pub use error::*;

mod host;
pub use host::*;

mod icon;
pub use icon::*;

mod item;
pub use item::*;

mod registry;
pub use registry::*;

mod tray;
pub use tray::*;

mod watcher;
pub use watcher::*;

pub(crate) mod names {
    pub const WATCHER_BUS: &str = "org.kde.StatusNotifierWatcher";
    pub const WATCHER_OBJECT: &str = "/StatusNotifierWatcher";

    pub const ITEM_OBJECT: &str = "/StatusNotifierItem";
    pub const HOST_BUS_PREFIX: &str = "org.kde.StatusNotifierHost-";
}
