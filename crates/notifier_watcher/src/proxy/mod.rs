//! Proxies for DBus services, so we can call them.
//!
//! The interface XML file was taken from
//! [Waybar](https://github.com/Alexays/Waybar/tree/master/protocol), and the proxy was
//! generated with [zbus-xmlgen](https://docs.rs/crate/zbus_xmlgen/latest) by running
//! `zbus-xmlgen file dbus_status_notifier_item.xml`.
//!
//! For more information, see ["Writing a client proxy" in the zbus
//! tutorial](https://dbus2.github.io/zbus/).

mod dbus_status_notifier_item;
pub use dbus_status_notifier_item::*;
