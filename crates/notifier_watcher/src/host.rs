use zbus::fdo::RequestNameFlags;

use crate::{names, Registry};

/// The display side of the tray.
///
/// Implemented by whatever renders the icons (a bar widget, for instance)
/// and injected into the [`Tray`][crate::Tray]. There is no incremental
/// update: every successful registration asks the consumer to rebuild the
/// whole displayed list from the registry.
pub trait Host: Send {
    /// The registry changed; rebuild the displayed icon list now. Anything
    /// borrowed from `registry` is only valid for the duration of the call.
    fn rebuild(&mut self, registry: &Registry);
}

/// Claim the per-process `org.kde.StatusNotifierHost-<pid>` name on `con`.
///
/// Owning the name is all the protocol needs to answer "is a host present"
/// probes from items; nothing is served under it.
pub(crate) async fn request_host_name(con: &zbus::Connection) -> zbus::Result<String> {
    let name = format!("{}{}", names::HOST_BUS_PREFIX, std::process::id());
    let flags = [RequestNameFlags::AllowReplacement, RequestNameFlags::ReplaceExisting];
    con.request_name_with_flags(name.as_str(), flags.into_iter().collect()).await?;
    Ok(name)
}
