use std::sync::{Arc, Mutex};

use zbus::{export::ordered_stream::OrderedStreamExt, fdo::RequestNameFlags, interface};

use crate::{host, load_icon, names, Error, ItemAddress, Result, Tray};

/// Lifecycle of the watcher's presence on the bus.
///
/// Events delivered by the bus drive the transitions: attaching walks
/// through `AcquiringNames` to `Active`, and losing the well-known name
/// later only clears `owns_watcher_name`. There is no terminal state;
/// teardown relies on process exit releasing the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Not yet attached to a connection.
    Unstarted,
    /// Attaching: the watcher object is being exported and the bus names
    /// requested.
    AcquiringNames,
    /// Serving registrations. `owns_watcher_name` drops to false if another
    /// watcher takes the well-known name; the service keeps serving through
    /// its existing object either way.
    Active { owns_watcher_name: bool },
}

/// An instance of [`org.kde.StatusNotifierWatcher`]: accepts tray item
/// registrations, resolves each item's icon and feeds the shared [`Tray`].
///
/// The host side of the protocol is folded in: the watcher claims a
/// per-process `StatusNotifierHost` name so that items consider a host
/// present, and `RegisterStatusNotifierHost` is accepted without any
/// bookkeeping.
///
/// [`org.kde.StatusNotifierWatcher`]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierWatcher/
pub struct Watcher {
    tray: Arc<Mutex<Tray>>,

    // Intentionally std::sync::Mutex, never held across an await.
    //
    // See <https://docs.rs/tokio/latest/tokio/sync/struct.Mutex.html#which-kind-of-mutex-should-you-use>
    state: Arc<Mutex<ServiceState>>,
}

#[interface(name = "org.kde.StatusNotifierWatcher")]
impl Watcher {
    /// RegisterStatusNotifierItem method
    async fn register_status_notifier_item(
        &self,
        service: &str,
        #[zbus(header)] hdr: zbus::MessageHeader<'_>,
        #[zbus(connection)] con: &zbus::Connection,
        #[zbus(signal_context)] ctxt: zbus::SignalContext<'_>,
    ) -> zbus::fdo::Result<()> {
        let sender = match hdr.sender() {
            Some(sender) => sender.as_str(),
            None => {
                log::warn!("ignoring item registration without a sender: {:?}", service);
                return Ok(());
            }
        };
        let address = ItemAddress::parse(service, sender);

        {
            let tray = self.tray.lock().unwrap(); // unwrap: mutex poisoning is okay
            if tray.registry().contains(&address) {
                log::info!("rejecting duplicate item {}", address);
                return Ok(());
            }
        }

        // Property round trips and the file decode run inline; a slow item
        // stalls all other dispatch on this connection until it resolves.
        let icon = match address.item_proxy(con).await {
            Ok(sni) => load_icon(&sni).await,
            Err(e) => {
                log::debug!("{}: building item proxy: {} (registering without icon)", address, e);
                None
            }
        };

        if !self.tray.lock().unwrap().register(address.clone(), icon) {
            log::info!("rejecting duplicate item {}", address);
            return Ok(());
        }
        log::info!("registered item {}", address);

        self.registered_status_notifier_items_changed(&ctxt).await?;
        Watcher::status_notifier_item_registered(&ctxt, address.to_string().as_str()).await?;
        Ok(())
    }

    /// RegisterStatusNotifierHost method
    async fn register_status_notifier_host(&self, service: &str) -> zbus::fdo::Result<()> {
        // Accepted so the handshake succeeds, but not tracked: this process
        // is the only host the watcher ever reports.
        log::debug!("accepting host registration for {} (untracked)", service);
        Ok(())
    }

    /// StatusNotifierItemRegistered signal
    #[zbus(signal)]
    async fn status_notifier_item_registered(ctxt: &zbus::SignalContext<'_>, service: &str) -> zbus::Result<()>;

    /// StatusNotifierItemUnregistered signal. Declared for protocol
    /// completeness; item removal is not handled, so it is never emitted.
    #[zbus(signal)]
    async fn status_notifier_item_unregistered(ctxt: &zbus::SignalContext<'_>, service: &str)
        -> zbus::Result<()>;

    /// StatusNotifierHostRegistered signal
    #[zbus(signal)]
    async fn status_notifier_host_registered(ctxt: &zbus::SignalContext<'_>) -> zbus::Result<()>;

    /// StatusNotifierHostUnregistered signal
    #[zbus(signal)]
    async fn status_notifier_host_unregistered(ctxt: &zbus::SignalContext<'_>) -> zbus::Result<()>;

    /// IsStatusNotifierHostRegistered property
    #[zbus(property)]
    async fn is_status_notifier_host_registered(&self) -> bool {
        matches!(self.state(), ServiceState::Active { .. })
    }

    /// ProtocolVersion property
    #[zbus(property)]
    async fn protocol_version(&self) -> i32 {
        0
    }

    /// RegisteredStatusNotifierItems property
    #[zbus(property)]
    async fn registered_status_notifier_items(&self) -> Vec<String> {
        let tray = self.tray.lock().unwrap(); // unwrap: mutex poisoning is okay
        tray.registry().items().iter().map(|item| item.address.to_string()).collect()
    }
}

impl Watcher {
    /// Create a watcher feeding `tray`.
    pub fn new(tray: Arc<Mutex<Tray>>) -> Watcher {
        Watcher { tray, state: Arc::new(Mutex::new(ServiceState::Unstarted)) }
    }

    /// Where the service currently is in its lifecycle.
    pub fn state(&self) -> ServiceState {
        *self.state.lock().unwrap() // unwrap: mutex poisoning is okay
    }

    /// Attach and run the watcher on `con` for the rest of the process:
    /// export the watcher object, then claim the well-known watcher name
    /// and the per-process host name.
    ///
    /// On failure the service is left inert; no retry is attempted. There
    /// is no teardown either, bus-held state is released by process exit.
    pub async fn attach_to(self, con: &zbus::Connection) -> Result<()> {
        *self.state.lock().unwrap() = ServiceState::AcquiringNames;
        let state = self.state.clone();

        if !con.object_server().at(names::WATCHER_OBJECT, self).await? {
            log::error!(
                "cannot export the watcher: an object already exists at {} on this connection",
                names::WATCHER_OBJECT
            );
            return Err(Error::WatcherExists(names::WATCHER_OBJECT.into()));
        }

        // AllowReplacement lets a later tray take the name over,
        // ReplaceExisting takes it over from an earlier one.
        let flags = [RequestNameFlags::AllowReplacement, RequestNameFlags::ReplaceExisting];
        let owns_watcher_name = match con
            .request_name_with_flags(names::WATCHER_BUS, flags.into_iter().collect())
            .await
        {
            Ok(zbus::fdo::RequestNameReply::PrimaryOwner) => true,
            Ok(_) => {
                log::warn!("{} is owned by someone else, serving without it", names::WATCHER_BUS);
                false
            }
            Err(e) => {
                log::error!("failed to request {}: {}", names::WATCHER_BUS, e);
                return Err(e.into());
            }
        };

        let host_name = host::request_host_name(con).await?;

        *state.lock().unwrap() = ServiceState::Active { owns_watcher_name };
        log::info!("watcher active as {} and {}", names::WATCHER_BUS, host_name);

        tokio::spawn({
            let con = con.clone();
            async move {
                if let Err(e) = watch_name_loss(&con, state).await {
                    log::warn!("failed to watch for name loss: {}", e);
                }
            }
        });

        Ok(())
    }
}

/// Record and log loss of the well-known watcher name. The service keeps
/// running without it; no reacquisition is attempted.
async fn watch_name_loss(con: &zbus::Connection, state: Arc<Mutex<ServiceState>>) -> zbus::fdo::Result<()> {
    let dbus = zbus::fdo::DBusProxy::new(con).await?;
    let mut owner_changes = dbus.receive_name_owner_changed_with_args(&[(0, names::WATCHER_BUS)]).await?;

    let ours = con.unique_name().map(|name| name.as_str().to_owned());

    while let Some(sig) = owner_changes.next().await {
        let args = sig.args()?;
        let still_ours = match (args.new_owner().as_ref(), ours.as_deref()) {
            (Some(new_owner), Some(ours)) => new_owner.as_str() == ours,
            _ => false,
        };
        if still_ours {
            continue;
        }

        let mut state = state.lock().unwrap(); // unwrap: mutex poisoning is okay
        if matches!(*state, ServiceState::Active { owns_watcher_name: true }) {
            log::warn!("lost ownership of {}", names::WATCHER_BUS);
            *state = ServiceState::Active { owns_watcher_name: false };
        }
    }

    Ok(())
}
