use crate::{Host, Icon, ItemAddress, Registry, TrayItem};

/// Shared tray state: the item [`Registry`] plus the [`Host`] consumer fed
/// from it.
///
/// Everything runs on the bus dispatch task: registration, icon resolution
/// and the consumer rebuild, which is invoked synchronously, once per
/// successful insertion, with read-only registry access for the duration of
/// the call.
pub struct Tray {
    registry: Registry,
    consumer: Box<dyn Host>,
}

impl Tray {
    pub fn new(consumer: impl Host + 'static) -> Self {
        Tray { registry: Registry::new(), consumer: Box::new(consumer) }
    }

    /// Insert a freshly resolved item; when it was actually new, tell the
    /// consumer to rebuild. Returns whether the item was inserted.
    pub(crate) fn register(&mut self, address: ItemAddress, icon: Option<Icon>) -> bool {
        let inserted = self.registry.try_insert(TrayItem { address, icon });
        if inserted {
            self.consumer.rebuild(&self.registry);
        }
        inserted
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    struct CountingHost {
        rebuilds: Arc<Mutex<usize>>,
        items_seen: Arc<Mutex<usize>>,
    }

    impl Host for CountingHost {
        fn rebuild(&mut self, registry: &Registry) {
            *self.rebuilds.lock().unwrap() += 1;
            *self.items_seen.lock().unwrap() = registry.len();
        }
    }

    fn counting_tray() -> (Tray, Arc<Mutex<usize>>, Arc<Mutex<usize>>) {
        let rebuilds = Arc::new(Mutex::new(0));
        let items_seen = Arc::new(Mutex::new(0));
        let host = CountingHost { rebuilds: rebuilds.clone(), items_seen: items_seen.clone() };
        (Tray::new(host), rebuilds, items_seen)
    }

    fn addr(name: &str) -> ItemAddress {
        ItemAddress { name: name.to_owned(), object_path: "/StatusNotifierItem".to_owned() }
    }

    #[test]
    fn rebuild_fires_once_per_new_item() {
        let (mut tray, rebuilds, items_seen) = counting_tray();

        assert!(tray.register(addr("com.example.App"), None));
        assert_eq!(*rebuilds.lock().unwrap(), 1);
        assert_eq!(*items_seen.lock().unwrap(), 1);

        assert!(tray.register(addr("com.example.Other"), None));
        assert_eq!(*rebuilds.lock().unwrap(), 2);
        assert_eq!(*items_seen.lock().unwrap(), 2);
    }

    #[test]
    fn a_rejected_duplicate_does_not_rebuild() {
        let (mut tray, rebuilds, _) = counting_tray();

        assert!(tray.register(addr("com.example.App"), None));
        assert!(!tray.register(addr("com.example.App"), None));

        assert_eq!(*rebuilds.lock().unwrap(), 1);
        assert_eq!(tray.registry().len(), 1);
    }

    #[test]
    fn an_item_without_an_icon_still_registers() {
        let (mut tray, _, _) = counting_tray();

        assert!(tray.register(addr("com.example.App"), None));
        assert_eq!(tray.registry().len(), 1);
        assert_eq!(tray.registry().icons().count(), 0);
    }
}
