use crate::{Icon, ItemAddress};

/// A registered tray entry.
#[derive(Debug)]
pub struct TrayItem {
    pub address: ItemAddress,
    /// Resolved once, at registration time. `None` means the item has no
    /// visual representation available.
    pub icon: Option<Icon>,
}

/// The deduplicated set of registered tray items, in insertion order.
///
/// The registry owns every item and its pixel buffer; consumers borrow them
/// for the duration of a rebuild pass only, since the list may have grown
/// by the next one. Items are never updated or removed once inserted:
/// unregistration is deliberately not handled, and entries live for the
/// rest of the process.
#[derive(Debug, Default)]
pub struct Registry {
    items: Vec<TrayItem>,
}

impl Registry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn contains(&self, address: &ItemAddress) -> bool {
        self.items.iter().any(|item| item.address == *address)
    }

    /// Append `item` unless an entry with the same `(name, object_path)`
    /// identity already exists. Returns whether the item was inserted.
    pub fn try_insert(&mut self, item: TrayItem) -> bool {
        if self.contains(&item.address) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// All registered items, in insertion order.
    pub fn items(&self) -> &[TrayItem] {
        &self.items
    }

    /// The decoded icons to draw, in insertion order, skipping items that
    /// registered without one.
    pub fn icons(&self) -> impl Iterator<Item = &Icon> {
        self.items.iter().filter_map(|item| item.icon.as_ref())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(name: &str, object_path: &str, icon: Option<Icon>) -> TrayItem {
        TrayItem {
            address: ItemAddress { name: name.to_owned(), object_path: object_path.to_owned() },
            icon,
        }
    }

    #[test]
    fn the_same_identity_registers_exactly_once() {
        let mut registry = Registry::new();

        assert!(registry.try_insert(item("com.example.App", "/StatusNotifierItem", None)));
        assert!(!registry.try_insert(item("com.example.App", "/StatusNotifierItem", None)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_paths_under_one_name_are_distinct_items() {
        let mut registry = Registry::new();

        assert!(registry.try_insert(item(":1.7", "/Item/a", None)));
        assert!(registry.try_insert(item(":1.7", "/Item/b", None)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn items_enumerate_in_insertion_order() {
        let mut registry = Registry::new();
        registry.try_insert(item("org.first", "/StatusNotifierItem", None));
        registry.try_insert(item("org.second", "/StatusNotifierItem", None));

        let names: Vec<&str> = registry.items().iter().map(|i| i.address.name.as_str()).collect();
        assert_eq!(names, vec!["org.first", "org.second"]);
    }

    #[test]
    fn the_icon_accessor_skips_iconless_items() {
        let icon = Icon { width: 1, height: 1, data: vec![1, 2, 3, 4] };
        let mut registry = Registry::new();
        registry.try_insert(item("org.bare", "/StatusNotifierItem", None));
        registry.try_insert(item("org.painted", "/StatusNotifierItem", Some(icon.clone())));

        let icons: Vec<&Icon> = registry.icons().collect();
        assert_eq!(icons, vec![&icon]);
    }
}
