use crate::{names, proxy::StatusNotifierItemProxy};

/// Bus address of a status notifier item: the owning connection's bus name
/// plus the object path under it exposing the item's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAddress {
    pub name: String,
    pub object_path: String,
}

impl ItemAddress {
    /// Resolve the service string handed to `RegisterStatusNotifierItem`.
    ///
    /// The freedesktop.org specification has this be a bus name, with the
    /// item exported at the protocol's fixed object path. Some clients
    /// (ayatana-based ones like Steam or Discord) instead pass an object
    /// path on their own connection, so a leading `/` means "this path,
    /// under the caller's name".
    pub fn parse(service: &str, sender: &str) -> Self {
        if service.starts_with('/') {
            ItemAddress { name: sender.to_owned(), object_path: service.to_owned() }
        } else {
            ItemAddress { name: service.to_owned(), object_path: names::ITEM_OBJECT.to_owned() }
        }
    }

    /// Build a proxy for querying this item's properties.
    pub async fn item_proxy(&self, con: &zbus::Connection) -> zbus::Result<StatusNotifierItemProxy<'static>> {
        StatusNotifierItemProxy::builder(con)
            .destination(self.name.clone())?
            .path(self.object_path.clone())?
            .build()
            .await
    }
}

impl std::fmt::Display for ItemAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.object_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn an_object_path_service_belongs_to_the_sender() {
        let addr = ItemAddress::parse("/org/ayatana/NotificationItem/steam", ":1.52");
        assert_eq!(addr.name, ":1.52");
        assert_eq!(addr.object_path, "/org/ayatana/NotificationItem/steam");
    }

    #[test]
    fn a_bus_name_service_uses_the_default_object_path() {
        let addr = ItemAddress::parse("com.example.App", ":1.52");
        assert_eq!(addr.name, "com.example.App");
        assert_eq!(addr.object_path, "/StatusNotifierItem");
    }

    #[test]
    fn addresses_display_as_name_then_path() {
        let addr = ItemAddress::parse("com.example.App", ":1.52");
        assert_eq!(addr.to_string(), "com.example.App/StatusNotifierItem");
    }
}
