use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("dbus connection error")]
    Dbus(#[from] zbus::Error),
    #[error("an object is already exported at {0} on this connection")]
    WatcherExists(String),
}

pub type Result<T> = std::result::Result<T, Error>;
