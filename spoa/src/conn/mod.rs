mod connection;

pub use self::connection::Connection;
