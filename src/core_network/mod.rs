pub mod data_connection;
pub mod error;
pub mod line_reader;
pub mod network;
pub mod pasv;
pub mod port;
pub mod port_allocator;
pub mod stream;

pub use data_connection::{DataConnection, DataConnectionFactory, LocalDataConnectionFactory};
pub use error::DataConnectionError;
pub use network::{FtpServer, FtpServerBuilder, ServerContext};
