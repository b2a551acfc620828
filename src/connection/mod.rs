mod manager;
pub mod request;
mod tcp;

pub use manager::{CompletionCallback, ConnectionError, ConnectionManager, InboundHandler};
pub use request::{Request, RequestType};
pub use tcp::{AddressProvider, Config, TcpConnectionManager};
