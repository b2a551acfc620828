mod dispatcher;
pub mod message;

pub use dispatcher::InboundDispatcher;
pub use message::InboundMessage;
