//! Real-time notification layer: a durable connection registry, a live
//! delivery transport, and a broadcaster that fans domain events out to
//! every matching subscriber.

pub mod broadcaster;
pub mod connection;
pub mod event_handler;
pub mod message;
pub mod transport;

pub use broadcaster::Broadcaster;
pub use connection::ConnectionRegistry;
pub use event_handler::NotificationEventHandler;
pub use message::WireEvent;
pub use transport::{ChannelTransport, DeliveryError, DeliveryTransport};
