pub mod broadcaster;
pub mod handler;
pub mod registry;

pub use broadcaster::{BroadcastStats, Broadcaster, PublishReport};
pub use handler::{websocket_handler, WsState};
pub use registry::{Frame, Subscriber, SubscriberId, SubscriberRegistry, SubscriberSendError};
