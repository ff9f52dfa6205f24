pub mod bus;
pub mod local;
pub mod redis;
pub mod registry;

pub use bus::EventBus;
pub use local::{LocalBus, Subscription};
pub use redis::RedisBus;
pub use registry::SessionRegistry;
