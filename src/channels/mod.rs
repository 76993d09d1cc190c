pub mod chunker;
pub mod notifier;
pub mod supervisor;
pub mod telegram;
pub mod traits;

pub use notifier::{ChannelNotifier, Notifier};
pub use supervisor::spawn_supervised_listener;
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelMessage};
