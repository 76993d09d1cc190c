pub mod context;
pub mod daemon;
pub mod dispatch;
pub mod status;

pub use context::AppContext;
