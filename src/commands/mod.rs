pub mod dispatcher;
pub mod parser;
pub mod types;


pub use dispatcher::{ACCESS_DENIED, Dispatcher, validate_http_url};
pub use parser::parse_command;
pub use types::{Command, Reply};
