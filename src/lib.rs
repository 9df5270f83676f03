pub mod cli;
pub mod command;
pub mod config;
pub mod entity;
pub mod error;
pub mod mcp;
pub mod store;

pub use command::NoteWriter;
pub use config::Config;
pub use error::{BearError, Result};
pub use mcp::BearServer;
pub use store::NoteReader;
