mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_check, handle_get, handle_notes, handle_search, handle_serve, handle_tagged,
    handle_tags,
};
