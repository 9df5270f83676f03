mod note;
mod tags;

pub use note::{core_data_timestamp, Note};
pub use tags::{extract_tags, tag_matches};
