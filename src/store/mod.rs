mod reader;

pub use reader::{NoteReader, NOTE_COLUMNS, NOTE_TABLE, TAG_TABLE};
