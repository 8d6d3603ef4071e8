pub mod command;
pub mod confirm;
pub mod context;
pub mod cursor;
pub mod input;
pub mod screen;

pub use command::{Command, Message};
pub use confirm::Confirmation;
pub use context::{NavContext, NavEntry, NavigationStack};
pub use cursor::ListCursor;
pub use input::TextInput;
pub use screen::Screen;
