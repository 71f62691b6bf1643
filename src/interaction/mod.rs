mod events;
mod machine;

pub use events::{Command, InputEvent};
pub use machine::{Effect, Interaction};
