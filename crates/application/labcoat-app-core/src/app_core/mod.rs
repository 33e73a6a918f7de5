pub mod commands;
pub mod events;
pub mod reducer;
pub mod store;

pub use commands::ScreenCommand;
pub use events::ScreenEvent;
pub use reducer::reduce;
pub use store::ScreenStore;
