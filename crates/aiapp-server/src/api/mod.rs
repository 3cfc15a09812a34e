pub mod apps;
pub mod error;
pub mod messages;
pub mod relay;
pub mod state;

pub use state::AppState;
