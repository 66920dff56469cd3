pub mod actions;
pub mod context;
pub mod error;

pub use actions::{IconAction, NotificationClick};
pub use context::AppContext;
pub use error::{NotifierError, Result};
