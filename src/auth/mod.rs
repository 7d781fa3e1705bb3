pub mod identity;

pub use identity::{Caller, require_admin};
