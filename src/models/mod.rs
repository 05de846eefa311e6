pub mod clock_state;
pub mod messages;
pub mod outcome;

// Re-export important types
pub use clock_state::*;
pub use messages::*;
pub use outcome::*;
