#![forbid(unsafe_code)]

pub mod error;
pub mod inbox;
pub mod model;
pub mod progress;
pub mod time;
pub mod tracker;
pub mod tree;

pub use error::{Entity, TrackerError};
pub use inbox::TaskInbox;
pub use time::Clock;
pub use tracker::{ChangeHook, Collection, Tracker, TrackerState};
pub use tree::{ProgressTree, ResolvedLink, SectionRef};
