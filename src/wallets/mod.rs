//! The supported wallet brands.

pub mod sender;

pub use self::sender::{Sender, SenderDetector, SenderHandle};
