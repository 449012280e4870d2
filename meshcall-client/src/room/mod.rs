pub mod room_membership_tracker;

pub use room_membership_tracker::*;
