//! Domain types shared by the strategies and callers.

pub mod candidate;
pub mod court;
pub mod date;
