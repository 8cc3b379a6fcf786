//! EOD-Simulation: sample sources without hardware
//!
//! A seeded synthetic discharge generator and a replay source for recorded
//! traces, both usable wherever a live board would be.

pub mod pulse;
pub mod replay;
pub mod simulator;

pub use pulse::PulseShape;
pub use replay::ReplaySource;
pub use simulator::*;
