mod client;
mod wire;

pub use client::*;
pub use wire::*;
