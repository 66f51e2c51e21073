//! Bank client implementations

pub mod monobank;
pub mod util;
