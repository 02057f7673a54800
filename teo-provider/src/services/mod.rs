//! Remote service wrappers.

pub mod teo;
