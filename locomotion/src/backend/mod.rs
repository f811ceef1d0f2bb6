//! Backends that drive the locomotion state.

pub mod headless;
