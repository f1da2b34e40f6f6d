//! Platform-facing register traits. One module per peripheral family;
//! today that's just [`usi`].

pub mod usi;
