//! Prelude

pub use crate::hw_traits::usi::UsiRegisters as _usi_i2c_slave_UsiRegisters;
pub use crate::mask::WriteMask as _usi_i2c_slave_WriteMask;
