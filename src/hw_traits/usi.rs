//! Register-level contract for USI-like shift-register peripherals.
//!
//! The engine in [`crate::engine`] never touches silicon directly; it is
//! generic over [`UsiRegisters`], which a platform layer implements against
//! whatever PAC exposes the real USICR/USISR/USIDR registers. This mirrors
//! the split the teacher HAL draws between `hw_traits::eusci::EUsci` (raw
//! register access) and `i2c::I2cSlave` (protocol logic built on top of it).

use bitflags::bitflags;

bitflags! {
    /// Bits of the USI status register relevant to slave protocol framing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UsiStatus: u8 {
        /// USISIF. Set when a START condition was detected.
        const START_FLAG     = 1 << 7;
        /// USIOIF. Set when the 4-bit counter overflowed.
        const OVERFLOW_FLAG  = 1 << 6;
        /// USIPF. Set when a STOP condition was detected. Not wired to an
        /// interrupt on this hardware; only visible by polling.
        const STOP_FLAG      = 1 << 5;
        /// USIDC. Set if the line driven didn't match the sampled line.
        const DATA_COLLISION = 1 << 4;
    }
}

impl UsiStatus {
    /// The current value of the 4-bit shift counter (bits 3..0).
    #[inline(always)]
    pub fn counter(self) -> u8 {
        self.bits() & 0x0F
    }
}

bitflags! {
    /// Bits of the USI control register this engine depends on at init time.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UsiControl: u8 {
        /// USISIE. Raise an interrupt on a detected START condition.
        const START_INTERRUPT_ENABLE    = 1 << 7;
        /// USIOIE. Raise an interrupt on counter overflow.
        const OVERFLOW_INTERRUPT_ENABLE = 1 << 6;
        /// USIWM1:0 = 10. Two-wire mode, SCL held low on counter overflow.
        const TWO_WIRE_HOLD_ON_OVERFLOW = 0b10 << 4;
        /// USICS1:0 = 01, USICLK = 0. External SCL, positive edge shifts in.
        const EXTERNAL_CLOCK_POS_EDGE    = 0b01 << 2;
    }
}

/// SDA line direction, as driven by the shift register vs. released to the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// SDA is an input; the master (or nothing) drives the line.
    In,
    /// SDA is an output; the shift register drives the line.
    Out,
}

/// `0xF0`: clear start/stop/overflow flags, arm the counter for 8 shift edges.
pub const STATUS_CLEAR_ARM_8: u8 = 0xF0;

/// `0xD0 | (14 << counter_lsb)`: clear the overflow flag while preserving the
/// stop flag, and arm the counter for one more shift edge -- the ACK slot.
#[inline(always)]
pub const fn status_clear_overflow_arm_ack() -> u8 {
    0xD0 | 14
}

/// The register-level operations the engine needs from a USI peripheral.
///
/// A platform layer implements this against its PAC; this crate never names
/// a concrete chip, port, or pin (see the crate-level docs).
pub trait UsiRegisters {
    /// Read the 8-bit shift register (captured SDA bits when direction is `In`).
    fn usidr_rd(&self) -> u8;
    /// Write the 8-bit shift register (sourced onto SDA when direction is `Out`).
    fn usidr_wr(&self, val: u8);
    /// Read the status register.
    fn usisr_rd(&self) -> UsiStatus;
    /// Write the status register. Writing a 1 to a flag bit clears it;
    /// writing the low nibble sets the shift counter.
    fn usisr_wr(&self, bits: u8);
    /// Write the control register.
    fn usicr_wr(&self, val: UsiControl);
    /// Switch SDA between being driven by the shift register (`Out`) and
    /// released for the bus/master to drive (`In`).
    fn set_sda_direction(&self, dir: Direction);
    /// Spin until SCL has been released by the master completing a start
    /// condition. The only permitted suspension point in the engine.
    fn wait_for_scl_release(&self);
}
