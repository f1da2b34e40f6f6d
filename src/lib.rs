//! Firmware I2C slave protocol engine for bare USI (Universal Serial
//! Interface) shift-register peripherals.
//!
//! A USI peripheral is not an I2C controller. It is an 8-bit shift register,
//! a 4-bit counter that raises an interrupt on overflow, and a start-condition
//! detector -- nothing else. There is no address comparator, no ACK/NAK
//! generation, and no stop-condition interrupt. Everything an I2C slave
//! needs beyond "shift a bit in or out" has to be synthesized by firmware
//! from those three primitives, in the two interrupt handlers USI exposes
//! (start-detected, counter-overflow) plus application-loop polling for stop.
//!
//! [`Engine`] is that synthesis: a protocol state machine driven by calling
//! [`Engine::on_start`] from the start-condition ISR, [`Engine::on_overflow`]
//! from the counter-overflow ISR, and [`Engine::check_stop`] from the
//! application main loop. It never touches a register directly; it is
//! generic over [`hw_traits::usi::UsiRegisters`], which a platform layer
//! implements against whatever PAC exposes the real USICR/USISR/USIDR.
//!
//! # Usage
//!
//! A platform layer owns the peripheral and the two interrupt vectors:
//!
//! ```ignore
//! static ENGINE: critical_section::Mutex<RefCell<Engine<GlobalMask<0xFF>, 0x42, 8>>> =
//!     critical_section::Mutex::new(RefCell::new(Engine::new(GlobalMask)));
//!
//! #[interrupt]
//! fn USI_START() {
//!     critical_section::with(|cs| ENGINE.borrow_ref_mut(cs).on_start(&usi));
//! }
//!
//! #[interrupt]
//! fn USI_OVERFLOW() {
//!     critical_section::with(|cs| ENGINE.borrow_ref_mut(cs).on_overflow(&usi));
//! }
//!
//! // main loop:
//! loop {
//!     let dirty = critical_section::with(|cs| ENGINE.borrow_ref_mut(cs).check_stop(&usi));
//!     if dirty != 0 {
//!         // react to the committed register write
//!     }
//! }
//! ```
//!
//! # Error handling
//!
//! There is no recoverable-error type in this crate's public API. Protocol
//! violations a real I2C slave is expected to shrug off -- an unrecognized
//! address, an out-of-range register offset, a premature STOP -- are handled
//! by NAKing or by resetting to `Idle`, exactly as the wire protocol expects;
//! they are not exposed as `Result::Err` because there is no caller who could
//! do anything with them beyond what the engine already does. A read-only bit
//! written by the master is silently dropped by the [`mask::WriteMask`]
//! rather than surfaced, for the same reason.
//!
//! # Logging
//!
//! This crate depends on neither `log` nor `defmt`. Every decision the
//! engine makes is a pure function of protocol state plus the byte just
//! shifted in, recorded in the doc comments on [`engine::Engine::on_overflow`]
//! rather than traced at runtime; a platform layer running in a normal
//! non-interrupt context is free to layer `defmt`/`log` around the calls into
//! this crate, but doing so from inside the overflow ISR would undermine the
//! timing budget the protocol depends on.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod engine;
pub mod hw_traits;
pub mod mask;
pub mod prelude;

mod util;

pub use engine::{Engine, ProtocolState};
pub use hw_traits::usi::{Direction, UsiControl, UsiRegisters, UsiStatus};
pub use mask::{GlobalMask, PerRegisterMask, WriteMask};