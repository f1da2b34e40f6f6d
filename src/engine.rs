//! The I2C slave protocol state machine.
//!
//! [`Engine`] is the software counterpart to the teacher HAL's hardware-backed
//! `I2cSlave<USCI>`: on a real eUSCI peripheral, address matching, ACK/NAK
//! generation and stop detection are all done in silicon, so `I2cSlave` only
//! has to shuttle bytes in and out of buffers. A bare USI peripheral does
//! none of that, so `Engine` owns the whole state machine and drives a
//! [`UsiRegisters`] implementation the way the teacher's `I2cSlave` drives its
//! `EUsciI2C` implementation.

use crate::hw_traits::usi::{status_clear_overflow_arm_ack, Direction, UsiRegisters, UsiStatus, STATUS_CLEAR_ARM_8};
use crate::mask::{GlobalMask, PerRegisterMask, WriteMask};
use crate::util::BitsExt;

/// Value driven onto the shift register to ACK a byte (direction OUT).
const ACK: u8 = 0x00;
/// Value driven onto the shift register to NAK a byte (direction OUT, MSB-first).
const NAK: u8 = 0x80;

/// Protocol state. Mutated only by [`Engine::on_start`] and [`Engine::on_overflow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolState {
    /// No transaction on the wire.
    Idle,
    /// A START was seen; waiting for/processing the address byte.
    AddrMatch,
    /// Address matched for a write; waiting for the register-offset byte.
    RegAddr,
    /// Master is reading register bytes from us.
    MasterRead,
    /// Master is writing register bytes to us.
    MasterWrite,
}

/// The USI I2C slave protocol engine.
///
/// Generic over:
/// - `SLAVE_ADDR`: the 7-bit address this engine answers to.
/// - `N_REG`: the size of the register file.
/// - `ACCEPT_GENERAL_CALL`: whether address byte `0x00`/`0x01` (the general
///   call address) is ACKed like our own address. Defaults to `true`,
///   preserving the historical behaviour described in the crate docs.
/// - `W`: the write-mask shape, see [`crate::mask`].
pub struct Engine<W, const SLAVE_ADDR: u8, const N_REG: usize, const ACCEPT_GENERAL_CALL: bool = true>
where
    W: WriteMask<N_REG>,
{
    state: ProtocolState,
    register_offset: usize,
    update_counter: u8,
    post_ack_phase: bool,
    registers: [u8; N_REG],
    mask: W,
}

impl<W, const SLAVE_ADDR: u8, const N_REG: usize, const ACCEPT_GENERAL_CALL: bool>
    Engine<W, SLAVE_ADDR, N_REG, ACCEPT_GENERAL_CALL>
where
    W: WriteMask<N_REG>,
{
    /// Construct a new engine in the `Idle` state with a zeroed register file.
    /// Performs no hardware access; see the crate docs for the platform
    /// `init()` routine that configures the USI peripheral itself.
    pub fn new(mask: W) -> Self {
        Self {
            state: ProtocolState::Idle,
            register_offset: 0,
            update_counter: 0,
            post_ack_phase: false,
            registers: [0; N_REG],
            mask,
        }
    }

    /// Current protocol state. Exposed mainly for diagnostics and tests.
    #[inline(always)]
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Whether a transaction addressed to us is currently in progress.
    ///
    /// A single read of a word-sized location; safe to call without a
    /// critical section.
    #[inline(always)]
    pub fn transaction_ongoing(&self) -> bool {
        !matches!(self.state, ProtocolState::Idle | ProtocolState::AddrMatch)
    }

    /// Read-only view of the register file.
    ///
    /// Only safe to read without a critical section once
    /// [`transaction_ongoing`](Self::transaction_ongoing) is observed false.
    #[inline(always)]
    pub fn registers(&self) -> &[u8; N_REG] {
        &self.registers
    }

    /// Run `f` with the register file locked against the overflow ISR.
    pub fn with_registers_locked<R>(&self, f: impl FnOnce(&[u8; N_REG]) -> R) -> R {
        critical_section::with(|_cs| f(&self.registers))
    }

    /// Run `f` with mutable access to the register file locked against the
    /// overflow ISR.
    pub fn with_registers_locked_mut<R>(&mut self, f: impl FnOnce(&mut [u8; N_REG]) -> R) -> R {
        critical_section::with(|_cs| f(&mut self.registers))
    }

    /// START condition interrupt handler.
    ///
    /// Resets protocol state to `AddrMatch` regardless of what was in
    /// progress; any stalled master is resynchronized by the next START.
    pub fn on_start<R: UsiRegisters>(&mut self, regs: &R) {
        self.state = ProtocolState::AddrMatch;
        self.post_ack_phase = false;
        // Bounded wait: the master completing the start condition releases
        // SCL within one clock period. This is the engine's only suspension
        // point.
        regs.wait_for_scl_release();
        regs.usisr_wr(STATUS_CLEAR_ARM_8);
    }

    /// Bit-counter overflow interrupt handler. Fires twice per byte: once
    /// after the 8 data bits, once after the 1-bit ACK slot.
    pub fn on_overflow<R: UsiRegisters>(&mut self, regs: &R) {
        if !self.post_ack_phase {
            self.pre_ack_phase(regs);
        } else {
            self.post_ack_phase_impl(regs);
        }
        self.clamp_offset();
    }

    fn pre_ack_phase<R: UsiRegisters>(&mut self, regs: &R) {
        // Default: we drive the ACK/NAK slot ourselves.
        let mut direction = Direction::Out;

        match self.state {
            ProtocolState::AddrMatch => {
                let byte = regs.usidr_rd();
                let addr = byte >> 1;
                let is_general_call = addr == 0;
                if addr == SLAVE_ADDR || (is_general_call && ACCEPT_GENERAL_CALL) {
                    regs.usidr_wr(ACK);
                    if byte & 1 == 0 {
                        // a: address matched, master will write.
                        self.state = ProtocolState::RegAddr;
                        self.register_offset = 0;
                    } else {
                        // b: address matched, master will read.
                        self.state = ProtocolState::MasterRead;
                    }
                } else {
                    // h: not our address.
                    regs.usidr_wr(NAK);
                    self.state = ProtocolState::Idle;
                }
            }
            ProtocolState::RegAddr => {
                let offset = regs.usidr_rd() as usize;
                if offset < N_REG {
                    // d
                    regs.usidr_wr(ACK);
                    self.register_offset = offset;
                    self.state = ProtocolState::MasterWrite;
                } else {
                    // i
                    regs.usidr_wr(NAK);
                    self.state = ProtocolState::Idle;
                }
            }
            ProtocolState::MasterRead => {
                // Release the bus so the master can drive the ACK/NAK bit.
                // Prefill 0 so a sampled 0 reads as ACK. The state
                // transition (e or f) happens in the post-ACK phase below.
                direction = Direction::In;
                regs.usidr_wr(0);
            }
            ProtocolState::MasterWrite => {
                // g
                let byte = regs.usidr_rd();
                let m = self.mask.mask(self.register_offset);
                let old = self.registers[self.register_offset];
                self.registers[self.register_offset] = old.clear_mask(m).set_mask(byte & m);
                regs.usidr_wr(ACK);
                self.update_counter = self.update_counter.saturating_add(1);
                self.register_offset = Self::next_offset(self.register_offset);
            }
            ProtocolState::Idle => {
                // Unexpected ISR entry with no defined transition; NAK and
                // let the next START resynchronize.
                regs.usidr_wr(NAK);
            }
        }

        regs.set_sda_direction(direction);
        self.post_ack_phase = true;
        regs.usisr_wr(status_clear_overflow_arm_ack());
    }

    fn post_ack_phase_impl<R: UsiRegisters>(&mut self, regs: &R) {
        // Default: release the bus for the next byte.
        let mut direction = Direction::In;

        if self.state == ProtocolState::MasterRead {
            let sampled = regs.usidr_rd();
            if sampled != 0 {
                // e: master NAKed.
                self.register_offset = 0;
                self.state = ProtocolState::Idle;
            } else {
                // f: master ACKed, send the next byte.
                direction = Direction::Out;
                let byte = self.registers[self.register_offset];
                regs.usidr_wr(byte);
                self.register_offset = Self::next_offset(self.register_offset);
            }
        }

        regs.set_sda_direction(direction);
        self.post_ack_phase = false;
        regs.usisr_wr(STATUS_CLEAR_ARM_8);
    }

    #[inline(always)]
    fn next_offset(offset: usize) -> usize {
        let next = offset + 1;
        if next >= N_REG {
            0
        } else {
            next
        }
    }

    #[inline(always)]
    fn clamp_offset(&mut self) {
        if self.register_offset >= N_REG {
            self.register_offset = 0;
        }
    }

    /// Called by the application main loop. Detects a STOP while a write
    /// transaction is outstanding, finalizes it, and reports whether any
    /// register changed.
    ///
    /// Returns 0 if no write transaction has completed since the last call.
    /// A non-zero return means at least one register write committed and the
    /// bus has released; the value itself is an opaque "dirty" signal, not a
    /// count of bytes written (see the crate docs).
    pub fn check_stop<R: UsiRegisters>(&mut self, regs: &R) -> u8 {
        if self.state != ProtocolState::MasterWrite || self.update_counter == 0 {
            return 0;
        }
        if !regs.usisr_rd().contains(UsiStatus::STOP_FLAG) {
            return 0;
        }
        critical_section::with(|_cs| {
            self.state = ProtocolState::Idle;
            let count = self.update_counter;
            self.update_counter = 0;
            count
        })
    }
}

impl<const SLAVE_ADDR: u8, const N_REG: usize, const ACCEPT_GENERAL_CALL: bool, const MASK: u8>
    Engine<GlobalMask<MASK>, SLAVE_ADDR, N_REG, ACCEPT_GENERAL_CALL>
{
    /// Construct an engine with a single write mask applied to every register.
    pub fn with_global_mask() -> Self {
        Self::new(GlobalMask)
    }
}

impl<const SLAVE_ADDR: u8, const N_REG: usize, const ACCEPT_GENERAL_CALL: bool>
    Engine<PerRegisterMask<N_REG>, SLAVE_ADDR, N_REG, ACCEPT_GENERAL_CALL>
{
    /// Construct an engine with one write mask byte per register.
    pub fn with_per_register_mask(masks: [u8; N_REG]) -> Self {
        Self::new(PerRegisterMask(masks))
    }
}
