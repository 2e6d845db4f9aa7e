//! Emulated RISC-V Platform-Level Interrupt Controller.
//!
//! The controller latches level-triggered sources, lets each context enable
//! its own subset of them, and arbitrates claims by priority. Claims nest:
//! a context may hold several claimed sources at once and must complete
//! them innermost first.

#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[macro_use]
extern crate log;

mod consts;
mod context;
mod forcing;
mod regs;
mod source;
mod state;
mod utils;

pub use consts::*;
pub use forcing::{NoForcing, TargetForcing};
pub use state::IrqLineSink;

use alloc::boxed::Box;
use alloc::vec::Vec;

use axaddrspace::{device::AccessWidth, GuestPhysAddr, GuestPhysAddrRange};
use axdevice_base::{BaseDeviceOps, EmuDeviceType};
use axerrno::{AxError, AxResult};
use spin::Mutex;

use state::PlicState;

/// Construction parameters of a [`VPlic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlicConfig {
    /// Number of source slots including the fake source 0; real IDs run
    /// from 1 to `num_sources - 1`.
    pub num_sources: usize,
    /// Number of contexts (targets).
    pub num_contexts: usize,
    /// When false, priority writes are ignored and every priority stays 0.
    pub priorities_enabled: bool,
}

impl PlicConfig {
    /// One context, priorities enabled.
    pub const fn new(num_sources: usize) -> Self {
        Self {
            num_sources,
            num_contexts: 1,
            priorities_enabled: true,
        }
    }

    pub const fn contexts(mut self, num_contexts: usize) -> Self {
        self.num_contexts = num_contexts;
        self
    }

    pub const fn priorities(mut self, enabled: bool) -> Self {
        self.priorities_enabled = enabled;
        self
    }

    fn validate(&self) -> AxResult {
        if self.num_sources == 0 || self.num_sources + 1 > PLIC_NUM_SOURCES {
            error!(
                "PLIC does not support {} sources (at most {})",
                self.num_sources,
                PLIC_NUM_SOURCES - 1
            );
            return Err(AxError::InvalidInput);
        }
        if self.num_contexts == 0 || self.num_contexts > PLIC_MAX_CONTEXTS {
            error!(
                "PLIC does not support {} contexts (at most {})",
                self.num_contexts, PLIC_MAX_CONTEXTS
            );
            return Err(AxError::InvalidInput);
        }
        Ok(())
    }
}

/// The emulated PLIC.
///
/// All state sits behind one lock, taken once per entry point.
pub struct VPlic<F: TargetForcing = NoForcing> {
    /// The address of the VPlic in the guest physical address space.
    pub addr: GuestPhysAddr,
    config: PlicConfig,
    state: Mutex<PlicState<F>>,
}

impl VPlic {
    /// Creates a controller without target forcing.
    pub fn new(addr: GuestPhysAddr, config: PlicConfig) -> AxResult<Self> {
        Self::with_forcing(addr, config, NoForcing)
    }
}

impl<F: TargetForcing> VPlic<F> {
    pub fn with_forcing(addr: GuestPhysAddr, config: PlicConfig, forcing: F) -> AxResult<Self> {
        config.validate()?;
        let mut state = PlicState::new(
            config.num_sources,
            config.num_contexts,
            config.priorities_enabled,
            forcing,
        );
        state.refresh_all();
        Ok(Self {
            addr,
            config,
            state: Mutex::new(state),
        })
    }

    /// Attaches the receiver of output line changes.
    pub fn with_sink(self, sink: impl IrqLineSink + 'static) -> Self {
        self.state.lock().sink = Some(Box::new(sink));
        self
    }

    pub fn num_sources(&self) -> usize {
        self.config.num_sources
    }

    pub fn num_contexts(&self) -> usize {
        self.config.num_contexts
    }

    pub fn priorities_enabled(&self) -> bool {
        self.config.priorities_enabled
    }

    /// Reads the 32-bit register at `offset`. Reading a claim/complete
    /// register performs a claim.
    pub fn read_register(&self, offset: usize) -> u32 {
        self.state.lock().read_register(offset)
    }

    /// Writes the 32-bit register at `offset`.
    pub fn write_register(&self, offset: usize, val: u32) {
        self.state.lock().write_register(offset, val)
    }

    /// Drives the input line of source `id`.
    pub fn on_source_level(&self, id: usize, level: bool) {
        self.state.lock().set_source_level(id, level)
    }

    pub fn reset(&self) {
        self.state.lock().reset()
    }

    pub fn forced_target(&self) -> Option<usize> {
        self.state.lock().forcing.forced_target()
    }

    /// Forces arbitration onto `target`, or lifts forcing with `None`.
    pub fn set_forced_target(&self, target: Option<usize>) -> AxResult {
        if target.is_some_and(|t| t >= self.config.num_contexts) {
            return Err(AxError::InvalidInput);
        }
        let mut state = self.state.lock();
        state.forcing.force_target(target)?;
        state.refresh_all();
        Ok(())
    }

    /// Output line level of `context`.
    pub fn line(&self, context: usize) -> Option<bool> {
        self.state.lock().contexts.get(context).map(|ctx| ctx.line())
    }

    pub fn is_pending(&self, id: usize) -> Option<bool> {
        let state = self.state.lock();
        state
            .is_source_available(id)
            .then(|| state.sources[id].is_pending)
    }

    pub fn priority(&self, id: usize) -> Option<u8> {
        let state = self.state.lock();
        state
            .is_source_available(id)
            .then(|| state.sources[id].priority as u8)
    }

    /// Claimed but uncompleted sources of `context`, innermost last.
    pub fn active_interrupts(&self, context: usize) -> Option<Vec<u32>> {
        self.state
            .lock()
            .contexts
            .get(context)
            .map(|ctx| ctx.active().iter().map(|&id| id as u32).collect())
    }
}

impl<F: TargetForcing + 'static> BaseDeviceOps<GuestPhysAddrRange> for VPlic<F> {
    fn emu_type(&self) -> axdevice_base::EmuDeviceType {
        EmuDeviceType::InterruptController
    }

    fn address_range(&self) -> GuestPhysAddrRange {
        GuestPhysAddrRange::from_start_size(self.addr, PLIC_SIZE)
    }

    fn handle_read(
        &self,
        addr: <GuestPhysAddrRange as axaddrspace::device::DeviceAddrRange>::Addr,
        width: axaddrspace::device::AccessWidth,
    ) -> axerrno::AxResult<usize> {
        if width != AccessWidth::Dword {
            warn!("vPlic read at {:#x} with unsupported width {:?}", addr.as_usize(), width);
            return Err(AxError::InvalidInput);
        }
        let reg = addr - self.addr;
        Ok(self.read_register(reg) as usize)
    }

    fn handle_write(
        &self,
        addr: <GuestPhysAddrRange as axaddrspace::device::DeviceAddrRange>::Addr,
        width: axaddrspace::device::AccessWidth,
        val: usize,
    ) -> axerrno::AxResult {
        if width != AccessWidth::Dword {
            warn!("vPlic write at {:#x} with unsupported width {:?}", addr.as_usize(), width);
            return Err(AxError::InvalidInput);
        }
        let reg = addr - self.addr;
        self.write_register(reg, val as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plic(config: PlicConfig) -> VPlic {
        VPlic::new(GuestPhysAddr::from_usize(0x0c00_0000), config).unwrap()
    }

    #[test]
    fn rejects_out_of_range_configs() {
        let base = GuestPhysAddr::from_usize(0x0c00_0000);
        assert_eq!(
            VPlic::new(base, PlicConfig::new(1024)).err(),
            Some(AxError::InvalidInput)
        );
        assert_eq!(
            VPlic::new(base, PlicConfig::new(0)).err(),
            Some(AxError::InvalidInput)
        );
        assert_eq!(
            VPlic::new(base, PlicConfig::new(8).contexts(0)).err(),
            Some(AxError::InvalidInput)
        );
        assert!(VPlic::new(base, PlicConfig::new(1023)).is_ok());
    }

    #[test]
    fn forcing_is_unsupported() {
        let plic = plic(PlicConfig::new(4).contexts(2));
        assert_eq!(plic.forced_target(), None);
        assert_eq!(plic.set_forced_target(Some(1)), Err(AxError::Unsupported));
        assert_eq!(plic.set_forced_target(Some(2)), Err(AxError::InvalidInput));
        assert_eq!(plic.forced_target(), None);
    }

    #[test]
    fn mmio_reads_and_writes_dwords_only() {
        let base = GuestPhysAddr::from_usize(0x0c00_0000);
        let plic = plic(PlicConfig::new(4));
        plic.handle_write(base + 0x8, AccessWidth::Dword, 5).unwrap();
        assert_eq!(plic.handle_read(base + 0x8, AccessWidth::Dword), Ok(5));
        assert_eq!(plic.priority(2), Some(5));

        assert_eq!(
            plic.handle_read(base + 0x8, AccessWidth::Byte),
            Err(AxError::InvalidInput)
        );
    }
}
