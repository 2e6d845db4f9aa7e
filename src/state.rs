use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::consts::PLIC_PRIORITY_MASK;
use crate::context::IrqContext;
use crate::forcing::TargetForcing;
use crate::regs::{Register, RegisterMap};
use crate::source::IrqSource;
use crate::utils::{pack_word, source_of_bit};

/// Receives output line changes of the controller.
///
/// Called with the controller lock held: implementations must not call
/// back into the controller.
pub trait IrqLineSink: Send + Sync {
    /// `context`'s output line changed to `level`.
    fn set_level(&self, context: usize, level: bool);
}

/// Sources, contexts and forcing capability of one controller.
///
/// Only ever reached through the controller's lock; every method here
/// assumes exclusive access and calls the others directly.
pub(crate) struct PlicState<F> {
    pub sources: Vec<IrqSource>,
    pub contexts: Vec<IrqContext>,
    pub forcing: F,
    pub sink: Option<Box<dyn IrqLineSink>>,
    map: RegisterMap,
    priorities_enabled: bool,
}

impl<F: TargetForcing> PlicState<F> {
    pub fn new(
        num_sources: usize,
        num_contexts: usize,
        priorities_enabled: bool,
        forcing: F,
    ) -> Self {
        Self {
            sources: (0..num_sources).map(IrqSource::new).collect(),
            contexts: (0..num_contexts).map(IrqContext::new).collect(),
            forcing,
            sink: None,
            map: RegisterMap::new(num_sources, num_contexts),
            priorities_enabled,
        }
    }

    /// Valid IDs are 1..num_sources; slot 0 is never a real source.
    pub fn is_source_available(&self, id: usize) -> bool {
        id >= 1 && id < self.sources.len()
    }

    /// Runs `op` on one context and reports a line change to the sink.
    fn with_context<R>(
        &mut self,
        context: usize,
        op: impl FnOnce(&mut IrqContext, &mut [IrqSource], Option<usize>) -> R,
    ) -> R {
        let forced = self.forcing.forced_target();
        let ctx = &mut self.contexts[context];
        let before = ctx.line();
        let ret = op(ctx, &mut self.sources, forced);
        let after = ctx.line();
        if before != after {
            if let Some(sink) = &self.sink {
                sink.set_level(context, after);
            }
        }
        ret
    }

    pub fn refresh_all(&mut self) {
        for context in 0..self.contexts.len() {
            self.with_context(context, |ctx, sources, forced| ctx.refresh(sources, forced));
        }
    }

    pub fn set_source_level(&mut self, id: usize, level: bool) {
        if !self.is_source_available(id) {
            error!("Wrong gpio source: {}", id);
            return;
        }
        trace!("Setting source #{} to {}", id, level);
        self.sources[id].set_level(level);
        self.refresh_all();
    }

    pub fn enable_source(&mut self, context: usize, id: usize, enabled: bool) {
        self.with_context(context, |ctx, sources, forced| {
            ctx.enable_source(sources, forced, id, enabled)
        });
    }

    /// Claims on `context`. Other contexts enabling the winner lose it
    /// as a pending candidate, so every line is recomputed.
    pub fn acknowledge(&mut self, context: usize) -> u32 {
        let id = self.with_context(context, |ctx, sources, forced| {
            ctx.acknowledge(sources, forced)
        });
        if id != 0 {
            self.refresh_all();
        }
        id
    }

    pub fn complete(&mut self, context: usize, id: usize) {
        self.with_context(context, |ctx, sources, forced| {
            ctx.complete(sources, forced, id)
        });
        self.refresh_all();
    }

    pub fn reset(&mut self) {
        debug!("Resetting peripheral state");
        for source in self.sources.iter_mut() {
            source.reset();
        }
        for context in 0..self.contexts.len() {
            self.with_context(context, |ctx, sources, forced| ctx.reset(sources, forced));
        }
        self.refresh_all();
    }

    pub fn read_register(&mut self, offset: usize) -> u32 {
        match self.map.decode(offset) {
            Some(Register::Source0Priority) => 0,
            Some(Register::Priority(id)) => self.sources[id].priority,
            Some(Register::Pending(word)) => pack_word(word, |id| {
                self.is_source_available(id) && self.sources[id].is_pending
            }),
            Some(Register::Enables { context, word }) => {
                let ctx = &self.contexts[context];
                pack_word(word, |id| self.is_source_available(id) && ctx.is_enabled(id))
            }
            Some(Register::ClaimComplete(context)) => self.acknowledge(context),
            None => {
                warn!("Unhandled read from offset {:#x}", offset);
                0
            }
        }
    }

    pub fn write_register(&mut self, offset: usize, val: u32) {
        match self.map.decode(offset) {
            Some(Register::Source0Priority) => {
                let val = val & PLIC_PRIORITY_MASK;
                if val != 0 {
                    warn!("Trying to set priority {} for Source 0, which is illegal", val);
                }
            }
            Some(Register::Priority(id)) => {
                if self.priorities_enabled {
                    self.sources[id].priority = val & PLIC_PRIORITY_MASK;
                    self.refresh_all();
                }
            }
            Some(Register::Pending(word)) => {
                warn!("Ignoring write {:#x} to read-only pending word {}", val, word);
            }
            Some(Register::Enables { context, word }) => {
                for bit in 0..u32::BITS {
                    let id = source_of_bit(word, bit);
                    let set = val & (1 << bit) != 0;
                    if !self.is_source_available(id) {
                        if set {
                            warn!("Trying to enable non-existing source: {}", id);
                        }
                        continue;
                    }
                    self.enable_source(context, id, set);
                }
            }
            Some(Register::ClaimComplete(context)) => {
                let id = val as usize;
                if !self.is_source_available(id) {
                    error!(
                        "Trying to complete handling of non-existing interrupt source {}",
                        val
                    );
                    return;
                }
                self.complete(context, id);
            }
            None => {
                warn!("Unhandled write of {:#x} to offset {:#x}", val, offset);
            }
        }
    }
}
