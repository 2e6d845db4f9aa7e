use crate::consts::*;
use crate::utils::words_for_sources;

/// A register bound in the PLIC window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Register {
    /// Priority slot of the nonexistent source 0.
    Source0Priority,
    /// Priority of a real source.
    Priority(usize),
    /// One word of the pending array.
    Pending(usize),
    /// One enable word of a context.
    Enables { context: usize, word: usize },
    /// Claim/complete register of a context.
    ClaimComplete(usize),
}

/// Offset decoding fixed at construction from the source and context counts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegisterMap {
    num_sources: usize,
    num_contexts: usize,
    enable_words: usize,
}

impl RegisterMap {
    pub const fn new(num_sources: usize, num_contexts: usize) -> Self {
        Self {
            num_sources,
            num_contexts,
            enable_words: words_for_sources(num_sources),
        }
    }

    /// Looks up the register at `offset`, `None` if nothing is bound there.
    pub fn decode(&self, offset: usize) -> Option<Register> {
        if offset % PLIC_REG_WIDTH != 0 {
            return None;
        }
        match offset {
            PLIC_PRIORITY_OFFSET => Some(Register::Source0Priority),
            // priority
            o if o < PLIC_PENDING_OFFSET => {
                let id = (o - PLIC_PRIORITY_OFFSET) / PLIC_REG_WIDTH;
                (id < self.num_sources).then_some(Register::Priority(id))
            }
            // pending
            o if o < PLIC_ENABLE_OFFSET => {
                let word = (o - PLIC_PENDING_OFFSET) / PLIC_REG_WIDTH;
                (word < self.enable_words).then_some(Register::Pending(word))
            }
            // enable
            o if o < PLIC_CONTEXT_CTRL_OFFSET => {
                let rel = o - PLIC_ENABLE_OFFSET;
                let context = rel / PLIC_ENABLE_STRIDE;
                let word = (rel % PLIC_ENABLE_STRIDE) / PLIC_REG_WIDTH;
                (context < self.num_contexts && word < self.enable_words)
                    .then_some(Register::Enables { context, word })
            }
            // claim/complete
            o if o < PLIC_SIZE => {
                let rel = o - PLIC_CONTEXT_CTRL_OFFSET;
                let context = rel / PLIC_CONTEXT_STRIDE;
                (rel % PLIC_CONTEXT_STRIDE == PLIC_CONTEXT_CLAIM_COMPLETE_OFFSET
                    && context < self.num_contexts)
                    .then_some(Register::ClaimComplete(context))
            }
            _ => None,
        }
    }
}
