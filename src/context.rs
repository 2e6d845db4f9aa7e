use alloc::vec::Vec;

use bitmaps::Bitmap;

use crate::consts::PLIC_NUM_SOURCES;
use crate::source::IrqSource;

/// Per-target arbitration unit.
///
/// A context never owns sources: `enabled` and `active` hold source IDs
/// indexing into the controller's source array, which every operation
/// receives from the caller holding the controller lock.
#[derive(Debug)]
pub(crate) struct IrqContext {
    id: usize,
    /// Sources this context arbitrates over.
    enabled: Bitmap<{ PLIC_NUM_SOURCES }>,
    /// Claimed but not yet completed sources, innermost last.
    active: Vec<usize>,
    /// Level of the output line.
    line: bool,
}

impl IrqContext {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            enabled: Bitmap::new(),
            active: Vec::new(),
            line: false,
        }
    }

    pub const fn line(&self) -> bool {
        self.line
    }

    pub fn is_enabled(&self, source: usize) -> bool {
        source < PLIC_NUM_SOURCES && self.enabled.get(source)
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Priority of the innermost claimed source, 0 when nothing is claimed.
    fn current_priority(&self, sources: &[IrqSource]) -> u32 {
        self.active.last().map_or(0, |&id| sources[id].priority)
    }

    fn excluded_by(&self, forced: Option<usize>) -> bool {
        forced.is_some_and(|target| target != self.id)
    }

    pub fn enable_source(
        &mut self,
        sources: &[IrqSource],
        forced: Option<usize>,
        source: usize,
        enabled: bool,
    ) {
        self.enabled.set(source, enabled);
        trace!(
            "{} source #{} @ context {}",
            if enabled { "Enabling" } else { "Disabling" },
            source,
            self.id
        );
        self.refresh(sources, forced);
    }

    /// Recomputes the output line. Idempotent.
    pub fn refresh(&mut self, sources: &[IrqSource], forced: Option<usize>) {
        if self.excluded_by(forced) {
            self.line = false;
            return;
        }
        let current = self.current_priority(sources);
        self.line = self
            .enabled
            .into_iter()
            .map(|id| &sources[id])
            .any(|src| src.is_pending && src.priority > current);
    }

    /// Claims the best pending source: highest priority, lowest ID on ties.
    /// Returns 0 when nothing can be claimed.
    pub fn acknowledge(&mut self, sources: &mut [IrqSource], forced: Option<usize>) -> u32 {
        let winner = if self.excluded_by(forced) {
            None
        } else {
            self.enabled
                .into_iter()
                .map(|id| &sources[id])
                .filter(|src| src.is_pending)
                .fold(None::<&IrqSource>, |best, src| match best {
                    Some(b) if b.priority >= src.priority => Some(b),
                    _ => Some(src),
                })
                .map(IrqSource::id)
        };

        let Some(id) = winner else {
            trace!("No pending interrupt to acknowledge @ context {}", self.id);
            return 0;
        };

        sources[id].is_pending = false;
        self.active.push(id);
        trace!("Acknowledging pending interrupt #{} @ context {}", id, self.id);

        self.refresh(sources, forced);
        id as u32
    }

    /// Finishes handling of `source`, which must be the innermost claim.
    pub fn complete(&mut self, sources: &mut [IrqSource], forced: Option<usize>, source: usize) {
        trace!("Completing irq {} @ context {}", source, self.id);

        let Some(top) = self.active.pop() else {
            error!(
                "Trying to complete irq {} @ context {}, there are no active interrupts left",
                source, self.id
            );
            return;
        };
        if top != source {
            // The popped entry is dropped, not restored.
            error!(
                "Trying to complete irq {} @ context {}, but {} is the active one",
                source, self.id, top
            );
            return;
        }

        sources[source].relatch();
        self.refresh(sources, forced);
    }

    pub fn reset(&mut self, sources: &[IrqSource], forced: Option<usize>) {
        self.active.clear();
        self.enabled = Bitmap::new();
        self.refresh(sources, forced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(priorities: &[u32]) -> Vec<IrqSource> {
        let mut v: Vec<IrqSource> = (0..=priorities.len()).map(IrqSource::new).collect();
        for (i, &p) in priorities.iter().enumerate() {
            v[i + 1].priority = p;
        }
        v
    }

    #[test]
    fn refresh_requires_enabled_and_pending() {
        let mut srcs = sources(&[1, 1]);
        let mut ctx = IrqContext::new(0);
        srcs[1].set_level(true);
        ctx.refresh(&srcs, None);
        assert!(!ctx.line());

        ctx.enable_source(&srcs, None, 1, true);
        assert!(ctx.line());

        ctx.enable_source(&srcs, None, 1, false);
        assert!(!ctx.line());
    }

    #[test]
    fn priority_zero_never_asserts() {
        let mut srcs = sources(&[0]);
        let mut ctx = IrqContext::new(0);
        ctx.enable_source(&srcs, None, 1, true);
        srcs[1].set_level(true);
        ctx.refresh(&srcs, None);
        assert!(!ctx.line());
    }

    #[test]
    fn acknowledge_breaks_ties_by_lowest_id() {
        let mut srcs = sources(&[2, 4, 4]);
        let mut ctx = IrqContext::new(0);
        for id in 1..=3 {
            ctx.enable_source(&srcs, None, id, true);
            srcs[id].set_level(true);
        }
        assert_eq!(ctx.acknowledge(&mut srcs, None), 2);
        assert_eq!(ctx.active(), &[2]);
        assert!(!srcs[2].is_pending);
    }

    #[test]
    fn acknowledge_without_pending_returns_zero() {
        let mut srcs = sources(&[3]);
        let mut ctx = IrqContext::new(0);
        ctx.enable_source(&srcs, None, 1, true);
        assert_eq!(ctx.acknowledge(&mut srcs, None), 0);
        assert!(ctx.active().is_empty());
    }

    #[test]
    fn nested_claims_unwind_in_reverse() {
        let mut srcs = sources(&[1, 6]);
        let mut ctx = IrqContext::new(0);
        ctx.enable_source(&srcs, None, 1, true);
        ctx.enable_source(&srcs, None, 2, true);

        srcs[1].set_level(true);
        assert_eq!(ctx.acknowledge(&mut srcs, None), 1);
        srcs[2].set_level(true);
        ctx.refresh(&srcs, None);
        assert!(ctx.line());
        assert_eq!(ctx.acknowledge(&mut srcs, None), 2);
        assert_eq!(ctx.active(), &[1, 2]);

        ctx.complete(&mut srcs, None, 2);
        ctx.complete(&mut srcs, None, 1);
        assert!(ctx.active().is_empty());
    }

    #[test]
    fn mismatched_complete_drops_top() {
        let mut srcs = sources(&[1, 2]);
        let mut ctx = IrqContext::new(0);
        ctx.enable_source(&srcs, None, 1, true);
        srcs[1].set_level(true);
        assert_eq!(ctx.acknowledge(&mut srcs, None), 1);

        ctx.complete(&mut srcs, None, 2);
        assert!(ctx.active().is_empty());
        assert!(!srcs[1].is_pending);
    }

    #[test]
    fn complete_on_empty_stack_is_noop() {
        let mut srcs = sources(&[1]);
        let mut ctx = IrqContext::new(0);
        ctx.complete(&mut srcs, None, 1);
        assert!(ctx.active().is_empty());
        assert!(!ctx.line());
    }

    #[test]
    fn forced_elsewhere_masks_line_and_claims() {
        let mut srcs = sources(&[5]);
        let mut ctx = IrqContext::new(0);
        ctx.enable_source(&srcs, None, 1, true);
        srcs[1].set_level(true);

        ctx.refresh(&srcs, Some(1));
        assert!(!ctx.line());
        assert_eq!(ctx.acknowledge(&mut srcs, Some(1)), 0);
        assert!(srcs[1].is_pending);

        assert_eq!(ctx.acknowledge(&mut srcs, Some(0)), 1);
    }
}
