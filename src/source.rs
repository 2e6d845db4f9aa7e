/// Latch state of one interrupt source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IrqSource {
    id: usize,
    /// 3-bit priority; higher wins arbitration.
    pub priority: u32,
    /// Last raw level seen on the input line.
    pub state: bool,
    /// Sticky: set on a high level, cleared only by a claim.
    pub is_pending: bool,
}

impl IrqSource {
    pub const fn new(id: usize) -> Self {
        Self {
            id,
            priority: 0,
            state: false,
            is_pending: false,
        }
    }

    pub const fn id(&self) -> usize {
        self.id
    }

    pub fn set_level(&mut self, level: bool) {
        self.state = level;
        self.is_pending |= level;
    }

    /// Re-arms the latch from the current level once a claim is completed.
    pub fn relatch(&mut self) {
        self.is_pending = self.state;
    }

    pub fn reset(&mut self) {
        self.priority = 0;
        self.state = false;
        self.is_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_sticky() {
        let mut src = IrqSource::new(3);
        src.set_level(true);
        src.set_level(false);
        assert!(src.is_pending);
        assert!(!src.state);
    }

    #[test]
    fn relatch_follows_level() {
        let mut src = IrqSource::new(3);
        src.set_level(true);
        src.is_pending = false;
        src.relatch();
        assert!(src.is_pending);

        src.set_level(false);
        src.relatch();
        assert!(!src.is_pending);
    }

    #[test]
    fn reset_clears_everything_but_id() {
        let mut src = IrqSource::new(7);
        src.priority = 5;
        src.set_level(true);
        src.reset();
        assert_eq!(src, IrqSource::new(7));
    }
}
