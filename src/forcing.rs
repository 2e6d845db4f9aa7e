use axerrno::{AxError, AxResult};

/// Capability restricting arbitration to a single forced context.
///
/// While a target is forced, only that context's line may assert and only
/// it may claim. Other contexts see no pending interrupts.
pub trait TargetForcing: Send {
    /// Currently forced context, `None` when forcing is off.
    fn forced_target(&self) -> Option<usize>;

    /// Forces `target`, or lifts forcing with `None`.
    fn force_target(&mut self, target: Option<usize>) -> AxResult;
}

/// Controller variant without target forcing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoForcing;

impl TargetForcing for NoForcing {
    fn forced_target(&self) -> Option<usize> {
        None
    }

    fn force_target(&mut self, _target: Option<usize>) -> AxResult {
        Err(AxError::Unsupported)
    }
}
