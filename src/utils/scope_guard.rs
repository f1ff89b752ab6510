/// Runs a closure when dropped unless it has been disarmed.
///
/// Session teardown hangs off this so that registry cleanup also happens
/// when the owning task returns early or is aborted.
pub struct ScopeGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> ScopeGuard<F> {
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }

    /// Run the cleanup now instead of at drop.
    pub fn fire(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}
