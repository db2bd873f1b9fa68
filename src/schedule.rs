use std::time::Duration;

/// What to do between two consecutive upstream requests.
pub trait DelayPolicy {
    fn pause(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelayPolicy for FixedDelay {
    fn pause(&self) {
        if !self.0.is_zero() {
            std::thread::sleep(self.0);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayPolicy for NoDelay {
    fn pause(&self) {}
}

/// Strictly sequential loop with the delay policy applied between items.
pub struct Paced<'a> {
    policy: &'a dyn DelayPolicy,
}

impl<'a> Paced<'a> {
    pub fn new(policy: &'a dyn DelayPolicy) -> Self {
        Self { policy }
    }

    pub fn map<T, R>(&self, items: &[T], mut f: impl FnMut(&T) -> R) -> Vec<R> {
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.policy.pause();
            }
            out.push(f(item));
        }
        out
    }
}
