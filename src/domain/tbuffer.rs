//! TBuffer - two-phase accumulate-then-commit quantity
//!
//! During a pass, removals and additions are only recorded. Removals are
//! limited to what was committed minus what already left this pass, so mass
//! that arrived this pass can not be forwarded again before `apply`. The
//! committed value only changes in `apply`, which gives every reader the
//! same view for the whole pass.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TBuffer {
    value: f64,
    incoming: f64,
    outgoing: f64,
}

impl TBuffer {
    pub fn new(value: f64) -> Self {
        Self { value: value.max(0.0), incoming: 0.0, outgoing: 0.0 }
    }

    /// Committed amount.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Committed amount not yet promised away this pass.
    #[inline]
    pub fn available(&self) -> f64 {
        (self.value - self.outgoing).max(0.0)
    }

    /// Amount `apply` would commit.
    #[inline]
    pub fn projected(&self) -> f64 {
        (self.value - self.outgoing + self.incoming).max(0.0)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.incoming != 0.0 || self.outgoing != 0.0
    }

    /// Record an incoming transfer. Negative amounts are ignored.
    pub fn add(&mut self, amount: f64) {
        if amount > 0.0 {
            self.incoming += amount;
        }
    }

    /// Record an outgoing transfer of up to `amount`. Returns the amount
    /// actually reserved, never more than `available()`.
    pub fn remove(&mut self, amount: f64) -> f64 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let moved = amount.min(self.available());
        self.outgoing += moved;
        moved
    }

    /// Hand back part of an earlier `remove` that could not be delivered.
    pub fn refund(&mut self, amount: f64) {
        if amount > 0.0 {
            self.outgoing = (self.outgoing - amount).max(0.0);
        }
    }

    /// Commit pending transfers. Returns the new value.
    pub fn apply(&mut self) -> f64 {
        self.value = self.projected();
        self.incoming = 0.0;
        self.outgoing = 0.0;
        self.value
    }

    /// Change the committed value directly, clamped at zero. Only valid
    /// between passes, where no transfer is pending against the old value.
    /// Returns the change actually made.
    pub fn credit(&mut self, amount: f64) -> f64 {
        let before = self.value;
        self.value = (self.value + amount).max(0.0);
        self.value - before
    }

    /// Overwrite the committed value and drop pending transfers.
    pub fn reset(&mut self, value: f64) {
        *self = Self::new(value);
    }
}
