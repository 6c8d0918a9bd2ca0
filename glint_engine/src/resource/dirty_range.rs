/// Element range `[first, last)` modified since the last commit
///
/// Empty is encoded as `first = usize::MAX, last = 0` so that any expansion
/// takes the written range verbatim.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    first: usize,
    last: usize,
}

impl DirtyRange {
    /// Empty range
    pub fn new() -> Self {
        Self { first: usize::MAX, last: 0 }
    }

    /// Grow to cover `[start, end)`
    pub fn expand(&mut self, start: usize, end: usize) {
        self.first = self.first.min(start);
        self.last = self.last.max(end);
    }

    /// Whether nothing is dirty
    pub fn is_empty(&self) -> bool {
        self.first >= self.last
    }

    /// Current bounds, `None` when empty
    pub fn bounds(&self) -> Option<(usize, usize)> {
        if self.is_empty() { None } else { Some((self.first, self.last)) }
    }

    /// Return the current bounds and reset to empty
    pub fn take(&mut self) -> Option<(usize, usize)> {
        let bounds = self.bounds();
        *self = Self::new();
        bounds
    }
}

impl Default for DirtyRange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dirty_range_tests.rs"]
mod tests;
