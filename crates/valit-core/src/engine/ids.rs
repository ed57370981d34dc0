/// A wrapper for the position of a state in the caller's state enumeration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateIndex(usize);

impl StateIndex {
    /// Get the position without having to access and risk overriding the internal value
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for StateIndex {
    /// Allow for explicit conversion from usize to StateIndex
    fn from(value: usize) -> Self {
        StateIndex(value)
    }
}

/// A wrapper for the position of an action in the caller's action enumeration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionIndex(usize);

impl ActionIndex {
    /// Get the position without having to access and risk overriding the internal value
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionIndex {
    /// Allow for explicit conversion from usize to ActionIndex
    fn from(value: usize) -> Self {
        ActionIndex(value)
    }
}
