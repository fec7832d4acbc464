//! Order lists: which pattern plays at each song position.

use alloc::vec::Vec;

/// Pattern indices per song position; missing positions read as -1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Order(pub Vec<i32>);

impl Order {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Pattern index at `position`, or -1 outside the list.
    pub fn get(&self, position: isize) -> i32 {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.0.get(p).copied())
            .unwrap_or(-1)
    }

    /// Set the pattern index at `position`, growing the list with -1.
    pub fn set(&mut self, position: usize, value: i32) {
        if self.0.len() <= position {
            self.0.resize(position + 1, -1);
        }
        self.0[position] = value;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<i32>> for Order {
    fn from(v: Vec<i32>) -> Self {
        Self(v)
    }
}
