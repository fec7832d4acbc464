//! Tagged optional integer.

/// An integer that may be absent.
///
/// Used where a lookup can miss and the miss must be distinguishable from a
/// legitimate zero, such as resolving a port name to a port number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OptionalInteger(Option<i32>);

impl OptionalInteger {
    pub const fn new(value: i32, exists: bool) -> Self {
        if exists {
            Self(Some(value))
        } else {
            Self(None)
        }
    }

    pub const fn of(value: i32) -> Self {
        Self(Some(value))
    }

    pub const fn empty() -> Self {
        Self(None)
    }

    /// The value and whether it exists; the value is 0 when absent.
    pub fn unpack(self) -> (i32, bool) {
        match self.0 {
            Some(v) => (v, true),
            None => (0, false),
        }
    }

    pub fn value(self) -> Option<i32> {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0.is_none()
    }

    /// True only if the value exists and equals `value`.
    pub fn equals(self, value: i32) -> bool {
        self.0 == Some(value)
    }
}

impl From<Option<i32>> for OptionalInteger {
    fn from(value: Option<i32>) -> Self {
        Self(value)
    }
}

impl From<OptionalInteger> for Option<i32> {
    fn from(value: OptionalInteger) -> Self {
        value.0
    }
}
