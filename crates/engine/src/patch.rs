//! Tri-state field update used by the partial-update operations.

/// Update instruction for a nullable field.
///
/// Required fields use a plain `Option<T>` (absent means unchanged). Nullable
/// fields need a third state so "leave it alone" and "clear it" stay distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Resolve the patch against the current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// `None` keeps, `Some(None)` clears, `Some(Some(v))` sets.
///
/// This is the shape produced by a "double option" JSON field.
impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => Self::Keep,
            Some(None) => Self::Clear,
            Some(Some(v)) => Self::Set(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_covers_all_states() {
        assert_eq!(Patch::Keep.apply(Some(1)), Some(1));
        assert_eq!(Patch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(Patch::Set(2).apply(None), Some(2));
    }

    #[test]
    fn double_option_maps_to_patch() {
        assert_eq!(Patch::<u8>::from(None), Patch::Keep);
        assert_eq!(Patch::<u8>::from(Some(None)), Patch::Clear);
        assert_eq!(Patch::from(Some(Some(3u8))), Patch::Set(3));
    }
}
