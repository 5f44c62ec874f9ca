/// A cached value plus an explicit "has been set since the last invalidate"
/// flag.
///
/// The unset state is distinct from every value: the driver default is never
/// assumed to equal `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateCell<T> {
    value: Option<T>,
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Copy + PartialEq> StateCell<T> {
    /// Store `value` if the cell is unset or holds something else.
    ///
    /// Returns `true` when the caller must issue the driver call.
    pub fn set_if_changed(&mut self, value: T) -> bool {
        if self.value == Some(value) {
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<T> {
        self.value
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Forget the cached value so the next set always applies.
    pub fn invalidate(&mut self) {
        self.value = None;
    }

    /// Invalidate only if the cell currently holds `value`.
    pub fn forget(&mut self, value: T) -> bool {
        if self.value == Some(value) {
            self.value = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_set_always_applies() {
        let mut cell = StateCell::<u32>::default();
        assert!(!cell.is_set());
        assert!(cell.set_if_changed(0));
        assert_eq!(cell.get(), Some(0));
    }

    #[test]
    fn repeated_value_is_suppressed() {
        let mut cell = StateCell::default();
        assert!(cell.set_if_changed(5u32));
        assert!(!cell.set_if_changed(5));
        assert!(cell.set_if_changed(6));
    }

    #[test]
    fn invalidate_restores_first_call_guarantee() {
        let mut cell = StateCell::default();
        cell.set_if_changed(true);
        cell.invalidate();
        assert!(cell.set_if_changed(true));
    }

    #[test]
    fn forget_only_matching_value() {
        let mut cell = StateCell::default();
        cell.set_if_changed(3u32);
        assert!(!cell.forget(4));
        assert!(cell.is_set());
        assert!(cell.forget(3));
        assert!(!cell.is_set());
    }
}
