//! Lookback window: fixed-capacity ring buffer of the most recent bars.
//!
//! Pushing onto a full window evicts the oldest entry. The state machine only
//! asks whether the window is full and for an ordered (oldest-first) view.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct LookbackWindow<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> LookbackWindow<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "lookback capacity must be >= 1");
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contents oldest-first as one contiguous slice.
    pub fn snapshot(&mut self) -> &[T] {
        self.items.make_contiguous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_then_reports_full() {
        let mut window = LookbackWindow::new(3);
        assert!(window.is_empty());
        window.push(1);
        window.push(2);
        assert!(!window.is_full());
        window.push(3);
        assert!(window.is_full());
        assert_eq!(window.snapshot(), &[1, 2, 3]);
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut window = LookbackWindow::new(3);
        for i in 1..=5 {
            window.push(i);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.snapshot(), &[3, 4, 5]);
    }

    #[test]
    fn capacity_one_holds_latest() {
        let mut window = LookbackWindow::new(1);
        window.push("a");
        assert!(window.is_full());
        window.push("b");
        assert_eq!(window.snapshot(), &["b"]);
        assert_eq!(window.capacity(), 1);
    }

    #[test]
    #[should_panic(expected = "lookback capacity must be >= 1")]
    fn zero_capacity_rejected() {
        let _ = LookbackWindow::<u8>::new(0);
    }
}
