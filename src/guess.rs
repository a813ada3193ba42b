use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The learner's in-progress answer, shareable with other threads.
/// Clones refer to the same list.
#[derive(Debug, Clone, Default)]
pub struct GuessBuffer {
    notes: Arc<Mutex<Vec<i32>>>,
}

impl GuessBuffer {
    pub fn new() -> Self {
        GuessBuffer::default()
    }

    // A panic elsewhere can't leave a Vec<i32> half-written, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<i32>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a note, returning the new length.
    pub fn push(&self, note: i32) -> usize {
        let mut notes = self.lock();
        notes.push(note);
        notes.len()
    }

    /// Drop the most recent note. No-op when empty.
    pub fn pop(&self) -> Option<i32> {
        self.lock().pop()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<i32> {
        self.lock().clone()
    }

    /// Take the current contents, leaving the buffer empty.
    pub fn drain(&self) -> Vec<i32> {
        std::mem::take(&mut *self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_and_pop() {
        let buf = GuessBuffer::new();
        assert_eq!(buf.pop(), None);
        assert_eq!(buf.push(60), 1);
        assert_eq!(buf.push(63), 2);
        assert_eq!(buf.pop(), Some(63));
        assert_eq!(buf.snapshot(), vec![60]);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_drain_empties() {
        let buf = GuessBuffer::new();
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.drain(), vec![1, 2]);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_concurrent_pushes() {
        let buf = GuessBuffer::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buf = buf.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        buf.push(t * 1000 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(buf.len(), 1000);
    }
}
