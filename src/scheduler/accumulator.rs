/// Upper bound on the capacity reserved up front for a new batch.
const MAX_PREALLOCATED: usize = 4096;

/// The in-progress batch, owned by the scheduler loop.
#[derive(Debug)]
pub struct Accumulator<T> {
    items: Vec<T>,
    reserve: usize,
}

impl<T> Accumulator<T> {
    pub fn new(max_batch_size: usize) -> Self {
        let reserve = max_batch_size.min(MAX_PREALLOCATED);
        Self {
            items: Vec::with_capacity(reserve),
            reserve,
        }
    }

    /// Appends an item and returns the new batch length.
    pub fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hands out the batch and starts over with a new allocation.
    pub fn take(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.reserve))
    }
}
