use crate::prelude::{PipelineError, PipelineResult};

/// Scoped scratch-buffer pool that caps concurrent allocations.
///
/// Checked-out buffers count against `max_outstanding`; releasing a buffer
/// returns it for reuse. Exhaustion surfaces as `MemoryAllocation` so a
/// caller can release partial work and retry.
pub struct BufferPool<T> {
    buffers: Vec<Vec<T>>,
    outstanding: usize,
    max_outstanding: usize,
}

impl<T: Copy + Default> BufferPool<T> {
    pub fn with_capacity(max_outstanding: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_outstanding),
            outstanding: 0,
            max_outstanding,
        }
    }

    pub fn checkout(&mut self, length: usize) -> PipelineResult<Vec<T>> {
        if self.outstanding >= self.max_outstanding {
            return Err(PipelineError::MemoryAllocation(format!(
                "buffer pool depleted ({} outstanding)",
                self.outstanding
            )));
        }
        self.outstanding += 1;
        if let Some(mut buffer) = self.buffers.pop() {
            buffer.clear();
            buffer.resize(length, T::default());
            Ok(buffer)
        } else {
            Ok(vec![T::default(); length])
        }
    }

    pub fn release(&mut self, mut buffer: Vec<T>) {
        buffer.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.buffers.len() < self.max_outstanding {
            self.buffers.push(buffer);
        }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.outstanding = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_release_reuses_buffers() {
        let mut pool: BufferPool<f32> = BufferPool::with_capacity(2);
        let a = pool.checkout(8).unwrap();
        assert_eq!(a.len(), 8);
        pool.release(a);
        let b = pool.checkout(16).unwrap();
        assert_eq!(b.len(), 16);
        assert!(b.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut pool: BufferPool<f32> = BufferPool::with_capacity(1);
        let held = pool.checkout(4).unwrap();
        assert!(matches!(
            pool.checkout(4),
            Err(PipelineError::MemoryAllocation(_))
        ));
        pool.release(held);
        assert!(pool.checkout(4).is_ok());
    }
}
