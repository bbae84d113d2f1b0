use std::fmt::Display;

/// VecFixed is a vector with a fixed capacity that lives inline, without heap allocation.
/// Pushing into a full vector hands the element back instead of growing or evicting.
#[derive(Clone, Copy, Debug)]
pub struct VecFixed<const N: usize, T: Copy + Default> {
    len: usize,
    buffer: [T; N],
}

impl<const N: usize, T: Copy + Default> Default for VecFixed<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, T: Copy + Default> VecFixed<N, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            len: 0,
            buffer: [T::default(); N],
        }
    }

    /// Appends `element`, or returns it back as `Err` if the vector is already full.
    pub fn push(&mut self, element: T) -> Result<(), T> {
        if self.len == N {
            return Err(element);
        }

        self.buffer[self.len] = element;
        self.len += 1;

        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        Some(self.buffer[self.len])
    }

    pub const fn clear(&mut self) {
        self.len = 0;
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.buffer[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<const N: usize, T: Copy + Default + Display> VecFixed<N, T> {
    /// Join the elements of the VecFixed buffer into a string.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        let mut s = String::new();

        for (i, element) in self.iter().enumerate() {
            if i > 0 {
                s.push_str(separator);
            }
            s.push_str(&element.to_string());
        }

        s
    }
}

impl<'a, const N: usize, T: Copy + Default> IntoIterator for &'a VecFixed<N, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
