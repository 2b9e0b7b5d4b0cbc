//! Index arrays stored at the narrowest unsigned width fitting their values

use serde::{Serialize, Serializer};
use std::mem;
use std::ops::Range;

/// Fixed-length array of indices whose element width is picked once from the
/// largest value it will ever hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerArray {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

impl PointerArray {
    /// Zeroed array of `len` slots able to store any value in `0..=max_value`
    pub fn for_max_value(max_value: usize, len: usize) -> Self {
        if max_value <= u8::MAX as usize {
            PointerArray::U8(vec![0; len])
        } else if max_value <= u16::MAX as usize {
            PointerArray::U16(vec![0; len])
        } else if max_value <= u32::MAX as usize {
            PointerArray::U32(vec![0; len])
        } else {
            PointerArray::U64(vec![0; len])
        }
    }

    /// `[0, 1, .., len - 1]`
    pub fn identity(len: usize) -> Self {
        let mut array = Self::for_max_value(len.saturating_sub(1), len);
        for i in 0..len {
            array.set(i, i);
        }
        array
    }

    #[inline]
    pub fn get(&self, i: usize) -> usize {
        match self {
            PointerArray::U8(v) => v[i] as usize,
            PointerArray::U16(v) => v[i] as usize,
            PointerArray::U32(v) => v[i] as usize,
            PointerArray::U64(v) => v[i] as usize,
        }
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: usize) {
        debug_assert!(value <= self.max_value(), "{value} overflows pointer width");
        match self {
            PointerArray::U8(v) => v[i] = value as u8,
            PointerArray::U16(v) => v[i] = value as u16,
            PointerArray::U32(v) => v[i] = value as u32,
            PointerArray::U64(v) => v[i] = value as u64,
        }
    }

    /// Decrement slot `i` and return its new value
    #[inline]
    pub fn decrement(&mut self, i: usize) -> usize {
        let value = self.get(i) - 1;
        self.set(i, value);
        value
    }

    pub fn len(&self) -> usize {
        match self {
            PointerArray::U8(v) => v.len(),
            PointerArray::U16(v) => v.len(),
            PointerArray::U32(v) => v.len(),
            PointerArray::U64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element width in bytes
    pub fn width(&self) -> usize {
        match self {
            PointerArray::U8(_) => mem::size_of::<u8>(),
            PointerArray::U16(_) => mem::size_of::<u16>(),
            PointerArray::U32(_) => mem::size_of::<u32>(),
            PointerArray::U64(_) => mem::size_of::<u64>(),
        }
    }

    pub fn max_value(&self) -> usize {
        match self {
            PointerArray::U8(_) => u8::MAX as usize,
            PointerArray::U16(_) => u16::MAX as usize,
            PointerArray::U32(_) => u32::MAX as usize,
            PointerArray::U64(_) => usize::MAX,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Owned copy of the first `len` values
    pub fn prefix(&self, len: usize) -> Vec<usize> {
        self.iter().take(len).collect()
    }

    /// Sort the values stored in `range` in place
    pub fn sort_range(&mut self, range: Range<usize>) {
        match self {
            PointerArray::U8(v) => v[range].sort_unstable(),
            PointerArray::U16(v) => v[range].sort_unstable(),
            PointerArray::U32(v) => v[range].sort_unstable(),
            PointerArray::U64(v) => v[range].sort_unstable(),
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.len() * self.width()
    }
}

impl Serialize for PointerArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_max_value() {
        assert_eq!(PointerArray::for_max_value(255, 4).width(), 1);
        assert_eq!(PointerArray::for_max_value(256, 4).width(), 2);
        assert_eq!(PointerArray::for_max_value(65_535, 4).width(), 2);
        assert_eq!(PointerArray::for_max_value(65_536, 4).width(), 4);
        assert_eq!(PointerArray::for_max_value(0, 0).width(), 1);
    }

    #[test]
    fn identity_and_decrement() {
        let mut array = PointerArray::identity(5);
        assert_eq!(array.prefix(5), vec![0, 1, 2, 3, 4]);

        assert_eq!(array.decrement(4), 3);
        assert_eq!(array.get(4), 3);
    }

    #[test]
    fn sort_range_leaves_other_slots_alone() {
        let mut array = PointerArray::for_max_value(300, 5);
        for (i, value) in [9, 300, 4, 7, 1].into_iter().enumerate() {
            array.set(i, value);
        }

        array.sort_range(1..4);
        assert_eq!(array.prefix(5), vec![9, 4, 7, 300, 1]);
        assert_eq!(array.memory_usage(), 10);
    }

    #[test]
    fn serializes_as_plain_sequence() {
        let array = PointerArray::identity(3);
        assert_eq!(serde_json::to_string(&array).unwrap(), "[0,1,2]");
    }
}
