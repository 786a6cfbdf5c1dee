//! NDR array types
//!
//! NDR supports several array types:
//!
//! - Fixed arrays: size known at compile time
//! - Conformant arrays: size determined at runtime, transmitted as prefix
//! - Varying arrays: subset of elements transmitted
//! - Conformant varying arrays: both conformant and varying
//!
//! Conformant arrays carry their declared `[range(MIN, MAX)]` as const
//! parameters. The range is enforced before encoding writes anything and
//! before decoding allocates anything.

use std::marker::PhantomData;

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Inclusive length range declared for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u64,
    pub max: u64,
}

impl Bounds {
    /// Anything a 32-bit size field can express
    pub const UNBOUNDED: Bounds = Bounds::new(0, u32::MAX as u64);

    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: u64) -> bool {
        (self.min..=self.max).contains(&len)
    }

    /// Check a value about to be encoded.
    pub fn check(&self, what: &'static str, len: u64) -> Result<()> {
        if !self.contains(len) {
            return Err(NdrError::OutOfRange {
                what,
                len,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Check a size field read off the wire.
    pub fn check_declared(&self, what: &'static str, declared: u64) -> Result<()> {
        if !self.contains(declared) {
            return Err(NdrError::DeclaredSizeOutOfRange {
                what,
                declared,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Fixed-size array
///
/// Wire format: just the elements (no size prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        for elem in &self.elements {
            w.write_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        for elem in self.elements.iter_mut() {
            r.read_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }

    fn ndr_min_size() -> usize {
        N.saturating_mul(T::ndr_min_size())
    }
}

/// Conformant array - size determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32    # declared size (size_is, or the element count)
/// elements[max_count]
/// ```
///
/// When `size_is` exceeds the number of elements held, the tail is filled
/// with default (zero) elements. Holding more elements than `size_is` is an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T, const MIN: u32 = 0, const MAX: u32 = { u32::MAX }> {
    pub elements: Vec<T>,
    /// Declared size; `None` means the element count
    pub size_is: Option<u32>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self::bounded(elements)
    }
}

impl<T, const MIN: u32, const MAX: u32> ConformantArray<T, MIN, MAX> {
    pub const BOUNDS: Bounds = Bounds::new(MIN as u64, MAX as u64);

    /// Array whose element type carries explicit bounds
    pub fn bounded(elements: Vec<T>) -> Self {
        Self {
            elements,
            size_is: None,
        }
    }

    /// Array transmitted with a declared size larger than its contents
    pub fn with_size(size_is: u32, elements: Vec<T>) -> Self {
        Self {
            elements,
            size_is: Some(size_is),
        }
    }

    /// Number of elements on the wire
    pub fn declared_len(&self) -> usize {
        self.size_is
            .map_or(self.elements.len(), |n| n as usize)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}

impl<T: NdrEncode + Default, const MIN: u32, const MAX: u32> NdrEncode
    for ConformantArray<T, MIN, MAX>
{
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let declared = self.declared_len();
        if self.elements.len() > declared {
            return Err(NdrError::ArraySizeMismatch {
                expected: declared,
                got: self.elements.len(),
            });
        }
        Self::BOUNDS.check("array", declared as u64)?;

        w.write_size(declared)?;
        for elem in &self.elements {
            w.write_aligned(elem)?;
        }
        for _ in self.elements.len()..declared {
            w.align(T::ndr_align());
            w.write_detached(&T::default())?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrDecode, const MIN: u32, const MAX: u32> NdrDecode for ConformantArray<T, MIN, MAX> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let declared = r.read_size()?;
        Self::BOUNDS.check_declared("array", declared as u64)?;
        let count = r.check_count(declared, T::ndr_min_size())?;

        self.size_is = None;
        self.elements.clear();
        self.elements.resize_with(count, T::default);
        for elem in self.elements.iter_mut() {
            r.read_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        4
    }
}

/// Varying array - fixed capacity N, subset transmitted
///
/// Wire format:
/// ```text
/// offset: u32
/// actual_count: u32
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T, const N: usize> {
    pub offset: usize,
    pub elements: Vec<T>,
    _marker: PhantomData<[T; N]>,
}

impl<T, const N: usize> Default for VaryingArray<T, N> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T, const N: usize> VaryingArray<T, N> {
    pub fn new(elements: Vec<T>) -> Self {
        Self::with_offset(0, elements)
    }

    pub fn with_offset(offset: usize, elements: Vec<T>) -> Self {
        Self {
            offset,
            elements,
            _marker: PhantomData,
        }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for VaryingArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let end = self
            .offset
            .checked_add(self.elements.len())
            .ok_or(NdrError::IntegerOverflow)?;
        if end > N {
            return Err(NdrError::ArraySizeMismatch { expected: N, got: end });
        }

        w.write_size(self.offset)?;
        w.write_size(self.elements.len())?;
        for elem in &self.elements {
            w.write_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for VaryingArray<T, N> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let offset = r.read_size()? as usize;
        let actual = r.read_size()?;
        let end = offset
            .checked_add(actual as usize)
            .ok_or(NdrError::IntegerOverflow)?;
        if end > N {
            return Err(NdrError::ConformanceMismatch {
                max_count: N as u32,
                actual_count: end as u32,
            });
        }
        let count = r.check_count(actual, T::ndr_min_size())?;

        self.offset = offset;
        self.elements.clear();
        self.elements.resize_with(count, T::default);
        for elem in self.elements.iter_mut() {
            r.read_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

/// Conformant varying array - size and subset determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32    # Maximum elements (conformance)
/// offset: u32       # First transmitted element
/// actual_count: u32 # Number of transmitted elements
/// elements[actual_count]
/// ```
///
/// A decoded `actual_count` larger than `max_count` is clamped to
/// `max_count`; an `offset` that pushes the transmitted run past `max_count`
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T, const MIN: u32 = 0, const MAX: u32 = { u32::MAX }> {
    pub max_count: usize,
    pub offset: usize,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        let len = elements.len();
        Self::with_max(len, elements)
    }
}

impl<T, const MIN: u32, const MAX: u32> ConformantVaryingArray<T, MIN, MAX> {
    pub const BOUNDS: Bounds = Bounds::new(MIN as u64, MAX as u64);

    pub fn with_max(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset: 0,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: NdrEncode, const MIN: u32, const MAX: u32> NdrEncode for ConformantVaryingArray<T, MIN, MAX> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let end = self
            .offset
            .checked_add(self.elements.len())
            .ok_or(NdrError::IntegerOverflow)?;
        if end > self.max_count {
            return Err(NdrError::ArraySizeMismatch {
                expected: self.max_count,
                got: end,
            });
        }
        Self::BOUNDS.check("array", self.max_count as u64)?;

        w.write_size(self.max_count)?;
        w.write_size(self.offset)?;
        w.write_size(self.elements.len())?;
        for elem in &self.elements {
            w.write_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrDecode, const MIN: u32, const MAX: u32> NdrDecode for ConformantVaryingArray<T, MIN, MAX> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let max_count = r.read_size()?;
        Self::BOUNDS.check_declared("array", max_count as u64)?;
        let offset = r.read_size()?;
        let actual = r.read_size()?.min(max_count);
        let end = offset.saturating_add(actual);
        if end > max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: end,
            });
        }
        let count = r.check_count(actual, T::ndr_min_size())?;

        self.max_count = max_count as usize;
        self.offset = offset as usize;
        self.elements.clear();
        self.elements.resize_with(count, T::default);
        for elem in self.elements.iter_mut() {
            r.read_aligned(elem)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        12
    }
}
