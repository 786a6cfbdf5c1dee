//! NDR discriminated unions
//!
//! Wire format:
//! ```text
//! <align to max(4, arm alignment)>
//! selector: u32
//! <align to arm alignment>
//! arm
//! ```
//!
//! A union type lists its arms once, through `NdrUnion`; `write_union` and
//! `read_union` supply the framing. An unknown selector fails the decode
//! instead of producing an unset union.

use crate::{NdrError, NdrReader, NdrWriter, Result};

/// A tagged union with a 32-bit selector
pub trait NdrUnion: Default {
    /// Alignment of the widest arm
    const ARM_ALIGN: usize;

    /// Selector for the arm currently held
    fn selector(&self) -> u32;

    /// Write the arm currently held
    fn encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Replace `self` with the default value of the arm for `selector`.
    fn select(&mut self, selector: u32) -> Result<()>;

    /// Read the arm chosen by the last `select`
    fn decode_arm<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()>;
}

/// Convenience for `NdrUnion::select` implementations.
pub fn unknown_selector<T>(selector: u32) -> Result<T> {
    Err(NdrError::InvalidDiscriminant(selector))
}

pub fn write_union<'a, U: NdrUnion>(value: &'a U, w: &mut NdrWriter<'a>) -> Result<()> {
    w.align(U::ARM_ALIGN.max(4));
    w.write_u32(value.selector());
    w.align(U::ARM_ALIGN);
    value.encode_arm(w)
}

pub fn read_union<'a, U: NdrUnion>(value: &'a mut U, r: &mut NdrReader<'a>) -> Result<()> {
    r.align(U::ARM_ALIGN.max(4))?;
    let selector = r.read_u32()?;
    r.align(U::ARM_ALIGN)?;
    value.select(selector)?;
    value.decode_arm(r)
}
