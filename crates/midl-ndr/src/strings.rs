//! NDR string types
//!
//! NDR strings are conformant varying arrays with a null terminator.
//!
//! Wire format:
//! ```text
//! max_count: u32    # Maximum elements including null
//! offset: u32       # Always 0
//! actual_count: u32 # Actual elements including null
//! chars[actual_count]
//! ```
//!
//! A decoded string may omit the terminator; a trailing null is stripped
//! when present. Declared character ranges count characters without the
//! terminator.

use std::char::decode_utf16;

use crate::{
    Bounds, DeferredDecode, DeferredEncode, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter,
    Result,
};

fn write_header(w: &mut NdrWriter<'_>, count_with_null: usize) -> Result<()> {
    w.write_size(count_with_null)?;
    w.write_size(0)?;
    w.write_size(count_with_null)
}

fn read_header(r: &mut NdrReader<'_>, bounds: Bounds, unit_size: usize) -> Result<usize> {
    let max_count = r.read_size()?;
    let offset = r.read_size()?;
    let actual_count = r.read_size()?;

    if offset != 0 {
        return Err(NdrError::InvalidString(format!("non-zero offset {}", offset)));
    }
    if actual_count > max_count {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            actual_count,
        });
    }
    // a terminator may or may not follow, so only the shortest reading can
    // be checked before the characters arrive
    bounds.check_declared("string", u64::from(actual_count).saturating_sub(1))?;
    r.check_count(actual_count, unit_size)
}

/// Write a null-terminated UTF-16 string.
pub fn write_wstr(w: &mut NdrWriter<'_>, s: &str, bounds: Bounds) -> Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    bounds.check("string", units.len() as u64)?;

    write_header(w, units.len() + 1)?;
    for unit in units {
        w.write_u16(unit);
    }
    w.write_u16(0);
    Ok(())
}

/// Read a UTF-16 string, dropping the terminator if one was sent.
pub fn read_wstr(r: &mut NdrReader<'_>, bounds: Bounds) -> Result<String> {
    let count = read_header(r, bounds, 2)?;
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        units.push(r.read_u16()?);
    }
    if units.last() == Some(&0) {
        units.pop();
    }
    bounds.check_declared("string", units.len() as u64)?;
    Ok(decode_utf16(units).collect::<std::result::Result<String, _>>()?)
}

/// Write a null-terminated 8-bit string.
pub fn write_str(w: &mut NdrWriter<'_>, s: &str, bounds: Bounds) -> Result<()> {
    let bytes = s.as_bytes();
    bounds.check("string", bytes.len() as u64)?;

    write_header(w, bytes.len() + 1)?;
    w.write_bytes(bytes);
    w.write_u8(0);
    Ok(())
}

/// Read an 8-bit string, dropping the terminator if one was sent.
pub fn read_str(r: &mut NdrReader<'_>, bounds: Bounds) -> Result<String> {
    let count = read_header(r, bounds, 1)?;
    let mut bytes = r.read_bytes(count)?.to_vec();
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    bounds.check_declared("string", bytes.len() as u64)?;
    Ok(String::from_utf8(bytes)?)
}

/// ANSI string type (null-terminated char*)
///
/// Used for [string] annotated char* parameters in MIDL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrString(pub String);

impl NdrString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrEncode for NdrString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        write_str(w, &self.0, Bounds::UNBOUNDED)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for NdrString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_str(r, Bounds::UNBOUNDED)?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// Unicode string type (null-terminated wchar_t*)
///
/// Used for [string] annotated wchar_t* parameters in MIDL. `MAX` is the
/// declared upper bound on characters, excluding the terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct NdrWString<const MAX: u32 = { u32::MAX }>(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl<const MAX: u32> NdrWString<MAX> {
    pub const BOUNDS: Bounds = Bounds::new(0, MAX as u64);

    /// String whose type carries an explicit bound
    pub fn bounded(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NdrWString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<const MAX: u32> NdrEncode for NdrWString<MAX> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        write_wstr(w, &self.0, Self::BOUNDS)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<const MAX: u32> NdrDecode for NdrWString<MAX> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_wstr(r, Self::BOUNDS)?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// BSTR - COM-style string
///
/// On the wire a BSTR travels as a conformant varying UTF-16 string, same
/// as `NdrWString`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BString(pub String);

impl BString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl NdrEncode for BString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        write_wstr(w, &self.0, Bounds::UNBOUNDED)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for BString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_wstr(r, Bounds::UNBOUNDED)?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// Nullable pointer to a UTF-16 string (`[string, unique] wchar_t*`)
///
/// An empty string is sent as a null pointer and a null pointer decodes to
/// an empty string, so "absent" and "empty" cannot be told apart. Use
/// `UniquePtr<NdrWString>` where the difference matters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct LpWStr(pub String);

impl LpWStr {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for LpWStr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrEncode for LpWStr {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let body: Option<&'a (dyn DeferredEncode + 'a)> = if self.0.is_empty() {
            None
        } else {
            Some(self)
        };
        w.write_pointer(body);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl DeferredEncode for LpWStr {
    fn encode_deferred<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        write_wstr(w, &self.0, Bounds::UNBOUNDED)
    }
}

impl NdrDecode for LpWStr {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.clear();
        if r.read_referent()? != 0 {
            r.defer(self);
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

impl DeferredDecode for LpWStr {
    fn decode_deferred<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_wstr(r, Bounds::UNBOUNDED)?;
        Ok(())
    }
}
