//! Wire shapes of the session store interface
//!
//! Every operation takes the store handle first. Responses end with the
//! 32-bit outcome code; out-parameters that carry pointers are flushed
//! before the fields that follow them.

use dcerpc::{Operation, Outcome, Status};
use midl_ndr::{
    ndr_enum, read_union, unknown_selector, write_union, ConformantArray, ContextHandle, LpWStr,
    NdrDecode, NdrEncode, NdrReader, NdrUnion, NdrWString, NdrWriter, Result, UniquePtr,
};

use crate::common::{opnum, INFO_LEVEL_BASIC, INFO_LEVEL_FULL, MAX_NAME_LEN, MAX_VALUE_SIZE};

/// Store or value name, at most `MAX_NAME_LEN` characters
pub type Name = NdrWString<MAX_NAME_LEN>;

/// Value payload, at most `MAX_VALUE_SIZE` bytes
pub type ValueData = ConformantArray<u8, 0, MAX_VALUE_SIZE>;

ndr_enum! {
    /// Type tag stored with every value
    pub enum ValueKind {
        None = 0,
        String = 1,
        Binary = 3,
        Dword = 4,
    }
}

// =============================================================================
// OpenStore
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenStoreRequest {
    pub store_name: Name,
    pub desired_access: u32,
}

impl NdrEncode for OpenStoreRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.store_name.ndr_encode(w)?;
        w.write_u32(self.desired_access);
        Ok(())
    }
}

impl NdrDecode for OpenStoreRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.store_name.ndr_decode(r)?;
        self.desired_access = r.read_u32()?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        16
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenStoreResponse {
    pub handle: ContextHandle,
    pub status: Status,
}

impl NdrEncode for OpenStoreResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        self.status.ndr_encode(w)
    }
}

impl NdrDecode for OpenStoreResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.status.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        24
    }
}

impl Outcome for OpenStoreResponse {
    fn status(&self) -> Status {
        self.status
    }
}

pub struct OpenStore;

impl Operation for OpenStore {
    const OPNUM: u16 = opnum::OPEN_STORE;
    const NAME: &'static str = "/SessionStore/v1.0/OpenStore";
    type Request = OpenStoreRequest;
    type Response = OpenStoreResponse;
}

// =============================================================================
// SetValue
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetValueRequest {
    pub handle: ContextHandle,
    pub name: Name,
    pub kind: ValueKind,
    pub data: ValueData,
}

impl NdrEncode for SetValueRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        self.name.ndr_encode(w)?;
        self.kind.ndr_encode(w)?;
        self.data.ndr_encode(w)
    }
}

impl NdrDecode for SetValueRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.name.ndr_decode(r)?;
        self.kind = ValueKind::try_from(r.read_enum()?)?;
        self.data.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        38
    }
}

pub struct SetValue;

impl Operation for SetValue {
    const OPNUM: u16 = opnum::SET_VALUE;
    const NAME: &'static str = "/SessionStore/v1.0/SetValue";
    type Request = SetValueRequest;
    type Response = Status;
}

// =============================================================================
// QueryValue
// =============================================================================

/// `buffer_size` is the caller's capacity. A value that does not fit comes
/// back as `ERROR_INSUFFICIENT_BUFFER` with `needed` set and no data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryValueRequest {
    pub handle: ContextHandle,
    pub name: Name,
    pub buffer_size: u32,
}

impl NdrEncode for QueryValueRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        self.name.ndr_encode(w)?;
        w.write_u32(self.buffer_size);
        Ok(())
    }
}

impl NdrDecode for QueryValueRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.name.ndr_decode(r)?;
        self.buffer_size = r.read_u32()?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        36
    }
}

/// On success `data` is sized to the caller's buffer, zero-filled past
/// `needed` bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryValueResponse {
    pub kind: ValueKind,
    pub data: UniquePtr<ValueData>,
    pub needed: u32,
    pub status: Status,
}

impl QueryValueResponse {
    pub fn failed(status: Status) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// The value's bytes without the zero fill
    pub fn value(&self) -> Option<&[u8]> {
        let data = self.data.as_ref()?;
        data.elements.get(..self.needed as usize)
    }
}

impl NdrEncode for QueryValueResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.kind.ndr_encode(w)?;
        self.data.ndr_encode(w)?;
        w.write_deferred()?;
        w.write_u32(self.needed);
        self.status.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for QueryValueResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.kind = ValueKind::try_from(r.read_enum()?)?;
        self.data.ndr_decode(r)?;
        r.read_deferred()?;
        self.needed = r.read_u32()?;
        self.status.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        14
    }
}

impl Outcome for QueryValueResponse {
    fn status(&self) -> Status {
        self.status
    }
}

pub struct QueryValue;

impl Operation for QueryValue {
    const OPNUM: u16 = opnum::QUERY_VALUE;
    const NAME: &'static str = "/SessionStore/v1.0/QueryValue";
    type Request = QueryValueRequest;
    type Response = QueryValueResponse;
}

// =============================================================================
// EnumValues
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValuesRequest {
    pub handle: ContextHandle,
    pub index: u32,
    pub level: u32,
}

impl NdrEncode for EnumValuesRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        w.write_u32(self.index);
        w.write_u32(self.level);
        Ok(())
    }
}

impl NdrDecode for EnumValuesRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.index = r.read_u32()?;
        self.level = r.read_u32()?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        28
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueInfoBasic {
    pub name: LpWStr,
    pub kind: ValueKind,
}

impl NdrEncode for ValueInfoBasic {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.name.ndr_encode(w)?;
        self.kind.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ValueInfoBasic {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.name.ndr_decode(r)?;
        self.kind = ValueKind::try_from(r.read_enum()?)?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        6
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueInfoFull {
    pub name: LpWStr,
    pub kind: ValueKind,
    pub data: UniquePtr<ValueData>,
}

impl NdrEncode for ValueInfoFull {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.name.ndr_encode(w)?;
        self.kind.ndr_encode(w)?;
        self.data.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ValueInfoFull {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.name.ndr_decode(r)?;
        self.kind = ValueKind::try_from(r.read_enum()?)?;
        self.data.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// Per-value information, selected by enumeration level
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInfo {
    Basic(ValueInfoBasic),
    Full(ValueInfoFull),
}

impl ValueInfo {
    pub fn name(&self) -> &str {
        match self {
            ValueInfo::Basic(info) => info.name.as_str(),
            ValueInfo::Full(info) => info.name.as_str(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ValueInfo::Basic(info) => info.kind,
            ValueInfo::Full(info) => info.kind,
        }
    }
}

impl Default for ValueInfo {
    fn default() -> Self {
        ValueInfo::Basic(ValueInfoBasic::default())
    }
}

impl NdrUnion for ValueInfo {
    const ARM_ALIGN: usize = 4;

    fn selector(&self) -> u32 {
        match self {
            ValueInfo::Basic(_) => INFO_LEVEL_BASIC,
            ValueInfo::Full(_) => INFO_LEVEL_FULL,
        }
    }

    fn encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        match self {
            ValueInfo::Basic(info) => info.ndr_encode(w),
            ValueInfo::Full(info) => info.ndr_encode(w),
        }
    }

    fn select(&mut self, selector: u32) -> Result<()> {
        *self = match selector {
            INFO_LEVEL_BASIC => ValueInfo::Basic(ValueInfoBasic::default()),
            INFO_LEVEL_FULL => ValueInfo::Full(ValueInfoFull::default()),
            other => return unknown_selector(other),
        };
        Ok(())
    }

    fn decode_arm<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        match self {
            ValueInfo::Basic(info) => info.ndr_decode(r),
            ValueInfo::Full(info) => info.ndr_decode(r),
        }
    }
}

impl NdrEncode for ValueInfo {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        write_union(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ValueInfo {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        read_union(self, r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        4 + ValueInfoBasic::ndr_min_size()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValuesResponse {
    pub info: ValueInfo,
    pub status: Status,
}

impl NdrEncode for EnumValuesResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.info.ndr_encode(w)?;
        w.write_deferred()?;
        self.status.ndr_encode(w)
    }
}

impl NdrDecode for EnumValuesResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.info.ndr_decode(r)?;
        r.read_deferred()?;
        self.status.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        14
    }
}

impl Outcome for EnumValuesResponse {
    fn status(&self) -> Status {
        self.status
    }
}

pub struct EnumValues;

impl Operation for EnumValues {
    const OPNUM: u16 = opnum::ENUM_VALUES;
    const NAME: &'static str = "/SessionStore/v1.0/EnumValues";
    type Request = EnumValuesRequest;
    type Response = EnumValuesResponse;
}

// =============================================================================
// DeleteValue
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteValueRequest {
    pub handle: ContextHandle,
    pub name: Name,
}

impl NdrEncode for DeleteValueRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        self.name.ndr_encode(w)
    }
}

impl NdrDecode for DeleteValueRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.name.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        32
    }
}

pub struct DeleteValue;

impl Operation for DeleteValue {
    const OPNUM: u16 = opnum::DELETE_VALUE;
    const NAME: &'static str = "/SessionStore/v1.0/DeleteValue";
    type Request = DeleteValueRequest;
    type Response = Status;
}

// =============================================================================
// CloseStore / FlushStore
// =============================================================================

/// Request carrying nothing but the store handle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleRequest {
    pub handle: ContextHandle,
}

impl NdrEncode for HandleRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)
    }
}

impl NdrDecode for HandleRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        20
    }
}

/// The handle comes back nil once the store is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseStoreResponse {
    pub handle: ContextHandle,
    pub status: Status,
}

impl NdrEncode for CloseStoreResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.handle.ndr_encode(w)?;
        self.status.ndr_encode(w)
    }
}

impl NdrDecode for CloseStoreResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.handle.ndr_decode(r)?;
        self.status.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        24
    }
}

impl Outcome for CloseStoreResponse {
    fn status(&self) -> Status {
        self.status
    }
}

pub struct CloseStore;

impl Operation for CloseStore {
    const OPNUM: u16 = opnum::CLOSE_STORE;
    const NAME: &'static str = "/SessionStore/v1.0/CloseStore";
    type Request = HandleRequest;
    type Response = CloseStoreResponse;
}

/// Reserved; the server answers with an opnum-range fault
pub struct FlushStore;

impl Operation for FlushStore {
    const OPNUM: u16 = opnum::FLUSH_STORE;
    const NAME: &'static str = "/SessionStore/v1.0/FlushStore";
    type Request = HandleRequest;
    type Response = Status;
}
