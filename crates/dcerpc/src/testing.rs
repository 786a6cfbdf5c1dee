//! Small calculator interface shared by the unit tests

use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

use crate::dispatcher::{Interface, InterfaceBuilder};
use crate::error::RpcError;
use crate::operation::{Operation, Outcome};
use crate::status::Status;
use crate::syntax::SyntaxId;

pub const CALC_UUID: &str = "6bffd098-a112-3610-9833-46c3f87e345a";

pub fn calc_syntax() -> SyntaxId {
    SyntaxId::parse(CALC_UUID, 1, 1).unwrap()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AddRequest {
    pub a: u32,
    pub b: u32,
}

impl NdrEncode for AddRequest {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        w.write_u32(self.a);
        w.write_u32(self.b);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for AddRequest {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.a = r.read_u32()?;
        self.b = r.read_u32()?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AddResponse {
    pub sum: u32,
    pub status: Status,
}

impl AddResponse {
    pub fn ok(sum: u32) -> Self {
        Self {
            sum,
            status: Status::SUCCESS,
        }
    }
}

impl Outcome for AddResponse {
    fn status(&self) -> Status {
        self.status
    }
}

impl NdrEncode for AddResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        w.write_u32(self.sum);
        w.write_u32(self.status.0);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for AddResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.sum = r.read_u32()?;
        self.status = Status(r.read_u32()?);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

pub struct AddOp;

impl Operation for AddOp {
    const OPNUM: u16 = 1;
    const NAME: &'static str = "/Calc/v1.1/Add";
    type Request = AddRequest;
    type Response = AddResponse;
}

pub struct DivideOp;

impl Operation for DivideOp {
    const OPNUM: u16 = 2;
    const NAME: &'static str = "/Calc/v1.1/Divide";
    type Request = AddRequest;
    type Response = AddResponse;
}

pub fn calc_interface() -> Interface {
    InterfaceBuilder::from_syntax(calc_syntax())
        .operation::<AddOp, _, _>(|req: AddRequest| async move {
            Ok(match req.a.checked_add(req.b) {
                Some(sum) => AddResponse::ok(sum),
                None => AddResponse {
                    sum: 0,
                    status: Status::ERROR_INVALID_PARAMETER,
                },
            })
        })
        .operation::<DivideOp, _, _>(|_req: AddRequest| async move {
            Err::<AddResponse, _>(RpcError::NotImplemented)
        })
        .build()
}
