//! Operation envelopes
//!
//! An `Operation` ties an opnum to the request and response shapes of one
//! remote procedure. Both shapes travel as a single NDR stream; the response
//! carries the outcome code the application returned.

use std::error::Error;
use std::fmt;

use midl_ndr::{NdrDecode, NdrEncode};

use crate::status::Status;

/// A response shape that carries an outcome code
pub trait Outcome {
    fn status(&self) -> Status;
}

impl Outcome for Status {
    fn status(&self) -> Status {
        *self
    }
}

/// One remote procedure within an interface version
///
/// ```
/// use dcerpc::{Operation, Status};
/// use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};
///
/// #[derive(Debug, Default)]
/// struct Ping;
///
/// impl NdrEncode for Ping {
///     fn ndr_encode<'a>(&'a self, _w: &mut NdrWriter<'a>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// impl NdrDecode for Ping {
///     fn ndr_decode<'a>(&'a mut self, _r: &mut NdrReader<'a>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// struct PingOp;
///
/// impl Operation for PingOp {
///     const OPNUM: u16 = 0;
///     const NAME: &'static str = "/Echo/v1.0/Ping";
///     type Request = Ping;
///     type Response = Status;
/// }
/// ```
pub trait Operation: Send + Sync + 'static {
    const OPNUM: u16;
    /// `/Interface/vMajor.Minor/OperationName`
    const NAME: &'static str;
    type Request: NdrEncode + NdrDecode + Send + Sync + 'static;
    type Response: NdrEncode + NdrDecode + Outcome + Send + Sync + 'static;
}

/// Decoded response together with its outcome code
///
/// A nonzero status does not make the response meaningless: operations
/// document which fields are valid on which failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<R> {
    /// Operation name, empty when the reply was built without one
    pub operation: &'static str,
    pub status: Status,
    pub response: R,
}

impl<R: Outcome> Reply<R> {
    pub fn new(response: R) -> Self {
        Self::named("", response)
    }

    /// Reply whose `into_result` errors name `operation`
    pub fn named(operation: &'static str, response: R) -> Self {
        Self {
            operation,
            status: response.status(),
            response,
        }
    }
}

impl<R> Reply<R> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Split into the response on success, or an `ApplicationError` that
    /// still carries the response.
    pub fn into_result_for(self, operation: &'static str) -> Result<R, ApplicationError<R>> {
        if self.status.is_success() {
            Ok(self.response)
        } else {
            Err(ApplicationError {
                operation,
                status: self.status,
                response: self.response,
            })
        }
    }

    pub fn into_result(self) -> Result<R, ApplicationError<R>> {
        let operation = self.operation;
        self.into_result_for(operation)
    }
}

/// Nonzero outcome code returned by a successfully decoded response
pub struct ApplicationError<R> {
    pub operation: &'static str,
    pub status: Status,
    pub response: R,
}

impl<R> fmt::Debug for ApplicationError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationError")
            .field("operation", &self.operation)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl<R> fmt::Display for ApplicationError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operation.is_empty() {
            write!(f, "status {}", self.status)
        } else {
            write!(f, "{}: status {}", self.operation, self.status)
        }
    }
}

impl<R> Error for ApplicationError<R> {}
