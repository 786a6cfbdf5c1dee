//! Session store server
//!
//! Named stores hold typed values. Opening a store issues a context handle
//! that every later call presents; closing it (or dropping the server)
//! invalidates the handle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dcerpc::{ContextHandle, ContextHandleTable, Interface, InterfaceBuilder, RpcError, Status};
use midl_ndr::UniquePtr;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::common::{
    store_syntax, ACCESS_ALL, ACCESS_READ, ACCESS_WRITE, INFO_LEVEL_BASIC, INFO_LEVEL_FULL,
    MAX_VALUE_SIZE,
};
use crate::schema::{
    CloseStore, CloseStoreResponse, DeleteValue, DeleteValueRequest, EnumValues,
    EnumValuesRequest, EnumValuesResponse, FlushStore, HandleRequest, OpenStore,
    OpenStoreRequest, OpenStoreResponse, QueryValue, QueryValueRequest, QueryValueResponse,
    SetValue, SetValueRequest, ValueData, ValueInfo, ValueInfoBasic, ValueInfoFull, ValueKind,
};

#[derive(Debug, Clone)]
struct StoredValue {
    kind: ValueKind,
    data: Vec<u8>,
}

/// One named store; values enumerate in name order
#[derive(Debug, Default)]
struct Store {
    values: RwLock<BTreeMap<String, StoredValue>>,
}

/// What an open handle refers to
#[derive(Debug)]
pub struct Session {
    pub store_name: String,
    pub access: u32,
    store: Arc<Store>,
}

impl Session {
    fn allows(&self, access: u32) -> bool {
        self.access & access == access
    }
}

/// Server state behind the session store interface
#[derive(Default)]
pub struct SessionServer {
    stores: RwLock<HashMap<String, Arc<Store>>>,
    sessions: ContextHandleTable<Session>,
}

impl SessionServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of handles currently open
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Build the interface with handlers bound to this server
    pub fn interface(self: &Arc<Self>) -> Interface {
        let open = Arc::clone(self);
        let set = Arc::clone(self);
        let query = Arc::clone(self);
        let enumerate = Arc::clone(self);
        let delete = Arc::clone(self);
        let close = Arc::clone(self);

        InterfaceBuilder::from_syntax(store_syntax())
            .operation::<OpenStore, _, _>(move |req| std::future::ready(Ok(open.open_store(req))))
            .operation::<SetValue, _, _>(move |req| std::future::ready(Ok(set.set_value(req))))
            .operation::<QueryValue, _, _>(move |req| std::future::ready(Ok(query.query_value(req))))
            .operation::<EnumValues, _, _>(move |req| {
                std::future::ready(Ok(enumerate.enum_values(req)))
            })
            .operation::<DeleteValue, _, _>(move |req| {
                std::future::ready(Ok(delete.delete_value(req)))
            })
            .operation::<CloseStore, _, _>(move |req| std::future::ready(Ok(close.close_store(req))))
            .operation::<FlushStore, _, _>(|_req: HandleRequest| {
                std::future::ready(Err(RpcError::NotImplemented))
            })
            .build()
    }

    fn session(&self, handle: &ContextHandle) -> Option<Arc<Session>> {
        let session = self.sessions.get(handle);
        if session.is_none() {
            debug!(%handle, "unknown context handle");
        }
        session
    }

    pub fn open_store(&self, req: OpenStoreRequest) -> OpenStoreResponse {
        let name = req.store_name.into_string();
        if name.is_empty() || req.desired_access == 0 || req.desired_access & !ACCESS_ALL != 0 {
            return OpenStoreResponse {
                handle: ContextHandle::nil(),
                status: Status::ERROR_INVALID_PARAMETER,
            };
        }

        let store = Arc::clone(self.stores.write().entry(name.clone()).or_default());
        let handle = self.sessions.open(Session {
            store_name: name.clone(),
            access: req.desired_access,
            store,
        });
        info!(store = %name, %handle, "store opened");

        OpenStoreResponse {
            handle,
            status: Status::SUCCESS,
        }
    }

    pub fn set_value(&self, req: SetValueRequest) -> Status {
        let Some(session) = self.session(&req.handle) else {
            return Status::ERROR_INVALID_HANDLE;
        };
        if !session.allows(ACCESS_WRITE) {
            return Status::ERROR_ACCESS_DENIED;
        }
        let name = req.name.into_string();
        if name.is_empty() {
            return Status::ERROR_INVALID_PARAMETER;
        }

        session.store.values.write().insert(
            name,
            StoredValue {
                kind: req.kind,
                data: req.data.elements,
            },
        );
        Status::SUCCESS
    }

    pub fn query_value(&self, req: QueryValueRequest) -> QueryValueResponse {
        let Some(session) = self.session(&req.handle) else {
            return QueryValueResponse::failed(Status::ERROR_INVALID_HANDLE);
        };
        if !session.allows(ACCESS_READ) {
            return QueryValueResponse::failed(Status::ERROR_ACCESS_DENIED);
        }
        if req.buffer_size > MAX_VALUE_SIZE {
            return QueryValueResponse::failed(Status::ERROR_INVALID_PARAMETER);
        }

        let values = session.store.values.read();
        let Some(value) = values.get(req.name.as_str()) else {
            return QueryValueResponse::failed(Status::ERROR_NOT_FOUND);
        };

        let needed = value.data.len() as u32;
        if needed > req.buffer_size {
            return QueryValueResponse {
                kind: value.kind,
                needed,
                ..QueryValueResponse::failed(Status::ERROR_INSUFFICIENT_BUFFER)
            };
        }

        QueryValueResponse {
            kind: value.kind,
            data: UniquePtr::new(ValueData::with_size(req.buffer_size, value.data.clone())),
            needed,
            status: Status::SUCCESS,
        }
    }

    pub fn enum_values(&self, req: EnumValuesRequest) -> EnumValuesResponse {
        let failed = |status| EnumValuesResponse {
            info: ValueInfo::default(),
            status,
        };

        let Some(session) = self.session(&req.handle) else {
            return failed(Status::ERROR_INVALID_HANDLE);
        };
        if !session.allows(ACCESS_READ) {
            return failed(Status::ERROR_ACCESS_DENIED);
        }
        if req.level != INFO_LEVEL_BASIC && req.level != INFO_LEVEL_FULL {
            return failed(Status::ERROR_INVALID_PARAMETER);
        }

        let values = session.store.values.read();
        let Some((name, value)) = values.iter().nth(req.index as usize) else {
            return failed(Status::ERROR_NO_MORE_ITEMS);
        };

        let info = if req.level == INFO_LEVEL_BASIC {
            ValueInfo::Basic(ValueInfoBasic {
                name: name.as_str().into(),
                kind: value.kind,
            })
        } else {
            ValueInfo::Full(ValueInfoFull {
                name: name.as_str().into(),
                kind: value.kind,
                data: UniquePtr::new(ValueData::bounded(value.data.clone())),
            })
        };
        EnumValuesResponse {
            info,
            status: Status::SUCCESS,
        }
    }

    pub fn delete_value(&self, req: DeleteValueRequest) -> Status {
        let Some(session) = self.session(&req.handle) else {
            return Status::ERROR_INVALID_HANDLE;
        };
        if !session.allows(ACCESS_WRITE) {
            return Status::ERROR_ACCESS_DENIED;
        }
        let removed = session.store.values.write().remove(req.name.as_str());
        match removed {
            Some(_) => Status::SUCCESS,
            None => Status::ERROR_NOT_FOUND,
        }
    }

    pub fn close_store(&self, req: HandleRequest) -> CloseStoreResponse {
        match self.sessions.close(&req.handle) {
            Some(session) => {
                info!(store = %session.store_name, handle = %req.handle, "store closed");
                CloseStoreResponse {
                    handle: ContextHandle::nil(),
                    status: Status::SUCCESS,
                }
            }
            None => CloseStoreResponse {
                handle: req.handle,
                status: Status::ERROR_INVALID_HANDLE,
            },
        }
    }
}
