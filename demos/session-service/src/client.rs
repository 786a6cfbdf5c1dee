//! Session store client
//!
//! Thin typed wrapper over `RpcClient`. Outcome codes come back in the
//! `Reply`; only transport failures and faults are errors.

use dcerpc::{ContextHandle, Reply, Result, RpcClient, Status, Transport};
use tracing::debug;

use crate::common::{store_syntax, INFO_LEVEL_FULL};
use crate::schema::{
    CloseStore, CloseStoreResponse, DeleteValue, DeleteValueRequest, EnumValues,
    EnumValuesRequest, EnumValuesResponse, HandleRequest, Name, OpenStore, OpenStoreRequest,
    OpenStoreResponse, QueryValue, QueryValueRequest, QueryValueResponse, SetValue,
    SetValueRequest, ValueData, ValueInfo, ValueKind,
};

pub struct SessionClient<T> {
    rpc: RpcClient<T>,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            rpc: RpcClient::new(transport, store_syntax()),
        }
    }

    pub fn from_rpc(rpc: RpcClient<T>) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient<T> {
        &self.rpc
    }

    pub async fn open_store(&self, name: &str, access: u32) -> Result<Reply<OpenStoreResponse>> {
        let request = OpenStoreRequest {
            store_name: Name::bounded(name),
            desired_access: access,
        };
        self.rpc.invoke::<OpenStore>(&request).await
    }

    pub async fn set_value(
        &self,
        handle: ContextHandle,
        name: &str,
        kind: ValueKind,
        data: Vec<u8>,
    ) -> Result<Reply<Status>> {
        let request = SetValueRequest {
            handle,
            name: Name::bounded(name),
            kind,
            data: ValueData::bounded(data),
        };
        self.rpc.invoke::<SetValue>(&request).await
    }

    pub async fn query_value(
        &self,
        handle: ContextHandle,
        name: &str,
        buffer_size: u32,
    ) -> Result<Reply<QueryValueResponse>> {
        let request = QueryValueRequest {
            handle,
            name: Name::bounded(name),
            buffer_size,
        };
        self.rpc.invoke::<QueryValue>(&request).await
    }

    /// Query with an initial buffer, retrying once with the size the server
    /// asks for.
    pub async fn read_value(
        &self,
        handle: ContextHandle,
        name: &str,
        initial_size: u32,
    ) -> Result<Reply<QueryValueResponse>> {
        let reply = self.query_value(handle, name, initial_size).await?;
        if reply.status != Status::ERROR_INSUFFICIENT_BUFFER {
            return Ok(reply);
        }
        debug!(name, needed = reply.response.needed, "retrying with larger buffer");
        self.query_value(handle, name, reply.response.needed).await
    }

    pub async fn enum_value(
        &self,
        handle: ContextHandle,
        index: u32,
        level: u32,
    ) -> Result<Reply<EnumValuesResponse>> {
        let request = EnumValuesRequest {
            handle,
            index,
            level,
        };
        self.rpc.invoke::<EnumValues>(&request).await
    }

    /// Walk the store until `ERROR_NO_MORE_ITEMS`. Any other failure ends
    /// the walk and is returned with the entries read so far.
    pub async fn enum_all(&self, handle: ContextHandle) -> Result<(Vec<ValueInfo>, Status)> {
        let mut entries = Vec::new();
        for index in 0.. {
            let reply = self.enum_value(handle, index, INFO_LEVEL_FULL).await?;
            match reply.status {
                Status::SUCCESS => entries.push(reply.response.info),
                Status::ERROR_NO_MORE_ITEMS => break,
                status => return Ok((entries, status)),
            }
        }
        Ok((entries, Status::SUCCESS))
    }

    pub async fn delete_value(&self, handle: ContextHandle, name: &str) -> Result<Reply<Status>> {
        let request = DeleteValueRequest {
            handle,
            name: Name::bounded(name),
        };
        self.rpc.invoke::<DeleteValue>(&request).await
    }

    pub async fn close_store(&self, handle: ContextHandle) -> Result<Reply<CloseStoreResponse>> {
        self.rpc.invoke::<CloseStore>(&HandleRequest { handle }).await
    }
}
