use crate::error::{constants, ProtocolError, Result};
use crate::protocol::request::RmcRequest;
use crate::protocol::response::{error_codes, RmcResponse};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// What a method handler returns: response data, or an error code
pub type MethodResult = std::result::Result<Vec<u8>, u32>;

type HandlerFn = dyn Fn(&RmcRequest) -> MethodResult + Send + Sync + 'static;

/// Routes requests to handlers keyed by `(protocol id, method id)`.
///
/// Handlers hold the service logic; the dispatcher only builds the envelope.
/// Cloning shares the handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<(u8, u32), Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a handler, replacing any previous one for the same method
    pub fn register<F>(&self, protocol_id: u8, method_id: u32, handler: F) -> Result<()>
    where
        F: Fn(&RmcRequest) -> MethodResult + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::DispatchError(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        handlers.insert((protocol_id & 0x7F, method_id), Box::new(handler));
        Ok(())
    }

    /// Run the matching handler and wrap its outcome in a response.
    ///
    /// Unregistered methods get a `NOT_IMPLEMENTED` error response.
    pub fn dispatch(&self, request: &RmcRequest) -> Result<RmcResponse> {
        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::DispatchError(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        let Some(handler) = handlers.get(&(request.protocol_id, request.method_id)) else {
            warn!(
                protocol_id = request.protocol_id,
                method_id = request.method_id,
                call_id = request.call_id,
                "No handler registered for method"
            );
            return Ok(RmcResponse::error(
                request.protocol_id,
                error_codes::NOT_IMPLEMENTED,
                request.call_id,
            ));
        };

        let response = match handler(request) {
            Ok(data) => RmcResponse::success(
                request.protocol_id,
                request.call_id,
                request.method_id,
                data,
            ),
            Err(code) => RmcResponse::error(request.protocol_id, code, request.call_id),
        };

        debug!(
            protocol_id = request.protocol_id,
            method_id = request.method_id,
            call_id = request.call_id,
            success = response.is_success(),
            "Dispatched RMC request"
        );
        Ok(response)
    }

    pub fn is_registered(&self, protocol_id: u8, method_id: u32) -> Result<bool> {
        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::DispatchError(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        Ok(handlers.contains_key(&(protocol_id & 0x7F, method_id)))
    }
}
