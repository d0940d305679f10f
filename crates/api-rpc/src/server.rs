//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server through which the surrounding service
//! reaches the in-process distribution core.

use crate::handler::RpcHandler;
use crate::types::{
    AssignTicketRequest, CompanyRequest, ContactChannelRequest, RebalanceRequest, TicketRequest,
    TransferRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use tracing::info;

// ADR-020: RPC Server Configuration
// Binds to localhost only; the transfer cache must stay process-local
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9640;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: RpcHandler,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self { config, handler }
    }

    /// Build the method table
    pub fn into_module(self) -> Result<RpcModule<RpcHandler>, String> {
        let mut module = RpcModule::new(self.handler);
        register_methods(&mut module)?;
        Ok(module)
    }

    /// Start the JSON-RPC server, returning its handle and bound address
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.into_module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started successfully");
        Ok((handle, local_addr))
    }
}

fn register_methods(module: &mut RpcModule<RpcHandler>) -> Result<(), String> {
    // Ticket flow
    module.register_async_method("ticket.checkOpen.v1", |params, handler, _| async move {
        let req: ContactChannelRequest = params.parse()?;
        handler.check_open(req).await
    })
    .map_err(|e| e.to_string())?;

    module.register_async_method("ticket.route.v1", |params, handler, _| async move {
        let req: ContactChannelRequest = params.parse()?;
        handler.route(req).await
    })
    .map_err(|e| e.to_string())?;

    module.register_async_method("ticket.assign.v1", |params, handler, _| async move {
        let req: AssignTicketRequest = params.parse()?;
        handler.assign(req).await
    })
    .map_err(|e| e.to_string())?;

    module.register_async_method("ticket.transfer.v1", |params, handler, _| async move {
        let req: TransferRequest = params.parse()?;
        handler.transfer(req).await
    })
    .map_err(|e| e.to_string())?;

    // Queue selection
    module.register_async_method("queue.select.v1", |params, handler, _| async move {
        let req: CompanyRequest = params.parse()?;
        handler.select_queue(req).await
    })
    .map_err(|e| e.to_string())?;

    module.register_async_method("queue.loads.v1", |params, handler, _| async move {
        let req: CompanyRequest = params.parse()?;
        handler.queue_loads(req).await
    })
    .map_err(|e| e.to_string())?;

    // Transfer protection
    module.register_method("protection.mark.v1", |params, handler, _| {
        let req: TransferRequest = params.parse()?;
        handler.mark_protection(req)
    })
    .map_err(|e| e.to_string())?;

    module.register_method("protection.check.v1", |params, handler, _| {
        let req: TicketRequest = params.parse()?;
        handler.check_protection(req)
    })
    .map_err(|e| e.to_string())?;

    module.register_method("protection.remove.v1", |params, handler, _| {
        let req: TicketRequest = params.parse()?;
        handler.remove_protection(req)
    })
    .map_err(|e| e.to_string())?;

    module.register_method("protection.sweep.v1", |_, handler, _| {
        Ok::<_, ErrorObjectOwned>(handler.sweep())
    })
    .map_err(|e| e.to_string())?;

    module.register_method("protection.stats.v1", |_, handler, _| {
        Ok::<_, ErrorObjectOwned>(handler.protection_stats())
    })
    .map_err(|e| e.to_string())?;

    // Admin
    module.register_async_method("admin.rebalance.v1", |params, handler, _| async move {
        let req: Option<RebalanceRequest> = params.parse()?;
        handler.rebalance(req).await
    })
    .map_err(|e| e.to_string())?;

    Ok(())
}
