//! # Name Registry
//!
//! A small TCP service mapping published names to socket endpoints.
//! Consumers bind a name when they start listening; producers look the
//! name up to find where to connect. Names bind once — rebinding an
//! already-bound name is refused, so two consumers cannot silently shadow
//! each other.
//!
//! Locators use the form `//host:port/name`, where the authority is the
//! registry itself.

use crate::wire::{RegistryRequest, RegistryResponse, read_frame, read_preamble, write_frame, write_preamble};
use graphwire_core::GraphwireError;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

// =============================================================================
// LOCATORS
// =============================================================================

/// Split a `//host:port/name` locator into registry authority and name.
pub fn parse_locator(locator: &str) -> Result<(String, String), GraphwireError> {
    let rest = locator.strip_prefix("//").ok_or_else(|| {
        GraphwireError::RemoteDelivery(format!("locator must start with '//': {locator}"))
    })?;
    let (authority, name) = rest.split_once('/').ok_or_else(|| {
        GraphwireError::RemoteDelivery(format!("locator missing '/name' part: {locator}"))
    })?;
    if authority.is_empty() || name.is_empty() {
        return Err(GraphwireError::RemoteDelivery(format!(
            "locator has empty authority or name: {locator}"
        )));
    }
    Ok((authority.to_string(), name.to_string()))
}

// =============================================================================
// REGISTRY SERVICE
// =============================================================================

/// The registry's binding table plus its accept loop.
#[derive(Debug, Default)]
pub struct Registry {
    bindings: Arc<Mutex<BTreeMap<String, SocketAddr>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names currently bound.
    pub async fn len(&self) -> usize {
        self.bindings.lock().await.len()
    }

    /// Whether no names are bound.
    pub async fn is_empty(&self) -> bool {
        self.bindings.lock().await.is_empty()
    }

    /// Serve registry requests on an already-bound listener. Runs until
    /// the listener fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GraphwireError> {
        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| GraphwireError::Io(e.to_string()))?;
            tracing::debug!(%peer, "registry connection accepted");

            let bindings = Arc::clone(&self.bindings);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(bindings, stream).await {
                    tracing::warn!(%peer, error = %err, "registry connection failed");
                }
            });
        }
    }

    /// Bind a name directly, without going over the wire. Used when the
    /// registry runs in the same process as a consumer.
    pub async fn bind_local(&self, name: &str, endpoint: SocketAddr) -> Result<(), GraphwireError> {
        bind_entry(&self.bindings, name, endpoint).await
    }
}

async fn bind_entry(
    bindings: &Mutex<BTreeMap<String, SocketAddr>>,
    name: &str,
    endpoint: SocketAddr,
) -> Result<(), GraphwireError> {
    let mut table = bindings.lock().await;
    if table.contains_key(name) {
        return Err(GraphwireError::NameAlreadyBound(name.to_string()));
    }
    table.insert(name.to_string(), endpoint);
    tracing::info!(name, %endpoint, "name bound");
    Ok(())
}

async fn handle_connection(
    bindings: Arc<Mutex<BTreeMap<String, SocketAddr>>>,
    mut stream: TcpStream,
) -> Result<(), GraphwireError> {
    read_preamble(&mut stream).await?;

    while let Some(request) = read_frame::<_, RegistryRequest>(&mut stream).await? {
        let response = match request {
            RegistryRequest::Bind { name, endpoint } => {
                match bind_entry(&bindings, &name, endpoint).await {
                    Ok(()) => RegistryResponse::Bound,
                    Err(err) => RegistryResponse::Error(err.to_string()),
                }
            }
            RegistryRequest::Lookup { name } => match bindings.lock().await.get(&name) {
                Some(endpoint) => RegistryResponse::Endpoint(*endpoint),
                None => RegistryResponse::Error(format!("name not bound: {name}")),
            },
        };
        write_frame(&mut stream, &response).await?;
    }
    Ok(())
}

// =============================================================================
// CLIENT HELPERS
// =============================================================================

async fn request(
    registry: SocketAddr,
    req: &RegistryRequest,
) -> Result<RegistryResponse, GraphwireError> {
    let mut stream = TcpStream::connect(registry)
        .await
        .map_err(|e| GraphwireError::Io(e.to_string()))?;
    write_preamble(&mut stream).await?;
    write_frame(&mut stream, req).await?;
    read_frame::<_, RegistryResponse>(&mut stream)
        .await?
        .ok_or_else(|| GraphwireError::RemoteDelivery("registry closed mid-request".to_string()))
}

/// Publish `name` as reachable at `endpoint`.
pub async fn bind_name(
    registry: SocketAddr,
    name: &str,
    endpoint: SocketAddr,
) -> Result<(), GraphwireError> {
    match request(
        registry,
        &RegistryRequest::Bind {
            name: name.to_string(),
            endpoint,
        },
    )
    .await?
    {
        RegistryResponse::Bound => Ok(()),
        RegistryResponse::Error(msg) => Err(GraphwireError::NameAlreadyBound(msg)),
        RegistryResponse::Endpoint(_) => Err(GraphwireError::RemoteDelivery(
            "unexpected registry response to bind".to_string(),
        )),
    }
}

/// Resolve `name` to the endpoint its consumer listens on.
pub async fn lookup_name(registry: SocketAddr, name: &str) -> Result<SocketAddr, GraphwireError> {
    match request(
        registry,
        &RegistryRequest::Lookup {
            name: name.to_string(),
        },
    )
    .await?
    {
        RegistryResponse::Endpoint(endpoint) => Ok(endpoint),
        RegistryResponse::Error(msg) => Err(GraphwireError::RemoteDelivery(msg)),
        RegistryResponse::Bound => Err(GraphwireError::RemoteDelivery(
            "unexpected registry response to lookup".to_string(),
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
