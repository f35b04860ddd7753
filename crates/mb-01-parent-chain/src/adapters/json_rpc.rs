//! JSON-RPC client for a CryptoNote-style parent chain daemon.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{ChainInfo, Hash, ParentBlockRef, ParentHeader};
use tracing::debug;

use crate::config::ParentChainConfig;
use crate::error::{ParentChainError, ParentChainResult};
use crate::ports::ParentChainClient;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireChainInfo {
    height: Option<u64>,
    difficulty: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireBlock {
    hash: Option<String>,
    height: Option<u64>,
    timestamp: Option<u64>,
    major_version: Option<u8>,
    minor_version: Option<u8>,
    prev_hash: Option<String>,
    nonce: Option<u32>,
    primary_target: Option<u64>,
    auxiliary_target: Option<u64>,
    aux_block_hash: Option<String>,
    external_commitment: Option<String>,
}

/// Parent chain client speaking JSON-RPC 2.0 over HTTP.
pub struct JsonRpcParentChainClient {
    client: Client,
    url: String,
    timeout_ms: u64,
    default_primary_target: u64,
    default_auxiliary_target: Option<u64>,
    request_id: AtomicU64,
}

impl JsonRpcParentChainClient {
    /// Create a client from configuration.
    pub fn new(config: &ParentChainConfig) -> ParentChainResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| ParentChainError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            timeout_ms: config.request_timeout_ms,
            default_primary_target: config.default_primary_target,
            default_auxiliary_target: config.default_auxiliary_target,
            request_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> ParentChainResult<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        debug!("[mb-01] RPC {} -> {}", method, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ParentChainError::Timeout(self.timeout_ms)
                } else {
                    ParentChainError::Transport(e.to_string())
                }
            })?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ParentChainError::MalformedResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ParentChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| ParentChainError::MalformedResponse("missing result".to_string()))
    }

    fn parse_block(&self, requested: u64, value: Value) -> ParentChainResult<ParentBlockRef> {
        // Some daemons nest the header one level down.
        let value = match value.get("block_header") {
            Some(inner) => inner.clone(),
            None => value,
        };
        let wire: WireBlock = serde_json::from_value(value)
            .map_err(|e| ParentChainError::MalformedResponse(e.to_string()))?;

        let height = require(wire.height, "height")?;
        if height != requested {
            return Err(ParentChainError::MalformedResponse(format!(
                "asked for height {requested}, got {height}"
            )));
        }

        let auxiliary_difficulty = wire.auxiliary_target.or(self.default_auxiliary_target);

        Ok(ParentBlockRef {
            hash: parse_hash(&require(wire.hash, "hash")?, "hash")?,
            height,
            timestamp: require(wire.timestamp, "timestamp")?,
            primary_difficulty: wire.primary_target.unwrap_or(self.default_primary_target),
            auxiliary_difficulty,
            header: ParentHeader {
                major_version: require(wire.major_version, "major_version")?,
                minor_version: require(wire.minor_version, "minor_version")?,
                previous_hash: parse_hash(&require(wire.prev_hash, "prev_hash")?, "prev_hash")?,
                nonce: require(wire.nonce, "nonce")?,
                aux_block_hash: wire
                    .aux_block_hash
                    .map(|h| parse_hash(&h, "aux_block_hash"))
                    .transpose()?,
                external_commitment: wire
                    .external_commitment
                    .map(|h| parse_hash(&h, "external_commitment"))
                    .transpose()?,
            },
        })
    }
}

fn require<T>(field: Option<T>, name: &str) -> ParentChainResult<T> {
    field.ok_or_else(|| ParentChainError::MalformedResponse(format!("missing field `{name}`")))
}

fn parse_hash(value: &str, name: &str) -> ParentChainResult<Hash> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| ParentChainError::MalformedResponse(format!("`{name}` is not hex: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        ParentChainError::MalformedResponse(format!("`{name}` has {} bytes, expected 32", b.len()))
    })
}

#[async_trait]
impl ParentChainClient for JsonRpcParentChainClient {
    async fn get_chain_info(&self) -> ParentChainResult<ChainInfo> {
        let value = self.call("getinfo", Value::Array(vec![])).await?;
        let wire: WireChainInfo = serde_json::from_value(value)
            .map_err(|e| ParentChainError::MalformedResponse(e.to_string()))?;
        Ok(ChainInfo {
            height: require(wire.height, "height")?,
            difficulty: require(wire.difficulty, "difficulty")?,
        })
    }

    async fn get_block(&self, height: u64) -> ParentChainResult<ParentBlockRef> {
        let value = self.call("getblock", serde_json::json!([height])).await?;
        if value.is_null() {
            return Err(ParentChainError::BlockNotFound(height));
        }
        self.parse_block(height, value)
    }
}
