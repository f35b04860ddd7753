//! JSON-RPC sink adapters.
//!
//! The DA adapter speaks the `blob.Submit` / `blob.GetAll` methods of a
//! Celestia-style light node with base64 namespace and data. The settlement
//! adapter calls `settlement_submitBatch` on the settlement gateway.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_crypto::sha256;
use shared_types::hash_hex;
use tracing::debug;

use crate::config::SinkConfig;
use crate::domain::{DaReceipt, SettlementReceipt, SettlementRecord};
use crate::error::{SubmissionError, SubmissionResult};
use crate::ports::{DataAvailabilitySink, SettlementSink};

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

struct RpcTransport {
    client: Client,
    url: String,
    auth_token: Option<String>,
    timeout_ms: u64,
    request_id: AtomicU64,
}

impl RpcTransport {
    fn new(config: &SinkConfig) -> SubmissionResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            auth_token: config.auth_token.clone(),
            timeout_ms: config.timeout_ms,
            request_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> SubmissionResult<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };
        debug!("[mb-07] RPC {} -> {}", method, self.url);

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SubmissionError::Timeout(self.timeout_ms)
            } else {
                SubmissionError::Transport(e.to_string())
            }
        })?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(SubmissionError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        body.result
            .ok_or_else(|| SubmissionError::MalformedResponse("missing result".into()))
    }
}

fn namespace_b64(namespace: &str) -> SubmissionResult<String> {
    let bytes = hex::decode(namespace.trim_start_matches("0x"))
        .map_err(|e| SubmissionError::Encoding(format!("namespace: {e}")))?;
    Ok(BASE64.encode(bytes))
}

/// Data-availability sink over JSON-RPC.
pub struct JsonRpcDataAvailabilitySink {
    rpc: RpcTransport,
}

impl JsonRpcDataAvailabilitySink {
    /// Client for `config.rpc_url`.
    pub fn new(config: &SinkConfig) -> SubmissionResult<Self> {
        Ok(Self {
            rpc: RpcTransport::new(config)?,
        })
    }
}

#[async_trait]
impl DataAvailabilitySink for JsonRpcDataAvailabilitySink {
    async fn submit_blob(&self, namespace: &str, data: &[u8]) -> SubmissionResult<DaReceipt> {
        let blob = json!({
            "namespace": namespace_b64(namespace)?,
            "data": BASE64.encode(data),
            "share_version": 0,
        });
        let result = self.rpc.call("blob.Submit", json!([[blob], {}])).await?;
        let height = result
            .as_u64()
            .or_else(|| result.get("height").and_then(Value::as_u64))
            .ok_or_else(|| SubmissionError::MalformedResponse("blob.Submit height".into()))?;
        let commitment = result
            .get("commitment")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| hash_hex(&sha256(data)));
        Ok(DaReceipt { height, commitment })
    }

    async fn get_blob(&self, height: u64, namespace: &str) -> SubmissionResult<Vec<u8>> {
        let result = self
            .rpc
            .call("blob.GetAll", json!([height, [namespace_b64(namespace)?]]))
            .await?;
        let first = result
            .as_array()
            .and_then(|blobs| blobs.first())
            .ok_or(SubmissionError::BlobNotFound(height))?;
        let data = first
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| SubmissionError::MalformedResponse("blob data".into()))?;
        BASE64
            .decode(data)
            .map_err(|e| SubmissionError::MalformedResponse(format!("blob base64: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct WireSettlementReceipt {
    tx_hash: Option<String>,
    tx_id: Option<String>,
    height: Option<u64>,
}

/// Settlement sink over JSON-RPC.
pub struct JsonRpcSettlementSink {
    rpc: RpcTransport,
}

impl JsonRpcSettlementSink {
    /// Client for `config.rpc_url`.
    pub fn new(config: &SinkConfig) -> SubmissionResult<Self> {
        Ok(Self {
            rpc: RpcTransport::new(config)?,
        })
    }
}

#[async_trait]
impl SettlementSink for JsonRpcSettlementSink {
    async fn submit(&self, record: SettlementRecord) -> SubmissionResult<SettlementReceipt> {
        let params = serde_json::to_value(&record)
            .map_err(|e| SubmissionError::Encoding(e.to_string()))?;
        let result = self.rpc.call("settlement_submitBatch", json!([params])).await?;
        let wire: WireSettlementReceipt = serde_json::from_value(result)
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;
        let tx_id = wire
            .tx_id
            .or(wire.tx_hash)
            .ok_or_else(|| SubmissionError::MalformedResponse("missing tx id".into()))?;
        Ok(SettlementReceipt {
            tx_id,
            settled_height: wire.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_b64() {
        assert_eq!(namespace_b64("434f4c44").unwrap(), "Q09MRA==");
        assert_eq!(namespace_b64("0x434f4c44").unwrap(), "Q09MRA==");
        assert!(matches!(
            namespace_b64("zz"),
            Err(SubmissionError::Encoding(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let config = SinkConfig {
            rpc_url: "http://127.0.0.1:9".into(),
            timeout_ms: 500,
            ..SinkConfig::default()
        };
        let sink = JsonRpcSettlementSink::new(&config).unwrap();
        let proof = mb_06_merge_mining_proof::ProofBuilder::default().build_proof(
            &shared_types::ParentBlockRef {
                hash: [1u8; 32],
                height: 1,
                timestamp: 0,
                primary_difficulty: 1,
                auxiliary_difficulty: None,
                header: shared_types::ParentHeader {
                    major_version: 1,
                    minor_version: 0,
                    previous_hash: [0u8; 32],
                    nonce: 0,
                    aux_block_hash: None,
                    external_commitment: None,
                },
            },
            &[],
        );
        let err = sink
            .submit(SettlementRecord {
                state_root: [0u8; 32],
                block_count: 0,
                parent_proof: proof,
            })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
