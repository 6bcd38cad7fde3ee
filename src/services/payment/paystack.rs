use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use super::{GatewayError, PaymentGateway};
use crate::models::payment::BOOKING_REF_VARIABLE;
use crate::models::{ChargeRequest, ChargeSession, MetadataField, Verification};

pub struct PaystackGateway {
    secret_key: String,
    base_url: Url,
    client: reqwest::Client,
}

impl PaystackGateway {
    pub fn new(secret_key: String, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid Paystack base URL: {base_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "Paystack base URL cannot carry a path: {base_url}"
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Paystack HTTP client")?;

        Ok(Self {
            secret_key,
            base_url,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeSession, GatewayError> {
        let mut custom_fields = vec![MetadataField::booking_ref(&request.reference)];
        custom_fields.extend(
            request
                .metadata
                .iter()
                .filter(|f| f.variable_name != BOOKING_REF_VARIABLE)
                .cloned(),
        );

        let body = json!({
            "email": request.email,
            "amount": request.amount.subunits(),
            "reference": request.reference,
            "callback_url": request.callback_url,
            "metadata": { "custom_fields": custom_fields },
        });

        let resp = self
            .client
            .post(self.endpoint(&["transaction", "initialize"]))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let data = read_envelope(resp, "Failed to initialize payment").await?;

        let authorization_url = data["authorization_url"]
            .as_str()
            .ok_or_else(|| {
                GatewayError::UnexpectedResponse("missing authorization_url".to_string())
            })?
            .to_string();

        Ok(ChargeSession {
            authorization_url,
            access_code: data["access_code"].as_str().map(str::to_string),
            reference: data["reference"]
                .as_str()
                .unwrap_or(&request.reference)
                .to_string(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        let resp = self
            .client
            .get(self.endpoint(&["transaction", "verify", reference]))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;

        let data = read_envelope(resp, "Failed to verify payment").await?;

        let status = data["status"]
            .as_str()
            .ok_or_else(|| GatewayError::UnexpectedResponse("missing transaction status".to_string()))?
            .to_string();

        Ok(Verification {
            status,
            reference: data["reference"].as_str().unwrap_or(reference).to_string(),
            metadata: custom_fields(&data["metadata"]),
            raw: data,
        })
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    tracing::warn!(error = %e, "Paystack request failed");
    if e.is_timeout() {
        GatewayError::Unreachable("payment provider timed out".to_string())
    } else {
        GatewayError::Unreachable(format!("could not reach payment provider: {e}"))
    }
}

/// Paystack wraps every answer as `{ status, message, data }`.
async fn read_envelope(resp: reqwest::Response, fallback: &str) -> Result<Value, GatewayError> {
    let status = resp.status();
    let body: Value = match resp.json().await {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: fallback.to_string(),
            })
        }
        Err(e) => {
            return Err(GatewayError::UnexpectedResponse(format!(
                "unreadable Paystack response: {e}"
            )))
        }
    };

    if !status.is_success() || body["status"].as_bool() != Some(true) {
        let message = body["message"].as_str().unwrap_or(fallback).to_string();
        tracing::warn!(status = status.as_u16(), message = %message, "Paystack rejected request");
        return Err(GatewayError::Rejected {
            status: if status.is_success() { 400 } else { status.as_u16() },
            message,
        });
    }

    Ok(body["data"].clone())
}

/// Metadata comes back as an object, a JSON-encoded string, or nothing.
fn custom_fields(metadata: &Value) -> Vec<MetadataField> {
    let decoded;
    let metadata = match metadata {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).unwrap_or(Value::Null);
            &decoded
        }
        other => other,
    };

    metadata["custom_fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| serde_json::from_value(f.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
