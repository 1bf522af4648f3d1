//! Client for the slip verification service.
//!
//! The service reads the QR payload printed on a bank transfer slip and
//! answers with the transferred amount and the bank's transaction reference.
//! Only what it answers is trusted; nothing the customer submits besides the
//! payload reaches the core.

use std::time::Duration;

use fooddash_marketplace_service::payments::VerifiedSlip;
use serde::{Deserialize, Serialize};

use crate::config::SlipVerifierConfig;
use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    data: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlipData {
    amount: i64,
    trans_ref: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    data: Option<SlipData>,
    message: Option<String>,
}

impl VerifyResponse {
    fn into_slip(self) -> Result<VerifiedSlip, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) if !data.trans_ref.is_empty() => Ok(VerifiedSlip {
                amount: data.amount,
                trans_ref: data.trans_ref,
            }),
            _ => Err(ApiError::BadRequest(
                self.message
                    .unwrap_or_else(|| "slip could not be verified".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlipVerifier {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl SlipVerifier {
    pub fn new(config: &SlipVerifierConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn verify(&self, payload: &str) -> Result<VerifiedSlip, ApiError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-authorization", &self.api_key)
            .json(&VerifyRequest { data: payload })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("slip verifier unreachable: {e}");
                ApiError::ServiceUnavailable("slip verification unavailable".to_string())
            })?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!(%status, "slip verifier failed");
            return Err(ApiError::ServiceUnavailable(
                "slip verification unavailable".to_string(),
            ));
        }

        // Rejections come back as 4xx with the same body shape.
        let body = response.json::<VerifyResponse>().await.map_err(|e| {
            tracing::warn!("unreadable slip verifier response: {e}");
            ApiError::ServiceUnavailable("slip verification unavailable".to_string())
        })?;
        body.into_slip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<VerifiedSlip, ApiError> {
        serde_json::from_str::<VerifyResponse>(body).unwrap().into_slip()
    }

    #[test]
    fn accepted_slip_carries_amount_and_reference() {
        let slip = parse(r#"{"success":true,"data":{"amount":260,"transRef":"0141ABC"}}"#).unwrap();
        assert_eq!(
            slip,
            VerifiedSlip {
                amount: 260,
                trans_ref: "0141ABC".to_string(),
            }
        );
    }

    #[test]
    fn rejection_message_is_passed_on() {
        let err = parse(r#"{"success":false,"message":"duplicate slip"}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "duplicate slip"));
    }

    #[test]
    fn success_without_reference_is_rejected() {
        let err = parse(r#"{"success":true,"data":{"amount":260,"transRef":""}}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
