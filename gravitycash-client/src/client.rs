use gravitycash_api::types::{
    MerchantValidationRequest, PaymentAuthorizationRequest, PaymentResult, ProcessWithdrawalArgs,
    RemoteError, WithdrawalReceipt, WithdrawalSubmission,
};
use log::*;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Requesting server error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("JSON encoding/decoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Server responded with {status}: {}", .error.message)]
    Remote { status: u16, error: RemoteError },
}

/// Alias for a `Result` with the error type `self::Error`.
pub type Result<T> = std::result::Result<T, Error>;

pub const PROCESS_WITHDRAWAL_PATH: &str = "/rest/v1/rpc/process_withdrawal";
pub const VALIDATE_MERCHANT_PATH: &str = "/validate-merchant";
pub const PROCESS_PAYMENT_PATH: &str = "/process-payment";

#[derive(Clone)]
pub struct GravityClient {
    pub client: reqwest::Client,
    pub server: String,
    /// Anonymous key of the backend, sent both as `apikey` and bearer token
    pub api_key: Option<String>,
}

impl GravityClient {
    pub fn new(url: &str, api_key: Option<&str>) -> Self {
        GravityClient {
            client: reqwest::Client::new(),
            server: url.trim_end_matches('/').to_owned(),
            api_key: api_key.map(|k| k.to_owned()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    /// Call the `process_withdrawal` procedure of the backend
    pub async fn process_withdrawal(
        &self,
        submission: &WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt> {
        let args = ProcessWithdrawalArgs::from(submission);
        let payload: Value = self.post_json(PROCESS_WITHDRAWAL_PATH, &args).await?;
        Ok(WithdrawalReceipt::from_payload(payload))
    }

    /// Exchange the wallet validation URL for an opaque merchant session
    pub async fn validate_merchant(&self, req: &MerchantValidationRequest) -> Result<Value> {
        self.post_json(VALIDATE_MERCHANT_PATH, req).await
    }

    pub async fn process_payment(&self, req: &PaymentAuthorizationRequest) -> Result<PaymentResult> {
        self.post_json(PROCESS_PAYMENT_PATH, req).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }
        let request = builder.build()?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Response {path}: {status} {text}");
        if !status.is_success() {
            return Err(remote_error(status, &text));
        }
        if text.trim().is_empty() {
            Ok(serde_json::from_value(Value::Null)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

/// Interpret a failed response body, falling back to the bare status when the
/// body is not a structured error.
fn remote_error(status: StatusCode, body: &str) -> Error {
    let error = serde_json::from_str::<RemoteError>(body).unwrap_or_else(|_| RemoteError {
        message: if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        } else {
            body.trim().to_owned()
        },
        code: None,
        details: None,
        hint: None,
    });
    Error::Remote {
        status: status.as_u16(),
        error,
    }
}
