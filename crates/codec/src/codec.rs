//! Decrypt → validate → (handler) → encrypt.
//!
//! All three operations are total: every failure, including a panic raised
//! by the cipher or serialisation layers, comes back as a failed
//! [`ApiResponse`] and never escapes to the caller.
//!
//! | Condition                               | statusCode |
//! |-----------------------------------------|------------|
//! | missing input data                      | 400        |
//! | cipher encrypt/decrypt failure          | 500        |
//! | decrypted text is not JSON              | 500        |
//! | payload does not bind to / validate as T| 400        |
//! | unexpected fault                        | 500        |

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use common::{ApiResponse, Envelope, ServiceError};
use futures::FutureExt;
use garde::{Report, Validate};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use crate::cipher::Cipher;

/// Message returned when there is nothing to decrypt or encrypt.
pub const NO_DATA_PROVIDED: &str = "No data provided";

/// Message returned when the cipher yields an empty ciphertext.
pub const ENCRYPTION_FAILED: &str = "Failed to encrypt data";

/// Decrypt an inbound envelope and validate it as `T`.
///
/// Stages run strictly in order and the first failure short-circuits:
/// decrypt (500), parse as JSON (500), bind to `T` (400), `garde` rules (400).
pub async fn decrypt_and_validate<T>(cipher: &dyn Cipher, envelope: &Envelope) -> ApiResponse<T>
where
    T: DeserializeOwned + Validate,
    T::Context: Default,
{
    guarded("decrypt_and_validate", async {
        let value = open_json(cipher, &envelope.body).await?;
        let data: T = serde_json::from_value(value)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        data.validate()
            .map_err(|report| ServiceError::Validation(describe(&report)))?;
        Ok(ApiResponse::ok(data))
    })
    .await
}

/// Encrypt the payload of `result` into an [`Envelope`].
///
/// The returned response keeps the original `success`, `status_code` and
/// `message`; only `data` is replaced. A missing `result` is a 400 and the
/// cipher is never invoked for it.
pub async fn encrypt<T>(cipher: &dyn Cipher, result: Option<ApiResponse<T>>) -> ApiResponse<Envelope>
where
    T: Serialize,
{
    guarded("encrypt", async move {
        let result = result.ok_or_else(|| ServiceError::BadRequest(NO_DATA_PROVIDED.into()))?;

        let plaintext = serde_json::to_string(&result.data)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let body = cipher
            .encrypt(&plaintext)
            .await
            .map_err(|e| ServiceError::EncryptionFailure(e.to_string()))?;
        if body.is_empty() {
            return Err(ServiceError::EncryptionFailure(ENCRYPTION_FAILED.into()));
        }

        Ok(result.with_data(Envelope { body }))
    })
    .await
}

/// Decrypt a ciphertext string into `T` without rule validation.
///
/// For callers that already trust the shape, e.g. internal service calls.
/// Any decrypt or parse failure is a 500.
pub async fn decrypt<T>(cipher: &dyn Cipher, ciphertext: &str) -> ApiResponse<T>
where
    T: DeserializeOwned,
{
    guarded("decrypt", async {
        let value = open_json(cipher, ciphertext).await?;
        let data: T = serde_json::from_value(value)
            .map_err(|e| ServiceError::MalformedPayload(e.to_string()))?;
        Ok(ApiResponse::ok(data))
    })
    .await
}

/// Decrypt `ciphertext` and parse the plaintext as JSON.
async fn open_json(cipher: &dyn Cipher, ciphertext: &str) -> Result<serde_json::Value, ServiceError> {
    if ciphertext.trim().is_empty() {
        return Err(ServiceError::BadRequest(NO_DATA_PROVIDED.into()));
    }
    let plaintext = cipher
        .decrypt(ciphertext)
        .await
        .map_err(|e| ServiceError::EncryptionFailure(e.to_string()))?;
    serde_json::from_str(&plaintext).map_err(|e| ServiceError::MalformedPayload(e.to_string()))
}

/// Flatten a `garde` report into `field: message` pairs.
fn describe(report: &Report) -> String {
    report
        .iter()
        .map(|(path, err)| {
            let path = path.to_string();
            if path.is_empty() {
                err.to_string()
            } else {
                format!("{path}: {err}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Run one codec stage, converting errors and panics into a failed response.
async fn guarded<T, F>(op: &'static str, stage: F) -> ApiResponse<T>
where
    F: Future<Output = Result<ApiResponse<T>, ServiceError>>,
{
    match AssertUnwindSafe(stage).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            warn!(op, status = err.http_status(), error = %err, "envelope stage failed");
            err.into()
        }
        Err(panic) => {
            let err = ServiceError::Internal(panic_message(panic.as_ref()));
            error!(op, error = %err, "envelope stage panicked");
            err.into()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes::{AesGcmSivCipher, KEY_LEN};
    use crate::cipher::{CipherError, MockCipher};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
    struct Transfer {
        #[garde(length(min = 1, max = 34))]
        account: String,
        #[garde(range(min = 1))]
        amount: u64,
    }

    fn aes() -> AesGcmSivCipher {
        AesGcmSivCipher::new(&[0x42u8; KEY_LEN]).unwrap()
    }

    async fn seal(cipher: &dyn Cipher, value: serde_json::Value) -> Envelope {
        Envelope::new(cipher.encrypt(&value.to_string()).await.unwrap())
    }

    #[tokio::test]
    async fn round_trip_is_identity_on_valid_payloads() {
        let cipher = aes();
        let transfer = Transfer {
            account: "DE89370400440532013000".into(),
            amount: 250,
        };
        let inbound = seal(&cipher, serde_json::to_value(&transfer).unwrap()).await;

        let validated = decrypt_and_validate::<Transfer>(&cipher, &inbound).await;
        assert!(validated.success);
        assert_eq!(validated.status_code, 200);
        assert!(validated.message.is_none());

        let outbound = encrypt(&cipher, Some(validated)).await;
        assert!(outbound.success);
        assert_eq!(outbound.status_code, 200);

        let body = outbound.data.unwrap().body;
        let reopened = decrypt::<Transfer>(&cipher, &body).await;
        assert_eq!(reopened.data, Some(transfer));
    }

    #[tokio::test]
    async fn cipher_failure_is_500() {
        let mut cipher = MockCipher::new();
        cipher
            .expect_decrypt()
            .returning(|_| Err(CipherError::AeadFailure));

        let resp = decrypt_and_validate::<Transfer>(&cipher, &Envelope::new("v1.x.y")).await;
        assert!(!resp.success);
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.message.as_deref(), Some("aead operation failed"));
        assert!(resp.data.is_none());
    }

    #[tokio::test]
    async fn garbage_ciphertext_is_500_with_real_cipher() {
        let resp = decrypt_and_validate::<Transfer>(&aes(), &Envelope::new("not-a-ciphertext")).await;
        assert_eq!(resp.status_code, 500);
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn non_json_plaintext_is_500() {
        let mut cipher = MockCipher::new();
        cipher
            .expect_decrypt()
            .returning(|_| Ok("definitely not json".into()));

        let resp = decrypt_and_validate::<Transfer>(&cipher, &Envelope::new("sealed")).await;
        assert_eq!(resp.status_code, 500);
        assert!(resp.message.is_some());
    }

    #[tokio::test]
    async fn missing_field_is_400() {
        let cipher = aes();
        let inbound = seal(&cipher, serde_json::json!({"account": "DE89"})).await;

        let resp = decrypt_and_validate::<Transfer>(&cipher, &inbound).await;
        assert!(!resp.success);
        assert_eq!(resp.status_code, 400);
        assert!(resp.message.unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn rule_violations_are_400_and_name_fields() {
        let cipher = aes();
        let inbound = seal(&cipher, serde_json::json!({"account": "", "amount": 0})).await;

        let resp = decrypt_and_validate::<Transfer>(&cipher, &inbound).await;
        assert_eq!(resp.status_code, 400);
        let message = resp.message.unwrap();
        assert!(message.contains("account"), "got: {message}");
        assert!(message.contains("amount"), "got: {message}");
    }

    #[tokio::test]
    async fn empty_envelope_is_400_without_touching_cipher() {
        let mut cipher = MockCipher::new();
        cipher.expect_decrypt().never();

        let resp = decrypt_and_validate::<Transfer>(&cipher, &Envelope::new("")).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.message.as_deref(), Some(NO_DATA_PROVIDED));
    }

    #[tokio::test]
    async fn encrypt_none_is_400_without_touching_cipher() {
        let mut cipher = MockCipher::new();
        cipher.expect_encrypt().never();

        let resp = encrypt::<Transfer>(&cipher, None).await;
        assert!(!resp.success);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.message.as_deref(), Some(NO_DATA_PROVIDED));
        assert!(resp.data.is_none());
    }

    #[tokio::test]
    async fn encrypt_preserves_failure_classification() {
        let cipher = aes();
        let failed: ApiResponse<Transfer> = ApiResponse::failure(400, "account is frozen");

        let resp = encrypt(&cipher, Some(failed)).await;
        assert!(!resp.success);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.message.as_deref(), Some("account is frozen"));

        let body = resp.data.expect("ciphertext envelope").body;
        let reopened = decrypt::<Option<Transfer>>(&cipher, &body).await;
        assert_eq!(reopened.data, Some(None));
    }

    #[tokio::test]
    async fn encrypt_keeps_success_message() {
        let cipher = aes();
        let ok = ApiResponse::ok_with_message(serde_json::json!({"id": "1"}), "success");
        let resp = encrypt(&cipher, Some(ok)).await;
        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn empty_ciphertext_is_500() {
        let mut cipher = MockCipher::new();
        cipher.expect_encrypt().returning(|_| Ok(String::new()));

        let resp = encrypt(&cipher, Some(ApiResponse::ok(1u32))).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.message.as_deref(), Some(ENCRYPTION_FAILED));
    }

    #[tokio::test]
    async fn encrypt_cipher_error_is_500() {
        let mut cipher = MockCipher::new();
        cipher
            .expect_encrypt()
            .returning(|_| Err(CipherError::Backend("kms throttled".into())));

        let resp = encrypt(&cipher, Some(ApiResponse::ok(1u32))).await;
        assert_eq!(resp.status_code, 500);
        assert!(resp.message.unwrap().contains("kms throttled"));
    }

    struct ExplodingCipher;

    #[async_trait::async_trait]
    impl Cipher for ExplodingCipher {
        async fn encrypt(&self, _plaintext: &str) -> Result<String, CipherError> {
            panic!("cipher exploded")
        }

        async fn decrypt(&self, _ciphertext: &str) -> Result<String, CipherError> {
            panic!("cipher exploded")
        }
    }

    #[tokio::test]
    async fn panicking_cipher_is_caught_as_500() {
        let cipher = ExplodingCipher;

        let resp = decrypt::<Transfer>(&cipher, "sealed").await;
        assert!(!resp.success);
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.message.as_deref(), Some("cipher exploded"));

        let resp = encrypt(&cipher, Some(ApiResponse::ok(1u32))).await;
        assert_eq!(resp.status_code, 500);
    }

    #[tokio::test]
    async fn decrypt_empty_input_is_400() {
        let cipher = MockCipher::new();
        let resp = decrypt::<Transfer>(&cipher, "   ").await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.message.as_deref(), Some(NO_DATA_PROVIDED));
    }

    #[tokio::test]
    async fn decrypt_skips_rule_validation() {
        let cipher = aes();
        let body = cipher
            .encrypt(r#"{"account":"","amount":0}"#)
            .await
            .unwrap();
        let resp = decrypt::<Transfer>(&cipher, &body).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().amount, 0);
    }

    #[tokio::test]
    async fn decrypt_shape_mismatch_is_500() {
        let cipher = aes();
        let body = cipher.encrypt(r#"{"account":"x"}"#).await.unwrap();
        let resp = decrypt::<Transfer>(&cipher, &body).await;
        assert_eq!(resp.status_code, 500);
    }
}
