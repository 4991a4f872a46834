use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::ClinicConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub store_url: String,
    pub store_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            store_url: "http://localhost:54321".to_string(),
            store_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_clinic_config(&self) -> ClinicConfig {
        ClinicConfig {
            store_url: self.store_url.clone(),
            store_service_key: self.store_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            clinic_timezone: "Asia/Yekaterinburg".to_string(),
            clinic_opens_at: "09:00".to_string(),
            clinic_closes_at: "18:00".to_string(),
            booking_grace_minutes: 30,
            expiry_sweep_seconds: 300,
            mailer_url: String::new(),
            mailer_token: String::new(),
            mail_from: "noreply@clinic.example".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<ClinicConfig> {
        Arc::new(self.to_clinic_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn staff(email: &str) -> Self {
        Self::new(email, "staff")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store rows for wiremock-backed tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn worker_response(worker_id: &str, profession_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": worker_id,
            "first_name": "Anna",
            "last_name": "Orlova",
            "description": "Therapist",
            "profession_id": profession_id,
            "status": "active"
        })
    }

    pub fn profession_response(profession_id: &str, procedure_minutes: Option<i32>) -> serde_json::Value {
        json!({
            "id": profession_id,
            "title": "Therapy",
            "procedure_minutes": procedure_minutes
        })
    }

    pub fn service_response(service_id: &str, profession_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": service_id,
            "title": "Consultation",
            "price": 1500,
            "profession_id": profession_id,
            "status": "active"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        worker_id: &str,
        patient_id: &str,
        service_id: &str,
        start_time: &str,
        end_time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "worker_id": worker_id,
            "patient_id": patient_id,
            "service_id": service_id,
            "start_time": start_time,
            "end_time": end_time,
            "duration_minutes": 30,
            "status": status,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let clinic_config = config.to_clinic_config();

        assert_eq!(clinic_config.store_url, "http://localhost:54321");
        assert_eq!(clinic_config.store_service_key, "test-service-key");
        assert!(!clinic_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::patient("pat@example.com");
        assert_eq!(user.email, "pat@example.com");
        assert_eq!(user.role, "patient");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some(user.role.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
