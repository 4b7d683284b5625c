use crate::domain::complaint::Complaint;
use crate::domain::error::Result;
use crate::domain::otp::{mask_mobile, OtpRequestResponse, OtpVerifyResponse};
use crate::infrastructure::config::PortalConfig;
use crate::infrastructure::response::{error_for_status, parse_complaint, parse_complaint_list};
use crate::infrastructure::session::SessionContext;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Backend operations behind the mobile-number change flow.
#[async_trait]
pub trait OtpService: Send + Sync {
    async fn request_mobile_otp(&self, new_mobile: &str) -> Result<OtpRequestResponse>;
    async fn verify_mobile_otp(&self, otp: &str, new_mobile: &str) -> Result<OtpVerifyResponse>;
}

/// Read access to complaint snapshots.
#[async_trait]
pub trait ComplaintSource: Send + Sync {
    async fn get_complaint(&self, id: i64) -> Result<Complaint>;
    async fn list_complaints(&self) -> Result<Vec<Complaint>>;
}

pub struct PortalApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl PortalApiClient {
    pub fn new(config: &PortalConfig, session: SessionContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = error_for_status(status, &text);
            warn!(status = %status, error = %err, "Portal API returned an error");
            return Err(err);
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl OtpService for PortalApiClient {
    async fn request_mobile_otp(&self, new_mobile: &str) -> Result<OtpRequestResponse> {
        debug!(mobile = %mask_mobile(new_mobile), "Requesting mobile change OTP");
        let request = self
            .client
            .post(self.url("/profile/mobile/request-otp"))
            .json(&json!({ "newMobile": new_mobile }));
        self.send(request).await
    }

    async fn verify_mobile_otp(&self, otp: &str, new_mobile: &str) -> Result<OtpVerifyResponse> {
        debug!(mobile = %mask_mobile(new_mobile), "Verifying mobile change OTP");
        let request = self
            .client
            .post(self.url("/profile/mobile/verify-otp"))
            .json(&json!({ "otp": otp, "newMobile": new_mobile }));
        self.send(request).await
    }
}

#[async_trait]
impl ComplaintSource for PortalApiClient {
    async fn get_complaint(&self, id: i64) -> Result<Complaint> {
        let request = self
            .client
            .get(self.url(&format!("/citizen/complaints/{}", id)));
        let body: Value = self.send(request).await?;
        parse_complaint(body)
    }

    async fn list_complaints(&self) -> Result<Vec<Complaint>> {
        let request = self.client.get(self.url("/citizen/complaints"));
        let body: Value = self.send(request).await?;
        parse_complaint_list(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complaint::Priority;
    use crate::domain::error::AppError;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

    async fn request_otp(body: web::Json<Value>) -> HttpResponse {
        match body["newMobile"].as_str() {
            Some("9123456789") => HttpResponse::Ok().json(json!({
                "success": true,
                "message": "OTP sent",
                "mockOtp": "482913"
            })),
            _ => HttpResponse::Conflict().json(json!({
                "message": "Mobile number already registered"
            })),
        }
    }

    async fn verify_otp(body: web::Json<Value>) -> HttpResponse {
        if body["otp"] == "482913" && body["newMobile"] == "9123456789" {
            HttpResponse::Ok().json(json!({ "success": true, "message": "Mobile updated" }))
        } else {
            HttpResponse::BadRequest().json(json!({ "message": "Invalid or expired OTP" }))
        }
    }

    async fn list(req: HttpRequest) -> HttpResponse {
        let authorized = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer citizen-token");
        if !authorized {
            return HttpResponse::Unauthorized().finish();
        }
        HttpResponse::Ok().json(json!({
            "content": [
                { "id": 1, "createdAt": "2024-01-01T00:00:00Z", "priority": "HIGH" },
                { "id": 2, "createdAt": "2024-01-03T00:00:00Z", "status": "CLOSED" }
            ]
        }))
    }

    async fn get_one(path: web::Path<i64>) -> HttpResponse {
        let id = path.into_inner();
        if id == 1 {
            HttpResponse::Ok().json(json!({ "id": 1, "priority": "HIGH" }))
        } else {
            HttpResponse::NotFound().json(json!({ "message": format!("Complaint {} not found", id) }))
        }
    }

    /// Starts a stub backend on an ephemeral port and returns its base url.
    fn spawn_backend() -> String {
        let server = HttpServer::new(|| {
            App::new().service(
                web::scope("/api")
                    .route("/profile/mobile/request-otp", web::post().to(request_otp))
                    .route("/profile/mobile/verify-otp", web::post().to(verify_otp))
                    .route("/citizen/complaints", web::get().to(list))
                    .route("/citizen/complaints/{id}", web::get().to(get_one)),
            )
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
        let port = server.addrs()[0].port();
        actix_web::rt::spawn(server.run());
        format!("http://127.0.0.1:{}/api", port)
    }

    fn client_for(base_url: String, session: SessionContext) -> PortalApiClient {
        let config = PortalConfig {
            api_base_url: base_url,
            ..PortalConfig::default()
        };
        PortalApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("http://localhost:8083/api/".to_string(), SessionContext::new());
        assert_eq!(
            client.url("/profile/mobile/request-otp"),
            "http://localhost:8083/api/profile/mobile/request-otp"
        );
        let client = client_for("http://localhost:8083/api".to_string(), SessionContext::new());
        assert_eq!(client.url("wards"), "http://localhost:8083/api/wards");
    }

    #[actix_web::test]
    async fn test_request_otp_success_echoes_dev_code() {
        let client = client_for(spawn_backend(), SessionContext::new());
        let response = client.request_mobile_otp("9123456789").await.unwrap();
        assert!(response.success);
        assert_eq!(response.mock_otp.as_deref(), Some("482913"));
    }

    #[actix_web::test]
    async fn test_request_otp_failure_carries_server_message() {
        let client = client_for(spawn_backend(), SessionContext::new());
        let err = client.request_mobile_otp("9876543210").await.unwrap_err();
        assert_eq!(
            err,
            AppError::ServiceError("Mobile number already registered".to_string())
        );
    }

    #[actix_web::test]
    async fn test_verify_otp() {
        let client = client_for(spawn_backend(), SessionContext::new());
        assert!(client.verify_mobile_otp("482913", "9123456789").await.unwrap().success);

        let err = client
            .verify_mobile_otp("000000", "9123456789")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid or expired OTP");
    }

    #[actix_web::test]
    async fn test_list_complaints_sends_bearer_token() {
        let base_url = spawn_backend();

        let anonymous = client_for(base_url.clone(), SessionContext::new());
        assert!(matches!(
            anonymous.list_complaints().await,
            Err(AppError::HttpError(_))
        ));

        let client = client_for(base_url, SessionContext::with_token("citizen-token"));
        let complaints = client.list_complaints().await.unwrap();
        assert_eq!(complaints.len(), 2);
        assert_eq!(complaints[0].priority, Some(Priority::High));
    }

    #[actix_web::test]
    async fn test_get_complaint_not_found() {
        let client = client_for(spawn_backend(), SessionContext::new());
        assert_eq!(client.get_complaint(1).await.unwrap().id, Some(1));
        assert_eq!(
            client.get_complaint(7).await.unwrap_err(),
            AppError::NotFound("Complaint 7 not found".to_string())
        );
    }

    #[actix_web::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = client_for("http://127.0.0.1:9/api".to_string(), SessionContext::new());
        let err = client.request_mobile_otp("9123456789").await.unwrap_err();
        assert!(matches!(err, AppError::NetworkError(_)));
    }
}
