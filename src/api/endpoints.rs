// bluemoon-rbac/src/api/endpoints.rs
use serde_json::{json, Value};
use crate::api::client::{ApiClient, ApiError, ApiMethod};
use crate::utils::structs::UserRecord;

pub const TAI_KHOAN: &str = "/tai-khoan";
pub const KHOAN_THU: &str = "/khoan-thu";
pub const HO_GIA_DINH: &str = "/ho-gia-dinh";
pub const NHAN_KHAU: &str = "/nhan-khau";
pub const DOT_THU: &str = "/dot-thu";
pub const PHIEU_THU: &str = "/phieu-thu";
pub const PHONG: &str = "/phong";
pub const PHUONG_TIEN: &str = "/phuong-tien";
pub const THONG_BAO: &str = "/thong-bao";

/// Upstream collection behind a front-end page.
pub fn entity_for_page(page: &str) -> Option<&'static str> {
    match page {
        "tai-khoan" => Some(TAI_KHOAN),
        "khoan-thu" => Some(KHOAN_THU),
        "can-ho" => Some(HO_GIA_DINH),
        "danh-sach-dan-cu" => Some(NHAN_KHAU),
        "dot-thu" => Some(DOT_THU),
        "phieu-thu" => Some(PHIEU_THU),
        "phuong-tien" => Some(PHUONG_TIEN),
        _ => None,
    }
}

/// List endpoints answer either a bare array or `{data: [...]}`.
pub fn extract_list(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// `response.data` when present, the whole response otherwise.
pub fn extract_data(response: Value) -> Value {
    match response {
        Value::Object(mut map) if map.get("data").map_or(false, |d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: Option<String>,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let response = self
            .client
            .request(
                "/login",
                ApiMethod::Post,
                Some(json!({ "username": username, "password": password })),
            )
            .await?;

        let access_token = ["accessToken", "token"]
            .iter()
            .find_map(|key| response.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        let user = serde_json::from_value::<UserRecord>(extract_data(response))
            .map_err(|e| ApiError::InvalidJson(e.to_string()))?;

        Ok(LoginOutcome { user, access_token })
    }

    pub async fn check_username(&self, username: &str) -> Result<Value, ApiError> {
        let endpoint = format!("/check-username/{}", urlencoding::encode(username));
        self.client.request(&endpoint, ApiMethod::Get, None).await
    }

    pub async fn change_password(&self, payload: Value) -> Result<Value, ApiError> {
        self.client
            .request("/change-password", ApiMethod::Post, Some(payload))
            .await
    }
}

/// CRUD call shape shared by the entity endpoints.
pub struct EntityApi<'a> {
    client: &'a ApiClient,
    base: &'static str,
}

impl<'a> EntityApi<'a> {
    pub fn new(client: &'a ApiClient, base: &'static str) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &'static str {
        self.base
    }

    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        let response = self.client.request(self.base, ApiMethod::Get, None).await?;
        Ok(extract_list(response))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.client
            .request(&format!("{}/{}", self.base, id), ApiMethod::Get, None)
            .await
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ApiError> {
        self.client
            .request(self.base, ApiMethod::Post, Some(payload))
            .await
    }

    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        self.client
            .request(&format!("{}/{}", self.base, id), ApiMethod::Put, Some(payload))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.client
            .request(&format!("{}/{}", self.base, id), ApiMethod::Delete, None)
            .await
    }

    pub async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        let endpoint = format!("{}/search/{}", self.base, urlencoding::encode(keyword));
        self.client.request(&endpoint, ApiMethod::Get, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::FakeTransport;
    use crate::api::client::RawResponse;

    #[test]
    fn test_extract_list_shapes() {
        assert_eq!(extract_list(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(extract_list(json!({"success": true, "data": [3]})), vec![json!(3)]);
        assert!(extract_list(json!({"success": true, "data": null})).is_empty());
        assert!(extract_list(json!("text")).is_empty());
    }

    #[test]
    fn test_entity_for_page() {
        assert_eq!(entity_for_page("can-ho"), Some(HO_GIA_DINH));
        assert_eq!(entity_for_page("thong-ke"), None);
    }

    #[test]
    fn test_extract_data_falls_back_to_response() {
        assert_eq!(extract_data(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(extract_data(json!({"data": null, "id": 2})), json!({"data": null, "id": 2}));
    }

    #[actix_rt::test]
    async fn test_login_parses_user_record() {
        let transport = FakeTransport::new(vec![RawResponse::json(
            200,
            json!({
                "success": true,
                "message": "Login successful",
                "data": {"id": 4, "tenDangNhap": "bql", "hoTen": "Trần C", "vaiTro": "BanQuanLy", "matKhau": null}
            }),
        )]);
        let client = ApiClient::new("http://api.local/api", transport.clone());

        let outcome = AuthApi::new(&client).login("bql", "secret").await.unwrap();
        assert_eq!(outcome.user.id, Some(4));
        assert_eq!(outcome.user.display_name(), "Trần C");
        assert_eq!(outcome.access_token, None);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].url, "http://api.local/api/login");
        assert_eq!(sent[0].body, Some(json!({"username": "bql", "password": "secret"})));
    }

    #[actix_rt::test]
    async fn test_login_rejection_keeps_status() {
        let transport = FakeTransport::new(vec![RawResponse::json(
            401,
            json!({"success": false, "message": "Invalid credentials or account is locked"}),
        )]);
        let client = ApiClient::new("http://api.local/api", transport);

        let err = AuthApi::new(&client).login("x", "y").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid credentials or account is locked");
    }

    #[actix_rt::test]
    async fn test_entity_paths_are_encoded() {
        let transport = FakeTransport::new(vec![
            RawResponse::json(200, json!({"data": [{"id": 1}]})),
            RawResponse::json(200, json!([])),
            RawResponse::json(200, json!({"success": true})),
        ]);
        let client = ApiClient::new("http://api.local/api", transport.clone());
        let vehicles = EntityApi::new(&client, PHUONG_TIEN);

        assert_eq!(vehicles.list().await.unwrap(), vec![json!({"id": 1})]);
        vehicles.search("30A 123").await.unwrap();
        vehicles.delete("9").await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[1].url, "http://api.local/api/phuong-tien/search/30A%20123");
        assert_eq!(sent[2].method, ApiMethod::Delete);
        assert_eq!(sent[2].url, "http://api.local/api/phuong-tien/9");
    }
}
