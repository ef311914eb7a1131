use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sf_common::helpers::token_prefix;
use storefront_engine::{
    data_types::MenuItem,
    normalize::{normalize_order, normalize_orders},
    order_objects::{Credentials, LoginResult, NewAccount, NewOrderRequest, StatusUpdate},
    ApiError,
    Order,
    OrderId,
    OrderStatus,
    StorefrontApi,
};

use crate::{
    config::StorefrontConfig,
    error::{api_error_for_status, json_error, payload_error, server_message, transport_error},
};

const INVALID_LOGIN: &str = "Invalid email or password";

/// The storefront order service, over HTTP.
#[derive(Clone)]
pub struct StorefrontHttpApi {
    config: StorefrontConfig,
    client: Arc<Client>,
}

impl StorefrontHttpApi {
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url)
    }

    /// Sends a request and returns the status code and body text, whatever the status.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<(u16, String), ApiError> {
        let url = self.url(path);
        trace!("Sending {method} request: {url}");
        let mut req = self.client.request(method, url);
        if let Some(token) = token {
            trace!("Authenticating with {}", token_prefix(token));
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        trace!("Response {status} for {path}");
        Ok((status, text))
    }

    /// Sends a request and deserializes a successful response. Any other response becomes an [`ApiError`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let (status, text) = self.send(method, path, token, body).await?;
        if (200..300).contains(&status) {
            serde_json::from_str::<T>(&text).map_err(json_error)
        } else {
            Err(api_error_for_status(status, &text))
        }
    }

    /// Like [`Self::rest_query`], for endpoints whose response body is of no interest.
    async fn rest_command<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let (status, text) = self.send(method, path, token, body).await?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(api_error_for_status(status, &text))
        }
    }
}

#[async_trait]
impl StorefrontApi for StorefrontHttpApi {
    async fn fetch_menu(&self) -> Result<Vec<MenuItem>, ApiError> {
        debug!("Fetching the menu");
        let body = self.rest_query::<Value, ()>(Method::GET, "/api/Menu", None, None).await?;
        parse_menu(body)
    }

    async fn register(&self, account: &NewAccount) -> Result<(), ApiError> {
        debug!("Registering a new account for {}", account.email);
        self.rest_command(Method::POST, "/api/Auth/register", None, Some(account)).await?;
        info!("Registered account {}", account.email);
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError> {
        debug!("Logging in as {}", credentials.email);
        let (status, text) = self.send(Method::POST, "/api/Auth/login", None, Some(credentials)).await?;
        let result = parse_login(status, &text)?;
        info!("Logged in as {}", credentials.email);
        Ok(result)
    }

    async fn order_history(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        debug!("Fetching order history");
        let body = self.rest_query::<Value, ()>(Method::GET, "/api/orders/history", Some(token), None).await?;
        let orders = parse_history(body)?;
        debug!("Fetched {} orders", orders.len());
        Ok(orders)
    }

    async fn create_order(&self, token: &str, request: &NewOrderRequest) -> Result<Order, ApiError> {
        debug!("Submitting an order with {} lines", request.items.len());
        let body = self.rest_query::<Value, _>(Method::POST, "/api/orders", Some(token), Some(request)).await?;
        let order = normalize_order(&body, Utc::now()).map_err(payload_error)?;
        info!("Order {} was accepted", order.id);
        Ok(order)
    }

    async fn update_order_status(&self, token: &str, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let path = format!("/api/orders/{}", order_id.as_str());
        debug!("Setting order {order_id} to {status}");
        self.rest_command(Method::PUT, &path, Some(token), Some(&StatusUpdate { status })).await
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: LoginToken,
    user: Option<LoginUser>,
}

#[derive(Debug, Deserialize)]
struct LoginToken {
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginUser {
    full_name: Option<String>,
}

/// Interprets a login response.
///
/// A rejected login is reported as [`ApiError::Rejected`] even for 401, since the customer is already on the sign-in
/// form and needs to hear why, not to be asked to sign in again.
fn parse_login(status: u16, body: &str) -> Result<LoginResult, ApiError> {
    if !(200..300).contains(&status) {
        let message = server_message(body).unwrap_or_else(|| INVALID_LOGIN.to_string());
        return Err(ApiError::Rejected { status, message });
    }
    let response = serde_json::from_str::<LoginResponse>(body).map_err(json_error)?;
    if !response.success {
        let message = response.message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| INVALID_LOGIN.to_string());
        return Err(ApiError::Rejected { status, message });
    }
    let data = response.data.ok_or_else(|| ApiError::Json("Login response has no data".into()))?;
    let token = data
        .token
        .result
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Json("Login response has no token".into()))?;
    let full_name = data.user.and_then(|u| u.full_name).filter(|n| !n.trim().is_empty());
    Ok(LoginResult { token, full_name })
}

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
fn unwrap_list(body: Value, what: &str) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ApiError::Json(format!("Expected a list of {what}, got {other}"))),
        },
        other => Err(ApiError::Json(format!("Expected a list of {what}, got {other}"))),
    }
}

fn parse_menu(body: Value) -> Result<Vec<MenuItem>, ApiError> {
    let items = unwrap_list(body, "menu items")?
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<MenuItem>(v) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping a menu item that could not be read. {e}");
                None
            },
        })
        .collect();
    Ok(items)
}

fn parse_history(body: Value) -> Result<Vec<Order>, ApiError> {
    let payloads = unwrap_list(body, "orders")?;
    Ok(normalize_orders(&payloads, Utc::now()))
}
