use async_trait::async_trait;
use mockall::mock;

use crate::{
    data_types::{MenuItem, Order, OrderId, OrderStatus},
    order_objects::{Credentials, LoginResult, NewAccount, NewOrderRequest},
    traits::{ApiError, StorefrontApi},
};

mock! {
    pub OrderService {}
    #[async_trait]
    impl StorefrontApi for OrderService {
        async fn fetch_menu(&self) -> Result<Vec<MenuItem>, ApiError>;
        async fn register(&self, account: &NewAccount) -> Result<(), ApiError>;
        async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError>;
        async fn order_history(&self, token: &str) -> Result<Vec<Order>, ApiError>;
        async fn create_order(&self, token: &str, request: &NewOrderRequest) -> Result<Order, ApiError>;
        async fn update_order_status(&self, token: &str, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError>;
    }
}
