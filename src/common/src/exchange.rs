//! Typed request/response wrapper over the exchange's HTTP surface.
//!
//! Every call refreshes authentication before issuing the request. Ticker
//! and market id are the same string throughout: the exchange accepts a
//! market's ticker wherever a market id is expected.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use crate::auth::AuthSession;
use crate::error::Error;
use crate::models::{Order, Position};
use crate::orderbook::{self, DenseBook, RestingOrder};

/// Requests are batched at most this many entries per call, and the
/// client pauses this long between chunks/requests to respect the
/// exchange's rate limit.
const BATCH_SIZE: usize = 19;
const INTER_BATCH_PAUSE: Duration = Duration::from_millis(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A market as returned by the markets-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRow {
    pub id: String,
    pub ticker_name: String,
    pub status: String,
}

/// A single market's trading details.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDetails {
    pub status: String,
    #[serde(default)]
    pub volume: i64,
    pub yes_bid: u8,
    pub yes_ask: u8,
    #[serde(default)]
    pub last_price: u8,
}

/// A resting order as placed, per the batch/single order-create response.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedOrderRow {
    pub order_id: String,
    pub price: u8,
    pub is_yes: bool,
    pub remaining_count: u32,
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    markets: Vec<MarketRow>,
}

#[derive(Debug, Deserialize)]
struct MarketResponse {
    market: MarketDetails,
}

#[derive(Debug, Deserialize)]
struct MarketPosition {
    market_id: String,
    position: i64,
    position_cost: i64,
}

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    market_positions: Vec<MarketPosition>,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    orders: Vec<RestingOrderRow>,
}

#[derive(Debug, Deserialize)]
struct RestingOrderRow {
    order_id: String,
    price: u8,
    is_yes: bool,
    remaining_count: u32,
}

#[derive(Debug, Deserialize)]
struct OrderBookResponse {
    order_book: OrderBookLevels,
}

#[derive(Debug, Deserialize)]
struct OrderBookLevels {
    yes: Vec<(u8, u32)>,
    no: Vec<(u8, u32)>,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    market_id: &'a str,
    side: &'a str,
    price: u8,
    count: u32,
    expiration_unix_ts: i64,
    sell_position_capped: bool,
}

#[derive(Debug, Deserialize)]
struct BatchOrdersResponse {
    orders: Vec<PlacedOrderRow>,
}

#[derive(Debug, Deserialize)]
struct SingleOrderResponse {
    order: PlacedOrderRow,
}

/// A thin, typed wrapper over the exchange's HTTP surface.
pub struct ExchangeClient {
    http: Client,
    host: &'static str,
    auth: AuthSession,
}

impl ExchangeClient {
    pub fn new(host: &'static str, auth: AuthSession) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { http, host, auth }
    }

    async fn authorized(
        &mut self,
    ) -> Result<(reqwest::header::HeaderMap, Client, &'static str), Error> {
        self.auth.require_authenticated(&self.http).await?;
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            self.auth
                .authorization_header()
                .parse()
                .expect("authorization header is valid ascii"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        // reqwest::Client is an Arc handle, so cloning it is cheap.
        Ok((headers, self.http.clone(), self.host))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            Err(Error::transport(status, reason))
        }
    }

    pub async fn list_public_markets(&mut self) -> Result<Vec<MarketRow>, Error> {
        let (headers, http, host) = self.authorized().await?;
        let response = http
            .get(format!("{host}/v1/markets"))
            .headers(headers)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: MarketsResponse = response.json().await?;
        Ok(body.markets)
    }

    pub async fn get_market(&mut self, ticker: &str) -> Result<MarketDetails, Error> {
        let (headers, http, host) = self.authorized().await?;
        let response = http
            .get(format!("{host}/v1/markets_by_ticker/{ticker}"))
            .headers(headers)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: MarketResponse = response.json().await?;
        Ok(body.market)
    }

    pub async fn list_positions(&mut self) -> Result<HashMap<String, Position>, Error> {
        let (headers, http, host) = self.authorized().await?;
        let user_id = self.auth.user_id().to_string();
        let response = http
            .get(format!("{host}/v1/users/{user_id}/positions"))
            .headers(headers)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: PositionsResponse = response.json().await?;
        Ok(body
            .market_positions
            .into_iter()
            .map(|p| {
                (
                    p.market_id,
                    Position {
                        position: p.position,
                        position_cost: p.position_cost,
                    },
                )
            })
            .collect())
    }

    pub async fn list_resting_orders(
        &mut self,
        market_id: &str,
    ) -> Result<Vec<RestingOrder>, Error> {
        let (headers, http, host) = self.authorized().await?;
        let user_id = self.auth.user_id().to_string();
        let response = http
            .get(format!("{host}/v1/users/{user_id}/orders"))
            .headers(headers)
            .query(&[("market_id", market_id), ("status", "resting")])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: OrdersResponse = response.json().await?;
        Ok(body
            .orders
            .into_iter()
            .map(|o| RestingOrder {
                order_id: o.order_id,
                price: o.price,
                is_yes: o.is_yes,
                remaining_count: o.remaining_count,
            })
            .collect())
    }

    pub async fn get_public_orderbook(
        &mut self,
        market_id: &str,
    ) -> Result<(DenseBook, DenseBook), Error> {
        let (headers, http, host) = self.authorized().await?;
        let response = http
            .get(format!(
                "{host}/v1/markets_by_ticker/{market_id}/order_book"
            ))
            .headers(headers)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: OrderBookResponse = response.json().await?;
        Ok(orderbook::public_books_from_levels(
            &body.order_book.yes,
            &body.order_book.no,
        ))
    }

    pub async fn get_own_orderbook(
        &mut self,
        market_id: &str,
    ) -> Result<(DenseBook, DenseBook), Error> {
        let orders = self.list_resting_orders(market_id).await?;
        Ok(orderbook::own_books_from_orders(&orders))
    }

    /// Cancel the given order ids. Chunks into groups of at most
    /// `BATCH_SIZE` when the session uses the advanced batched API;
    /// otherwise issues one DELETE per order id. Sleeps
    /// `INTER_BATCH_PAUSE` between chunks/requests.
    pub async fn cancel_orders(&mut self, order_ids: &[String]) -> Result<(), Error> {
        if order_ids.is_empty() {
            return Ok(());
        }

        // Force a login (if needed) before reading `user_id`/`advanced_api`
        // below: both are only populated once authenticated.
        self.auth.require_authenticated(&self.http).await?;
        let advanced = self.auth.advanced_api();
        let user_id = self.auth.user_id().to_string();

        if advanced {
            for (i, chunk) in order_ids.chunks(BATCH_SIZE).enumerate() {
                if i > 0 {
                    sleep(INTER_BATCH_PAUSE).await;
                }
                let (headers, http, host) = self.authorized().await?;
                let response = http
                    .delete(format!("{host}/v1/users/{user_id}/batch_orders"))
                    .headers(headers)
                    .json(&serde_json::json!({ "ids": chunk }))
                    .send()
                    .await?;
                Self::check_status(response).await?;
            }
        } else {
            for (i, order_id) in order_ids.iter().enumerate() {
                if i > 0 {
                    sleep(INTER_BATCH_PAUSE).await;
                }
                let (headers, http, host) = self.authorized().await?;
                let response = http
                    .delete(format!("{host}/v1/users/{user_id}/orders/{order_id}"))
                    .headers(headers)
                    .send()
                    .await?;
                Self::check_status(response).await?;
            }
        }
        debug!(count = order_ids.len(), "cancelled orders");
        Ok(())
    }

    /// Place the given orders. Same batching and pacing policy as
    /// `cancel_orders`.
    pub async fn place_orders(&mut self, orders: &[Order]) -> Result<Vec<PlacedOrderRow>, Error> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        self.auth.require_authenticated(&self.http).await?;
        let advanced = self.auth.advanced_api();
        let user_id = self.auth.user_id().to_string();
        let mut placed = Vec::with_capacity(orders.len());

        if advanced {
            for (i, chunk) in orders.chunks(BATCH_SIZE).enumerate() {
                if i > 0 {
                    sleep(INTER_BATCH_PAUSE).await;
                }
                let (headers, http, host) = self.authorized().await?;
                let body: Vec<OrderRequest> = chunk.iter().map(to_request).collect();
                let response = http
                    .post(format!("{host}/v1/users/{user_id}/batch_orders"))
                    .headers(headers)
                    .json(&serde_json::json!({ "orders": body }))
                    .send()
                    .await?;
                let response = Self::check_status(response).await?;
                let parsed: BatchOrdersResponse = response.json().await?;
                placed.extend(parsed.orders);
            }
        } else {
            for (i, order) in orders.iter().enumerate() {
                if i > 0 {
                    sleep(INTER_BATCH_PAUSE).await;
                }
                let (headers, http, host) = self.authorized().await?;
                let response = http
                    .post(format!("{host}/v1/users/{user_id}/orders"))
                    .headers(headers)
                    .json(&to_request(order))
                    .send()
                    .await?;
                let response = Self::check_status(response).await?;
                let parsed: SingleOrderResponse = response.json().await?;
                placed.push(parsed.order);
            }
        }
        debug!(count = placed.len(), "placed orders");
        Ok(placed)
    }
}

fn to_request(order: &Order) -> OrderRequest<'_> {
    OrderRequest {
        market_id: &order.market_id,
        side: if order.side.is_yes() { "yes" } else { "no" },
        price: order.price,
        count: order.count,
        expiration_unix_ts: order.expiration_unix_ts,
        sell_position_capped: order.sell_position_capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::models::Side;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ExchangeClient {
        Mock::given(method("POST"))
            .and(path("/v1/log_in"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "tok", "user_id": "u1"})),
            )
            .mount(server)
            .await;

        let host: &'static str = Box::leak(server.uri().into_boxed_str());
        let auth = AuthSession::new(
            host,
            Credentials {
                email: "a@b.com".into(),
                password: "x".into(),
                advanced_api: true,
            },
        );
        ExchangeClient::new(host, auth)
    }

    #[tokio::test]
    async fn list_positions_parses_response() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/users/u1/positions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "market_positions": [
                    {"market_id": "ABC", "position": 30, "position_cost": 1500}
                ]
            })))
            .mount(&server)
            .await;

        let positions = client.list_positions().await.unwrap();
        let pos = positions.get("ABC").unwrap();
        assert_eq!(pos.position, 30);
        assert_eq!(pos.position_cost, 1500);
    }

    #[tokio::test]
    async fn get_market_decodes_fields() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/markets_by_ticker/ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "market": {
                    "status": "active",
                    "volume": 100,
                    "yes_bid": 48,
                    "yes_ask": 52,
                    "last_price": 50
                }
            })))
            .mount(&server)
            .await;

        let details = client.get_market("ABC").await.unwrap();
        assert_eq!(details.status, "active");
        assert_eq!(details.yes_bid, 48);
        assert_eq!(details.yes_ask, 52);
    }

    #[tokio::test]
    async fn non_2xx_becomes_transport_error() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/markets_by_ticker/ABC"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client.get_market("ABC").await.unwrap_err();
        assert!(matches!(err, Error::Transport { status: 500, .. }));
    }

    #[tokio::test]
    async fn cancel_orders_chunks_at_19_with_advanced_api() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("DELETE"))
            .and(path("/v1/users/u1/batch_orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(3)
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..45).map(|i| format!("order-{i}")).collect();
        client.cancel_orders(&ids).await.unwrap();
    }

    #[tokio::test]
    async fn place_orders_batches_and_parses_results() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/v1/users/u1/batch_orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "orders": [
                    {"order_id": "o1", "price": 48, "is_yes": true, "remaining_count": 66}
                ]
            })))
            .mount(&server)
            .await;

        let orders = vec![Order {
            market_id: "ABC".into(),
            side: Side::Yes,
            price: 48,
            count: 66,
            expiration_unix_ts: 0,
            sell_position_capped: false,
        }];
        let placed = client.place_orders(&orders).await.unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].order_id, "o1");
    }

    #[tokio::test]
    async fn list_resting_orders_passes_query_params() {
        let server = MockServer::start().await;
        let mut client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1/users/u1/orders"))
            .and(query_param("market_id", "ABC"))
            .and(query_param("status", "resting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "orders": [
                    {"order_id": "o1", "price": 48, "is_yes": true, "remaining_count": 66}
                ]
            })))
            .mount(&server)
            .await;

        let orders = client.list_resting_orders("ABC").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "o1");
    }
}
