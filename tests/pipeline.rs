//! Pipeline behavior over real HTTP: error reduction, request
//! substitution, shared state, and response conditioning.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};

use edge_gateway::config::GatewayConfig;
use edge_gateway::error::GatewayError;
use edge_gateway::handler::{Handler, HandlerRegistry};
use edge_gateway::pipeline::{ExecutionPipeline, StageContext};
use edge_gateway::routing::{RouteDef, RouteTable};

mod common;

#[derive(Debug)]
struct Chained {
    message: &'static str,
    source: Option<Box<Chained>>,
}

impl fmt::Display for Chained {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl Error for Chained {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn Error + 'static))
    }
}

struct FailDeep;

#[async_trait]
impl Handler for FailDeep {
    async fn invoke(
        &self,
        _ctx: &mut StageContext<'_, '_>,
    ) -> Result<Response<Body>, GatewayError> {
        Err(GatewayError::handler(Chained {
            message: "level one",
            source: Some(Box::new(Chained {
                message: "level two",
                source: Some(Box::new(Chained {
                    message: "level three",
                    source: None,
                })),
            })),
        }))
    }
}

#[tokio::test]
async fn errors_reduce_to_a_nested_json_body() {
    let table = RouteTable::builder()
        .route(RouteDef::new("/boom").terminal(Arc::new(FailDeep)))
        .build()
        .unwrap();

    let addr = common::start_gateway(ExecutionPipeline::new(Arc::new(table))).await;
    let client = common::test_client();

    let response = client
        .get(format!("http://{}/boom", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()["content-type"],
        HeaderValue::from_static("application/json")
    );

    let shape: Value = response.json().await.unwrap();
    assert_eq!(shape["name"], "Error");
    assert_eq!(shape["message"], "level one");
    assert_eq!(shape["cause"]["name"], "Error");
    assert_eq!(shape["cause"]["message"], "level two");
    assert_eq!(shape["cause"]["cause"]["message"], "level three");
    assert!(shape["cause"]["cause"]["cause"].is_null());
}

struct NoContentWithBody;

#[async_trait]
impl Handler for NoContentWithBody {
    async fn invoke(
        &self,
        _ctx: &mut StageContext<'_, '_>,
    ) -> Result<Response<Body>, GatewayError> {
        Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::from("must not leak"))
            .unwrap())
    }
}

#[tokio::test]
async fn no_content_responses_lose_their_body() {
    let table = RouteTable::builder()
        .route(RouteDef::new("/empty").terminal(Arc::new(NoContentWithBody)))
        .build()
        .unwrap();

    let addr = common::start_gateway(ExecutionPipeline::new(Arc::new(table))).await;
    let client = common::test_client();

    let response = client
        .get(format!("http://{}/empty", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.text().await.unwrap(), "");
}

struct Rewrite;

#[async_trait]
impl Handler for Rewrite {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        let original_path = ctx.request().uri().path().to_string();
        let mut request = Request::builder()
            .method(ctx.request().method().clone())
            .uri("/rewritten")
            .body(Body::empty())
            .unwrap();
        request.headers_mut().insert(
            "x-original-path",
            HeaderValue::from_str(&original_path).unwrap(),
        );
        ctx.proceed_with(request).await
    }
}

struct EchoRequest;

#[async_trait]
impl Handler for EchoRequest {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        let original = ctx
            .request()
            .headers()
            .get("x-original-path")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("?");
        let body = format!("{} was {}", ctx.request().uri().path(), original);
        Ok(Response::new(Body::from(body)))
    }
}

#[tokio::test]
async fn proceed_with_substitutes_the_request_downstream() {
    // Dispatch order was fixed by the original path; the substituted
    // request is what later stages observe.
    let table = RouteTable::builder()
        .route(RouteDef::new("/").middleware(Arc::new(Rewrite)))
        .route(RouteDef::new("/original").terminal(Arc::new(EchoRequest)))
        .build()
        .unwrap();

    let addr = common::start_gateway(ExecutionPipeline::new(Arc::new(table))).await;
    let client = common::test_client();

    let response = client
        .get(format!("http://{}/original", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.text().await.unwrap(),
        "/rewritten was /original"
    );
}

struct SetUser;

#[async_trait]
impl Handler for SetUser {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        ctx.set_data(json!({ "user": "u-1001" }))?;
        ctx.proceed().await
    }
}

struct WhoAmI;

#[async_trait]
impl Handler for WhoAmI {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        let user = ctx
            .data()
            .get("user")
            .and_then(Value::as_str)
            .unwrap_or("anonymous")
            .to_string();
        let deployment = ctx
            .env()
            .get("deployment")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        Ok(Response::new(Body::from(format!("{user}@{deployment}"))))
    }
}

#[tokio::test]
async fn data_bag_and_env_are_visible_to_later_stages() {
    let table = RouteTable::builder()
        .route(RouteDef::new("/").middleware(Arc::new(SetUser)))
        .route(RouteDef::new("/whoami").terminal(Arc::new(WhoAmI)))
        .build()
        .unwrap();

    let pipeline = ExecutionPipeline::new(Arc::new(table)).with_env(json!({
        "deployment": "staging"
    }));

    let addr = common::start_gateway(pipeline).await;
    let client = common::test_client();

    let response = client
        .get(format!("http://{}/whoami", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), "u-1001@staging");
}

#[tokio::test]
async fn config_built_table_serves_builtin_handlers() {
    let config: GatewayConfig = toml::from_str(
        r#"
            [[routes]]
            name = "health"
            route = "/healthz"
            method = "GET"
            middleware = ["access_log"]
            terminal = ["health"]
        "#,
    )
    .unwrap();

    let registry = HandlerRegistry::with_builtins();
    let table = RouteTable::from_config(&config.routes, &registry).unwrap();

    let addr = common::start_gateway(ExecutionPipeline::new(Arc::new(table))).await;
    let client = common::test_client();

    let response = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}
