#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde_json::Value;
use submission_gateway::{GatewayState, MemoryQueue, SubmissionQueue, config::DEFAULT_BODY_LIMIT};
use tokio::net::TcpListener;

pub struct TestGateway {
    addr: SocketAddr,
    client: reqwest::Client,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestGateway {
    pub async fn spawn<Q: SubmissionQueue>(
        queue: Q,
        strict_status: bool,
        body_limit: usize,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = GatewayState::new(queue, strict_status);
        tokio::spawn(submission_gateway::serve(
            listener,
            state,
            body_limit,
            std::future::pending(),
        ));
        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub async fn with_memory() -> (Self, Arc<MemoryQueue>) {
        let queue = Arc::new(MemoryQueue::new());
        let gateway = Self::spawn(queue.clone(), false, DEFAULT_BODY_LIMIT).await;
        (gateway, queue)
    }

    pub fn url(&self) -> String {
        format!("http://{}/submit", self.addr)
    }

    pub async fn submit(&self, body: &Value) -> TestResponse {
        let res = self.client.post(self.url()).json(body).send().await.unwrap();
        Self::read(res).await
    }

    pub async fn submit_raw(
        &self,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .unwrap();
        Self::read(res).await
    }

    pub async fn read(res: reqwest::Response) -> TestResponse {
        let status = res.status();
        let text = res.text().await.unwrap();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        TestResponse { status, body }
    }
}
