//! Scripted gateway for tests that must observe (or forbid) network calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use oembed_core::Error;

use super::{HttpGateway, Method, RawResponse, RequestParams};

/// A call the fake gateway received.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub method: Method,
    pub params: RequestParams,
}

/// Answers calls from a queue of scripted results, recording each call.
///
/// An exhausted queue answers with a transport error.
#[derive(Debug, Default)]
pub(crate) struct FakeGateway {
    responses: Mutex<VecDeque<Result<RawResponse, Error>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(RawResponse::with_status(status, body)));
        self
    }

    pub fn fail(self, err: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpGateway for FakeGateway {
    async fn call(&self, url: &str, method: Method, params: RequestParams) -> Result<RawResponse, Error> {
        self.calls.lock().unwrap().push(RecordedCall { url: url.to_string(), method, params });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport { message: format!("unexpected call to {url}"), timeout: false }))
    }
}
