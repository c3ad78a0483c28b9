//! In-memory transport double for client tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{
    config::{GatewayConfig, Mode},
    error::{GatewayError, Result},
    transport::{Transport, TransportResponse},
    wire::FormFields,
};

pub(crate) const MERCHANT_ID: &str = "MS12345";
pub(crate) const HASH_KEY: &str = "0123456789abcdef0123456789abcdef";
pub(crate) const HASH_IV: &str = "0123456789abcdef";

pub(crate) fn test_config() -> GatewayConfig {
    GatewayConfig::new(Mode::Test, MERCHANT_ID, HASH_KEY, HASH_IV)
}

/// One recorded form post.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub fields: FormFields,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Replays canned replies in order and records every request.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTransport {
    replies: Arc<Mutex<VecDeque<TransportResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RecordingTransport {
    pub fn replying(body: &str) -> Self {
        let transport = Self::default();
        transport.push_reply(body);
        transport
    }

    pub fn push_reply(&self, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(TransportResponse { status: 200, body: body.as_bytes().to_vec() });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().unwrap()
    }
}

impl Transport for RecordingTransport {
    async fn post_form<'a>(
        &'a self,
        url: &'a str,
        fields: &'a FormFields,
    ) -> Result<TransportResponse> {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { url: url.to_owned(), fields: fields.clone() });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::TransportError("no canned reply left".to_owned()))
    }

    fn protocol_name(&self) -> &'static str {
        "recording"
    }
}
