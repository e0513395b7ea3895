//! Test doubles shared by the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::history::Clock;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

type Reply = Result<HttpResponse, TransportError>;

/// Replays queued responses in order and records every request it sees.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted reply left")))
    }
}

pub fn json_response(status: u16, body: &str) -> Reply {
    Ok(HttpResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.as_bytes().to_vec(),
    })
}

/// Clock that advances one second per reading, starting at 2024-05-01.
#[derive(Debug)]
pub struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}
