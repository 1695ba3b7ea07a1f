//! Scripted transport and canned API responses shared by unit tests.

use crate::api::transport::MockTransport;
use crate::error::Result;
use crate::notify::Notifier;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::Level;

/// Requests seen by a scripted transport, decoded as JSON.
pub type RequestLog = Arc<Mutex<Vec<Value>>>;

/// A transport answering with `responses` in order, exactly once each.
pub fn scripted(responses: Vec<Result<Value>>) -> (MockTransport, RequestLog) {
    let count = responses.len();
    let queue = Mutex::new(VecDeque::from(responses));
    let requests: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);

    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(count)
        .returning(move |_url, body| {
            log.lock()
                .unwrap()
                .push(serde_json::from_slice(body).unwrap());
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap()
                .map(|value| serde_json::to_vec(&value).unwrap())
        });

    (transport, requests)
}

/// The `action` names of logged requests, in order.
pub fn actions(log: &RequestLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .map(|request| request["action"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub fn success(action: &str, data: Value) -> Result<Value> {
    Ok(json!({
        "serverrequestid": "srv",
        "clientrequestid": "",
        "action": action,
        "status": "success",
        "statuscode": 2000,
        "shortmessage": "ok",
        "longmessage": "ok",
        "responsedata": data
    }))
}

pub fn failure(action: &str, code: u32, message: &str) -> Result<Value> {
    Ok(json!({
        "serverrequestid": "srv",
        "clientrequestid": "",
        "action": action,
        "status": "error",
        "statuscode": code,
        "shortmessage": "error",
        "longmessage": message,
        "responsedata": ""
    }))
}

pub fn login_ok(session: &str) -> Result<Value> {
    success("login", json!({ "apisessionid": session }))
}

pub fn zone_ok(ttl: &str) -> Result<Value> {
    success(
        "infoDnsZone",
        json!({
            "name": "example.com",
            "ttl": ttl,
            "serial": "2024010101",
            "refresh": "28800",
            "retry": "7200",
            "expire": "1209600",
            "dnssecstatus": false
        }),
    )
}

pub fn records_ok(records: Value) -> Result<Value> {
    success("infoDnsRecords", json!({ "dnsrecords": records }))
}

pub fn session_invalid(action: &str) -> Result<Value> {
    failure(action, 4001, "The session id is not in a valid format.")
}

/// Notifier keeping every line it was handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<(Level, String)>>>);

impl RecordingNotifier {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.0.lock().unwrap().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, line: &str) {
        self.0.lock().unwrap().push((level, line.to_string()));
    }
}
