//! In-memory stand-in for an etcd 0.x server
//!
//! Serves the subset of the v2 API the client speaks (keys, machine
//! listing, version, leader, stats, lock and leader modules) over a real
//! hyper HTTP/1 listener on `127.0.0.1:0`. Every request is recorded so
//! tests can assert on the wire format.

#![allow(dead_code)]

use etcd2_client::ClientConfig;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Params = BTreeMap<String, String>;

/// One request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Params,
    pub form: Params,
}

#[derive(Debug, Clone)]
struct Entry {
    /// `None` for directories
    value: Option<String>,
    created: u64,
    modified: u64,
    ttl: Option<i64>,
    expiration: Option<String>,
}

#[derive(Debug, Clone)]
struct HeldLock {
    index: u64,
    value: Option<String>,
}

struct State {
    prefix: String,
    version: String,
    index: u64,
    nodes: BTreeMap<String, Entry>,
    machines: usize,
    locks: HashMap<String, HeldLock>,
    leaders: HashMap<String, String>,
    leader_error: bool,
    cas_conflicts: u32,
    canned: VecDeque<(u16, String)>,
    requests: Vec<RecordedRequest>,
}

pub struct FakeEtcd {
    port: u16,
    state: Arc<Mutex<State>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeEtcd {
    /// Starts a server that lists itself as the only machine
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let prefix = format!("http://127.0.0.1:{}", port);

        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Entry {
                value: None,
                created: 0,
                modified: 0,
                ttl: None,
                expiration: None,
            },
        );

        let state = Arc::new(Mutex::new(State {
            prefix: prefix.clone(),
            version: "etcd v0.2.0".to_string(),
            index: 0,
            nodes,
            machines: 0,
            locks: HashMap::new(),
            leaders: HashMap::new(),
            leader_error: false,
            cas_conflicts: 0,
            canned: VecDeque::new(),
            requests: Vec::new(),
        }));
        state.lock().unwrap().add_machine(&prefix);

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        let server_state = Arc::clone(&state);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let state = Arc::clone(&server_state);

                                tokio::spawn(async move {
                                    let service = service_fn(move |req| {
                                        let state = Arc::clone(&state);
                                        async move { handle(state, req).await }
                                    });

                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        eprintln!("Server error: {}", err);
                                    }
                                });
                            }
                            Err(err) => {
                                eprintln!("Accept error: {}", err);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            port,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn prefix(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_host("127.0.0.1")
            .with_port(self.port)
    }

    /// Publishes another member in the machine listing
    pub fn add_machine(&self, prefix: &str) {
        self.state.lock().unwrap().add_machine(prefix);
    }

    pub fn set_version(&self, version: &str) {
        self.state.lock().unwrap().version = version.to_string();
    }

    /// Answers the next request with `status` and `body`, whatever it is
    pub fn respond_next(&self, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .canned
            .push_back((status, body.to_string()));
    }

    /// Rejects the next `count` writes conditioned on `prevIndex`
    pub fn set_cas_conflicts(&self, count: u32) {
        self.state.lock().unwrap().cas_conflicts = count;
    }

    /// Makes leader reads answer with the module's error text
    pub fn set_leader_error(&self, on: bool) {
        self.state.lock().unwrap().leader_error = on;
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(key)
            .and_then(|e| e.value.clone())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.state
            .lock()
            .unwrap()
            .requests
            .last()
            .cloned()
            .unwrap()
    }
}

impl Drop for FakeEtcd {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A prefix nothing listens on
pub async fn dead_prefix() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn parse_params(raw: &[u8]) -> Params {
    url::form_urlencoded::parse(raw).into_owned().collect()
}

async fn handle(
    state: Arc<Mutex<State>>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = percent_decode_str(req.uri().path())
        .decode_utf8_lossy()
        .to_string();
    let query = parse_params(req.uri().query().unwrap_or("").as_bytes());
    let body = req.into_body().collect().await?.to_bytes();
    let form = parse_params(&body);

    let (status, body) = state.lock().unwrap().route(&method, &path, query, form);

    Ok(Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .unwrap())
}

fn flag(params: &Params, name: &str) -> bool {
    params.get(name).map(|v| v == "true").unwrap_or(false)
}

fn parent_of(key: &str) -> &str {
    match key.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &key[..i],
    }
}

fn normalize_key(key: &str) -> String {
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl State {
    fn add_machine(&mut self, prefix: &str) {
        self.machines += 1;
        let value = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("raft", "http://127.0.0.1:7001")
            .append_pair("etcd", prefix)
            .finish();
        let key = format!("/_etcd/machines/node{}", self.machines);
        self.write_file(&key, value);
    }

    fn write_file(&mut self, key: &str, value: String) {
        let _ = self.ensure_parents(key);
        self.index += 1;
        self.nodes.insert(
            key.to_string(),
            Entry {
                value: Some(value),
                created: self.index,
                modified: self.index,
                ttl: None,
                expiration: None,
            },
        );
    }

    fn route(&mut self, method: &Method, path: &str, query: Params, form: Params) -> (u16, String) {
        self.requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            query: query.clone(),
            form: form.clone(),
        });

        if let Some(canned) = self.canned.pop_front() {
            return canned;
        }

        if path == "/version" {
            return (200, self.version.clone());
        }
        if path == "/v2/leader" {
            return (200, self.prefix.clone());
        }
        if let Some(key) = path.strip_prefix("/v2/keys") {
            let key = normalize_key(key);
            return match *method {
                Method::GET => self.get(&key, &query),
                Method::PUT => self.put(&key, &query, &form),
                Method::POST => self.post(&key, &form),
                Method::DELETE => self.delete(&key, &query),
                _ => (405, String::new()),
            };
        }
        if let Some(name) = path.strip_prefix("/mod/v2/lock") {
            return self.lock(method, name, &query, &form);
        }
        if let Some(key) = path.strip_prefix("/mod/v2/leader") {
            return self.leader(method, key, &query, &form);
        }

        match path {
            "/v2/stats/self" => (
                200,
                json!({
                    "name": "node1",
                    "state": "StateLeader",
                    "startTime": "2013-12-04T12:01:21.874888581-08:00",
                    "leaderInfo": {"leader": "node1", "uptime": "1m18.544996775s"},
                    "recvAppendRequestCnt": 0,
                    "sendAppendRequestCnt": 4,
                    "sendPkgRate": 2.5
                })
                .to_string(),
            ),
            "/v2/stats/leader" => (
                200,
                json!({
                    "leader": "node1",
                    "followers": {
                        "node2": {
                            "latency": {"current": 1.2, "average": 1.5, "standardDeviation": 0.3,
                                        "minimum": 0.9, "maximum": 2.1},
                            "counts": {"fail": 0, "success": 42}
                        }
                    }
                })
                .to_string(),
            ),
            "/v2/stats/store" => {
                let gets = self.requests.iter().filter(|r| r.method == "GET").count();
                (
                    200,
                    json!({"getsSuccess": gets, "setsSuccess": self.index, "watchers": 0})
                        .to_string(),
                )
            }
            _ => (404, "404 page not found\n".to_string()),
        }
    }

    fn error(&self, status: u16, code: u32, message: &str, cause: &str) -> (u16, String) {
        (
            status,
            json!({"errorCode": code, "message": message, "cause": cause, "index": self.index})
                .to_string(),
        )
    }

    fn not_found(&self, key: &str) -> (u16, String) {
        self.error(404, 100, "Key not found", key)
    }

    fn children(&self, key: &str) -> Vec<(String, Entry)> {
        self.nodes
            .iter()
            .filter(|(k, _)| k.as_str() != "/" && parent_of(k) == key)
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect()
    }

    fn node_json(&self, key: &str, entry: &Entry, with_children: bool, recursive: bool) -> Value {
        let mut node = json!({
            "key": key,
            "createdIndex": entry.created,
            "modifiedIndex": entry.modified,
        });

        match &entry.value {
            Some(value) => node["value"] = json!(value),
            None => {
                node["dir"] = json!(true);
                if with_children {
                    let children: Vec<Value> = self
                        .children(key)
                        .iter()
                        .map(|(k, e)| self.node_json(k, e, recursive, recursive))
                        .collect();
                    node["nodes"] = Value::Array(children);
                }
            }
        }

        if let (Some(ttl), Some(expiration)) = (entry.ttl, &entry.expiration) {
            node["ttl"] = json!(ttl);
            node["expiration"] = json!(expiration);
        }
        node
    }

    /// Creates missing parent directories of `key`
    fn ensure_parents(&mut self, key: &str) -> Result<(), (u16, String)> {
        let mut missing = Vec::new();
        let mut parent = parent_of(key).to_string();

        while parent != "/" {
            match self.nodes.get(&parent) {
                Some(entry) if entry.value.is_some() => {
                    return Err(self.error(403, 104, "Not a directory", &parent));
                }
                Some(_) => break,
                None => missing.push(parent.clone()),
            }
            parent = parent_of(&parent).to_string();
        }

        for dir in missing {
            self.index += 1;
            self.nodes.insert(
                dir,
                Entry {
                    value: None,
                    created: self.index,
                    modified: self.index,
                    ttl: None,
                    expiration: None,
                },
            );
        }
        Ok(())
    }

    fn check_preconditions(&mut self, key: &str, existing: Option<&Entry>, query: &Params) -> Result<(), (u16, String)> {
        let prev_index = query.get("prevIndex");
        let prev_value = query.get("prevValue");
        if prev_index.is_none() && prev_value.is_none() {
            return Ok(());
        }

        let Some(entry) = existing else {
            return Err(self.not_found(key));
        };

        if prev_index.is_some() && self.cas_conflicts > 0 {
            self.cas_conflicts -= 1;
            return Err(self.error(412, 101, "Compare failed", "[concurrent writer]"));
        }
        if let Some(index) = prev_index {
            if entry.modified.to_string() != *index {
                let cause = format!("[{} != {}]", index, entry.modified);
                return Err(self.error(412, 101, "Compare failed", &cause));
            }
        }
        if let Some(value) = prev_value {
            if entry.value.as_deref() != Some(value.as_str()) {
                let cause = format!("[{} != {}]", value, entry.value.clone().unwrap_or_default());
                return Err(self.error(412, 101, "Compare failed", &cause));
            }
        }
        Ok(())
    }

    fn get(&self, key: &str, query: &Params) -> (u16, String) {
        let Some(entry) = self.nodes.get(key) else {
            return self.not_found(key);
        };

        let node = self.node_json(key, entry, true, flag(query, "recursive"));
        let action = if flag(query, "wait") { "set" } else { "get" };
        (200, json!({"action": action, "node": node}).to_string())
    }

    fn put(&mut self, key: &str, query: &Params, form: &Params) -> (u16, String) {
        let is_dir = flag(form, "dir") || flag(query, "dir");
        let existing = self.nodes.get(key).cloned();
        let prev_exist = query.get("prevExist").map(|v| v == "true");
        let ttl: Option<i64> = form
            .get("ttl")
            .or_else(|| query.get("ttl"))
            .and_then(|t| t.parse().ok());

        match (prev_exist, &existing) {
            (Some(false), Some(_)) => return self.error(412, 105, "Key already exists", key),
            (Some(true), None) => return self.not_found(key),
            _ => {}
        }

        match &existing {
            Some(entry) if is_dir && entry.value.is_some() => {
                return self.error(403, 102, "Not a file", key)
            }
            Some(_) if is_dir && prev_exist != Some(true) => {
                return self.error(403, 102, "Not a file", key)
            }
            Some(entry) if !is_dir && entry.value.is_none() => {
                return self.error(403, 102, "Not a file", key)
            }
            _ => {}
        }

        if let Err(response) = self.check_preconditions(key, existing.as_ref(), query) {
            return response;
        }
        if let Err(response) = self.ensure_parents(key) {
            return response;
        }

        self.index += 1;
        let expiration = ttl.map(|ttl| (chrono::Utc::now() + chrono::Duration::seconds(ttl)).to_rfc3339());
        let entry = Entry {
            value: if is_dir {
                None
            } else {
                Some(form.get("value").cloned().unwrap_or_default())
            },
            created: existing.as_ref().map(|e| e.created).unwrap_or(self.index),
            modified: self.index,
            ttl,
            expiration,
        };
        self.nodes.insert(key.to_string(), entry.clone());

        let action = if prev_exist == Some(false) {
            "create"
        } else if query.contains_key("prevIndex") || query.contains_key("prevValue") {
            "compareAndSwap"
        } else if prev_exist == Some(true) {
            "update"
        } else {
            "set"
        };

        let mut body = json!({"action": action, "node": self.node_json(key, &entry, false, false)});
        if let Some(prev) = &existing {
            body["prevNode"] = self.node_json(key, prev, false, false);
        }
        let status = if existing.is_some() { 200 } else { 201 };
        (status, body.to_string())
    }

    fn post(&mut self, key: &str, form: &Params) -> (u16, String) {
        if let Some(entry) = self.nodes.get(key) {
            if entry.value.is_some() {
                return self.error(403, 104, "Not a directory", key);
            }
        }

        let child = format!("{}/{:020}", key.trim_end_matches('/'), self.index + 1);
        if let Err(response) = self.ensure_parents(&child) {
            return response;
        }

        self.index += 1;
        let child = format!("{}/{:020}", key.trim_end_matches('/'), self.index);
        let entry = Entry {
            value: Some(form.get("value").cloned().unwrap_or_default()),
            created: self.index,
            modified: self.index,
            ttl: None,
            expiration: None,
        };
        self.nodes.insert(child.clone(), entry.clone());

        (
            201,
            json!({"action": "create", "node": self.node_json(&child, &entry, false, false)})
                .to_string(),
        )
    }

    fn delete(&mut self, key: &str, query: &Params) -> (u16, String) {
        let Some(existing) = self.nodes.get(key).cloned() else {
            return self.not_found(key);
        };

        if existing.value.is_none() {
            if !flag(query, "dir") {
                return self.error(403, 102, "Not a file", key);
            }
            if !self.children(key).is_empty() && !flag(query, "recursive") {
                return self.error(403, 108, "Directory not empty", key);
            }
        }

        if let Err(response) = self.check_preconditions(key, Some(&existing), query) {
            return response;
        }

        self.index += 1;
        let subtree = format!("{}/", key);
        self.nodes
            .retain(|k, _| k.as_str() != key && !k.starts_with(&subtree));

        let action = if query.contains_key("prevIndex") || query.contains_key("prevValue") {
            "compareAndDelete"
        } else {
            "delete"
        };
        let mut node = json!({"key": key, "createdIndex": existing.created, "modifiedIndex": self.index});
        if existing.value.is_none() {
            node["dir"] = json!(true);
        }

        (
            200,
            json!({
                "action": action,
                "node": node,
                "prevNode": self.node_json(key, &existing, false, false)
            })
            .to_string(),
        )
    }

    fn lock(&mut self, method: &Method, name: &str, query: &Params, form: &Params) -> (u16, String) {
        if self.nodes.contains_key(name) {
            return (500, format!("lock error: {} holds other data", name));
        }

        match *method {
            Method::POST => {
                let value = form.get("value").cloned();
                match self.locks.get(name) {
                    None => {
                        self.index += 1;
                        self.locks.insert(
                            name.to_string(),
                            HeldLock {
                                index: self.index,
                                value,
                            },
                        );
                        (200, self.index.to_string())
                    }
                    Some(held) if value.is_some() && held.value == value => {
                        (200, held.index.to_string())
                    }
                    Some(_) => (500, "acquire lock error: lock held".to_string()),
                }
            }
            Method::PUT => {
                let holder = self.locks.get(name);
                let matches = match (holder, form.get("index"), form.get("value")) {
                    (Some(held), Some(index), _) => held.index.to_string() == *index,
                    (Some(held), None, Some(value)) => held.value.as_ref() == Some(value),
                    _ => false,
                };
                if matches {
                    (200, String::new())
                } else {
                    (500, format!("renew lock error: cannot find: {}", name))
                }
            }
            Method::GET => {
                let held = self.locks.get(name);
                let text = if query.get("field").map(String::as_str) == Some("index") {
                    held.map(|h| h.index.to_string()).unwrap_or_default()
                } else {
                    held.and_then(|h| h.value.clone()).unwrap_or_default()
                };
                (200, text)
            }
            Method::DELETE => {
                let matches = match (self.locks.get(name), query.get("index"), query.get("value")) {
                    (Some(held), Some(index), _) => held.index.to_string() == *index,
                    (Some(held), None, Some(value)) => held.value.as_ref() == Some(value),
                    _ => false,
                };
                if matches {
                    self.locks.remove(name);
                    (200, String::new())
                } else {
                    (500, format!("release lock error: cannot find: {}", name))
                }
            }
            _ => (405, String::new()),
        }
    }

    fn leader(&mut self, method: &Method, key: &str, query: &Params, form: &Params) -> (u16, String) {
        match *method {
            Method::PUT => {
                let name = form.get("name").cloned().unwrap_or_default();
                match self.leaders.get(key) {
                    Some(current) if *current != name => {
                        (500, "set leader error: lock held".to_string())
                    }
                    _ => {
                        self.leaders.insert(key.to_string(), name);
                        (200, String::new())
                    }
                }
            }
            Method::GET => {
                if self.leader_error {
                    return (
                        200,
                        "get leader error: read lock error: Cannot reach servers after 3 time\n"
                            .to_string(),
                    );
                }
                (200, self.leaders.get(key).cloned().unwrap_or_default())
            }
            Method::DELETE => {
                let name = query.get("name").cloned().unwrap_or_default();
                if self.leaders.get(key) == Some(&name) {
                    self.leaders.remove(key);
                    (200, String::new())
                } else {
                    (
                        500,
                        format!("delete leader error: release lock error: cannot find: {}", name),
                    )
                }
            }
            _ => (405, String::new()),
        }
    }
}
