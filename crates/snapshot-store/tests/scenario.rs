//! Full probe -> merge -> store runs against an in-process stub network.

use instance_probe::{probe_all, HttpReply, ProbeOptions, Transport, TransportError};
use snapshot_store::{load, load_or_empty, merge_snapshot, save, CodedSince, Since, Snapshot};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use time::macros::datetime;
use time::OffsetDateTime;

const WELL_KNOWN_B: &str = "https://b.example/.well-known/nodeinfo";
const LIST_B: &str = r#"{"links":[
    {"rel":"http://nodeinfo.diaspora.software/ns/schema/2.1","href":"https://b.example/nodeinfo/2.1"}
]}"#;
const SCHEMA_B: &str = r#"{"software":{"name":"x","version":"1.0"},"openRegistrations":true,"usage":{"users":{"total":42}}}"#;

/// Answers from fixed tables; the tables can be swapped between runs.
#[derive(Default)]
struct StubNet {
    hosts: Mutex<Vec<String>>,
    pages: Mutex<HashMap<String, (u16, String)>>,
}

impl StubNet {
    fn host(&self, h: &str) {
        self.hosts.lock().unwrap().push(h.to_string());
    }

    fn page(&self, url: &str, status: u16, body: &str) {
        self.pages.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
    }
}

impl Transport for StubNet {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, TransportError> {
        if self.hosts.lock().unwrap().iter().any(|h| h == host) {
            Ok(vec![IpAddr::from([198, 51, 100, 7])])
        } else {
            Err(TransportError::Resolve(format!("NXDOMAIN {}", host)))
        }
    }

    async fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        let pages = self.pages.lock().unwrap();
        match pages.get(url) {
            Some((status, body)) => Ok(HttpReply { status: *status, body: body.as_bytes().to_vec() }),
            None => Err(TransportError::Timeout),
        }
    }
}

fn targets(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

async fn run(net: &Arc<StubNet>, list: &[&str], prior: &Snapshot, now: OffsetDateTime) -> Snapshot {
    let groups = probe_all(net.clone(), targets(list), ProbeOptions::default()).await;
    assert_eq!(groups.total(), list.len());
    merge_snapshot(prior, &groups, now)
}

#[tokio::test]
async fn unresolved_and_valid_instances() {
    let net = Arc::new(StubNet::default());
    net.host("b.example");
    net.page(WELL_KNOWN_B, 200, LIST_B);
    net.page("https://b.example/nodeinfo/2.1", 200, SCHEMA_B);

    let now = datetime!(2026-10-16 06:00 UTC);
    let snap = run(&net, &["a.example", "b.example"], &Snapshot::empty(), now).await;

    assert_eq!(snap.collected_at, now);
    assert_eq!(snap.unresolved.len(), 1);
    assert_eq!(snap.unresolved["a.example"], Since(now));
    assert_eq!(snap.valid.len(), 1);
    assert_eq!(snap.valid["b.example"], nodeinfo::decode_schema(SCHEMA_B.as_bytes()).unwrap());
    assert!(snap.not_functioning.is_empty());
    assert!(snap.wrong_code.is_empty());

    let v = serde_json::to_value(&snap).unwrap();
    assert_eq!(
        v["valid"]["b.example"],
        serde_json::json!({
            "software": {"name": "x", "version": "1.0"},
            "openRegistrations": true,
            "usage": {"users": {"total": 42}}
        })
    );
}

#[tokio::test]
async fn every_target_lands_in_exactly_one_category() {
    let net = Arc::new(StubNet::default());
    for h in ["b.example", "c.example", "d.example", "e.example", "f.example", "g.example"] {
        net.host(h);
    }
    net.page(WELL_KNOWN_B, 200, LIST_B);
    net.page("https://b.example/nodeinfo/2.1", 200, SCHEMA_B);
    // c: connection times out (no page)
    net.page("https://d.example/.well-known/nodeinfo", 502, "bad gateway");
    net.page("https://e.example/.well-known/nodeinfo", 200, "not json");
    net.page("https://f.example/.well-known/nodeinfo", 200, r#"{"links":[]}"#);
    net.page(
        "https://g.example/.well-known/nodeinfo",
        200,
        r#"{"links":[{"rel":"http://nodeinfo.diaspora.software/ns/schema/2.0","href":"https://g.example/ni"}]}"#,
    );
    net.page("https://g.example/ni", 200, r#"{"software":{"name":"x","version":"1"}}"#);

    let list = ["a.example", "b.example", "c.example", "d.example", "e.example", "f.example", "g.example"];
    let snap = run(&net, &list, &Snapshot::empty(), datetime!(2026-10-16 06:00 UTC)).await;

    let mut seen: Vec<&str> = Vec::new();
    seen.extend(snap.unresolved.keys().map(|s| s.as_str()));
    seen.extend(snap.not_functioning.keys().map(|s| s.as_str()));
    seen.extend(snap.wrong_code.keys().map(|s| s.as_str()));
    seen.extend(snap.misformatted_list.keys().map(|s| s.as_str()));
    seen.extend(snap.no_available_schema.keys().map(|s| s.as_str()));
    seen.extend(snap.misformatted_schema.keys().map(|s| s.as_str()));
    seen.extend(snap.valid.keys().map(|s| s.as_str()));
    seen.sort_unstable();
    assert_eq!(seen, list.to_vec());

    assert!(snap.unresolved.contains_key("a.example"));
    assert!(snap.valid.contains_key("b.example"));
    assert!(snap.not_functioning.contains_key("c.example"));
    assert_eq!(snap.wrong_code["d.example"].code, 502);
    assert!(snap.misformatted_list.contains_key("e.example"));
    assert!(snap.no_available_schema.contains_key("f.example"));
    assert!(snap.misformatted_schema.contains_key("g.example"));
}

#[tokio::test]
async fn history_carries_across_persisted_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domains.json");
    let t0 = datetime!(2026-10-14 06:00 UTC);
    let t1 = datetime!(2026-10-15 06:00 UTC);
    let t2 = datetime!(2026-10-16 06:00 UTC);

    let net = Arc::new(StubNet::default());
    net.host("b.example");
    net.page(WELL_KNOWN_B, 503, "");

    // run 1: nothing on disk yet
    let first = run(&net, &["a.example", "b.example"], &load_or_empty(&path), t0).await;
    save(&path, &first, false).unwrap();

    // run 2: same failures
    let second = run(&net, &["a.example", "b.example"], &load_or_empty(&path), t1).await;
    save(&path, &second, false).unwrap();
    assert_eq!(second.unresolved["a.example"], Since(t0));
    assert_eq!(second.wrong_code["b.example"], CodedSince { since: Since(t0), code: 503 });

    // run 3: a recovers far enough to answer, b changes its code
    net.host("a.example");
    net.page("https://a.example/.well-known/nodeinfo", 200, "{}");
    net.page(WELL_KNOWN_B, 500, "");
    let third = run(&net, &["a.example", "b.example"], &load(&path).unwrap(), t2).await;
    assert!(third.unresolved.is_empty());
    assert_eq!(third.no_available_schema["a.example"], Since(t2));
    assert_eq!(third.wrong_code["b.example"], CodedSince { since: Since(t2), code: 500 });
}
