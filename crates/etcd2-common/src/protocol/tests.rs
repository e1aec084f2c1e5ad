//! Cross-module tests for the protocol layer
//!
//! These follow a logical operation from its descriptor to the decoded
//! answer, the way the client drives them.

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    /// Decode the way the client does: status first, then the envelope
    fn finish(status: u16, body: &str) -> Result<ClientResponse> {
        check_status(status, body)?;
        ClientResponse::decode(body.as_bytes())
    }

    #[test]
    fn test_set_request_and_answer() {
        let path = to_wire_path("/a/b").unwrap();
        let request = LogicalRequest::put(path)
            .with_value("5")
            .with_form("ttl", 60);
        assert_eq!(
            request.url("http://127.0.0.1:4001").unwrap().as_str(),
            "http://127.0.0.1:4001/v2/keys/a/b"
        );

        let body = json!({
            "action": "set",
            "node": {
                "key": "/a/b", "value": "5",
                "expiration": "2013-12-04T12:01:21-08:00", "ttl": 60,
                "createdIndex": 4, "modifiedIndex": 4
            }
        })
        .to_string();

        let response = finish(201, &body).unwrap();
        assert_eq!(response.action, Action::Set);
        assert_eq!(response.node.value(), Some("5"));
        assert_eq!(response.node.ttl(), Some(60));
        assert!(response.node.expiration().is_some());
        assert!(!response.node.is_deleted());
        assert!(!response.node.is_directory());
    }

    #[test]
    fn test_error_wins_over_decode() {
        let err = finish(
            404,
            r#"{"errorCode":100,"message":"Key not found","cause":"/missing","index":1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Etcd2Error::KeyNotFound { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_recursive_listing() {
        let body = json!({
            "action": "get",
            "node": {
                "key": "/", "dir": true,
                "nodes": [
                    {"key": "/_etcd", "dir": true, "createdIndex": 1, "modifiedIndex": 1, "nodes": [
                        {"key": "/_etcd/machines", "dir": true, "createdIndex": 1, "modifiedIndex": 1}
                    ]},
                    {"key": "/app", "value": "on", "createdIndex": 2, "modifiedIndex": 6}
                ],
                "createdIndex": 0, "modifiedIndex": 0
            }
        })
        .to_string();

        let response = finish(200, &body).unwrap();
        let children = response.node.children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].is_hidden());
        assert!(children[0].is_collection());
        assert!(children[0].children().unwrap()[0].children().is_err());
        assert_eq!(children[1].modified_index(), 6);
    }

    #[test]
    fn test_only_connection_errors_are_retryable() {
        let errors = [
            Etcd2Error::Connection("refused".into()),
            Etcd2Error::AllMembersFailed,
            Etcd2Error::PreconditionFailed { message: String::new() },
            Etcd2Error::ServerRequest { status: 500, body: String::new() },
            Etcd2Error::InvalidPath("a".into()),
        ];
        let retryable: Vec<_> = errors.iter().map(Etcd2Error::is_retryable).collect();
        assert_eq!(retryable, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_error_messages() {
        let err = Etcd2Error::InvalidPath("a/b".into());
        assert_eq!(err.to_string(), "Invalid path: [a/b] should have been absolute");

        let err = Etcd2Error::AtomicUpdateExhausted { key: "/c".into(), attempts: 10 };
        assert_eq!(err.to_string(), "Atomic update of /c exhausted after 10 attempts");
    }
}
