#[cfg(test)]
mod ai_tests {
    use std::time::Duration;

    use super::super::*;
    use crate::io::csv;

    #[test]
    fn parse_reply_extracts_array_from_prose() {
        let reply = "Sure! Here is the updated dataset:\n[{\"x\": 1}]\n";
        let transformed = parse_reply(reply).unwrap();
        assert_eq!(transformed.columns, vec!["x".to_string()]);
        assert_eq!(transformed.records[0]["x"], "1");
    }

    #[test]
    fn parse_reply_spans_first_to_last_bracket() {
        // Nested arrays must not cut the candidate short.
        let reply = "prefix [{\"tags\": [1, 2]}] suffix";
        let transformed = parse_reply(reply).unwrap();
        assert_eq!(transformed.records[0]["tags"], "[1,2]");
    }

    #[test]
    fn parse_reply_without_array_fails() {
        let err = parse_reply("I could not edit the data, sorry.").unwrap_err();
        assert!(matches!(err, TransformError::MalformedReply { .. }));
    }

    #[test]
    fn parse_reply_rejects_non_object_rows() {
        let err = parse_reply("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TransformError::MalformedReply { .. }));
    }

    #[test]
    fn user_prompt_embeds_instruction_and_dataset() {
        let rowset = csv::import("name\na\n").unwrap();
        let prompt = build_user_prompt("delete row one", &dataset_value(&rowset));
        assert!(prompt.starts_with("User instruction: \"delete row one\""));
        assert!(prompt.contains("Input Dataset:"));
        assert!(prompt.contains("\"name\": \"a\""));
    }

    #[tokio::test]
    async fn blank_instruction_is_rejected_before_any_request() {
        let rowset = csv::import("name\na\n").unwrap();
        let gateway = DirectGateway::new("http://127.0.0.1:1", "key", DEFAULT_MODEL).unwrap();
        let err = gateway.transform(&rowset, "   ").await.unwrap_err();
        assert!(matches!(err, TransformError::EmptyInstruction));
    }

    #[tokio::test]
    async fn relay_poll_gives_up_at_the_deadline() {
        use axum::{Json, Router, routing};

        // Dispatch succeeds but the run never leaves "running".
        let app = Router::new()
            .route(
                "/runs",
                routing::post(|| async { Json(serde_json::json!({"id": "run-1"})) }),
            )
            .route(
                "/runs/:id",
                routing::get(|| async { Json(serde_json::json!({"status": "running"})) }),
            );
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let options = RelayOptions {
            initial_interval: Duration::from_millis(2),
            max_interval: Duration::from_millis(5),
            backoff: 1.5,
            deadline: Duration::from_millis(30),
        };
        let gateway =
            RelayGateway::new(&format!("http://{addr}"), "table-transform", None, options).unwrap();
        let rowset = csv::import("name\na\n").unwrap();
        let err = gateway.transform(&rowset, "add a row").await.unwrap_err();
        assert!(matches!(err, TransformError::Timeout { .. }));
    }

    #[test]
    fn poll_interval_backs_off_to_the_cap() {
        let options = RelayOptions::default();
        let mut interval = options.initial_interval;
        let mut seen = Vec::new();
        for _ in 0..6 {
            interval = super::super::relay::next_interval(interval, &options);
            seen.push(interval);
        }
        assert_eq!(seen[0], Duration::from_secs(3));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), options.max_interval);
    }
}
