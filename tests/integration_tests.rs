//! Integration tests for the personachat library.
//!
//! Most tests run the real client against a local mock server. The last
//! test talks to the live service and needs GOOGLE_API_KEY to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use personachat::chat::{ChatConfig, ChatSession, Persona};
    use personachat::{Content, Gemini, GenerateContentRequest, Model, PlainTextRenderer};

    const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-pro-latest:streamGenerateContent";

    fn sse(chunks: &[&str]) -> String {
        chunks
            .iter()
            .map(|text| {
                let chunk = serde_json::json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": text}]},
                        "index": 0
                    }]
                });
                format!("data: {chunk}\r\n\r\n")
            })
            .collect()
    }

    fn client(server: &MockServer) -> Gemini {
        Gemini::with_options(
            Some("test-key".to_string()),
            Some(format!("{}/v1beta", server.uri())),
            None,
        )
        .expect("Failed to create client")
    }

    fn pirate_session(server: &MockServer) -> ChatSession<Gemini> {
        let persona = Persona::new("a grumpy pirate").unwrap();
        ChatSession::new(client(server), ChatConfig::new(persona))
    }

    async fn mount_stream(server: &MockServer, body: String) {
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(server)
            .await;
    }

    async fn mount_error(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_streamed_turn_renders_fragments() {
        let server = MockServer::start().await;
        mount_stream(&server, sse(&["Why ", "arr you ", "laughing?"])).await;

        let mut session = pirate_session(&server);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let outcome = session
            .send_streaming("Tell me a joke", &mut renderer)
            .await
            .unwrap();

        assert_eq!(outcome.fragments, 3);
        assert_eq!(
            String::from_utf8(renderer.into_inner()).unwrap(),
            "\nGemini: Why arr you laughing?\n\n"
        );
        assert_eq!(
            session.history(),
            &[
                Content::user("Tell me a joke"),
                Content::model("Why arr you laughing?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_body_carries_persona_and_settings() {
        let server = MockServer::start().await;
        mount_stream(&server, sse(&["Arr."])).await;

        let mut session = pirate_session(&server);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        session
            .send_streaming("Tell me a joke", &mut renderer)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "a grumpy pirate"
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Tell me a joke");

        let config = &body["generationConfig"];
        assert!((config["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!((config["topP"].as_f64().unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(config["topK"], 32);
        assert_eq!(config["maxOutputTokens"], 4096);

        let safety = body["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        for setting in safety {
            assert_eq!(setting["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
        }
    }

    #[tokio::test]
    async fn test_second_turn_resends_history() {
        let server = MockServer::start().await;
        mount_stream(&server, sse(&["Ahoy."])).await;

        let mut session = pirate_session(&server);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        session.send_streaming("Hello", &mut renderer).await.unwrap();
        session.send_streaming("Again?", &mut renderer).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
    }

    #[tokio::test]
    async fn test_invalid_key_is_bad_request() {
        let server = MockServer::start().await;
        mount_error(
            &server,
            ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })),
        )
        .await;

        let mut session = pirate_session(&server);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let err = session
            .send_streaming("Hello", &mut renderer)
            .await
            .unwrap_err();

        assert!(err.is_bad_request());
        assert!(err.to_string().contains("API key not valid"));
        assert!(session.history().is_empty());
        assert!(renderer.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        mount_error(
            &server,
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string("quota exhausted"),
        )
        .await;

        let request = GenerateContentRequest::new(vec![Content::user("Hello")]);
        let err = match client(&server).stream(&Model::default(), &request).await {
            Ok(_) => panic!("expected the request to be rejected"),
            Err(err) => err,
        };

        assert!(err.is_rate_limit());
        assert_eq!(err.status_code(), Some(429));
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_error_event_mid_stream() {
        let server = MockServer::start().await;
        let mut body = sse(&["Once upon"]);
        body.push_str(
            "data: {\"error\": {\"code\": 503, \"message\": \"The model is overloaded.\", \"status\": \"UNAVAILABLE\"}}\n\n",
        );
        mount_stream(&server, body).await;

        let mut session = pirate_session(&server);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let err = session
            .send_streaming("Tell me a story", &mut renderer)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(503));
        assert!(session.history().is_empty());
        assert_eq!(
            String::from_utf8(renderer.into_inner()).unwrap(),
            "\nGemini: Once upon"
        );
    }

    #[tokio::test]
    async fn test_raw_stream_yields_chunks_in_order() {
        let server = MockServer::start().await;
        mount_stream(&server, sse(&["one ", "two ", "three"])).await;

        let request = GenerateContentRequest::new(vec![Content::user("Count to 3")]);
        let stream = client(&server)
            .stream(&Model::default(), &request)
            .await
            .unwrap();
        let texts: Vec<String> = stream
            .map(|chunk| chunk.unwrap().text().unwrap_or_default())
            .collect()
            .await;

        assert_eq!(texts, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn test_live_streaming_turn() {
        // This test requires GOOGLE_API_KEY to be set
        let api_key = std::env::var("GOOGLE_API_KEY").ok();
        if api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            eprintln!("Skipping test: GOOGLE_API_KEY not set");
            return;
        }

        let client = Gemini::from_env().expect("Failed to create client");
        let persona = Persona::new("a terse assistant").unwrap();
        let mut session = ChatSession::new(client, ChatConfig::new(persona));
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);

        let outcome = session.send_streaming("Say 'test passed'", &mut renderer).await;
        assert!(outcome.is_ok(), "Turn should succeed with valid API key");
    }
}
