use super::*;
use crate::domain::{
    AdoptionMode, CodeOutput, GenerationError, GenerationOptions, GenerationPayload, OutputShape,
    ScriptFramework, ScriptLanguage,
};
use crate::infra::backend::{BackendRequest, ContentPart, GenerationBackend};
use crate::state::{GenerationSession, OutputView};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

// --- Helpers ---

struct ScriptedBackend {
    responses: Mutex<VecDeque<anyhow::Result<String>>>,
    calls: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<anyhow::Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn replying(raw: &str) -> Self {
        Self::new(vec![Ok(raw.to_string())])
    }

    fn failing(message: &str) -> Self {
        Self::new(vec![Err(anyhow::anyhow!(message.to_string()))])
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> BackendRequest {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn invoke(&self, request: &BackendRequest) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
    }
}

fn html_payload() -> GenerationPayload {
    GenerationPayload::Html {
        html: "<html><head></head><body>Hi</body></html>".into(),
    }
}

fn options_for(framework: ScriptFramework) -> GenerationOptions {
    GenerationOptions {
        framework,
        ..Default::default()
    }
}

fn document_envelope() -> String {
    let envelope = json!({
        "code": "<!DOCTYPE html><html><head></head><body>Hi</body></html>",
        "suggestions": ["Add a hero image.", "Use a sticky navbar.", "Add a footer."],
    });
    format!("```json\n{envelope}\n```")
}

fn project_envelope() -> String {
    let envelope = json!({
        "code": [
            {"path": "index.html", "content": "<html><head></head><body></body></html>"},
            {"path": "style.css", "content": "body{margin:0}"},
            {"path": "script.js", "content": "x=1"},
        ],
        "suggestions": ["Add hover states."],
        "response": "Split the page into three files.",
    });
    format!("Here you go:\n```json\n{envelope}\n```\nEnjoy!")
}

fn prompt_text(request: &BackendRequest) -> String {
    request
        .parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.clone()),
            ContentPart::InlineData { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Request builders ---

mod request_tests {
    use super::*;

    #[test]
    fn html_mode_with_markup_framework_expects_a_document() {
        let built = build_request(&html_payload(), &options_for(ScriptFramework::Html)).unwrap();
        assert_eq!(built.expected_shape, OutputShape::Document);
        assert!(!built.backend.web_lookup);
        assert_eq!(built.backend.parts.len(), 1);

        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("HERE IS THE HTML TO REFACTOR"));
        assert!(prompt.contains("single, complete HTML document"));
        assert!(prompt.contains("cdn.tailwindcss.com"));
    }

    #[test]
    fn component_frameworks_expect_a_project() {
        let built = build_request(&html_payload(), &options_for(ScriptFramework::React)).unwrap();
        assert_eq!(built.expected_shape, OutputShape::Project);

        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("An array of file objects"));
        assert!(prompt.contains("**React:**"));
    }

    #[test]
    fn url_mode_forces_a_project_and_web_lookup() {
        let payload = GenerationPayload::Url {
            url: "https://example.com/pricing".into(),
        };
        let built = build_request(&payload, &options_for(ScriptFramework::Html)).unwrap();
        assert_eq!(built.expected_shape, OutputShape::Project);
        assert!(built.backend.web_lookup);

        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("WEBPAGE URL TO CLONE"));
        assert!(prompt.contains("https://example.com/pricing"));
        assert!(prompt.contains("URL CLONING & ASSET HANDLING"));
    }

    #[test]
    fn image_mode_sends_the_image_before_the_prompt() {
        let payload = GenerationPayload::Image {
            data: vec![0x89, 0x50, 0x4e, 0x47],
            mime_type: "image/png".into(),
        };
        let built = build_request(&payload, &options_for(ScriptFramework::Html)).unwrap();

        match &built.backend.parts[0] {
            ContentPart::InlineData { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(data, "iVBORw==");
            }
            other => panic!("expected inline data first, got {other:?}"),
        }
        assert!(matches!(&built.backend.parts[1], ContentPart::Text { .. }));
    }

    #[test]
    fn figma_mode_appends_the_node_tree_as_its_own_part() {
        let payload = GenerationPayload::Figma {
            image: vec![1, 2, 3],
            mime_type: "image/png".into(),
            node: json!({"id": "1:2", "layoutMode": "HORIZONTAL"}),
        };
        let built = build_request(&payload, &options_for(ScriptFramework::Html)).unwrap();
        assert_eq!(built.backend.parts.len(), 3);

        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("AUTO LAYOUT TO FLEXBOX MAPPING"));
        assert!(prompt.contains("FIGMA NODE JSON"));
        assert!(prompt.contains("HORIZONTAL"));
    }

    #[test]
    fn content_mode_uses_the_adoption_prompt() {
        let payload = GenerationPayload::Content {
            template_html: "<html><body><h1>Old</h1></body></html>".into(),
            content: "Page Title: Our Services".into(),
            adoption: AdoptionMode::Strict,
        };
        let built = build_request(&payload, &options_for(ScriptFramework::React)).unwrap();
        // Content adoption is a document regardless of the framework.
        assert_eq!(built.expected_shape, OutputShape::Document);

        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("\"Strict Content\" mode"));
        assert!(prompt.contains("Page Title: Our Services"));
        assert!(prompt.contains("<h1>Old</h1>"));
    }

    #[test]
    fn custom_instructions_are_appended() {
        let options = GenerationOptions {
            framework: ScriptFramework::Html,
            custom_instructions: Some("Make the primary button green".into()),
            ..Default::default()
        };
        let built = build_request(&html_payload(), &options).unwrap();
        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("ADDITIONAL USER INSTRUCTIONS"));
        assert!(prompt.contains("Make the primary button green"));
    }

    #[test]
    fn unready_payload_fails_fast() {
        let payload = GenerationPayload::Url { url: "  ".into() };
        let err = build_request(&payload, &GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, GenerationError::InputNotReady));
    }

    #[test]
    fn stale_typescript_selection_never_reaches_markup_prompts() {
        let options = GenerationOptions {
            framework: ScriptFramework::VanillaJs,
            language: ScriptLanguage::TypeScript,
            ..Default::default()
        };
        let built = build_request(&html_payload(), &options).unwrap();
        let prompt = prompt_text(&built.backend);
        assert!(prompt.contains("using JavaScript"));
        assert!(!prompt.contains("Use TypeScript"));
    }
}

// --- Output contract ---

mod parser_tests {
    use super::*;

    #[test]
    fn valid_document_envelope_parses() {
        let result = parse_output(&document_envelope(), OutputShape::Document).unwrap();
        assert!(matches!(result.code, CodeOutput::Document(_)));
        assert_eq!(result.suggestions.len(), 3);
        assert_eq!(result.narrative, None);
    }

    #[test]
    fn valid_project_envelope_parses_with_narrative() {
        let result = parse_output(&project_envelope(), OutputShape::Project).unwrap();
        let files = result.code.files().unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].path, "index.html");
        assert_eq!(
            result.narrative.as_deref(),
            Some("Split the page into three files.")
        );
    }

    #[test]
    fn fenceless_response_is_treated_as_the_envelope() {
        let raw = json!({"code": "<html></html>", "suggestions": []}).to_string();
        let result = parse_output(&raw, OutputShape::Document).unwrap();
        assert!(matches!(result.code, CodeOutput::Document(_)));
    }

    #[test]
    fn blank_response_is_empty() {
        assert!(matches!(
            parse_output("  \n\t ", OutputShape::Document),
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[test]
    fn prose_without_json_is_malformed_not_raw_code() {
        let raw = "Sure! Here's a nice landing page for you.";
        assert!(matches!(
            parse_output(raw, OutputShape::Document),
            Err(GenerationError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn non_object_envelope_is_a_schema_violation() {
        assert!(matches!(
            parse_output("```json\n[1, 2, 3]\n```", OutputShape::Document),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn missing_keys_are_schema_violations() {
        let raw = format!("```json\n{}\n```", json!({"code": "<html></html>"}));
        assert!(matches!(
            parse_output(&raw, OutputShape::Document),
            Err(GenerationError::SchemaViolation(_))
        ));

        let raw = format!("```json\n{}\n```", json!({"suggestions": []}));
        assert!(matches!(
            parse_output(&raw, OutputShape::Document),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn file_entries_must_carry_path_and_content() {
        let raw = format!(
            "```json\n{}\n```",
            json!({"code": [{"path": "index.html"}], "suggestions": []})
        );
        assert!(matches!(
            parse_output(&raw, OutputShape::Project),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let raw = format!(
            "```json\n{}\n```",
            json!({
                "code": [
                    {"path": "index.html", "content": "a"},
                    {"path": "index.html", "content": "b"},
                ],
                "suggestions": [],
            })
        );
        let err = parse_output(&raw, OutputShape::Project).unwrap_err();
        match err {
            GenerationError::SchemaViolation(message) => {
                assert!(message.contains("duplicate file path"))
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn suggestions_must_be_strings() {
        let raw = format!(
            "```json\n{}\n```",
            json!({"code": "<html></html>", "suggestions": ["ok", 42]})
        );
        assert!(matches!(
            parse_output(&raw, OutputShape::Document),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn numeric_code_is_a_schema_violation() {
        let raw = format!(
            "```json\n{}\n```",
            json!({"code": 42, "suggestions": []})
        );
        assert!(matches!(
            parse_output(&raw, OutputShape::Document),
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_not_silently_coerced() {
        let err = parse_output(&document_envelope(), OutputShape::Project).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::UnexpectedShape {
                expected: OutputShape::Project,
                actual: OutputShape::Document,
            }
        ));

        let err = parse_output(&project_envelope(), OutputShape::Document).unwrap_err();
        assert!(matches!(err, GenerationError::UnexpectedShape { .. }));
    }

    #[test]
    fn parse_is_idempotent_on_valid_results() {
        let first = parse_output(&project_envelope(), OutputShape::Project).unwrap();
        let serialized = format!(
            "```json\n{}\n```",
            serde_json::to_string(&first).unwrap()
        );
        let second = parse_output(&serialized, OutputShape::Project).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn only_the_first_fenced_block_is_read() {
        let raw = format!(
            "{}\n```json\n{{\"code\": 1}}\n```",
            document_envelope()
        );
        let result = parse_output(&raw, OutputShape::Document).unwrap();
        assert_eq!(result.suggestions.len(), 3);
    }
}

// --- Orchestrator ---

mod orchestrator_tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn successful_generation_stores_result_and_switches_view() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::replying(&document_envelope());
        let options = GenerationOptions {
            framework: ScriptFramework::Html,
            custom_instructions: Some("Use a dark theme".into()),
            ..Default::default()
        };

        run_generation(&mut session, &backend, &options, None)
            .await
            .unwrap();

        let result = session.result().unwrap();
        assert!(matches!(result.code, CodeOutput::Document(_)));
        assert_eq!(result.suggestions.len(), 3);
        assert_eq!(session.output_view(), OutputView::Preview);
        assert_eq!(session.history().len(), 1);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn non_previewable_framework_stays_on_code_view() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::replying(&project_envelope());

        run_generation(
            &mut session,
            &backend,
            &options_for(ScriptFramework::React),
            None,
        )
        .await
        .unwrap();

        assert_eq!(session.output_view(), OutputView::Code);
        assert!(!session.is_result_previewable());
    }

    #[tokio::test]
    async fn missing_payload_fails_before_the_backend() {
        let mut session = GenerationSession::new();
        let backend = ScriptedBackend::new(Vec::new());

        let err = run_generation(
            &mut session,
            &backend,
            &GenerationOptions::default(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GenerationError::InputNotReady));
        assert_eq!(backend.call_count(), 0);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_one_error_and_no_result() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::failing("connection reset");

        let err = run_generation(
            &mut session,
            &backend,
            &options_for(ScriptFramework::Html),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GenerationError::BackendUnavailable(_)));
        assert!(session.result().is_none());
        assert!(session.error().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn malformed_response_leaves_no_partial_result() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::replying("I could not produce JSON, sorry.");

        let err = run_generation(
            &mut session,
            &backend,
            &options_for(ScriptFramework::Html),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GenerationError::MalformedEnvelope(_)));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn url_mode_enforces_the_project_shape() {
        let mut session = GenerationSession::new();
        session.set_payload(GenerationPayload::Url {
            url: "https://example.com".into(),
        });
        // Backend answers with a single document where a project is required.
        let backend = ScriptedBackend::replying(&document_envelope());

        let err = run_generation(
            &mut session,
            &backend,
            &options_for(ScriptFramework::Html),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GenerationError::UnexpectedShape { .. }));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn a_new_generation_resets_the_previous_state() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::new(vec![
            Ok(document_envelope()),
            Err(anyhow::anyhow!("quota exceeded")),
        ]);
        let options = options_for(ScriptFramework::Html);

        run_generation(&mut session, &backend, &options, None)
            .await
            .unwrap();
        assert!(session.result().is_some());

        let _ = run_generation(&mut session, &backend, &options, None).await;
        assert!(session.result().is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.output_view(), OutputView::Code);
    }

    #[tokio::test]
    async fn static_narration_is_sent_once_per_attempt() {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        let backend = ScriptedBackend::replying(&document_envelope());
        let (tx, mut rx) = unbounded_channel();

        run_generation(
            &mut session,
            &backend,
            &options_for(ScriptFramework::Html),
            Some(tx),
        )
        .await
        .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::Narration(
                "Refactoring HTML and generating code...".into()
            ))
        );
        assert!(rx.recv().await.is_none());
    }
}

// --- Refinement ---

mod refine_tests {
    use super::*;

    async fn seeded_session(backend: &ScriptedBackend, options: &GenerationOptions) -> GenerationSession {
        let mut session = GenerationSession::new();
        session.set_payload(html_payload());
        run_generation(&mut session, backend, options, None)
            .await
            .unwrap();
        session
    }

    fn refined_envelope(narrative: Option<&str>) -> String {
        let mut envelope = json!({
            "code": "<!DOCTYPE html><html><head></head><body>Hi v2</body></html>",
            "suggestions": ["Tighten the spacing."],
        });
        if let Some(narrative) = narrative {
            envelope["response"] = json!(narrative);
        }
        format!("```json\n{envelope}\n```")
    }

    #[tokio::test]
    async fn empty_message_is_a_no_op() {
        let options = options_for(ScriptFramework::Html);
        let backend = ScriptedBackend::replying(&document_envelope());
        let mut session = seeded_session(&backend, &options).await;
        let turns_before = session.history().len();

        run_refinement(&mut session, &backend, "   ", &options)
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 1); // only the original generation
        assert_eq!(session.history().len(), turns_before);
    }

    #[tokio::test]
    async fn refinement_without_a_prior_result_is_a_no_op() {
        let mut session = GenerationSession::new();
        let backend = ScriptedBackend::new(Vec::new());

        run_refinement(
            &mut session,
            &backend,
            "Make it blue",
            &GenerationOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(backend.call_count(), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn successful_refinement_replaces_the_result_and_extends_history() {
        let options = options_for(ScriptFramework::Html);
        let backend = ScriptedBackend::new(vec![
            Ok(document_envelope()),
            Ok(refined_envelope(Some("Centered the hero section."))),
        ]);
        let mut session = seeded_session(&backend, &options).await;

        run_refinement(&mut session, &backend, "Center the hero", &options)
            .await
            .unwrap();

        let result = session.result().unwrap();
        match &result.code {
            CodeOutput::Document(html) => assert!(html.contains("Hi v2")),
            other => panic!("expected a document, got {other:?}"),
        }
        assert_eq!(result.suggestions, vec!["Tighten the spacing.".to_string()]);

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "Center the hero");
        assert_eq!(history[1].text, "Centered the hero section.");
    }

    #[tokio::test]
    async fn omitted_narrative_falls_back_to_the_generic_acknowledgement() {
        let options = options_for(ScriptFramework::Html);
        let backend = ScriptedBackend::new(vec![
            Ok(document_envelope()),
            Ok(refined_envelope(None)),
        ]);
        let mut session = seeded_session(&backend, &options).await;

        run_refinement(&mut session, &backend, "Center the hero", &options)
            .await
            .unwrap();

        assert_eq!(
            session.history().last().unwrap().text,
            DEFAULT_ACKNOWLEDGEMENT
        );
    }

    #[tokio::test]
    async fn the_refine_prompt_carries_prior_code_and_history() {
        let options = options_for(ScriptFramework::Html);
        let backend = ScriptedBackend::new(vec![
            Ok(document_envelope()),
            Ok(refined_envelope(None)),
        ]);
        let mut session = seeded_session(&backend, &options).await;

        run_refinement(&mut session, &backend, "Center the hero", &options)
            .await
            .unwrap();

        let prompt = prompt_text(&backend.last_call());
        assert!(prompt.contains("PREVIOUS CODE"));
        assert!(prompt.contains("<body>Hi</body>"));
        assert!(prompt.contains("User: Center the hero"));
        assert!(prompt.contains("a single string of HTML"));
    }

    #[tokio::test]
    async fn failed_refinement_keeps_the_result_and_records_both_turns() {
        let options = options_for(ScriptFramework::Html);
        let backend = ScriptedBackend::new(vec![
            Ok(document_envelope()),
            Err(anyhow::anyhow!("rate limited")),
        ]);
        let mut session = seeded_session(&backend, &options).await;
        let result_before = session.result().cloned();
        let turns_before = session.history().len();

        let err = run_refinement(&mut session, &backend, "Center the hero", &options)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::BackendUnavailable(_)));
        assert_eq!(session.result().cloned(), result_before);
        assert_eq!(session.history().len(), turns_before + 2);
        assert_eq!(session.history()[turns_before].text, "Center the hero");
        assert!(
            session.history()[turns_before + 1]
                .text
                .contains("rate limited")
        );
        assert!(session.error().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn refinement_enforces_the_prior_shape() {
        let options = options_for(ScriptFramework::HtmlCssJs);
        let backend = ScriptedBackend::new(vec![
            Ok(project_envelope()),
            // Document where the prior result was a project.
            Ok(refined_envelope(None)),
        ]);
        let mut session = seeded_session(&backend, &options).await;

        let err = run_refinement(&mut session, &backend, "Flatten it", &options)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::UnexpectedShape { .. }));
        // The prior project result stays in place.
        assert!(matches!(
            session.result().unwrap().code,
            CodeOutput::Project(_)
        ));
    }
}
