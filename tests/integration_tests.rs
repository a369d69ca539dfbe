//! Integration tests across the workspace crates
//!
//! These tests exercise the whole path from an input record to an outcome
//! line without a network backend:
//! - record → payload → request turns → MockGenerator → classify
//! - outcome lines → file → reclassify
//!
//! Run with: cargo test --test integration_tests

use std::cell::Cell;
use std::fs;

use serde_json::{json, Value};
use tempfile::tempdir;

use scenegraph_llm::{
    graph_request, render_transcript, GenerateError, GraphGenerator, Message, MockGenerator,
    ScenePayload, GRAPH_SYSTEM_PROMPT,
};
use scenegraph_schema::{validate_graph, Graph, NodeType, Outcome, ParseMode, Relation};

fn scene_record() -> Value {
    json!({
        "image": "shots/0042.png",
        "ocr_text": "[All] riki_main: ez",
        "generated": {
            "scene_description": "post-fight chat",
            "match_context": "ranked all pick",
            "messages": [
                {"speaker": "riki_main", "target": null, "text": "ez"},
                {"speaker": "cm_sup", "target": "riki_main", "text": "report riki"},
                {"speaker": "riki_main", "target": "cm_sup", "text": "?"}
            ],
            "confidence": 0.8
        }
    })
}

// ============================================================================
// Record → graph
// ============================================================================

#[test]
fn test_record_to_accepted_graph_via_mock() {
    let record = scene_record();
    let payload = ScenePayload::from_record(&record);
    let messages = graph_request(&payload).unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, GRAPH_SYSTEM_PROMPT);
    assert!(!messages[1].content.contains("confidence"));

    let raw = MockGenerator::new().generate(&messages, 700).unwrap();
    let outcome = Outcome::classify(record["image"].clone(), &raw, ParseMode::Strict);
    assert!(outcome.is_accepted());

    let Outcome::Accepted { graph, .. } = &outcome else {
        unreachable!()
    };
    let summary = Graph::from_document(graph).unwrap().summary();
    assert_eq!(summary.node_types[&NodeType::Player], 2);
    assert_eq!(summary.node_types[&NodeType::Message], 3);
    assert_eq!(summary.relations[&Relation::Sent], 3);
    assert_eq!(summary.relations[&Relation::Targets], 2);

    let line: Value = serde_json::from_str(&outcome.to_line().unwrap()).unwrap();
    assert_eq!(line["image"], "shots/0042.png");
    assert_eq!(line.as_object().unwrap().len(), 2);
}

/// Answers with a fixed text, whatever it is asked.
struct Canned {
    text: &'static str,
    calls: Cell<usize>,
}

impl GraphGenerator for Canned {
    fn generate(&self, _messages: &[Message], _max_tokens: u32) -> Result<String, GenerateError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.text.to_string())
    }

    fn describe(&self) -> String {
        "canned".to_string()
    }
}

#[test]
fn test_unusable_replies_become_rejection_records() {
    let cases = [
        ("Sorry, I can't do that.", "graph_json_parse_failed", None),
        (
            r#"{"meta":{"directed":true},"nodes":[{"id":"e1","t":"event","text":"rosh"}],"edges":[]}"#,
            "graph_schema_invalid",
            Some("only message nodes may include text"),
        ),
        (
            r#"{"meta":{"directed":true},"nodes":[{"id":"p1","t":"player"},{"id":"x","t":"event"}],"edges":[{"s":"x","t":"p1","r":"caused"}]}"#,
            "graph_schema_invalid",
            Some("edge relation not allowed: caused"),
        ),
    ];

    for (text, error, reason) in cases {
        let generator = Canned {
            text,
            calls: Cell::new(0),
        };
        let messages = graph_request(&ScenePayload::from_record(&scene_record())).unwrap();
        let raw = generator.generate(&messages, 700).unwrap();
        let outcome = Outcome::classify(json!("shots/0042.png"), &raw, ParseMode::Strict);

        assert_eq!(generator.calls.get(), 1);
        assert_eq!(outcome.error(), Some(error), "{text}");
        let line: Value = serde_json::from_str(&outcome.to_line().unwrap()).unwrap();
        match reason {
            Some(reason) => {
                assert_eq!(line["reason"], reason);
                assert_eq!(line["raw_graph"], serde_json::from_str::<Value>(text).unwrap());
            }
            None => assert_eq!(line["raw"], text),
        }
    }
}

#[test]
fn test_prompt_transcript_is_stable() {
    let messages = graph_request(&ScenePayload::default()).unwrap();
    let transcript = render_transcript(&messages);
    assert!(transcript.starts_with("[SYSTEM]\n"));
    assert!(transcript.contains(
        "[USER]\n{\"scene_description\":\"\",\"match_context\":\"\",\"messages\":[]}\n"
    ));
    assert!(transcript.ends_with("[ASSISTANT]\n"));
}

// ============================================================================
// Outcome files
// ============================================================================

#[test]
fn test_outcome_file_roundtrip_and_reclassify() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graphs.jsonl");

    let generator = MockGenerator::new();
    let mut lines = Vec::new();
    for record in [scene_record(), json!({"image": "shots/0043.png"})] {
        let messages = graph_request(&ScenePayload::from_record(&record)).unwrap();
        let raw = generator.generate(&messages, 700).unwrap();
        let outcome = Outcome::classify(record["image"].clone(), &raw, ParseMode::Strict);
        lines.push(outcome.to_line().unwrap());
    }
    let fenced = "```json\n{\"meta\":{\"directed\":true},\"nodes\":[],\"edges\":[]}\n```";
    let parse_failure = Outcome::parse_failed(json!("shots/0044.png"), fenced);
    lines.push(parse_failure.to_line().unwrap());
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let reread: Vec<Outcome> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(reread.len(), 3);
    assert!(reread[0].is_accepted() && reread[1].is_accepted());
    assert!(!reread[2].is_accepted());

    let strict: Vec<bool> = reread
        .iter()
        .cloned()
        .map(|o| o.reclassify(ParseMode::Strict).is_accepted())
        .collect();
    assert_eq!(strict, [true, true, false]);

    let lenient = reread[2].clone().reclassify(ParseMode::Lenient);
    assert!(lenient.is_accepted());
    assert_eq!(lenient.image(), &json!("shots/0044.png"));
}

#[test]
fn test_accepted_graphs_stay_valid_after_rewrite() {
    let graph = MockGenerator::graph_for(&ScenePayload::from_record(&scene_record()));
    let doc = graph.to_document().unwrap();
    let text = serde_json::to_string_pretty(&doc).unwrap();
    let reparsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(validate_graph(&reparsed), Ok(()));
    assert_eq!(Graph::from_document(&reparsed).unwrap(), graph);
}
