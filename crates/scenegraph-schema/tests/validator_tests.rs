//! Gate-by-gate validator behaviour on realistic model output.

use scenegraph_schema::*;
use serde_json::{json, Value};

fn reason(doc: &Value) -> String {
    let verdict = Verdict::of(doc);
    assert!(!verdict.valid, "expected rejection for {doc}");
    verdict.reason
}

fn scenario() -> Value {
    json!({
        "meta": {"directed": true},
        "nodes": [
            {"id": "p1", "t": "player"},
            {"id": "p2", "t": "player"},
            {"id": "c1", "t": "character"},
            {"id": "team_radiant", "t": "team"},
            {"id": "e1", "t": "event"},
            {"id": "m1", "t": "message", "text": "where was the stun??"},
            {"id": "m2", "t": "message", "text": "you were out of range"}
        ],
        "edges": [
            {"s": "p1", "t": "c1", "r": "controls"},
            {"s": "c1", "t": "e1", "r": "participated_in"},
            {"s": "p1", "t": "m1", "r": "sent"},
            {"s": "m1", "t": "p2", "r": "targets"},
            {"s": "p2", "t": "m2", "r": "sent"},
            {"s": "m2", "t": "m1", "r": "replied_to"},
            {"s": "p1", "t": "p2", "r": "same_team"},
            {"s": "p1", "t": "team_radiant", "r": "prior_affiliation"},
            {"s": "e1", "t": "c1", "r": "occurred_near"},
            {"s": "p2", "t": "p1", "r": "prior_conflict"}
        ]
    })
}

#[test]
fn full_scenario_graph_is_accepted() {
    assert_eq!(validate_graph(&scenario()), Ok(()));
}

#[test]
fn minimal_graph_is_accepted() {
    let doc = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "p1", "t": "player"}],
        "edges": []
    });
    assert_eq!(Verdict::of(&doc), Verdict { valid: true, reason: "ok".to_string() });
}

#[test]
fn missing_edges_cites_required_key_set() {
    let doc = json!({"meta": {"directed": true}, "nodes": []});
    let r = reason(&doc);
    assert!(r.contains("'edges'") && r.contains("'meta'") && r.contains("'nodes'"), "{r}");
}

#[test]
fn duplicate_id_is_named() {
    let doc = json!({
        "meta": {"directed": true},
        "nodes": [
            {"id": "p1", "t": "player"},
            {"id": "x", "t": "team"},
            {"id": "p1", "t": "character"}
        ],
        "edges": []
    });
    assert_eq!(reason(&doc), "duplicate node id: p1");
}

#[test]
fn dangling_target_is_named() {
    let doc = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "p1", "t": "player"}],
        "edges": [{"s": "p1", "t": "ghost", "r": "targets"}]
    });
    assert_eq!(reason(&doc), "edge target id not found: ghost");
}

#[test]
fn dangling_source_is_checked_before_target() {
    let doc = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "p1", "t": "player"}],
        "edges": [{"s": "ghost", "t": "phantom", "r": "targets"}]
    });
    assert_eq!(reason(&doc), "edge source id not found: ghost");
}

#[test]
fn text_only_allowed_on_message_nodes() {
    let with_text = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "e1", "t": "event", "text": "foo"}],
        "edges": []
    });
    assert_eq!(reason(&with_text), "only message nodes may include text");

    let without_text = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "e1", "t": "event"}],
        "edges": []
    });
    assert_eq!(validate_graph(&without_text), Ok(()));
}

#[test]
fn unknown_node_type_is_named() {
    let doc = json!({
        "meta": {"directed": true},
        "nodes": [{"id": "h1", "t": "hero"}],
        "edges": []
    });
    assert_eq!(reason(&doc), "node type not allowed: hero");
}

#[test]
fn prompt_only_relations_fail_validation() {
    for rel in PROMPT_ONLY_RELATIONS {
        let doc = json!({
            "meta": {"directed": true},
            "nodes": [{"id": "a", "t": "event"}, {"id": "b", "t": "event"}],
            "edges": [{"s": "a", "t": "b", "r": rel}]
        });
        assert_eq!(reason(&doc), format!("edge relation not allowed: {rel}"));
    }
}

#[test]
fn node_and_edge_shape_gates() {
    let base = |nodes: Value, edges: Value| {
        json!({"meta": {"directed": false}, "nodes": nodes, "edges": edges})
    };

    assert_eq!(reason(&base(json!(["p1"]), json!([]))), "node is not an object");
    assert_eq!(reason(&base(json!([{"id": "p1"}]), json!([]))), "each node must have id and t");
    assert_eq!(
        reason(&base(json!([{"id": "p1", "t": "player"}]), json!([7]))),
        "edge is not an object"
    );
    assert_eq!(
        reason(&base(json!([{"id": "p1", "t": "player"}]), json!([{"s": "p1", "t": "p1"}]))),
        "each edge must have s, t, r"
    );
}

#[test]
fn every_single_gate_violation_is_specific() {
    let mut cases: Vec<(Value, &str)> = Vec::new();

    cases.push((json!([scenario()]), "not_an_object"));

    let mut doc = scenario();
    doc.as_object_mut().unwrap().remove("meta");
    cases.push((doc, "top_level_keys"));

    let mut doc = scenario();
    doc["meta"]["directed"] = json!(null);
    cases.push((doc, "directed_not_boolean"));

    let mut doc = scenario();
    doc["nodes"][3]["id"] = json!("");
    cases.push((doc, "node_id_invalid"));

    let mut doc = scenario();
    doc["nodes"][6]["id"] = json!("m1");
    cases.push((doc, "duplicate_node_id"));

    let mut doc = scenario();
    doc["nodes"][2]["text"] = json!("I am a character");
    cases.push((doc, "text_on_non_message"));

    let mut doc = scenario();
    doc["edges"][9]["r"] = json!("hates");
    cases.push((doc, "relation_not_allowed"));

    for (doc, code) in cases {
        let err = validate_graph(&doc).unwrap_err();
        assert_eq!(err.code(), code, "{err}");
        assert_ne!(err.to_string(), Verdict::OK);
    }
}

#[test]
fn verdicts_are_stable_across_calls() {
    let mut doc = scenario();
    doc["edges"][4]["t"] = json!("m9");
    let first = Verdict::of(&doc);
    for _ in 0..5 {
        assert_eq!(Verdict::of(&doc), first);
    }
    assert_eq!(first.reason, "edge target id not found: m9");
}
