//! Behaviour of the built-in tools through the public registry API.

use serde_json::json;
use simple_tools_mcp::error::ToolError;
use simple_tools_mcp::tools::{builtin_registry, ToolOutput, ToolRegistry};

fn registry() -> ToolRegistry {
    builtin_registry().expect("built-in tools register cleanly")
}

fn text(registry: &ToolRegistry, name: &str, arguments: serde_json::Value) -> String {
    match registry.invoke(name, &arguments).unwrap() {
        ToolOutput::Text(text) => text,
        other => panic!("expected text output, got {other:?}"),
    }
}

#[test]
fn add_matches_integer_addition() {
    let registry = registry();
    for a in [-1000_i64, -1, 0, 1, 999_999] {
        for b in [-77_i64, 0, 5, 1 << 40] {
            let output = registry.invoke("add", &json!({ "a": a, "b": b })).unwrap();
            assert_eq!(output, ToolOutput::Integer(i128::from(a) + i128::from(b)));
        }
    }
}

#[test]
fn add_is_not_bounded_by_i64() {
    let registry = registry();
    let output = registry
        .invoke("add", &json!({ "a": i64::MAX, "b": 1 }))
        .unwrap();
    assert_eq!(output, ToolOutput::Integer(9_223_372_036_854_775_808));

    let output = registry
        .invoke("add", &json!({ "a": u64::MAX, "b": 0 }))
        .unwrap();
    assert_eq!(output.to_string(), "18446744073709551615");
}

#[test]
fn echo_keeps_message_verbatim() {
    let registry = registry();
    for message in ["", "hello", "écho ✓", "multi\nline", "'quoted'"] {
        let reply = text(&registry, "echo", json!({ "message": message }));
        assert_eq!(reply.strip_prefix("echo: "), Some(message));
    }
}

#[test]
fn kb_search_onboarding() {
    let reply = text(&registry(), "kb_search", json!({ "query": "onboarding" }));
    assert!(reply.starts_with("Found 1 result(s) for 'onboarding':\n"));
    assert!(reply.contains("Onboarding Policy"));
    assert_eq!(reply.lines().count(), 2);
}

#[test]
fn kb_search_limit_two() {
    let reply = text(&registry(), "kb_search", json!({ "query": "policy", "limit": 2 }));
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines[0], "Found 2 result(s) for 'policy':");
    assert!(lines[1].starts_with("1. Onboarding Policy"));
    assert!(lines[2].starts_with("2. Remote Work Policy"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn kb_search_no_match() {
    assert_eq!(
        text(&registry(), "kb_search", json!({ "query": "zzz-no-match" })),
        "No results found for query: 'zzz-no-match'"
    );
}

#[test]
fn kb_search_limit_must_be_an_integer() {
    let err = registry()
        .invoke("kb_search", &json!({ "query": "policy", "limit": "two" }))
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgument { ref name, .. } if name == "limit"));
}

#[test]
fn policy_lookup_hit_and_miss() {
    let registry = registry();

    assert_eq!(
        text(&registry, "policy_lookup", json!({ "topic": "Remote Work" })),
        "Policy for 'Remote Work': Employees may work remotely up to 3 days per week. \
         Must be available during core hours (10am-3pm)."
    );

    let miss = text(&registry, "policy_lookup", json!({ "topic": "nonexistent" }));
    assert!(miss.contains("No policy found for topic: 'nonexistent'."));
    assert!(miss.ends_with(
        "Available topics: onboarding, remote_work, vacation, expense, code_review"
    ));
}

#[test]
fn policy_lookup_requires_topic() {
    let err = registry().invoke("policy_lookup", &json!({})).unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgument { ref name, .. } if name == "topic"));
}

#[test]
fn unknown_tool_is_reported() {
    let err = registry().invoke("subtract", &json!({ "a": 1, "b": 1 })).unwrap_err();
    assert_eq!(
        err,
        ToolError::UnknownTool {
            name: "subtract".to_string()
        }
    );
}

#[test]
fn identical_calls_give_identical_results() {
    let registry = registry();
    let calls = [
        ("add", json!({ "a": 4, "b": 5 })),
        ("echo", json!({ "message": "same" })),
        ("kb_search", json!({ "query": "days" })),
        ("policy_lookup", json!({ "topic": "vacation" })),
    ];

    for (name, arguments) in &calls {
        let first = registry.invoke(name, arguments).unwrap();
        let second = registry.invoke(name, arguments).unwrap();
        assert_eq!(first, second, "{name} changed between calls");
    }
}
