//! The four sample tools: `add`, `echo`, `kb_search` and `policy_lookup`.

use serde_json::json;

use crate::error::{ToolError, ToolResult};
use crate::tools::fixtures::{find_policy, DOCUMENTS, POLICIES};
use crate::tools::registry::{
    ParamSpec, ParamType, ToolArguments, ToolDefinition, ToolOutput, ToolRegistry,
};

/// Default number of candidate documents considered by `kb_search`.
pub const DEFAULT_SEARCH_LIMIT: i64 = 5;

/// Registers all built-in tools in their advertised order.
///
/// # Errors
///
/// Returns [`ToolError::DuplicateName`] if any of the names is already taken.
pub fn register_builtins(registry: &mut ToolRegistry) -> ToolResult<()> {
    registry.register(
        ToolDefinition::new("add", "Add two numbers together.")
            .param(ParamSpec::required("a", ParamType::Integer, "First addend"))
            .param(ParamSpec::required("b", ParamType::Integer, "Second addend")),
        add,
    )?;

    registry.register(
        ToolDefinition::new("echo", "Echo back the provided message.").param(
            ParamSpec::required("message", ParamType::String, "The message to echo"),
        ),
        echo,
    )?;

    registry.register(
        ToolDefinition::new(
            "kb_search",
            "Search the knowledge base for relevant documents. \
             Returns a formatted string with search results.",
        )
        .param(ParamSpec::required(
            "query",
            ParamType::String,
            "The search query string",
        ))
        .param(ParamSpec::optional(
            "limit",
            ParamType::Integer,
            "Maximum number of results to return (default: 5)",
            json!(DEFAULT_SEARCH_LIMIT),
        )),
        kb_search,
    )?;

    registry.register(
        ToolDefinition::new(
            "policy_lookup",
            "Look up company policies by topic. \
             Returns the policy content for the given topic.",
        )
        .param(ParamSpec::required(
            "topic",
            ParamType::String,
            "The policy topic to look up",
        )),
        policy_lookup,
    )?;

    Ok(())
}

fn add(args: &ToolArguments) -> ToolResult<ToolOutput> {
    // Both operands lie within the 64-bit ranges, so the i128 sum is exact.
    let a = args.integer("a")?;
    let b = args.integer("b")?;
    Ok(ToolOutput::Integer(a + b))
}

fn echo(args: &ToolArguments) -> ToolResult<ToolOutput> {
    Ok(ToolOutput::Text(echo_message(args.string("message")?)))
}

fn kb_search(args: &ToolArguments) -> ToolResult<ToolOutput> {
    let query = args.string("query")?;
    let limit = args.integer("limit")?;
    if limit < 1 {
        return Err(ToolError::invalid_argument(
            "limit",
            format!("must be a positive integer, got {limit}"),
        ));
    }
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    Ok(ToolOutput::Text(search_documents(query, limit)))
}

fn policy_lookup(args: &ToolArguments) -> ToolResult<ToolOutput> {
    Ok(ToolOutput::Text(lookup_policy(args.string("topic")?)))
}

/// Prefixes a message with `echo: `.
#[must_use]
pub fn echo_message(message: &str) -> String {
    format!("echo: {message}")
}

/// Case-insensitive substring search over the first `limit` documents.
///
/// The candidate pool is cut to `limit` before filtering, and each hit keeps
/// its 1-based position in that pool as its number.
#[must_use]
pub fn search_documents(query: &str, limit: usize) -> String {
    let needle = query.to_lowercase();

    let hits: Vec<String> = DOCUMENTS
        .iter()
        .take(limit)
        .enumerate()
        .filter(|(_, doc)| {
            doc.title.to_lowercase().contains(&needle)
                || doc.content.to_lowercase().contains(&needle)
        })
        .map(|(i, doc)| format!("{}. {}: {}", i + 1, doc.title, doc.content))
        .collect();

    if hits.is_empty() {
        return format!("No results found for query: '{query}'");
    }

    format!(
        "Found {} result(s) for '{query}':\n{}",
        hits.len(),
        hits.join("\n")
    )
}

/// Maps a free-form topic onto a policy key.
#[must_use]
pub fn normalise_topic(topic: &str) -> String {
    topic.to_lowercase().replace([' ', '-'], "_")
}

/// Looks up a policy, echoing the caller's original topic in the reply.
#[must_use]
pub fn lookup_policy(topic: &str) -> String {
    if let Some(policy) = find_policy(&normalise_topic(topic)) {
        return format!("Policy for '{topic}': {}", policy.text);
    }

    let available: Vec<&str> = POLICIES.iter().map(|p| p.topic).collect();
    format!(
        "No policy found for topic: '{topic}'. Available topics: {}",
        available.join(", ")
    )
}
