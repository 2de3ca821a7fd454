//! Hard-coded sample data backing the knowledge-base tools.

/// A document in the mock knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    /// Document title.
    pub title: &'static str,
    /// Document body.
    pub content: &'static str,
}

/// A company policy keyed by normalised topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Topic key (lowercase, underscores).
    pub topic: &'static str,
    /// Policy text.
    pub text: &'static str,
}

/// Documents searched by `kb_search`, in ranking order.
pub const DOCUMENTS: &[Document] = &[
    Document {
        title: "Onboarding Policy",
        content: "New employees must complete orientation within 30 days.",
    },
    Document {
        title: "Remote Work Policy",
        content: "Employees may work remotely up to 3 days per week.",
    },
    Document {
        title: "Vacation Policy",
        content: "Employees accrue 15 days of vacation per year.",
    },
    Document {
        title: "Expense Policy",
        content: "Expenses must be submitted within 30 days of purchase.",
    },
    Document {
        title: "Code Review Policy",
        content: "All code changes require at least one approval.",
    },
];

/// Policies served by `policy_lookup`.
pub const POLICIES: &[Policy] = &[
    Policy {
        topic: "onboarding",
        text: "New employees must complete orientation within 30 days. \
               Required documents: ID, bank info, emergency contact.",
    },
    Policy {
        topic: "remote_work",
        text: "Employees may work remotely up to 3 days per week. \
               Must be available during core hours (10am-3pm).",
    },
    Policy {
        topic: "vacation",
        text: "Employees accrue 15 days of vacation per year. \
               Maximum carryover: 5 days. Blackout periods apply.",
    },
    Policy {
        topic: "expense",
        text: "Expenses must be submitted within 30 days of purchase. \
               Approval required for amounts over $100.",
    },
    Policy {
        topic: "code_review",
        text: "All code changes require at least one approval. \
               Breaking changes require two approvals.",
    },
];

/// Finds a policy by its exact topic key.
#[must_use]
pub fn find_policy(topic: &str) -> Option<&'static Policy> {
    POLICIES.iter().find(|policy| policy.topic == topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_keys_are_normalised() {
        for policy in POLICIES {
            assert_eq!(policy.topic, policy.topic.to_lowercase());
            assert!(!policy.topic.contains(' '));
            assert!(!policy.topic.contains('-'));
        }
    }

    #[test]
    fn continuation_lines_keep_single_spaces() {
        let policy = find_policy("remote_work").unwrap();
        assert!(policy.text.contains("per week. Must be"));
    }
}
