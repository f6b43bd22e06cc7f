//! Unified context: memory results merged into one labeled text block.

use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, RecordContent};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

/// One labeled section of a unified context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSection {
    /// Source kind; decides the heading and position
    pub kind: MemoryKind,
    /// Weight the section was queried with
    pub weight: f32,
    /// Kept results, relevance descending
    pub items: Vec<MemoryQueryResult>,
}

impl ContextSection {
    /// Build a section.
    #[must_use]
    pub fn new(kind: MemoryKind, weight: f32, items: Vec<MemoryQueryResult>) -> Self {
        Self { kind, weight, items }
    }

    fn render(&self) -> String {
        let mut out = String::from(self.kind.heading());
        for (index, item) in self.items.iter().enumerate() {
            out.push('\n');
            out.push_str(&render_item(self.kind, index + 1, &item.record));
        }
        out
    }
}

/// Ordered sections plus the character budget they were fitted to.
///
/// A budget of zero means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedContext {
    sections: Vec<ContextSection>,
    char_budget: usize,
}

impl UnifiedContext {
    /// Arrange sections in kind order, drop empty ones and fit the budget.
    ///
    /// While the rendered text is too long, the last item of the
    /// lowest-weighted section holding more than one item is dropped. Once
    /// every section is down to one item, whole sections go, lowest weight
    /// first, until one remains. [`render`](Self::render) cuts whatever is
    /// still over the budget.
    #[must_use]
    pub fn new(mut sections: Vec<ContextSection>, char_budget: usize) -> Self {
        sections.retain(|s| !s.items.is_empty());
        sections.sort_by_key(|s| s.kind);

        let mut context = Self {
            sections,
            char_budget,
        };
        context.fit();
        context
    }

    /// An empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sections in render order.
    #[must_use]
    pub fn sections(&self) -> &[ContextSection] {
        &self.sections
    }

    /// Section for one kind, if present.
    #[must_use]
    pub fn section(&self, kind: MemoryKind) -> Option<&ContextSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Whether nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total kept items across sections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Render to text, never longer than the budget in characters.
    #[must_use]
    pub fn render(&self) -> String {
        let full = self.render_full();
        if self.char_budget == 0 || full.chars().count() <= self.char_budget {
            return full;
        }
        full.chars().take(self.char_budget).collect()
    }

    fn render_full(&self) -> String {
        self.sections
            .iter()
            .map(ContextSection::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn over_budget(&self) -> bool {
        self.char_budget > 0 && self.render_full().chars().count() > self.char_budget
    }

    // lowest weight wins, ties go to the later kind
    fn lowest_weighted(&self, eligible: impl Fn(&ContextSection) -> bool) -> Option<usize> {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| eligible(s))
            .min_by(|(ia, a), (ib, b)| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(index, _)| index)
    }

    fn fit(&mut self) {
        let mut dropped_items = 0;
        while self.over_budget() {
            let Some(index) = self.lowest_weighted(|s| s.items.len() > 1) else {
                break;
            };
            self.sections[index].items.pop();
            dropped_items += 1;
        }

        let mut dropped_sections = 0;
        while self.sections.len() > 1 && self.over_budget() {
            let Some(index) = self.lowest_weighted(|_| true) else {
                break;
            };
            self.sections.remove(index);
            dropped_sections += 1;
        }

        if dropped_items > 0 || dropped_sections > 0 {
            debug!(
                dropped_items = dropped_items,
                dropped_sections = dropped_sections,
                budget = self.char_budget,
                "Unified context trimmed to budget"
            );
        }
    }
}

fn render_item(kind: MemoryKind, position: usize, record: &MemoryRecord) -> String {
    match kind {
        MemoryKind::Recency => render_turn(record),
        MemoryKind::Similarity => format!("Document {position}: {}", plain_text(record)),
        MemoryKind::LongTermHistory => {
            format!("Past Conversation {position}:\n{}", render_turn(record))
        }
        MemoryKind::WorkflowGraph => render_procedure(record),
    }
}

fn plain_text(record: &MemoryRecord) -> String {
    record.content.search_text()
}

/// `User:`/`Assistant:` lines for a structured exchange, or a role-prefixed
/// line for a single text turn.
fn render_turn(record: &MemoryRecord) -> String {
    let user = record.content.field("user_message");
    let assistant = record.content.field("assistant_message");
    if user.is_some() || assistant.is_some() {
        let mut lines = Vec::new();
        if let Some(user) = user {
            lines.push(format!("User: {user}"));
        }
        if let Some(assistant) = assistant {
            lines.push(format!("Assistant: {assistant}"));
        }
        return lines.join("\n");
    }

    match record.metadata.get("role").and_then(serde_json::Value::as_str) {
        Some("user") => format!("User: {}", plain_text(record)),
        Some("assistant") => format!("Assistant: {}", plain_text(record)),
        _ => plain_text(record),
    }
}

fn render_procedure(record: &MemoryRecord) -> String {
    let RecordContent::Structured(value) = &record.content else {
        return plain_text(record);
    };

    let mut out = String::new();
    if let Some(name) = value.get("name").and_then(serde_json::Value::as_str) {
        let _ = write!(out, "Procedure: {name}");
    }
    if let Some(description) = value.get("description").and_then(serde_json::Value::as_str) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(description);
    }
    let steps = value
        .get("steps")
        .and_then(serde_json::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (index, step) in steps.iter().enumerate() {
        let text = step
            .as_str()
            .or_else(|| step.get("description").and_then(serde_json::Value::as_str))
            .unwrap_or_default();
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "Step {}: {text}", index + 1);
    }

    if out.is_empty() {
        plain_text(record)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewRecord;
    use serde_json::json;

    fn hit(key: &str, entry: NewRecord, relevance: f32) -> MemoryQueryResult {
        MemoryQueryResult::new(MemoryRecord::from_new(key, entry), relevance)
    }

    fn text_hits(prefix: &str, count: usize) -> Vec<MemoryQueryResult> {
        (0..count)
            .map(|i| {
                hit(
                    &format!("{prefix}-{i}"),
                    NewRecord::new(format!("{prefix} snippet number {i}")),
                    1.0 - i as f32 * 0.1,
                )
            })
            .collect()
    }

    #[test]
    fn test_sections_follow_kind_order() {
        let context = UnifiedContext::new(
            vec![
                ContextSection::new(MemoryKind::WorkflowGraph, 1.0, text_hits("w", 1)),
                ContextSection::new(MemoryKind::Similarity, 1.0, text_hits("s", 1)),
                ContextSection::new(MemoryKind::LongTermHistory, 1.0, Vec::new()),
            ],
            0,
        );
        let kinds: Vec<_> = context.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![MemoryKind::Similarity, MemoryKind::WorkflowGraph]);

        let text = context.render();
        let doc = text.find("## Relevant Document Information").unwrap();
        let proc_ = text.find("## Relevant Procedure").unwrap();
        assert!(doc < proc_);
        assert!(!text.contains("## Similar Past Conversations"));
    }

    #[test]
    fn test_render_turns_and_documents() {
        let context = UnifiedContext::new(
            vec![
                ContextSection::new(
                    MemoryKind::Recency,
                    1.0,
                    vec![hit(
                        "r",
                        NewRecord::new("Is nausea normal?").with_metadata("role", "user"),
                        1.0,
                    )],
                ),
                ContextSection::new(
                    MemoryKind::LongTermHistory,
                    0.5,
                    vec![hit(
                        "h",
                        NewRecord::structured(json!({
                            "user_message": "missed a dose",
                            "assistant_message": "take it when you remember"
                        })),
                        0.5,
                    )],
                ),
                ContextSection::new(
                    MemoryKind::Similarity,
                    1.0,
                    vec![hit("d", NewRecord::new("Nausea fades after weeks."), 0.9)],
                ),
            ],
            0,
        );

        let text = context.render();
        assert!(text.contains("## Recent Conversation Context\nUser: Is nausea normal?"));
        assert!(text.contains("Document 1: Nausea fades after weeks."));
        assert!(text.contains(
            "Past Conversation 1:\nUser: missed a dose\nAssistant: take it when you remember"
        ));
    }

    #[test]
    fn test_render_procedure_steps() {
        let context = UnifiedContext::new(
            vec![ContextSection::new(
                MemoryKind::WorkflowGraph,
                1.0,
                vec![hit(
                    "p",
                    NewRecord::structured(json!({
                        "name": "Injection",
                        "description": "Weekly pen injection",
                        "steps": ["Clean the site", {"description": "Inject slowly"}]
                    })),
                    1.0,
                )],
            )],
            0,
        );
        let text = context.render();
        assert!(text.contains("Procedure: Injection\nWeekly pen injection"));
        assert!(text.contains("Step 1: Clean the site\nStep 2: Inject slowly"));
    }

    #[test]
    fn test_budget_drops_items_from_lowest_weight_first() {
        let sections = vec![
            ContextSection::new(MemoryKind::Similarity, 1.0, text_hits("s", 3)),
            ContextSection::new(MemoryKind::LongTermHistory, 0.5, text_hits("h", 3)),
        ];
        let unlimited = UnifiedContext::new(sections.clone(), 0);
        let full_len = unlimited.render().chars().count();

        let context = UnifiedContext::new(sections, full_len - 10);
        assert_eq!(context.section(MemoryKind::Similarity).unwrap().items.len(), 3);
        assert_eq!(context.section(MemoryKind::LongTermHistory).unwrap().items.len(), 2);
        assert!(context.render().chars().count() <= full_len - 10);
    }

    #[test]
    fn test_budget_drops_sections_then_cuts() {
        let context = UnifiedContext::new(
            vec![
                ContextSection::new(MemoryKind::Similarity, 1.0, text_hits("s", 3)),
                ContextSection::new(MemoryKind::WorkflowGraph, 0.2, text_hits("w", 3)),
            ],
            20,
        );
        assert_eq!(context.sections().len(), 1);
        assert_eq!(context.sections()[0].kind, MemoryKind::Similarity);
        assert_eq!(context.sections()[0].items.len(), 1);
        assert_eq!(context.render().chars().count(), 20);
    }

    #[test]
    fn test_cut_respects_char_boundaries() {
        let context = UnifiedContext::new(
            vec![ContextSection::new(
                MemoryKind::Similarity,
                1.0,
                vec![hit("d", NewRecord::new("náuseas náuseas náuseas"), 1.0)],
            )],
            47,
        );
        let text = context.render();
        assert_eq!(text.chars().count(), 47);
        assert!(text.ends_with("ná"));
    }

    #[test]
    fn test_empty() {
        let context = UnifiedContext::new(Vec::new(), 100);
        assert!(context.is_empty());
        assert_eq!(context.render(), "");
        assert_eq!(context.item_count(), 0);
    }
}
