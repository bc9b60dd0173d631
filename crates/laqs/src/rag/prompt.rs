//! Grounding context and prompt assembly for chat

use crate::record::ScoredResult;

const NOT_AVAILABLE: &str = "N/A";

/// Answer returned when retrieval finds nothing to ground on
pub const NO_SOURCES_ANSWER: &str = "I couldn't find any relevant LAQs to answer your question. \
   Please try rephrasing your query or upload more documents.";

/// Render the retrieved LAQs as numbered, separated context blocks
pub fn build_context(results: &[ScoredResult]) -> String {
  results.iter().map(render_block).collect::<Vec<_>>().join("\n\n---\n\n")
}

fn render_block(result: &ScoredResult) -> String {
  let record = &result.record;
  let mut block = format!(
    "LAQ #{} ({}) - {}\nMinister: {}\nQuestion: {}\nAnswer: {}",
    or_na(&record.laq_number),
    or_na(&record.laq_type),
    or_na(&record.date),
    or_na(&record.minister),
    or_na(&record.question),
    or_na(&record.answer),
  );
  if !record.attachments.is_empty() {
    block.push_str(&format!("\nAttachments: {}", record.attachments.join(", ")));
  }
  block.push_str(&format!("\nRelevance: {:.2}%", result.similarity));
  block
}

fn or_na(value: &str) -> &str {
  if value.trim().is_empty() {
    NOT_AVAILABLE
  } else {
    value
  }
}

/// Full instruction prompt for the LLM
pub fn build_chat_prompt(context: &str, question: &str) -> String {
  format!(
    "You answer questions about Legislative Assembly Questions (LAQs) using only the records below.\n\
     \n\
     Relevant LAQs, most relevant first:\n\
     \n\
     {context}\n\
     \n\
     ---\n\
     \n\
     Rules:\n\
     1. Use only facts stated in the LAQs above.\n\
     2. If they do not contain enough information, say which information is missing.\n\
     3. Cite LAQ numbers for every fact you use (for example \"LAQ #324 states ...\").\n\
     4. Be precise and brief; do not speculate.\n\
     5. Combine information when several LAQs are relevant.\n\
     6. Mention annexures or attachments when the answer refers to them.\n\
     7. Prefer LAQs with higher relevance when they disagree.\n\
     \n\
     Question: {question}\n\
     \n\
     Answer:"
  )
}
