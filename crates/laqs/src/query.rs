//! Query formatting
//!
//! Stored embeddings were generated from text laid out as
//! `Question: ...\nAnswer: ...`, so queries are wrapped in the same template
//! before embedding to land in the same region of the embedding space.

const QUESTION_PREFIX: &str = "Question: ";
const ANSWER_SUFFIX: &str = "\nAnswer: ";

/// Wrap a raw query in the question/answer template.
///
/// Already-formatted input is returned unchanged, so formatting twice is the
/// same as formatting once.
pub fn format_query(raw: &str) -> String {
  if is_formatted(raw) {
    return raw.to_string();
  }
  format!("{QUESTION_PREFIX}{raw}{ANSWER_SUFFIX}")
}

/// Format the query only when formatting is enabled
pub fn prepare_query(raw: &str, use_formatting: bool) -> String {
  if use_formatting {
    format_query(raw)
  } else {
    raw.to_string()
  }
}

fn is_formatted(text: &str) -> bool {
  text.len() >= QUESTION_PREFIX.len() + ANSWER_SUFFIX.len()
    && text.starts_with(QUESTION_PREFIX)
    && text.ends_with(ANSWER_SUFFIX)
}
