//! Question bank collaborator: owns the board of questions the game is
//! played over. The engine only ever borrows the active question and the
//! remaining count; resolution marks flow back through
//! [`QuestionBank::mark_resolved`].

use std::{collections::HashSet, fs, io::ErrorKind, path::Path, sync::RwLock};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{dto::board::BoardEntry, state::game::Question};

/// Seam between the engine and whatever supplies questions. Implementations
/// must be shareable across the event loop and the admin channel.
pub trait QuestionBank: Send + Sync {
    /// Unresolved questions left on the board.
    fn remaining(&self) -> usize;
    /// Fetch a question by board key, resolved or not.
    fn question(&self, id: u32) -> Option<Question>;
    /// Whether the question has already been played.
    fn is_resolved(&self, id: u32) -> bool;
    /// Mark a question played. Returns false for unknown keys.
    fn mark_resolved(&self, id: u32) -> bool;
    /// Restore every question for a rematch.
    fn reset(&self);
    /// Snapshot of all board cells in display order.
    fn board(&self) -> Vec<BoardEntry>;
}

#[derive(Debug, Default)]
struct BankInner {
    questions: IndexMap<u32, Question>,
    resolved: HashSet<u32>,
}

/// In-memory [`QuestionBank`] seeded from a question file or the built-in
/// sample board.
#[derive(Debug, Default)]
pub struct MemoryBank {
    inner: RwLock<BankInner>,
}

impl MemoryBank {
    /// Build a bank from questions in display order; board keys are the
    /// zero-based positions.
    pub fn new(questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .enumerate()
            .map(|(index, question)| (index as u32, question))
            .collect();
        Self {
            inner: RwLock::new(BankInner {
                questions,
                resolved: HashSet::new(),
            }),
        }
    }

    /// Load a question file from disk, falling back to the built-in sample
    /// board when the file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<QuestionFile>(&contents) {
                Ok(file) => {
                    let bank = Self::from(file);
                    info!(
                        path = %path.display(),
                        count = bank.inner.read().expect("bank lock poisoned").questions.len(),
                        "loaded question board"
                    );
                    bank
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse question file; using the sample board"
                    );
                    Self::new(sample_board())
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "question file not found; using the sample board"
                );
                Self::new(sample_board())
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read question file; using the sample board"
                );
                Self::new(sample_board())
            }
        }
    }
}

impl QuestionBank for MemoryBank {
    fn remaining(&self) -> usize {
        let inner = self.inner.read().expect("bank lock poisoned");
        inner.questions.len() - inner.resolved.len()
    }

    fn question(&self, id: u32) -> Option<Question> {
        let inner = self.inner.read().expect("bank lock poisoned");
        inner.questions.get(&id).cloned()
    }

    fn is_resolved(&self, id: u32) -> bool {
        let inner = self.inner.read().expect("bank lock poisoned");
        inner.resolved.contains(&id)
    }

    fn mark_resolved(&self, id: u32) -> bool {
        let mut inner = self.inner.write().expect("bank lock poisoned");
        if !inner.questions.contains_key(&id) {
            return false;
        }
        inner.resolved.insert(id);
        true
    }

    fn reset(&self) {
        let mut inner = self.inner.write().expect("bank lock poisoned");
        inner.resolved.clear();
    }

    fn board(&self) -> Vec<BoardEntry> {
        let inner = self.inner.read().expect("bank lock poisoned");
        inner
            .questions
            .iter()
            .map(|(id, question)| BoardEntry {
                id: *id,
                value: question.value,
                resolved: inner.resolved.contains(id),
            })
            .collect()
    }
}

/// JSON representation of a question file.
#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<RawQuestion>,
}

/// JSON representation of a single question.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
    answer: String,
    value: i64,
}

impl From<QuestionFile> for MemoryBank {
    fn from(value: QuestionFile) -> Self {
        Self::new(
            value
                .questions
                .into_iter()
                .map(|raw| Question {
                    text: raw.text,
                    answer: raw.answer,
                    value: raw.value,
                })
                .collect(),
        )
    }
}

/// Small board shipped with the binary so a bare checkout is playable.
fn sample_board() -> Vec<Question> {
    [
        ("Which planet is closest to the sun?", "Mercury", 100),
        ("How many strings does a violin have?", "Four", 100),
        ("Which element has the symbol Fe?", "Iron", 200),
        ("In which year did the Berlin Wall fall?", "1989", 200),
        ("Who wrote 'The Master and Margarita'?", "Bulgakov", 300),
        ("What is the capital of New Zealand?", "Wellington", 300),
    ]
    .into_iter()
    .map(|(text, answer, value)| Question {
        text: text.into(),
        answer: answer.into(),
        value,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_resolved_shrinks_remaining() {
        let bank = MemoryBank::new(sample_board());
        let total = bank.remaining();
        assert!(total > 0);

        assert!(bank.mark_resolved(0));
        assert!(bank.is_resolved(0));
        assert_eq!(bank.remaining(), total - 1);

        // Re-marking is idempotent; unknown keys are rejected.
        assert!(bank.mark_resolved(0));
        assert_eq!(bank.remaining(), total - 1);
        assert!(!bank.mark_resolved(999));
    }

    #[test]
    fn reset_restores_the_board() {
        let bank = MemoryBank::new(sample_board());
        let total = bank.remaining();
        bank.mark_resolved(0);
        bank.mark_resolved(1);

        bank.reset();
        assert_eq!(bank.remaining(), total);
        assert!(!bank.is_resolved(0));
    }

    #[test]
    fn board_preserves_display_order() {
        let bank = MemoryBank::new(sample_board());
        bank.mark_resolved(2);

        let entries = bank.board();
        let ids: Vec<u32> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, (0..entries.len() as u32).collect::<Vec<_>>());
        assert!(entries[2].resolved);
        assert!(!entries[0].resolved);
    }

    #[test]
    fn question_file_parses() {
        let json = r#"{
            "questions": [
                { "text": "q", "answer": "a", "value": 100 }
            ]
        }"#;
        let file: QuestionFile = serde_json::from_str(json).unwrap();
        let bank = MemoryBank::from(file);
        assert_eq!(bank.remaining(), 1);
        assert_eq!(bank.question(0).unwrap().answer, "a");
    }
}
