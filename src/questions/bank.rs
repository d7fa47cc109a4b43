use crate::session::Difficulty;

/// A canned question with its fixed difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankEntry {
    pub question: &'static str,
    pub difficulty: Difficulty,
}

const ENTRIES: [BankEntry; 6] = [
    BankEntry {
        question: "What is the difference between let, const, and var in JavaScript?",
        difficulty: Difficulty::Easy,
    },
    BankEntry {
        question: "Explain how CSS Flexbox works and when you would use it.",
        difficulty: Difficulty::Easy,
    },
    BankEntry {
        question: "What are React hooks and why were they introduced? Give examples.",
        difficulty: Difficulty::Medium,
    },
    BankEntry {
        question: "How would you optimize website performance for faster loading?",
        difficulty: Difficulty::Medium,
    },
    BankEntry {
        question: "Explain the concept of closures in JavaScript with a practical example.",
        difficulty: Difficulty::Hard,
    },
    BankEntry {
        question: "Describe how you would implement authentication in a React/Node.js application.",
        difficulty: Difficulty::Hard,
    },
];

/// Network-independent question source used when the remote service
/// cannot be.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionBank;

impl QuestionBank {
    pub fn new() -> Self {
        Self
    }

    /// Entry for exchange `index`; out-of-range indices wrap to the first entry
    pub fn fallback_for(&self, index: usize) -> BankEntry {
        ENTRIES.get(index).copied().unwrap_or(ENTRIES[0])
    }

    pub fn len(&self) -> usize {
        ENTRIES.len()
    }

    pub fn is_empty(&self) -> bool {
        ENTRIES.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_escalates() {
        let bank = QuestionBank::new();
        let difficulties: Vec<Difficulty> =
            (0..bank.len()).map(|i| bank.fallback_for(i).difficulty).collect();

        assert_eq!(
            difficulties,
            vec![
                Difficulty::Easy,
                Difficulty::Easy,
                Difficulty::Medium,
                Difficulty::Medium,
                Difficulty::Hard,
                Difficulty::Hard,
            ]
        );
    }

    #[test]
    fn test_out_of_range_wraps_to_first() {
        let bank = QuestionBank::new();
        assert_eq!(bank.fallback_for(6), bank.fallback_for(0));
        assert_eq!(bank.fallback_for(usize::MAX), bank.fallback_for(0));
    }

    #[test]
    fn test_questions_are_distinct_and_non_empty() {
        let bank = QuestionBank::new();
        for i in 0..bank.len() {
            assert!(!bank.fallback_for(i).question.is_empty());
            for j in (i + 1)..bank.len() {
                assert_ne!(bank.fallback_for(i).question, bank.fallback_for(j).question);
            }
        }
    }
}
