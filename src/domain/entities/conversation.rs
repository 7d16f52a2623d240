use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only transcript of a chat session.
///
/// Turns are never removed or reordered. The only mutation allowed on an
/// existing turn is settling a pending user turn as answered or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    turns: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a pending user turn and returns its index.
    pub fn push_question(&mut self, text: impl Into<String>) -> usize {
        self.push(ChatTurn::new(TurnRole::User, text, TurnStatus::Pending))
    }

    /// Marks the question answered and appends the reply after it.
    ///
    /// Returns `None` without appending when `question` is not a pending user
    /// turn.
    pub fn push_answer(&mut self, question: usize, text: impl Into<String>) -> Option<usize> {
        if !self.settle(question, TurnStatus::Answered) {
            return None;
        }
        Some(self.push(ChatTurn::new(TurnRole::Assistant, text, TurnStatus::Answered)))
    }

    pub fn mark_failed(&mut self, question: usize) {
        self.settle(question, TurnStatus::Failed);
    }

    /// Fails every user turn still awaiting an answer. Returns how many.
    pub fn fail_pending(&mut self) -> usize {
        let pending: Vec<usize> = self
            .turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TurnStatus::Pending)
            .map(|(i, _)| i)
            .collect();

        for &index in &pending {
            self.settle(index, TurnStatus::Failed);
        }
        pending.len()
    }

    /// Question/answer pairs that completed successfully, oldest first.
    pub fn answered_exchanges(&self) -> Vec<(&ChatTurn, &ChatTurn)> {
        self.turns
            .windows(2)
            .filter_map(|pair| match pair {
                [q, a]
                    if q.role == TurnRole::User
                        && q.status == TurnStatus::Answered
                        && a.role == TurnRole::Assistant =>
                {
                    Some((q, a))
                }
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, turn: ChatTurn) -> usize {
        self.turns.push(turn);
        self.updated_at = Utc::now();
        self.turns.len() - 1
    }

    fn settle(&mut self, index: usize, status: TurnStatus) -> bool {
        match self.turns.get_mut(index) {
            Some(turn) if turn.role == TurnRole::User && turn.status == TurnStatus::Pending => {
                turn.status = status;
                self.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
    pub status: TurnStatus,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: TurnRole, text: impl Into<String>, status: TurnStatus) -> Self {
        Self {
            role,
            text: text.into(),
            status,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Answered,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_settles_question() {
        let mut conv = Conversation::new();
        let q = conv.push_question("What is covered?");
        assert_eq!(conv.turns()[q].status, TurnStatus::Pending);

        assert_eq!(conv.push_answer(q, "Solvency ratios."), Some(1));

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.turns()[0].status, TurnStatus::Answered);
        assert_eq!(conv.turns()[1].role, TurnRole::Assistant);
        assert_eq!(conv.answered_exchanges().len(), 1);
    }

    #[test]
    fn test_failed_question_is_kept_but_not_exchanged() {
        let mut conv = Conversation::new();
        let q = conv.push_question("Anything?");
        conv.mark_failed(q);

        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0].status, TurnStatus::Failed);
        assert!(conv.answered_exchanges().is_empty());
        assert_eq!(conv.turns()[0].text, "Anything?");
    }

    #[test]
    fn test_settled_turn_cannot_change() {
        let mut conv = Conversation::new();
        let q = conv.push_question("Q");
        conv.mark_failed(q);

        assert_eq!(conv.push_answer(q, "late"), None);
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0].status, TurnStatus::Failed);
        assert!(conv.answered_exchanges().is_empty());
    }

    #[test]
    fn test_fail_pending() {
        let mut conv = Conversation::new();
        let q = conv.push_question("first");
        conv.push_answer(q, "ok");
        conv.push_question("abandoned");
        assert_eq!(conv.push_answer(0, "twice"), None);
        assert_eq!(conv.push_answer(1, "not a question"), None);

        assert_eq!(conv.fail_pending(), 1);
        assert_eq!(conv.turns()[2].status, TurnStatus::Failed);
        assert_eq!(conv.fail_pending(), 0);
    }
}
