//! Question bank: the ordered list of questions a room plays through.
//!
//! Mutable only while the coordinator sits in the lobby; any mutation
//! attempted mid-session fails with a phase violation.

use crate::config::GameConfig;
use crate::protocol::validation::validate_question;
use crate::protocol::{GameError, Phase, Question};

#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validated question. `phase` is the owning room's current
    /// coordinator phase.
    pub fn append(
        &mut self,
        question: Question,
        phase: Phase,
        config: &GameConfig,
    ) -> Result<(), GameError> {
        Self::require_lobby(phase)?;
        validate_question(&question, config)?;
        self.questions.push(question);
        Ok(())
    }

    /// Remove the question at `index`, lobby-only like `append`.
    pub fn remove(&mut self, index: usize, phase: Phase) -> Result<Question, GameError> {
        Self::require_lobby(phase)?;
        if index >= self.questions.len() {
            return Err(GameError::question_invalid(format!(
                "No question at index {index}"
            )));
        }
        Ok(self.questions.remove(index))
    }

    /// Drop every question, lobby-only.
    pub fn clear(&mut self, phase: Phase) -> Result<(), GameError> {
        Self::require_lobby(phase)?;
        self.questions.clear();
        Ok(())
    }

    pub fn list(&self) -> &[Question] {
        &self.questions
    }

    pub fn count(&self) -> usize {
        self.questions.len()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    fn require_lobby(phase: Phase) -> Result<(), GameError> {
        if phase == Phase::Lobby {
            Ok(())
        } else {
            Err(GameError::phase_violation(format!(
                "Questions can only be edited in the lobby, not during {phase}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> Question {
        Question {
            text: text.to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: 0,
            time_limit: 20,
        }
    }

    #[test]
    fn append_keeps_insertion_order() {
        let config = GameConfig::default();
        let mut bank = QuestionBank::new();
        bank.append(question("one"), Phase::Lobby, &config).unwrap();
        bank.append(question("two"), Phase::Lobby, &config).unwrap();
        assert_eq!(bank.count(), 2);
        assert_eq!(bank.get(0).unwrap().text, "one");
        assert_eq!(bank.get(1).unwrap().text, "two");
    }

    #[test]
    fn mutation_outside_lobby_is_a_phase_violation() {
        let config = GameConfig::default();
        let mut bank = QuestionBank::new();
        bank.append(question("one"), Phase::Lobby, &config).unwrap();

        for phase in [
            Phase::Countdown,
            Phase::Question,
            Phase::Results,
            Phase::Podium,
            Phase::Leaderboard,
        ] {
            assert!(matches!(
                bank.append(question("late"), phase, &config),
                Err(GameError::PhaseViolation { .. })
            ));
            assert!(matches!(
                bank.remove(0, phase),
                Err(GameError::PhaseViolation { .. })
            ));
            assert!(matches!(
                bank.clear(phase),
                Err(GameError::PhaseViolation { .. })
            ));
        }
        assert_eq!(bank.count(), 1);
    }

    #[test]
    fn remove_rejects_out_of_range_indices() {
        let config = GameConfig::default();
        let mut bank = QuestionBank::new();
        bank.append(question("one"), Phase::Lobby, &config).unwrap();
        assert!(bank.remove(1, Phase::Lobby).is_err());
        assert_eq!(bank.remove(0, Phase::Lobby).unwrap().text, "one");
        assert_eq!(bank.count(), 0);
    }
}
