use crate::config::GameConfig;

use super::errors::GameError;
use super::types::{Question, OPTION_COUNT};

/// Validate a display name: 1 to `max_name_length` printable characters.
/// Control characters and blank names are rejected.
pub fn validate_display_name(name: &str, config: &GameConfig) -> Result<(), GameError> {
    let length = name.chars().count();
    if length == 0 || length > config.max_name_length {
        return Err(GameError::NameInvalid);
    }
    if name.trim().is_empty() {
        return Err(GameError::NameInvalid);
    }
    if name.chars().any(char::is_control) {
        return Err(GameError::NameInvalid);
    }
    Ok(())
}

/// Validate a question before it enters a room's bank.
pub fn validate_question(question: &Question, config: &GameConfig) -> Result<(), GameError> {
    if question.text.trim().is_empty() {
        return Err(GameError::question_invalid("Question text cannot be empty"));
    }
    if question.options.len() != OPTION_COUNT {
        return Err(GameError::question_invalid(format!(
            "Questions need exactly {OPTION_COUNT} options"
        )));
    }
    if question.options.iter().any(|o| o.trim().is_empty()) {
        return Err(GameError::question_invalid("Options cannot be empty"));
    }
    if usize::from(question.correct) >= OPTION_COUNT {
        return Err(GameError::question_invalid(format!(
            "Correct option must be an index below {OPTION_COUNT}"
        )));
    }
    if question.time_limit < config.min_deadline_secs
        || question.time_limit > config.max_deadline_secs
    {
        return Err(GameError::question_invalid(format!(
            "Time limit must lie within {}..={} seconds",
            config.min_deadline_secs, config.max_deadline_secs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(time_limit: u64) -> Question {
        Question {
            text: "2+2".to_string(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct: 1,
            time_limit,
        }
    }

    #[test]
    fn name_length_boundaries() {
        let config = GameConfig::default();
        assert!(validate_display_name("A", &config).is_ok());
        assert!(validate_display_name(&"x".repeat(20), &config).is_ok());
        assert_eq!(
            validate_display_name("", &config),
            Err(GameError::NameInvalid)
        );
        assert_eq!(
            validate_display_name(&"x".repeat(21), &config),
            Err(GameError::NameInvalid)
        );
    }

    #[test]
    fn names_reject_control_characters_and_blanks() {
        let config = GameConfig::default();
        assert!(validate_display_name("Al\tce", &config).is_err());
        assert!(validate_display_name("   ", &config).is_err());
        assert!(validate_display_name("Alice B", &config).is_ok());
    }

    #[test]
    fn deadline_boundaries() {
        let config = GameConfig::default();
        assert!(validate_question(&question(5), &config).is_ok());
        assert!(validate_question(&question(60), &config).is_ok());
        assert!(validate_question(&question(4), &config).is_err());
        assert!(validate_question(&question(61), &config).is_err());
    }

    #[test]
    fn questions_need_four_nonempty_options() {
        let config = GameConfig::default();

        let mut q = question(20);
        q.options.pop();
        assert!(validate_question(&q, &config).is_err());

        let mut q = question(20);
        q.options[2] = "  ".to_string();
        assert!(validate_question(&q, &config).is_err());

        let mut q = question(20);
        q.correct = 4;
        assert!(validate_question(&q, &config).is_err());

        let mut q = question(20);
        q.text = String::new();
        assert!(validate_question(&q, &config).is_err());
    }
}
