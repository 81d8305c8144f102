use serde::Deserialize;

/// One quiz question. `answer` must appear verbatim in `choices`; grading
/// is exact string equality, no case folding or trimming.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    prompt: String,
    choices: Vec<String>,
    answer: String,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        choices: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            choices,
            answer: answer.into(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn grade(&self, choice: &str) -> bool {
        choice == self.answer
    }
}

/// The ordered question list, loaded once at startup and immutable after.
#[derive(Debug, Clone)]
pub struct QuizDefinition {
    questions: Vec<Question>,
}

#[derive(Debug, thiserror::Error)]
pub enum QuizLoadError {
    #[error("quiz file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("quiz has no questions")]
    Empty,

    #[error("question {index}: answer {answer:?} is not one of the choices")]
    AnswerNotInChoices { index: usize, answer: String },

    #[error("question {index}: duplicate choice {choice:?}")]
    DuplicateChoice { index: usize, choice: String },
}

impl QuizDefinition {
    /// Expected shape: `[{"question": .., "choices": [..], "answer": ..}]`.
    pub fn from_json(raw: &str) -> Result<Self, QuizLoadError> {
        Self::new(serde_json::from_str(raw)?)
    }

    pub fn new(questions: Vec<Question>) -> Result<Self, QuizLoadError> {
        if questions.is_empty() {
            return Err(QuizLoadError::Empty);
        }
        for (index, question) in questions.iter().enumerate() {
            for (i, choice) in question.choices.iter().enumerate() {
                if question.choices[..i].contains(choice) {
                    return Err(QuizLoadError::DuplicateChoice {
                        index,
                        choice: choice.clone(),
                    });
                }
            }
            if !question.choices.contains(&question.answer) {
                return Err(QuizLoadError::AnswerNotInChoices {
                    index,
                    answer: question.answer.clone(),
                });
            }
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}
