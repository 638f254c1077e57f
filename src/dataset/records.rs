//! Training record types and their column layouts.

use crate::pipeline::{Column, ColumnKind, DataSchema, PipelineError, Record, Row, Value};

/// Label given to an interaction when the file leaves it blank.
pub const DEFAULT_INTERACTION_LABEL: f32 = 1.0;

/// A user engaged with a lesson. Only positive interactions exist.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLessonInteraction {
    pub user_id: String,
    pub lesson_id: i64,
    pub label: f32,
}

impl UserLessonInteraction {
    pub const USER_ID: &'static str = "UserId";
    pub const LESSON_ID: &'static str = "LessonId";
    pub const LABEL: &'static str = "Label";

    pub fn new(user_id: impl Into<String>, lesson_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            lesson_id,
            label: DEFAULT_INTERACTION_LABEL,
        }
    }
}

impl Record for UserLessonInteraction {
    fn schema() -> DataSchema {
        DataSchema::new(vec![
            Column::new(Self::USER_ID, ColumnKind::Text),
            Column::new(Self::LESSON_ID, ColumnKind::Int),
            Column::new(Self::LABEL, ColumnKind::Float),
        ])
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(Self::USER_ID, Value::Text(self.user_id.clone()))
            .with(Self::LESSON_ID, Value::Int(self.lesson_id))
            .with(Self::LABEL, Value::Float(self.label))
    }

    fn from_row(row: &Row) -> Result<Self, PipelineError> {
        let label = match row.get(Self::LABEL) {
            None => DEFAULT_INTERACTION_LABEL,
            Some(_) => row.float(Self::LABEL)?,
        };
        Ok(Self {
            user_id: row.text(Self::USER_ID)?.to_string(),
            lesson_id: row.int(Self::LESSON_ID)?,
            label,
        })
    }
}

/// A word tagged with the category it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSample {
    pub category: String,
    pub word: String,
}

impl WordSample {
    pub const CATEGORY: &'static str = "Category";
    pub const WORD: &'static str = "Word";

    pub fn new(category: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            word: word.into(),
        }
    }

    /// An unlabeled sample used for scoring.
    pub fn unlabeled(word: impl Into<String>) -> Self {
        Self::new(String::new(), word)
    }
}

impl Record for WordSample {
    fn schema() -> DataSchema {
        DataSchema::new(vec![
            Column::new(Self::CATEGORY, ColumnKind::Text),
            Column::new(Self::WORD, ColumnKind::Text),
        ])
    }

    fn to_row(&self) -> Row {
        let row = Row::new().with(Self::WORD, Value::Text(self.word.clone()));
        if self.category.is_empty() {
            return row;
        }
        row.with(Self::CATEGORY, Value::Text(self.category.clone()))
    }

    fn from_row(row: &Row) -> Result<Self, PipelineError> {
        let category = match row.get(Self::CATEGORY) {
            None => String::new(),
            Some(_) => row.text(Self::CATEGORY)?.to_string(),
        };
        Ok(Self {
            category,
            word: row.text(Self::WORD)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_label_defaults_to_one() {
        let row = Row::new()
            .with("UserId", Value::Text("u1".into()))
            .with("LessonId", Value::Int(7));
        let record = UserLessonInteraction::from_row(&row).unwrap();
        assert_eq!(record, UserLessonInteraction::new("u1", 7));
        assert_eq!(record.label, 1.0);
    }

    #[test]
    fn interaction_requires_lesson_id() {
        let row = Row::new().with("UserId", Value::Text("u1".into()));
        assert!(UserLessonInteraction::from_row(&row).is_err());
    }

    #[test]
    fn unlabeled_word_leaves_category_out_of_the_row() {
        let row = WordSample::unlabeled("cat").to_row();
        assert!(row.get("Category").is_none());
        assert_eq!(WordSample::from_row(&row).unwrap(), WordSample::unlabeled("cat"));
    }

    #[test]
    fn schemas_declare_csv_column_order() {
        assert_eq!(
            UserLessonInteraction::schema().names(),
            vec!["UserId", "LessonId", "Label"]
        );
        assert_eq!(WordSample::schema().names(), vec!["Category", "Word"]);
    }
}
