//! Add/edit form state for one table

use crate::error::{CoreError, CoreResult};
use crate::row::{Draft, TableRow};
use crate::source::Mutation;
use crate::types::RecordId;

/// What the form is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Closed,
    Creating,
    Editing(RecordId),
}

/// Form bound to a table; turns into a `Mutation` on submit
#[derive(Debug, Clone)]
pub struct EditorSession<R: TableRow> {
    mode: EditorMode,
    form: R::Draft,
}

impl<R: TableRow> Default for EditorSession<R> {
    fn default() -> Self {
        Self {
            mode: EditorMode::Closed,
            form: R::Draft::default(),
        }
    }
}

impl<R: TableRow> EditorSession<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != EditorMode::Closed
    }

    pub fn form(&self) -> &R::Draft {
        &self.form
    }

    /// Start an empty form
    pub fn open_create(&mut self) {
        self.mode = EditorMode::Creating;
        self.form = R::Draft::default();
    }

    /// Start a form pre-filled from `row`
    pub fn open_edit(&mut self, row: &R) {
        self.mode = EditorMode::Editing(row.id());
        self.form = row.to_draft();
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()> {
        if !self.is_open() {
            return Err(CoreError::validation("no form is open"));
        }
        self.form.set_field(field, value)
    }

    /// Validate the form and build the change it describes. The form stays
    /// open until `close`.
    pub fn submit(&self) -> CoreResult<Mutation<R>> {
        match self.mode {
            EditorMode::Closed => Err(CoreError::validation("no form is open")),
            EditorMode::Creating => {
                self.form.validate()?;
                Ok(Mutation::Create(self.form.clone()))
            }
            EditorMode::Editing(id) => {
                self.form.validate()?;
                Ok(Mutation::Update(id, self.form.clone()))
            }
        }
    }

    /// Close the form, discarding edits
    pub fn close(&mut self) {
        self.mode = EditorMode::Closed;
        self.form = R::Draft::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMode, PaymentModeDraft};
    use crate::row::Record;
    use chrono::Utc;

    fn card() -> PaymentMode {
        PaymentMode::create(
            4,
            PaymentModeDraft {
                mode: "Card".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_create_flow() {
        let mut editor = EditorSession::<PaymentMode>::new();
        assert!(!editor.is_open());

        editor.open_create();
        editor.set_field("mode", "UPI").unwrap();
        let mutation = editor.submit().unwrap();

        match mutation {
            Mutation::Create(draft) => assert_eq!(draft.mode, "UPI"),
            other => panic!("unexpected mutation {:?}", other),
        }
        assert_eq!(editor.mode(), EditorMode::Creating);
        editor.close();
        assert_eq!(editor.mode(), EditorMode::Closed);
    }

    #[test]
    fn test_edit_prefills_form() {
        let mut editor = EditorSession::<PaymentMode>::new();
        editor.open_edit(&card());

        assert_eq!(editor.mode(), EditorMode::Editing(4));
        assert_eq!(editor.form().mode, "Card");

        editor.set_field("mode", "Credit Card").unwrap();
        match editor.submit().unwrap() {
            Mutation::Update(id, draft) => {
                assert_eq!(id, 4);
                assert_eq!(draft.mode, "Credit Card");
            }
            other => panic!("unexpected mutation {:?}", other),
        }
    }

    #[test]
    fn test_invalid_form_stays_open() {
        let mut editor = EditorSession::<PaymentMode>::new();
        editor.open_create();
        editor.set_field("mode", "  ").unwrap();

        assert!(matches!(editor.submit(), Err(CoreError::Validation { .. })));
        assert_eq!(editor.mode(), EditorMode::Creating);
        assert_eq!(editor.form().mode, "  ");
    }

    #[test]
    fn test_closed_editor_rejects_input() {
        let mut editor = EditorSession::<PaymentMode>::new();
        assert!(editor.set_field("mode", "Cash").is_err());
        assert!(editor.submit().is_err());

        editor.open_edit(&card());
        editor.close();
        assert!(!editor.is_open());
        assert_eq!(editor.form().mode, "");
    }
}
