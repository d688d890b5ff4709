//! Issue-type records extracted from a worksheet.

use non_empty_string::NonEmptyString;

/// Literal inserted wherever a free-text cell contained a line break.
pub const LINE_BREAK_MARKER: &str = "<br/>";

/// One row of the typology: a single issue type.
///
/// The identifier and name are guaranteed non-empty. An empty `parent_id`
/// places the issue at the root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    id: NonEmptyString,
    name: NonEmptyString,
    parent_id: String,
    process_id: String,
    description: String,
    examples: String,
    notes: String,
}

impl IssueRecord {
    /// Creates a root-level record with empty free-text fields.
    #[must_use]
    pub const fn new(id: NonEmptyString, name: NonEmptyString) -> Self {
        Self {
            id,
            name,
            parent_id: String::new(),
            process_id: String::new(),
            description: String::new(),
            examples: String::new(),
            notes: String::new(),
        }
    }

    /// Sets the identifier of the parent issue (empty for root-level issues).
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    /// Sets the auxiliary process identifier.
    #[must_use]
    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = process_id.into();
        self
    }

    /// Sets the description, normalizing line breaks.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = normalize_text(description);
        self
    }

    /// Sets the examples, normalizing line breaks.
    #[must_use]
    pub fn with_examples(mut self, examples: &str) -> Self {
        self.examples = normalize_text(examples);
        self
    }

    /// Sets the notes, normalizing line breaks.
    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = normalize_text(notes);
        self
    }

    /// The issue identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// The issue name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The parent identifier, empty for root-level issues.
    #[must_use]
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// The auxiliary process identifier.
    #[must_use]
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// The description text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The examples text.
    #[must_use]
    pub fn examples(&self) -> &str {
        &self.examples
    }

    /// The notes text.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Whether this issue sits at the root of the hierarchy.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }
}

/// Replaces every line break with [`LINE_BREAK_MARKER`] and trims the result.
///
/// `\r\n` counts as a single break.
#[must_use]
pub fn normalize_text(value: &str) -> String {
    value
        .replace("\r\n", LINE_BREAK_MARKER)
        .replace(['\n', '\r'], LINE_BREAK_MARKER)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn non_empty(value: &str) -> NonEmptyString {
        NonEmptyString::new(value.to_string()).unwrap()
    }

    #[test_case("single line", "single line"; "no breaks")]
    #[test_case("  padded  ", "padded"; "trims whitespace")]
    #[test_case("first\nsecond", "first<br/>second"; "unix break")]
    #[test_case("first\r\nsecond", "first<br/>second"; "windows break")]
    #[test_case("a\n\nb", "a<br/><br/>b"; "consecutive breaks")]
    #[test_case(" text\n", "text<br/>"; "break survives trimming")]
    fn normalizes_free_text(input: &str, expected: &str) {
        assert_eq!(normalize_text(input), expected);
    }

    #[test]
    fn builder_sets_every_field() {
        let record = IssueRecord::new(non_empty("ACC-MT"), non_empty("Mistranslation"))
            .with_parent("ACC")
            .with_process_id("1.1")
            .with_description("Target\ncontent")
            .with_examples("e.g. Y")
            .with_notes(" note2 ");

        assert_eq!(record.id(), "ACC-MT");
        assert_eq!(record.name(), "Mistranslation");
        assert_eq!(record.parent_id(), "ACC");
        assert_eq!(record.process_id(), "1.1");
        assert_eq!(record.description(), "Target<br/>content");
        assert_eq!(record.examples(), "e.g. Y");
        assert_eq!(record.notes(), "note2");
        assert!(!record.is_root());
    }

    #[test]
    fn new_record_is_root_level() {
        let record = IssueRecord::new(non_empty("ACC"), non_empty("Accuracy"));
        assert!(record.is_root());
        assert_eq!(record.description(), "");
    }
}
