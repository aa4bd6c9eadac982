/// File name offered when the backend has no bulk files yet; saving creates it.
pub const PLACEHOLDER_BULK_FILE: &str = "bulk_import.txt";

/// The one editable bulk file held by the client.
///
/// `loaded_text` is the baseline confirmed by the backend (last successful load
/// or save). The file is dirty whenever the edit surface differs from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkFileState {
    current_filename: Option<String>,
    loaded_text: String,
    edited_text: String,
}

impl BulkFileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_filename(&self) -> Option<&str> {
        self.current_filename.as_deref()
    }

    pub fn loaded_text(&self) -> &str {
        &self.loaded_text
    }

    pub fn edited_text(&self) -> &str {
        &self.edited_text
    }

    pub fn is_dirty(&self) -> bool {
        self.edited_text != self.loaded_text
    }

    pub fn is_current(&self, filename: &str) -> bool {
        self.current_filename.as_deref() == Some(filename)
    }

    pub(crate) fn edit(&mut self, text: String) {
        self.edited_text = text;
    }

    /// A confirmed load replaces both the baseline and the edit surface.
    pub(crate) fn mark_loaded(&mut self, filename: String, text: String) {
        self.current_filename = Some(filename);
        self.loaded_text = text.clone();
        self.edited_text = text;
    }

    /// A confirmed save moves the baseline to the content that was sent. Edits
    /// made while the save was in flight stay dirty.
    pub(crate) fn mark_saved(&mut self, filename: String, content: String) {
        self.current_filename = Some(filename);
        self.loaded_text = content;
    }

    pub(crate) fn rename_current(&mut self, new_filename: String) {
        self.current_filename = Some(new_filename);
    }

    pub(crate) fn clear(&mut self) {
        self.current_filename = None;
        self.loaded_text.clear();
        self.edited_text.clear();
    }
}

/// Answer to the "save changes first?" dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    Save,
    Discard,
    Cancel,
}

/// An action held back because the current file has unsaved edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDecision {
    Switch { target: String },
    Import { file_name: String, text: String },
    /// An imported file would replace a bulk file the backend already has.
    Overwrite { file_name: String, text: String },
}

impl PendingDecision {
    pub fn target_name(&self) -> &str {
        match self {
            PendingDecision::Switch { target } => target,
            PendingDecision::Import { file_name, .. }
            | PendingDecision::Overwrite { file_name, .. } => file_name,
        }
    }
}
