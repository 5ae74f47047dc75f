//! The editor surface: the text a widget will run.

/// Seed text plus the user's current edit of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    seed_text: String,
    current_text: String,
}

impl Snippet {
    pub fn new(seed_text: impl Into<String>) -> Self {
        let seed_text = seed_text.into();
        Snippet {
            current_text: seed_text.clone(),
            seed_text,
        }
    }

    pub fn get_text(&self) -> &str {
        &self.current_text
    }

    /// Replaces the editor content. Anything goes; bad syntax shows up when run.
    pub fn set_text(&mut self, new_text: impl Into<String>) {
        self.current_text = new_text.into();
    }

    pub fn reset_to_seed(&mut self) {
        self.current_text.clone_from(&self.seed_text);
    }

    pub fn seed_text(&self) -> &str {
        &self.seed_text
    }

    pub fn is_modified(&self) -> bool {
        self.current_text != self.seed_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_and_reset() {
        let mut snippet = Snippet::new("console.log(1)");
        assert!(!snippet.is_modified());
        snippet.set_text("oops(");
        assert_eq!(snippet.get_text(), "oops(");
        assert!(snippet.is_modified());
        snippet.reset_to_seed();
        assert_eq!(snippet.get_text(), "console.log(1)");
        assert_eq!(snippet.seed_text(), "console.log(1)");
    }
}
