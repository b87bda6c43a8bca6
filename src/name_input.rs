/// Name entry shown at game over.  Pure state machine; the binary feeds it
/// keys from its own frame loop until `is_finished`.

pub const MAX_NAME_LEN: usize = 10;
pub const ANONYMOUS: &str = "---";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKey {
    Char(char),
    Backspace,
    Enter,
}

#[derive(Debug, Clone)]
pub struct NameInput {
    text: String,
    max_len: usize,
    finished: bool,
}

impl Default for NameInput {
    fn default() -> Self {
        Self::new(MAX_NAME_LEN)
    }
}

impl NameInput {
    pub fn new(max_len: usize) -> Self {
        Self {
            text: String::new(),
            max_len,
            finished: false,
        }
    }

    pub fn handle(&mut self, key: NameKey) {
        if self.finished {
            return;
        }
        match key {
            NameKey::Char(c) if !c.is_control() && self.text.chars().count() < self.max_len => {
                self.text.push(c);
            }
            NameKey::Char(_) => {}
            NameKey::Backspace => {
                self.text.pop();
            }
            NameKey::Enter => self.finished = true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The entered name, trimmed; blank becomes `---`.
    pub fn value(&self) -> String {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            ANONYMOUS.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(keys: &[NameKey]) -> NameInput {
        let mut input = NameInput::default();
        for key in keys {
            input.handle(*key);
        }
        input
    }

    #[test]
    fn blank_name_is_anonymous() {
        let input = typed(&[NameKey::Char(' '), NameKey::Enter]);
        assert!(input.is_finished());
        assert_eq!(input.value(), ANONYMOUS);
    }

    #[test]
    fn name_is_capped_and_editable() {
        let mut keys: Vec<NameKey> = "abcdefghijkl".chars().map(NameKey::Char).collect();
        keys.push(NameKey::Backspace);
        let input = typed(&keys);
        assert_eq!(input.text(), "abcdefghi");
        assert!(!input.is_finished());
    }

    #[test]
    fn keys_after_enter_are_ignored() {
        let input = typed(&[NameKey::Char('a'), NameKey::Enter, NameKey::Char('b')]);
        assert_eq!(input.value(), "a");
    }
}
