/// Shared yes/no prompt holding at most one pending action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmPrompt<A> {
    pending: Option<(String, A)>,
}

impl<A> Default for ConfirmPrompt<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A> ConfirmPrompt<A> {
    /// Open the prompt; any action already pending is replaced.
    pub fn ask(&mut self, message: impl Into<String>, action: A) {
        self.pending = Some((message.into(), action));
    }

    /// Close the prompt and hand back its action to run.
    pub fn confirm(&mut self) -> Option<A> {
        self.pending.take().map(|(_, action)| action)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.pending.as_ref().map(|(m, _)| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_takes_the_action_once() {
        let mut p = ConfirmPrompt::default();
        p.ask("Delete?", 7);
        assert_eq!(p.message(), Some("Delete?"));
        assert_eq!(p.confirm(), Some(7));
        assert_eq!(p.confirm(), None);
        assert!(!p.is_open());
    }

    #[test]
    fn cancel_drops_the_action() {
        let mut p = ConfirmPrompt::default();
        p.ask("first", 1);
        p.ask("second", 2);
        assert_eq!(p.message(), Some("second"));
        p.cancel();
        assert_eq!(p.confirm(), None);
    }
}
