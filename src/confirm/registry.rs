use crate::confirm::handlers::{
    ActionHandler, ChallengeHandler, PollHandler, RedirectHandler, VoucherHandler,
};
use crate::intents::types::NextActionKind;
use std::sync::Arc;

/// Fixed set of authentication handler strategies.
///
/// Resolution is by predicate: the unique handler whose `can_handle` answers
/// true, or `None` for action kinds no strategy covers. Callers treat `None`
/// as "cannot complete client-side".
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn ActionHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Arc::new(RedirectHandler),
                Arc::new(VoucherHandler),
                Arc::new(PollHandler),
                Arc::new(ChallengeHandler),
            ],
        }
    }

    pub fn handler_for(&self, kind: NextActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(kind))
            .cloned()
    }

    pub fn handlers(&self) -> &[Arc<dyn ActionHandler>] {
        &self.handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::types::ActionGroup;

    #[test]
    fn every_recognized_kind_resolves_to_exactly_one_handler() {
        let registry = HandlerRegistry::new();
        for kind in NextActionKind::ALL {
            let claiming = registry
                .handlers()
                .iter()
                .filter(|h| h.can_handle(kind))
                .count();
            if kind.group().is_some() {
                assert_eq!(claiming, 1, "kind {:?} must have exactly one handler", kind);
            } else {
                assert_eq!(claiming, 0, "kind {:?} must have no handler", kind);
            }
        }
    }

    #[test]
    fn resolved_handler_matches_the_action_group() {
        let registry = HandlerRegistry::new();
        for kind in NextActionKind::ALL {
            let Some(group) = kind.group() else { continue };
            let handler = registry.handler_for(kind).expect("grouped kinds resolve");
            let expected = match group {
                ActionGroup::Redirect => "redirect",
                ActionGroup::Voucher => "voucher",
                ActionGroup::Poll => "poll",
                ActionGroup::Challenge => "challenge",
            };
            assert_eq!(handler.name(), expected);
        }
    }

    #[test]
    fn unknown_kind_resolves_to_none() {
        let registry = HandlerRegistry::new();
        assert!(registry.handler_for(NextActionKind::Unknown).is_none());
    }
}
