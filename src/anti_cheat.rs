use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::warn;
use strum_macros::{Display, IntoStaticStr};

use crate::session::ExamSession;

/// Signals that end a running exam. The display form is the recorded reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum CheatTrigger {
    #[strum(serialize = "tab switched")]
    TabHidden,
    #[strum(serialize = "fullscreen exited")]
    FullscreenExited,
    #[strum(serialize = "context menu")]
    ContextMenu,
    #[strum(serialize = "inspect")]
    Inspect,
    #[strum(serialize = "developer tools")]
    DeveloperTools,
    #[strum(serialize = "view source")]
    ViewSource,
    #[strum(serialize = "page unloaded")]
    PageUnload,
}

impl CheatTrigger {
    pub const ALL: [CheatTrigger; 7] = [
        CheatTrigger::TabHidden,
        CheatTrigger::FullscreenExited,
        CheatTrigger::ContextMenu,
        CheatTrigger::Inspect,
        CheatTrigger::DeveloperTools,
        CheatTrigger::ViewSource,
        CheatTrigger::PageUnload,
    ];

    pub fn reason(self) -> &'static str {
        self.into()
    }
}

/// Maps blocked shortcuts: F12, Ctrl+Shift+I/J/C and Ctrl+U.
pub fn classify_key(key: &KeyEvent) -> Option<CheatTrigger> {
    if key.code == KeyCode::F(12) {
        return Some(CheatTrigger::Inspect);
    }

    let KeyCode::Char(c) = key.code else {
        return None;
    };
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }

    let c = c.to_ascii_uppercase();
    if key.modifiers.contains(KeyModifiers::SHIFT) && matches!(c, 'I' | 'J' | 'C') {
        Some(CheatTrigger::DeveloperTools)
    } else if c == 'U' {
        Some(CheatTrigger::ViewSource)
    } else {
        None
    }
}

pub fn classify_mouse(event: &MouseEvent) -> Option<CheatTrigger> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Right) => Some(CheatTrigger::ContextMenu),
        _ => None,
    }
}

/// Ends the session for `trigger` if it is still running. Returns true only
/// for the trigger that actually ended it.
pub fn dispatch(session: &mut ExamSession, trigger: CheatTrigger) -> bool {
    let ended = session.auto_terminate(trigger.reason());
    if ended {
        warn!("exam terminated by anti-cheat trigger: {trigger}");
    }
    ended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use std::collections::HashSet;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_reasons_are_unique() {
        let reasons: HashSet<&str> = CheatTrigger::ALL.iter().map(|t| t.reason()).collect();

        assert_eq!(reasons.len(), CheatTrigger::ALL.len());
        assert!(reasons.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn test_display_matches_reason() {
        assert_eq!(CheatTrigger::TabHidden.to_string(), "tab switched");
        assert_eq!(CheatTrigger::TabHidden.reason(), "tab switched");
        assert_eq!(CheatTrigger::PageUnload.to_string(), "page unloaded");
    }

    #[test]
    fn test_classify_f12() {
        assert_eq!(
            classify_key(&key(KeyCode::F(12), KeyModifiers::NONE)),
            Some(CheatTrigger::Inspect)
        );
        assert_eq!(classify_key(&key(KeyCode::F(11), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_classify_dev_tools_combos() {
        let ctrl_shift = KeyModifiers::CONTROL | KeyModifiers::SHIFT;
        for c in ['i', 'I', 'j', 'J', 'c', 'C'] {
            assert_eq!(
                classify_key(&key(KeyCode::Char(c), ctrl_shift)),
                Some(CheatTrigger::DeveloperTools),
                "{c}"
            );
        }
    }

    #[test]
    fn test_classify_view_source() {
        assert_eq!(
            classify_key(&key(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            Some(CheatTrigger::ViewSource)
        );
        assert_eq!(
            classify_key(&key(
                KeyCode::Char('U'),
                KeyModifiers::CONTROL | KeyModifiers::SHIFT
            )),
            Some(CheatTrigger::ViewSource)
        );
    }

    #[test]
    fn test_plain_keys_are_not_triggers() {
        assert_eq!(classify_key(&key(KeyCode::Char('i'), KeyModifiers::NONE)), None);
        assert_eq!(classify_key(&key(KeyCode::Char('u'), KeyModifiers::NONE)), None);
        assert_eq!(classify_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), None);
        assert_eq!(classify_key(&key(KeyCode::Enter, KeyModifiers::NONE)), None);

        let mut release = key(KeyCode::Char('1'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(classify_key(&release), None);
    }

    #[test]
    fn test_classify_right_click() {
        let click = |kind| MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };

        assert_eq!(
            classify_mouse(&click(MouseEventKind::Down(MouseButton::Right))),
            Some(CheatTrigger::ContextMenu)
        );
        assert_eq!(classify_mouse(&click(MouseEventKind::Down(MouseButton::Left))), None);
        assert_eq!(classify_mouse(&click(MouseEventKind::Moved)), None);
    }
}
