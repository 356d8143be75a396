use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Instant;

/// Most events handled per frame; the rest wait for the next one.
const MAX_EVENTS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    SetVisibility(u8),
    ToggleHud,
    TogglePause,
    Redraw,
    Resize,
}

/// Wait for terminal events until `deadline`, returning the actions they
/// ask for. Doubles as the frame-rate sleep.
pub(crate) fn wait_for_actions(deadline: Instant) -> anyhow::Result<Vec<Action>> {
    let mut events = Vec::new();
    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        if !event::poll(timeout)? {
            break;
        }
        events.push(event::read()?);
        if events.len() >= MAX_EVENTS {
            break;
        }
    }
    Ok(actions_from(events))
}

/// Actions for a batch of events. Repeated visibility presses collapse to
/// the last one so the tiles are recoloured once per frame.
pub(crate) fn actions_from(events: impl IntoIterator<Item = Event>) -> Vec<Action> {
    let mut out: Vec<Action> = Vec::new();
    for ev in events {
        let action = match ev {
            Event::Key(k) if k.kind != KeyEventKind::Release => key_action(&k),
            Event::Resize(..) => Some(Action::Resize),
            _ => None,
        };
        let Some(action) = action else {
            continue;
        };
        if let Action::SetVisibility(_) = action {
            out.retain(|a| !matches!(a, Action::SetVisibility(_)));
        }
        if matches!(action, Action::Resize) && out.contains(&Action::Resize) {
            continue;
        }
        out.push(action);
    }
    out
}

fn key_action(k: &KeyEvent) -> Option<Action> {
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return match k.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Quit),
            KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::Redraw),
            _ => None,
        };
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char(c) => c.to_digit(10).map(|d| Action::SetVisibility(d as u8)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[rstest]
    #[case(KeyCode::Char('q'), Some(Action::Quit))]
    #[case(KeyCode::Esc, Some(Action::Quit))]
    #[case(KeyCode::Char('0'), Some(Action::SetVisibility(0)))]
    #[case(KeyCode::Char('9'), Some(Action::SetVisibility(9)))]
    #[case(KeyCode::Char('h'), Some(Action::ToggleHud))]
    #[case(KeyCode::Char('p'), Some(Action::TogglePause))]
    #[case(KeyCode::Char('x'), None)]
    #[case(KeyCode::Enter, None)]
    fn plain_keys(#[case] code: KeyCode, #[case] want: Option<Action>) {
        assert_eq!(actions_from([press(code)]).first().copied(), want);
    }

    #[test]
    fn control_chords() {
        let ctrl = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
        assert_eq!(actions_from([ctrl('c')]), vec![Action::Quit]);
        assert_eq!(actions_from([ctrl('l')]), vec![Action::Redraw]);
        assert!(actions_from([ctrl('5')]).is_empty());
    }

    #[test]
    fn releases_are_ignored() {
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert!(actions_from([release]).is_empty());
    }

    #[test]
    fn batch_keeps_last_visibility_and_one_resize() {
        let got = actions_from([
            press(KeyCode::Char('2')),
            Event::Resize(80, 24),
            press(KeyCode::Char('h')),
            press(KeyCode::Char('7')),
            Event::Resize(100, 30),
        ]);
        assert_eq!(
            got,
            vec![Action::Resize, Action::ToggleHud, Action::SetVisibility(7)]
        );
    }
}
