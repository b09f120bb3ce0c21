//! Keyboard gestures: taps, combos and text typing.

use std::path::Path;
use std::sync::Arc;

use super::{pause, Timing};
use crate::platform::keycodes::{key_for_char, key_from_name};
use crate::platform::{EventSink, InputEvent, Key, KeyState, PlatformError};

/// Drives a keyboard device.
pub struct Keyboard {
    sink: Arc<dyn EventSink>,
    timing: Timing,
}

impl Keyboard {
    pub fn new(sink: Arc<dyn EventSink>, timing: Timing) -> Self {
        Self { sink, timing }
    }

    pub fn device(&self) -> &Path {
        self.sink.device()
    }

    /// Presses and releases one key.
    pub async fn tap(&self, key: Key) -> Result<(), PlatformError> {
        self.send(key, KeyState::Down).await?;
        pause(self.timing.key_hold).await;
        self.send(key, KeyState::Up).await
    }

    /// Holds `modifiers` in order around a tap of `key`, then releases them
    /// in reverse.
    ///
    /// On any failure every key still held is released before the error is
    /// returned.
    pub async fn combo(&self, modifiers: &[Key], key: Key) -> Result<(), PlatformError> {
        let mut held: Vec<Key> = Vec::with_capacity(modifiers.len() + 1);

        for &k in modifiers.iter().chain(std::iter::once(&key)) {
            if let Err(e) = self.send(k, KeyState::Down).await {
                self.emergency_release(held.iter().rev().copied()).await;
                return Err(e);
            }
            held.push(k);
        }
        pause(self.timing.key_hold).await;

        while let Some(k) = held.pop() {
            if let Err(e) = self.send(k, KeyState::Up).await {
                self.emergency_release(held.iter().rev().copied()).await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Types `text` one key at a time and returns how many keys were typed.
    ///
    /// Text is lowercased first; characters without a key are skipped.
    pub async fn type_text(&self, text: &str) -> Result<usize, PlatformError> {
        let keys: Vec<Key> = text
            .to_lowercase()
            .chars()
            .filter_map(key_for_char)
            .collect();

        for (i, &key) in keys.iter().enumerate() {
            let typed = async {
                self.send(key, KeyState::Down).await?;
                pause(self.timing.key_hold).await;
                self.send(key, KeyState::Up).await?;
                pause(self.timing.key_gap).await;
                Ok::<_, PlatformError>(())
            };
            if let Err(e) = typed.await {
                log::error!("keyboard: typing aborted at key {} of {}: {e}", i + 1, keys.len());
                self.emergency_release(keys[i..].iter().copied()).await;
                return Err(e);
            }
        }
        Ok(keys.len())
    }

    /// Presses a key by name, or a `+`-joined combo such as `ctrl+shift+t`.
    pub async fn press(&self, spec: &str) -> Result<(), PlatformError> {
        let keys = parse_key_spec(spec)?;
        match keys.split_last() {
            Some((&key, [])) => self.tap(key).await,
            Some((&key, modifiers)) => self.combo(modifiers, key).await,
            None => Err(PlatformError::InvalidAction("Empty key".into())),
        }
    }

    async fn send(&self, key: Key, state: KeyState) -> Result<(), PlatformError> {
        self.sink.emit_synced(InputEvent::key(key, state)).await
    }

    /// Best-effort release; failures are only logged.
    async fn emergency_release(&self, keys: impl Iterator<Item = Key>) {
        for key in keys {
            if let Err(e) = self.send(key, KeyState::Up).await {
                log::warn!("keyboard: could not release {}: {e}", key.name());
            }
        }
    }
}

/// Resolves every `+`-separated name in `spec`.
fn parse_key_spec(spec: &str) -> Result<Vec<Key>, PlatformError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(Vec::new());
    }
    spec.split('+')
        .map(|name| {
            let name = name.trim();
            key_from_name(name)
                .ok_or_else(|| PlatformError::InvalidAction(format!("Unknown key: {name}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::keycodes::{KEY_A, KEY_ENTER, KEY_LEFTCTRL, KEY_LEFTSHIFT, KEY_SPACE};
    use crate::synth::testing::RecordingSink;

    fn keyboard(sink: &Arc<RecordingSink>) -> Keyboard {
        Keyboard::new(sink.clone(), Timing::immediate())
    }

    fn down(key: Key) -> InputEvent {
        InputEvent::key(key, KeyState::Down)
    }

    fn up(key: Key) -> InputEvent {
        InputEvent::key(key, KeyState::Up)
    }

    fn named(name: &str) -> Key {
        key_from_name(name).unwrap()
    }

    #[tokio::test]
    async fn tap_is_down_sync_up_sync() {
        let sink = Arc::new(RecordingSink::new());
        keyboard(&sink).tap(KEY_ENTER).await.unwrap();
        assert_eq!(
            sink.events(),
            vec![down(KEY_ENTER), InputEvent::Sync, up(KEY_ENTER), InputEvent::Sync]
        );
    }

    #[tokio::test]
    async fn combo_releases_in_reverse_order() {
        let sink = Arc::new(RecordingSink::new());
        let t = named("t");
        keyboard(&sink)
            .combo(&[KEY_LEFTCTRL, KEY_LEFTSHIFT], t)
            .await
            .unwrap();
        assert_eq!(
            sink.payload(),
            vec![
                down(KEY_LEFTCTRL),
                down(KEY_LEFTSHIFT),
                down(t),
                up(t),
                up(KEY_LEFTSHIFT),
                up(KEY_LEFTCTRL),
            ]
        );
    }

    #[tokio::test]
    async fn combo_press_failure_releases_held_modifiers() {
        let t = named("t");
        let sink = Arc::new(RecordingSink::failing_on(move |e| *e == down(t)));
        let err = keyboard(&sink)
            .combo(&[KEY_LEFTCTRL, KEY_LEFTSHIFT], t)
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::EmissionFailure(_)));
        assert_eq!(
            sink.payload(),
            vec![
                down(KEY_LEFTCTRL),
                down(KEY_LEFTSHIFT),
                up(KEY_LEFTSHIFT),
                up(KEY_LEFTCTRL),
            ]
        );
    }

    #[tokio::test]
    async fn combo_release_failure_still_releases_modifiers() {
        let c = named("c");
        let sink = Arc::new(RecordingSink::failing_on(move |e| *e == up(c)));
        assert!(keyboard(&sink).combo(&[KEY_LEFTCTRL], c).await.is_err());
        assert_eq!(sink.payload().last(), Some(&up(KEY_LEFTCTRL)));
    }

    #[tokio::test]
    async fn typing_lowercases_and_skips_unmapped() {
        let sink = Arc::new(RecordingSink::new());
        let typed = keyboard(&sink).type_text("Hi é.!").await.unwrap();

        // "h", "i", " ", "." are mapped; "é" and "!" are not.
        assert_eq!(typed, 4);
        let h = named("h");
        let i = named("i");
        let dot = named(".");
        assert_eq!(
            sink.payload(),
            vec![
                down(h),
                up(h),
                down(i),
                up(i),
                down(KEY_SPACE),
                up(KEY_SPACE),
                down(dot),
                up(dot),
            ]
        );
    }

    #[tokio::test]
    async fn typing_failure_releases_current_and_remaining_keys() {
        let b = named("b");
        let c = named("c");
        let sink = Arc::new(RecordingSink::failing_on(move |e| *e == down(b)));
        let err = keyboard(&sink).type_text("abc").await.unwrap_err();

        assert!(matches!(err, PlatformError::EmissionFailure(_)));
        assert_eq!(
            sink.payload(),
            vec![down(KEY_A), up(KEY_A), up(b), up(c)]
        );
    }

    #[tokio::test]
    async fn press_single_key_and_combo() {
        let sink = Arc::new(RecordingSink::new());
        let kb = keyboard(&sink);
        kb.press("Enter").await.unwrap();
        kb.press("ctrl+a").await.unwrap();
        assert_eq!(
            sink.payload(),
            vec![
                down(KEY_ENTER),
                up(KEY_ENTER),
                down(KEY_LEFTCTRL),
                down(KEY_A),
                up(KEY_A),
                up(KEY_LEFTCTRL),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_key_is_invalid_action_and_emits_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let err = keyboard(&sink).press("ctrl+banana").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown key: banana");
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn empty_key_is_invalid_action() {
        let sink = Arc::new(RecordingSink::new());
        let err = keyboard(&sink).press("  ").await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidAction(_)));
    }
}
