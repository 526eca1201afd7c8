//! Sound backends behind three narrow capabilities
//!
//! - [`ToneEmitter`]: PC speaker beep
//! - [`ToneSynth`]: synthesized tone on a digital audio device
//! - [`FilePlayer`]: external audio file playback
//!
//! Every implementation bounds its own runtime and reports failure as a
//! [`BackendError`]; callers walk their candidates with [`first_success`].

mod beeper;
pub mod command;
mod players;
mod synth;

pub use beeper::BeepCommand;
pub use players::default_players;
pub use synth::SoxAplaySynth;

use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use tracing::debug;

use crate::config::LimiterSettings;
use crate::error::BackendError;

#[async_trait]
pub trait ToneEmitter: Send + Sync {
    async fn emit_tone(&self, freq_hz: u32, duration_ms: u32) -> Result<(), BackendError>;
}

#[async_trait]
pub trait ToneSynth: Send + Sync {
    async fn synthesize_tone(
        &self,
        freq_hz: u32,
        seconds: f64,
        gain: f32,
        device: &str,
        limiter: &LimiterSettings,
    ) -> Result<(), BackendError>;
}

#[async_trait]
pub trait FilePlayer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn play_file(
        &self,
        path: &Path,
        limit_seconds: u32,
        device: &str,
        gain: f32,
    ) -> Result<(), BackendError>;
}

/// Try candidates in order and return the first that succeeds.
/// Failures are logged at debug level and never propagated.
pub async fn first_success<T, F, Fut>(
    candidates: impl IntoIterator<Item = T>,
    mut attempt: F,
) -> Option<T>
where
    T: Copy,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), BackendError>>,
{
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(()) => return Some(candidate),
            Err(e) => debug!(error = %e, "Backend attempt failed, trying next"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn test_first_success_stops_at_first_ok() {
        let tried = RefCell::new(Vec::new());
        let winner = first_success(["a", "b", "c"], |name| {
            tried.borrow_mut().push(name);
            async move {
                if name == "b" {
                    Ok(())
                } else {
                    Err(BackendError::Unavailable("nope"))
                }
            }
        })
        .await;

        assert_eq!(winner, Some("b"));
        assert_eq!(*tried.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_first_success_exhausted() {
        let winner = first_success([1, 2, 3], |_| async {
            Err(BackendError::Unavailable("down"))
        })
        .await;
        assert_eq!(winner, None);
    }

    #[tokio::test]
    async fn test_first_success_empty() {
        let winner = first_success(Vec::<u8>::new(), |_| async { Ok(()) }).await;
        assert_eq!(winner, None);
    }
}
