//! External audio file players, in fallback order

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::constants::{hardware, programs, timing};
use crate::error::BackendError;

use super::command::run_bounded;
use super::FilePlayer;

fn bounded_limit(limit_seconds: u32) -> Duration {
    Duration::from_secs(u64::from(limit_seconds)) + timing::PLAYER_GRACE
}

fn percent(gain: f32) -> u32 {
    (gain * 100.0).round().max(0.0) as u32
}

/// `AUDIODEV` for players that honour it (SDL, sox); empty for the default device
fn audiodev_env(device: &str) -> Vec<(&'static str, &str)> {
    if device == hardware::DEFAULT_DEVICE {
        Vec::new()
    } else {
        vec![("AUDIODEV", device)]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MpvPlayer;

#[async_trait]
impl FilePlayer for MpvPlayer {
    fn name(&self) -> &'static str {
        programs::MPV
    }

    async fn play_file(
        &self,
        path: &Path,
        limit_seconds: u32,
        device: &str,
        gain: f32,
    ) -> Result<(), BackendError> {
        let mut args = vec![
            "--no-video".to_string(),
            "--really-quiet".to_string(),
            format!("--length={limit_seconds}"),
            format!("--volume={}", percent(gain)),
        ];
        if device != hardware::DEFAULT_DEVICE {
            args.push(format!("--audio-device=alsa/{device}"));
        }
        args.push("--".to_string());
        args.push(path.display().to_string());

        run_bounded(programs::MPV, args, &[], bounded_limit(limit_seconds)).await
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FfplayPlayer;

#[async_trait]
impl FilePlayer for FfplayPlayer {
    fn name(&self) -> &'static str {
        programs::FFPLAY
    }

    async fn play_file(
        &self,
        path: &Path,
        limit_seconds: u32,
        device: &str,
        gain: f32,
    ) -> Result<(), BackendError> {
        let args = vec![
            "-nodisp".to_string(),
            "-autoexit".to_string(),
            "-loglevel".to_string(),
            "quiet".to_string(),
            "-t".to_string(),
            limit_seconds.to_string(),
            "-volume".to_string(),
            percent(gain).min(100).to_string(),
            path.display().to_string(),
        ];
        run_bounded(
            programs::FFPLAY,
            args,
            &audiodev_env(device),
            bounded_limit(limit_seconds),
        )
        .await
    }
}

/// sox's `play`
#[derive(Debug, Default, Clone, Copy)]
pub struct SoxPlayer;

#[async_trait]
impl FilePlayer for SoxPlayer {
    fn name(&self) -> &'static str {
        programs::SOX_PLAY
    }

    async fn play_file(
        &self,
        path: &Path,
        limit_seconds: u32,
        device: &str,
        gain: f32,
    ) -> Result<(), BackendError> {
        let args = vec![
            "-q".to_string(),
            path.display().to_string(),
            "trim".to_string(),
            "0".to_string(),
            limit_seconds.to_string(),
            "vol".to_string(),
            gain.to_string(),
        ];
        run_bounded(
            programs::SOX_PLAY,
            args,
            &audiodev_env(device),
            bounded_limit(limit_seconds),
        )
        .await
    }
}

/// PulseAudio/PipeWire `paplay`. It has no length option, so the timeout
/// is the play length and running into it counts as success.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaplayPlayer;

#[async_trait]
impl FilePlayer for PaplayPlayer {
    fn name(&self) -> &'static str {
        programs::PAPLAY
    }

    async fn play_file(
        &self,
        path: &Path,
        limit_seconds: u32,
        _device: &str,
        gain: f32,
    ) -> Result<(), BackendError> {
        let volume = ((gain.max(0.0) * 65536.0) as u32).to_string();
        let args = vec![
            format!("--volume={volume}"),
            path.display().to_string(),
        ];
        let limit = Duration::from_secs(u64::from(limit_seconds));
        match run_bounded(programs::PAPLAY, args, &[], limit).await {
            Err(BackendError::TimedOut { .. }) => Ok(()),
            other => other,
        }
    }
}

/// Players in the order they are tried
pub fn default_players() -> Vec<Box<dyn FilePlayer>> {
    vec![
        Box::new(MpvPlayer),
        Box::new(FfplayPlayer),
        Box::new(SoxPlayer),
        Box::new(PaplayPlayer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_order() {
        let names: Vec<&str> = default_players().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["mpv", "ffplay", "play", "paplay"]);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1.0), 100);
        assert_eq!(percent(0.555), 56);
        assert_eq!(percent(-1.0), 0);
    }

    #[test]
    fn test_audiodev_env_skips_default() {
        assert!(audiodev_env("default").is_empty());
        assert_eq!(audiodev_env("hw:1,0"), vec![("AUDIODEV", "hw:1,0")]);
    }

    #[test]
    fn test_bounded_limit_adds_grace() {
        assert_eq!(bounded_limit(5), Duration::from_secs(7));
    }
}
