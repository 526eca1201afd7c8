//! Sine tones synthesized by sox and streamed into aplay

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::LimiterSettings;
use crate::constants::{programs, timing, tone};
use crate::error::BackendError;

use super::ToneSynth;

/// How long sox gets to exit once aplay has finished
const SOX_REAP: Duration = Duration::from_millis(250);

/// Arguments for `sox` writing a WAV stream to stdout
pub fn sox_args(freq_hz: u32, seconds: f64, gain: f32, limiter: &LimiterSettings) -> Vec<String> {
    let mut args: Vec<String> = [
        "-n",
        "-r",
        tone::SAMPLE_RATE,
        "-c",
        tone::CHANNELS,
        "-b",
        tone::BITS,
        "-t",
        "wav",
        "-",
        "synth",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(format!("{seconds:.3}"));
    args.push("sine".to_string());
    args.push(freq_hz.to_string());
    args.push("vol".to_string());
    args.push(gain.to_string());

    if limiter.enabled {
        args.push("compand".to_string());
        args.push(format!("{},{}", limiter.attack, limiter.decay));
        args.push(format!("{}:-inf,0,-inf", limiter.soft_knee_db));
        args.push(limiter.target_db.to_string());
        args.push("gain".to_string());
        args.push("-n".to_string());
    }

    args
}

/// `sox ... | aplay -D <device>`
#[derive(Debug, Default, Clone, Copy)]
pub struct SoxAplaySynth;

#[async_trait]
impl ToneSynth for SoxAplaySynth {
    async fn synthesize_tone(
        &self,
        freq_hz: u32,
        seconds: f64,
        gain: f32,
        device: &str,
        limiter: &LimiterSettings,
    ) -> Result<(), BackendError> {
        let mut sox = Command::new(programs::SOX)
            .args(sox_args(freq_hz, seconds, gain, limiter))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BackendError::spawn(programs::SOX, e))?;

        let pipe: Stdio = sox
            .stdout
            .take()
            .ok_or(BackendError::Unavailable("sox stdout was not captured"))?
            .try_into()
            .map_err(|source| BackendError::Spawn {
                program: programs::SOX,
                source,
            })?;

        let mut aplay = Command::new(programs::APLAY)
            .args(["-q", "-D", device, "-f", "cd"])
            .stdin(pipe)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BackendError::spawn(programs::APLAY, e))?;

        let result = match timeout(timing::SYNTH_TIMEOUT, aplay.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(BackendError::Failed {
                program: programs::APLAY,
                status,
            }),
            Ok(Err(source)) => Err(BackendError::Spawn {
                program: programs::APLAY,
                source,
            }),
            Err(_) => Err(BackendError::TimedOut {
                program: programs::APLAY,
                limit: timing::SYNTH_TIMEOUT,
            }),
        };

        // Reap sox; kill_on_drop takes care of it if it lingers
        if timeout(SOX_REAP, sox.wait()).await.is_err() {
            let _ = sox.start_kill();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(enabled: bool) -> LimiterSettings {
        LimiterSettings {
            enabled,
            attack: 0.005,
            decay: 0.1,
            soft_knee_db: 6.0,
            target_db: -3.0,
        }
    }

    #[test]
    fn test_sox_args_plain() {
        let args = sox_args(440, 0.08, 1.0, &limiter(false));
        assert_eq!(
            args,
            vec![
                "-n", "-r", "44100", "-c", "2", "-b", "16", "-t", "wav", "-", "synth", "0.080",
                "sine", "440", "vol", "1"
            ]
        );
    }

    #[test]
    fn test_sox_args_with_limiter() {
        let args = sox_args(1000, 0.5, 0.5, &limiter(true));
        let tail: Vec<&str> = args.iter().skip(16).map(String::as_str).collect();
        assert_eq!(tail, vec!["compand", "0.005,0.1", "6:-inf,0,-inf", "-3", "gain", "-n"]);
    }
}
