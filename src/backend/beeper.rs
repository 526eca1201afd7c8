use async_trait::async_trait;

use crate::constants::{programs, timing};
use crate::error::BackendError;

use super::command::run_bounded;
use super::ToneEmitter;

/// PC speaker via the `beep` tool
#[derive(Debug, Default, Clone, Copy)]
pub struct BeepCommand;

#[async_trait]
impl ToneEmitter for BeepCommand {
    async fn emit_tone(&self, freq_hz: u32, duration_ms: u32) -> Result<(), BackendError> {
        let args = [
            "-f".to_string(),
            freq_hz.to_string(),
            "-l".to_string(),
            duration_ms.to_string(),
        ];
        run_bounded(programs::BEEP, args, &[], timing::BEEP_TIMEOUT).await
    }
}
