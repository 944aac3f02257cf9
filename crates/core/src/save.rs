//! Persisting pending device state to flash.
//!
//! Each firmware generation commits with its own fixed phase sequence. A save
//! issues one SAVE (0x0A) write per phase, in order, with payload
//! `[strategy, step index, phase, total steps]`.
//!
//! There is no rollback: when a step fails the device keeps whatever the last
//! successful step produced, and the caller has to issue a new save.

use crate::device::MouseDevice;
use crate::error::{Error, Result};
use crate::packet::{opcodes, WRITE};
use crate::transport::{execute, FeatureTransport};
use tracing::{debug, info, warn};

/// One phase of a save sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Unlock = 1,
    Stage = 2,
    Verify = 3,
    Commit = 4,
    Finalize = 5,
    Reload = 6,
}

impl SavePhase {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unlock => "unlock",
            Self::Stage => "stage",
            Self::Verify => "verify",
            Self::Commit => "commit",
            Self::Finalize => "finalize",
            Self::Reload => "reload",
        }
    }
}

const QUICK_PHASES: &[SavePhase] = &[SavePhase::Commit];
const CAPTURE_V1_PHASES: &[SavePhase] = &[SavePhase::Stage, SavePhase::Commit];
const CAPTURE_V2_PHASES: &[SavePhase] = &[SavePhase::Stage, SavePhase::Verify, SavePhase::Commit];
const CAPTURE_V3_PHASES: &[SavePhase] = &[
    SavePhase::Unlock,
    SavePhase::Stage,
    SavePhase::Verify,
    SavePhase::Commit,
];
const CAPTURE_V4_PHASES: &[SavePhase] = &[
    SavePhase::Unlock,
    SavePhase::Stage,
    SavePhase::Verify,
    SavePhase::Commit,
    SavePhase::Finalize,
];
const MAJOR_SYNC_PHASES: &[SavePhase] = &[
    SavePhase::Unlock,
    SavePhase::Stage,
    SavePhase::Verify,
    SavePhase::Commit,
    SavePhase::Finalize,
    SavePhase::Reload,
];

/// Save protocol variant, one per firmware generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    Quick = 0,
    CaptureV1 = 1,
    CaptureV2 = 2,
    CaptureV3 = 3,
    CaptureV4 = 4,
    MajorSync = 5,
}

impl SaveStrategy {
    pub const ALL: &'static [SaveStrategy] = &[
        Self::Quick,
        Self::CaptureV1,
        Self::CaptureV2,
        Self::CaptureV3,
        Self::CaptureV4,
        Self::MajorSync,
    ];

    /// Map a raw strategy code.
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() == code)
            .ok_or(Error::UnsupportedSaveStrategy { code })
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parse a CLI-friendly name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_'], "").as_str() {
            "quick" => Some(Self::Quick),
            "capturev1" | "v1" => Some(Self::CaptureV1),
            "capturev2" | "v2" => Some(Self::CaptureV2),
            "capturev3" | "v3" => Some(Self::CaptureV3),
            "capturev4" | "v4" => Some(Self::CaptureV4),
            "majorsync" | "major" => Some(Self::MajorSync),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::CaptureV1 => "capture-v1",
            Self::CaptureV2 => "capture-v2",
            Self::CaptureV3 => "capture-v3",
            Self::CaptureV4 => "capture-v4",
            Self::MajorSync => "major-sync",
        }
    }

    /// Fixed phase sequence for this strategy.
    pub fn phases(&self) -> &'static [SavePhase] {
        match self {
            Self::Quick => QUICK_PHASES,
            Self::CaptureV1 => CAPTURE_V1_PHASES,
            Self::CaptureV2 => CAPTURE_V2_PHASES,
            Self::CaptureV3 => CAPTURE_V3_PHASES,
            Self::CaptureV4 => CAPTURE_V4_PHASES,
            Self::MajorSync => MAJOR_SYNC_PHASES,
        }
    }

    pub fn step_count(&self) -> usize {
        self.phases().len()
    }
}

impl std::fmt::Display for SaveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Number of exchanges `strategy` needs to persist pending changes.
pub fn save_step_count_for_strategy(strategy: SaveStrategy) -> usize {
    strategy.step_count()
}

/// Progress of a single save invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing sent yet.
    Idle,
    /// Steps before the index completed; the index is the next step to send.
    Stepping(usize),
    /// Every step completed.
    Committed,
    /// The step at this index failed.
    Failed { step: usize },
}

impl SaveState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed { .. })
    }
}

/// A save in progress for one strategy.
#[derive(Debug, Clone)]
pub struct SaveSequence {
    strategy: SaveStrategy,
    state: SaveState,
}

impl SaveSequence {
    pub fn new(strategy: SaveStrategy) -> Self {
        Self {
            strategy,
            state: SaveState::Idle,
        }
    }

    pub fn strategy(&self) -> SaveStrategy {
        self.strategy
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn total_steps(&self) -> usize {
        self.strategy.step_count()
    }

    /// Index and phase of the next step, if any remains.
    pub fn next_phase(&self) -> Option<(usize, SavePhase)> {
        let index = match self.state {
            SaveState::Idle => 0,
            SaveState::Stepping(i) => i,
            SaveState::Committed | SaveState::Failed { .. } => return None,
        };
        self.strategy.phases().get(index).map(|p| (index, *p))
    }

    /// Payload of the SAVE packet for step `index`.
    pub fn step_payload(&self, index: usize, phase: SavePhase) -> [u8; 4] {
        [
            self.strategy.code(),
            index as u8,
            phase.code(),
            self.total_steps() as u8,
        ]
    }

    /// Send the next step and advance.
    ///
    /// Calling this on a finished sequence sends nothing and returns the
    /// terminal state.
    pub fn step(
        &mut self,
        transport: &dyn FeatureTransport,
        device: &MouseDevice,
    ) -> Result<SaveState> {
        let Some((index, phase)) = self.next_phase() else {
            return Ok(self.state);
        };
        let total = self.total_steps();
        self.state = SaveState::Stepping(index);

        let payload = self.step_payload(index, phase);
        if let Err(e) = execute(transport, device, opcodes::SAVE, WRITE, 0, &payload) {
            warn!(
                strategy = self.strategy.name(),
                step = index + 1,
                total,
                phase = phase.name(),
                "Save step failed"
            );
            self.state = SaveState::Failed { step: index };
            return Err(Error::SaveSequenceFailed {
                operation: "save",
                step: index + 1,
                total,
                source: Some(Box::new(e)),
            });
        }

        debug!(
            strategy = self.strategy.name(),
            step = index + 1,
            total,
            phase = phase.name(),
            "Save step done"
        );
        self.state = if index + 1 == total {
            SaveState::Committed
        } else {
            SaveState::Stepping(index + 1)
        };
        Ok(self.state)
    }

    /// Run every remaining step in order.
    pub fn run(&mut self, transport: &dyn FeatureTransport, device: &MouseDevice) -> Result<()> {
        while !self.state.is_terminal() {
            self.step(transport, device)?;
        }
        Ok(())
    }
}

/// Persist pending settings with `strategy`.
pub fn save_settings(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    strategy: SaveStrategy,
) -> Result<()> {
    let mut sequence = SaveSequence::new(strategy);
    sequence.run(transport, device)?;
    info!(
        strategy = strategy.name(),
        steps = strategy.step_count(),
        "Settings saved to flash"
    );
    Ok(())
}

/// Persist pending settings using a raw strategy code.
pub fn save_settings_by_code(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    strategy_code: u8,
) -> Result<()> {
    let strategy = SaveStrategy::from_code(strategy_code)?;
    save_settings(transport, device, strategy)
}
