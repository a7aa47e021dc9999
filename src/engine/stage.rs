//! engine::stage
//!
//! The fixed lifecycle sequence.
//!
//! ```text
//! Setup:    INIT -> SETUP -> LOAD -> POSTLOAD -> INTERLINK
//! Run:      RUNSTART -> (run entry) -> RUNSTOP
//! Teardown: PRECLOSE -> SAVE -> POSTSAVE -> TEARDOWN
//! ```

use std::fmt;

use serde::Serialize;

static SEQUENCE: [Stage; 11] = Stage::ALL;

/// Lifecycle phase a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Setup,
    Run,
    Teardown,
}

impl Phase {
    /// Stages of this phase, in order.
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Phase::Setup => &SEQUENCE[0..5],
            Phase::Run => &SEQUENCE[5..7],
            Phase::Teardown => &SEQUENCE[7..11],
        }
    }
}

/// One named point in the lifecycle.
///
/// Variants are declared in execution order, so `Ord` is the lifecycle
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Init,
    Setup,
    Load,
    PostLoad,
    Interlink,
    RunStart,
    RunStop,
    PreClose,
    Save,
    PostSave,
    Teardown,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 11] = [
        Stage::Init,
        Stage::Setup,
        Stage::Load,
        Stage::PostLoad,
        Stage::Interlink,
        Stage::RunStart,
        Stage::RunStop,
        Stage::PreClose,
        Stage::Save,
        Stage::PostSave,
        Stage::Teardown,
    ];

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "INIT",
            Stage::Setup => "SETUP",
            Stage::Load => "LOAD",
            Stage::PostLoad => "POSTLOAD",
            Stage::Interlink => "INTERLINK",
            Stage::RunStart => "RUNSTART",
            Stage::RunStop => "RUNSTOP",
            Stage::PreClose => "PRECLOSE",
            Stage::Save => "SAVE",
            Stage::PostSave => "POSTSAVE",
            Stage::Teardown => "TEARDOWN",
        }
    }

    /// Phase this stage belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Stage::Init | Stage::Setup | Stage::Load | Stage::PostLoad | Stage::Interlink => {
                Phase::Setup
            }
            Stage::RunStart | Stage::RunStop => Phase::Run,
            Stage::PreClose | Stage::Save | Stage::PostSave | Stage::Teardown => Phase::Teardown,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
