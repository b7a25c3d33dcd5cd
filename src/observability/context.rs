//! Thread-local context tracking for crash reports.
//!
//! Records which pipeline phase is running and which store file is being
//! worked on, so a panic can say where it happened. Context guards restore
//! the previous state on drop.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

thread_local! {
    static CURRENT_CONTEXT: RefCell<TriageContext> = const { RefCell::new(TriageContext::new()) };
}

/// Snapshot of what vulntriage was doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriageContext {
    pub phase: Option<Phase>,
    pub store: Option<PathBuf>,
}

impl TriageContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            store: None,
        }
    }
}

/// Major stages of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading records from a store or file
    Loading,
    /// Normalizing and computing raw scores
    Scoring,
    /// Deriving thresholds and assigning classes
    Classifying,
    /// Capacity or top-critical selection
    Selecting,
    /// Persisting scores back to the store
    WritingBack,
    /// Rendering the report
    Reporting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Scoring => write!(f, "scoring"),
            Self::Classifying => write!(f, "classifying"),
            Self::Selecting => write!(f, "selecting"),
            Self::WritingBack => write!(f, "writing_back"),
            Self::Reporting => write!(f, "reporting"),
        }
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: TriageContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut TriageContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Enter a phase until the guard drops.
#[must_use]
pub fn set_phase(phase: Phase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Record the store being worked on until the guard drops.
#[must_use]
pub fn set_store(path: &Path) -> ContextGuard {
    let path = path.to_path_buf();
    update(|ctx| ctx.store = Some(path))
}

pub fn get_current_context() -> TriageContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}
