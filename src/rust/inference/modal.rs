// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Modal logic selection
//!
//! Picks the modal system used for a proof. The chosen logic decides
//! which axiom-schema rules are active and which accessibility
//! properties the tableau enforces.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::Formula;

/// Normal modal systems distinguished by their accessibility relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalLogic {
    /// No constraints on accessibility
    K,
    /// Reflexive
    T,
    /// Reflexive and transitive
    S4,
    /// Equivalence relation
    S5,
    /// Serial; used for deontic reasoning
    D,
}

impl ModalLogic {
    pub fn is_reflexive(&self) -> bool {
        matches!(self, ModalLogic::T | ModalLogic::S4 | ModalLogic::S5)
    }

    pub fn is_transitive(&self) -> bool {
        matches!(self, ModalLogic::S4 | ModalLogic::S5)
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, ModalLogic::S5)
    }

    /// Every world has a successor. Reflexive frames are trivially serial.
    pub fn is_serial(&self) -> bool {
        matches!(self, ModalLogic::D) || self.is_reflexive()
    }
}

impl std::fmt::Display for ModalLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for ModalLogic {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "K" => Ok(ModalLogic::K),
            "T" => Ok(ModalLogic::T),
            "S4" => Ok(ModalLogic::S4),
            "S5" => Ok(ModalLogic::S5),
            "D" => Ok(ModalLogic::D),
            _ => Err(anyhow::anyhow!("Unknown modal logic: {}", s)),
        }
    }
}

/// Outcome of modal strategy selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSelection {
    pub logic: ModalLogic,
    pub reason: &'static str,
}

/// Chooses a modal logic for a goal and its axioms
#[derive(Debug, Clone, Default)]
pub struct ModalStrategySelector {
    forced: Option<ModalLogic>,
}

impl ModalStrategySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector that always returns `logic`
    pub fn forced(logic: ModalLogic) -> Self {
        ModalStrategySelector { forced: Some(logic) }
    }

    pub fn with_override(forced: Option<ModalLogic>) -> Self {
        ModalStrategySelector { forced }
    }

    /// Whether modal reasoning is needed at all
    pub fn requires_modal<'a>(formulas: impl IntoIterator<Item = &'a Formula>) -> bool {
        formulas.into_iter().any(|f| f.contains_deontic() || f.contains_temporal())
    }

    /// Apply the selection table to the goal and axioms together
    pub fn select(&self, goal: &Formula, axioms: &[Formula]) -> ModalSelection {
        if let Some(logic) = self.forced {
            return ModalSelection { logic, reason: "configured override" };
        }

        let all = || std::iter::once(goal).chain(axioms.iter());

        let selection = if all().any(Formula::contains_deontic) {
            ModalSelection { logic: ModalLogic::D, reason: "deontic operator present" }
        } else if all().any(|f| f.temporal_nesting() >= 2) {
            ModalSelection { logic: ModalLogic::S4, reason: "nested temporal operators" }
        } else if all().any(Formula::contains_temporal) {
            ModalSelection { logic: ModalLogic::S4, reason: "temporal operator present" }
        } else {
            ModalSelection { logic: ModalLogic::K, reason: "plain modal wrapper" }
        };

        debug!("Selected modal logic {} ({})", selection.logic, selection.reason);
        selection
    }
}
