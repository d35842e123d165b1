// In crates/strategies/src/llm/state.rs

use super::recall::RecallReference;
use core_types::{RecallCriterion, TradeAssessment};
use risk::TradeLedger;

/// Everything the model-driven strategy remembers between bars of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyState {
    /// The most recent assessment, whether or not the filter acted on it.
    pub assessment: TradeAssessment,
    /// Active recall criterion; `None` until the first acquisition.
    pub recall: Option<RecallCriterion>,
    /// Price, volume and bar index captured with the criterion.
    pub reference: Option<RecallReference>,
    pub ledger: TradeLedger,
    /// Number of completed acquisitions.
    pub acquisitions: usize,
}

impl StrategyState {
    /// Replaces the assessment and criterion with a fresh acquisition.
    ///
    /// Returns `true` when the action differs from the previous one, which re-arms the ledger.
    pub fn adopt(&mut self, assessment: TradeAssessment, reference: RecallReference) -> bool {
        let changed = assessment.action != self.assessment.action;
        self.recall = Some(assessment.recall);
        self.reference = Some(reference);
        self.assessment = assessment;
        self.acquisitions += 1;
        if changed {
            self.ledger.arm();
        }
        changed
    }

    /// Forces a fresh acquisition on the next bar after a protective exit.
    pub fn reassess_now(&mut self, note: String) {
        self.recall = Some(RecallCriterion::Immediate);
        self.assessment.recall = RecallCriterion::Immediate;
        self.assessment.recall_note = note;
    }
}
