// In crates/strategies/src/llm/recall.rs

use core_types::RecallCriterion;

/// Market values captured when the active recall criterion was set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecallReference {
    pub price: f64,
    pub volume: f64,
    pub bar: usize,
}

/// Decides whether the signal source should be queried on the current bar.
///
/// With no criterion stored yet the answer is always yes. A volume criterion never fires
/// against a zero reference volume.
pub fn is_due(
    criterion: Option<&RecallCriterion>,
    reference: Option<&RecallReference>,
    current_bar: usize,
    current_volume: f64,
) -> bool {
    let Some(criterion) = criterion else {
        return true;
    };

    match *criterion {
        RecallCriterion::Immediate => true,
        RecallCriterion::TimeBased { bars } => {
            let reference_bar = reference.map_or(0, |r| r.bar);
            current_bar.saturating_sub(reference_bar) >= bars as usize
        }
        RecallCriterion::VolumeChange { percent } => match reference {
            Some(r) if r.volume > 0.0 => {
                (current_volume - r.volume) / r.volume * 100.0 >= percent
            }
            _ => false,
        },
    }
}
