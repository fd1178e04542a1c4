use trivia_core::QuestionCatalog;
use trivia_core::model::FlowStep;

use super::snapshot::SessionRecord;

/// What load-time repair had to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairReport {
    pub dropped_consumed: usize,
    pub dropped_history: usize,
    pub cursor_clamped: bool,
    pub cleared_current: bool,
    pub reset_flow: bool,
}

impl RepairReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.dropped_consumed > 0
            || self.dropped_history > 0
            || self.cursor_clamped
            || self.cleared_current
            || self.reset_flow
    }
}

/// Filter every question reference against the current catalog.
///
/// `persisted_cursor` is the raw cursor from storage, compared against the
/// clamped one to detect an out-of-range value.
pub fn repair(
    record: &mut SessionRecord,
    catalog: &QuestionCatalog,
    persisted_cursor: usize,
) -> RepairReport {
    let mut report = RepairReport {
        dropped_consumed: record.progress.retain_known(catalog),
        dropped_history: record.history.retain_known(catalog),
        ..RepairReport::default()
    };
    report.cursor_clamped = record.history.cursor() != persisted_cursor;

    if let Some(id) = record.state.current_question_id() {
        // A drawn card must still exist and must not already be consumed.
        let valid = catalog
            .get(id)
            .is_some_and(|question| !record.progress.is_consumed(question));
        if !valid {
            record.state.clear_card();
            record.state.set_flow_step(FlowStep::Dice);
            report.cleared_current = true;
        }
    } else if record.state.flow_step() == FlowStep::Question {
        record.state.set_flow_step(FlowStep::Dice);
        report.reset_flow = true;
    }

    report
}
