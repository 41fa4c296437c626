// LogPane - core/filter.rs
//
// Filter criteria and row visibility.
// All active criteria are AND-combined.
// Core layer: pure logic, no I/O.
//
// Criteria hold no rows. The view asks `matches` per row and re-runs it
// after being told which criterion changed.

use crate::core::model::Row;
use crate::util::constants;
use chrono::{NaiveDateTime, Timelike};
use std::sync::mpsc;

/// Identifies one criterion; sent to observers when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    HideInfo,
    HideTrace,
    HideDebug,
    Timestamp,
    Level,
    Source,
    Member,
    Message,
}

impl FilterField {
    /// All criteria in display order.
    pub fn all() -> &'static [FilterField] {
        &[
            FilterField::HideInfo,
            FilterField::HideTrace,
            FilterField::HideDebug,
            FilterField::Timestamp,
            FilterField::Level,
            FilterField::Source,
            FilterField::Member,
            FilterField::Message,
        ]
    }
}

/// A substring criterion with its case-folded needle cached.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextFilter {
    raw: String,
    folded: String,
}

impl TextFilter {
    fn new(raw: String) -> Self {
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    /// Single characters and blank input never filter.
    fn is_active(&self) -> bool {
        !self.raw.trim().is_empty() && self.raw.chars().count() >= constants::MIN_ACTIVE_FILTER_LEN
    }

    /// True when inactive, or when `haystack` contains the needle ignoring case.
    fn accepts(&self, haystack: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        !haystack.is_empty() && haystack.to_lowercase().contains(&self.folded)
    }
}

/// Visibility criteria for log rows.
///
/// Three level-hiding toggles and five substring filters. Each setter
/// notifies subscribers with the field it changed, and only when the value
/// actually changed.
#[derive(Debug, Default)]
pub struct FilterCriteria {
    hide_info: bool,
    hide_trace: bool,
    hide_debug: bool,
    timestamp: Option<TextFilter>,
    level: Option<TextFilter>,
    source: Option<TextFilter>,
    member: Option<TextFilter>,
    message: Option<TextFilter>,
    observers: Vec<mpsc::Sender<FilterField>>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every future change as a `FilterField`.
    ///
    /// Dropping the receiver unsubscribes on the next change.
    pub fn subscribe(&mut self) -> mpsc::Receiver<FilterField> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, field: FilterField) {
        tracing::trace!(?field, "Filter changed");
        self.observers.retain(|tx| tx.send(field).is_ok());
    }

    // -------------------------------------------------------------------------
    // Toggles
    // -------------------------------------------------------------------------

    pub fn hide_info(&self) -> bool {
        self.hide_info
    }

    pub fn hide_trace(&self) -> bool {
        self.hide_trace
    }

    pub fn hide_debug(&self) -> bool {
        self.hide_debug
    }

    pub fn set_hide_info(&mut self, value: bool) {
        self.set_toggle(FilterField::HideInfo, value);
    }

    pub fn set_hide_trace(&mut self, value: bool) {
        self.set_toggle(FilterField::HideTrace, value);
    }

    pub fn set_hide_debug(&mut self, value: bool) {
        self.set_toggle(FilterField::HideDebug, value);
    }

    fn toggle_slot(&mut self, field: FilterField) -> Option<&mut bool> {
        match field {
            FilterField::HideInfo => Some(&mut self.hide_info),
            FilterField::HideTrace => Some(&mut self.hide_trace),
            FilterField::HideDebug => Some(&mut self.hide_debug),
            _ => None,
        }
    }

    fn set_toggle(&mut self, field: FilterField, value: bool) {
        let Some(slot) = self.toggle_slot(field) else {
            return;
        };
        if *slot == value {
            return;
        }
        *slot = value;
        self.notify(field);
    }

    // -------------------------------------------------------------------------
    // Substring filters
    // -------------------------------------------------------------------------

    /// Current value of a substring filter; `None` for toggles and unset filters.
    pub fn text(&self, field: FilterField) -> Option<&str> {
        let slot = match field {
            FilterField::Timestamp => &self.timestamp,
            FilterField::Level => &self.level,
            FilterField::Source => &self.source,
            FilterField::Member => &self.member,
            FilterField::Message => &self.message,
            _ => return None,
        };
        slot.as_ref().map(|f| f.raw.as_str())
    }

    /// Set or clear (`None`) a substring filter. Ignored for toggle fields.
    pub fn set_text(&mut self, field: FilterField, value: Option<String>) {
        let slot = match field {
            FilterField::Timestamp => &mut self.timestamp,
            FilterField::Level => &mut self.level,
            FilterField::Source => &mut self.source,
            FilterField::Member => &mut self.member,
            FilterField::Message => &mut self.message,
            _ => return,
        };
        let next = value.map(TextFilter::new);
        if *slot == next {
            return;
        }
        *slot = next;
        self.notify(field);
    }

    /// Turn every toggle off and remove every substring filter.
    /// Observers hear about each criterion that was not already clear.
    pub fn clear(&mut self) {
        for &field in FilterField::all() {
            match field {
                FilterField::HideInfo | FilterField::HideTrace | FilterField::HideDebug => {
                    self.set_toggle(field, false)
                }
                _ => self.set_text(field, None),
            }
        }
    }

    /// Returns true if no criterion can hide a row.
    pub fn is_empty(&self) -> bool {
        !self.hide_info
            && !self.hide_trace
            && !self.hide_debug
            && [
                &self.timestamp,
                &self.level,
                &self.source,
                &self.member,
                &self.message,
            ]
            .into_iter()
            .all(|f| !f.as_ref().is_some_and(TextFilter::is_active))
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// Whether `row` passes every active criterion. Pure; no side effects.
    pub fn matches(&self, row: &Row) -> bool {
        if self.hide_info && row.level.eq_ignore_ascii_case(constants::LEVEL_INFO) {
            return false;
        }
        if self.hide_trace && row.level.eq_ignore_ascii_case(constants::LEVEL_TRACE) {
            return false;
        }
        if self.hide_debug && row.level.eq_ignore_ascii_case(constants::LEVEL_DEBUG) {
            return false;
        }

        if let Some(filter) = self.timestamp.as_ref().filter(|f| f.is_active()) {
            if !filter.accepts(&format_filter_timestamp(&row.timestamp)) {
                return false;
            }
        }

        let text_checks = [
            (&self.level, row.level.as_str()),
            (&self.source, row.source.as_str()),
            (&self.member, row.member.as_str()),
            (&self.message, row.message.as_str()),
        ];
        text_checks
            .into_iter()
            .all(|(filter, value)| filter.as_ref().map_or(true, |f| f.accepts(value)))
    }
}

/// Render a timestamp the way the timestamp filter matches it:
/// `yyyy-MM-dd  HH:mm:ss.ffff` (two spaces, four fractional digits), so a
/// user can type a date, a time, or both.
pub fn format_filter_timestamp(ts: &NaiveDateTime) -> String {
    // Leap-second nanos run past 999_999_999; clamp the fraction to 4 digits.
    let fraction = (ts.nanosecond() / 100_000).min(9_999);
    format!(
        "{}  {}.{fraction:04}",
        ts.format("%Y-%m-%d"),
        ts.format("%H:%M:%S")
    )
}

/// Apply criteria to a slice of rows, returning indices of visible rows.
///
/// Indices rather than copies, so the view can keep one shared row set.
pub fn apply_filters(rows: &[Row], criteria: &FilterCriteria) -> Vec<usize> {
    if criteria.is_empty() {
        return (0..rows.len()).collect();
    }

    rows.iter()
        .enumerate()
        .filter(|(_, row)| criteria.matches(row))
        .map(|(idx, _)| idx)
        .collect()
}
