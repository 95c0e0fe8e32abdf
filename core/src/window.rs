//! Observation window: the span of calendar months a dataset covers.

use crate::{
    error::{GenError, GenResult},
    types::YearMonth,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservationWindow {
    pub start: YearMonth,
    /// Last observed month, inclusive.
    pub end:   YearMonth,
}

impl ObservationWindow {
    pub fn new(start: YearMonth, end: YearMonth) -> GenResult<Self> {
        let window = Self { start, end };
        window.check()?;
        Ok(window)
    }

    pub fn check(&self) -> GenResult<()> {
        if self.end < self.start {
            return Err(GenError::Degenerate(format!(
                "observation window ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Number of months covered, counting both ends.
    pub fn len_months(&self) -> u32 {
        (self.start.months_until(self.end) + 1).max(0) as u32
    }

    pub fn month_at(&self, offset: u32) -> YearMonth {
        self.start.add_months(offset)
    }

    /// Offset of `month` from the window start, if it lies inside the window.
    pub fn offset_of(&self, month: YearMonth) -> Option<u32> {
        let offset = self.start.months_until(month);
        (0..i64::from(self.len_months()))
            .contains(&offset)
            .then_some(offset as u32)
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.offset_of(month).is_some()
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        (0..self.len_months()).map(move |i| self.month_at(i))
    }
}
