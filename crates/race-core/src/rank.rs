//! Finishing places with shared places for ties.
//!
//! Boats are ordered by finish time with non-starters (zero time) last, then
//! given standard competition ranks: tied times share a place and the next
//! distinct time takes its position in the order, so two boats tied for
//! first are followed by third.

use std::time::Duration;

use crate::model::{Entry, RaceResult};

/// Something that can be placed by finish time.
///
/// Lets ranking work on entries joined with results as well as on bare
/// result rows or test fixtures.
pub trait Finisher {
    /// Finish time; zero means the boat did not start.
    fn finish_time(&self) -> Duration;

    /// Records the computed place.
    fn set_place(&mut self, place: u32);
}

impl Finisher for Entry {
    fn finish_time(&self) -> Duration {
        Entry::finish_time(self)
    }

    fn set_place(&mut self, place: u32) {
        let bib = self.bib;
        self.result
            .get_or_insert_with(|| RaceResult {
                bib,
                ..Default::default()
            })
            .place = place;
    }
}

impl Finisher for RaceResult {
    fn finish_time(&self) -> Duration {
        self.time
    }

    fn set_place(&mut self, place: u32) {
        self.place = place;
    }
}

/// Sorts `finishers` by time and assigns places in order.
///
/// The sort is stable: equal times, including every non-starter, keep their
/// input order. Non-starters still receive places after the finishers;
/// hiding those is up to whoever displays them.
pub fn rank<F: Finisher>(finishers: &mut [F]) {
    finishers.sort_by_key(|f| {
        let time = f.finish_time();
        (time.is_zero(), time)
    });

    let mut previous: Option<(Duration, u32)> = None;
    for (counter, finisher) in (1_u32..).zip(finishers.iter_mut()) {
        let time = finisher.finish_time();
        let place = match previous {
            Some((prev_time, prev_place)) if prev_time == time => prev_place,
            _ => counter,
        };
        finisher.set_place(place);
        previous = Some((time, place));
    }
}
