//! Tone group pitch contours.
//!
//! [`EventList::apply_intonation`] places pitch control points on the rule beats of every closed
//! tone group, using the parameter table configured for the group's type.
//! [`EventList::apply_intonation_smooth`] then fits a cubic between each pair of neighbouring
//! points and writes its value and derivatives to the intonation channels, where the resampling
//! pass integrates them back into a contour.
//!
//! A tone group table row holds 10 values; the contour uses:
//! ```text
//! [1] pretonic range / baseline   [2] tonic offset     [3] pretonic jitter
//! [5] final drop                  [6] tonic jitter
//! ```

use crate::error::Result;
use crate::event::{INTONATION, INTONATION_CUBIC, INTONATION_CURVE, INTONATION_SLOPE};
use crate::event_list::EventList;
use alloc::vec::Vec;
use log::{debug, trace, warn};
use rand::Rng;
#[cfg(feature = "std")]
use crate::error::Error;
#[cfg(feature = "std")]
use std::path::Path;

/// Maximum number of tone group tables.
pub const MAX_TONE_GROUP_TABLES: usize = 5;

/// Values in one tone group table row.
pub const TONE_GROUP_ROW_LEN: usize = 10;

pub type ToneGroupRow = [f32; TONE_GROUP_ROW_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneGroupType {
    #[default]
    Statement,
    Exclamation,
    Question,
    Continuation,
    Semicolon,
}

impl ToneGroupType {
    /// Index of the table that holds this type's parameters.
    pub fn table_index(self) -> usize {
        match self {
            Self::Statement | Self::Exclamation => 0,
            Self::Question => 1,
            Self::Continuation => 2,
            Self::Semicolon => 3,
        }
    }
}

/// Tone group parameter tables, read from the line oriented intonation resource.
///
/// ```text
/// # comment
/// TG 2
/// 0 -2 -4 1 0 -6 1 0 0 0
/// 0 -1 -3 1 0 -5 1 0 0 0
/// RANDOM 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntonationConfig {
    tables: Vec<Vec<ToneGroupRow>>,
    /// jitter scale of the `RANDOM` record
    pub random: f32,
}

impl IntonationConfig {
    pub fn new(tables: Vec<Vec<ToneGroupRow>>, random: f32) -> Self {
        IntonationConfig { tables, random }
    }

    /// Parses the intonation resource. Lines starting with `#` or a space are skipped. A
    /// malformed number ends its line; the remaining values of the row stay 0.
    pub fn parse(text: &str) -> Self {
        let mut config = IntonationConfig::default();
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            if line.starts_with('#') || line.starts_with(' ') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("TG") {
                let count = match rest.split_whitespace().next().map(str::parse::<usize>) {
                    Some(Ok(count)) => count,
                    _ => {
                        warn!("Bad tone group count: {line}");
                        0
                    }
                };
                let rows: Vec<ToneGroupRow> = lines.by_ref().take(count).map(parse_row).collect();
                if rows.len() < count {
                    warn!("Tone group table ends after {} of {count} rows.", rows.len());
                }
                if config.tables.len() < MAX_TONE_GROUP_TABLES {
                    config.tables.push(rows);
                } else {
                    warn!("Ignoring tone group table beyond the first {MAX_TONE_GROUP_TABLES}.");
                }
            } else if let Some(rest) = line.strip_prefix("RANDOM") {
                match rest.split_whitespace().next().map(str::parse::<f32>) {
                    Some(Ok(random)) => config.random = random,
                    _ => warn!("Bad intonation random value: {line}"),
                }
            }
        }
        config.log();
        config
    }

    /// Reads and parses the intonation resource at `path`.
    #[cfg(feature = "std")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Rows of table `index`; empty when the table was not configured.
    pub fn table(&self, index: usize) -> &[ToneGroupRow] {
        self.tables.get(index).map_or(&[], Vec::as_slice)
    }

    fn log(&self) {
        debug!("Intonation random = {}", self.random);
        for (i, table) in self.tables.iter().enumerate() {
            debug!("Tone group table {i}: {} rows", table.len());
            for row in table {
                debug!("{row:?}");
            }
        }
    }
}

fn parse_row(line: &str) -> ToneGroupRow {
    let mut row = [0.0; TONE_GROUP_ROW_LEN];
    for (value, field) in row.iter_mut().zip(line.split_whitespace()) {
        match field.parse() {
            Ok(parsed) => *value = parsed,
            Err(_) => {
                warn!("Bad tone group value {field} in: {line}");
                break;
            }
        }
    }
    row
}

/// A pitch control point anchored to a rule segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntonationPoint {
    pub semitone: f64,
    /// time relative to the beat of the anchor rule
    pub offset_time: f64,
    pub slope: f64,
    pub rule_index: usize,
    /// beat of the anchor rule plus the offset
    pub absolute_time: f64,
}

/// Coefficients `(a, b, c, d)` of the cubic `a*x^3 + b*x^2 + c*x + d` through `(x1, y1)` and
/// `(x2, y2)` with slopes `m1` and `m2` there.
pub(crate) fn cubic_coefficients(
    (x1, y1, m1): (f64, f64, f64),
    (x2, y2, m2): (f64, f64, f64),
) -> (f64, f64, f64, f64) {
    let x12 = x1 * x1;
    let x13 = x12 * x1;
    let x22 = x2 * x2;
    let x23 = x22 * x2;
    let mut denominator = x2 - x1;
    denominator = denominator * denominator * denominator;

    let d = (-(y2 * x13) + 3.0 * y2 * x12 * x2 + m2 * x13 * x2 + m1 * x12 * x22
        - m2 * x12 * x22
        - 3.0 * x1 * y1 * x22
        - m1 * x1 * x23
        + y1 * x23)
        / denominator;
    let c = (-(m2 * x13) - 6.0 * y2 * x1 * x2 - 2.0 * m1 * x12 * x2 - m2 * x12 * x2
        + 6.0 * x1 * y1 * x2
        + m1 * x1 * x22
        + 2.0 * m2 * x1 * x22
        + m1 * x23)
        / denominator;
    let b = (3.0 * y2 * x1 + m1 * x12 + 2.0 * m2 * x12 - 3.0 * x1 * y1 + 3.0 * x2 * y2
        + m1 * x1 * x2
        - m2 * x1 * x2
        - 3.0 * y1 * x2
        - 2.0 * m1 * x22
        - m2 * x22)
        / denominator;
    let a = (-2.0 * y2 - m1 * x1 - m2 * x1 + 2.0 * y1 + m1 * x2 + m2 * x2) / denominator;
    (a, b, c, d)
}

impl<R: Rng> EventList<'_, R> {
    /// Places the intonation points of every closed tone group.
    ///
    /// The first foot of the utterance anchors its point on the rule beat, later feet 40 ms
    /// earlier. A closing point at the final drop ends the utterance.
    pub fn apply_intonation(&mut self) -> Result<()> {
        if self.events.is_empty() {
            return Ok(());
        }
        self.set_full_time_scale();
        self.intonation_points.clear();

        let vocoid = self.model.category_code(&self.config.vocoid_category)?;
        let random = self.config.random_intonation;
        let mut parameters: Option<ToneGroupRow> = None;
        let mut rule_index = 0;
        let mut offset_time = 0.0;

        for group in 0..self.current_tone_group {
            let tone_group = self.tone_groups[group];
            let end_foot = tone_group.end_foot.unwrap_or(self.current_foot);
            let start_time = self.phones[self.feet[tone_group.start_foot].start].onset;
            let end_time = self.phones[self.foot_end(end_foot)].onset;

            let row = self.select_tone_group_row(tone_group.tone_group_type);
            parameters = Some(row);
            let [_, pretonic, tonic, pretonic_jitter, _, final_drop, tonic_jitter, ..] = row.map(f64::from);
            let pretonic_delta = pretonic / (end_time - start_time);

            for foot_index in tone_group.start_foot..=end_foot {
                let foot = self.feet[foot_index];
                let foot_end = self.foot_end(foot_index);
                let anchor = (foot.start..=foot_end)
                    .find(|&index| {
                        self.phones[index]
                            .posture
                            .is_some_and(|posture| posture.is_member_of_category(vocoid))
                    })
                    .unwrap_or(foot.start);
                if let Some(index) = self.rule_covering(anchor, 0) {
                    rule_index = index;
                }

                if foot.marked {
                    let mut slope = if tone_group.tone_group_type == ToneGroupType::Continuation {
                        0.01
                    } else {
                        0.02
                    };
                    let semitone = if random {
                        let semitone = self.rng.random::<f64>() * tonic_jitter - tonic_jitter / 2.0;
                        slope += self.rng.random::<f64>() * 0.03;
                        semitone
                    } else {
                        slope += 0.03;
                        0.0
                    };
                    self.add_intonation_point(
                        f64::from(row[2] + row[1]) + semitone,
                        offset_time,
                        slope,
                        rule_index,
                    );

                    if let Some(index) = self.rule_covering(foot_end, rule_index) {
                        rule_index = index;
                    }
                    self.add_intonation_point(f64::from(row[2] + row[1] + row[5]), 0.0, 0.0, rule_index);
                } else {
                    let (semitone, slope) = if random {
                        let semitone =
                            self.rng.random::<f64>() * pretonic_jitter - pretonic_jitter / 2.0;
                        (semitone, self.rng.random::<f64>() * 0.015 + 0.01)
                    } else {
                        (0.0, 0.02)
                    };
                    let onset = self.phones[anchor].onset;
                    self.add_intonation_point(
                        (onset - start_time) * pretonic_delta + pretonic + semitone,
                        offset_time,
                        slope,
                        rule_index,
                    );
                }
                offset_time = -40.0;
            }
            trace!("Tone group {group}: tonic {tonic}, final drop {final_drop}.");
        }

        if let (Some(row), Some(last_rule)) = (parameters, self.current_rule.checked_sub(1)) {
            self.add_intonation_point(f64::from(row[2] + row[1] + row[5]), 0.0, 0.0, last_rule);
        }
        Ok(())
    }

    fn select_tone_group_row(&mut self, tone_group_type: ToneGroupType) -> ToneGroupRow {
        let table = self.intonation_config.table(tone_group_type.table_index());
        if table.is_empty() {
            warn!("No intonation table for {tone_group_type:?} tone groups.");
            return [0.0; TONE_GROUP_ROW_LEN];
        }
        let entry = if self.config.random_intonation {
            self.rng.random_range(0..table.len())
        } else {
            0
        };
        table[entry]
    }

    /// First rule segment from `from` on that covers `phone`.
    fn rule_covering(&self, phone: usize, from: usize) -> Option<usize> {
        (from..self.current_rule).find(|&index| {
            let segment = &self.rule_data[index];
            segment.first_phone <= phone && phone <= segment.last_phone
        })
    }

    /// Adds a point `offset_time` after the beat of rule segment `rule_index`, keeping the points
    /// sorted by absolute time. Points on segments not applied yet are ignored.
    pub fn add_intonation_point(&mut self, semitone: f64, offset_time: f64, slope: f64, rule_index: usize) {
        if rule_index > self.current_rule {
            return;
        }
        let absolute_time = self.beat_at_index(rule_index) + offset_time;
        let point = IntonationPoint {
            semitone,
            offset_time,
            slope,
            rule_index,
            absolute_time,
        };
        trace!("Intonation point {point:?}");
        let position = self
            .intonation_points
            .iter()
            .position(|other| absolute_time < other.absolute_time)
            .unwrap_or(self.intonation_points.len());
        self.intonation_points.insert(position, point);
    }

    /// Writes the contour between each pair of neighbouring points into the intonation
    /// channels, at the time of the first point of the pair.
    ///
    /// Times are measured in quanta and semitones offset by 20 for the fit. The value goes to
    /// the contour channel, the first derivative, the second derivative and the constant third
    /// derivative of the cubic to the three channels after it.
    pub fn apply_intonation_smooth(&mut self) {
        if self.events.is_empty() {
            return;
        }
        self.set_full_time_scale();

        for pair in 0..self.intonation_points.len().saturating_sub(1) {
            let first = self.intonation_points[pair];
            let second = self.intonation_points[pair + 1];

            let x1 = first.absolute_time / 4.0;
            let (a, b, c, _) = cubic_coefficients(
                (x1, first.semitone + 20.0, first.slope),
                (second.absolute_time / 4.0, second.semitone + 20.0, second.slope),
            );

            let time = first.absolute_time;
            self.insert_event(Some(INTONATION), time, first.semitone);
            self.insert_event(Some(INTONATION_SLOPE), time, (3.0 * a * x1 * x1) + (2.0 * b * x1) + c);
            self.insert_event(Some(INTONATION_CURVE), time, (6.0 * a * x1) + (2.0 * b));
            self.insert_event(Some(INTONATION_CUBIC), time, 6.0 * a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1E-9;

    #[test]
    fn parse_reads_tables_and_random() {
        let config = IntonationConfig::parse(
            "# intonation\nTG 2\n1 2 3 4 5 6 7 8 9 10\n# not skipped inside a table\n TG 9\nTG 1\n0.5 -1.5\nRANDOM 0.25\nunknown line\n",
        );
        assert_eq!(config.random, 0.25);
        assert_eq!(config.table(0).len(), 2);
        assert_eq!(config.table(0)[0][9], 10.0);
        // a comment line read as a row is malformed from its first field
        assert_eq!(config.table(0)[1], [0.0; TONE_GROUP_ROW_LEN]);
        assert_eq!(config.table(1), &[[0.5, -1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]]);
        assert!(config.table(2).is_empty());
    }

    #[test]
    fn malformed_field_ends_the_row() {
        let config = IntonationConfig::parse("TG 1\n1 2 x 4\n");
        assert_eq!(config.table(0)[0][..4], [1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn extra_tables_are_ignored() {
        let text = "TG 1\n1\n".repeat(7);
        let config = IntonationConfig::parse(&text);
        assert!(config.table(MAX_TONE_GROUP_TABLES - 1).len() == 1);
        assert!(config.table(MAX_TONE_GROUP_TABLES).is_empty());
    }

    #[test]
    fn table_index_shares_statement_table() {
        assert_eq!(ToneGroupType::Statement.table_index(), 0);
        assert_eq!(ToneGroupType::Exclamation.table_index(), 0);
        assert_eq!(ToneGroupType::Question.table_index(), 1);
        assert_eq!(ToneGroupType::Continuation.table_index(), 2);
        assert_eq!(ToneGroupType::Semicolon.table_index(), 3);
    }

    #[test]
    fn cubic_matches_end_points_and_slopes() {
        let (x1, y1, m1) = (3.0, 5.0, 0.2);
        let (x2, y2, m2) = (17.0, 9.0, -0.4);
        let (a, b, c, d) = cubic_coefficients((x1, y1, m1), (x2, y2, m2));
        let y = |x: f64| a * x * x * x + b * x * x + c * x + d;
        let dy = |x: f64| 3.0 * a * x * x + 2.0 * b * x + c;
        assert!((y(x1) - y1).abs() < EPSILON);
        assert!((y(x2) - y2).abs() < EPSILON);
        assert!((dy(x1) - m1).abs() < EPSILON);
        assert!((dy(x2) - m2).abs() < EPSILON);
    }
}
