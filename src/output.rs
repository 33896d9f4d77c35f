//! Resampling of the sparse timeline into the dense parameter track.
//!
//! Every channel moves linearly between its defined values, one step per time quantum. The
//! intonation contour is either integrated from the cubic terms written by
//! [`EventList::apply_intonation_smooth`] or interpolated linearly like the other channels.
//! Each tick produces one line of 16 values with 3 decimals.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::{
    Event, INTONATION, INTONATION_CUBIC, INTONATION_CURVE, INTONATION_SLOPE, NUM_CHANNELS, SPECIAL_OFFSET,
    TIME_QUANTUM,
};
use crate::event_list::EventList;
use crate::model::Parameter;
use core::fmt::Write;
use rand::Rng;
#[cfg(feature = "std")]
use {
    crate::error::Error,
    alloc::string::String,
    std::{fs::OpenOptions, io::Write as _, path::Path},
};

/// First defined value of `channel` at or after event `from`.
fn next_defined(events: &[Event], from: usize, channel: usize) -> Option<(usize, f64)> {
    events
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(index, event)| event.value(channel).map(|value| (index, value)))
}

/// Step per quantum to reach `target` at `time` from `value` at `now`.
fn step_towards(value: f64, (target_time, target): (i32, f64), now: i32) -> f64 {
    (target - value) / f64::from(target_time - now) * f64::from(TIME_QUANTUM)
}

impl<R: Rng> EventList<'_, R> {
    /// Resamples the timeline into `sink`, one line per time quantum. An empty timeline writes
    /// nothing.
    pub fn generate_output_to<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        let events = &self.events;
        let Some(first) = events.first() else {
            return Ok(());
        };
        let EngineConfig {
            micro_intonation: micro,
            macro_intonation,
            smooth_intonation: smooth,
            drift,
            pitch_mean,
            ..
        } = self.config;

        let mut values = [0.0; NUM_CHANNELS];
        let mut deltas = [0.0; NUM_CHANNELS];
        for channel in 0..Parameter::COUNT {
            values[channel] = first.value(channel).unwrap_or(0.0);
            if let Some((index, target)) = next_defined(events, 1, channel) {
                deltas[channel] = step_towards(values[channel], (events[index].time, target), 0);
            }
        }
        if smooth {
            values[INTONATION] = next_defined(events, 0, INTONATION).map_or(0.0, |(_, value)| value);
        } else {
            values[INTONATION] = first.value(INTONATION).unwrap_or(0.0);
            if let Some((index, target)) = next_defined(events, 1, INTONATION) {
                deltas[INTONATION] = step_towards(values[INTONATION], (events[index].time, target), 0);
            }
            values[INTONATION] = -20.0;
        }

        let Some(second) = events.get(1) else {
            return Ok(());
        };
        let mut next_time = second.time;
        let mut current_time = 0;
        let mut index = 1;
        let mut table = [0.0_f32; Parameter::COUNT];
        while index < events.len() {
            for (channel, entry) in table.iter_mut().enumerate() {
                *entry = values[channel] as f32 + values[channel + SPECIAL_OFFSET] as f32;
            }
            if !micro {
                table[0] = 0.0;
            }
            if drift {
                table[0] = (f64::from(table[0]) + self.drift.next_sample()) as f32;
            }
            if macro_intonation {
                table[0] = (f64::from(table[0]) + values[INTONATION]) as f32;
            }
            table[0] = (f64::from(table[0]) + pitch_mean) as f32;

            for (channel, value) in table.iter().enumerate() {
                if channel > 0 {
                    sink.write_char(' ')?;
                }
                write!(sink, "{value:.3}")?;
            }
            sink.write_char('\n')?;

            for (value, delta) in values[..INTONATION].iter_mut().zip(&deltas[..INTONATION]) {
                if *delta != 0.0 {
                    *value += delta;
                }
            }
            if smooth {
                deltas[INTONATION_CURVE] += deltas[INTONATION_CUBIC];
                deltas[INTONATION_SLOPE] += deltas[INTONATION_CURVE];
                values[INTONATION] += deltas[INTONATION_SLOPE];
            } else if deltas[INTONATION] != 0.0 {
                values[INTONATION] += deltas[INTONATION];
            }
            current_time += TIME_QUANTUM;

            if current_time >= next_time {
                index += 1;
                if index == events.len() {
                    break;
                }
                next_time = events[index].time;
                let previous = &events[index - 1];
                for channel in 0..=INTONATION {
                    if previous.value(channel).is_none() {
                        continue;
                    }
                    deltas[channel] = match next_defined(events, index, channel) {
                        Some((target, value)) => {
                            step_towards(values[channel], (events[target].time, value), current_time)
                        }
                        None => 0.0,
                    };
                }
                if smooth {
                    if let Some(slope) = previous.value(INTONATION_SLOPE) {
                        values[INTONATION] = previous.value(INTONATION).unwrap_or(values[INTONATION]);
                        deltas[INTONATION] = 0.0;
                        deltas[INTONATION_SLOPE] = slope;
                        deltas[INTONATION_CURVE] = previous.value(INTONATION_CURVE).unwrap_or(0.0);
                        deltas[INTONATION_CUBIC] = previous.value(INTONATION_CUBIC).unwrap_or(0.0);
                    }
                }
            }
        }

        self.log_data_structures();
        Ok(())
    }

    /// Appends the parameter track to the file at `path`, creating it when missing. An empty
    /// timeline leaves the file untouched.
    #[cfg(feature = "std")]
    pub fn generate_output(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.events.is_empty() {
            return Ok(());
        }
        let path = path.as_ref();
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(io_error)?;
        let mut track = String::new();
        self.generate_output_to(&mut track)?;
        file.write_all(track.as_bytes()).map_err(io_error)?;
        Ok(())
    }

    /// Runs every pass over the utterance fed so far and writes the parameter track to `sink`.
    ///
    /// The contour passes only run when macro intonation is enabled.
    pub fn synthesize<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        self.generate_event_list()?;
        if self.config.macro_intonation {
            self.apply_intonation()?;
            self.apply_intonation_smooth();
        }
        self.generate_output_to(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intonation::IntonationConfig;
    use crate::model::{Category, Model};
    use alloc::{format, string::String, vec, vec::Vec};
    use rand::rngs::mock::StepRng;

    fn model() -> Model {
        let mut builder = Model::builder().category(Category::new("vocoid", 1));
        for i in 0..Parameter::COUNT {
            builder = builder.parameter(Parameter::new(&format!("p{i}"), -100.0, 100.0, 0.0));
        }
        builder.build().unwrap()
    }

    fn quiet() -> EngineConfig {
        EngineConfig {
            drift: false,
            macro_intonation: false,
            ..EngineConfig::default()
        }
    }

    fn event(time: i32, values: &[(usize, f64)]) -> Event {
        let mut event = Event::new(time);
        for &(channel, value) in values {
            event.set_value(channel, value);
        }
        event
    }

    fn rows(track: &str) -> Vec<Vec<f64>> {
        track
            .lines()
            .map(|line| line.split(' ').map(|field| field.parse().unwrap()).collect())
            .collect()
    }

    #[test]
    fn channel_is_interpolated_linearly() {
        let model = model();
        let mut list = EventList::new(&model, quiet(), IntonationConfig::default(), StepRng::new(0, 0));
        list.events = vec![event(0, &[(0, 0.0)]), event(100, &[(0, 100.0)])];
        let mut track = String::new();
        list.generate_output_to(&mut track).unwrap();

        let rows = rows(&track);
        assert_eq!(rows.len(), 25);
        assert!(rows.iter().all(|row| row.len() == Parameter::COUNT));
        assert_eq!(rows[12][0], 48.0);
        assert_eq!(rows[13][0], 52.0);
        assert!(rows.iter().enumerate().all(|(i, row)| row[0] == (4 * i) as f64));
        assert!(track.starts_with("0.000 0.000 "));
    }

    #[test]
    fn special_channel_is_added_and_settles_on_its_last_value() {
        let model = model();
        let mut list = EventList::new(&model, quiet(), IntonationConfig::default(), StepRng::new(0, 0));
        list.events = vec![
            event(0, &[(3, 10.0)]),
            event(8, &[(3 + SPECIAL_OFFSET, 0.0)]),
            event(16, &[(3, 14.0), (3 + SPECIAL_OFFSET, 8.0)]),
            event(24, &[]),
        ];
        let mut track = String::new();
        list.generate_output_to(&mut track).unwrap();
        let column: Vec<f64> = rows(&track).iter().map(|row| row[3]).collect();
        // channel 3 climbs 1 per tick until t=16, the special channel 4 per tick from t=8 to
        // t=16; neither moves once its last value is reached
        assert_eq!(column, vec![10.0, 11.0, 12.0, 17.0, 22.0, 22.0]);
    }

    #[test]
    fn pitch_channel_switches() {
        let model = model();
        let config = EngineConfig {
            micro_intonation: false,
            pitch_mean: 3.5,
            ..quiet()
        };
        let mut list = EventList::new(&model, config, IntonationConfig::default(), StepRng::new(0, 0));
        list.events = vec![event(0, &[(0, 7.0)]), event(8, &[(0, 7.0)])];
        let mut track = String::new();
        list.generate_output_to(&mut track).unwrap();
        let mut expected = vec![0.0; Parameter::COUNT];
        expected[0] = 3.5;
        assert_eq!(rows(&track), vec![expected.clone(), expected]);

        list.config_mut().smooth_intonation = false;
        list.config_mut().macro_intonation = true;
        list.config_mut().pitch_mean = 0.0;
        let mut track = String::new();
        list.generate_output_to(&mut track).unwrap();
        assert!(rows(&track).iter().all(|row| row[0] == -20.0));
    }

    #[test]
    fn empty_or_single_event_timeline_writes_nothing() {
        let model = model();
        let mut list = EventList::new(&model, quiet(), IntonationConfig::default(), StepRng::new(0, 0));
        let mut track = String::new();
        list.generate_output_to(&mut track).unwrap();
        list.events = vec![event(0, &[(0, 1.0)])];
        list.generate_output_to(&mut track).unwrap();
        assert!(track.is_empty());
    }

    #[cfg(feature = "std")]
    #[test]
    fn output_file_is_appended() {
        let model = model();
        let mut list = EventList::new(&model, quiet(), IntonationConfig::default(), StepRng::new(0, 0));
        let path = std::env::temp_dir().join(format!("trm-control-output-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        list.generate_output(&path).unwrap();
        assert!(!path.exists());

        list.events = vec![event(0, &[(1, 1.0)]), event(8, &[(1, 1.0)])];
        list.generate_output(&path).unwrap();
        list.generate_output(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        std::fs::remove_file(&path).unwrap();

        let missing = std::env::temp_dir().join("trm-control-no-such-dir").join("track.txt");
        assert!(matches!(list.generate_output(&missing), Err(Error::Io { .. })));
    }
}
