//! The per-utterance timeline: boundary intake, the rhythm and rule passes, and event insertion.
//!
//! An [`EventList`] borrows a read-only [`Model`] and builds its own phone, foot, tone group and
//! rule segment arenas while the caller feeds it postures and prosodic boundaries. Records refer
//! to each other by index. [`EventList::set_up`] discards all of it before the next utterance.

use crate::config::EngineConfig;
use crate::drift::{CONTROL_RATE, DriftGenerator};
use crate::error::{Error, Result};
use crate::event::{Event, SPECIAL_OFFSET, TIME_QUANTUM, quantize};
use crate::formula::FormulaSymbolList;
use crate::intonation::{IntonationConfig, IntonationPoint, ToneGroupType};
use crate::model::{Model, Parameter, Posture, RuleMatch};
use crate::transition::{PointOrSlope, PointType, SlopeRatio, clamp_value};
use alloc::vec::Vec;
use log::{Level, debug, log_enabled, trace};
use rand::Rng;

/// One posture slot of the utterance.
#[derive(Debug, Clone, Copy)]
pub struct Phone<'a> {
    /// empty until a posture is placed in the slot
    pub posture: Option<&'a Posture>,
    pub syllable: bool,
    /// time the phone starts, set by the rule that covers it
    pub onset: f64,
    pub tempo: f64,
    /// divides the durations of the rule that starts at this phone
    pub rule_tempo: f32,
}

impl Default for Phone<'_> {
    fn default() -> Self {
        Phone {
            posture: None,
            syllable: false,
            onset: 0.0,
            tempo: 1.0,
            rule_tempo: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Foot {
    pub tempo: f64,
    /// first phone index
    pub start: usize,
    /// last phone index, set when the foot is closed
    pub end: Option<usize>,
    /// carries the tonic stress of its tone group
    pub marked: bool,
    pub last: bool,
}

impl Default for Foot {
    fn default() -> Self {
        Foot {
            tempo: 1.0,
            start: 0,
            end: None,
            marked: false,
            last: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneGroup {
    pub start_foot: usize,
    /// last foot index, set when the tone group is closed
    pub end_foot: Option<usize>,
    pub tone_group_type: ToneGroupType,
}

/// The part of the timeline produced by one rule application.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RuleData {
    /// 1 based number of the rule in the model
    pub number: usize,
    pub first_phone: usize,
    pub last_phone: usize,
    pub duration: f64,
    /// absolute time of the rule's beat
    pub beat: f64,
}

/// Builds the parameter timeline of one utterance at a time.
pub struct EventList<'a, R> {
    pub(crate) model: &'a Model,
    pub(crate) config: EngineConfig,
    pub(crate) intonation_config: IntonationConfig,
    pub(crate) rng: R,
    pub(crate) drift: DriftGenerator<R>,

    /// time origin of the rule being applied
    pub(crate) zero_ref: i32,
    /// first event the backward insertion scan may visit
    pub(crate) zero_index: usize,
    /// events past `duration + TIME_QUANTUM` are dropped
    pub(crate) duration: i32,
    /// scales every inserted time
    pub(crate) multiplier: f64,

    pub(crate) phones: Vec<Phone<'a>>,
    pub(crate) current_phone: usize,
    pub(crate) feet: Vec<Foot>,
    pub(crate) current_foot: usize,
    pub(crate) tone_groups: Vec<ToneGroup>,
    pub(crate) current_tone_group: usize,
    pub(crate) rule_data: Vec<RuleData>,
    pub(crate) current_rule: usize,

    pub(crate) events: Vec<Event>,
    pub(crate) intonation_points: Vec<IntonationPoint>,
}

impl<'a, R: Rng + Clone> EventList<'a, R> {
    pub fn new(
        model: &'a Model,
        config: EngineConfig,
        intonation_config: IntonationConfig,
        rng: R,
    ) -> Self {
        let drift = DriftGenerator::new(
            config.drift_deviation,
            CONTROL_RATE,
            config.drift_cutoff,
            rng.clone(),
        );
        let mut event_list = EventList {
            model,
            config,
            intonation_config,
            rng,
            drift,
            zero_ref: 0,
            zero_index: 0,
            duration: 0,
            multiplier: 1.0,
            phones: Vec::new(),
            current_phone: 0,
            feet: Vec::new(),
            current_foot: 0,
            tone_groups: Vec::new(),
            current_tone_group: 0,
            rule_data: Vec::new(),
            current_rule: 0,
            events: Vec::with_capacity(128),
            intonation_points: Vec::new(),
        };
        event_list.set_up();
        event_list
    }
}

impl<'a, R: Rng> EventList<'a, R> {
    /// Discards the previous utterance.
    pub fn set_up(&mut self) {
        self.events.clear();
        self.intonation_points.clear();
        self.zero_ref = 0;
        self.zero_index = 0;
        self.duration = 0;
        self.multiplier = 1.0;

        self.phones.clear();
        self.phones.push(Phone::default());
        self.current_phone = 0;
        self.feet.clear();
        self.feet.push(Foot::default());
        self.current_foot = 0;
        self.tone_groups.clear();
        self.tone_groups.push(ToneGroup::default());
        self.current_tone_group = 0;
        self.rule_data.clear();
        self.rule_data.push(RuleData::default());
        self.current_rule = 0;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Phone slots, including the open one at the end.
    pub fn phones(&self) -> &[Phone<'a>] {
        &self.phones
    }

    pub fn feet(&self) -> &[Foot] {
        &self.feet
    }

    pub fn tone_groups(&self) -> &[ToneGroup] {
        &self.tone_groups
    }

    /// Rule segments applied so far.
    pub fn rule_data(&self) -> &[RuleData] {
        &self.rule_data[..self.current_rule]
    }

    pub fn intonation_points(&self) -> &[IntonationPoint] {
        &self.intonation_points
    }

    /// Beat time of a rule segment; 0.0 past the segments applied so far.
    pub fn beat_at_index(&self, rule_index: usize) -> f64 {
        if rule_index > self.current_rule {
            0.0
        } else {
            self.rule_data[rule_index].beat
        }
    }

    //--- Boundary intake ------------------------------------------------------

    /// Opens a new phone slot unless the current one is still empty.
    pub fn new_phone(&mut self) {
        if self.phones[self.current_phone].posture.is_some() {
            self.phones.push(Phone::default());
            self.current_phone += 1;
        }
        self.phones[self.current_phone].tempo = 1.0;
    }

    pub fn new_phone_with_posture(&mut self, posture: &'a Posture) {
        self.new_phone();
        let phone = &mut self.phones[self.current_phone];
        phone.rule_tempo = 1.0;
        phone.posture = Some(posture);
    }

    /// Replaces the posture of the current slot, or of the previous one when the current slot is
    /// still empty.
    pub fn replace_current_phone_with(&mut self, posture: &'a Posture) {
        let index = if self.phones[self.current_phone].posture.is_some() {
            self.current_phone
        } else {
            self.current_phone.saturating_sub(1)
        };
        self.phones[index].posture = Some(posture);
    }

    pub fn set_current_phone_tempo(&mut self, tempo: f64) {
        self.phones[self.current_phone].tempo = tempo;
    }

    pub fn set_current_phone_rule_tempo(&mut self, tempo: f32) {
        self.phones[self.current_phone].rule_tempo = tempo;
    }

    pub fn set_current_phone_syllable(&mut self) {
        self.phones[self.current_phone].syllable = true;
    }

    /// Closes the current foot at the current phone and opens the next one. Does nothing before
    /// the first phone.
    pub fn new_foot(&mut self) {
        if self.current_phone == 0 {
            return;
        }
        self.feet[self.current_foot].end = Some(self.current_phone);
        self.current_foot += 1;
        self.new_phone();
        self.feet.push(Foot {
            start: self.current_phone,
            ..Foot::default()
        });
    }

    pub fn set_current_foot_marked(&mut self) {
        self.feet[self.current_foot].marked = true;
    }

    pub fn set_current_foot_last(&mut self) {
        self.feet[self.current_foot].last = true;
    }

    pub fn set_current_foot_tempo(&mut self, tempo: f64) {
        self.feet[self.current_foot].tempo = tempo;
    }

    /// Closes the current tone group (and its last foot) and opens the next one. Does nothing
    /// before the first foot is closed.
    pub fn new_tone_group(&mut self) {
        if self.current_foot == 0 {
            return;
        }
        self.tone_groups[self.current_tone_group].end_foot = Some(self.current_foot);
        self.current_tone_group += 1;
        self.new_foot();
        self.tone_groups.push(ToneGroup {
            start_foot: self.current_foot,
            ..ToneGroup::default()
        });
    }

    pub fn set_current_tone_group_type(&mut self, tone_group_type: ToneGroupType) {
        self.tone_groups[self.current_tone_group].tone_group_type = tone_group_type;
    }

    pub(crate) fn foot_end(&self, foot: usize) -> usize {
        self.feet[foot].end.unwrap_or(self.current_phone)
    }

    //--- Event insertion ------------------------------------------------------

    /// Writes `value` to `channel` at `time` (relative to the zero reference, scaled by the
    /// multiplier and rounded down onto the time grid). Writes to an existing time stamp merge
    /// into its event. With no channel only the time stamp is created.
    ///
    /// Times before the zero reference or past the rule duration plus one quantum are dropped.
    pub fn insert_event(&mut self, channel: Option<usize>, time: f64, value: f64) -> Option<&mut Event> {
        let time = time * self.multiplier;
        if time < 0.0 || time > f64::from(self.duration) + f64::from(TIME_QUANTUM) {
            return None;
        }
        let time = quantize(self.zero_ref.saturating_add(time as i32));

        let mut slot = Err(self.zero_index.min(self.events.len()));
        for index in (self.zero_index..self.events.len()).rev() {
            let event_time = self.events[index].time;
            if event_time == time {
                slot = Ok(index);
                break;
            }
            if event_time < time {
                slot = Err(index + 1);
                break;
            }
        }
        let index = match slot {
            Ok(index) => index,
            Err(index) => {
                self.events.insert(index, Event::new(time));
                index
            }
        };

        let event = &mut self.events[index];
        if let Some(channel) = channel {
            event.set_value(channel, value);
        }
        Some(event)
    }

    fn insert_marker(&mut self, time: f64) {
        if let Some(event) = self.insert_event(None, time, 0.0) {
            event.flag = true;
        }
    }

    /// Moves the time origin. Later insertions scan back no further than the last event before
    /// the new origin.
    pub fn set_zero_ref(&mut self, zero_ref: i32) {
        self.zero_ref = zero_ref;
        self.zero_index = self
            .events
            .iter()
            .rposition(|event| event.time < zero_ref)
            .unwrap_or(0);
    }

    pub(crate) fn set_full_time_scale(&mut self) {
        self.zero_ref = 0;
        self.zero_index = 0;
        self.duration = self.events.last().map_or(0, |event| event.time).saturating_add(100);
    }

    //--- Event list generation ------------------------------------------------

    /// Runs the rhythm pass over the closed feet, then applies a rule to every window of the
    /// utterance.
    pub fn generate_event_list(&mut self) -> Result<()> {
        let filled = self.phones.iter().filter(|phone| phone.posture.is_some()).count();
        if filled < 2 {
            return Err(Error::TooFewPostures(filled));
        }

        let global_tempo = self.config.global_tempo;
        for foot in &mut self.feet[..self.current_foot] {
            let Some(end) = foot.end else {
                continue;
            };
            foot.tempo -= foot_tempo_adjustment(end + 1 - foot.start, foot.marked);
            let foot_tempo = global_tempo * foot.tempo;
            for phone in &mut self.phones[foot.start..=end] {
                phone.tempo = clamp_tempo(phone.tempo * foot_tempo);
            }
        }

        let model = self.model;
        let mut base = 0;
        while base < self.current_phone {
            let last = self.current_phone.min(base + 3);
            let postures: Vec<&'a Posture> = self.phones[base..=last]
                .iter()
                .map_while(|phone| phone.posture)
                .collect();
            if postures.len() < 2 {
                break;
            }
            let found = model.find_first_matching_rule(&postures)?;
            self.apply_rule(found, &postures, base)?;
            base += found.window_length - 1;
        }
        debug!(
            "Event list generated: {} events, {} rule segments.",
            self.events.len(),
            self.current_rule
        );
        Ok(())
    }

    /// Applies `found` to the window starting at phone `base`. `postures` holds the whole look
    /// ahead window, which may be longer than the rule.
    fn apply_rule(&mut self, found: RuleMatch<'a>, postures: &[&'a Posture], base: usize) -> Result<()> {
        let model = self.model;
        let rule = found.rule;
        let tempos: Vec<f64> = self.phones[base..base + postures.len()]
            .iter()
            .map(|phone| phone.tempo)
            .collect();
        let symbols = rule.evaluate_expression_symbols(&tempos, postures, model)?;

        self.multiplier = 1.0 / f64::from(self.phones[base].rule_tempo);
        let window = rule.number_of_expressions();
        let duration = symbols.duration * self.multiplier;
        self.duration = duration as i32;

        let zero_ref = f64::from(self.zero_ref);
        self.rule_data[self.current_rule] = RuleData {
            number: found.index + 1,
            first_phone: base,
            last_phone: base + window - 1,
            duration,
            beat: symbols.beat * self.multiplier + zero_ref,
        };
        self.current_rule += 1;
        self.rule_data.push(RuleData::default());
        trace!(
            "Rule {} at phone {base}, window {window}, duration {duration}, beat {}.",
            found.index + 1,
            symbols.beat
        );

        let onset = zero_ref + symbols.beat;
        if window == 4 {
            self.phones[base + 3].onset = onset;
            self.insert_marker(symbols.mark2);
        }
        if window >= 3 {
            self.phones[base + 2].onset = onset;
            self.insert_marker(symbols.mark1);
        }
        self.phones[base + 1].onset = onset;
        self.insert_marker(0.0);

        for parameter in 0..Parameter::COUNT {
            let mut targets = [0.0; 4];
            for (target, posture) in targets.iter_mut().zip(postures) {
                *target = posture.target(parameter);
            }
            let flat = targets[1..window].iter().all(|&target| target == targets[0]);

            self.insert_event(Some(parameter), 0.0, targets[0]);
            if flat {
                continue;
            }

            let info = model.parameter_info(parameter);
            let (min, max) = (f64::from(info.minimum), f64::from(info.maximum));
            let transition = model.find_transition(rule.param_transition(parameter))?;

            let mut current_type = PointType::Diphone;
            let mut delta = targets[1] - targets[0];
            let mut last_value = targets[0];
            for entry in &transition.point_or_slopes {
                let Some(point_type) = entry.point_type() else {
                    continue;
                };
                if point_type != current_type {
                    current_type = point_type;
                    targets[current_type.start_target()] = last_value;
                    delta = targets[current_type.start_target() + 1] - last_value;
                }
                let baseline = targets[current_type.start_target()];
                last_value = match entry {
                    PointOrSlope::Point(point) => {
                        let time = point.time(model, &symbols.values)?;
                        let value = point.value(baseline, delta, min, max);
                        if !point.is_phantom {
                            self.insert_event(Some(parameter), time, value);
                        }
                        value
                    }
                    PointOrSlope::SlopeRatio(slope_ratio) => self.create_slope_ratio_events(
                        slope_ratio,
                        baseline,
                        delta,
                        (min, max),
                        parameter,
                        &symbols.values,
                    )?,
                };
            }
        }

        for parameter in 0..Parameter::COUNT {
            let Some(name) = rule.special_transition(parameter) else {
                continue;
            };
            let transition = model.find_special_transition(name)?;
            let info = model.parameter_info(parameter);
            let range = f64::from(info.maximum) - f64::from(info.minimum);
            for entry in &transition.point_or_slopes {
                if let PointOrSlope::Point(point) = entry {
                    let time = point.time(model, &symbols.values)?;
                    let value = (f64::from(point.value) / 100.0) * range;
                    self.insert_event(Some(parameter + SPECIAL_OFFSET), time, value);
                }
            }
        }

        self.set_zero_ref((duration as i32).saturating_add(self.zero_ref));
        self.insert_marker(0.0);
        Ok(())
    }

    /// Inserts the points of a slope ratio and returns the value of its last point.
    ///
    /// The end points keep their own percentages; the interior ones accumulate the shares of the
    /// percentage delta computed by [`SlopeRatio::distribute`].
    fn create_slope_ratio_events(
        &mut self,
        slope_ratio: &SlopeRatio,
        baseline: f64,
        parameter_delta: f64,
        (min, max): (f64, f64),
        channel: usize,
        symbols: &FormulaSymbolList,
    ) -> Result<f64> {
        let model = self.model;
        let times = slope_ratio
            .points
            .iter()
            .map(|point| point.time(model, symbols))
            .collect::<Result<Vec<f64>>>()?;
        let (Some(first), Some(last)) = (slope_ratio.points.first(), slope_ratio.points.last()) else {
            return Ok(baseline);
        };
        let start_value = f64::from(first.value);
        let increments = slope_ratio.distribute(&times, f64::from(last.value) - start_value);

        let interior = 1..slope_ratio.points.len() - 1;
        let mut running = start_value;
        let mut value = baseline;
        for (index, (point, &time)) in slope_ratio.points.iter().zip(&times).enumerate() {
            let point_value = if interior.contains(&index) {
                running += increments[index - 1];
                running
            } else {
                f64::from(point.value)
            };
            // end points are clamped too
            value = clamp_value(baseline + (point_value / 100.0) * parameter_delta, min, max);
            if !point.is_phantom {
                self.insert_event(Some(channel), time, value);
            }
        }
        Ok(value)
    }

    /// Dumps the utterance arenas at debug level.
    pub(crate) fn log_data_structures(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        debug!("Tone groups {}", self.current_tone_group);
        for (i, group) in self.tone_groups[..self.current_tone_group].iter().enumerate() {
            debug!(
                "{i}  start: {}  end: {:?}  type: {:?}",
                group.start_foot, group.end_foot, group.tone_group_type
            );
        }
        debug!("Feet {}", self.current_foot);
        for (i, foot) in self.feet[..self.current_foot].iter().enumerate() {
            debug!(
                "{i}  tempo: {} start: {}  end: {:?}  marked: {} last: {}",
                foot.tempo, foot.start, foot.end, foot.marked, foot.last
            );
        }
        debug!("Phones {}", self.current_phone);
        for (i, phone) in self.phones[..self.current_phone].iter().enumerate() {
            debug!(
                "{i}  \"{}\" tempo: {} syllable: {} onset: {} ruleTempo: {}",
                phone.posture.map_or("", |posture| posture.name.as_str()),
                phone.tempo,
                phone.syllable,
                phone.onset,
                phone.rule_tempo
            );
        }
        debug!("Rules {}", self.current_rule);
        for segment in self.rule_data() {
            debug!(
                "Number: {}  start: {}  end: {}  duration {}",
                segment.number, segment.first_phone, segment.last_phone, segment.duration
            );
        }
    }
}

/// Tempo correction of a foot holding `phones` phones.
pub(crate) fn foot_tempo_adjustment(phones: usize, marked: bool) -> f64 {
    let count = phones as f64;
    if marked {
        (117.7 - 19.36 * count) / 180.0
    } else {
        (18.5 - 2.08 * count) / 140.0
    }
}

pub(crate) fn clamp_tempo(tempo: f64) -> f64 {
    clamp_value(tempo, 0.2, 2.0)
}
