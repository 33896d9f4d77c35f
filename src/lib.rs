//! Articulatory control parameters for tube model speech synthesis, in Rust.
//!
//! *NOTE*: This is _not_ a complete text-to-speech engine.
//! It turns a posture (phone) sequence into the parameter track that drives a tube model
//! synthesizer: rules matched over windows of postures shape every parameter between the
//! posture targets, and tone groups add a smoothed pitch contour.
//! See the demos on how to use this.
//!
//! The pieces, in the order an utterance flows through them:
//! - [`Model`]: the static database (postures, categories, equations, transitions, rules).
//! - [`EventList`]: boundary intake, rhythm, rule application and the sparse [`Event`] timeline.
//! - [`EventList::apply_intonation`] and [`EventList::apply_intonation_smooth`]: the contour.
//! - [`EventList::generate_output_to`]: the dense track, 16 values every 4 ms.
//!
//! ## `no_std`
//!
//! Without the default `std` feature this library is `no_std` compatible.
//! `alloc` is required; only reading and writing files needs `std`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    clippy::all,
    clippy::cargo,
    clippy::pedantic,
    unsafe_code,
    rustdoc::all
)]
// fine for us since loss of precision/sign is not that imporatnt, as long as it's the same every time.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
// exact float comparisons decide whether targets differ at all
#![allow(clippy::float_cmp)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_lines
)]

extern crate alloc;

mod boolean;
mod config;
mod drift;
mod error;
mod event;
mod event_list;
mod formula;
mod intonation;
mod model;
mod output;
mod transition;

pub use boolean::BooleanNode;
pub use config::EngineConfig;
pub use drift::{CONTROL_RATE, DriftGenerator};
pub use error::{Error, Result};
pub use event::{
    Event, INTONATION, INTONATION_CUBIC, INTONATION_CURVE, INTONATION_SLOPE, NUM_CHANNELS,
    SPECIAL_OFFSET, TIME_QUANTUM,
};
pub use event_list::{EventList, Foot, Phone, RuleData, ToneGroup};
pub use formula::{Equation, FormulaNode, FormulaSymbol, FormulaSymbolList, SymbolTable};
pub use intonation::{
    IntonationConfig, IntonationPoint, MAX_TONE_GROUP_TABLES, TONE_GROUP_ROW_LEN, ToneGroupRow,
    ToneGroupType,
};
pub use model::{
    Category, Model, ModelBuilder, Parameter, Posture, PostureSymbols, Rule, RuleEquations,
    RuleMatch, RuleSymbols,
};
pub use transition::{Point, PointOrSlope, PointTime, PointType, Slope, SlopeRatio, Transition};
