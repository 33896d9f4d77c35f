use rand::rngs::mock::StepRng;
use trm_control::{
    EngineConfig, Error, EventList, FormulaNode, FormulaSymbolList, INTONATION, INTONATION_CUBIC,
    INTONATION_CURVE, INTONATION_SLOPE, Model, Parameter, SymbolTable,
};

#[path = "../demos/_model.rs"]
mod _model;

/// The track is printed with 3 decimals; consider differences in value of:
/// 0.0011 to be acceptable.
const EPSILON: f64 = 1.1E-3;

fn quiet() -> EngineConfig {
    EngineConfig {
        drift: false,
        macro_intonation: false,
        ..EngineConfig::default()
    }
}

fn rows(track: &str) -> Vec<Vec<f64>> {
    track
        .lines()
        .map(|line| line.split(' ').map(|field| field.parse().unwrap()).collect())
        .collect()
}

/// "^ m ah | m ah ^", the second foot marked and closing the only tone group.
fn feed_phrase<'a>(event_list: &mut EventList<'a, StepRng>, model: &'a Model) {
    let postures = model.posture_sequence(&["^", "m", "ah", "m", "ah", "^"]).unwrap();
    for posture in &postures[..3] {
        event_list.new_phone_with_posture(posture);
    }
    event_list.new_foot();
    for posture in &postures[3..5] {
        event_list.new_phone_with_posture(posture);
    }
    event_list.set_current_foot_marked();
    event_list.new_tone_group();
    event_list.new_phone_with_posture(postures[5]);
}

#[test]
fn diphone_moves_every_differing_parameter() {
    let model = _model::model();
    let mut event_list = EventList::new(&model, quiet(), _model::intonation(), StepRng::new(0, 0));
    let postures = model.posture_sequence(&["m", "ah"]).unwrap();
    let (m, ah) = (postures[0], postures[1]);
    for posture in &postures {
        event_list.new_phone_with_posture(posture);
    }
    event_list.generate_event_list().unwrap();

    // rule duration 20 + 30 + 30, transition end 20 + 30 on the 4 ms grid
    let events = event_list.events();
    let times: Vec<i32> = events.iter().map(|event| event.time).collect();
    assert_eq!(times, vec![0, 48, 80]);
    // rule start and end are timing markers, only the end carries no values
    assert!(events[0].flag);
    assert!(!events[0].is_marker());
    assert!(!events[1].flag);
    assert!(events[2].flag);
    assert!(events[2].is_marker());
    for parameter in 0..Parameter::COUNT {
        assert_eq!(events[0].value(parameter), Some(m.target(parameter)));
        if m.target(parameter) == ah.target(parameter) {
            assert_eq!(events[1].value(parameter), None);
        } else {
            let value = events[1].value(parameter).unwrap();
            assert!((value - ah.target(parameter)).abs() < 1E-9);
        }
    }
    assert_eq!(event_list.rule_data().len(), 1);
    assert_eq!(event_list.rule_data()[0].number, 2);

    let mut track = String::new();
    event_list.generate_output_to(&mut track).unwrap();
    let rows = rows(&track);
    assert_eq!(rows.len(), 20);
    for parameter in 0..Parameter::COUNT {
        assert!((rows[0][parameter] - m.target(parameter)).abs() < EPSILON);
        for row in &rows[12..] {
            assert!((row[parameter] - ah.target(parameter)).abs() < EPSILON);
        }
    }
}

#[test]
fn phrase_gets_rules_contour_and_track() {
    let model = _model::model();
    let config = EngineConfig {
        drift: false,
        ..EngineConfig::default()
    };
    let mut event_list = EventList::new(&model, config, _model::intonation(), StepRng::new(0, 0));
    feed_phrase(&mut event_list, &model);
    let mut track = String::new();
    event_list.synthesize(&mut track).unwrap();

    let segments: Vec<(usize, usize, usize)> = event_list
        .rule_data()
        .iter()
        .map(|segment| (segment.number, segment.first_phone, segment.last_phone))
        .collect();
    assert_eq!(segments, vec![(2, 0, 1), (1, 1, 3), (2, 3, 4), (2, 4, 5)]);
    let beats: Vec<f64> = event_list.rule_data().iter().map(|segment| segment.beat).collect();
    assert_eq!(beats, vec![55.0, 155.0, 295.0, 390.0]);

    // pretonic foot on its beat, tonic foot 40 ms early, the drop and the closing point
    let times: Vec<f64> = event_list
        .intonation_points()
        .iter()
        .map(|point| point.absolute_time)
        .collect();
    assert_eq!(times, vec![155.0, 255.0, 295.0, 390.0]);

    for time in [152, 252, 292] {
        let event = event_list.events().iter().find(|event| event.time == time).unwrap();
        for channel in [INTONATION, INTONATION_SLOPE, INTONATION_CURVE, INTONATION_CUBIC] {
            assert!(event.value(channel).is_some_and(f64::is_finite));
        }
    }

    assert_eq!(event_list.events().last().map(|event| event.time), Some(440));
    let rows = rows(&track);
    assert_eq!(rows.len(), 110);
    assert!(rows.iter().all(|row| row.len() == Parameter::COUNT && row.iter().all(|value| value.is_finite())));
}

#[test]
fn set_up_allows_a_second_utterance() {
    let model = _model::model();
    let mut event_list = EventList::new(&model, quiet(), _model::intonation(), StepRng::new(0, 0));
    feed_phrase(&mut event_list, &model);
    event_list.generate_event_list().unwrap();
    assert_eq!(event_list.rule_data().len(), 4);

    event_list.set_up();
    assert!(event_list.events().is_empty());
    for posture in model.posture_sequence(&["m", "ah"]).unwrap() {
        event_list.new_phone_with_posture(posture);
    }
    event_list.generate_event_list().unwrap();
    assert_eq!(event_list.rule_data().len(), 1);
    assert_eq!(event_list.events().len(), 3);
}

#[test]
fn utterance_errors() {
    let model = _model::model();
    assert!(matches!(model.posture_sequence(&["m", "oo"]), Err(Error::UnknownPosture(name)) if name == "oo"));

    let mut event_list = EventList::new(&model, quiet(), _model::intonation(), StepRng::new(0, 0));
    event_list.new_phone_with_posture(model.find_posture("m").unwrap());
    assert!(matches!(event_list.generate_event_list(), Err(Error::TooFewPostures(1))));
}

#[test]
fn formulas_follow_precedence() {
    let table = SymbolTable::default();
    let symbols = FormulaSymbolList::default();
    assert_eq!(FormulaNode::parse("2 + 3 * 4", &table).unwrap().eval(&symbols), 14.0);
    assert_eq!(FormulaNode::parse("-(2 + 3)", &table).unwrap().eval(&symbols), -5.0);
    assert_eq!(FormulaNode::parse("(2 + 3) * 4 / 8", &table).unwrap().eval(&symbols), 2.5);
    assert!(matches!(FormulaNode::parse("2 + nothing", &table), Err(Error::FormulaParse { .. })));
}
