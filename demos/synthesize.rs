use rand::{SeedableRng, rngs::SmallRng};
use trm_control::{EngineConfig, EventList, ToneGroupType};

mod _model;
use _model::{intonation, model};

/// "^ m ah | m ah ^", one statement with the stress on the second foot.
fn run_synthesize() {
    let model = model();
    let rng = SmallRng::seed_from_u64(69);
    let config = EngineConfig {
        random_intonation: true,
        ..EngineConfig::default()
    };
    let mut event_list = EventList::new(&model, config, intonation(), rng);

    let postures = match model.posture_sequence(&["^", "m", "ah", "m", "ah", "^"]) {
        Ok(postures) => postures,
        Err(error) => {
            println!("Error: {}", error);
            std::process::exit(1);
        }
    };
    for posture in &postures[..3] {
        event_list.new_phone_with_posture(posture);
    }
    event_list.new_foot();
    for posture in &postures[3..5] {
        event_list.new_phone_with_posture(posture);
    }
    event_list.set_current_foot_marked();
    event_list.set_current_tone_group_type(ToneGroupType::Statement);
    event_list.new_tone_group();
    event_list.new_phone_with_posture(postures[5]);

    let mut track = String::new();
    match event_list.synthesize(&mut track) {
        Ok(()) => print!("{}", track),
        Err(error) => {
            println!("Error: {}", error);
            std::process::exit(1);
        }
    }
}

fn run_generate_output() {
    let model = model();
    let mut event_list = EventList::new(&model, EngineConfig::default(), intonation(), SmallRng::seed_from_u64(69));
    let postures = match model.posture_sequence(&["^", "ah", "^"]) {
        Ok(postures) => postures,
        Err(error) => {
            println!("Error: {}", error);
            std::process::exit(1);
        }
    };
    for posture in postures {
        event_list.new_phone_with_posture(posture);
    }

    // the track is appended, start from an empty file
    let path = std::env::temp_dir().join("trm-control-track.txt");
    let _ = std::fs::remove_file(&path);
    let result = event_list
        .generate_event_list()
        .and_then(|()| event_list.generate_output(&path));
    match result {
        Ok(()) => println!("Track written to {}", path.display()),
        Err(error) => {
            println!("Error: {}", error);
            std::process::exit(1);
        }
    }
}

fn main() {
    run_synthesize();
    run_generate_output();
}
