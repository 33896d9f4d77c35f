use trm_control::{
    Category, Equation, IntonationConfig, Model, Parameter, Point, PointTime, PointType, Posture,
    PostureSymbols, Rule, RuleEquations, Transition,
};

pub const PARAMETERS: [(&str, f32, f32, f32); Parameter::COUNT] = [
    ("glotPitch", -10.0, 10.0, 0.0),
    ("glotVol", 0.0, 60.0, 0.0),
    ("aspVol", 0.0, 10.0, 0.0),
    ("fricVol", 0.0, 24.0, 0.0),
    ("fricPos", 0.0, 7.0, 4.0),
    ("fricCF", 100.0, 20000.0, 2500.0),
    ("fricBW", 250.0, 20000.0, 500.0),
    ("r1", 0.0, 3.0, 0.8),
    ("r2", 0.0, 3.0, 0.8),
    ("r3", 0.0, 3.0, 0.8),
    ("r4", 0.0, 3.0, 0.8),
    ("r5", 0.0, 3.0, 0.8),
    ("r6", 0.0, 3.0, 0.8),
    ("r7", 0.0, 3.0, 0.8),
    ("r8", 0.0, 3.0, 0.8),
    ("velum", 0.1, 1.5, 0.1),
];

pub const INTONATION: &str = "\
# statement, question, continuation, semicolon
TG 2
0 -2 -6 1 0 -8 1 0 0 0
0 -1 -5 2 0 -7 2 0 0 0
TG 1
0 -2 4 1 0 6 1 0 0 0
TG 1
0 -2 -2 1 0 2 1 0 0 0
TG 1
0 -2 -4 1 0 -2 1 0 0 0
RANDOM 1.0
";

fn symbols(duration: f32, transition: f32, qssa: f32, qssb: f32) -> PostureSymbols {
    PostureSymbols {
        duration,
        transition,
        qssa,
        qssb,
    }
}

/// Silence, a nasal and an open vowel; a triphone rule for vowels between consonants and a
/// diphone rule for everything else.
pub fn model() -> Model {
    let mut builder = Model::builder();
    for (name, minimum, maximum, default_value) in PARAMETERS {
        builder = builder.parameter(Parameter::new(name, minimum, maximum, default_value));
    }
    let diphone = vec!["diphone".to_string(); Parameter::COUNT];
    let triphone = vec!["triphone".to_string(); Parameter::COUNT];
    builder
        .category(Category::new("phone", 1))
        .category(Category::new("vocoid", 2))
        .category(Category::new("consonant", 3))
        .category(Category::new("silence", 4))
        .posture(
            Posture::new(
                "^",
                symbols(100.0, 20.0, 40.0, 40.0),
                vec![0.0, 0.0, 0.0, 0.0, 4.0, 2500.0, 500.0, 0.8, 0.8, 0.8, 0.8, 0.8, 0.8, 0.8, 0.8, 0.1],
            )
            .with_category("phone")
            .with_category("silence"),
        )
        .posture(
            Posture::new(
                "m",
                symbols(70.0, 30.0, 20.0, 20.0),
                vec![0.0, 54.0, 0.0, 0.0, 5.5, 2500.0, 500.0, 0.89, 0.99, 0.81, 0.76, 1.05, 1.23, 0.01, 0.5, 0.5],
            )
            .with_category("phone")
            .with_category("consonant"),
        )
        .posture(
            Posture::new(
                "ah",
                symbols(120.0, 30.0, 30.0, 40.0),
                vec![0.0, 60.0, 0.0, 0.0, 5.5, 2500.0, 500.0, 0.65, 0.65, 0.65, 1.31, 1.23, 1.31, 1.67, 1.0, 0.1],
            )
            .with_category("phone")
            .with_category("vocoid"),
        )
        .equation(Equation::new("diphone_rd", "durations", "qssb1 + transition2 + qssa2"))
        .equation(Equation::new("diphone_beat", "durations", "qssb1 + transition2 / 2"))
        .equation(Equation::new(
            "triphone_rd",
            "durations",
            "qssb1 + transition2 + qssa2 + qssb2 + transition3 + qssa3",
        ))
        .equation(Equation::new("triphone_mark1", "durations", "qssb1 + transition2 + qssa2 + qssb2"))
        .equation(Equation::new("triphone_beat", "durations", "qssb1 + transition2 + qssa2 / 2"))
        .equation(Equation::new("transition_end", "times", "qssb1 + transition2"))
        .equation(Equation::new("second_transition_end", "times", "mark1 + transition3"))
        .transition(
            Transition::new("diphone", "shapes", PointType::Diphone)
                .with_point(Point::new(PointType::Diphone, 0.0, PointTime::Free(0.0)))
                .with_point(Point::new(
                    PointType::Diphone,
                    100.0,
                    PointTime::Equation("transition_end".to_string()),
                )),
        )
        .transition(
            Transition::new("triphone", "shapes", PointType::Triphone)
                .with_point(Point::new(PointType::Diphone, 0.0, PointTime::Free(0.0)))
                .with_point(Point::new(
                    PointType::Diphone,
                    100.0,
                    PointTime::Equation("transition_end".to_string()),
                ))
                .with_point(Point::new(
                    PointType::Triphone,
                    0.0,
                    PointTime::Equation("triphone_mark1".to_string()),
                ))
                .with_point(Point::new(
                    PointType::Triphone,
                    100.0,
                    PointTime::Equation("second_transition_end".to_string()),
                )),
        )
        .rule(Rule::new(
            &["consonant", "vocoid", "consonant"],
            triphone,
            RuleEquations::new("triphone_rd", "triphone_beat").with_marks("triphone_mark1", None),
        ))
        .rule(Rule::new(
            &["phone", "phone"],
            diphone,
            RuleEquations::new("diphone_rd", "diphone_beat"),
        ))
        .build()
        .unwrap()
}

pub fn intonation() -> IntonationConfig {
    IntonationConfig::parse(INTONATION)
}
