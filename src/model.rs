//! The static linguistic database: parameters, categories, postures, equations, transitions and
//! rules.
//!
//! A [`Model`] is assembled once with a [`ModelBuilder`], which resolves every name based
//! reference (posture categories, rule predicates, equation and transition names) and compiles
//! every formula. After that the model is read only and can be shared by any number of
//! utterances.

use crate::boolean::BooleanNode;
use crate::error::{Error, Result};
use crate::formula::{Equation, FormulaSymbol, FormulaSymbolList, SymbolTable};
use crate::transition::{PointOrSlope, PointTime, Transition};
use alloc::{
    borrow::ToOwned,
    collections::BTreeMap,
    format,
    string::String,
    vec::Vec,
};
use log::{debug, warn};

/// One articulatory control channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub minimum: f32,
    pub maximum: f32,
    pub default_value: f32,
}

impl Parameter {
    /// Number of primary parameters driving the tube model.
    pub const COUNT: usize = 16;

    pub fn new(name: &str, minimum: f32, maximum: f32, default_value: f32) -> Self {
        Parameter {
            name: name.to_owned(),
            minimum,
            maximum,
            default_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub code: u32,
}

impl Category {
    pub fn new(name: &str, code: u32) -> Self {
        Category {
            name: name.to_owned(),
            code,
        }
    }
}

/// Values a posture contributes to rule formulas when it sits in a rule window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostureSymbols {
    pub duration: f32,
    pub transition: f32,
    pub qssa: f32,
    pub qssb: f32,
}

/// A phonetic unit and its articulatory targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Posture {
    pub name: String,
    /// category names as given
    pub categories: Vec<String>,
    /// one target per parameter
    pub targets: Vec<f32>,
    pub symbols: PostureSymbols,
    pub(crate) category_codes: Vec<u32>,
}

impl Posture {
    pub fn new(name: &str, symbols: PostureSymbols, targets: Vec<f32>) -> Self {
        Posture {
            name: name.to_owned(),
            categories: Vec::new(),
            targets,
            symbols,
            category_codes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, name: &str) -> Self {
        self.categories.push(name.to_owned());
        self
    }

    pub fn is_member_of_category(&self, code: u32) -> bool {
        self.category_codes.contains(&code)
    }

    pub fn target(&self, parameter: usize) -> f64 {
        f64::from(self.targets[parameter])
    }
}

/// Names of the equations a rule evaluates for every application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEquations {
    pub duration: String,
    pub beat: String,
    pub mark1: Option<String>,
    pub mark2: Option<String>,
}

impl RuleEquations {
    pub fn new(duration: &str, beat: &str) -> Self {
        RuleEquations {
            duration: duration.to_owned(),
            beat: beat.to_owned(),
            mark1: None,
            mark2: None,
        }
    }

    #[must_use]
    pub fn with_marks(mut self, mark1: &str, mark2: Option<&str>) -> Self {
        self.mark1 = Some(mark1.to_owned());
        self.mark2 = mark2.map(str::to_owned);
        self
    }
}

/// Results of evaluating a rule's equations for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleSymbols {
    pub duration: f64,
    pub beat: f64,
    pub mark1: f64,
    pub mark2: f64,
    /// the symbol values the equations were evaluated with, needed by transition point times
    pub values: FormulaSymbolList,
}

/// A coarticulation rule over a window of 2 to 4 postures.
#[derive(Debug, Clone)]
pub struct Rule {
    /// 1 based position in the model, assigned when the model is built
    pub number: usize,
    /// one category predicate per window posture
    pub expressions: Vec<String>,
    /// transition name for each parameter
    pub param_transitions: Vec<String>,
    /// optional special transition name for each parameter
    pub special_transitions: Vec<Option<String>>,
    pub equations: RuleEquations,
    predicates: Vec<BooleanNode>,
}

impl Rule {
    pub fn new(expressions: &[&str], param_transitions: Vec<String>, equations: RuleEquations) -> Self {
        Rule {
            number: 0,
            expressions: expressions.iter().map(|&e| e.to_owned()).collect(),
            special_transitions: alloc::vec![None; param_transitions.len()],
            param_transitions,
            equations,
            predicates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_special_transition(mut self, parameter: usize, name: &str) -> Self {
        if parameter >= self.special_transitions.len() {
            self.special_transitions.resize(parameter + 1, None);
        }
        self.special_transitions[parameter] = Some(name.to_owned());
        self
    }

    /// Window length of the rule.
    pub fn number_of_expressions(&self) -> usize {
        self.expressions.len()
    }

    pub fn param_transition(&self, parameter: usize) -> &str {
        &self.param_transitions[parameter]
    }

    pub fn special_transition(&self, parameter: usize) -> Option<&str> {
        self.special_transitions
            .get(parameter)
            .and_then(Option::as_deref)
    }

    /// `true` when every predicate holds for the posture at its position. The window must hold at
    /// least as many postures as the rule has predicates.
    pub fn eval_boolean_expression(&self, postures: &[&Posture]) -> bool {
        postures.len() >= self.predicates.len()
            && self
                .predicates
                .iter()
                .zip(postures)
                .all(|(predicate, posture)| predicate.eval(posture))
    }

    /// Evaluates the rule equations for `postures`, whose current tempos are `tempos`.
    ///
    /// The duration is evaluated first and exposed as `rd`, then the marks, then the beat, so
    /// later equations can refer to earlier results.
    pub fn evaluate_expression_symbols(
        &self,
        tempos: &[f64],
        postures: &[&Posture],
        model: &Model,
    ) -> Result<RuleSymbols> {
        let mut values = FormulaSymbolList::default();
        for (position, posture) in postures.iter().enumerate().take(4) {
            let (duration, transition, qssa, qssb, tempo) = FormulaSymbol::context(position);
            values[duration] = posture.symbols.duration;
            values[transition] = posture.symbols.transition;
            values[qssa] = posture.symbols.qssa;
            values[qssb] = posture.symbols.qssb;
            values[tempo] = tempos.get(position).copied().unwrap_or(1.0) as f32;
        }

        let eval = |name: &str, values: &FormulaSymbolList| -> Result<f32> {
            model.find_equation(name)?.eval_formula(values)
        };

        let duration = eval(&self.equations.duration, &values)?;
        values[FormulaSymbol::Rd] = duration;
        let mut mark1 = 0.0;
        if let Some(name) = &self.equations.mark1 {
            mark1 = eval(name, &values)?;
            values[FormulaSymbol::Mark1] = mark1;
        }
        let mut mark2 = 0.0;
        if let Some(name) = &self.equations.mark2 {
            mark2 = eval(name, &values)?;
            values[FormulaSymbol::Mark2] = mark2;
        }
        let beat = eval(&self.equations.beat, &values)?;
        values[FormulaSymbol::Beat] = beat;

        Ok(RuleSymbols {
            duration: f64::from(duration),
            beat: f64::from(beat),
            mark1: f64::from(mark1),
            mark2: f64::from(mark2),
            values,
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidRule {
            number: self.number,
            reason: reason.into(),
        }
    }
}

/// The rule chosen for a posture window.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    /// 0 based index of the rule in the model
    pub index: usize,
    /// number of postures the rule consumes
    pub window_length: usize,
    pub rule: &'a Rule,
}

#[derive(Debug, Clone)]
pub struct Model {
    parameters: Vec<Parameter>,
    categories: Vec<Category>,
    category_map: BTreeMap<String, usize>,
    postures: Vec<Posture>,
    posture_map: BTreeMap<String, usize>,
    symbol_table: SymbolTable,
    equations: BTreeMap<String, Equation>,
    transitions: BTreeMap<String, Transition>,
    special_transitions: BTreeMap<String, Transition>,
    rules: Vec<Rule>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn parameter_info(&self, index: usize) -> &Parameter {
        &self.parameters[index]
    }

    pub fn parameter_index(&self, name: &str) -> Result<usize> {
        self.parameters
            .iter()
            .position(|parameter| parameter.name == name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))
    }

    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.category_map
            .get(name)
            .map(|&index| &self.categories[index])
    }

    pub fn category_code(&self, name: &str) -> Result<u32> {
        self.find_category(name)
            .map(|category| category.code)
            .ok_or_else(|| Error::UnknownCategory(name.to_owned()))
    }

    pub fn find_posture(&self, name: &str) -> Option<&Posture> {
        self.posture_map
            .get(name)
            .map(|&index| &self.postures[index])
    }

    /// Looks up every name of a posture sequence.
    pub fn posture_sequence(&self, names: &[&str]) -> Result<Vec<&Posture>> {
        names
            .iter()
            .map(|&name| {
                self.find_posture(name)
                    .ok_or_else(|| Error::UnknownPosture(name.to_owned()))
            })
            .collect()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn find_equation(&self, name: &str) -> Result<&Equation> {
        self.equations
            .get(name)
            .ok_or_else(|| Error::UnknownEquation(name.to_owned()))
    }

    pub fn find_transition(&self, name: &str) -> Result<&Transition> {
        self.transitions
            .get(name)
            .ok_or_else(|| Error::UnknownTransition(name.to_owned()))
    }

    pub fn find_special_transition(&self, name: &str) -> Result<&Transition> {
        self.special_transitions
            .get(name)
            .ok_or_else(|| Error::UnknownSpecialTransition(name.to_owned()))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Finds the rule for the start of `postures`, trying the longest window first.
    ///
    /// Windows of 4, then 3, then 2 postures are tried (bounded by the sequence length); within a
    /// window length the first rule, in model order, whose predicates hold wins.
    pub fn find_first_matching_rule(&self, postures: &[&Posture]) -> Result<RuleMatch<'_>> {
        if postures.len() < 2 {
            return Err(Error::TooFewPostures(postures.len()));
        }
        for window_length in (2..=postures.len().min(4)).rev() {
            let window = &postures[..window_length];
            let found = self.rules.iter().enumerate().find(|(_, rule)| {
                rule.number_of_expressions() == window_length && rule.eval_boolean_expression(window)
            });
            if let Some((index, rule)) = found {
                return Ok(RuleMatch {
                    index,
                    window_length,
                    rule,
                });
            }
        }
        let names: Vec<&str> = postures.iter().map(|posture| posture.name.as_str()).collect();
        Err(Error::NoMatchingRule(names.join(" ")))
    }
}

/// Collects the database and prepares it into a [`Model`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    parameters: Vec<Parameter>,
    categories: Vec<Category>,
    postures: Vec<Posture>,
    equations: Vec<Equation>,
    transitions: Vec<Transition>,
    special_transitions: Vec<Transition>,
    rules: Vec<Rule>,
    symbol_table: Option<SymbolTable>,
}

impl ModelBuilder {
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    #[must_use]
    pub fn posture(mut self, posture: Posture) -> Self {
        self.postures.push(posture);
        self
    }

    #[must_use]
    pub fn equation(mut self, equation: Equation) -> Self {
        self.equations.push(equation);
        self
    }

    #[must_use]
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    #[must_use]
    pub fn special_transition(mut self, mut transition: Transition) -> Self {
        transition.special = true;
        self.special_transitions.push(transition);
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replaces the default rule symbol table.
    #[must_use]
    pub fn symbol_table(mut self, table: SymbolTable) -> Self {
        self.symbol_table = Some(table);
        self
    }

    pub fn build(self) -> Result<Model> {
        if self.parameters.len() != Parameter::COUNT {
            return Err(Error::ParameterCount {
                expected: Parameter::COUNT,
                found: self.parameters.len(),
            });
        }

        let category_map = prepare_categories(&self.categories)?;

        let mut model = Model {
            parameters: self.parameters,
            categories: self.categories,
            category_map,
            postures: Vec::new(),
            posture_map: BTreeMap::new(),
            symbol_table: self.symbol_table.unwrap_or_default(),
            equations: BTreeMap::new(),
            transitions: BTreeMap::new(),
            special_transitions: BTreeMap::new(),
            rules: Vec::new(),
        };

        model.prepare_postures(self.postures)?;
        model.prepare_equations(self.equations)?;
        model.prepare_transitions(self.transitions, self.special_transitions)?;
        model.prepare_rules(self.rules)?;
        debug!(
            "Model ready: {} categories, {} postures, {} equations, {} transitions, {} special transitions, {} rules.",
            model.categories.len(),
            model.postures.len(),
            model.equations.len(),
            model.transitions.len(),
            model.special_transitions.len(),
            model.rules.len()
        );
        Ok(model)
    }
}

fn prepare_categories(categories: &[Category]) -> Result<BTreeMap<String, usize>> {
    debug!("Preparing categories...");
    let mut map = BTreeMap::new();
    for (index, category) in categories.iter().enumerate() {
        if map.insert(category.name.clone(), index).is_some() {
            return Err(Error::DuplicateCategory(category.name.clone()));
        }
    }
    Ok(map)
}

impl Model {
    fn prepare_postures(&mut self, postures: Vec<Posture>) -> Result<()> {
        debug!("Preparing postures...");
        for mut posture in postures {
            if posture.targets.len() != self.parameters.len() {
                return Err(Error::InvalidPosture {
                    name: posture.name,
                    reason: format!(
                        "{} targets for {} parameters",
                        posture.targets.len(),
                        self.parameters.len()
                    ),
                });
            }
            posture.category_codes.clear();
            for name in &posture.categories {
                match self.find_category(name) {
                    Some(category) => posture.category_codes.push(category.code),
                    None => warn!("Posture {} refers to unknown category {name}.", posture.name),
                }
            }
            self.posture_map
                .insert(posture.name.clone(), self.postures.len());
            self.postures.push(posture);
        }
        Ok(())
    }

    fn prepare_equations(&mut self, equations: Vec<Equation>) -> Result<()> {
        debug!("Preparing equations...");
        for mut equation in equations {
            equation.parse_formula(&self.symbol_table)?;
            self.equations.insert(equation.name.clone(), equation);
        }
        Ok(())
    }

    fn prepare_transitions(
        &mut self,
        transitions: Vec<Transition>,
        special_transitions: Vec<Transition>,
    ) -> Result<()> {
        debug!("Preparing transitions...");
        for (transitions, target) in [
            (transitions, &mut self.transitions),
            (special_transitions, &mut self.special_transitions),
        ] {
            for transition in transitions {
                transition.validate()?;
                target.insert(transition.name.clone(), transition);
            }
        }
        for transition in self.transitions.values().chain(self.special_transitions.values()) {
            for entry in &transition.point_or_slopes {
                let points = match entry {
                    PointOrSlope::Point(point) => core::slice::from_ref(point),
                    PointOrSlope::SlopeRatio(ratio) => ratio.points.as_slice(),
                };
                for point in points {
                    if let PointTime::Equation(name) = &point.time {
                        self.find_equation(name)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn prepare_rules(&mut self, rules: Vec<Rule>) -> Result<()> {
        debug!("Preparing rules...");
        for (index, mut rule) in rules.into_iter().enumerate() {
            rule.number = index + 1;
            if !(2..=4).contains(&rule.number_of_expressions()) {
                return Err(rule.invalid(format!(
                    "{} expressions, a rule needs 2 to 4",
                    rule.number_of_expressions()
                )));
            }
            if rule.param_transitions.len() != self.parameters.len() {
                return Err(rule.invalid(format!(
                    "{} parameter transitions for {} parameters",
                    rule.param_transitions.len(),
                    self.parameters.len()
                )));
            }

            rule.predicates = rule
                .expressions
                .iter()
                .map(|expression| {
                    BooleanNode::parse(expression, |name| {
                        self.find_category(name).map(|category| category.code)
                    })
                })
                .collect::<Result<_>>()?;

            for name in &rule.param_transitions {
                self.find_transition(name)?;
            }
            for name in rule.special_transitions.iter().flatten() {
                self.find_special_transition(name)?;
            }
            let equations = &rule.equations;
            for name in [&equations.duration, &equations.beat]
                .into_iter()
                .chain(equations.mark1.iter())
                .chain(equations.mark2.iter())
            {
                self.find_equation(name)?;
            }
            self.rules.push(rule);
        }
        Ok(())
    }
}

impl core::fmt::Display for Model {
    /// Summary of the database, one line per category and posture.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Categories:")?;
        for category in &self.categories {
            writeln!(f, "category: {} code: {}", category.name, category.code)?;
        }
        writeln!(f, "Postures:")?;
        for posture in &self.postures {
            writeln!(
                f,
                "posture symbol: {} duration: {} transition: {} qssa: {} qssb: {} categories: {}",
                posture.name,
                posture.symbols.duration,
                posture.symbols.transition,
                posture.symbols.qssa,
                posture.symbols.qssb,
                posture.categories.join(" ")
            )?;
        }
        writeln!(f, "Rules: {}", self.rules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{Point, PointTime, PointType};
    use alloc::{string::ToString, vec};

    fn flat() -> Vec<String> {
        vec!["flat".to_string(); Parameter::COUNT]
    }

    fn posture(name: &str, categories: &[&str]) -> Posture {
        let symbols = PostureSymbols {
            duration: 100.0,
            transition: 30.0,
            qssa: 20.0,
            qssb: 10.0,
        };
        categories.iter().fold(
            Posture::new(name, symbols, vec![0.0; Parameter::COUNT]),
            |posture, category| posture.with_category(category),
        )
    }

    fn builder() -> ModelBuilder {
        let mut builder = Model::builder();
        for i in 0..Parameter::COUNT {
            builder = builder.parameter(Parameter::new(&format!("p{i}"), 0.0, 100.0, 0.0));
        }
        builder
            .category(Category::new("phone", 1))
            .category(Category::new("vocoid", 2))
            .category(Category::new("a", 3))
            .category(Category::new("b", 4))
            .category(Category::new("c", 5))
            .category(Category::new("d", 6))
            .posture(posture("a", &["phone", "a", "vocoid"]))
            .posture(posture("b", &["phone", "b"]))
            .posture(posture("c", &["phone", "c"]))
            .posture(posture("d", &["phone", "d", "unknown"]))
            .equation(Equation::new("duration", "test", "transition1 + qssb2 * tempo1"))
            .equation(Equation::new("mark1", "test", "rd / 2"))
            .equation(Equation::new("beat", "test", "mark1 + 1"))
            .transition(
                Transition::new("flat", "test", PointType::Diphone)
                    .with_point(Point::new(PointType::Diphone, 0.0, PointTime::Free(0.0))),
            )
    }

    fn equations() -> RuleEquations {
        RuleEquations::new("duration", "beat")
    }

    #[test]
    fn longest_window_wins() {
        let model = builder()
            .rule(Rule::new(&["a", "b"], flat(), equations()))
            .rule(Rule::new(&["a", "b", "c", "d"], flat(), equations()))
            .rule(Rule::new(&["phone", "phone"], flat(), equations()))
            .build()
            .unwrap();
        let postures = model.posture_sequence(&["a", "b", "c", "d"]).unwrap();
        let found = model.find_first_matching_rule(&postures).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.window_length, 4);
        assert_eq!(found.rule.number, 2);

        let found = model.find_first_matching_rule(&postures[..3]).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.window_length, 2);

        let postures = model.posture_sequence(&["b", "a"]).unwrap();
        assert_eq!(model.find_first_matching_rule(&postures).unwrap().index, 2);
    }

    #[test]
    fn no_matching_rule_is_an_error() {
        let model = builder()
            .rule(Rule::new(&["a", "b"], flat(), equations()))
            .build()
            .unwrap();
        let postures = model.posture_sequence(&["c", "d"]).unwrap();
        assert!(matches!(
            model.find_first_matching_rule(&postures),
            Err(Error::NoMatchingRule(names)) if names == "c d"
        ));
        assert!(matches!(
            model.find_first_matching_rule(&postures[..1]),
            Err(Error::TooFewPostures(1))
        ));
    }

    #[test]
    fn duplicate_category_is_fatal() {
        let result = builder().category(Category::new("vocoid", 9)).build();
        assert!(matches!(result, Err(Error::DuplicateCategory(name)) if name == "vocoid"));
    }

    #[test]
    fn unresolved_references_are_fatal() {
        let mut transitions = flat();
        transitions[3] = "missing".to_string();
        let result = builder().rule(Rule::new(&["a", "b"], transitions, equations())).build();
        assert!(matches!(result, Err(Error::UnknownTransition(name)) if name == "missing"));

        let result = builder()
            .rule(Rule::new(&["a", "b"], flat(), equations()).with_special_transition(0, "nope"))
            .build();
        assert!(matches!(result, Err(Error::UnknownSpecialTransition(_))));

        let result = builder()
            .rule(Rule::new(&["a", "b"], flat(), RuleEquations::new("duration", "none")))
            .build();
        assert!(matches!(result, Err(Error::UnknownEquation(name)) if name == "none"));

        let result = builder().rule(Rule::new(&["a", "z"], flat(), equations())).build();
        assert!(matches!(result, Err(Error::UnknownCategory(name)) if name == "z"));

        let result = builder().rule(Rule::new(&["a"], flat(), equations())).build();
        assert!(matches!(result, Err(Error::InvalidRule { number: 1, .. })));

        let result = builder().equation(Equation::new("broken", "test", "(rd")).build();
        assert!(matches!(result, Err(Error::FormulaParse { .. })));
    }

    #[test]
    fn postures_resolve_known_categories() {
        let model = builder().build().unwrap();
        let d = model.find_posture("d").unwrap();
        assert!(d.is_member_of_category(model.category_code("d").unwrap()));
        assert_eq!(d.category_codes, vec![1, 6]);
        assert!(model.find_category("unknown").is_none());
        assert!(model.find_posture("zz").is_none());
        assert_eq!(model.parameter_index("p7").unwrap(), 7);
        assert!(model.parameter_index("r9").is_err());
    }

    #[test]
    fn expression_symbols_are_evaluated_in_order() {
        let model = builder()
            .rule(Rule::new(&["a", "b"], flat(), equations().with_marks("mark1", None)))
            .build()
            .unwrap();
        let postures = model.posture_sequence(&["a", "b"]).unwrap();
        let rule = &model.rules()[0];
        let symbols = rule
            .evaluate_expression_symbols(&[2.0, 1.0], &postures, &model)
            .unwrap();
        // transition1 + qssb2 * tempo1
        assert_eq!(symbols.duration, 50.0);
        assert_eq!(symbols.mark1, 25.0);
        assert_eq!(symbols.beat, 26.0);
        assert_eq!(symbols.mark2, 0.0);
        assert_eq!(symbols.values[FormulaSymbol::Rd], 50.0);
        assert_eq!(symbols.values[FormulaSymbol::Tempo2], 1.0);
    }

    #[test]
    fn parameter_count_is_checked() {
        let result = Model::builder().parameter(Parameter::new("p0", 0.0, 1.0, 0.0)).build();
        assert!(matches!(
            result,
            Err(Error::ParameterCount { expected: 16, found: 1 })
        ));
    }
}
