use mscript_object::{replace_name, ObjectType, ParameterName};
use mscript_wrapper::{ElementWrapper, WrapperType};

use crate::{Assignment, ConditionalBranch, FunctionCall};

/// A command in a mission sequence, with the script line it came from.
#[derive(Debug, Clone)]
pub struct Command {
    kind: CommandKind,
    line: Option<usize>,
}

/// The kinds of command.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum CommandKind {
    Assignment(Assignment),
    Branch(ConditionalBranch),
    Report(Report),
    Propagate(Propagate),
    FunctionCall(FunctionCall),
}

impl Command {
    /// Wrap a command kind.
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, line: None }
    }

    /// Record the script line of the command.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// The kind of command.
    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// The kind of command, mutably.
    pub fn kind_mut(&mut self) -> &mut CommandKind {
        &mut self.kind
    }

    /// The script line, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// The script keyword for the command.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            CommandKind::Assignment(_) => "Assignment",
            CommandKind::Branch(branch) => branch.kind().name(),
            CommandKind::Report(_) => "Report",
            CommandKind::Propagate(_) => "Propagate",
            CommandKind::FunctionCall(_) => "CallFunction",
        }
    }

    /// The script text of the command, without child commands.
    pub fn generating_string(&self) -> String {
        match &self.kind {
            CommandKind::Assignment(command) => command.generating_string(),
            CommandKind::Branch(command) => command.generating_string(),
            CommandKind::Report(command) => command.generating_string(),
            CommandKind::Propagate(command) => command.generating_string(),
            CommandKind::FunctionCall(command) => command.generating_string(),
        }
    }

    /// The names that need wrappers, excluding those of child commands.
    ///
    /// For an assignment these are the left-hand side followed by the right-hand side value,
    /// or the equation leaves once the equation has been built.
    pub fn wrapper_object_names(&self) -> Vec<String> {
        match &self.kind {
            CommandKind::Assignment(command) => {
                let mut names = vec![command.lhs().to_string()];
                match command.equation().tree() {
                    Some(tree) => names.extend(tree.element_names()),
                    None if !command.rhs().is_empty() => names.push(command.rhs().to_string()),
                    None => {}
                }
                names
            }
            CommandKind::Branch(command) => command.conditions().wrapper_object_names(),
            CommandKind::Report(command) => command.parameters.clone(),
            CommandKind::Propagate(command) => command.wrapper_object_names(),
            CommandKind::FunctionCall(command) => command.wrapper_object_names(),
        }
    }

    /// Install `wrapper` wherever the command uses `name`.
    ///
    /// Returns false if the command does not use `name`. Assignments install their wrappers
    /// through [Assignment::set_lhs_wrapper] and [Assignment::set_rhs_wrapper] instead.
    pub fn set_element_wrapper(&mut self, name: &str, wrapper: ElementWrapper) -> bool {
        match &mut self.kind {
            CommandKind::Assignment(command) => command.set_rhs_wrapper(name, wrapper),
            CommandKind::Branch(command) => command
                .conditions_mut()
                .set_element_wrapper(name, &wrapper),
            CommandKind::Report(command) => command.set_element_wrapper(name, &wrapper),
            CommandKind::Propagate(command) => command.set_element_wrapper(name, &wrapper),
            CommandKind::FunctionCall(command) => command.set_element_wrapper(name, &wrapper),
        }
    }

    /// Drop the wrappers of this command, but not of its children.
    pub fn clear_wrappers(&mut self) {
        match &mut self.kind {
            CommandKind::Assignment(command) => command.clear_wrappers(),
            CommandKind::Branch(command) => command.conditions_mut().clear_wrappers(),
            CommandKind::Report(command) => command.wrappers.iter_mut().for_each(|w| *w = None),
            CommandKind::Propagate(command) => {
                command.stop_wrappers.iter_mut().for_each(|w| *w = None)
            }
            CommandKind::FunctionCall(command) => command.clear_wrappers(),
        }
    }

    /// The installed wrappers of this command.
    pub fn wrappers(&self) -> Vec<&ElementWrapper> {
        match &self.kind {
            CommandKind::Assignment(command) => command.wrappers().collect(),
            CommandKind::Branch(command) => command.conditions().wrappers().collect(),
            CommandKind::Report(command) => command.wrappers.iter().flatten().collect(),
            CommandKind::Propagate(command) => command.stop_wrappers.iter().flatten().collect(),
            CommandKind::FunctionCall(command) => command.wrappers().collect(),
        }
    }

    /// The objects the command refers to by type, for reference checking.
    ///
    /// System Parameters used by the wrappers are listed with [ObjectType::Parameter].
    pub fn ref_objects(&self) -> Vec<(ObjectType, String)> {
        let mut refs = match &self.kind {
            CommandKind::Report(command) => {
                vec![(ObjectType::Subscriber, command.subscriber.clone())]
            }
            CommandKind::Propagate(command) => {
                let mut refs = vec![(ObjectType::PropSetup, command.propagator.clone())];
                refs.extend(
                    command
                        .spacecraft
                        .iter()
                        .map(|name| (ObjectType::Spacecraft, name.clone())),
                );
                refs
            }
            _ => Vec::new(),
        };
        for wrapper in self.wrappers() {
            if wrapper.wrapper_type() == WrapperType::Parameter
                && !ParameterName::parse(wrapper.description())
                    .type_name
                    .is_empty()
            {
                let entry = (ObjectType::Parameter, wrapper.description().to_string());
                if !refs.contains(&entry) {
                    refs.push(entry);
                }
            }
        }
        refs
    }

    /// Rename `old` to `new` in this command and its children.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) {
        match &mut self.kind {
            CommandKind::Assignment(command) => command.rename_ref_object(old, new),
            CommandKind::Branch(command) => {
                command.conditions_mut().rename_ref_object(old, new);
                for child in command.children_mut() {
                    child.rename_ref_object(old, new);
                }
            }
            CommandKind::Report(command) => {
                command.subscriber = replace_name(&command.subscriber, old, new);
                command.parameters = rename_all(&command.parameters, old, new);
                rename_wrappers(&mut command.wrappers, old, new);
            }
            CommandKind::Propagate(command) => {
                command.propagator = replace_name(&command.propagator, old, new);
                command.spacecraft = rename_all(&command.spacecraft, old, new);
                if let Some((lhs, rhs)) = &mut command.stop {
                    *lhs = replace_name(lhs, old, new);
                    *rhs = replace_name(rhs, old, new);
                }
                rename_wrappers(&mut command.stop_wrappers, old, new);
            }
            CommandKind::FunctionCall(command) => command.rename_ref_object(old, new),
        }
    }
}

fn rename_all(names: &[String], old: &str, new: &str) -> Vec<String> {
    names.iter().map(|n| replace_name(n, old, new)).collect()
}

fn rename_wrappers(wrappers: &mut [Option<ElementWrapper>], old: &str, new: &str) {
    for wrapper in wrappers.iter_mut().flatten() {
        wrapper.rename_object(old, new);
    }
}

impl From<CommandKind> for Command {
    fn from(v: CommandKind) -> Self {
        Self::new(v)
    }
}

impl From<Assignment> for Command {
    fn from(v: Assignment) -> Self {
        Self::new(CommandKind::Assignment(v))
    }
}

impl From<ConditionalBranch> for Command {
    fn from(v: ConditionalBranch) -> Self {
        Self::new(CommandKind::Branch(v))
    }
}

impl From<Report> for Command {
    fn from(v: Report) -> Self {
        Self::new(CommandKind::Report(v))
    }
}

impl From<Propagate> for Command {
    fn from(v: Propagate) -> Self {
        Self::new(CommandKind::Propagate(v))
    }
}

impl From<FunctionCall> for Command {
    fn from(v: FunctionCall) -> Self {
        Self::new(CommandKind::FunctionCall(v))
    }
}

/// `Report rf sat1.X sat1.Y`: write the current values of Parameters to a report file.
#[derive(Debug, Clone)]
pub struct Report {
    subscriber: String,
    parameters: Vec<String>,
    wrappers: Vec<Option<ElementWrapper>>,
}

impl Report {
    /// Create a report of `parameters` to the report file `subscriber`.
    pub fn new(subscriber: &str, parameters: &[&str]) -> Self {
        Self {
            subscriber: subscriber.trim().to_string(),
            parameters: parameters.iter().map(|p| p.trim().to_string()).collect(),
            wrappers: vec![None; parameters.len()],
        }
    }

    /// The report file name.
    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    /// The reported names.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The wrappers, in the order of the reported names.
    pub fn wrappers(&self) -> &[Option<ElementWrapper>] {
        &self.wrappers
    }

    fn set_element_wrapper(&mut self, name: &str, wrapper: &ElementWrapper) -> bool {
        set_matching(&self.parameters, &mut self.wrappers, name, wrapper)
    }

    /// `Report rf a b`.
    pub fn generating_string(&self) -> String {
        let mut text = format!("Report {}", self.subscriber);
        for parameter in &self.parameters {
            text.push(' ');
            text.push_str(parameter);
        }
        text
    }
}

/// `Propagate prop(sat1) {sat1.ElapsedSecs = 8640}`.
///
/// Propagation itself is outside this crate: the command is validated but executing it does
/// nothing.
#[derive(Debug, Clone)]
pub struct Propagate {
    propagator: String,
    spacecraft: Vec<String>,
    stop: Option<(String, String)>,
    stop_wrappers: Vec<Option<ElementWrapper>>,
}

impl Propagate {
    /// Create a propagation of `spacecraft` with the PropSetup `propagator`.
    pub fn new(propagator: &str, spacecraft: &[&str]) -> Self {
        Self {
            propagator: propagator.trim().to_string(),
            spacecraft: spacecraft.iter().map(|s| s.trim().to_string()).collect(),
            stop: None,
            stop_wrappers: Vec::new(),
        }
    }

    /// Stop when the Parameter `parameter` reaches `value`.
    pub fn with_stop_condition(mut self, parameter: &str, value: &str) -> Self {
        self.stop = Some((parameter.trim().to_string(), value.trim().to_string()));
        self.stop_wrappers = vec![None, None];
        self
    }

    /// The PropSetup name.
    pub fn propagator(&self) -> &str {
        &self.propagator
    }

    /// The propagated spacecraft.
    pub fn spacecraft(&self) -> &[String] {
        &self.spacecraft
    }

    /// The stop condition Parameter and value.
    pub fn stop_condition(&self) -> Option<(&str, &str)> {
        self.stop.as_ref().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    fn stop_names(&self) -> Vec<String> {
        match &self.stop {
            Some((parameter, value)) => vec![parameter.clone(), value.clone()],
            None => Vec::new(),
        }
    }

    fn wrapper_object_names(&self) -> Vec<String> {
        let mut names = self.stop_names();
        names.dedup();
        names
    }

    fn set_element_wrapper(&mut self, name: &str, wrapper: &ElementWrapper) -> bool {
        let names = self.stop_names();
        set_matching(&names, &mut self.stop_wrappers, name, wrapper)
    }

    /// `Propagate prop(sat1, sat2) {sat1.ElapsedSecs = 8640}`.
    pub fn generating_string(&self) -> String {
        let mut text = format!(
            "Propagate {}({})",
            self.propagator,
            self.spacecraft.join(", ")
        );
        if let Some((parameter, value)) = &self.stop {
            text.push_str(&format!(" {{{} = {}}}", parameter, value));
        }
        text
    }
}

fn set_matching(
    names: &[String],
    wrappers: &mut [Option<ElementWrapper>],
    name: &str,
    wrapper: &ElementWrapper,
) -> bool {
    let mut matched = false;
    for (candidate, slot) in names.iter().zip(wrappers.iter_mut()) {
        if candidate == name {
            *slot = Some(wrapper.clone());
            matched = true;
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BranchKind;

    #[test]
    fn test_generating_strings() {
        let report: Command = Report::new("rf", &["sat1.X", "x"]).into();
        assert_eq!(report.generating_string(), "Report rf sat1.X x");
        assert_eq!(report.type_name(), "Report");

        let propagate: Command = Propagate::new("prop", &["sat1"])
            .with_stop_condition("sat1.ElapsedSecs", "8640")
            .into();
        assert_eq!(
            propagate.generating_string(),
            "Propagate prop(sat1) {sat1.ElapsedSecs = 8640}"
        );
        assert_eq!(propagate.wrapper_object_names(), ["sat1.ElapsedSecs", "8640"]);

        let mut branch = ConditionalBranch::new(BranchKind::While);
        branch.set_condition("x", "<", "10", None).unwrap();
        let branch = Command::from(branch).at_line(12);
        assert_eq!(branch.generating_string(), "While x < 10");
        assert_eq!(branch.line(), Some(12));
    }

    #[test]
    fn test_ref_objects() {
        let mut report: Command = Report::new("rf", &["sat1.X", "x"]).into();
        let parameter = mscript_object::Object::new(
            "sat1.X",
            "X",
            ObjectType::Parameter,
        );
        assert!(report.set_element_wrapper("x", ElementWrapper::number("x", 1.0)));
        assert!(!report.set_element_wrapper("y", ElementWrapper::number("y", 1.0)));
        report.set_element_wrapper(
            "sat1.X",
            ElementWrapper::new(
                "sat1.X",
                mscript_wrapper::WrapperKind::Parameter(Some(parameter.into_ref())),
            ),
        );
        assert_eq!(
            report.ref_objects(),
            [
                (ObjectType::Subscriber, "rf".to_string()),
                (ObjectType::Parameter, "sat1.X".to_string()),
            ]
        );

        report.rename_ref_object("sat1", "satA");
        assert_eq!(report.generating_string(), "Report rf satA.X x");
        assert_eq!(report.wrappers()[0].description(), "satA.X");
    }
}
