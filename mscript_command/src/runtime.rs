use mscript_data_type::Value;
use mscript_object::{Object, ObjectScope, ObjectStore};
use mscript_wrapper::{ElementAccess, ElementWrapper, WrapperType};
use serde::{Deserialize, Serialize};

use crate::{
    BranchKind, Command, CommandError, CommandKind, ConditionalBranch, FunctionCall, Report,
    ScriptFunction, ValidationError, Validator,
};

/// A line written by a Report command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// The report file the line was written to.
    pub subscriber: String,
    /// The reported values, separated by spaces.
    pub text: String,
}

/// Executes validated commands.
///
/// User functions are validated and run in a fresh local store on every call, so the runtime
/// needs the validator that knows about them.
#[derive(Debug)]
pub struct Runtime<'v> {
    validator: &'v mut Validator,
    output: Vec<ReportLine>,
    call_stack: Vec<String>,
}

impl<'v> Runtime<'v> {
    /// Create a runtime that validates function bodies with `validator`.
    pub fn new(validator: &'v mut Validator) -> Self {
        Self {
            validator,
            output: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    /// The lines written by Report commands so far.
    pub fn output(&self) -> &[ReportLine] {
        &self.output
    }

    /// Consume the runtime and return the report output.
    pub fn into_output(self) -> Vec<ReportLine> {
        self.output
    }

    /// Execute commands in order, stopping at the first error.
    pub fn execute_all(
        &mut self,
        commands: &mut [Command],
        scope: &mut ObjectScope<'_>,
    ) -> Result<(), ValidationError> {
        for command in commands.iter_mut() {
            self.execute(command, scope)?;
        }
        Ok(())
    }

    /// Execute a command.
    ///
    /// The error names the innermost command that failed.
    pub fn execute(
        &mut self,
        command: &mut Command,
        scope: &mut ObjectScope<'_>,
    ) -> Result<(), ValidationError> {
        let generating_string = command.generating_string();
        let line = command.line();
        let located = |validator: &Validator, error: CommandError| {
            validator.locate(error, &generating_string, line)
        };

        match command.kind_mut() {
            CommandKind::Assignment(assignment) => assignment
                .execute()
                .map_err(|error| located(self.validator, error)),
            CommandKind::Branch(branch) => self.execute_branch(branch, scope, &located),
            CommandKind::Report(report) => {
                let written =
                    report_line(report).map_err(|error| located(self.validator, error))?;
                log::debug!("{}: {}", written.subscriber, written.text);
                self.output.push(written);
                Ok(())
            }
            CommandKind::Propagate(_) => {
                log::warn!("Propagation is not available, skipped \"{}\"", generating_string);
                Ok(())
            }
            CommandKind::FunctionCall(call) => self.call_function(call, scope, &located),
        }
    }

    fn execute_branch(
        &mut self,
        branch: &mut ConditionalBranch,
        scope: &mut ObjectScope<'_>,
        located: &dyn Fn(&Validator, CommandError) -> ValidationError,
    ) -> Result<(), ValidationError> {
        let limit = self.validator.config().max_loop_iterations;
        let mut iterations = 0;
        loop {
            let holds = branch
                .evaluate_all_conditions()
                .map_err(|error| located(self.validator, error))?;
            match branch.kind() {
                BranchKind::If => {
                    let (commands, else_commands) = branch.branches_mut();
                    let taken = if holds { commands } else { else_commands };
                    return self.execute_all(taken, scope);
                }
                BranchKind::While => {
                    if !holds {
                        return Ok(());
                    }
                    if iterations == limit {
                        let error = CommandError::IterationLimit {
                            limit,
                            generating_string: branch.generating_string(),
                        };
                        return Err(located(self.validator, error));
                    }
                    iterations += 1;
                    let (commands, _) = branch.branches_mut();
                    self.execute_all(commands, scope)?;
                }
            }
        }
    }

    /// Run a user function.
    ///
    /// The inputs are copied into a fresh local store along with the declared objects, the
    /// body is validated and executed there with the caller's objects visible as globals, and
    /// the outputs are written back through the call's output wrappers.
    fn call_function(
        &mut self,
        call: &mut FunctionCall,
        scope: &mut ObjectScope<'_>,
        located: &dyn Fn(&Validator, CommandError) -> ValidationError,
    ) -> Result<(), ValidationError> {
        let name = call.function().to_string();
        if self.call_stack.contains(&name) {
            return Err(located(self.validator, CommandError::RecursiveCall(name)));
        }
        let function = self
            .validator
            .function(&name)
            .cloned()
            .ok_or_else(|| CommandError::UndefinedFunction(name.clone()))
            .map_err(|error| located(self.validator, error))?;

        let mut local =
            local_store(&function, call).map_err(|error| located(self.validator, error))?;

        let global: &ObjectStore = match scope.global() {
            Some(global) => global,
            None => scope.local(),
        };
        let mut body = function.body().to_vec();
        let mut function_scope = ObjectScope::with_global(&mut local, global);

        self.call_stack.push(name.clone());
        let frame = self.validator.enter_function(&name);
        let result = self
            .validator
            .validate_commands(&mut body, &mut function_scope)
            .and_then(|_| self.execute_all(&mut body, &mut function_scope));
        self.validator.leave_function(frame);
        self.call_stack.pop();
        result?;

        for (formal, slot) in function.outputs().iter().zip(call.output_wrappers_mut()) {
            write_output(&function_scope, &name, formal, slot.as_mut())
                .map_err(|error| located(self.validator, error))?;
        }
        log::debug!("Returned from function \"{}\"", name);
        Ok(())
    }
}

/// The values of a Report command's wrappers.
fn report_line(report: &Report) -> Result<ReportLine, CommandError> {
    let mut values = Vec::with_capacity(report.parameters().len());
    for (name, wrapper) in report.parameters().iter().zip(report.wrappers()) {
        let wrapper = wrapper.as_ref().ok_or_else(|| CommandError::MissingWrapper {
            command: "Report",
            name: name.clone(),
        })?;
        values.push(wrapper.evaluate()?.to_string());
    }
    Ok(ReportLine {
        subscriber: report.subscriber().to_string(),
        text: values.join(" "),
    })
}

/// The local store of a call: copies of the inputs under their formal names, and the
/// declared objects.
fn local_store(
    function: &ScriptFunction,
    call: &FunctionCall,
) -> Result<ObjectStore, CommandError> {
    let mut local = ObjectStore::new();
    for (formal, actual) in function.inputs().iter().zip(call.input_wrappers()) {
        let actual = actual.as_ref().ok_or_else(|| CommandError::MissingWrapper {
            command: "CallFunction",
            name: formal.clone(),
        })?;
        local.add(input_object(formal, actual)?)?;
    }
    for object in function.locals() {
        local.add(object.duplicate())?;
    }
    Ok(local)
}

/// A local copy of an input argument, named after the formal argument.
fn input_object(formal: &str, actual: &ElementWrapper) -> Result<Object, CommandError> {
    if actual.wrapper_type() == WrapperType::Object {
        let source = actual.evaluate_object()?;
        let source = source.borrow();
        let mut copy = Object::new(formal, source.type_name(), source.object_type());
        copy.copy_from(&source);
        return Ok(copy);
    }
    let object = match actual.evaluate()? {
        Value::Matrix(matrix) => {
            let (rows, cols) = matrix.dims();
            let mut array = Object::array(formal, rows, cols);
            array.assign(Value::Matrix(matrix))?;
            array
        }
        Value::Integer(value) => Object::variable(formal, value as f64),
        Value::Real(value) => Object::variable(formal, value),
        value => Object::string(formal, &value.to_string()),
    };
    Ok(object)
}

fn write_output(
    scope: &ObjectScope<'_>,
    function: &str,
    formal: &str,
    slot: Option<&mut ElementWrapper>,
) -> Result<(), CommandError> {
    let target = slot.ok_or_else(|| CommandError::MissingWrapper {
        command: "CallFunction",
        name: formal.to_string(),
    })?;
    let object = scope
        .local()
        .find_object(formal)
        .ok_or_else(|| CommandError::UndefinedObject {
            name: formal.to_string(),
            referenced_in: function.to_string(),
        })?;
    if target.wrapper_type() == WrapperType::Object {
        target.set_object(&object)?;
    } else {
        let value = object.borrow().evaluate()?;
        target.set_value(&value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Assignment, Propagate, ValidatorConfig};

    fn store() -> ObjectStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = ObjectStore::with_defaults();
        store.add(Object::spacecraft("sat1")).unwrap();
        store.add(Object::variable("x", 0.0)).unwrap();
        store.add(Object::variable("y", 0.0)).unwrap();
        store.add(Object::report_file("rf")).unwrap();
        store
    }

    fn run(
        validator: &mut Validator,
        store: &mut ObjectStore,
        commands: &mut [Command],
    ) -> Result<Vec<ReportLine>, ValidationError> {
        let mut scope = ObjectScope::new(store);
        assert!(validator.validate_commands(commands, &mut scope)?);
        let mut runtime = Runtime::new(validator);
        runtime.execute_all(commands, &mut scope)?;
        Ok(runtime.into_output())
    }

    fn real(store: &ObjectStore, name: &str) -> f64 {
        store
            .find_object(name)
            .unwrap()
            .borrow()
            .evaluate()
            .unwrap()
            .as_real()
    }

    #[test]
    fn test_while_loop() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());

        let mut loop_ = ConditionalBranch::new(BranchKind::While);
        loop_.set_condition("x", "<", "5", None).unwrap();
        loop_.add_command(Assignment::new("x", "x + 1"));
        loop_.add_command(Assignment::new("y", "y + x"));
        let mut commands = vec![Command::from(loop_), Report::new("rf", &["x", "y"]).into()];

        let output = run(&mut validator, &mut store, &mut commands).unwrap();
        assert_eq!(real(&store, "x"), 5.0);
        assert_eq!(real(&store, "y"), 15.0);
        assert_eq!(
            output,
            [ReportLine {
                subscriber: "rf".to_string(),
                text: "5 15".to_string(),
            }]
        );
    }

    #[test]
    fn test_if_else() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());

        let mut branch = ConditionalBranch::new(BranchKind::If);
        branch.set_condition("sat1.X", "<", "7000", None).unwrap();
        branch.set_condition("x", "==", "0", None).unwrap();
        branch.set_condition_operator("|", None).unwrap();
        branch.add_command(Assignment::new("y", "1"));
        branch.add_else_command(Assignment::new("y", "2")).unwrap();
        let mut commands = vec![Command::from(branch)];

        run(&mut validator, &mut store, &mut commands).unwrap();
        assert_eq!(real(&store, "y"), 1.0);

        store.find_object("x").unwrap().borrow_mut().assign(Value::Real(3.0)).unwrap();
        let mut runtime = Runtime::new(&mut validator);
        let mut scope = ObjectScope::new(&mut store);
        runtime.execute_all(&mut commands, &mut scope).unwrap();
        assert_eq!(real(&store, "y"), 2.0);
    }

    #[test]
    fn test_iteration_limit() {
        let mut store = store();
        let config = ValidatorConfig {
            max_loop_iterations: 10,
            ..ValidatorConfig::default()
        };
        let mut validator = Validator::new(config);

        let mut loop_ = ConditionalBranch::new(BranchKind::While);
        loop_.set_condition("x", ">=", "0", None).unwrap();
        loop_.add_command(Assignment::new("x", "x + 1"));
        let mut commands = vec![Command::from(loop_).at_line(4)];

        let error = run(&mut validator, &mut store, &mut commands).unwrap_err();
        assert_eq!(error.line, Some(4));
        assert_eq!(
            error.message,
            "The loop \"While x >= 0\" did not finish within 10 iterations"
        );
        assert_eq!(real(&store, "x"), 10.0);
    }

    #[test]
    fn test_innermost_error_is_reported() {
        let mut store = store();
        store.add(Object::array("A", 2, 1)).unwrap();
        let mut validator = Validator::new(ValidatorConfig::default());

        let mut branch = ConditionalBranch::new(BranchKind::If);
        branch.set_condition("x", "==", "0", None).unwrap();
        branch.add_command(Command::from(Assignment::new("A", "2")).at_line(9));
        let mut commands = vec![Command::from(branch).at_line(8)];

        let error = run(&mut validator, &mut store, &mut commands).unwrap_err();
        assert_eq!(error.generating_string, "A = 2");
        assert_eq!(error.line, Some(9));
    }

    #[test]
    fn test_propagate_is_skipped() {
        let mut store = store();
        store.add(Object::prop_setup("prop")).unwrap();
        let mut validator = Validator::new(ValidatorConfig::default());
        let mut commands = vec![Command::from(
            Propagate::new("prop", &["sat1"]).with_stop_condition("sat1.ElapsedSecs", "8640"),
        )];

        let mut scope = ObjectScope::new(&mut store);
        assert!(validator.validate_commands(&mut commands, &mut scope).unwrap());
        assert!(validator.errors().is_empty());
        let mut runtime = Runtime::new(&mut validator);
        runtime.execute_all(&mut commands, &mut scope).unwrap();
        assert!(runtime.output().is_empty());

        let mut commands = vec![Command::from(
            Propagate::new("prop", &["sat1"]).with_stop_condition("sat1.Elapsed", "1"),
        )];
        assert!(!validator.validate_commands(&mut commands, &mut scope).unwrap());
    }

    fn norm2() -> ScriptFunction {
        ScriptFunction::new("Norm2", &["a", "b"], &["r"])
            .declare(Object::variable("r", 0.0))
            .with_command(Assignment::new("r", "sqrt(a^2 + b^2)"))
    }

    #[test]
    fn test_function_call() {
        let mut store = store();
        store
            .find_object("x")
            .unwrap()
            .borrow_mut()
            .assign(Value::Real(3.0))
            .unwrap();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(norm2());

        let mut commands = vec![Command::from(FunctionCall::new("Norm2", &["x", "4"], &["y"]))];
        run(&mut validator, &mut store, &mut commands).unwrap();
        assert_eq!(real(&store, "y"), 5.0);
        assert_eq!(real(&store, "x"), 3.0);
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_cloned_function_runs_independently() {
        let function = norm2();
        let copy = function.clone();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(function);
        let mut copy_validator = Validator::new(ValidatorConfig::default());
        copy_validator.add_function(copy.clone());

        for (validator, a, b, expected) in [
            (&mut validator, "3", "4", 5.0),
            (&mut copy_validator, "6", "8", 10.0),
        ] {
            let mut store = store();
            let mut commands = vec![Command::from(FunctionCall::new("Norm2", &[a, b], &["y"]))];
            run(validator, &mut store, &mut commands).unwrap();
            assert_eq!(real(&store, "y"), expected);
        }
        assert_eq!(copy.locals()[0].evaluate().unwrap(), Value::Real(0.0));
    }

    #[test]
    fn test_function_sees_globals() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(
            ScriptFunction::new("Altitude", &[], &["h"])
                .declare(Object::variable("h", 0.0))
                .with_command(Assignment::new("h", "sat1.X - 6378")),
        );

        let mut commands = vec![Command::from(FunctionCall::new("Altitude", &[], &["y"]))];
        run(&mut validator, &mut store, &mut commands).unwrap();
        assert_eq!(real(&store, "y"), 722.0);
    }

    #[test]
    fn test_function_body_error() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(
            ScriptFunction::new("Broken", &["a"], &["r"])
                .declare(Object::variable("r", 0.0))
                .with_command(Command::from(Assignment::new("r", "a + missing")).at_line(2)),
        );

        let mut commands = vec![Command::from(FunctionCall::new("Broken", &["x"], &["y"]))];
        let error = run(&mut validator, &mut store, &mut commands).unwrap_err();
        assert_eq!(error.generating_string, "r = a + missing");
        assert_eq!(error.line, Some(2));
        assert!(error.message.ends_with("(In Function \"Broken\")\n"));
        assert!(validator.config().continue_on_error);
    }

    #[test]
    fn test_recursive_call() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(
            ScriptFunction::new("Forever", &["a"], &[])
                .with_command(FunctionCall::new("Forever", &["a"], &[])),
        );

        let mut commands = vec![Command::from(FunctionCall::new("Forever", &["x"], &[]))];
        let error = run(&mut validator, &mut store, &mut commands).unwrap_err();
        assert_eq!(
            error.message,
            "The function \"Forever\" cannot call itself\n(In Function \"Forever\")\n"
        );
    }

    #[test]
    fn test_object_argument() {
        let mut store = store();
        let mut validator = Validator::new(ValidatorConfig::default());
        validator.add_function(
            ScriptFunction::new("Raise", &["sc"], &["sc"])
                .with_command(Assignment::new("sc.X", "sc.X + 100")),
        );

        let mut commands = vec![Command::from(FunctionCall::new("Raise", &["sat1"], &["sat1"]))];
        run(&mut validator, &mut store, &mut commands).unwrap();
        let sat1 = store.find_object("sat1").unwrap();
        assert_eq!(sat1.borrow().get_real("X").unwrap(), 7200.0);
        assert_eq!(sat1.borrow().name(), "sat1");
    }
}
