use indexmap::IndexMap;
use mscript_data_type::{ParameterType, Value};
use mscript_object::{
    Object, ObjectError, ObjectRef, ObjectScope, ObjectStore, ObjectType, ParameterFactory,
    ParameterName,
};
use mscript_wrapper::{
    create_element_wrapper, has_unbalanced_quote, is_braced, is_quoted, remove_quotes,
    ClassifyError, ClassifyOptions, ElementAccess, ElementWrapper, WrapperType,
};

use crate::{
    Assignment, Command, CommandError, CommandKind, FunctionCall, Manage, ScriptFunction,
    ValidationError, ValidatorConfig,
};

/// Binds the names used by commands to wrappers and checks that everything they refer to
/// exists.
///
/// Recoverable errors are collected when [ValidatorConfig::continue_on_error] is set, and
/// can be read back with [errors](Self::errors). Fatal errors are always returned.
#[derive(Debug)]
pub struct Validator {
    config: ValidatorConfig,
    factory: ParameterFactory,
    functions: IndexMap<String, ScriptFunction>,
    errors: Vec<ValidationError>,
    function: Option<String>,
}

/// The validator state saved while a function body is validated.
#[derive(Debug)]
pub(crate) struct FunctionFrame {
    function: Option<String>,
    continue_on_error: bool,
    manage: Manage,
}

impl Validator {
    /// Create a validator with the built-in Parameter types.
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_factory(config, ParameterFactory::new())
    }

    /// Create a validator with a custom Parameter factory.
    pub fn with_factory(config: ValidatorConfig, factory: ParameterFactory) -> Self {
        Self {
            config,
            factory,
            functions: IndexMap::new(),
            errors: Vec::new(),
            function: None,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The Parameter factory.
    pub fn factory(&self) -> &ParameterFactory {
        &self.factory
    }

    /// Register a user function, replacing any function with the same name.
    pub fn add_function(&mut self, function: ScriptFunction) {
        log::debug!("Added function \"{}\"", function.name());
        self.functions.insert(function.name().to_string(), function);
    }

    /// Look up a user function.
    pub fn function(&self, name: &str) -> Option<&ScriptFunction> {
        self.functions.get(name)
    }

    /// The names of the registered user functions.
    pub fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    /// The errors collected so far.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Remove and return the collected errors.
    pub fn take_errors(&mut self) -> Vec<ValidationError> {
        std::mem::take(&mut self.errors)
    }

    /// Validate a sequence of commands in order.
    ///
    /// Returns false if any recoverable error was collected.
    pub fn validate_commands(
        &mut self,
        commands: &mut [Command],
        scope: &mut ObjectScope<'_>,
    ) -> Result<bool, ValidationError> {
        let errors_before = self.errors.len();
        let mut valid = true;
        for command in commands.iter_mut() {
            valid &= self.validate_command(command, scope)?;
        }
        log::info!(
            "Validated {} command(s), {} error(s)",
            commands.len(),
            self.errors.len() - errors_before
        );
        Ok(valid)
    }

    /// Create and install the wrappers for a command and its children, then check the
    /// objects it refers to.
    ///
    /// Previously installed wrappers are dropped first, so a command can be validated again
    /// after the objects change.
    pub fn validate_command(
        &mut self,
        command: &mut Command,
        scope: &mut ObjectScope<'_>,
    ) -> Result<bool, ValidationError> {
        let mut valid = match self.check_command(command, scope) {
            Ok(()) => true,
            Err(error) => {
                let generating_string = command.generating_string();
                self.handle_error(error, &generating_string, command.line())?
            }
        };
        if let CommandKind::Branch(branch) = command.kind_mut() {
            for child in branch.children_mut() {
                valid &= self.validate_command(child, scope)?;
            }
        }
        Ok(valid)
    }

    fn check_command(
        &self,
        command: &mut Command,
        scope: &mut ObjectScope<'_>,
    ) -> Result<(), CommandError> {
        command.clear_wrappers();
        if self.config.manage == Manage::None {
            return Ok(());
        }

        let parameters_first = match command.kind_mut() {
            CommandKind::Assignment(assignment) => {
                self.create_assignment_wrappers(assignment, scope)?;
                None
            }
            CommandKind::FunctionCall(call) => {
                self.check_function_call(call)?;
                Some(false)
            }
            _ => Some(true),
        };
        if let Some(parameters_first) = parameters_first {
            self.create_command_wrappers(command, scope, parameters_first)?;
        }
        self.check_undefined_reference(command, scope)
    }

    fn create_command_wrappers(
        &self,
        command: &mut Command,
        scope: &mut ObjectScope<'_>,
        parameters_first: bool,
    ) -> Result<(), CommandError> {
        let generating_string = command.generating_string();
        let options = ClassifyOptions {
            parameters_first,
            create_default_string: false,
        };
        for name in command.wrapper_object_names() {
            let wrapper = self.create_wrapper(scope, &name, options, &generating_string)?;
            if !command.set_element_wrapper(&name, wrapper) {
                return Err(CommandError::UnknownWrapperName {
                    command: command.type_name(),
                    name,
                });
            }
        }
        Ok(())
    }

    /// Bind both sides of an assignment.
    ///
    /// The left-hand side is the settable field being written, so it prefers object
    /// properties. A right-hand side name prefers the system Parameter when its last part is a
    /// Parameter type.
    fn create_assignment_wrappers(
        &self,
        assignment: &mut Assignment,
        scope: &mut ObjectScope<'_>,
    ) -> Result<(), CommandError> {
        let generating_string = assignment.generating_string();
        assignment.build_equation(&self.function_names())?;

        let lhs = assignment.lhs().to_string();
        let parts = ParameterName::parse(&lhs);
        let lhs_options = ClassifyOptions {
            parameters_first: lhs.matches('.').count() > 1
                && self.factory.is_settable(&parts.type_name),
            create_default_string: false,
        };
        let lhs_wrapper = self.create_wrapper(scope, &lhs, lhs_options, &generating_string)?;
        if lhs_wrapper.wrapper_type().is_literal() {
            return Err(CommandError::SetWrapperFailed {
                side: "LHS",
                name: lhs,
            });
        }

        let lhs_type = lhs_wrapper.data_type();
        if matches!(lhs_type, ParameterType::String | ParameterType::StringArray)
            && has_unbalanced_quote(assignment.rhs())
        {
            return Err(CommandError::MissingEndQuote { generating_string });
        }

        let names = assignment.rhs_wrapper_names()?;
        let is_math = assignment.is_math_tree();
        assignment.set_lhs_wrapper(lhs_wrapper);

        for name in names {
            if is_math && name == lhs && !name.contains('.') {
                continue;
            }
            let options = ClassifyOptions {
                parameters_first: self.factory.is_parameter_description(&name),
                create_default_string: lhs_type != ParameterType::Real,
            };
            let wrapper = if lhs_type == ParameterType::Filename
                && !is_quoted(&name)
                && scope.find_object(&name).is_none()
            {
                let quoted = format!("'{}'", name);
                self.create_wrapper(scope, &quoted, options, &generating_string)?
            } else {
                self.create_wrapper(scope, &name, options, &generating_string)?
            };
            if !assignment.set_rhs_wrapper(&name, wrapper) {
                return Err(CommandError::SetWrapperFailed { side: "RHS", name });
            }
        }

        if is_math {
            assignment.equation().validate()?;
        }
        self.attach_axis_system(assignment, scope)
    }

    /// `cs.Axes = MJ2000Ec` replaces the axis system of a CoordinateSystem.
    ///
    /// Runs once both sides are bound, so a failed assignment leaves the object unchanged.
    fn attach_axis_system(
        &self,
        assignment: &Assignment,
        scope: &ObjectScope<'_>,
    ) -> Result<(), CommandError> {
        let parts = ParameterName::parse(assignment.lhs());
        if parts.type_name != "Axes" || !parts.dependency.is_empty() || assignment.is_math_tree()
        {
            return Ok(());
        }
        let cs = match scope.find_object_of_type(&parts.owner, ObjectType::CoordinateSystem) {
            Some(cs) => cs,
            None => return Ok(()),
        };
        let axis_type = remove_quotes(assignment.rhs());
        let axes = Object::axis_system(axis_type)?;
        let mut cs = cs.borrow_mut();
        cs.set("Axes", axis_type)?;
        cs.replace_owned(ObjectType::AxisSystem, axes);
        log::debug!("Attached {} axes to \"{}\"", axis_type, cs.name());
        Ok(())
    }

    fn create_wrapper(
        &self,
        scope: &mut ObjectScope<'_>,
        name: &str,
        options: ClassifyOptions,
        referenced_in: &str,
    ) -> Result<ElementWrapper, CommandError> {
        match create_element_wrapper(scope, &self.factory, name, options) {
            Ok(wrapper) => {
                if self.config.warn_on_default_string
                    && wrapper.wrapper_type() == WrapperType::String
                    && !is_quoted(name)
                    && !is_braced(name)
                {
                    log::warn!(
                        "\"{}\" in \"{}\" is not an object and is treated as a string",
                        name,
                        referenced_in
                    );
                }
                Ok(wrapper)
            }
            Err(ClassifyError::UndefinedObject(name)) => Err(CommandError::UndefinedObject {
                name,
                referenced_in: referenced_in.to_string(),
            }),
            Err(error) => Err(error.into()),
        }
    }

    fn check_function_call(&self, call: &FunctionCall) -> Result<(), CommandError> {
        let function = self
            .functions
            .get(call.function())
            .ok_or_else(|| CommandError::UndefinedFunction(call.function().to_string()))?;
        for (direction, expected, actual) in [
            ("input", function.inputs().len(), call.inputs().len()),
            ("output", function.outputs().len(), call.outputs().len()),
        ] {
            if expected != actual {
                return Err(CommandError::FunctionArgumentCount {
                    function: function.name().to_string(),
                    direction,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Check that every object the command refers to exists with the right type.
    fn check_undefined_reference(
        &self,
        command: &Command,
        scope: &ObjectScope<'_>,
    ) -> Result<(), CommandError> {
        let referenced_in = format!("{} command", command.type_name());
        for (object_type, name) in command.ref_objects() {
            if object_type == ObjectType::Parameter {
                self.validate_parameter(scope, &name)?;
                continue;
            }
            match scope.find_object(&name) {
                None => {
                    return Err(CommandError::UndefinedReference {
                        object_type,
                        name,
                        referenced_in,
                    })
                }
                Some(object) if !object.borrow().is_of_type(object_type) => {
                    return Err(CommandError::WrongReferenceType {
                        object_type,
                        name,
                        referenced_in,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Check that a system Parameter has a known type and an existing owner.
    fn validate_parameter(&self, scope: &ObjectScope<'_>, name: &str) -> Result<(), CommandError> {
        let parts = ParameterName::parse(name);
        if !self.factory.is_parameter_type(&parts.type_name) {
            return Err(ObjectError::UnknownParameterType(parts.type_name).into());
        }
        if scope.find_object(&parts.owner).is_none() {
            return Err(CommandError::UndefinedObject {
                name: parts.owner,
                referenced_in: name.to_string(),
            });
        }
        Ok(())
    }

    /// Check the configured objects after every command has been validated.
    ///
    /// Parameters are bound to owners that were created after them, object references are
    /// checked, and CoordinateSystems without an axis system get the configured default.
    pub fn final_pass(&mut self, store: &mut ObjectStore) -> Result<bool, ValidationError> {
        let errors_before = self.errors.len();
        let mut valid = true;

        let unresolved = ObjectScope::new(store).bind_parameters();
        for parameter in unresolved {
            let owner = ParameterName::parse(&parameter).owner;
            let error = ObjectError::ParameterOwnerMissing { parameter, owner };
            valid &= self.handle_error(error.into(), "", None)?;
        }

        let objects: Vec<ObjectRef> = store.objects().cloned().collect();
        for object in &objects {
            for error in self.check_object(object, store) {
                valid &= self.handle_error(error, "", None)?;
            }
        }

        log::info!(
            "Final pass checked {} object(s), {} error(s)",
            objects.len(),
            self.errors.len() - errors_before
        );
        Ok(valid)
    }

    fn check_object(&self, object: &ObjectRef, store: &ObjectStore) -> Vec<CommandError> {
        let mut errors = Vec::new();
        let needs_axes = {
            let o = object.borrow();
            let referenced_in = format!("{} \"{}\"", o.type_name(), o.name());

            let mut refs = o.ref_objects();
            for owned in o.owned() {
                refs.extend(owned.borrow().ref_objects());
            }
            for (object_type, name) in refs {
                match store.find_object(&name) {
                    None => errors.push(CommandError::UndefinedReference {
                        object_type,
                        name,
                        referenced_in: referenced_in.clone(),
                    }),
                    Some(target) if !target.borrow().is_of_type(object_type) => {
                        errors.push(CommandError::WrongReferenceType {
                            object_type,
                            name,
                            referenced_in: referenced_in.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }

            if o.type_name() == "LibrationPoint" {
                if let (Ok(Value::Object(primary)), Ok(Value::Object(secondary))) =
                    (o.get("Primary"), o.get("Secondary"))
                {
                    if !primary.is_empty() && primary == secondary {
                        errors.push(CommandError::IdenticalBodies {
                            name: o.name().to_string(),
                            body: primary,
                        });
                    }
                }
            }
            o.object_type() == ObjectType::CoordinateSystem && !o.has_axis_system()
        };

        if needs_axes {
            let axis_type = self.config.default_axis_type.as_str();
            match Object::axis_system(axis_type) {
                Ok(axes) => {
                    let mut cs = object.borrow_mut();
                    log::warn!(
                        "CoordinateSystem \"{}\" has no AxisSystem, so {} is used",
                        cs.name(),
                        axis_type
                    );
                    cs.replace_owned(ObjectType::AxisSystem, axes);
                    if let Err(error) = cs.set("Axes", axis_type) {
                        errors.push(error.into());
                    }
                }
                Err(error) => errors.push(error.into()),
            }
        }
        errors
    }

    /// Attach the command text and line to an error, and the function name inside a function
    /// body.
    pub(crate) fn locate(
        &self,
        error: CommandError,
        generating_string: &str,
        line: Option<usize>,
    ) -> ValidationError {
        let error = match &self.function {
            Some(function) => CommandError::InFunction {
                function: function.clone(),
                error: Box::new(error),
            },
            None => error,
        };
        ValidationError::new(&error, generating_string, line)
    }

    /// Collect a recoverable error and return `Ok(false)`, or return the error if it is fatal
    /// or errors are not being collected.
    fn handle_error(
        &mut self,
        error: CommandError,
        generating_string: &str,
        line: Option<usize>,
    ) -> Result<bool, ValidationError> {
        let error = self.locate(error, generating_string, line);
        if error.class == crate::ErrorClass::Fatal || !self.config.continue_on_error {
            return Err(error);
        }
        log::warn!("{}", error);
        self.errors.push(error);
        Ok(false)
    }

    /// Switch to validating the body of `function`: errors stop validation and are tagged
    /// with the function name.
    pub(crate) fn enter_function(&mut self, function: &str) -> FunctionFrame {
        let frame = FunctionFrame {
            function: self.function.replace(function.to_string()),
            continue_on_error: self.config.continue_on_error,
            manage: self.config.manage,
        };
        self.config.continue_on_error = false;
        self.config.manage = Manage::Function;
        frame
    }

    pub(crate) fn leave_function(&mut self, frame: FunctionFrame) {
        self.function = frame.function;
        self.config.continue_on_error = frame.continue_on_error;
        self.config.manage = frame.manage;
    }
}
