use mscript_command::{
    Command, ReportLine, Runtime, ScriptFunction, ValidationError, Validator, ValidatorConfig,
};
use mscript_data_type::Value;
use mscript_object::{Object, ObjectRef, ObjectScope, ObjectStore};
use mscript_wrapper::{create_element_wrapper, ClassifyOptions, ElementWrapper};

use crate::Error;

/// A script: its objects, its user functions and its command sequence.
///
/// Commands are validated against the objects in the session, then executed in order. The
/// session starts with the default coordinate systems and the solar-system bodies.
#[derive(Debug)]
pub struct Session {
    store: ObjectStore,
    validator: Validator,
    commands: Vec<Command>,
    validated: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session with the default settings.
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    /// Create an empty session.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            store: ObjectStore::with_defaults(),
            validator: Validator::new(config),
            commands: Vec::new(),
            validated: false,
        }
    }

    /// Create an empty session from a JSON config.
    ///
    /// # Panics
    ///
    /// Panics if the config cannot be parsed.
    #[track_caller]
    pub fn from_config_json(json: &str) -> Self {
        match Self::try_from_config_json(json) {
            Ok(session) => session,
            Err(error) => panic!("Error:\n  failed to load config:\n  {}\n", error),
        }
    }

    /// Create an empty session from a JSON config.
    ///
    /// Missing fields take their default values.
    pub fn try_from_config_json(json: &str) -> Result<Self, Error> {
        Ok(Self::with_config(ValidatorConfig::from_json(json)?))
    }

    /// The settings used for validation and execution.
    pub fn config(&self) -> &ValidatorConfig {
        self.validator.config()
    }

    /// The objects of the script.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Mutable access to the objects of the script.
    ///
    /// The commands are validated again before the next run.
    pub fn store_mut(&mut self) -> &mut ObjectStore {
        self.validated = false;
        &mut self.store
    }

    /// Look up an object by name.
    pub fn object(&self, name: &str) -> Option<ObjectRef> {
        self.store.find_object(name)
    }

    /// Add an object, e.g. `Object::spacecraft("sat1")`.
    ///
    /// # Panics
    ///
    /// Panics if an object with the same name already exists.
    #[track_caller]
    pub fn add_object(&mut self, object: Object) -> ObjectRef {
        let name = object.name().to_string();
        match self.try_add_object(object) {
            Ok(object) => object,
            Err(error) => panic!("Error:\n  failed to add '{}':\n  {}\n", name, error),
        }
    }

    /// Add an object, e.g. `Object::spacecraft("sat1")`.
    ///
    /// Returns an error if an object with the same name already exists.
    pub fn try_add_object(&mut self, object: Object) -> Result<ObjectRef, Error> {
        self.validated = false;
        Ok(self.store.add(object)?)
    }

    /// Create an object by type name, as in `Create Spacecraft sat1`.
    ///
    /// # Panics
    ///
    /// Panics if the type is unknown or the name is taken.
    #[track_caller]
    pub fn create(&mut self, type_name: &str, name: &str) -> ObjectRef {
        match self.try_create(type_name, name) {
            Ok(object) => object,
            Err(error) => panic!(
                "Error:\n  failed to create {} '{}':\n  {}\n",
                type_name, name, error
            ),
        }
    }

    /// Create an object by type name, as in `Create Spacecraft sat1`.
    ///
    /// Returns an error if:
    /// - the type is unknown
    /// - an object with the same name already exists
    pub fn try_create(&mut self, type_name: &str, name: &str) -> Result<ObjectRef, Error> {
        self.try_add_object(Object::create(type_name, name)?)
    }

    /// Register a user function.
    pub fn add_function(&mut self, function: ScriptFunction) {
        self.validated = false;
        self.validator.add_function(function);
    }

    /// Append a command to the sequence.
    pub fn push(&mut self, command: impl Into<Command>) {
        self.validated = false;
        self.commands.push(command.into());
    }

    /// The command sequence.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Rename an object and every reference to it in the objects and the commands.
    ///
    /// # Panics
    ///
    /// Panics if `old` does not exist or `new` is taken.
    #[track_caller]
    pub fn rename_object(&mut self, old: &str, new: &str) {
        if let Err(error) = self.try_rename_object(old, new) {
            panic!(
                "Error:\n  failed to rename '{}' to '{}':\n  {}\n",
                old, new, error
            );
        }
    }

    /// Rename an object and every reference to it in the objects and the commands.
    ///
    /// Returns an error if `old` does not exist or `new` is taken.
    pub fn try_rename_object(&mut self, old: &str, new: &str) -> Result<(), Error> {
        self.store.rename_object(old, new)?;
        for command in &mut self.commands {
            command.rename_ref_object(old, new);
        }
        Ok(())
    }

    /// Classify a description against the objects of the session and return a bound
    /// wrapper.
    ///
    /// # Panics
    ///
    /// Panics if the description refers to an object that does not exist.
    #[track_caller]
    pub fn wrapper(&mut self, description: &str) -> ElementWrapper {
        match self.try_wrapper(description, ClassifyOptions::default()) {
            Ok(wrapper) => wrapper,
            Err(error) => panic!(
                "Error:\n  failed to classify '{}':\n  {}\n",
                description, error
            ),
        }
    }

    /// Classify a description against the objects of the session and return a bound
    /// wrapper.
    ///
    /// System Parameters the description names are created in the session.
    pub fn try_wrapper(
        &mut self,
        description: &str,
        options: ClassifyOptions,
    ) -> Result<ElementWrapper, Error> {
        let mut scope = ObjectScope::new(&mut self.store);
        Ok(create_element_wrapper(
            &mut scope,
            self.validator.factory(),
            description,
            options,
        )?)
    }

    /// Evaluate a description, e.g. `sat1.X` or `A(1, 2)`.
    ///
    /// # Panics
    ///
    /// Panics if the description cannot be classified or evaluated.
    #[track_caller]
    pub fn evaluate(&mut self, description: &str) -> Value {
        match self.try_evaluate(description) {
            Ok(value) => value,
            Err(error) => panic!(
                "Error:\n  failed to evaluate '{}':\n  {}\n",
                description, error
            ),
        }
    }

    /// Evaluate a description, e.g. `sat1.X` or `A(1, 2)`.
    pub fn try_evaluate(&mut self, description: &str) -> Result<Value, Error> {
        let wrapper = self.try_wrapper(description, ClassifyOptions::default())?;
        Ok(wrapper.evaluate()?)
    }

    /// Validate the commands, then run the final pass over the objects.
    ///
    /// # Panics
    ///
    /// Panics if the script has any error.
    #[track_caller]
    pub fn validate(&mut self) {
        if let Err(error) = self.try_validate() {
            panic!("Error:\n  failed to validate script:\n  {}\n", error);
        }
    }

    /// Validate the commands, then run the final pass over the objects.
    ///
    /// Errors from a previous validation are discarded. With
    /// [continue_on_error](ValidatorConfig::continue_on_error) set, every recoverable error is
    /// collected and returned together; otherwise the first error is returned.
    pub fn try_validate(&mut self) -> Result<(), Error> {
        self.validated = false;
        self.validator.take_errors();

        let mut scope = ObjectScope::new(&mut self.store);
        self.validator.validate_commands(&mut self.commands, &mut scope)?;
        self.validator.final_pass(&mut self.store)?;

        let errors = self.validator.errors();
        if !errors.is_empty() {
            return Err(Error::ScriptErrors(errors.to_vec()));
        }
        self.validated = true;
        Ok(())
    }

    /// The errors found by the last validation.
    ///
    /// Empty after a successful validation.
    pub fn errors(&self) -> &[ValidationError] {
        self.validator.errors()
    }

    /// Execute the commands and return the lines written by Report commands.
    ///
    /// The script is validated first if it changed since the last validation.
    ///
    /// # Panics
    ///
    /// Panics if validation fails or a command fails.
    #[track_caller]
    pub fn run(&mut self) -> Vec<ReportLine> {
        match self.try_run() {
            Ok(output) => output,
            Err(error) => panic!("Error:\n  failed to run script:\n  {}\n", error),
        }
    }

    /// Execute the commands and return the lines written by Report commands.
    ///
    /// The script is validated first if it changed since the last validation. Execution
    /// stops at the first failing command.
    pub fn try_run(&mut self) -> Result<Vec<ReportLine>, Error> {
        if !self.validated {
            self.try_validate()?;
        }
        let mut scope = ObjectScope::new(&mut self.store);
        let mut runtime = Runtime::new(&mut self.validator);
        runtime.execute_all(&mut self.commands, &mut scope)?;
        let output = runtime.into_output();
        log::info!(
            "Ran {} command(s), wrote {} report line(s)",
            self.commands.len(),
            output.len()
        );
        Ok(output)
    }
}
