use mscript_object::{replace_name, Object};
use mscript_wrapper::ElementWrapper;

use crate::Command;

/// A user function: formal arguments, local object declarations and a body.
///
/// Each call runs the body in a fresh local store that holds copies of the inputs and the
/// declared objects, with the script's objects visible as globals.
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    locals: Vec<Object>,
    body: Vec<Command>,
}

impl ScriptFunction {
    /// Create a function with an empty body.
    pub fn new(name: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            locals: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Declare a local object, e.g. `Create Variable y`.
    pub fn declare(mut self, object: Object) -> Self {
        self.locals.push(object);
        self
    }

    /// Append a command to the body.
    pub fn with_command(mut self, command: impl Into<Command>) -> Self {
        self.body.push(command.into());
        self
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The formal input names.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// The formal output names.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// The declared local objects.
    pub fn locals(&self) -> &[Object] {
        &self.locals
    }

    /// The body.
    pub fn body(&self) -> &[Command] {
        &self.body
    }
}

/// `[out1, out2] = Name(in1, in2)`.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    function: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    input_wrappers: Vec<Option<ElementWrapper>>,
    output_wrappers: Vec<Option<ElementWrapper>>,
}

impl FunctionCall {
    /// Create a call of `function`.
    pub fn new(function: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            function: function.trim().to_string(),
            inputs: inputs.iter().map(|s| s.trim().to_string()).collect(),
            outputs: outputs.iter().map(|s| s.trim().to_string()).collect(),
            input_wrappers: vec![None; inputs.len()],
            output_wrappers: vec![None; outputs.len()],
        }
    }

    /// The name of the called function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The actual input argument texts.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// The actual output argument texts.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// The input wrappers, in argument order.
    pub fn input_wrappers(&self) -> &[Option<ElementWrapper>] {
        &self.input_wrappers
    }

    /// The output wrappers, in argument order.
    pub fn output_wrappers(&self) -> &[Option<ElementWrapper>] {
        &self.output_wrappers
    }

    pub(crate) fn output_wrappers_mut(&mut self) -> &mut [Option<ElementWrapper>] {
        &mut self.output_wrappers
    }

    /// The argument names that need wrappers, inputs first, without duplicates.
    pub fn wrapper_object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.inputs.iter().chain(&self.outputs) {
            if !name.is_empty() && !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Install `wrapper` on every argument named `name`.
    pub fn set_element_wrapper(&mut self, name: &str, wrapper: &ElementWrapper) -> bool {
        let mut matched = false;
        for (arguments, wrappers) in [
            (&self.inputs, &mut self.input_wrappers),
            (&self.outputs, &mut self.output_wrappers),
        ] {
            for (argument, slot) in arguments.iter().zip(wrappers.iter_mut()) {
                if argument == name {
                    *slot = Some(wrapper.clone());
                    matched = true;
                }
            }
        }
        matched
    }

    /// Drop every wrapper.
    pub fn clear_wrappers(&mut self) {
        for slot in self
            .input_wrappers
            .iter_mut()
            .chain(self.output_wrappers.iter_mut())
        {
            *slot = None;
        }
    }

    /// The installed wrappers.
    pub fn wrappers(&self) -> impl Iterator<Item = &ElementWrapper> {
        self.input_wrappers
            .iter()
            .chain(&self.output_wrappers)
            .flatten()
    }

    /// Rename `old` to `new` in the arguments.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) {
        for argument in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            *argument = replace_name(argument, old, new);
        }
        for wrapper in self
            .input_wrappers
            .iter_mut()
            .chain(self.output_wrappers.iter_mut())
            .flatten()
        {
            wrapper.rename_object(old, new);
        }
    }

    /// `[a, b] = F(x, y)`, or `F(x, y)` without outputs.
    pub fn generating_string(&self) -> String {
        let call = format!("{}({})", self.function, self.inputs.join(", "));
        if self.outputs.is_empty() {
            call
        } else {
            format!("[{}] = {}", self.outputs.join(", "), call)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let mut call = FunctionCall::new("Norm2", &["x", " y", "x"], &["r"]);
        assert_eq!(call.generating_string(), "[r] = Norm2(x, y, x)");
        assert_eq!(call.wrapper_object_names(), ["x", "y", "r"]);

        assert!(call.set_element_wrapper("x", &ElementWrapper::number("x", 1.0)));
        assert!(!call.set_element_wrapper("z", &ElementWrapper::number("z", 1.0)));
        assert_eq!(call.wrappers().count(), 2);

        call.rename_ref_object("x", "w");
        assert_eq!(call.inputs(), ["w", "y", "w"]);
        assert_eq!(
            call.input_wrappers()[0].as_ref().unwrap().description(),
            "w"
        );
        call.clear_wrappers();
        assert_eq!(call.wrappers().count(), 0);
        assert_eq!(FunctionCall::new("F", &[], &[]).generating_string(), "F()");
    }
}
