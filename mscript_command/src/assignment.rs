use mscript_math::RhsEquation;
use mscript_object::replace_name;
use mscript_wrapper::{ElementAccess, ElementWrapper, WrapperType};

use crate::CommandError;

/// `lhs = rhs`, where the right-hand side is a single value or a math equation.
#[derive(Debug, Clone)]
pub struct Assignment {
    lhs: String,
    rhs: String,
    lhs_wrapper: Option<ElementWrapper>,
    rhs_wrapper: Option<ElementWrapper>,
    equation: RhsEquation,
}

impl Assignment {
    /// Create an assignment from the text on each side of the `=`.
    pub fn new(lhs: &str, rhs: &str) -> Self {
        let rhs = rhs.trim();
        Self {
            lhs: lhs.trim().to_string(),
            rhs: rhs.strip_suffix(';').unwrap_or(rhs).trim_end().to_string(),
            lhs_wrapper: None,
            rhs_wrapper: None,
            equation: RhsEquation::new(),
        }
    }

    /// The left-hand side text.
    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    /// The right-hand side text.
    pub fn rhs(&self) -> &str {
        &self.rhs
    }

    /// The left-hand side wrapper.
    pub fn lhs_wrapper(&self) -> Option<&ElementWrapper> {
        self.lhs_wrapper.as_ref()
    }

    /// The right-hand side wrapper, when the right-hand side is not an equation.
    pub fn rhs_wrapper(&self) -> Option<&ElementWrapper> {
        self.rhs_wrapper.as_ref()
    }

    /// The right-hand side equation. Empty unless [build_equation](Self::build_equation)
    /// found one.
    pub fn equation(&self) -> &RhsEquation {
        &self.equation
    }

    /// Return true if the right-hand side is a math equation.
    pub fn is_math_tree(&self) -> bool {
        self.equation.tree().is_some()
    }

    /// Parse the right-hand side as an equation if it is one.
    pub fn build_equation(&mut self, function_names: &[String]) -> Result<bool, CommandError> {
        let rhs = self.rhs.clone();
        Ok(self.equation.build_expression(&rhs, false, function_names)?)
    }

    /// The right-hand side names that need wrappers.
    pub fn rhs_wrapper_names(&mut self) -> Result<Vec<String>, CommandError> {
        if self.is_math_tree() {
            Ok(self.equation.wrapper_object_names()?)
        } else if self.rhs.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![self.rhs.clone()])
        }
    }

    /// Install the left-hand side wrapper.
    ///
    /// An undotted name that also appears in the equation shares the wrapper.
    pub fn set_lhs_wrapper(&mut self, wrapper: ElementWrapper) {
        if self.is_math_tree() && !self.lhs.contains('.') {
            self.equation.set_element_wrapper(&self.lhs, wrapper.clone());
        }
        self.lhs_wrapper = Some(wrapper);
    }

    /// Install the wrapper for a right-hand side name.
    ///
    /// Returns false if the right-hand side does not use `name`.
    pub fn set_rhs_wrapper(&mut self, name: &str, wrapper: ElementWrapper) -> bool {
        if self.is_math_tree() {
            self.equation.set_element_wrapper(name, wrapper)
        } else if name == self.rhs {
            self.rhs_wrapper = Some(wrapper);
            true
        } else {
            false
        }
    }

    /// Drop every wrapper.
    pub fn clear_wrappers(&mut self) {
        self.lhs_wrapper = None;
        self.rhs_wrapper = None;
        self.equation.clear_wrappers();
    }

    /// The installed wrappers.
    pub fn wrappers(&self) -> impl Iterator<Item = &ElementWrapper> {
        self.lhs_wrapper
            .iter()
            .chain(self.rhs_wrapper.iter())
            .chain(self.equation.wrappers().values().flatten())
    }

    /// Rename `old` to `new` on both sides.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) {
        self.lhs = replace_name(&self.lhs, old, new);
        self.rhs = replace_name(&self.rhs, old, new);
        for wrapper in [&mut self.lhs_wrapper, &mut self.rhs_wrapper]
            .into_iter()
            .flatten()
        {
            wrapper.rename_object(old, new);
        }
        self.equation.rename_ref_object(old, new);
    }

    /// Evaluate the right-hand side and write it through the left-hand side.
    pub fn execute(&mut self) -> Result<(), CommandError> {
        let output = if self.is_math_tree() {
            self.equation.run_math_tree(self.lhs_wrapper.as_ref())?
        } else {
            self.rhs_wrapper
                .clone()
                .ok_or_else(|| CommandError::MissingWrapper {
                    command: "Assignment",
                    name: self.rhs.clone(),
                })?
        };
        let lhs = self
            .lhs_wrapper
            .as_mut()
            .ok_or_else(|| CommandError::MissingWrapper {
                command: "Assignment",
                name: self.lhs.clone(),
            })?;
        assign(lhs, &output)
    }

    /// `lhs = rhs`.
    pub fn generating_string(&self) -> String {
        format!("{} = {}", self.lhs, self.rhs)
    }
}

/// Write the value behind `rhs` through `lhs`.
///
/// Whole objects are copied, a real assigned to an array must fit a 1x1 array, and everything
/// else goes through the target's value conversion.
fn assign(lhs: &mut ElementWrapper, rhs: &ElementWrapper) -> Result<(), CommandError> {
    if lhs.wrapper_type() == WrapperType::Object {
        lhs.set_object(&rhs.evaluate_object()?)?;
    } else if lhs.data_type().is_matrix() && rhs.data_type().is_numeric() {
        lhs.set_real(rhs.evaluate_real()?)?;
    } else {
        lhs.set_value(&rhs.evaluate()?)?;
    }
    Ok(())
}
