use mscript_data_type::{ParameterType, Value};
use mscript_object::{replace_name, Object};
use mscript_wrapper::{ElementAccess, ElementWrapper, WrapperType};

use crate::{is_equation, MathError, MathTree, MathValue, WrapperMap};

/// The description given to the array that holds a matrix result.
pub const ARRAY_OUTPUT: &str = "ArrayOutput";

/// A math expression on the right-hand side of an assignment, with the wrappers for its
/// leaves.
#[derive(Debug, Clone, Default)]
pub struct RhsEquation {
    text: String,
    tree: Option<MathTree>,
    wrappers: WrapperMap,
}

impl RhsEquation {
    /// An equation with no expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// The expression text, empty until an expression has been built.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed expression.
    pub fn tree(&self) -> Option<&MathTree> {
        self.tree.as_ref()
    }

    /// The leaf wrappers.
    pub fn wrappers(&self) -> &WrapperMap {
        &self.wrappers
    }

    /// Parse `text` as the expression if it is an equation.
    ///
    /// Returns false, leaving the equation empty, if `text` is a single value rather than an
    /// equation (see [is_equation]). Fails if the text ends in `'` and is otherwise the name of
    /// one of `function_names`, which is almost always a string with a missing start quote.
    /// Once built, the expression is kept and later calls return true.
    pub fn build_expression(
        &mut self,
        text: &str,
        allow_single_element: bool,
        function_names: &[String],
    ) -> Result<bool, MathError> {
        if self.tree.is_some() {
            return Ok(true);
        }
        if !is_equation(text, allow_single_element) {
            return Ok(false);
        }

        let text = text.trim();
        if let Some(stripped) = text.strip_suffix('\'') {
            let stripped: String = stripped.chars().filter(|c| *c != ' ').collect();
            if function_names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&stripped))
            {
                return Err(MathError::MissingStartQuote);
            }
        }

        self.tree = Some(MathTree::parse(text)?);
        self.text = text.to_string();
        log::debug!("Built math tree for \"{}\"", text);
        Ok(true)
    }

    /// The leaf names that need wrappers, adding any missing ones to the wrapper map.
    pub fn wrapper_object_names(&mut self) -> Result<Vec<String>, MathError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| MathError::NotConstructed(self.text.clone()))?;
        let names = tree.element_names();
        for name in &names {
            self.wrappers.entry(name.clone()).or_insert(None);
        }
        Ok(names)
    }

    /// Install the wrapper for the leaf `name`.
    ///
    /// Returns false if the equation has no such leaf, or if a dotted leaf resolved to
    /// something other than a Parameter, object property, number or string.
    pub fn set_element_wrapper(&mut self, name: &str, wrapper: ElementWrapper) -> bool {
        let slot = match self.wrappers.get_mut(name) {
            Some(slot) => slot,
            None => return false,
        };
        let accepted = !name.contains('.')
            || matches!(
                wrapper.wrapper_type(),
                WrapperType::Parameter
                    | WrapperType::StringObject
                    | WrapperType::ObjectProperty
                    | WrapperType::Number
                    | WrapperType::String
            );
        if accepted {
            *slot = Some(wrapper);
        }
        accepted
    }

    /// Drop every installed wrapper, keeping the leaf names.
    pub fn clear_wrappers(&mut self) {
        for wrapper in self.wrappers.values_mut() {
            *wrapper = None;
        }
    }

    /// Rename `old` to `new` in the expression, the leaf names and the wrappers.
    ///
    /// Returns true if the expression changed.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) -> bool {
        let changed = match &mut self.tree {
            Some(tree) => {
                let changed = tree.rename_ref_object(old, new);
                self.text = tree.text().to_string();
                changed
            }
            None => false,
        };

        let wrappers = std::mem::take(&mut self.wrappers);
        self.wrappers = wrappers
            .into_iter()
            .map(|(name, mut wrapper)| {
                if let Some(wrapper) = &mut wrapper {
                    wrapper.rename_object(old, new);
                }
                (replace_name(&name, old, new), wrapper)
            })
            .collect();
        changed
    }

    /// Check that every leaf has a wrapper and that the operand types fit together.
    pub fn validate(&self) -> Result<(), MathError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| MathError::NotConstructed(self.text.clone()))?;
        tree.output_info(&self.wrappers)
            .map(|_| ())
            .map_err(|error| MathError::Context {
                context: "Failed to validate math equation or function inputs".to_string(),
                error: Box::new(error),
            })
    }

    /// Evaluate the expression and return the result in a new wrapper.
    ///
    /// The result type must match the type of `lhs`, except that a 1x1 matrix may be assigned
    /// to a real and a real to a 1x1 array. Without `lhs` any result type is accepted. A matrix
    /// result is held by a new Array named [ARRAY_OUTPUT], and an object result is a copy of
    /// the evaluated object.
    pub fn run_math_tree(&self, lhs: Option<&ElementWrapper>) -> Result<ElementWrapper, MathError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| MathError::NotConstructed(self.text.clone()))?;
        let info = tree.output_info(&self.wrappers)?;

        if let Some(lhs) = lhs {
            let lhs_type = assignment_type(lhs.data_type());
            let compatible = lhs_type == info.data_type
                || match (lhs_type, info.data_type) {
                    (ParameterType::Real, ParameterType::Matrix) => (info.rows, info.cols) == (1, 1),
                    (ParameterType::Matrix, ParameterType::Real) => lhs
                        .evaluate_matrix()
                        .map_or(false, |matrix| matrix.is_scalar()),
                    _ => false,
                };
            if !compatible {
                return Err(MathError::TypeMismatch {
                    return_type: info.data_type,
                    lhs_type,
                });
            }
        }

        let output = match tree.evaluate(&self.wrappers)? {
            MathValue::Real(value) => ElementWrapper::number(&value.to_string(), value),
            MathValue::Matrix(matrix) => {
                let mut array = Object::array(ARRAY_OUTPUT, matrix.rows(), matrix.cols());
                array.assign(Value::Matrix(matrix))?;
                ElementWrapper::for_object(ARRAY_OUTPUT, array.into_ref())
            }
            MathValue::String(text) => ElementWrapper::string(&text, &text),
            MathValue::Object(object) => {
                let copy = object.borrow().duplicate();
                let name = copy.name().to_string();
                ElementWrapper::for_object(&name, copy.into_ref())
            }
        };
        Ok(output)
    }
}

/// The equation result type that can be assigned to a target of type `data_type`.
fn assignment_type(data_type: ParameterType) -> ParameterType {
    match data_type {
        t if t.is_numeric() => ParameterType::Real,
        t if t.is_matrix() => ParameterType::Matrix,
        ParameterType::Enumeration | ParameterType::Filename => ParameterType::String,
        t => t,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use mscript_data_type::Rmatrix;
    use mscript_object::{ObjectScope, ObjectStore, ParameterFactory};
    use mscript_wrapper::{create_element_wrapper, ClassifyOptions};

    use super::*;

    fn store() -> ObjectStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = ObjectStore::with_defaults();
        store.add(Object::spacecraft("sat1")).unwrap();
        store.add(Object::variable("x", 3.0)).unwrap();
        store.add(Object::variable("i", 2.0)).unwrap();
        store.add(Object::array("M1", 1, 1)).unwrap();
        store.add(Object::array("M2", 2, 1)).unwrap();
        store.add(Object::array("A", 3, 3)).unwrap();
        store.add(Object::string("s", "text")).unwrap();
        store
    }

    /// Build `text` and bind its leaves the way assignment validation does.
    fn equation(store: &mut ObjectStore, text: &str, allow_single_element: bool) -> RhsEquation {
        let mut equation = RhsEquation::new();
        assert!(equation
            .build_expression(text, allow_single_element, &[])
            .unwrap());
        let factory = ParameterFactory::new();
        let mut scope = ObjectScope::new(store);
        for name in equation.wrapper_object_names().unwrap() {
            let wrapper =
                create_element_wrapper(&mut scope, &factory, &name, ClassifyOptions::default())
                    .unwrap();
            assert!(equation.set_element_wrapper(&name, wrapper), "{}", name);
        }
        equation
    }

    fn wrapper_for(store: &ObjectStore, name: &str) -> ElementWrapper {
        ElementWrapper::for_object(name, store.find_object(name).unwrap())
    }

    #[test]
    fn test_real_result() {
        let mut store = store();
        let equation = equation(&mut store, "x * 2 + A(i, 1) - sat1.DryMass / 850", false);
        let x = wrapper_for(&store, "x");
        let output = equation.run_math_tree(Some(&x)).unwrap();
        assert_eq!(output.wrapper_type(), WrapperType::Number);
        assert_eq!(output.evaluate_real().unwrap(), 5.0);
    }

    #[test]
    fn test_scalar_matrix_tolerance() {
        let mut store = store();
        let x = wrapper_for(&store, "x");

        let one_by_one = equation(&mut store, "M1 * 2", false);
        let output = one_by_one.run_math_tree(Some(&x)).unwrap();
        assert_eq!(output.wrapper_type(), WrapperType::Array);
        assert_eq!(output.description(), ARRAY_OUTPUT);

        let two_by_one = equation(&mut store, "M2 * 2", false);
        let error = two_by_one.run_math_tree(Some(&x)).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Cannot set type \"Matrix\" to type \"Real\""
        );

        let scalar = equation(&mut store, "x + 1", false);
        let m1 = wrapper_for(&store, "M1");
        assert!(scalar.run_math_tree(Some(&m1)).is_ok());
        let m2 = wrapper_for(&store, "M2");
        assert!(matches!(
            scalar.run_math_tree(Some(&m2)),
            Err(MathError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_matrix_result_values() {
        let mut store = store();
        store
            .find_object("M2")
            .unwrap()
            .borrow_mut()
            .assign(Value::Matrix(
                Rmatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap(),
            ))
            .unwrap();
        let equation = equation(&mut store, "M2' * 3", false);
        let output = equation.run_math_tree(None).unwrap();
        assert_eq!(output.evaluate_matrix().unwrap().data(), &[3.0, 6.0]);
    }

    #[test]
    fn test_single_elements() {
        let mut store = store();
        let text = equation(&mut store, "s", true);
        let output = text.run_math_tree(None).unwrap();
        assert_eq!(output.wrapper_type(), WrapperType::String);
        assert_eq!(output.evaluate_string().unwrap(), "text");

        let sat = equation(&mut store, "sat1", true);
        let output = sat.run_math_tree(None).unwrap();
        assert_eq!(output.wrapper_type(), WrapperType::Object);
        let original = store.find_object("sat1").unwrap();
        assert!(!Rc::ptr_eq(&output.evaluate_object().unwrap(), &original));

        let mut single = RhsEquation::new();
        assert!(!single.build_expression("x", false, &[]).unwrap());
        assert!(single.tree().is_none());
    }

    #[test]
    fn test_missing_start_quote() {
        let functions = vec!["MyFunction".to_string()];
        let mut equation = RhsEquation::new();
        assert!(matches!(
            equation.build_expression("myfunction'", false, &functions),
            Err(MathError::MissingStartQuote)
        ));
        assert!(equation.build_expression("x'", false, &functions).unwrap());
    }

    #[test]
    fn test_unbound_leaf_is_fatal() {
        let mut equation = RhsEquation::new();
        equation.build_expression("x + 1", false, &[]).unwrap();
        assert_eq!(equation.wrapper_object_names().unwrap(), ["x"]);
        let error = equation.run_math_tree(None).unwrap_err();
        assert!(error.is_fatal());
        assert!(equation.validate().is_err());
    }

    #[test]
    fn test_wrapper_rules() {
        let mut store = store();
        let mut equation = equation(&mut store, "sat1.X + x", false);
        assert!(!equation.set_element_wrapper("y", ElementWrapper::number("1", 1.0)));
        let object = wrapper_for(&store, "sat1");
        assert!(!equation.set_element_wrapper("sat1.X", object));

        equation.clear_wrappers();
        assert!(equation.wrappers().values().all(Option::is_none));
        assert_eq!(equation.wrappers().len(), 2);
    }

    #[test]
    fn test_rename() {
        let mut store = store();
        let mut equation = equation(&mut store, "sat1.X + x", false);
        assert!(equation.rename_ref_object("sat1", "satA"));
        assert_eq!(equation.text(), "satA.X + x");
        let wrapper = equation.wrappers()["satA.X"].as_ref().unwrap();
        assert_eq!(wrapper.description(), "satA.X");
    }
}
