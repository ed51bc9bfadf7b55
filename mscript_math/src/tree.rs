use indexmap::IndexMap;
use mscript_data_type::{DimensionError, ParameterType, Rmatrix};
use mscript_object::{replace_name, ObjectRef};
use mscript_wrapper::{ElementAccess, ElementWrapper, WrapperType};

use crate::{parse_expression, MathError};

/// The wrappers for the leaves of a math tree, keyed by leaf text.
///
/// A leaf maps to `None` until validation installs its wrapper.
pub type WrapperMap = IndexMap<String, Option<ElementWrapper>>;

/// A binary operator.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    /// The operator as written in scripts.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }

    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Subtract => left - right,
            BinaryOp::Multiply => left * right,
            BinaryOp::Divide => left / right,
            BinaryOp::Power => left.powf(right),
        }
    }
}

/// A built-in function.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sqrt,
    Abs,
    Exp,
    Log,
    Log10,
    DegToRad,
    RadToDeg,
    Transpose,
    Norm,
}

impl MathFunction {
    /// Look up a function by its script name.
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => MathFunction::Sin,
            "cos" => MathFunction::Cos,
            "tan" => MathFunction::Tan,
            "asin" => MathFunction::Asin,
            "acos" => MathFunction::Acos,
            "atan" => MathFunction::Atan,
            "atan2" => MathFunction::Atan2,
            "sqrt" => MathFunction::Sqrt,
            "abs" => MathFunction::Abs,
            "exp" => MathFunction::Exp,
            "log" => MathFunction::Log,
            "log10" => MathFunction::Log10,
            "DegToRad" | "degToRad" => MathFunction::DegToRad,
            "RadToDeg" | "radToDeg" => MathFunction::RadToDeg,
            "transpose" => MathFunction::Transpose,
            "norm" => MathFunction::Norm,
            _ => return None,
        };
        Some(function)
    }

    /// The script name.
    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Asin => "asin",
            MathFunction::Acos => "acos",
            MathFunction::Atan => "atan",
            MathFunction::Atan2 => "atan2",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Abs => "abs",
            MathFunction::Exp => "exp",
            MathFunction::Log => "log",
            MathFunction::Log10 => "log10",
            MathFunction::DegToRad => "DegToRad",
            MathFunction::RadToDeg => "RadToDeg",
            MathFunction::Transpose => "transpose",
            MathFunction::Norm => "norm",
        }
    }

    /// The number of inputs.
    pub fn arity(self) -> usize {
        match self {
            MathFunction::Atan2 => 2,
            _ => 1,
        }
    }

    fn apply_scalar(self, x: f64) -> f64 {
        match self {
            MathFunction::Sin => x.sin(),
            MathFunction::Cos => x.cos(),
            MathFunction::Tan => x.tan(),
            MathFunction::Asin => x.asin(),
            MathFunction::Acos => x.acos(),
            MathFunction::Atan => x.atan(),
            MathFunction::Sqrt => x.sqrt(),
            MathFunction::Abs | MathFunction::Norm => x.abs(),
            MathFunction::Exp => x.exp(),
            MathFunction::Log => x.ln(),
            MathFunction::Log10 => x.log10(),
            MathFunction::DegToRad => x.to_radians(),
            MathFunction::RadToDeg => x.to_degrees(),
            MathFunction::Transpose | MathFunction::Atan2 => x,
        }
    }
}

/// A node of a parsed math expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MathNode {
    /// A number literal.
    Number(f64),
    /// A string literal, without quotes.
    String(String),
    /// An identifier leaf, evaluated through a wrapper, e.g. `sat1.X` or `A(i, 2)`.
    Element(String),
    /// Unary minus.
    Negate(Box<MathNode>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<MathNode>,
        /// The right operand.
        right: Box<MathNode>,
    },
    /// A function call, including the postfix transpose.
    Function {
        /// The function.
        function: MathFunction,
        /// The inputs.
        args: Vec<MathNode>,
    },
}

/// The type and size of a node's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputInfo {
    /// `Real`, `Matrix`, `String` or `Object`.
    pub data_type: ParameterType,
    /// The number of rows, 1 for non-matrix types.
    pub rows: usize,
    /// The number of columns, 1 for non-matrix types.
    pub cols: usize,
}

impl OutputInfo {
    fn of(data_type: ParameterType) -> Self {
        Self {
            data_type,
            rows: 1,
            cols: 1,
        }
    }

    fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            data_type: ParameterType::Matrix,
            rows,
            cols,
        }
    }

    fn is_matrix(&self) -> bool {
        self.data_type == ParameterType::Matrix
    }
}

/// The result of evaluating a node.
#[derive(Debug, Clone)]
pub enum MathValue {
    /// A real number.
    Real(f64),
    /// A matrix.
    Matrix(Rmatrix),
    /// Text.
    String(String),
    /// A configured object.
    Object(ObjectRef),
}

impl MathValue {
    /// The type of the value, using the same names as [OutputInfo].
    pub fn data_type(&self) -> ParameterType {
        match self {
            MathValue::Real(_) => ParameterType::Real,
            MathValue::Matrix(_) => ParameterType::Matrix,
            MathValue::String(_) => ParameterType::String,
            MathValue::Object(_) => ParameterType::Object,
        }
    }

    /// The value as a scalar, accepting a 1x1 matrix.
    fn scalar(&self, operation: &str) -> Result<f64, MathError> {
        match self {
            MathValue::Real(value) => Ok(*value),
            MathValue::Matrix(m) if m.is_scalar() => Ok(m.data()[0]),
            value => Err(invalid(operation, value.data_type())),
        }
    }
}

fn invalid(operation: &str, data_type: ParameterType) -> MathError {
    MathError::InvalidOperand {
        operation: operation.to_string(),
        data_type,
    }
}

/// The type a math leaf is evaluated as, from its wrapper's data type.
fn leaf_type(name: &str, wrapper: &ElementWrapper) -> Result<ParameterType, MathError> {
    let data_type = wrapper.data_type();
    if data_type.is_numeric() {
        Ok(ParameterType::Real)
    } else if data_type.is_matrix() {
        Ok(ParameterType::Matrix)
    } else if data_type == ParameterType::Object && wrapper.wrapper_type() == WrapperType::Object {
        Ok(ParameterType::Object)
    } else if data_type.is_string_like() {
        Ok(ParameterType::String)
    } else {
        Err(MathError::UnsupportedLeaf {
            name: name.to_string(),
            data_type,
        })
    }
}

fn leaf_wrapper<'w>(name: &str, wrappers: &'w WrapperMap) -> Result<&'w ElementWrapper, MathError> {
    wrappers
        .get(name)
        .and_then(Option::as_ref)
        .ok_or_else(|| MathError::MissingWrapper(name.to_string()))
}

impl MathNode {
    pub(crate) fn binary(op: BinaryOp, left: MathNode, right: MathNode) -> Self {
        MathNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The leaf identifiers in order of first appearance.
    pub fn element_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_element_names(&mut names);
        names
    }

    fn collect_element_names(&self, names: &mut Vec<String>) {
        match self {
            MathNode::Number(_) | MathNode::String(_) => {}
            MathNode::Element(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            MathNode::Negate(node) => node.collect_element_names(names),
            MathNode::Binary { left, right, .. } => {
                left.collect_element_names(names);
                right.collect_element_names(names);
            }
            MathNode::Function { args, .. } => {
                for arg in args {
                    arg.collect_element_names(names);
                }
            }
        }
    }

    /// Rename `old` to `new` in every leaf. Returns true if a leaf changed.
    pub fn rename_elements(&mut self, old: &str, new: &str) -> bool {
        match self {
            MathNode::Number(_) | MathNode::String(_) => false,
            MathNode::Element(name) => {
                let renamed = replace_name(name, old, new);
                let changed = renamed != *name;
                *name = renamed;
                changed
            }
            MathNode::Negate(node) => node.rename_elements(old, new),
            MathNode::Binary { left, right, .. } => {
                let left = left.rename_elements(old, new);
                right.rename_elements(old, new) || left
            }
            MathNode::Function { args, .. } => args
                .iter_mut()
                .fold(false, |changed, arg| arg.rename_elements(old, new) || changed),
        }
    }

    /// The type and size of the result, without evaluating operations.
    pub fn output_info(&self, wrappers: &WrapperMap) -> Result<OutputInfo, MathError> {
        match self {
            MathNode::Number(_) => Ok(OutputInfo::of(ParameterType::Real)),
            MathNode::String(_) => Ok(OutputInfo::of(ParameterType::String)),
            MathNode::Element(name) => {
                let wrapper = leaf_wrapper(name, wrappers)?;
                match leaf_type(name, wrapper)? {
                    ParameterType::Matrix => {
                        let (rows, cols) = wrapper.evaluate_matrix()?.dims();
                        Ok(OutputInfo::matrix(rows, cols))
                    }
                    data_type => Ok(OutputInfo::of(data_type)),
                }
            }
            MathNode::Negate(node) => {
                let info = node.output_info(wrappers)?;
                numeric(info, "-")?;
                Ok(info)
            }
            MathNode::Binary { op, left, right } => {
                let left = numeric(left.output_info(wrappers)?, op.symbol())?;
                let right = numeric(right.output_info(wrappers)?, op.symbol())?;
                binary_info(*op, left, right)
            }
            MathNode::Function { function, args } => {
                let mut infos = Vec::with_capacity(args.len());
                for arg in args {
                    infos.push(numeric(arg.output_info(wrappers)?, function.name())?);
                }
                function_info(*function, &infos)
            }
        }
    }

    /// Evaluate the node, reading leaves through their wrappers.
    pub fn evaluate(&self, wrappers: &WrapperMap) -> Result<MathValue, MathError> {
        match self {
            MathNode::Number(value) => Ok(MathValue::Real(*value)),
            MathNode::String(text) => Ok(MathValue::String(text.clone())),
            MathNode::Element(name) => {
                let wrapper = leaf_wrapper(name, wrappers)?;
                let value = match leaf_type(name, wrapper)? {
                    ParameterType::Real => MathValue::Real(wrapper.evaluate_real()?),
                    ParameterType::Matrix => MathValue::Matrix(wrapper.evaluate_matrix()?),
                    ParameterType::Object => MathValue::Object(wrapper.evaluate_object()?),
                    _ => MathValue::String(wrapper.evaluate_string()?),
                };
                Ok(value)
            }
            MathNode::Negate(node) => match node.evaluate(wrappers)? {
                MathValue::Real(value) => Ok(MathValue::Real(-value)),
                MathValue::Matrix(m) => Ok(MathValue::Matrix(m.map(|x| -x))),
                value => Err(invalid("-", value.data_type())),
            },
            MathNode::Binary { op, left, right } => {
                evaluate_binary(*op, left.evaluate(wrappers)?, right.evaluate(wrappers)?)
            }
            MathNode::Function { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.evaluate(wrappers)?);
                }
                evaluate_function(*function, values)
            }
        }
    }
}

fn numeric(info: OutputInfo, operation: &str) -> Result<OutputInfo, MathError> {
    match info.data_type {
        ParameterType::Real | ParameterType::Matrix => Ok(info),
        data_type => Err(invalid(operation, data_type)),
    }
}

fn binary_info(op: BinaryOp, left: OutputInfo, right: OutputInfo) -> Result<OutputInfo, MathError> {
    let dimension_error = |operation| DimensionError {
        operation,
        left: (left.rows, left.cols),
        right: (right.rows, right.cols),
    };
    match (left.is_matrix(), right.is_matrix()) {
        (false, false) => Ok(OutputInfo::of(ParameterType::Real)),
        (true, true) => match op {
            BinaryOp::Add | BinaryOp::Subtract => {
                if (left.rows, left.cols) != (right.rows, right.cols) {
                    return Err(dimension_error(op.symbol()).into());
                }
                Ok(left)
            }
            BinaryOp::Multiply => {
                if left.cols != right.rows {
                    return Err(dimension_error("multiplication").into());
                }
                Ok(OutputInfo::matrix(left.rows, right.cols))
            }
            BinaryOp::Divide | BinaryOp::Power => Err(invalid(op.symbol(), ParameterType::Matrix)),
        },
        (true, false) => match op {
            BinaryOp::Power => Err(invalid(op.symbol(), ParameterType::Matrix)),
            _ => Ok(left),
        },
        (false, true) => match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => Ok(right),
            BinaryOp::Divide | BinaryOp::Power => Err(invalid(op.symbol(), ParameterType::Matrix)),
        },
    }
}

fn function_info(function: MathFunction, args: &[OutputInfo]) -> Result<OutputInfo, MathError> {
    match function {
        MathFunction::Transpose => Ok(match args[0] {
            info if info.is_matrix() => OutputInfo::matrix(info.cols, info.rows),
            info => info,
        }),
        MathFunction::Norm => Ok(OutputInfo::of(ParameterType::Real)),
        _ => {
            for info in args {
                if info.is_matrix() && (info.rows, info.cols) != (1, 1) {
                    return Err(invalid(function.name(), ParameterType::Matrix));
                }
            }
            Ok(OutputInfo::of(ParameterType::Real))
        }
    }
}

fn evaluate_binary(op: BinaryOp, left: MathValue, right: MathValue) -> Result<MathValue, MathError> {
    let value = match (left, right) {
        (MathValue::Real(a), MathValue::Real(b)) => MathValue::Real(op.apply(a, b)),
        (MathValue::Matrix(a), MathValue::Matrix(b)) => match op {
            BinaryOp::Add | BinaryOp::Subtract => {
                MathValue::Matrix(a.zip_with(&b, op.symbol(), |x, y| op.apply(x, y))?)
            }
            BinaryOp::Multiply => MathValue::Matrix(a.mul(&b)?),
            BinaryOp::Divide | BinaryOp::Power => {
                return Err(invalid(op.symbol(), ParameterType::Matrix))
            }
        },
        (MathValue::Matrix(a), MathValue::Real(b)) => match op {
            BinaryOp::Power => return Err(invalid(op.symbol(), ParameterType::Matrix)),
            _ => MathValue::Matrix(a.map(|x| op.apply(x, b))),
        },
        (MathValue::Real(a), MathValue::Matrix(b)) => match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => {
                MathValue::Matrix(b.map(|x| op.apply(a, x)))
            }
            BinaryOp::Divide | BinaryOp::Power => {
                return Err(invalid(op.symbol(), ParameterType::Matrix))
            }
        },
        (left, right) => {
            let data_type = match left {
                MathValue::Real(_) | MathValue::Matrix(_) => right.data_type(),
                _ => left.data_type(),
            };
            return Err(invalid(op.symbol(), data_type));
        }
    };
    Ok(value)
}

fn evaluate_function(function: MathFunction, args: Vec<MathValue>) -> Result<MathValue, MathError> {
    let mut args = args.into_iter();
    let first = args.next().ok_or(MathError::ArgumentCount {
        function: function.name(),
        expected: function.arity(),
        actual: 0,
    })?;
    let value = match function {
        MathFunction::Transpose => match first {
            MathValue::Matrix(m) => MathValue::Matrix(m.transpose()),
            MathValue::Real(x) => MathValue::Real(x),
            value => return Err(invalid(function.name(), value.data_type())),
        },
        MathFunction::Norm => match first {
            MathValue::Matrix(m) => MathValue::Real(m.norm()),
            MathValue::Real(x) => MathValue::Real(x.abs()),
            value => return Err(invalid(function.name(), value.data_type())),
        },
        MathFunction::Atan2 => {
            let y = first.scalar(function.name())?;
            let x = match args.next() {
                Some(value) => value.scalar(function.name())?,
                None => {
                    return Err(MathError::ArgumentCount {
                        function: function.name(),
                        expected: 2,
                        actual: 1,
                    })
                }
            };
            MathValue::Real(y.atan2(x))
        }
        _ => MathValue::Real(function.apply_scalar(first.scalar(function.name())?)),
    };
    Ok(value)
}

/// A parsed math expression.
#[derive(Debug, Clone)]
pub struct MathTree {
    text: String,
    top: MathNode,
}

impl MathTree {
    /// Parse `text` into a tree.
    pub fn parse(text: &str) -> Result<Self, MathError> {
        Ok(Self {
            text: text.trim().to_string(),
            top: parse_expression(text)?,
        })
    }

    /// The expression text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The root node.
    pub fn top_node(&self) -> &MathNode {
        &self.top
    }

    /// The leaf identifiers that need wrappers.
    pub fn element_names(&self) -> Vec<String> {
        self.top.element_names()
    }

    /// The type and size of the result.
    pub fn output_info(&self, wrappers: &WrapperMap) -> Result<OutputInfo, MathError> {
        self.top.output_info(wrappers)
    }

    /// Evaluate the expression.
    pub fn evaluate(&self, wrappers: &WrapperMap) -> Result<MathValue, MathError> {
        self.top.evaluate(wrappers)
    }

    /// Rename `old` to `new` in the text and leaves. Returns true if anything changed.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) -> bool {
        self.text = replace_name(&self.text, old, new);
        self.top.rename_elements(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mscript_object::Object;

    fn wrappers(objects: Vec<Object>) -> WrapperMap {
        objects
            .into_iter()
            .map(|object| {
                let name = object.name().to_string();
                let wrapper = ElementWrapper::for_object(&name, object.into_ref());
                (name, Some(wrapper))
            })
            .collect()
    }

    #[test]
    fn test_matrix_output_info() {
        let map = wrappers(vec![
            Object::array("A", 2, 3),
            Object::array("B", 3, 1),
            Object::variable("x", 2.0),
        ]);
        let info = |text: &str| MathTree::parse(text).unwrap().output_info(&map);

        assert_eq!(info("A * B").unwrap(), OutputInfo::matrix(2, 1));
        assert_eq!(info("A'").unwrap(), OutputInfo::matrix(3, 2));
        assert_eq!(info("x * A + 1").unwrap(), OutputInfo::matrix(2, 3));
        assert_eq!(info("norm(B)").unwrap(), OutputInfo::of(ParameterType::Real));
        assert!(matches!(
            info("A + B"),
            Err(MathError::DimensionError(_))
        ));
        assert!(matches!(
            info("sin(A)"),
            Err(MathError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_evaluate_matrices() {
        let a = Object::array("A", 2, 2).into_ref();
        a.borrow_mut()
            .assign(
                Rmatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
                    .unwrap()
                    .into(),
            )
            .unwrap();
        let mut map = WrapperMap::new();
        map.insert("A".into(), Some(ElementWrapper::for_object("A", a)));

        let value = MathTree::parse("A' * 2 - A").unwrap().evaluate(&map).unwrap();
        match value {
            MathValue::Matrix(m) => assert_eq!(m.data(), &[1.0, 4.0, 1.0, 4.0]),
            value => panic!("expected a matrix, found {:?}", value),
        }
    }

    #[test]
    fn test_missing_wrapper() {
        let mut map = WrapperMap::new();
        map.insert("x".into(), None);
        let error = MathTree::parse("x + 1").unwrap().evaluate(&map).unwrap_err();
        assert!(matches!(error, MathError::MissingWrapper(ref name) if name == "x"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_string_operand() {
        let map = WrapperMap::new();
        let error = MathTree::parse("'abc' * 2").unwrap().output_info(&map).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The operation \"*\" is not defined for an input of type String"
        );
    }

    #[test]
    fn test_rename() {
        let mut tree = MathTree::parse("sat1.X + A(sat1.Y, 2) * sat10.X").unwrap();
        assert!(tree.rename_ref_object("sat1", "satA"));
        assert_eq!(tree.text(), "satA.X + A(satA.Y, 2) * sat10.X");
        assert_eq!(
            tree.element_names(),
            ["satA.X", "A(satA.Y, 2)", "sat10.X"]
        );
        assert!(!tree.rename_ref_object("ghost", "g"));
    }
}
