use std::{fmt, str::FromStr};

use mscript_object::replace_name;
use mscript_wrapper::{ElementAccess, ElementWrapper};

use crate::CommandError;

/// A comparison between the two sides of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RelationalOperator {
    EqualTo,
    NotEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
}

impl RelationalOperator {
    /// Every operator, in the order they are listed in error messages.
    pub const ALL: [RelationalOperator; 6] = [
        RelationalOperator::EqualTo,
        RelationalOperator::NotEqual,
        RelationalOperator::LessThan,
        RelationalOperator::GreaterThan,
        RelationalOperator::LessOrEqual,
        RelationalOperator::GreaterOrEqual,
    ];

    /// The script symbol for the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOperator::EqualTo => "==",
            RelationalOperator::NotEqual => "~=",
            RelationalOperator::LessThan => "<",
            RelationalOperator::GreaterThan => ">",
            RelationalOperator::LessOrEqual => "<=",
            RelationalOperator::GreaterOrEqual => ">=",
        }
    }

    /// Compare two reals. There is no tolerance on equality.
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            RelationalOperator::EqualTo => lhs == rhs,
            RelationalOperator::NotEqual => lhs != rhs,
            RelationalOperator::LessThan => lhs < rhs,
            RelationalOperator::GreaterThan => lhs > rhs,
            RelationalOperator::LessOrEqual => lhs <= rhs,
            RelationalOperator::GreaterOrEqual => lhs >= rhs,
        }
    }
}

impl FromStr for RelationalOperator {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| CommandError::InvalidRelationalOperator(s.to_string()))
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The operator joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Every operator, in the order they are listed in error messages.
    pub const ALL: [LogicalOperator; 2] = [LogicalOperator::And, LogicalOperator::Or];

    /// The script symbol for the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOperator::And => "&",
            LogicalOperator::Or => "|",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| CommandError::InvalidLogicalOperator(s.to_string()))
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single `lhs op rhs` comparison, with the wrappers for its operands once validated.
#[derive(Debug, Clone)]
pub struct Condition {
    lhs: String,
    operator: RelationalOperator,
    rhs: String,
    lhs_wrapper: Option<ElementWrapper>,
    rhs_wrapper: Option<ElementWrapper>,
}

impl Condition {
    /// Create an unbound condition.
    pub fn new(lhs: &str, operator: RelationalOperator, rhs: &str) -> Self {
        Self {
            lhs: lhs.trim().to_string(),
            operator,
            rhs: rhs.trim().to_string(),
            lhs_wrapper: None,
            rhs_wrapper: None,
        }
    }

    /// The left operand text.
    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    /// The comparison.
    pub fn operator(&self) -> RelationalOperator {
        self.operator
    }

    /// The right operand text.
    pub fn rhs(&self) -> &str {
        &self.rhs
    }

    /// The left operand wrapper.
    pub fn lhs_wrapper(&self) -> Option<&ElementWrapper> {
        self.lhs_wrapper.as_ref()
    }

    /// The right operand wrapper.
    pub fn rhs_wrapper(&self) -> Option<&ElementWrapper> {
        self.rhs_wrapper.as_ref()
    }

    /// Install `wrapper` on each side whose text is `name`.
    ///
    /// Returns true if either side matched.
    pub fn set_element_wrapper(&mut self, name: &str, wrapper: &ElementWrapper) -> bool {
        let mut matched = false;
        if self.lhs == name {
            self.lhs_wrapper = Some(wrapper.clone());
            matched = true;
        }
        if self.rhs == name {
            self.rhs_wrapper = Some(wrapper.clone());
            matched = true;
        }
        matched
    }

    /// Evaluate both sides as reals and compare them.
    pub fn evaluate(&self) -> Result<bool, CommandError> {
        let lhs = Self::operand(&self.lhs, self.lhs_wrapper.as_ref())?;
        let rhs = Self::operand(&self.rhs, self.rhs_wrapper.as_ref())?;
        Ok(self.operator.apply(lhs, rhs))
    }

    fn operand(name: &str, wrapper: Option<&ElementWrapper>) -> Result<f64, CommandError> {
        let wrapper = wrapper.ok_or_else(|| CommandError::MissingWrapper {
            command: "ConditionalBranch",
            name: name.to_string(),
        })?;
        Ok(wrapper.evaluate_real()?)
    }

    fn rename_ref_object(&mut self, old: &str, new: &str) {
        self.lhs = replace_name(&self.lhs, old, new);
        self.rhs = replace_name(&self.rhs, old, new);
        for wrapper in [&mut self.lhs_wrapper, &mut self.rhs_wrapper]
            .into_iter()
            .flatten()
        {
            wrapper.rename_object(old, new);
        }
    }

    fn clear_wrappers(&mut self) {
        self.lhs_wrapper = None;
        self.rhs_wrapper = None;
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operator, self.rhs)
    }
}

/// An ordered list of conditions joined by `&` and `|`.
///
/// A well-formed chain has exactly one logical operator between each pair of conditions.
/// Chains built with [new](Self::new), [and](Self::and) and [or](Self::or) are always
/// well-formed. The index-based editing operations mirror how a script parser fills in a
/// branch piece by piece, and can leave the chain unbalanced in between; evaluating an
/// unbalanced chain fails.
///
/// `&` binds tighter than `|`, and there are no parentheses.
#[derive(Debug, Clone, Default)]
pub struct ConditionChain {
    conditions: Vec<Condition>,
    operators: Vec<LogicalOperator>,
}

impl ConditionChain {
    /// A chain with a single condition.
    pub fn new(first: Condition) -> Self {
        Self {
            conditions: vec![first],
            operators: Vec::new(),
        }
    }

    /// Append `condition` joined with `&`.
    pub fn and(self, condition: Condition) -> Self {
        self.join(LogicalOperator::And, condition)
    }

    /// Append `condition` joined with `|`.
    pub fn or(self, condition: Condition) -> Self {
        self.join(LogicalOperator::Or, condition)
    }

    fn join(mut self, operator: LogicalOperator, condition: Condition) -> Self {
        self.operators.push(operator);
        self.conditions.push(condition);
        self
    }

    /// The conditions in order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The logical operators in order.
    pub fn operators(&self) -> &[LogicalOperator] {
        &self.operators
    }

    /// The number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Return true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Set the condition at `index`, or append it if `index` is `None` or one past the end.
    ///
    /// Replacing a condition drops its wrappers.
    pub fn set_condition(
        &mut self,
        lhs: &str,
        operator: &str,
        rhs: &str,
        index: Option<usize>,
    ) -> Result<(), CommandError> {
        let condition = Condition::new(lhs, operator.parse()?, rhs);
        let count = self.conditions.len();
        match index {
            None => self.conditions.push(condition),
            Some(index) if index == count => self.conditions.push(condition),
            Some(index) if index < count => self.conditions[index] = condition,
            Some(index) => return Err(CommandError::ConditionIndex { index, count }),
        }
        Ok(())
    }

    /// Set the logical operator at `index`, or append it if `index` is `None` or one past the
    /// end.
    pub fn set_condition_operator(
        &mut self,
        operator: &str,
        index: Option<usize>,
    ) -> Result<(), CommandError> {
        let operator = operator.parse()?;
        let count = self.operators.len();
        match index {
            None => self.operators.push(operator),
            Some(index) if index == count => self.operators.push(operator),
            Some(index) if index < count => self.operators[index] = operator,
            Some(index) => return Err(CommandError::ConditionIndex { index, count }),
        }
        Ok(())
    }

    /// Remove the condition at `index` along with its wrappers.
    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, CommandError> {
        if index >= self.conditions.len() {
            return Err(CommandError::ConditionIndex {
                index,
                count: self.conditions.len(),
            });
        }
        Ok(self.conditions.remove(index))
    }

    /// Remove the logical operator at `index`.
    pub fn remove_condition_operator(
        &mut self,
        index: usize,
    ) -> Result<LogicalOperator, CommandError> {
        if index >= self.operators.len() {
            return Err(CommandError::ConditionIndex {
                index,
                count: self.operators.len(),
            });
        }
        Ok(self.operators.remove(index))
    }

    /// Evaluate the whole chain.
    ///
    /// Every condition is evaluated, then runs of conditions joined by `&` are combined and
    /// the runs are joined by `|`. An unbalanced chain or a missing wrapper is an error rather
    /// than a false result.
    pub fn evaluate_all_conditions(&self) -> Result<bool, CommandError> {
        if self.conditions.is_empty() || self.operators.len() != self.conditions.len() - 1 {
            return Err(CommandError::LogicalOperatorCount {
                conditions: self.conditions.len(),
                operators: self.operators.len(),
            });
        }

        let results = self
            .conditions
            .iter()
            .map(Condition::evaluate)
            .collect::<Result<Vec<bool>, CommandError>>()?;

        let mut any = false;
        let mut run = results[0];
        for (operator, &result) in self.operators.iter().zip(&results[1..]) {
            match operator {
                LogicalOperator::And => run &= result,
                LogicalOperator::Or => {
                    any |= run;
                    run = result;
                }
            }
        }
        Ok(any || run)
    }

    /// The operand names that need wrappers, in order and without duplicates.
    pub fn wrapper_object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for condition in &self.conditions {
            for name in [&condition.lhs, &condition.rhs] {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Install `wrapper` on every operand named `name`.
    ///
    /// Returns false if no operand has that name.
    pub fn set_element_wrapper(&mut self, name: &str, wrapper: &ElementWrapper) -> bool {
        let mut matched = false;
        for condition in &mut self.conditions {
            matched |= condition.set_element_wrapper(name, wrapper);
        }
        matched
    }

    /// Drop every operand wrapper.
    pub fn clear_wrappers(&mut self) {
        self.conditions.iter_mut().for_each(Condition::clear_wrappers);
    }

    /// Rename `old` to `new` in every operand.
    pub fn rename_ref_object(&mut self, old: &str, new: &str) {
        for condition in &mut self.conditions {
            condition.rename_ref_object(old, new);
        }
    }

    /// The wrappers installed on the operands.
    pub fn wrappers(&self) -> impl Iterator<Item = &ElementWrapper> {
        self.conditions
            .iter()
            .flat_map(|c| c.lhs_wrapper.iter().chain(c.rhs_wrapper.iter()))
    }
}

impl fmt::Display for ConditionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                match self.operators.get(i - 1) {
                    Some(operator) => write!(f, " {} ", operator)?,
                    None => write!(f, " ? ")?,
                }
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, value: bool) -> Condition {
        let mut condition = Condition::new(name, RelationalOperator::EqualTo, "1");
        let lhs = ElementWrapper::number(name, if value { 1.0 } else { 0.0 });
        condition.set_element_wrapper(name, &lhs);
        condition.set_element_wrapper("1", &ElementWrapper::number("1", 1.0));
        condition
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        for bits in 0..16 {
            let c: Vec<bool> = (0..4).map(|i| bits & (1 << i) != 0).collect();
            let chain = ConditionChain::new(flag("c1", c[0]))
                .and(flag("c2", c[1]))
                .or(flag("c3", c[2]))
                .and(flag("c4", c[3]));
            assert_eq!(
                chain.evaluate_all_conditions().unwrap(),
                (c[0] && c[1]) || (c[2] && c[3]),
                "{:?}",
                c
            );
        }
    }

    #[test]
    fn test_or_then_and() {
        let chain = ConditionChain::new(flag("a", true))
            .or(flag("b", false))
            .and(flag("c", false));
        assert!(chain.evaluate_all_conditions().unwrap());
    }

    #[test]
    fn test_operator_count_is_checked() {
        let mut chain = ConditionChain::default();
        assert!(matches!(
            chain.evaluate_all_conditions(),
            Err(CommandError::LogicalOperatorCount { conditions: 0, .. })
        ));

        chain.set_condition("x", "<", "3", None).unwrap();
        chain.set_condition("y", ">", "4", None).unwrap();
        chain.set_element_wrapper("x", &ElementWrapper::number("x", 1.0));
        chain.set_element_wrapper("3", &ElementWrapper::number("3", 3.0));
        chain.set_element_wrapper("y", &ElementWrapper::number("y", 5.0));
        chain.set_element_wrapper("4", &ElementWrapper::number("4", 4.0));
        let error = chain.evaluate_all_conditions().unwrap_err();
        assert!(matches!(
            error,
            CommandError::LogicalOperatorCount {
                conditions: 2,
                operators: 0
            }
        ));
        assert!(error.is_fatal());

        chain.set_condition_operator("&", None).unwrap();
        assert!(chain.evaluate_all_conditions().unwrap());
        chain.set_condition_operator("|", None).unwrap();
        assert!(chain.evaluate_all_conditions().is_err());
    }

    #[test]
    fn test_missing_wrapper_is_fatal() {
        let chain = ConditionChain::new(Condition::new("x", RelationalOperator::LessThan, "3"));
        let error = chain.evaluate_all_conditions().unwrap_err();
        assert!(matches!(error, CommandError::MissingWrapper { .. }));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_invalid_operators() {
        let mut chain = ConditionChain::default();
        let error = chain.set_condition("x", "=<", "3", None).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The relational operator \"=<\" is not valid. The valid operators are: \
             == ~= < > <= >="
        );
        let error = chain.set_condition_operator("&&", None).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The logical operator \"&&\" is not valid. The valid operators are: & |"
        );
        assert!(chain.is_empty());
    }

    #[test]
    fn test_indexed_editing() {
        let mut chain = ConditionChain::default();
        chain.set_condition("a", "==", "1", None).unwrap();
        chain.set_condition("b", "==", "2", Some(1)).unwrap();
        chain.set_condition("c", "==", "3", None).unwrap();
        chain.set_condition_operator("&", None).unwrap();
        chain.set_condition_operator("|", None).unwrap();
        assert!(matches!(
            chain.set_condition("d", "==", "4", Some(5)),
            Err(CommandError::ConditionIndex { index: 5, count: 3 })
        ));
        chain.set_condition("bb", "~=", "2", Some(1)).unwrap();
        assert_eq!(chain.to_string(), "a == 1 & bb ~= 2 | c == 3");

        let removed = chain.remove_condition(1).unwrap();
        assert_eq!(removed.lhs(), "bb");
        chain.remove_condition_operator(0).unwrap();
        assert_eq!(chain.to_string(), "a == 1 | c == 3");
        assert!(chain.remove_condition(2).is_err());
        assert!(chain.remove_condition_operator(1).is_err());
    }

    #[test]
    fn test_shared_wrappers() {
        let mut chain = ConditionChain::new(Condition::new("x", RelationalOperator::LessThan, "y"))
            .and(Condition::new("y", RelationalOperator::GreaterThan, "x"));
        assert_eq!(chain.wrapper_object_names(), ["x", "y"]);
        assert!(chain.set_element_wrapper("x", &ElementWrapper::number("x", 1.0)));
        assert!(chain.set_element_wrapper("y", &ElementWrapper::number("y", 2.0)));
        assert!(!chain.set_element_wrapper("z", &ElementWrapper::number("z", 2.0)));
        assert_eq!(chain.wrappers().count(), 4);
        assert!(chain.evaluate_all_conditions().unwrap());

        chain.remove_condition(0).unwrap();
        assert_eq!(chain.wrappers().count(), 2);
        chain.clear_wrappers();
        assert_eq!(chain.wrappers().count(), 0);
    }
}
