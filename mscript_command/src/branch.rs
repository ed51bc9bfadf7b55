use std::fmt;

use crate::{Command, CommandError, Condition, ConditionChain};

/// The kind of a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    /// Run the branch once if the conditions hold, otherwise the else branch.
    If,
    /// Run the branch repeatedly while the conditions hold.
    While,
}

impl BranchKind {
    /// The script keyword.
    pub fn name(self) -> &'static str {
        match self {
            BranchKind::If => "If",
            BranchKind::While => "While",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An `If` or `While` command with its conditions and child commands.
#[derive(Debug, Clone)]
pub struct ConditionalBranch {
    kind: BranchKind,
    conditions: ConditionChain,
    commands: Vec<Command>,
    else_commands: Vec<Command>,
}

impl ConditionalBranch {
    /// Create a branch with no conditions.
    pub fn new(kind: BranchKind) -> Self {
        Self {
            kind,
            conditions: ConditionChain::default(),
            commands: Vec::new(),
            else_commands: Vec::new(),
        }
    }

    /// Create a branch from a well-formed chain.
    pub fn with_conditions(kind: BranchKind, conditions: ConditionChain) -> Self {
        Self {
            conditions,
            ..Self::new(kind)
        }
    }

    /// The kind of branch.
    pub fn kind(&self) -> BranchKind {
        self.kind
    }

    /// The conditions.
    pub fn conditions(&self) -> &ConditionChain {
        &self.conditions
    }

    /// The conditions, mutably.
    pub fn conditions_mut(&mut self) -> &mut ConditionChain {
        &mut self.conditions
    }

    /// See [ConditionChain::set_condition].
    pub fn set_condition(
        &mut self,
        lhs: &str,
        operator: &str,
        rhs: &str,
        index: Option<usize>,
    ) -> Result<(), CommandError> {
        self.conditions.set_condition(lhs, operator, rhs, index)
    }

    /// See [ConditionChain::set_condition_operator].
    pub fn set_condition_operator(
        &mut self,
        operator: &str,
        index: Option<usize>,
    ) -> Result<(), CommandError> {
        self.conditions.set_condition_operator(operator, index)
    }

    /// See [ConditionChain::remove_condition].
    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, CommandError> {
        self.conditions.remove_condition(index)
    }

    /// See [ConditionChain::remove_condition_operator].
    pub fn remove_condition_operator(&mut self, index: usize) -> Result<(), CommandError> {
        self.conditions.remove_condition_operator(index).map(|_| ())
    }

    /// See [ConditionChain::evaluate_all_conditions].
    pub fn evaluate_all_conditions(&self) -> Result<bool, CommandError> {
        self.conditions.evaluate_all_conditions()
    }

    /// Append a command to the branch body.
    pub fn add_command(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    /// Append a command to the else branch. Only `If` has an else branch.
    pub fn add_else_command(&mut self, command: impl Into<Command>) -> Result<(), CommandError> {
        if self.kind == BranchKind::While {
            return Err(CommandError::ElseInLoop);
        }
        self.else_commands.push(command.into());
        Ok(())
    }

    /// The branch body.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The else branch.
    pub fn else_commands(&self) -> &[Command] {
        &self.else_commands
    }

    /// Every child command, body first, mutably.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.commands.iter_mut().chain(self.else_commands.iter_mut())
    }

    pub(crate) fn branches_mut(&mut self) -> (&mut Vec<Command>, &mut Vec<Command>) {
        (&mut self.commands, &mut self.else_commands)
    }

    /// `If a < b & c > d`.
    pub fn generating_string(&self) -> String {
        format!("{} {}", self.kind, self.conditions)
    }
}
