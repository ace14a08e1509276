//! Call-order state machine shared by the statement builders.

use std::fmt;

/// The last clause added to a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    None,
    Select,
    From,
    Join,
    Where,
    OrderBy,
    Offset,
    Limit,
    InsertInto,
    Values,
    OnConflict,
    DoUpdate,
    DoUpdateWhere,
    DoNothing,
}

impl Step {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Step::None => "none",
            Step::Select => "SELECT",
            Step::From => "SELECT FROM",
            Step::Join => "SELECT JOIN",
            Step::Where => "SELECT WHERE",
            Step::OrderBy => "SELECT ORDER BY",
            Step::Offset => "SELECT OFFSET",
            Step::Limit => "SELECT LIMIT",
            Step::InsertInto => "INSERT INTO",
            Step::Values => "INSERT VALUES",
            Step::OnConflict => "INSERT ON CONFLICT",
            Step::DoUpdate => "INSERT ON CONFLICT DO UPDATE",
            Step::DoUpdateWhere => "INSERT ON CONFLICT DO UPDATE WHERE",
            Step::DoNothing => "INSERT ON CONFLICT DO NOTHING",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fluent builder call subject to call-order checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Select,
    From,
    Join,
    Where,
    /// AND / OR continuing a SELECT's WHERE.
    Connect,
    Args,
    OrderBy,
    ThenBy,
    Offset,
    Limit,
    Values,
    OnConflict,
    DoUpdate,
    DoNothing,
    /// WHERE qualifying ON CONFLICT DO UPDATE.
    UpsertWhere,
    /// AND / OR continuing the DO UPDATE's WHERE.
    UpsertConnect,
}

impl Call {
    /// Steps this call may directly follow.
    pub(crate) fn predecessors(self) -> &'static [Step] {
        use Step::*;
        match self {
            Call::Select => &[None, Select],
            Call::From => &[Select, From],
            Call::Join => &[From, Join],
            Call::Where => &[From, Join, Where],
            Call::Connect | Call::Args => &[Where],
            Call::OrderBy => &[From, Join, Where, OrderBy],
            Call::ThenBy => &[OrderBy],
            Call::Offset => &[From, Join, Where, OrderBy, Limit],
            Call::Limit => &[From, Join, Where, OrderBy, Offset],
            Call::Values => &[InsertInto],
            Call::OnConflict => &[Values],
            Call::DoUpdate => &[OnConflict, DoUpdate],
            Call::DoNothing => &[OnConflict],
            Call::UpsertWhere => &[DoUpdate],
            Call::UpsertConnect => &[DoUpdateWhere],
        }
    }

    /// Step recorded once this call succeeds.
    pub(crate) fn successor(self) -> Step {
        match self {
            Call::Select => Step::Select,
            Call::From => Step::From,
            Call::Join => Step::Join,
            Call::Where | Call::Connect | Call::Args => Step::Where,
            Call::OrderBy | Call::ThenBy => Step::OrderBy,
            Call::Offset => Step::Offset,
            Call::Limit => Step::Limit,
            Call::Values => Step::Values,
            Call::OnConflict => Step::OnConflict,
            Call::DoUpdate => Step::DoUpdate,
            Call::DoNothing => Step::DoNothing,
            Call::UpsertWhere | Call::UpsertConnect => Step::DoUpdateWhere,
        }
    }
}

/// Cursor over the builder's call history.
#[derive(Debug, Clone)]
pub(crate) struct CallOrder {
    step: Step,
}

impl CallOrder {
    pub(crate) fn starting_at(step: Step) -> Self {
        Self { step }
    }

    pub(crate) fn current(&self) -> Step {
        self.step
    }

    /// Panics unless `call` may follow the current step.
    pub(crate) fn check(&self, call: Call) {
        let expected = call.predecessors();
        if expected.contains(&self.step) {
            return;
        }
        match expected {
            [single] => panic!("unexpected previous action {}, expected {}", self.step, single),
            _ => {
                let names: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
                panic!(
                    "unexpected previous action {}, expected any of [{}]",
                    self.step,
                    names.join(",")
                )
            }
        }
    }

    /// Record `call` as done. Must follow a successful [`CallOrder::check`].
    pub(crate) fn advance(&mut self, call: Call) {
        self.step = call.successor();
    }
}
