//! # MEP/Binding Classifier
//!
//! Decides which message kinds are legal for a MEP, binding and leg. The
//! decision table is data: [`MepBindingTable::v1`] is the current revision
//! and any change to pull support ships as a new revision rather than an
//! edit of an existing one.
//!
//! ## Revision 1
//!
//! | MEP | Binding | Leg | Legal kinds |
//! |-----|---------|-----|-------------|
//! | one-way | push | 1 only | receipt, error |
//! | one-way | every other binding | - | none |
//! | two-way | push | any | receipt, error |
//! | two-way | pull, sync, push-push, push-pull, pull-push | any | user-message |
//!
//! A pair missing from the table is a [`ClassifierError`], not `false`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifierError;
use crate::mep::{Binding, Mep, MessageKind};

/// Which message kinds a table row admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalKinds {
    /// Structurally illegal combination: nothing is ever accepted.
    Nothing,
    ReceiptOrError,
    UserMessage,
}

impl LegalKinds {
    fn admits(self, kind: MessageKind) -> bool {
        match self {
            LegalKinds::Nothing => false,
            LegalKinds::ReceiptOrError => kind.is_receipt_or_error(),
            LegalKinds::UserMessage => kind.is_user_message(),
        }
    }
}

/// Which legs a table row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegScope {
    FirstOnly,
    Any,
}

/// One row of a decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub mep: Mep,
    pub binding: Binding,
    pub legs: LegScope,
    pub legal: LegalKinds,
}

impl TableRow {
    const fn new(mep: Mep, binding: Binding, legs: LegScope, legal: LegalKinds) -> Self {
        Self {
            mep,
            binding,
            legs,
            legal,
        }
    }
}

const V1_ROWS: [TableRow; 12] = [
    TableRow::new(Mep::OneWay, Binding::Push, LegScope::FirstOnly, LegalKinds::ReceiptOrError),
    TableRow::new(Mep::OneWay, Binding::Pull, LegScope::Any, LegalKinds::Nothing),
    TableRow::new(Mep::OneWay, Binding::Sync, LegScope::Any, LegalKinds::Nothing),
    TableRow::new(Mep::OneWay, Binding::PushPush, LegScope::Any, LegalKinds::Nothing),
    TableRow::new(Mep::OneWay, Binding::PushPull, LegScope::Any, LegalKinds::Nothing),
    TableRow::new(Mep::OneWay, Binding::PullPush, LegScope::Any, LegalKinds::Nothing),
    TableRow::new(Mep::TwoWay, Binding::Push, LegScope::Any, LegalKinds::ReceiptOrError),
    // Pull-based two-way rows are provisional; changes go into a new revision.
    TableRow::new(Mep::TwoWay, Binding::Pull, LegScope::Any, LegalKinds::UserMessage),
    TableRow::new(Mep::TwoWay, Binding::Sync, LegScope::Any, LegalKinds::UserMessage),
    TableRow::new(Mep::TwoWay, Binding::PushPush, LegScope::Any, LegalKinds::UserMessage),
    TableRow::new(Mep::TwoWay, Binding::PushPull, LegScope::Any, LegalKinds::UserMessage),
    TableRow::new(Mep::TwoWay, Binding::PullPush, LegScope::Any, LegalKinds::UserMessage),
];

/// Selector for a built-in table revision, usable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRevision {
    #[default]
    V1,
}

impl TableRevision {
    pub fn table(self) -> MepBindingTable {
        match self {
            TableRevision::V1 => MepBindingTable::v1(),
        }
    }
}

/// A versioned MEP/binding decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MepBindingTable {
    version: u32,
    rows: Vec<TableRow>,
}

impl MepBindingTable {
    /// Revision 1, the currently authoritative table.
    pub fn v1() -> Self {
        Self {
            version: 1,
            rows: V1_ROWS.to_vec(),
        }
    }

    /// Builds a custom revision. Pairs absent from `rows` are undefined.
    pub fn from_rows(version: u32, rows: Vec<TableRow>) -> Self {
        Self { version, rows }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    fn row(&self, mep: Mep, binding: Binding) -> Result<&TableRow, ClassifierError> {
        self.rows
            .iter()
            .find(|r| r.mep == mep && r.binding == binding)
            .ok_or(ClassifierError::UndefinedCombination {
                mep,
                binding,
                table_version: self.version,
            })
    }

    /// Returns true if the pair is defined in this revision.
    pub fn is_defined(&self, mep: Mep, binding: Binding) -> bool {
        self.row(mep, binding).is_ok()
    }

    /// Decides whether `kind` is legal on the given leg.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::UndefinedCombination`] if the pair has no row.
    pub fn is_valid_message_type(
        &self,
        mep: Mep,
        binding: Binding,
        kind: MessageKind,
        is_leg1: bool,
    ) -> Result<bool, ClassifierError> {
        let row = self.row(mep, binding)?;
        let leg_ok = match row.legs {
            LegScope::FirstOnly => is_leg1,
            LegScope::Any => true,
        };
        let legal = leg_ok && row.legal.admits(kind);
        debug!(%mep, %binding, %kind, is_leg1, legal, "classified message kind");
        Ok(legal)
    }

    /// Returns true if at least one message kind is legal on some leg.
    pub fn admits_any(&self, mep: Mep, binding: Binding) -> Result<bool, ClassifierError> {
        let row = self.row(mep, binding)?;
        Ok(row.legal != LegalKinds::Nothing)
    }
}

impl Default for MepBindingTable {
    fn default() -> Self {
        Self::v1()
    }
}

/// Classifies against revision 1 of the table.
pub fn is_valid_message_type(
    mep: Mep,
    binding: Binding,
    kind: MessageKind,
    is_leg1: bool,
) -> Result<bool, ClassifierError> {
    MepBindingTable::v1().is_valid_message_type(mep, binding, kind, is_leg1)
}
