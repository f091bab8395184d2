//! Factor-name to field-name alias tables.
//!
//! An [`AliasTable`] pairs each standardized output field with the source factor it is
//! read from. Queries select exactly the factors in the table, and result columns are
//! renamed through the same table, so a field can never be declared without its factor
//! being requested.

use polars::prelude::{DataFrame, PlSmallStr};
use std::collections::HashSet;

use crate::error::{DataError, Result};

/// One field/factor pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldAlias {
    /// Standardized output field name.
    pub field: &'static str,
    /// Source-taxonomy factor name.
    pub factor: &'static str,
}

/// A static alias table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasTable(&'static [FieldAlias]);

impl AliasTable {
    /// Wraps a static list of aliases.
    #[must_use]
    pub const fn new(entries: &'static [FieldAlias]) -> Self {
        Self(entries)
    }

    /// The aliases, in declaration order.
    #[must_use]
    pub const fn entries(&self) -> &'static [FieldAlias] {
        self.0
    }

    /// Number of aliases.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the table has no aliases.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source factors to request, in declaration order.
    #[must_use]
    pub fn factors(&self) -> Vec<&'static str> {
        self.0.iter().map(|a| a.factor).collect()
    }

    /// Output fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|a| a.field).collect()
    }

    /// Field name for a source factor.
    #[must_use]
    pub fn field_for(&self, factor: &str) -> Option<&'static str> {
        self.0.iter().find(|a| a.factor == factor).map(|a| a.field)
    }

    /// Source factor for a field name.
    #[must_use]
    pub fn factor_for(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|a| a.field == field).map(|a| a.factor)
    }

    /// Returns true when no field and no factor appears twice.
    #[must_use]
    pub fn is_bijective(&self) -> bool {
        let fields: HashSet<_> = self.0.iter().map(|a| a.field).collect();
        let factors: HashSet<_> = self.0.iter().map(|a| a.factor).collect();
        fields.len() == self.0.len() && factors.len() == self.0.len()
    }

    /// Renames factor columns present in `frame` to their field names.
    pub fn to_fields(&self, frame: &mut DataFrame) -> Result<()> {
        self.rename(frame, |a| (a.factor, a.field))
    }

    /// Renames field columns present in `frame` back to their factor names.
    pub fn to_factors(&self, frame: &mut DataFrame) -> Result<()> {
        self.rename(frame, |a| (a.field, a.factor))
    }

    fn rename(
        &self,
        frame: &mut DataFrame,
        direction: impl Fn(&FieldAlias) -> (&'static str, &'static str),
    ) -> Result<()> {
        if !self.is_bijective() {
            return Err(DataError::Other(
                "alias table maps a name more than once".into(),
            ));
        }
        // one pass over the current names
        let names: Vec<PlSmallStr> = frame
            .get_column_names()
            .into_iter()
            .map(|name| {
                self.0
                    .iter()
                    .map(&direction)
                    .find(|(from, _)| *from == name.as_str())
                    .map_or_else(|| name.clone(), |(_, to)| PlSmallStr::from(to))
            })
            .collect();
        frame.set_column_names(names)?;
        Ok(())
    }
}
