//! Row selection using Arrow compute kernels

use std::borrow::Cow;

use arrow::array::{BooleanArray, RecordBatch, Scalar, StringArray};
use arrow::compute;
use arrow_select::filter::filter_record_batch;

use crate::error::QueryError;
use crate::table::TextColumn;
use crate::utils::get_str_column;

/// How a single text column is compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Cell equals the value
    Exact(Cow<'static, str>),
    /// Cell contains the value as a substring
    Contains(Cow<'static, str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub column: TextColumn,
    pub matcher: Matcher,
}

/// Conjunction of field filters; an empty predicate selects every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    filters: Vec<FieldFilter>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column == value`
    pub fn equals(mut self, column: TextColumn, value: impl Into<Cow<'static, str>>) -> Self {
        self.filters.push(FieldFilter {
            column,
            matcher: Matcher::Exact(value.into()),
        });
        self
    }

    /// Require `value` to occur somewhere in `column`
    pub fn contains(mut self, column: TextColumn, value: impl Into<Cow<'static, str>>) -> Self {
        self.filters.push(FieldFilter {
            column,
            matcher: Matcher::Contains(value.into()),
        });
        self
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }
}

/// Build the selection mask for `predicate`.
///
/// Null cells never match.
pub fn create_filter_mask(
    batch: &RecordBatch,
    predicate: &Predicate,
) -> Result<BooleanArray, QueryError> {
    let mut mask = BooleanArray::from(vec![true; batch.num_rows()]);

    for filter in predicate.filters() {
        let values = get_str_column(batch, filter.column.name())?;
        let matched = match &filter.matcher {
            Matcher::Exact(expected) => {
                let scalar = Scalar::new(StringArray::from(vec![expected.as_ref()]));
                compute::kernels::cmp::eq(values, &scalar)?
            }
            Matcher::Contains(needle) => values
                .iter()
                .map(|v| v.map(|s| s.contains(needle.as_ref())))
                .collect(),
        };
        mask = compute::and(&mask, &matched)?;
    }

    Ok(mask)
}

/// Apply `predicate` and return only the qualifying rows
pub fn apply_filter(batch: &RecordBatch, predicate: &Predicate) -> Result<RecordBatch, QueryError> {
    let mask = create_filter_mask(batch, predicate)?;
    Ok(filter_record_batch(batch, &mask)?)
}

/// Number of rows `predicate` selects
#[cfg(test)]
pub fn count_matching_rows(batch: &RecordBatch, predicate: &Predicate) -> Result<usize, QueryError> {
    let mask = create_filter_mask(batch, predicate)?;
    Ok(mask.true_count())
}
