//! The four aggregation shapes the question set needs
//!
//! Every function filters the table with a [`Predicate`] and folds the `sales`
//! column (or one text column) of the surviving rows. Null and NaN `sales`
//! cells count as missing and are skipped by the numeric folds.

use std::collections::HashSet;

use arrow::array::{Array, Float64Array};

use crate::error::QueryError;
use crate::filter::{apply_filter, Predicate};
use crate::table::{SalesTable, TextColumn, DATE, SALES};
use crate::utils::{get_f64_column, get_str_column};

/// Sales values that are present: neither null nor NaN
fn present_sales(sales: &Float64Array) -> impl Iterator<Item = f64> + '_ {
    sales.iter().flatten().filter(|v| !v.is_nan())
}

/// Sum of `sales` over matching rows; 0 when nothing matches
pub fn sum_sales(table: &SalesTable, predicate: &Predicate) -> Result<f64, QueryError> {
    let filtered = apply_filter(table.batch(), predicate)?;
    let sales = get_f64_column(&filtered, SALES)?;
    Ok(present_sales(&sales).sum())
}

/// Mean of `sales` over matching rows.
///
/// Returns `f64::NAN` when no row with a sales value matches; callers decide how
/// to present that.
pub fn mean_sales(table: &SalesTable, predicate: &Predicate) -> Result<f64, QueryError> {
    let filtered = apply_filter(table.batch(), predicate)?;
    let sales = get_f64_column(&filtered, SALES)?;
    let (total, count) = present_sales(&sales).fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        return Ok(f64::NAN);
    }
    Ok(total / count as f64)
}

/// Number of distinct non-null values of `column` among matching rows
pub fn count_distinct(
    table: &SalesTable,
    column: TextColumn,
    predicate: &Predicate,
) -> Result<usize, QueryError> {
    let filtered = apply_filter(table.batch(), predicate)?;
    let values = get_str_column(&filtered, column.name())?;
    let distinct: HashSet<&str> = values.iter().flatten().collect();
    Ok(distinct.len())
}

/// Outcome of a top-sale lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopSale {
    /// No row matched
    NoRows,
    /// Date of the best row; `None` when that row has no date
    Found(Option<String>),
}

/// Date of the matching row with the largest `sales`.
///
/// Equal sales keep the earliest row, and rows without a sales value (null or
/// NaN) rank after all others, which is the head of a stable descending sort.
pub fn argmax_date(table: &SalesTable, predicate: &Predicate) -> Result<TopSale, QueryError> {
    let filtered = apply_filter(table.batch(), predicate)?;
    if filtered.num_rows() == 0 {
        return Ok(TopSale::NoRows);
    }

    let sales = get_f64_column(&filtered, SALES)?;
    let dates = get_str_column(&filtered, DATE)?;

    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in sales.iter().enumerate() {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            continue;
        };
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }

    let idx = best.map(|(idx, _)| idx).unwrap_or(0);
    let date = dates.is_valid(idx).then(|| dates.value(idx).to_string());
    Ok(TopSale::Found(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SalesRecord;

    fn table() -> SalesTable {
        SalesTable::from_records(vec![
            SalesRecord::new("salad", "east erichburgh", "alabama", "patricia gleason iii", 50.0, "2024-01-01"),
            SalesRecord::new("salad", "east erichburgh", "alabama", "rodney lebsack", 30.0, "2024-01-02"),
            SalesRecord::new("shirt", "carterview", "idaho", "rodney lebsack", 75.0, "2024-02-10"),
            SalesRecord::new("shirt", "carterview", "idaho", "rodney lebsack", 75.0, "2024-02-11"),
            SalesRecord::new("shirt", "boise", "idaho", "willie effertz", 10.5, "2024-03-03"),
            SalesRecord {
                sales: None,
                ..SalesRecord::new("shirt", "boise", "idaho", "willie effertz", 0.0, "2024-03-04")
            },
        ])
        .unwrap()
    }

    fn salad_in_east_erichburgh() -> Predicate {
        Predicate::new()
            .equals(TextColumn::Product, "salad")
            .equals(TextColumn::City, "east erichburgh")
    }

    #[test]
    fn test_sum_sales() {
        let table = table();
        assert_eq!(sum_sales(&table, &salad_in_east_erichburgh()).unwrap(), 80.0);

        let none = Predicate::new().equals(TextColumn::Product, "tuna");
        assert_eq!(sum_sales(&table, &none).unwrap(), 0.0);
    }

    #[test]
    fn test_mean_sales_skips_nulls() {
        let table = table();
        let predicate = Predicate::new()
            .equals(TextColumn::Product, "shirt")
            .equals(TextColumn::Region, "idaho");
        let mean = mean_sales(&table, &predicate).unwrap();
        assert!((mean - 53.5).abs() < 1e-9);
    }

    #[test]
    fn test_nan_sales_are_skipped() {
        let table = SalesTable::from_records(vec![
            SalesRecord::new("salad", "east erichburgh", "alabama", "a", 50.0, "2024-01-01"),
            SalesRecord::new("salad", "east erichburgh", "alabama", "b", f64::NAN, "2024-01-02"),
        ])
        .unwrap();
        let predicate = salad_in_east_erichburgh();

        assert_eq!(sum_sales(&table, &predicate).unwrap(), 50.0);
        assert_eq!(mean_sales(&table, &predicate).unwrap(), 50.0);
        assert_eq!(
            argmax_date(&table, &predicate).unwrap(),
            TopSale::Found(Some("2024-01-01".to_string()))
        );

        let only_nan = Predicate::new().equals(TextColumn::Rep, "b");
        assert_eq!(sum_sales(&table, &only_nan).unwrap(), 0.0);
        assert!(mean_sales(&table, &only_nan).unwrap().is_nan());
    }

    #[test]
    fn test_mean_sales_without_rows_is_nan() {
        let predicate = Predicate::new().equals(TextColumn::Product, "tuna");
        assert!(mean_sales(&table(), &predicate).unwrap().is_nan());
        assert!(mean_sales(&SalesTable::empty(), &predicate).unwrap().is_nan());
    }

    #[test]
    fn test_count_distinct() {
        let table = table();
        let idaho = Predicate::new().equals(TextColumn::Region, "idaho");
        assert_eq!(count_distinct(&table, TextColumn::Rep, &idaho).unwrap(), 2);

        let alabama = Predicate::new().equals(TextColumn::Region, "alabama");
        assert_eq!(count_distinct(&table, TextColumn::Rep, &alabama).unwrap(), 2);

        let hawaii = Predicate::new().equals(TextColumn::Region, "hawaii");
        assert_eq!(count_distinct(&table, TextColumn::Rep, &hawaii).unwrap(), 0);
    }

    #[test]
    fn test_argmax_date_ties_keep_first_row() {
        let predicate = Predicate::new()
            .equals(TextColumn::Rep, "rodney lebsack")
            .equals(TextColumn::City, "carterview");
        assert_eq!(
            argmax_date(&table(), &predicate).unwrap(),
            TopSale::Found(Some("2024-02-10".to_string()))
        );
    }

    #[test]
    fn test_argmax_date_ranks_null_sales_last() {
        let predicate = Predicate::new()
            .equals(TextColumn::Rep, "willie effertz")
            .equals(TextColumn::City, "boise");
        assert_eq!(
            argmax_date(&table(), &predicate).unwrap(),
            TopSale::Found(Some("2024-03-03".to_string()))
        );
    }

    #[test]
    fn test_argmax_date_without_rows() {
        let predicate = Predicate::new()
            .contains(TextColumn::Rep, "ivan cruickshank")
            .equals(TextColumn::City, "coral gables");
        assert_eq!(argmax_date(&table(), &predicate).unwrap(), TopSale::NoRows);
    }

    #[test]
    fn test_missing_sales_column_is_an_error() {
        let batch = table().batch().project(&[0, 1, 2, 3]).unwrap();
        let table = SalesTable::from_batch(batch).unwrap();
        assert!(matches!(
            sum_sales(&table, &salad_in_east_erichburgh()),
            Err(QueryError::MissingColumn(name)) if name == SALES
        ));
    }
}
