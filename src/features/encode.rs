use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Categories, Column, DataFrame, DataType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{SalesPrepError, SalesPrepResult, polars_to_sales_prep_error},
    schema::SalesCol,
};

/// Code given to a missing family or to one absent from a supplied mapping.
pub const UNKNOWN_CODE: i32 = -1;

/// Mapping from product family to its integer code.
///
/// Codes derived with [`CategoryCodes::from_values`] follow the lexical order
/// of the distinct families, starting at 0. They are only comparable between
/// runs that see the same family set; persist the mapping and pass it back in
/// to keep codes stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCodes(BTreeMap<String, i32>);

impl CategoryCodes {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct = values.into_iter().collect::<BTreeSet<_>>();
        Self(
            distinct
                .into_iter()
                .zip(0..)
                .map(|(v, code)| (v.to_string(), code))
                .collect(),
        )
    }

    pub fn code(&self, value: &str) -> Option<i32> {
        self.0.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Replaces `family` with its integer code and retags `store_nbr` as categorical.
///
/// When `codes` is `None` the mapping is derived from the families present in
/// `df`. The mapping actually used is returned alongside the table.
pub fn encode_categoricals(
    mut df: DataFrame,
    codes: Option<&CategoryCodes>,
) -> SalesPrepResult<(DataFrame, CategoryCodes)> {
    let family = SalesCol::Family;
    let families = df
        .column(family.as_str())
        .and_then(|c| c.cast(&DataType::String))
        .map_err(convert_err)?;
    let families = families.str().map_err(convert_err)?;

    let codes = match codes {
        Some(codes) => codes.clone(),
        None => CategoryCodes::from_values(families.iter().flatten()),
    };

    let mut unknown = 0usize;
    let encoded = families
        .iter()
        .map(|v| match v.and_then(|s| codes.code(s)) {
            Some(code) => code,
            None => {
                unknown += usize::from(v.is_some());
                UNKNOWN_CODE
            }
        })
        .collect::<Vec<i32>>();

    if unknown > 0 {
        warn!(
            rows = unknown,
            "Families missing from the supplied mapping encoded as {UNKNOWN_CODE}"
        );
    }

    // Categoricals are built from text, so the numbers pass through their string form.
    let store_label = df
        .column(SalesCol::StoreNbr.as_str())
        .and_then(|c| c.cast(&DataType::String))
        .and_then(|c| c.cast(&store_dtype()))
        .map_err(convert_err)?;

    df.with_column(Column::new(family.name(), encoded))
        .and_then(|df| df.with_column(store_label))
        .map_err(convert_err)?;

    info!(families = codes.len(), "Encoded categorical columns");
    Ok((df, codes))
}

/// Type annotation given to `store_nbr`: a categorical label over the global categories.
pub fn store_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

fn convert_err(e: polars::error::PolarsError) -> SalesPrepError {
    polars_to_sales_prep_error("encoding categoricals", e)
}
