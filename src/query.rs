//! Question dispatch - ties together the rule list and the sales table

use std::sync::Arc;

use tracing::{debug, error};

use crate::answer::{Answer, QueryResponse};
use crate::error::QueryError;
use crate::rules::{default_rules, Rule};
use crate::table::SalesTable;

/// Answers questions against a shared, read-only table.
///
/// Cheap to share across request handlers; it holds no per-request state.
#[derive(Debug, Clone)]
pub struct QueryDispatcher {
    table: Arc<SalesTable>,
    rules: Arc<[Rule]>,
}

impl QueryDispatcher {
    /// Dispatcher over `table` with the built-in question set
    pub fn new(table: Arc<SalesTable>) -> Self {
        Self::with_rules(table, default_rules())
    }

    pub fn with_rules(table: Arc<SalesTable>, rules: Vec<Rule>) -> Self {
        Self {
            table,
            rules: rules.into(),
        }
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Index of the first rule whose trigger matches `question`
    pub fn matching_rule(&self, question: &str) -> Option<usize> {
        let question = question.to_lowercase();
        self.rules.iter().position(|rule| rule.trigger.matches(&question))
    }

    /// Answer `question`, surfacing failures instead of masking them
    pub fn try_answer(&self, question: &str) -> Result<Answer, QueryError> {
        let question = question.to_lowercase();
        let Some((idx, rule)) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.trigger.matches(&question))
        else {
            return Ok(Answer::not_recognized());
        };

        debug!(rule = idx + 1, kind = rule.name, "question matched");
        rule.aggregation.evaluate(&self.table)
    }

    /// Answer `question`; any failure becomes the fixed internal-error answer
    pub fn answer(&self, question: &str) -> Answer {
        match self.try_answer(question) {
            Ok(answer) => answer,
            Err(e) => {
                error!("failed to answer {:?}: {}", question, e);
                Answer::internal_error()
            }
        }
    }

    /// [`QueryDispatcher::answer`] wrapped in the response envelope
    pub fn respond(&self, question: &str) -> QueryResponse {
        self.answer(question).into()
    }
}
