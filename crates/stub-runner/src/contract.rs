//! Contract format and request matching.
//!
//! Each contract file under `{artifact}/{version}/{id}.json` records one
//! interaction: the request it answers and the response body to replay.
//!
//! ```json
//! {
//!   "id": "should_grant_a_beer_when_old_enough",
//!   "description": "adults get a beer",
//!   "request": { "method": "/beer.BeerService/check", "body": { "age": { "gte": 20 } } },
//!   "response": { "body": { "status": "OK" } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StubError;

/// Raw on-disk shape of a contract.
#[derive(Debug, Clone, Deserialize)]
struct RawContract {
    id: String,
    #[serde(default)]
    description: String,
    request: RawRequest,
    response: ContractResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRequest {
    method: String,
    #[serde(default)]
    body: BTreeMap<String, RawMatcher>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawMatcher {
    Predicate(RawPredicate),
    Exact(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPredicate {
    equal_to: Option<Value>,
    gt: Option<f64>,
    gte: Option<f64>,
    lt: Option<f64>,
    lte: Option<f64>,
    matches: Option<String>,
}

/// Response replayed when a contract matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractResponse {
    /// Message body in JSON form. An empty object replays the default message.
    #[serde(default)]
    pub body: Value,
}

/// A single condition on one request field.
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(Value),
    Predicate {
        equal_to: Option<Value>,
        gt: Option<f64>,
        gte: Option<f64>,
        lt: Option<f64>,
        lte: Option<f64>,
        matches: Option<Regex>,
    },
}

impl Matcher {
    pub fn is_match(&self, actual: Option<&Value>) -> bool {
        match self {
            Matcher::Exact(expected) => actual == Some(expected),
            Matcher::Predicate {
                equal_to,
                gt,
                gte,
                lt,
                lte,
                matches,
            } => {
                if let Some(expected) = equal_to {
                    if actual != Some(expected) {
                        return false;
                    }
                }

                let number = actual.and_then(Value::as_f64);
                let bounds = [
                    gt.map(|b| number.is_some_and(|n| n > b)),
                    gte.map(|b| number.is_some_and(|n| n >= b)),
                    lt.map(|b| number.is_some_and(|n| n < b)),
                    lte.map(|b| number.is_some_and(|n| n <= b)),
                ];
                if bounds.into_iter().flatten().any(|ok| !ok) {
                    return false;
                }

                match (matches, actual) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some(re), Some(value)) => re.is_match(&text_of(value)),
                }
            }
        }
    }
}

/// String form used for regex matching; strings are matched without quotes.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A validated contract with compiled matchers.
#[derive(Debug, Clone)]
pub struct Contract {
    pub id: String,
    pub description: String,
    pub method: String,
    pub body: BTreeMap<String, Matcher>,
    pub response: ContractResponse,
}

impl Contract {
    /// Parse and validate one contract document. `path` is only used for errors.
    pub fn parse(path: &Path, content: &str) -> Result<Self, StubError> {
        let invalid = |reason: String| StubError::InvalidContract {
            path: path.to_path_buf(),
            reason,
        };

        let raw: RawContract = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
        if !raw.request.method.starts_with('/') {
            return Err(invalid(format!(
                "method must be a full gRPC path like /pkg.Service/method, got `{}`",
                raw.request.method
            )));
        }

        let mut body = BTreeMap::new();
        for (field, matcher) in raw.request.body {
            let compiled = match matcher {
                RawMatcher::Exact(value) => Matcher::Exact(value),
                RawMatcher::Predicate(p) => Matcher::Predicate {
                    equal_to: p.equal_to,
                    gt: p.gt,
                    gte: p.gte,
                    lt: p.lt,
                    lte: p.lte,
                    matches: p
                        .matches
                        .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
                        .transpose()
                        .map_err(|e| invalid(format!("field `{field}`: {e}")))?,
                },
            };
            body.insert(field, compiled);
        }

        Ok(Self {
            id: raw.id,
            description: raw.description,
            method: raw.request.method,
            body,
            response: raw.response,
        })
    }

    /// Whether this contract answers `method` called with `request`.
    ///
    /// Fields not named by the contract are ignored.
    pub fn matches(&self, method: &str, request: &Value) -> bool {
        self.method == method
            && self
                .body
                .iter()
                .all(|(field, matcher)| matcher.is_match(request.get(field)))
    }
}

/// Read-only set of contracts served by one stub server.
#[derive(Debug, Clone, Default)]
pub struct ContractTable {
    contracts: Vec<Contract>,
}

impl ContractTable {
    pub fn new(mut contracts: Vec<Contract>) -> Self {
        contracts.sort_by(|a, b| a.id.cmp(&b.id));
        Self { contracts }
    }

    /// First contract, in id order, that answers the request.
    pub fn find(&self, method: &str, request: &Value) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.matches(method, request))
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }
}
