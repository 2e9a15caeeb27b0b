//! `BeerService` implementation that answers from recorded contracts.

use std::sync::Arc;

use serde_json::{Value, json};
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

use beer_proto::CHECK_METHOD;
use beer_proto::beer::{
    PersonToCheck, Response as CheckResponse, beer_service_server::BeerService,
    response::BeerCheckStatus,
};

use crate::contract::ContractTable;

#[derive(Clone)]
pub struct ReplayBeerService {
    contracts: Arc<ContractTable>,
}

impl ReplayBeerService {
    pub fn new(contracts: Arc<ContractTable>) -> Self {
        Self { contracts }
    }
}

#[tonic::async_trait]
impl BeerService for ReplayBeerService {
    async fn check(
        &self,
        request: Request<PersonToCheck>,
    ) -> Result<Response<CheckResponse>, Status> {
        let body = person_to_json(request.get_ref());

        let Some(contract) = self.contracts.find(CHECK_METHOD, &body) else {
            warn!(method = CHECK_METHOD, request = %body, "no stub matches request");
            return Err(Status::not_found(format!(
                "no stub matches {CHECK_METHOD} with {body}"
            )));
        };

        debug!(contract = %contract.id, request = %body, "replaying stub");
        let response = check_response_from_json(&contract.response.body)
            .map_err(|reason| Status::internal(format!("contract {}: {reason}", contract.id)))?;
        Ok(Response::new(response))
    }
}

fn person_to_json(person: &PersonToCheck) -> Value {
    json!({ "age": person.age })
}

/// Decode a recorded response body. Missing fields keep their proto3 defaults.
fn check_response_from_json(body: &Value) -> Result<CheckResponse, String> {
    let fields = match body {
        Value::Null => return Ok(CheckResponse::default()),
        Value::Object(fields) => fields,
        other => return Err(format!("response body must be an object, got {other}")),
    };

    let mut response = CheckResponse::default();
    match fields.get("status") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) => {
            let status = BeerCheckStatus::from_str_name(name)
                .ok_or_else(|| format!("unknown status `{name}`"))?;
            response.set_status(status);
        }
        Some(Value::Number(n)) => {
            let value = n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| format!("status out of range: {n}"))?;
            BeerCheckStatus::try_from(value).map_err(|_| format!("unknown status {value}"))?;
            response.status = value;
        }
        Some(other) => return Err(format!("status must be a name or number, got {other}")),
    }
    Ok(response)
}
