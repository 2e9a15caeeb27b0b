use std::fmt;

use serde::{Deserialize, Serialize};
use tonic::transport::Channel;

use beer_proto::beer::{
    PersonToCheck, Response as CheckResponse, beer_service_client::BeerServiceClient,
    response::BeerCheckStatus,
};

use crate::channel::ChannelBuilder;
use crate::error::ClientError;

/// Outcome of a beer eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ok,
    NotOk,
}

impl TryFrom<&CheckResponse> for Verdict {
    type Error = ClientError;

    /// An empty response carries the proto3 default, which is `NOT_OK`.
    fn try_from(response: &CheckResponse) -> Result<Self, Self::Error> {
        match BeerCheckStatus::try_from(response.status) {
            Ok(BeerCheckStatus::Ok) => Ok(Self::Ok),
            Ok(BeerCheckStatus::NotOk) => Ok(Self::NotOk),
            Err(_) => Err(ClientError::UnknownVerdict(response.status)),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::NotOk => "NOT_OK",
        })
    }
}

/// gRPC client for `beer.BeerService`.
#[derive(Clone)]
pub struct BeerClient {
    client: BeerServiceClient<Channel>,
}

impl BeerClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: BeerServiceClient::new(channel),
        }
    }

    pub async fn connect(builder: ChannelBuilder) -> Result<Self, ClientError> {
        Ok(Self::new(builder.connect().await?))
    }

    /// One unary `check` call. Transport and status errors are not retried.
    pub async fn check(&self, age: u32) -> Result<Verdict, ClientError> {
        let age = i32::try_from(age).map_err(|_| ClientError::InvalidAge(age))?;
        let response = self
            .client
            .clone()
            .check(PersonToCheck { age })
            .await?
            .into_inner();
        Verdict::try_from(&response)
    }
}
