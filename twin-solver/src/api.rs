use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::OracleError;
use crate::map::{Label, Map};
use crate::oracle::{ExploreOutcome, Oracle};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    team_id: String,
}

#[derive(Debug, Serialize)]
struct SelectRequest<'a> {
    id: &'a str,
    #[serde(rename = "problemName")]
    problem_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(rename = "problemName")]
    problem_name: String,
}

#[derive(Debug, Serialize)]
struct ExploreRequest<'a> {
    id: &'a str,
    plans: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    results: Vec<Vec<Label>>,
    #[serde(rename = "queryCount")]
    query_count: u32,
}

#[derive(Debug, Serialize)]
struct GuessRequest<'a> {
    id: &'a str,
    map: &'a Map,
}

#[derive(Debug, Deserialize)]
struct GuessResponse {
    correct: bool,
}

impl ApiClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            base_url: config.base_url,
            client: reqwest::Client::new(),
            team_id: config.team_id,
        }
    }

    async fn post<Req, Resp>(&self, endpoint: &'static str, request: &Req) -> Result<Resp, OracleError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Protocol {
                endpoint,
                status,
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Oracle for ApiClient {
    async fn select(&self, problem_name: &str) -> Result<(), OracleError> {
        let request = SelectRequest {
            id: &self.team_id,
            problem_name,
        };
        let response: SelectResponse = self.post("select", &request).await?;
        if response.problem_name != problem_name {
            return Err(OracleError::Malformed {
                endpoint: "select",
                message: format!(
                    "selected '{}' but '{}' was requested",
                    response.problem_name, problem_name
                ),
            });
        }
        info!("selected problem {}", response.problem_name);
        Ok(())
    }

    async fn explore(&self, plans: &[String]) -> Result<ExploreOutcome, OracleError> {
        info!("exploring {} plans", plans.len());
        let request = ExploreRequest {
            id: &self.team_id,
            plans,
        };
        let response: ExploreResponse = self.post("explore", &request).await?;
        if response.results.len() != plans.len() {
            return Err(OracleError::Malformed {
                endpoint: "explore",
                message: format!(
                    "{} results for {} plans",
                    response.results.len(),
                    plans.len()
                ),
            });
        }
        info!("explore answered, query count {}", response.query_count);
        Ok(ExploreOutcome {
            results: response.results,
            query_count: response.query_count,
        })
    }

    async fn guess(&self, map: &Map) -> Result<bool, OracleError> {
        let request = GuessRequest {
            id: &self.team_id,
            map,
        };
        let response: GuessResponse = self.post("guess", &request).await?;
        info!("guess verdict: correct = {}", response.correct);
        Ok(response.correct)
    }
}
