//! Agent context read from request headers.
//!
//! There is no authentication layer; callers state who they act for.

use axum::http::HeaderMap;
use common::{AgencyId, AgentContext, AgentId, CounterpartyId, Currency};

use crate::error::ApiError;

pub const AGENT_ID_HEADER: &str = "x-agent-id";
pub const AGENCY_ID_HEADER: &str = "x-agency-id";
pub const COUNTERPARTY_ID_HEADER: &str = "x-counterparty-id";
/// Optional; defaults to the agent context's default currency.
pub const CURRENCY_HEADER: &str = "x-currency";

/// Builds the agent context from the `x-agent-id`, `x-agency-id`,
/// `x-counterparty-id` and optional `x-currency` headers.
pub fn agent_from_headers(headers: &HeaderMap) -> Result<AgentContext, ApiError> {
    let agent = AgentContext::new(
        AgentId::new(numeric_header(headers, AGENT_ID_HEADER)?),
        AgencyId::new(numeric_header(headers, AGENCY_ID_HEADER)?),
        CounterpartyId::new(numeric_header(headers, COUNTERPARTY_ID_HEADER)?),
    );

    match header(headers, CURRENCY_HEADER) {
        Some(value) => {
            let currency: Currency = value
                .parse()
                .map_err(|e: common::ParseError| ApiError::BadRequest(e.to_string()))?;
            Ok(agent.with_currency(currency))
        }
        None => Ok(agent),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn numeric_header(headers: &HeaderMap, name: &str) -> Result<i32, ApiError> {
    header(headers, name)
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing or invalid {name} header")))
}
