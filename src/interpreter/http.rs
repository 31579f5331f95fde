//! The HTTP collaborator behind `get` expressions.
//!
//! The interpreter only needs one synchronous operation: GET a URL with a
//! set of headers and hand back the status, body and response headers. That
//! seam is the `HttpClient` trait; `UreqClient` is the production
//! implementation and tests substitute a canned one.

use std::time::Duration;

use anyhow::Context;

/// The pieces of a response the interpreter seeds into the environment of a
/// tag-dispatched closure.
pub struct HttpResponse {
	pub status:  u16,
	pub body:    String,
	pub headers: Vec<(String, String)>,
}

/// A synchronous HTTP client. Only GET is required.
pub trait HttpClient: Send + Sync {
	fn get(&self, url: &str, headers: &[(String, String)]) -> anyhow::Result<HttpResponse>;
}

/// Per-request timeout for the default client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The default `HttpClient`, backed by a blocking `ureq` agent.
pub struct UreqClient {
	agent: ureq::Agent,
}

impl UreqClient {
	pub fn new() -> Self {
		Self { agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build() }
	}
}

impl Default for UreqClient {
	fn default() -> Self { Self::new() }
}

impl HttpClient for UreqClient {
	fn get(&self, url: &str, headers: &[(String, String)]) -> anyhow::Result<HttpResponse> {
		let mut request = self.agent.get(url);
		for (name, value) in headers {
			request = request.set(name, value);
		}

		// A 4xx/5xx status is still a response the script gets to see.
		let response = match request.call() {
			Ok(response) => response,
			Err(ureq::Error::Status(_, response)) => response,
			Err(err) => return Err(err).context("Failed to perform GET request"),
		};

		let status = response.status();
		let headers = response
			.headers_names()
			.into_iter()
			.filter_map(|name| response.header(&name).map(|value| (name.clone(), value.to_string())))
			.collect();
		let body = response.into_string().context("Failed to read response body")?;

		Ok(HttpResponse { status, body, headers })
	}
}
