// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Client for the New Relic v2 dashboards API.
//!
//! Requests are described as plain [`ApiRequest`] values and handed to a
//! [`Transport`]. The production transport sends them with `reqwest`; tests
//! answer them from memory.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::Error,
    model::{Dashboard, Widget},
    visualization::Visualization,
};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.newrelic.com/v2/";

const API_KEY_HEADER: &str = "X-Api-Key";

/// Credentials and endpoint used to reach the API.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ClientConfig
{
    /// Key sent in the `X-Api-Key` header.
    pub api_key:    String,
    /// Account attached to every submitted widget.
    pub account_id: u64,
    /// API root, always ending with `/`.
    pub base_url:   String,
}

impl ClientConfig
{
    /// Creates a configuration pointing at [`DEFAULT_BASE_URL`].
    pub fn new(api_key: impl Into<String,>, account_id: u64,) -> Self
    {
        Self {
            api_key: api_key.into(),
            account_id,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Replaces the API root, appending a trailing slash when missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use nrdash::ClientConfig;
    ///
    /// let config = ClientConfig::new("key", 42,).with_base_url("http://localhost:8080/v2",);
    /// assert_eq!(config.base_url, "http://localhost:8080/v2/");
    /// ```
    pub fn with_base_url(mut self, base_url: impl Into<String,>,) -> Self
    {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/',) {
            base_url.push('/',);
        }
        self.base_url = base_url;
        self
    }
}

/// HTTP request produced by the client.
#[derive(Debug, Clone, PartialEq,)]
pub struct ApiRequest
{
    /// HTTP method.
    pub method:  Method,
    /// Absolute URL without query string.
    pub url:     String,
    /// Query string parameters.
    pub query:   Vec<(String, String,),>,
    /// Request headers.
    pub headers: Vec<(String, String,),>,
    /// JSON body, if any.
    pub body:    Option<Value,>,
}

/// HTTP response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ApiResponse
{
    /// Status code.
    pub status: u16,
    /// Raw response body.
    pub body:   String,
}

/// Sends API requests over some channel.
#[async_trait]
pub trait Transport: Send + Sync
{
    /// Performs the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the request cannot be delivered.
    async fn send(&self, request: ApiRequest,) -> Result<ApiResponse, Error,>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default,)]
pub struct HttpTransport
{
    http: reqwest::Client,
}

#[async_trait]
impl Transport for HttpTransport
{
    async fn send(&self, request: ApiRequest,) -> Result<ApiResponse, Error,>
    {
        let mut builder = self.http.request(request.method, &request.url,).query(&request.query,);
        for (name, value,) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str(),);
        }
        if let Some(body,) = &request.body {
            builder = builder.json(body,);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            body,
        },)
    }
}

/// Request body accepted by the create and update endpoints.
#[derive(Debug, Serialize,)]
pub struct DashboardPayload<'a,>
{
    dashboard: DashboardBody<'a,>,
}

#[derive(Debug, Serialize,)]
struct DashboardBody<'a,>
{
    metadata:   Metadata,
    title:      &'a str,
    icon:       &'static str,
    visibility: &'static str,
    editable:   &'static str,
    filter:     serde_json::Map<String, Value,>,
    widgets:    Vec<WidgetBody<'a,>,>,
}

#[derive(Debug, Serialize,)]
struct Metadata
{
    version: u32,
}

#[derive(Debug, Serialize,)]
struct WidgetBody<'a,>
{
    account_id:    u64,
    visualization: Visualization,
    data:          [WidgetData<'a,>; 1],
    presentation:  Presentation<'a,>,
    layout:        LayoutBody,
}

#[derive(Debug, Serialize,)]
struct WidgetData<'a,>
{
    nrql: &'a str,
}

#[derive(Debug, Serialize,)]
struct Presentation<'a,>
{
    title: &'a str,
    notes: Option<&'a str,>,
}

#[derive(Debug, Serialize,)]
struct LayoutBody
{
    width:  u32,
    height: u32,
    row:    u32,
    column: u32,
}

impl<'a,> DashboardPayload<'a,>
{
    /// Builds the request body for `dashboard`, attaching `account_id` to
    /// every widget.
    pub fn new(dashboard: &'a Dashboard, account_id: u64,) -> Self
    {
        let widgets =
            dashboard.widgets.iter().map(|widget| widget_body(widget, account_id,),).collect();

        Self {
            dashboard: DashboardBody {
                metadata: Metadata {
                    version: 1,
                },
                title: &dashboard.title,
                icon: "usd",
                visibility: "all",
                editable: "editable_by_all",
                filter: serde_json::Map::new(),
                widgets,
            },
        }
    }
}

fn widget_body(widget: &Widget, account_id: u64,) -> WidgetBody<'_,>
{
    WidgetBody {
        account_id,
        visualization: widget.visualization,
        data: [WidgetData {
            nrql: &widget.query,
        }],
        presentation: Presentation {
            title: &widget.title,
            notes: widget.notes.as_deref(),
        },
        layout: LayoutBody {
            width:  widget.layout.width,
            height: widget.layout.height,
            row:    widget.layout.row,
            column: widget.layout.column,
        },
    }
}

/// Serializes the request body for `dashboard` into a JSON value.
///
/// # Errors
///
/// Returns [`Error::Serialize`] when encoding fails.
pub fn build_payload(dashboard: &Dashboard, account_id: u64,) -> Result<Value, Error,>
{
    Ok(serde_json::to_value(DashboardPayload::new(dashboard, account_id,),)?,)
}

#[derive(Debug, Deserialize,)]
struct DashboardList
{
    #[serde(default)]
    dashboards: Vec<DashboardSummary,>,
}

#[derive(Debug, Deserialize,)]
struct DashboardSummary
{
    id:    u64,
    title: String,
}

/// Dashboard operations against the New Relic API.
#[derive(Debug, Clone,)]
pub struct NewRelicClient<T = HttpTransport,>
{
    config:    ClientConfig,
    transport: T,
}

impl NewRelicClient<HttpTransport,>
{
    /// Creates a client sending requests with `reqwest`.
    pub fn new(config: ClientConfig,) -> Self
    {
        Self::with_transport(config, HttpTransport::default(),)
    }
}

impl<T: Transport,> NewRelicClient<T,>
{
    /// Creates a client sending requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T,) -> Self
    {
        Self {
            config,
            transport,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self,) -> &ClientConfig
    {
        &self.config
    }

    /// Returns the transport requests are sent through.
    pub fn transport(&self,) -> &T
    {
        &self.transport
    }

    /// Returns the id of the dashboard titled exactly `title`.
    ///
    /// The API matches titles by substring, so the listing is narrowed to
    /// exact matches locally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] on a non-200 answer, an undecodable listing or
    /// when more than one dashboard carries the title.
    pub async fn find_by_title(&self, title: &str,) -> Result<Option<u64,>, Error,>
    {
        let request = ApiRequest {
            method:  Method::GET,
            url:     self.dashboards_url(),
            query:   vec![("filter[title]".to_owned(), title.to_owned(),)],
            headers: self.headers(),
            body:    None,
        };

        let response = self.transport.send(request,).await?;
        if response.status != 200 {
            return Err(Error::api(format!(
                "failed looking up dashboard {title} with status {}: {}",
                response.status, response.body
            ),),);
        }

        let listing: DashboardList = serde_json::from_str(&response.body,).map_err(|source| {
            Error::api(format!("failed to decode dashboard listing for {title}: {source}"),)
        },)?;

        let mut matching =
            listing.dashboards.into_iter().filter(|summary| summary.title == title,);
        let found = matching.next();
        if matching.next().is_some() {
            return Err(Error::api(format!("multiple dashboards found with title '{title}'"),),);
        }

        debug!("Lookup for dashboard '{}' returned {:?}", title, found.as_ref().map(|d| d.id));
        Ok(found.map(|summary| summary.id,),)
    }

    /// Creates `dashboard`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] unless the API answers 200 or 201.
    pub async fn create(&self, dashboard: &Dashboard,) -> Result<(), Error,>
    {
        let url = self.dashboards_url();
        self.submit(Method::POST, url, dashboard, "creating",).await
    }

    /// Replaces the dashboard with id `id` by `dashboard`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] unless the API answers 200 or 201.
    pub async fn update(&self, id: u64, dashboard: &Dashboard,) -> Result<(), Error,>
    {
        let url = format!("{}dashboards/{id}.json", self.config.base_url);
        self.submit(Method::PUT, url, dashboard, "updating",).await
    }

    async fn submit(
        &self,
        method: Method,
        url: String,
        dashboard: &Dashboard,
        action: &str,
    ) -> Result<(), Error,>
    {
        let request = ApiRequest {
            method,
            url,
            query: Vec::new(),
            headers: self.headers(),
            body: Some(build_payload(dashboard, self.config.account_id,)?,),
        };

        let response = self.transport.send(request,).await?;
        match response.status {
            200 | 201 => Ok((),),
            status => Err(Error::api(format!(
                "failed {action} dashboard {} with status {status}: {}",
                dashboard.name, response.body
            ),),),
        }
    }

    fn dashboards_url(&self,) -> String
    {
        format!("{}dashboards.json", self.config.base_url)
    }

    fn headers(&self,) -> Vec<(String, String,),>
    {
        vec![(API_KEY_HEADER.to_owned(), self.config.api_key.clone(),)]
    }
}

#[cfg(test)]
pub(crate) mod tests
{
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::json;

    use super::{ApiRequest, ApiResponse, ClientConfig, NewRelicClient, Transport, build_payload};
    use crate::{
        Error, Visualization,
        model::{Dashboard, Layout, Widget},
    };

    /// Answers requests with queued responses and records what was sent.
    #[derive(Debug, Default,)]
    pub(crate) struct FakeTransport
    {
        responses: Mutex<VecDeque<ApiResponse,>,>,
        requests:  Mutex<Vec<ApiRequest,>,>,
    }

    impl FakeTransport
    {
        pub(crate) fn respond(self, status: u16, body: &str,) -> Self
        {
            self.responses.lock().expect("poisoned",).push_back(ApiResponse {
                status,
                body: body.to_owned(),
            },);
            self
        }

        pub(crate) fn requests(&self,) -> Vec<ApiRequest,>
        {
            self.requests.lock().expect("poisoned",).clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport
    {
        async fn send(&self, request: ApiRequest,) -> Result<ApiResponse, Error,>
        {
            self.requests.lock().expect("poisoned",).push(request,);
            self.responses
                .lock()
                .expect("poisoned",)
                .pop_front()
                .ok_or_else(|| Error::api("no response queued",),)
        }
    }

    pub(crate) fn client(transport: FakeTransport,) -> NewRelicClient<FakeTransport,>
    {
        NewRelicClient::with_transport(ClientConfig::new("secret", 1234,), transport,)
    }

    pub(crate) fn dashboard(name: &str, title: &str,) -> Dashboard
    {
        Dashboard {
            name:    name.to_owned(),
            title:   title.to_owned(),
            widgets: vec![Widget {
                title:         "Errors".to_owned(),
                query:         "SELECT COUNT(*) FROM Transaction".to_owned(),
                visualization: Visualization::Billboard,
                layout:        Layout {
                    row: 1, column: 2, width: 3, height: 4,
                },
                notes:         None,
            }],
        }
    }

    #[tokio::test]
    async fn find_by_title_matches_exact_title()
    {
        let transport = FakeTransport::default().respond(
            200,
            r#"{"dashboards":[{"id":1,"title":"Foobar"},{"id":2,"title":"Foo"}]}"#,
        );
        let client = client(transport,);

        let id = client.find_by_title("Foo",).await.expect("expected lookup to succeed",);
        assert_eq!(id, Some(2));

        let requests = client.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].url, "https://api.newrelic.com/v2/dashboards.json");
        assert_eq!(requests[0].query, vec![("filter[title]".to_owned(), "Foo".to_owned())]);
        assert_eq!(requests[0].headers, vec![("X-Api-Key".to_owned(), "secret".to_owned())]);
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn find_by_title_returns_none_without_exact_match()
    {
        let transport = FakeTransport::default()
            .respond(200, r#"{"dashboards":[{"id":1,"title":"Foobar"}]}"#,);
        let id = client(transport,).find_by_title("Foo",).await.expect("expected lookup",);
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn find_by_title_rejects_ambiguous_titles()
    {
        let transport = FakeTransport::default().respond(
            200,
            r#"{"dashboards":[{"id":1,"title":"Foo"},{"id":2,"title":"Foo"}]}"#,
        );

        match client(transport,).find_by_title("Foo",).await {
            Err(Error::Api {
                message,
            },) => assert_eq!(message, "multiple dashboards found with title 'Foo'"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_by_title_reports_status_and_body()
    {
        let transport = FakeTransport::default().respond(403, "forbidden",);

        match client(transport,).find_by_title("Foo",).await {
            Err(Error::Api {
                message,
            },) => {
                assert!(message.contains("403"));
                assert!(message.contains("forbidden"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_by_title_rejects_undecodable_listing()
    {
        let transport = FakeTransport::default().respond(200, "<html>",);
        let result = client(transport,).find_by_title("Foo",).await;
        assert!(matches!(result, Err(Error::Api { .. })));
    }

    #[tokio::test]
    async fn create_posts_dashboard_body()
    {
        let transport = FakeTransport::default().respond(201, "{}",);
        let client = client(transport,);

        client.create(&dashboard("main", "Main",),).await.expect("expected create to succeed",);

        let requests = client.transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "https://api.newrelic.com/v2/dashboards.json");
        assert_eq!(
            requests[0].body.as_ref().map(|body| &body["dashboard"]["title"]),
            Some(&json!("Main"))
        );
    }

    #[tokio::test]
    async fn update_puts_to_dashboard_url()
    {
        let transport = FakeTransport::default().respond(200, "{}",);
        let client = client(transport,);

        client.update(77, &dashboard("main", "Main",),).await.expect("expected update",);

        let requests = client.transport.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url, "https://api.newrelic.com/v2/dashboards/77.json");
    }

    #[tokio::test]
    async fn create_and_update_fail_on_server_errors()
    {
        let transport = FakeTransport::default().respond(500, "boom",).respond(500, "boom",);
        let client = client(transport,);

        match client.create(&dashboard("main", "Main",),).await {
            Err(Error::Api {
                message,
            },) => assert_eq!(message, "failed creating dashboard main with status 500: boom"),
            other => panic!("expected api error, got {other:?}"),
        }

        match client.update(5, &dashboard("main", "Main",),).await {
            Err(Error::Api {
                message,
            },) => assert_eq!(message, "failed updating dashboard main with status 500: boom"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn payload_matches_api_shape()
    {
        let mut dashboard = dashboard("main", "Main",);
        dashboard.widgets[0].notes = Some("Check the logs".to_owned(),);

        let payload = build_payload(&dashboard, 1234,).expect("expected payload",);
        assert_eq!(
            payload,
            json!({
                "dashboard": {
                    "metadata": {"version": 1},
                    "title": "Main",
                    "icon": "usd",
                    "visibility": "all",
                    "editable": "editable_by_all",
                    "filter": {},
                    "widgets": [{
                        "account_id": 1234,
                        "visualization": "billboard",
                        "data": [{"nrql": "SELECT COUNT(*) FROM Transaction"}],
                        "presentation": {"title": "Errors", "notes": "Check the logs"},
                        "layout": {"width": 3, "height": 4, "row": 1, "column": 2}
                    }]
                }
            })
        );
    }

    #[test]
    fn payload_keeps_missing_notes_as_null()
    {
        let payload = build_payload(&dashboard("main", "Main",), 1,).expect("expected payload",);
        assert!(payload["dashboard"]["widgets"][0]["presentation"]["notes"].is_null());
    }

    #[test]
    fn base_url_gains_trailing_slash()
    {
        let config = ClientConfig::new("key", 1,).with_base_url("http://localhost/v2",);
        assert_eq!(config.base_url, "http://localhost/v2/");

        let config = ClientConfig::new("key", 1,).with_base_url("http://localhost/v2/",);
        assert_eq!(config.base_url, "http://localhost/v2/");
    }
}
