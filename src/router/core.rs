//! Routing table - exact-match handler lookup per (method, url, mode).

use crate::error::RouterError;
use crate::server::{Payload, RequestContext, ResponseSink};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Methods a route may be registered under
pub const SUPPORTED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// What a handler returns. Errors become a 500 response.
pub type HandlerResult = anyhow::Result<()>;

/// A registered handler.
///
/// Buffered handlers receive the complete body; streaming handlers receive
/// one raw chunk per call. Handlers are shared across requests, hence
/// `Send + Sync`.
pub type Handler =
    Arc<dyn Fn(&RequestContext, &mut dyn ResponseSink, Payload<'_>) -> HandlerResult + Send + Sync>;

/// Wrap a closure into a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&RequestContext, &mut dyn ResponseSink, Payload<'_>) -> HandlerResult
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// When a route's handler fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchMode {
    /// Once, after the whole body has arrived
    Buffered,
    /// Once per body chunk, as chunks arrive
    Streaming,
}

impl DispatchMode {
    /// Map the "wait for full request" flag used by the registration API.
    /// An unset flag means buffered.
    #[must_use]
    pub fn from_wait_for_full_request(flag: Option<bool>) -> Self {
        match flag {
            None | Some(true) => DispatchMode::Buffered,
            Some(false) => DispatchMode::Streaming,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchMode::Buffered => "buffered",
            DispatchMode::Streaming => "streaming",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`RoutingTable::resolve`].
///
/// A miss is not an error at this level; the two miss variants let the caller
/// pick between a 500 (method unknown) and a 404 (url unknown).
pub enum Resolution<'a> {
    Found(&'a Handler),
    /// Nothing at all is registered for the method
    MethodNotRegistered,
    /// The method has routes, but not this url in this mode
    RouteNotRegistered,
}

impl<'a> Resolution<'a> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    #[must_use]
    pub fn handler(&self) -> Option<&'a Handler> {
        match self {
            Resolution::Found(h) => Some(*h),
            _ => None,
        }
    }

    /// Turn a miss into the matching [`RouterError`]
    pub fn into_result(self, method: &Method, url: &str) -> Result<&'a Handler, RouterError> {
        match self {
            Resolution::Found(h) => Ok(h),
            Resolution::MethodNotRegistered => Err(RouterError::method_not_registered(method)),
            Resolution::RouteNotRegistered => Err(RouterError::route_not_registered(method, url)),
        }
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found(_) => f.write_str("Found(<handler>)"),
            Resolution::MethodNotRegistered => f.write_str("MethodNotRegistered"),
            Resolution::RouteNotRegistered => f.write_str("RouteNotRegistered"),
        }
    }
}

/// One registered (method, url, mode) slot, as listed by [`RoutingTable::routes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: Method,
    pub url: String,
    pub mode: DispatchMode,
}

#[derive(Clone, Default)]
struct MethodRoutes {
    buffered: HashMap<String, Handler>,
    streaming: HashMap<String, Handler>,
}

impl MethodRoutes {
    fn by_mode(&self, mode: DispatchMode) -> &HashMap<String, Handler> {
        match mode {
            DispatchMode::Buffered => &self.buffered,
            DispatchMode::Streaming => &self.streaming,
        }
    }

    fn by_mode_mut(&mut self, mode: DispatchMode) -> &mut HashMap<String, Handler> {
        match mode {
            DispatchMode::Buffered => &mut self.buffered,
            DispatchMode::Streaming => &mut self.streaming,
        }
    }

    fn len(&self) -> usize {
        self.buffered.len() + self.streaming.len()
    }
}

/// Routing table: per method, a buffered map and a streaming map from exact
/// url to handler.
///
/// Populate it during startup, then hand it to
/// [`Dispatcher::new`](crate::dispatcher::Dispatcher::new), which keeps it
/// read-only for the serving phase.
///
/// # Lookup
///
/// Urls are compared byte for byte: `/a` and `/a/` are different routes, and
/// a query string is part of the key. Lookup is a single hash probe per map.
#[derive(Clone, Default)]
pub struct RoutingTable {
    methods: HashMap<Method, MethodRoutes>,
}

impl RoutingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the exact (method, url, mode) slot.
    ///
    /// A `None` handler, an empty url or a method outside
    /// [`SUPPORTED_METHODS`] is rejected with
    /// [`ErrorKind::InvalidRegistration`](crate::error::ErrorKind::InvalidRegistration)
    /// before the table is touched. Registering an occupied slot replaces the
    /// previous handler.
    pub fn register(
        &mut self,
        method: Method,
        url: &str,
        mode: DispatchMode,
        handler: Option<Handler>,
    ) -> Result<(), RouterError> {
        let handler_present = handler.is_some();
        let handler = match handler {
            Some(h) if !url.is_empty() => h,
            _ => {
                return Err(RouterError::invalid_registration(
                    "Url or handler is missing",
                )
                .with_internal(format!(
                    "method={method} url={url:?} mode={mode} handler_present={handler_present}"
                )));
            }
        };
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RouterError::invalid_registration(format!(
                "HTTP method {method} cannot be routed"
            )));
        }

        let routes = self.methods.entry(method.clone()).or_default();
        if routes
            .by_mode_mut(mode)
            .insert(url.to_string(), handler)
            .is_some()
        {
            warn!(
                method = %method,
                url = %url,
                mode = %mode,
                "Replaced existing handler"
            );
        }

        info!(
            method = %method,
            url = %url,
            mode = %mode,
            total_routes = self.len(),
            "Route registered"
        );
        Ok(())
    }

    /// Find the handler for an exact (method, url, mode) match
    #[must_use]
    pub fn resolve(&self, method: &Method, url: &str, mode: DispatchMode) -> Resolution<'_> {
        match self.methods.get(method) {
            None => Resolution::MethodNotRegistered,
            Some(routes) => match routes.by_mode(mode).get(url) {
                Some(h) => Resolution::Found(h),
                None => Resolution::RouteNotRegistered,
            },
        }
    }

    /// Register, choosing the mode from a "wait for full request" flag
    pub fn route<F>(
        &mut self,
        method: Method,
        url: &str,
        f: F,
        wait_for_full_request: Option<bool>,
    ) -> Result<(), RouterError>
    where
        F: Fn(&RequestContext, &mut dyn ResponseSink, Payload<'_>) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        let mode = DispatchMode::from_wait_for_full_request(wait_for_full_request);
        self.register(method, url, mode, Some(handler(f)))
    }

    /// Whether any route, in either mode, exists for `method`
    #[must_use]
    pub fn has_method(&self, method: &Method) -> bool {
        self.methods.contains_key(method)
    }

    /// Total number of registered slots across methods and modes
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.values().map(MethodRoutes::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered slot, sorted by method, url, then mode
    #[must_use]
    pub fn routes(&self) -> Vec<RouteEntry> {
        let mut out: Vec<RouteEntry> = self
            .methods
            .iter()
            .flat_map(|(method, routes)| {
                [DispatchMode::Buffered, DispatchMode::Streaming]
                    .into_iter()
                    .flat_map(move |mode| {
                        routes.by_mode(mode).keys().map(move |url| RouteEntry {
                            method: method.clone(),
                            url: url.clone(),
                            mode,
                        })
                    })
            })
            .collect();
        out.sort_by(|a, b| {
            (a.method.as_str(), a.url.as_str(), a.mode).cmp(&(
                b.method.as_str(),
                b.url.as_str(),
                b.mode,
            ))
        });
        out
    }
}

macro_rules! method_routes {
    ($($buffered:ident, $streaming:ident => $method:ident;)*) => {
        impl RoutingTable {
            $(
                #[doc = concat!("Register a buffered `", stringify!($method), "` handler")]
                pub fn $buffered<F>(&mut self, url: &str, f: F) -> Result<(), RouterError>
                where
                    F: Fn(&RequestContext, &mut dyn ResponseSink, Payload<'_>) -> HandlerResult
                        + Send
                        + Sync
                        + 'static,
                {
                    self.register(Method::$method, url, DispatchMode::Buffered, Some(handler(f)))
                }

                #[doc = concat!("Register a streaming `", stringify!($method), "` handler")]
                pub fn $streaming<F>(&mut self, url: &str, f: F) -> Result<(), RouterError>
                where
                    F: Fn(&RequestContext, &mut dyn ResponseSink, Payload<'_>) -> HandlerResult
                        + Send
                        + Sync
                        + 'static,
                {
                    self.register(Method::$method, url, DispatchMode::Streaming, Some(handler(f)))
                }
            )*
        }
    };
}

method_routes! {
    get, get_streaming => GET;
    post, post_streaming => POST;
    put, put_streaming => PUT;
    delete, delete_streaming => DELETE;
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("routes", &self.routes())
            .finish()
    }
}
