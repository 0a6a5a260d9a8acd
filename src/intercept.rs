//! Host proxy seam.
//!
//! The engine never talks to the network itself: a host proxy runtime (an
//! embedded proxy library, a TLS-terminating listener, ...) intercepts
//! traffic and hands each request/response pair to the
//! [`CredentialInjector`](crate::inject::CredentialInjector) through these
//! traits. The request phase may mutate headers in place; the response
//! phase only reads the status code.
//!
//! Adapters for `http::Request` / `http::Response` are provided so
//! hyper/axum-based hosts plug in without glue code.

use tracing::warn;

/// An intercepted outbound request, before it leaves the process.
pub trait InterceptedRequest: Send {
    /// Target hostname (no port).
    fn host(&self) -> &str;

    /// Request path.
    fn path(&self) -> &str;

    /// Set (insert or replace) a header.
    fn set_header(&mut self, name: &str, value: &str);
}

/// An intercepted upstream response.
pub trait InterceptedResponse: Send {
    /// HTTP status code.
    fn status(&self) -> u16;
}

impl<B: Send> InterceptedRequest for http::Request<B> {
    fn host(&self) -> &str {
        self.uri().host().unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let Ok(name) = http::HeaderName::from_bytes(name.as_bytes()) else {
            warn!(header = %name, "Invalid header name in injection rule; skipping");
            return;
        };
        // The value may embed resolved secret material; the error path must
        // not echo it.
        let Ok(value) = http::HeaderValue::from_str(value) else {
            warn!(header = %name, "Injected value is not a valid header value; skipping");
            return;
        };
        self.headers_mut().insert(name, value);
    }
}

impl<B: Send> InterceptedResponse for http::Response<B> {
    fn status(&self) -> u16 {
        self.status().as_u16()
    }
}
