//! Panic recovery middleware.
//!
//! Catches a panic raised while the inner service handles a request, reports
//! it to the request's `LogEntry`, and answers `500 Internal Server Error` with
//! an empty body. Must sit inside `RequestLoggerLayer` so the entry exists.
//!
//! The stack trace is taken by a process-wide panic hook while the panicking
//! frame is still on the stack, and handed to the catch site through a
//! thread-local. `catch_unwind` runs on the thread that panicked, so the
//! slot read after the unwind always belongs to this request's panic.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use http::{Request, Response, StatusCode};
use tower::{Layer, Service};

use crate::http::entry::LogEntry;

/// Layer producing `Recoverer` services.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecovererLayer;

impl RecovererLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RecovererLayer {
    type Service = Recoverer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        install_stack_hook();
        Recoverer { inner }
    }
}

thread_local! {
    static PANIC_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

static STACK_HOOK: Once = Once::new();

/// Chain a panic hook that records the backtrace of the panicking thread.
/// The previous hook still runs afterwards.
pub fn install_stack_hook() {
    STACK_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let stack = Backtrace::force_capture().to_string();
            PANIC_STACK.with(|slot| *slot.borrow_mut() = Some(stack));
            previous(info);
        }));
    });
}

/// Backtrace recorded by the hook for the latest panic on this thread.
fn take_panic_stack() -> Option<String> {
    PANIC_STACK.with(|slot| slot.borrow_mut().take())
}

/// Service turning panics into 500 responses.
#[derive(Clone, Debug)]
pub struct Recoverer<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Recoverer<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let entry = req.extensions().get::<LogEntry>().cloned();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let stack = take_panic_stack()
                        .unwrap_or_else(|| Backtrace::force_capture().to_string());
                    report(entry.as_ref(), &message, &stack);

                    let mut response = Response::new(ResBody::default());
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    Ok(response)
                }
            }
        })
    }
}

fn report(entry: Option<&LogEntry>, message: &str, stack: &str) {
    let Some(entry) = entry else {
        tracing::error!(panic = %message, "panic outside of a logged request\n{stack}");
        return;
    };

    entry.panic(&message, stack);
    if !entry.options().json_format {
        tracing::error!(panic = %message, "panic while handling request\n{stack}");
    }
}

/// String form of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
