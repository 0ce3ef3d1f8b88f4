use crate::{route::Request, router::Router};
use hyper::{body::Body, service::Service, Response};
use std::{
	convert::Infallible,
	future::{ready, Future, Ready},
	pin::Pin,
	task::{Context, Poll},
};

/// Hands every new connection a [`RouteHandler`] sharing this router's tree.
impl<T> Service<T> for Router {
	type Response = RouteHandler;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, _: T) -> Self::Future {
		ready(Ok(RouteHandler {
			router: self.clone(),
		}))
	}
}

/// Responsible for handling the actual HTTP requests from hyper.
#[derive(Debug, Clone)]
pub struct RouteHandler {
	router: Router,
}

impl Service<Request> for RouteHandler {
	type Response = Response<Body>;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: Request) -> Self::Future {
		let fut = self.router.dispatch(req);
		Box::pin(async move { Ok(fut.await) })
	}
}
