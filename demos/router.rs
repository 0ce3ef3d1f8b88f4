use futures_util::stream;
use serde::{Deserialize, Serialize};
use simpleroute::{
	hyper::{Method, Server},
	Args, Handler, ParamKind, Reply, Route, RouterBuilder,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Deserialize, Serialize)]
struct Pet {
	name: String,
	age: i64,
}

async fn get_pet(args: Args) -> anyhow::Result<Reply> {
	Reply::json(&Pet {
		name: args.str(1).to_owned(),
		age: args.int(2),
	})
}

async fn add_pet(args: Args) -> anyhow::Result<Reply> {
	let pet: Pet = args.try_body(2)?;
	tracing::info!(owner = args.str(1), ?pet, "adding pet");
	Reply::json(&pet)
}

async fn countdown(args: Args) -> anyhow::Result<Reply> {
	let (tx, reply) = Reply::channel(1);
	let from = args.int(1);
	tokio::spawn(async move {
		for n in (0..=from).rev() {
			if tx.send(n).await.is_err() {
				break;
			}
			tokio::time::sleep(Duration::from_secs(1)).await;
		}
	});
	Ok(reply)
}

async fn colours(_args: Args) -> anyhow::Result<Reply> {
	Ok(Reply::stream(stream::iter(vec!["red", "green", "blue"])))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let addr = ([127, 0, 0, 1], 3000).into();

	let router = RouterBuilder::default()
		.register(
			Route::new("/pets/{1}/{2}").method(Method::GET),
			Handler::new([ParamKind::Unbound, ParamKind::Str, ParamKind::Int], get_pet),
		)
		.register(
			Route::new("/owners/{1}/pets").method(Method::POST).body(2),
			Handler::new([ParamKind::Unbound, ParamKind::Str, ParamKind::Body], add_pet),
		)
		.register(
			Route::new("/countdown/{1}").method(Method::GET),
			Handler::new([ParamKind::Unbound, ParamKind::Int], countdown),
		)
		.register(Route::new("/colours"), Handler::new([ParamKind::Unbound], colours))
		.build()?;

	let server = Server::bind(&addr).serve(router);
	tracing::info!(%addr, "listening");

	server.await?;
	Ok(())
}
