use std::error::Error as _;

use http::StatusCode;
use kumi::{Chain, Composed, Error, Method, Middleware, Next, Request, Response, Router, compose, endpoint};

fn app(router: Router) -> Composed {
    compose(
        Chain::new()
            .with(router.routes())
            .with(endpoint(|_req: Request| async { StatusCode::NOT_FOUND })),
    )
}

async fn send(app: &impl Middleware, method: &str, url: &str) -> Response {
    let req = Request::new(method, url);
    app.call(req.clone(), Next::end()).await.expect("chain succeeds");
    req.take_response().expect("someone responded")
}

fn body(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}

async fn echo(req: Request) -> String {
    let mut params: Vec<_> = req.params().iter().map(|(k, v)| format!("{k}={v}")).collect();
    let mut query: Vec<_> = req.query_params().iter().map(|(k, v)| format!("{k}={v}")).collect();
    params.sort();
    query.sort();
    format!("{} | {}", params.join(","), query.join(","))
}

#[tokio::test]
async fn extracts_path_and_query_params() {
    let app = app(Router::new().get("/page/:pid/user/:uid", endpoint(echo)));

    let res = send(&app, "GET", "/page/101/user/cuijian?type=news&&page=2").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(body(&res), "pid=101,uid=cuijian | page=2,type=news");
}

#[tokio::test]
async fn root_route() {
    let app = app(Router::new().get("/", endpoint(|_req: Request| async { "root" })));

    assert_eq!(body(&send(&app, "GET", "/").await), "root");
    assert_eq!(send(&app, "GET", "/x").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn first_registered_match_wins() {
    let app = app(
        Router::new()
            .get("/user/:uid", endpoint(|_req: Request| async { "general" }))
            .get("/user/admin", endpoint(|_req: Request| async { "specific" })),
    );

    assert_eq!(body(&send(&app, "GET", "/user/admin").await), "general");
}

#[tokio::test]
async fn later_route_serves_other_methods() {
    let app = app(
        Router::new()
            .post("/user/:uid", endpoint(|_req: Request| async { "post" }))
            .get("/user/:uid", endpoint(|_req: Request| async { "get" })),
    );

    assert_eq!(body(&send(&app, "GET", "/user/1").await), "get");
    assert_eq!(body(&send(&app, "POST", "/user/1").await), "post");
}

#[tokio::test]
async fn get_is_not_routed_to_post_layer() {
    let app = app(Router::new().post("/form", endpoint(|_req: Request| async { "posted" })));

    assert_eq!(send(&app, "GET", "/form").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn method_matching_is_exact() {
    let app = app(Router::new().get("/thing", endpoint(|_req: Request| async { "thing" })));

    assert_eq!(send(&app, "GETX", "/thing").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "GE", "/thing").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "get", "/thing").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(body(&send(&app, "GET", "/thing").await), "thing");
}

#[tokio::test]
async fn multi_verb_layer() {
    let app = app(Router::new().on(
        [Method::Put, Method::Patch],
        "/doc/:id",
        endpoint(|req: Request| async move { format!("{} {}", req.method(), req.param("id").unwrap_or("")) }),
    ));

    assert_eq!(body(&send(&app, "PUT", "/doc/9").await), "PUT 9");
    assert_eq!(body(&send(&app, "PATCH", "/doc/9").await), "PATCH 9");
    assert_eq!(send(&app, "DELETE", "/doc/9").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verb_helpers_register_their_method() {
    let router = Router::new()
        .get("/r", endpoint(|_req: Request| async { "get" }))
        .post("/r", endpoint(|_req: Request| async { "post" }))
        .put("/r", endpoint(|_req: Request| async { "put" }))
        .patch("/r", endpoint(|_req: Request| async { "patch" }))
        .delete("/r", endpoint(|_req: Request| async { "delete" }));
    let app = app(router);

    for (method, expected) in [("GET", "get"), ("POST", "post"), ("PUT", "put"), ("PATCH", "patch"), ("DELETE", "delete")] {
        assert_eq!(body(&send(&app, method, "/r").await), expected);
    }
}

#[tokio::test]
async fn no_match_falls_through_without_responding() {
    let routes = Router::new().get("/only", endpoint(|_req: Request| async { "only" })).routes();

    let req = Request::new("GET", "/elsewhere");
    routes.call(req.clone(), Next::end()).await.unwrap();

    assert!(!req.responded());
}

#[tokio::test]
async fn matched_handler_receives_the_routers_continuation() {
    let wrapping = |req: Request, next: Next| async move {
        next.run().await?;
        let inner = req.take_response().map(|r| String::from_utf8_lossy(r.body()).into_owned());
        req.respond(format!("wrapped({})", inner.unwrap_or_default()));
        Ok::<_, Error>(())
    };
    let app = compose(
        Chain::new()
            .with(Router::new().get("/w/:id", wrapping).routes())
            .with(endpoint(|_req: Request| async { "downstream" })),
    );

    assert_eq!(body(&send(&app, "GET", "/w/1").await), "wrapped(downstream)");
}

#[tokio::test]
async fn handler_errors_propagate_out_of_the_router() {
    let failing = |_req: Request, _next: Next| async { Err::<(), _>(Error::handler("no such user")) };
    let routes = Router::new().get("/user/:uid", failing).routes();

    let err = routes.call(Request::new("GET", "/user/1"), Next::end()).await.unwrap_err();

    assert_eq!(err.to_string(), "handler failed");
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("no such user"));
}

#[tokio::test]
async fn find_reports_selected_layer() {
    let routes = Router::new()
        .get("/a/:x", endpoint(|_req: Request| async { "" }))
        .try_on(Method::Post, "/a/:x", endpoint(|_req: Request| async { "" }))
        .unwrap()
        .routes();

    assert_eq!(routes.layers().len(), 2);
    let layer = routes.find("POST", "/A/1?z=2").expect("post layer");
    assert_eq!(layer.pattern(), "/a/:x");
    assert!(layer.methods().contains(Method::Post));
    assert!(routes.find("HEAD", "/a/1").is_none());
}

#[test]
fn try_on_reports_an_oversized_pattern() {
    let pattern = format!("/{}/:id", "x".repeat(1 << 20));
    let res = Router::new().try_on(Method::Get, &pattern, endpoint(|_req: Request| async { "" }));

    assert!(matches!(res, Err(Error::InvalidRoute { .. })));
}
