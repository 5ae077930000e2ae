use nocturne::http::request::Method;
use nocturne::router::{RouteError, Router};

fn router(routes: &[(Method, &str, &'static str)]) -> Router<&'static str> {
    let mut router = Router::new();
    for (method, pattern, handler) in routes {
        router.add_route(*method, pattern, *handler).unwrap();
    }
    router
}

#[test]
fn test_root_route_matches_with_and_without_slash() {
    let router = router(&[(Method::GET, "/", "index")]);

    assert_eq!(*router.resolve(Method::GET, "").unwrap().handler, "index");
    assert_eq!(*router.resolve(Method::GET, "/").unwrap().handler, "index");
    assert!(router.resolve(Method::POST, "/").is_none());
}

#[test]
fn test_exact_route_ignores_trailing_slash() {
    let router = router(&[(Method::GET, "/about/", "about")]);

    let found = router.resolve(Method::GET, "/about").unwrap();
    assert_eq!(*found.handler, "about");
    assert!(found.params.is_empty());
    assert!(router.resolve(Method::GET, "/about/us").is_none());
}

#[test]
fn test_parameterized_route_captures() {
    let router = router(&[(Method::GET, "/users/:id/posts/:post_id", "post")]);

    let found = router.resolve(Method::GET, "/users/42/posts/7").unwrap();
    assert_eq!(*found.handler, "post");
    assert_eq!(found.params["id"], "42");
    assert_eq!(found.params["post_id"], "7");
}

#[test]
fn test_parameterized_route_is_anchored() {
    let router = router(&[(Method::GET, "/users/:id", "user")]);

    assert!(router.resolve(Method::GET, "/users/42/extra").is_none());
    assert!(router.resolve(Method::GET, "/prefix/users/42").is_none());
    assert!(router.resolve(Method::GET, "/users").is_none());
}

#[test]
fn test_literal_pattern_text_is_not_regex() {
    let router = router(&[(Method::GET, "/files/:name.txt", "file")]);

    let found = router.resolve(Method::GET, "/files/report.txt").unwrap();
    assert_eq!(found.params["name"], "report");
    assert!(router.resolve(Method::GET, "/files/reportXtxt").is_none());
}

#[test]
fn test_wildcard_binds_rest_of_path() {
    let router = router(&[(Method::GET, "/static/*", "static")]);

    let found = router.resolve(Method::GET, "/static/css/app.css").unwrap();
    assert_eq!(found.params["*"], "css/app.css");
}

#[test]
fn test_exact_route_beats_parameterized() {
    let router = router(&[
        (Method::GET, "/users/:id", "user"),
        (Method::GET, "/users/me", "me"),
    ]);

    assert_eq!(*router.resolve(Method::GET, "/users/me").unwrap().handler, "me");
    assert_eq!(*router.resolve(Method::GET, "/users/7").unwrap().handler, "user");
}

#[test]
fn test_exact_match_on_any_method_shadows_parameterized() {
    let router = router(&[
        (Method::GET, "/users/:id", "get_user"),
        (Method::POST, "/users/me", "post_me"),
    ]);

    let matches = router.match_path("/users/me");
    assert_eq!(matches.len(), 1);
    assert!(matches.contains_key(&Method::POST));
    assert!(router.resolve(Method::GET, "/users/me").is_none());
}

#[test]
fn test_earliest_parameterized_route_wins() {
    let router = router(&[
        (Method::GET, "/items/:first", "first"),
        (Method::GET, "/items/:second", "second"),
    ]);

    let found = router.resolve(Method::GET, "/items/1").unwrap();
    assert_eq!(*found.handler, "first");
    assert_eq!(found.params["first"], "1");
    assert!(!found.params.contains_key("second"));
}

#[test]
fn test_match_path_reports_every_method() {
    let router = router(&[
        (Method::GET, "/users/:id", "get"),
        (Method::DELETE, "/users/:uid", "delete"),
    ]);

    let matches = router.match_path("/users/9");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[&Method::GET].params["id"], "9");
    assert_eq!(matches[&Method::DELETE].params["uid"], "9");
    assert!(router.match_path("/nothing").is_empty());
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut router = router(&[(Method::GET, "/users/:id", "user")]);

    let err = router.add_route(Method::GET, "/users/:id/", "again").unwrap_err();
    assert!(matches!(err, RouteError::Duplicate { method: Method::GET, .. }));
    assert!(router.add_route(Method::POST, "/users/:id", "post").is_ok());
    router.add_route(Method::GET, "", "root").unwrap();
    assert!(matches!(
        router.add_route(Method::GET, "/", "root"),
        Err(RouteError::Duplicate { .. })
    ));
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let mut router: Router<&'static str> = Router::new();

    let err = router.add_route(Method::GET, "/users/:", "bad").unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(router.is_empty());
}

#[test]
fn test_prefix_is_prepended() {
    let mut router = Router::with_prefix("/api/");
    router.add_route(Method::GET, "/users/:id", "user").unwrap();
    router.add_route(Method::GET, "/", "api_root").unwrap();

    assert_eq!(router.resolve(Method::GET, "/api/users/3").unwrap().params["id"], "3");
    assert_eq!(*router.resolve(Method::GET, "/api").unwrap().handler, "api_root");
    assert!(router.resolve(Method::GET, "/users/3").is_none());
}

#[test]
fn test_combine_merges_all_route_kinds() {
    let mut base = router(&[
        (Method::GET, "/shared", "base_shared"),
        (Method::GET, "/users/:id", "base_user"),
    ]);
    let other = router(&[
        (Method::GET, "/", "other_root"),
        (Method::GET, "/shared", "other_shared"),
        (Method::GET, "/users/:name", "other_user"),
        (Method::GET, "/posts/:id", "other_post"),
    ]);

    base.combine(&other).unwrap();

    assert_eq!(*base.resolve(Method::GET, "/").unwrap().handler, "other_root");
    assert_eq!(*base.resolve(Method::GET, "/shared").unwrap().handler, "base_shared");
    assert_eq!(*base.resolve(Method::GET, "/users/1").unwrap().handler, "base_user");
    assert_eq!(*base.resolve(Method::GET, "/posts/5").unwrap().handler, "other_post");
}

#[test]
fn test_combine_keeps_other_prefix() {
    let mut base: Router<&'static str> = Router::new();
    let mut mounted = Router::with_prefix("/admin");
    mounted.add_route(Method::GET, "/stats", "stats").unwrap();

    base.combine(&mounted).unwrap();

    assert!(base.resolve(Method::GET, "/admin/stats").is_some());
    assert!(base.resolve(Method::GET, "/stats").is_none());
}
