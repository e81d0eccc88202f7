use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt; // for `oneshot`

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn warehouse_delivery_via_http() {
    env_service::register_builtin_envs();
    let app = env_service::make_app();

    // GET /envs
    let res = app
        .clone()
        .oneshot(Request::builder().uri("/envs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let names: Vec<String> = serde_json::from_value(body_json(res).await).unwrap();
    assert!(names.contains(&"Warehouse".to_string()));

    // POST /initialize on an open 5x5 floor with fixed landmarks
    let init_body = serde_json::json!({
        "env_type": "Warehouse",
        "config": {
            "layout": "open",
            "width": 5,
            "height": 5,
            "start_pos": [0, 0],
            "pickup_pos": [0, 2],
            "dropoff_pos": [4, 4],
            "seed": 7
        }
    });
    let res = app.clone().oneshot(post_json("/initialize", &init_body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    let env_id = v["env_id"].as_str().unwrap().to_string();
    assert_eq!(v["observation"]["data"]["robot_pos"], serde_json::json!([0, 0]));

    // POST /step with the scripted delivery route
    let step_body = serde_json::json!({
        "env_id": env_id,
        "tool_calls": [{
            "tool": "interact",
            "args": {"actions": ["E", "E", "PICK", "S", "S", "S", "S", "E", "E", "DROP"]}
        }]
    });
    let res = app.clone().oneshot(post_json("/step", &step_body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let obs = body_json(res).await;
    assert_eq!(obs["terminated"], serde_json::json!(true));
    assert_eq!(obs["data"]["last_outcome"], serde_json::json!("Dropped"));

    // POST /checkpoint returns the engine snapshot
    let res = app
        .clone()
        .oneshot(post_json("/checkpoint", &serde_json::json!({"env_id": env_id})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let snap = body_json(res).await;
    assert_eq!(snap["engine"], serde_json::json!("warehouse"));

    // POST /terminate removes the environment
    let res = app
        .clone()
        .oneshot(post_json("/terminate", &serde_json::json!({"env_id": env_id})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(post_json("/step", &step_body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_action_symbol_maps_to_bad_request() {
    env_service::register_builtin_envs();
    let app = env_service::make_app();

    let init_body = serde_json::json!({ "env_type": "Warehouse" });
    let res = app.clone().oneshot(post_json("/initialize", &init_body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let env_id = body_json(res).await["env_id"].as_str().unwrap().to_string();

    let step_body = serde_json::json!({
        "env_id": env_id,
        "tool_calls": [{"tool": "interact", "args": {"action": "FLY"}}]
    });
    let res = app.clone().oneshot(post_json("/step", &step_body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_env_type_maps_to_not_found() {
    env_service::register_builtin_envs();
    let app = env_service::make_app();
    let init_body = serde_json::json!({ "env_type": "Sokoban" });
    let res = app.clone().oneshot(post_json("/initialize", &init_body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
