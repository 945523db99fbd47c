//! Request/response behaviour over a live WebSocket connection.

use gpioproxy_integration_tests::{standard_devices, TestServer};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_write_scenario_exact_response() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    client
        .send_text(
            r#"{"jsonrpc":"2.0","method":"write","params":{"device_id":"led1","property":"value","value":1},"id":7}"#
                .to_string(),
        )
        .await;
    let response = client.recv().await;
    assert_eq!(response, json!({"jsonrpc": "2.0", "result": "ok", "id": 7}));

    let value = client
        .rpc(8, "read", json!({"device_id": "led1", "property": "value"}))
        .await;
    assert_eq!(value["result"], json!(true));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_response_ids_echo_requests() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    for id in [json!(1), json!("abc"), json!(42.5)] {
        let response = client
            .request(json!({
                "jsonrpc": "2.0",
                "method": "read",
                "params": {"device_id": "led1", "property": "is_lit"},
                "id": id
            }))
            .await;
        assert_eq!(response["id"], id);
        assert_eq!(response["result"], json!(false));
    }

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_call_and_read_pin_holder() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .rpc(1, "call", json!({"device_id": "led1", "method": "on"}))
        .await;
    assert!(response.get("error").is_none(), "{}", response);

    let lit = client
        .rpc(2, "read", json!({"device_id": "led1", "property": "is_lit"}))
        .await;
    assert_eq!(lit["result"], json!(true));

    let pin = client
        .rpc(3, "read", json!({"device_id": "led1", "property": "pin"}))
        .await;
    assert_eq!(pin["result"], json!(17));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_notifications_are_never_answered() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    client
        .send(json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {"device_id": "led1", "method": "on"}
        }))
        .await;
    client
        .send(json!({"jsonrpc": "2.0", "method": "no_such_method"}))
        .await;

    // Messages on one connection are handled in order, so the first reply
    // must belong to the follow-up request.
    let response = client
        .rpc(99, "read", json!({"device_id": "led1", "property": "value"}))
        .await;
    assert_eq!(response["id"], json!(99));
    assert_eq!(response["result"], json!(true));
    assert!(client.recv_within(Duration::from_millis(200)).await.is_none());

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_protocol_errors() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    client.send_text("{\"jsonrpc\": ".to_string()).await;
    let response = client.recv().await;
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["id"], json!(null));

    let response = client
        .request(json!({"jsonrpc": "2.0", "method": "teleport", "id": 5}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32601));
    assert_eq!(response["id"], json!(5));

    let response = client
        .rpc(6, "read", json!({"device_id": "ghost", "property": "value"}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(response["error"]["message"], json!("Device 'ghost' not found"));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_device_failure_keeps_connection_usable() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .rpc(
            1,
            "call",
            json!({"device_id": "led1", "method": "blink", "kwargs": {"speed": 3}}),
        )
        .await;
    assert_eq!(response["error"]["code"], json!(-32603));
    assert_eq!(
        response["error"]["message"],
        json!("got an unexpected keyword argument 'speed'")
    );

    let response = client
        .rpc(2, "write", json!({"device_id": "led1", "property": "pin", "value": 3}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32603));
    assert_eq!(response["error"]["message"], json!("can't set attribute"));

    let response = client
        .rpc(3, "read", json!({"device_id": "button1", "property": "is_pressed"}))
        .await;
    assert_eq!(response["result"], json!(false));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_list_devices_uses_configuration() {
    let mut configs = standard_devices();
    configs.push(gpioproxy_core::config::DeviceConfig::new("broken", "Laser").with_arg(22));
    let server = TestServer::start(configs, vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .request(json!({"jsonrpc": "2.0", "method": "list_devices", "id": 1}))
        .await;
    assert_eq!(
        response["result"],
        json!([
            {"id": "led1", "class": "LED"},
            {"id": "button1", "class": "Button"},
            {"id": "broken", "class": "Laser"}
        ])
    );

    let response = client
        .rpc(2, "read", json!({"device_id": "broken", "property": "value"}))
        .await;
    assert_eq!(response["error"]["message"], json!("Device 'broken' not found"));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_unrepresentable_blink_time_is_an_error() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .rpc(1, "call", json!({"device_id": "led1", "method": "blink", "args": [1e300]}))
        .await;
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["error"]["code"], json!(-32603));
    assert_eq!(
        response["error"]["message"],
        json!("on_time must be a non-negative number of seconds")
    );

    let response = client
        .rpc(2, "call", json!({"device_id": "led1", "method": "on"}))
        .await;
    assert!(response.get("error").is_none(), "{}", response);
    assert_eq!(server.pins.pin(17).map(|p| p.is_high()), Some(true));
    server.wait_for_clients(1).await;

    client.close().await;
    server.wait_for_clients(0).await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_reading_a_method_is_an_encoding_failure() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .rpc(1, "read", json!({"device_id": "led1", "property": "on"}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32603));
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.contains("not JSON serializable"), "{}", message);

    let response = client
        .rpc(2, "read", json!({"device_id": "led1", "property": "when_activated"}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32603));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_binary_frames() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let request = json!({
        "jsonrpc": "2.0",
        "method": "read",
        "params": {"device_id": "led1", "property": "is_lit"},
        "id": 1
    });
    client.send_binary(request.to_string().into_bytes()).await;
    let response = client.recv().await;
    assert_eq!(response, json!({"jsonrpc": "2.0", "result": false, "id": 1}));

    client.send_binary(vec![0xff, 0xfe, 0x7b]).await;
    let response = client.recv().await;
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["id"], json!(null));

    let response = client
        .rpc(2, "read", json!({"device_id": "led1", "property": "value"}))
        .await;
    assert_eq!(response["result"], json!(false));

    client.close().await;
    server.shutdown().await;
}
