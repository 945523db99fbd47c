//! Event subscription and `gpio.event` broadcast behaviour.

use gpioproxy_core::Device;
use gpioproxy_integration_tests::{standard_devices, CountingDevice, TestServer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_scenario_led_activated() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut subscriber = server.connect().await;
    let mut bystander = server.connect().await;
    let mut controller = server.connect().await;

    let response = subscriber
        .rpc(1, "subscribe", json!({"device_id": "led1", "event": "activated"}))
        .await;
    assert_eq!(response, json!({"jsonrpc": "2.0", "result": "subscribed", "id": 1}));

    let response = controller
        .rpc(1, "call", json!({"device_id": "led1", "method": "on"}))
        .await;
    assert!(response.get("error").is_none(), "{}", response);

    assert_eq!(
        subscriber.recv().await,
        json!({
            "jsonrpc": "2.0",
            "method": "gpio.event",
            "params": {"device_id": "led1", "event": "activated", "data": true}
        })
    );
    assert!(bystander.recv_within(QUIET).await.is_none());
    assert!(controller.recv_within(QUIET).await.is_none());

    subscriber.close().await;
    bystander.close().await;
    controller.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_hook_attached_once_for_many_subscribers() {
    let counter = Arc::new(CountingDevice::new());
    let server = TestServer::start(vec![], vec![("counter", counter.clone() as Arc<dyn Device>)]).await;

    let mut clients = Vec::new();
    for _ in 0..4 {
        let mut client = server.connect().await;
        let response = client
            .rpc(1, "subscribe", json!({"device_id": "counter", "event": "activated"}))
            .await;
        assert_eq!(response["result"], json!("subscribed"));
        clients.push(client);
    }
    assert_eq!(counter.attaches(), 1);

    counter
        .invoke("fire", &[json!(7)], &serde_json::Map::new())
        .unwrap();

    for client in clients.iter_mut() {
        let event = client.recv().await;
        assert_eq!(event["params"]["data"], json!(7));
        assert!(client.recv_within(QUIET).await.is_none());
    }

    for client in clients {
        client.close().await;
    }
    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnected_client_stops_receiving() {
    let counter = Arc::new(CountingDevice::new());
    let server = TestServer::start(vec![], vec![("counter", counter.clone() as Arc<dyn Device>)]).await;

    let mut leaver = server.connect().await;
    leaver
        .rpc(1, "subscribe", json!({"device_id": "counter", "event": "activated"}))
        .await;
    leaver.close().await;
    server.wait_for_clients(0).await;

    // The hook stays attached; a later subscriber still gets events.
    let mut stayer = server.connect().await;
    stayer
        .rpc(1, "subscribe", json!({"device_id": "counter", "event": "activated"}))
        .await;
    assert_eq!(counter.attaches(), 1);

    counter
        .invoke("fire", &[json!("late")], &serde_json::Map::new())
        .unwrap();
    assert_eq!(stayer.recv().await["params"]["data"], json!("late"));

    stayer.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_events_from_a_foreign_thread() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    for event in ["pressed", "released"] {
        let response = client
            .rpc(1, "subscribe", json!({"device_id": "button1", "event": event}))
            .await;
        assert_eq!(response["result"], json!("subscribed"));
    }

    let pin = server.pins.pin(4).unwrap();
    std::thread::spawn(move || {
        pin.drive(false);
        pin.drive(true);
    })
    .join()
    .unwrap();

    let pressed = client.recv().await;
    assert_eq!(pressed["params"]["event"], json!("pressed"));
    assert_eq!(pressed["params"]["data"], json!(1));

    let released = client.recv().await;
    assert_eq!(released["params"]["event"], json!("released"));
    assert_eq!(released["params"]["data"], json!(0));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_subscribe_to_missing_event_is_accepted() {
    let server = TestServer::start(standard_devices(), vec![]).await;
    let mut client = server.connect().await;

    let response = client
        .rpc(1, "subscribe", json!({"device_id": "led1", "event": "exploded"}))
        .await;
    assert_eq!(response["result"], json!("subscribed"));

    let response = client
        .rpc(2, "subscribe", json!({"device_id": "ghost", "event": "activated"}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32602));

    client.close().await;
    server.shutdown().await;
}
