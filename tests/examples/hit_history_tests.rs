use crate::client;
use pathmock::MockServer;
use std::{thread, time::Duration};

#[test]
fn hits_are_counted_per_path_and_server_test() {
    // Arrange
    let mut server = MockServer::new();
    let foo = server.add_path("/foo").methods(["GET", "POST"]);
    let bar = server.add_path("/bar");
    server.start().unwrap();
    let client = client();

    // Act
    client.get(server.url("/foo").unwrap()).send().unwrap();
    client
        .post(server.url("/foo").unwrap())
        .body("x")
        .send()
        .unwrap();
    client.get(server.url("/baz").unwrap()).send().unwrap();

    // Assert
    assert_eq!(server.hits(), 3);
    assert_eq!(foo.hits(), 2);
    assert_eq!(bar.hits(), 0);
    assert_eq!(server.path_hits("/foo"), Some(2));
    assert_eq!(server.path_hits("/baz"), None);
}

#[test]
fn hit_records_capture_request_test() {
    // Arrange
    let mut server = MockServer::new();
    server.add_path("/foo/bar/cool").methods(["PUT"]);
    server.start().unwrap();

    // Act
    client()
        .put(server.url("/foo/bar/cool?foo=bar&baz=fiz").unwrap())
        .header("X-CustomHeader01", "custom header value")
        .body("put body")
        .send()
        .unwrap();

    // Assert
    let records = server.hit_records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.method(), "PUT");
    assert_eq!(record.path(), "/foo/bar/cool");
    assert_eq!(record.query_param("foo"), Some("bar"));
    assert_eq!(record.query_param("baz"), Some("fiz"));
    assert_eq!(record.query().len(), 2);
    assert_eq!(
        record.header("x-customheader01"),
        Some("custom header value")
    );
    assert_eq!(record.body_string(), "put body");
    assert!(!record.body_read_failed());
}

#[test]
fn repeated_query_parameters_are_kept_test() {
    // Arrange
    let mut server = MockServer::new();
    server.add_path("/search");
    server.start().unwrap();

    // Act
    client()
        .get(server.url("/search?tag=a&tag=b%20c").unwrap())
        .send()
        .unwrap();

    // Assert
    let records = server.hit_records();
    assert_eq!(
        records[0].query().get("tag"),
        Some(&vec!["a".to_string(), "b c".to_string()])
    );
}

#[test]
fn next_path_hit_follows_arrival_order_test() {
    // Arrange
    let mut server = MockServer::new();
    server.add_path("/a");
    server.add_path("/b");
    server.start().unwrap();
    let client = client();

    // Act
    for path in ["/a", "/b", "/unknown", "/a"] {
        client.get(server.url(path).unwrap()).send().unwrap();
    }

    // Assert
    assert_eq!(server.next_path_hit(), "/a");
    assert_eq!(server.next_path_hit(), "/b");
    assert_eq!(server.next_path_hit(), "/unknown");
    assert_eq!(server.next_path_hit(), "/a");
    assert_eq!(server.next_path_hit_timeout(Duration::from_millis(100)), None);
}

#[test]
fn next_path_hit_waits_for_request_test() {
    // Arrange
    let mut server = MockServer::new();
    server.add_path("/late");
    server.start().unwrap();
    let url = server.url("/late").unwrap();

    // Act
    let path = thread::scope(|s| {
        let waiter = s.spawn(|| server.next_path_hit());

        thread::sleep(Duration::from_millis(100));
        client().get(&url).send().unwrap();

        waiter.join().unwrap()
    });

    // Assert
    assert_eq!(path, "/late");
}

#[test]
fn next_path_hit_timeout_returns_queued_path_test() {
    // Arrange
    let mut server = MockServer::new();
    server.start().unwrap();

    client().get(server.url("/queued").unwrap()).send().unwrap();

    // Act
    let path = server.next_path_hit_timeout(Duration::from_secs(5));

    // Assert
    assert_eq!(path, Some("/queued".to_string()));
}
