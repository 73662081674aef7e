use crate::client;
use pathmock::MockServer;
use std::{collections::HashMap, thread, time::Duration};

#[test]
fn concurrent_requests_are_all_recorded_test() {
    // Arrange
    let mut server = MockServer::builder().worker_threads(4).build().unwrap();
    let paths: Vec<String> = (0..8).map(|i| format!("/path/{}", i)).collect();
    for path in &paths {
        server.add_path(path.as_str());
    }
    server.start().unwrap();

    // Act
    thread::scope(|s| {
        for path in &paths {
            let url = server.url(path).unwrap();
            s.spawn(move || {
                let client = client();
                for _ in 0..10 {
                    assert_eq!(client.get(&url).send().unwrap().status(), 200);
                }
            });
        }
    });

    // Assert
    assert_eq!(server.hits(), 80);
    assert_eq!(server.hit_records().len(), 80);
    for path in &paths {
        assert_eq!(server.path_hits(path), Some(10));
    }

    let mut delivered: HashMap<String, usize> = HashMap::new();
    for _ in 0..80 {
        *delivered.entry(server.next_path_hit()).or_default() += 1;
    }
    assert!(delivered.values().all(|count| *count == 10));
    assert_eq!(server.next_path_hit_timeout(Duration::from_millis(50)), None);
}

#[test]
fn full_hit_queue_holds_back_requests_test() {
    // Arrange
    let mut server = MockServer::builder().hit_queue_capacity(1).build().unwrap();
    server.add_path("/");
    server.start().unwrap();
    let first = server.url("/first").unwrap();
    let second = server.url("/second").unwrap();

    client().get(&first).send().unwrap();

    // Act
    thread::scope(|s| {
        let pending = s.spawn(move || client().get(&second).send().unwrap().status());

        thread::sleep(Duration::from_millis(200));
        assert!(!pending.is_finished());

        assert_eq!(server.next_path_hit(), "/first");
        assert_eq!(pending.join().unwrap(), 200);
    });

    // Assert
    assert_eq!(server.next_path_hit(), "/second");
    assert_eq!(server.hits(), 2);
}
