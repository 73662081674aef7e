use crate::client;
use pathmock::MockServer;

#[test]
fn method_not_accepted_is_forbidden_test() {
    // Arrange: without configured methods only GET is accepted.
    let mut server = MockServer::new();
    let path = server.add_path("/foo").payload("foo");
    server.start().unwrap();

    // Act
    let response = client()
        .post(server.url("/foo").unwrap())
        .body("some body")
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 403);
    assert_eq!(response.text().unwrap(), "");
    assert_eq!(path.hits(), 0);
    assert_eq!(server.hits(), 1);
}

#[test]
fn default_responses_per_method_test() {
    // Arrange
    let mut server = MockServer::new();
    let path = server
        .add_path("/items")
        .methods(["GET", "POST", "PUT", "DELETE"]);
    server.start().unwrap();
    let client = client();
    let url = server.url("/items").unwrap();

    // Act
    let get = client.get(&url).send().unwrap();
    let post = client.post(&url).body("post body").send().unwrap();
    let put = client.put(&url).body("put body").send().unwrap();
    let delete = client.delete(&url).body("ignored").send().unwrap();

    // Assert
    assert_eq!(get.status(), 200);
    assert_eq!(get.text().unwrap(), "");

    assert_eq!(post.status(), 202);
    assert_eq!(post.text().unwrap(), "post body");

    assert_eq!(put.status(), 201);
    assert_eq!(put.text().unwrap(), "put body");

    assert_eq!(delete.status(), 204);
    assert_eq!(delete.text().unwrap(), "");

    assert_eq!(path.hits(), 4);
}

#[test]
fn explicit_payload_and_status_override_defaults_test() {
    // Arrange
    let mut server = MockServer::new();
    server
        .add_path("/fixed")
        .methods(["POST", "DELETE"])
        .payload("fixed payload")
        .status(200);
    server.start().unwrap();
    let client = client();
    let url = server.url("/fixed").unwrap();

    // Act
    let post = client.post(&url).body("echo me").send().unwrap();
    let delete = client.delete(&url).send().unwrap();

    // Assert
    assert_eq!(post.status(), 200);
    assert_eq!(post.text().unwrap(), "fixed payload");
    assert_eq!(delete.status(), 200);
    assert_eq!(delete.text().unwrap(), "fixed payload");
}

#[test]
fn explicit_status_keeps_default_body_test() {
    // Arrange
    let mut server = MockServer::new();
    server.add_path("/created").methods(["PUT"]).status(200);
    server.start().unwrap();

    // Act
    let response = client()
        .put(server.url("/created").unwrap())
        .body("put body")
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().unwrap(), "put body");
}

#[test]
fn methods_are_case_insensitive_test() {
    // Arrange
    let mut server = MockServer::new();
    let path = server.add_path("/foo").methods(["post"]);
    server.start().unwrap();
    let client = client();
    let url = server.url("/foo").unwrap();

    // Act
    let post = client.post(&url).body("hi").send().unwrap();
    let get = client.get(&url).send().unwrap();

    // Assert
    assert_eq!(post.status(), 202);
    assert_eq!(get.status(), 403);
    assert_eq!(path.hits(), 1);
}

#[test]
fn other_accepted_methods_get_configured_payload_test() {
    // Arrange
    let mut server = MockServer::new();
    server
        .add_path("/patch")
        .methods(["PATCH"])
        .payload("patched");
    server.start().unwrap();

    // Act
    let response = client()
        .patch(server.url("/patch").unwrap())
        .body("ignored")
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().unwrap(), "patched");
}

#[test]
fn zero_status_uses_method_default_test() {
    // Arrange
    let mut server = MockServer::new();
    let path = server
        .add_path("/foo")
        .methods(["GET", "PUT"])
        .payload("x")
        .status(0);
    server.start().unwrap();
    let client = client();
    let url = server.url("/foo").unwrap();

    // Act
    let get = client.get(&url).send().unwrap();
    let put = client.put(&url).body("ignored").send().unwrap();

    // Assert
    assert_eq!(get.status(), 200);
    assert_eq!(get.text().unwrap(), "x");
    assert_eq!(put.status(), 201);
    assert_eq!(put.text().unwrap(), "x");
    assert_eq!(path.hits(), 2);
}

#[test]
fn invalid_status_leads_to_server_error_test() {
    // Arrange
    let mut server = MockServer::new();
    let path = server.add_path("/foo").status(1000);
    server.start().unwrap();

    // Act
    let response = client().get(server.url("/foo").unwrap()).send().unwrap();

    // Assert
    assert_eq!(response.status(), 500);
    assert_eq!(path.hits(), 0);
    assert_eq!(server.hits(), 1);
}
